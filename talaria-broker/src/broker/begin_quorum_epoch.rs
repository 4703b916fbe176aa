// Copyright ⓒ 2024-2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use talaria_sans_io::{
    BeginQuorumEpochRequest as Request, BeginQuorumEpochResponse, Body, ErrorCode,
    begin_quorum_epoch_response::{PartitionData, TopicData},
};
use tracing::{debug, warn};

/// Acknowledge a new quorum leader, without interpreting quorum state.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BeginQuorumEpochRequest {
    cluster_id: String,
}

impl BeginQuorumEpochRequest {
    pub fn with_cluster_id(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }

    pub fn response(&self, request: Request) -> Body {
        debug!(?request);

        if let Some(cluster_id) = request
            .cluster_id
            .as_deref()
            .filter(|cluster_id| *cluster_id != self.cluster_id)
        {
            warn!(cluster_id, expected = %self.cluster_id);
            return BeginQuorumEpochResponse::from(ErrorCode::InconsistentClusterId).into();
        }

        BeginQuorumEpochResponse::default()
            .error_code(ErrorCode::None.into())
            .topics(
                request
                    .topics
                    .into_iter()
                    .map(|topic| {
                        TopicData::default()
                            .topic_name(topic.topic_name)
                            .partitions(
                                topic
                                    .partitions
                                    .iter()
                                    .map(|partition| {
                                        PartitionData::default()
                                            .partition_index(partition.partition_index)
                                            .error_code(ErrorCode::None.into())
                                            .leader_id(partition.leader_id)
                                            .leader_epoch(partition.leader_epoch)
                                    })
                                    .collect(),
                            )
                    })
                    .collect(),
            )
            .into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use talaria_sans_io::begin_quorum_epoch_request;

    use super::*;

    fn orders(cluster_id: Option<&str>) -> Request {
        Request::default()
            .cluster_id(cluster_id.map(ToOwned::to_owned))
            .topics(vec![
                begin_quorum_epoch_request::TopicData::default()
                    .topic_name("orders".into())
                    .partitions(vec![
                        begin_quorum_epoch_request::PartitionData::default()
                            .partition_index(3)
                            .leader_id(7)
                            .leader_epoch(42),
                    ]),
            ])
    }

    #[test]
    fn acknowledge_each_partition() {
        let handler = BeginQuorumEpochRequest::with_cluster_id("abc");

        let expected: Body = BeginQuorumEpochResponse::default()
            .topics(vec![
                TopicData::default()
                    .topic_name("orders".into())
                    .partitions(vec![
                        PartitionData::default()
                            .partition_index(3)
                            .leader_id(7)
                            .leader_epoch(42),
                    ]),
            ])
            .into();

        assert_eq!(expected, handler.response(orders(None)));
        assert_eq!(expected, handler.response(orders(Some("abc"))));
    }

    #[test]
    fn inconsistent_cluster_id() {
        let handler = BeginQuorumEpochRequest::with_cluster_id("abc");

        let Body::BeginQuorumEpochResponse(response) = handler.response(orders(Some("xyz")))
        else {
            panic!("expected a begin quorum epoch response");
        };

        assert_eq!(i16::from(ErrorCode::InconsistentClusterId), response.error_code);
        assert!(response.topics.is_empty());
    }
}
