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

//! The voter's acknowledgement of a [`crate::BeginQuorumEpochRequest`].

use crate::{
    ApiKey, ApiName, BeginQuorumEpochRequest, Decode, Decoder, Encode, Encoder, ErrorCode,
    Response, Result, Versioned,
};

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BeginQuorumEpochResponse {
    pub version: i16,

    /// The top level error code.
    pub error_code: i16,

    pub topics: Vec<TopicData>,
}

impl BeginQuorumEpochResponse {
    #[must_use]
    pub fn error_code(self, error_code: i16) -> Self {
        Self { error_code, ..self }
    }

    #[must_use]
    pub fn topics(self, topics: Vec<TopicData>) -> Self {
        Self { topics, ..self }
    }
}

impl From<ErrorCode> for BeginQuorumEpochResponse {
    fn from(error_code: ErrorCode) -> Self {
        Self::default().error_code(error_code.into())
    }
}

impl ApiKey for BeginQuorumEpochResponse {
    const KEY: i16 = 53;
}

impl ApiName for BeginQuorumEpochResponse {
    const NAME: &'static str = "BeginQuorumEpochResponse";
}

impl Versioned for BeginQuorumEpochResponse {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Response for BeginQuorumEpochResponse {
    type Request = BeginQuorumEpochRequest;
}

impl Encode for BeginQuorumEpochResponse {
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        encoder.put_i16(self.error_code)?;
        encoder.put_array(&mut self.topics, version)
    }
}

impl Decode for BeginQuorumEpochResponse {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let error_code = decoder.get_i16()?;
        let topics = decoder.get_array(version)?;

        Ok(Self {
            version,
            error_code,
            topics,
        })
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TopicData {
    pub version: i16,
    pub topic_name: String,
    pub partitions: Vec<PartitionData>,
}

impl TopicData {
    #[must_use]
    pub fn topic_name(self, topic_name: String) -> Self {
        Self { topic_name, ..self }
    }

    #[must_use]
    pub fn partitions(self, partitions: Vec<PartitionData>) -> Self {
        Self { partitions, ..self }
    }
}

impl Versioned for TopicData {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Encode for TopicData {
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        encoder.put_string(&self.topic_name)?;
        encoder.put_array(&mut self.partitions, version)
    }
}

impl Decode for TopicData {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let topic_name = decoder.get_string()?;
        let partitions = decoder.get_array(version)?;

        Ok(Self {
            version,
            topic_name,
            partitions,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PartitionData {
    pub version: i16,
    pub partition_index: i32,
    pub error_code: i16,

    /// The ID of the current leader or -1 if the leader is unknown.
    pub leader_id: i32,

    /// The latest known leader epoch.
    pub leader_epoch: i32,
}

impl PartitionData {
    #[must_use]
    pub fn partition_index(self, partition_index: i32) -> Self {
        Self {
            partition_index,
            ..self
        }
    }

    #[must_use]
    pub fn error_code(self, error_code: i16) -> Self {
        Self { error_code, ..self }
    }

    #[must_use]
    pub fn leader_id(self, leader_id: i32) -> Self {
        Self { leader_id, ..self }
    }

    #[must_use]
    pub fn leader_epoch(self, leader_epoch: i32) -> Self {
        Self {
            leader_epoch,
            ..self
        }
    }
}

impl Versioned for PartitionData {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Encode for PartitionData {
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        encoder.put_i32(self.partition_index)?;
        encoder.put_i16(self.error_code)?;
        encoder.put_i32(self.leader_id)?;
        encoder.put_i32(self.leader_epoch)
    }
}

impl Decode for PartitionData {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let partition_index = decoder.get_i32()?;
        let error_code = decoder.get_i16()?;
        let leader_id = decoder.get_i32()?;
        let leader_epoch = decoder.get_i32()?;

        Ok(Self {
            version,
            partition_index,
            error_code,
            leader_id,
            leader_epoch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledged() -> Result<()> {
        let mut response = BeginQuorumEpochResponse::default().topics(vec![
            TopicData::default()
                .topic_name("t".into())
                .partitions(vec![
                    PartitionData::default()
                        .partition_index(0)
                        .leader_id(1)
                        .leader_epoch(2),
                ]),
        ]);

        let encoded = response.to_bytes(0)?;

        assert_eq!(
            &[
                0, 0, // error_code
                0, 0, 0, 1, // topics
                0, 1, b't', // topic_name
                0, 0, 0, 1, // partitions
                0, 0, 0, 0, // partition_index
                0, 0, // error_code
                0, 0, 0, 1, // leader_id
                0, 0, 0, 2, // leader_epoch
            ][..],
            &encoded[..]
        );

        assert_eq!(response, BeginQuorumEpochResponse::from_bytes(&encoded[..], 0)?);
        Ok(())
    }

    #[test]
    fn from_error_code() -> Result<()> {
        let response = BeginQuorumEpochResponse::from(ErrorCode::InconsistentClusterId);

        assert_eq!(
            ErrorCode::InconsistentClusterId,
            ErrorCode::try_from(response.error_code)?
        );
        assert!(response.topics.is_empty());
        Ok(())
    }
}
