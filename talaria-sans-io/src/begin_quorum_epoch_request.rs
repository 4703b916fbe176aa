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

//! Announce a newly elected quorum leader (API key 53).
//!
//! Version 0 layout:
//!
//! ```text
//! cluster_id   nullable string
//! topics       [topic_name string
//!               partitions [partition_index int32
//!                           leader_id       int32
//!                           leader_epoch    int32]]
//! ```

use crate::{
    ApiKey, ApiName, BeginQuorumEpochResponse, Decode, Decoder, Encode, Encoder, Request, Result,
    Versioned,
};

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BeginQuorumEpochRequest {
    /// The version used by the last encode or decode.
    pub version: i16,

    /// The cluster this request is intended for, if known by the sender.
    pub cluster_id: Option<String>,

    pub topics: Vec<TopicData>,
}

impl BeginQuorumEpochRequest {
    #[must_use]
    pub fn cluster_id(self, cluster_id: Option<String>) -> Self {
        Self { cluster_id, ..self }
    }

    #[must_use]
    pub fn topics(self, topics: Vec<TopicData>) -> Self {
        Self { topics, ..self }
    }
}

impl ApiKey for BeginQuorumEpochRequest {
    const KEY: i16 = 53;
}

impl ApiName for BeginQuorumEpochRequest {
    const NAME: &'static str = "BeginQuorumEpochRequest";
}

impl Versioned for BeginQuorumEpochRequest {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Request for BeginQuorumEpochRequest {
    type Response = BeginQuorumEpochResponse;

    fn required_version(&self) -> i16 {
        // every field is present from version 0
        0
    }
}

impl Encode for BeginQuorumEpochRequest {
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        encoder.put_nullable_string(self.cluster_id.as_deref())?;
        encoder.put_array(&mut self.topics, version)
    }
}

impl Decode for BeginQuorumEpochRequest {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let cluster_id = decoder.get_nullable_string()?;
        let topics = decoder.get_array(version)?;

        Ok(Self {
            version,
            cluster_id,
            topics,
        })
    }
}

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TopicData {
    pub version: i16,

    /// The topic name.
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

    /// The partition index.
    pub partition_index: i32,

    /// The ID of the newly elected leader.
    pub leader_id: i32,

    /// The epoch of the newly elected leader.
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
        encoder.put_i32(self.leader_id)?;
        encoder.put_i32(self.leader_epoch)
    }
}

impl Decode for PartitionData {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let partition_index = decoder.get_i32()?;
        let leader_id = decoder.get_i32()?;
        let leader_epoch = decoder.get_i32()?;

        Ok(Self {
            version,
            partition_index,
            leader_id,
            leader_epoch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn orders() -> BeginQuorumEpochRequest {
        BeginQuorumEpochRequest::default()
            .cluster_id(None)
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
    }

    const ORDERS: [u8; 30] = [
        255, 255, // cluster_id: null
        0, 0, 0, 1, // topics
        0, 6, b'o', b'r', b'd', b'e', b'r', b's', // topic_name
        0, 0, 0, 1, // partitions
        0, 0, 0, 3, // partition_index
        0, 0, 0, 7, // leader_id
        0, 0, 0, 42, // leader_epoch
    ];

    #[test]
    fn encode() -> Result<()> {
        assert_eq!(&ORDERS[..], &orders().to_bytes(0)?[..]);
        Ok(())
    }

    #[test]
    fn decode() -> Result<()> {
        assert_eq!(orders(), BeginQuorumEpochRequest::from_bytes(&ORDERS[..], 0)?);
        Ok(())
    }

    #[test]
    fn truncated() {
        for length in 0..ORDERS.len() {
            assert!(
                matches!(
                    BeginQuorumEpochRequest::from_bytes(&ORDERS[..length], 0),
                    Err(Error::InsufficientData { .. })
                ),
                "length: {length}"
            );
        }
    }

    #[test]
    fn valid_version() {
        let mut request = orders();
        assert!(request.is_valid_version());
        assert_eq!(0, request.required_version());

        request.version = 1;
        assert!(!request.is_valid_version());
    }
}
