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

use common::init_tracing;
use pretty_assertions::assert_eq;
use talaria_sans_io::{
    ApiVersionsResponse, Body, Error, ErrorCode, Frame, Header, Result,
    begin_quorum_epoch_request::{self, BeginQuorumEpochRequest},
    begin_quorum_epoch_response::{BeginQuorumEpochResponse, PartitionData, TopicData},
};

pub mod common;

#[test]
fn api_versions_response_v0_000() -> Result<()> {
    let _guard = init_tracing();

    let encoded = Frame::response(
        Header::Response { correlation_id: 1 },
        ApiVersionsResponse::supported().into(),
        18,
        0,
    )?;

    assert_eq!(
        &[
            0, 0, 0, 22, // size
            0, 0, 0, 1, // correlation_id
            0, 0, // error_code
            0, 0, 0, 2, // api_keys
            0, 18, 0, 0, 0, 2, // ApiVersions
            0, 53, 0, 0, 0, 0, // BeginQuorumEpoch
        ][..],
        &encoded[..]
    );

    Ok(())
}

#[test]
fn api_versions_response_v2_000() -> Result<()> {
    let _guard = init_tracing();

    let encoded = Frame::response(
        Header::Response { correlation_id: 2 },
        ApiVersionsResponse::supported()
            .throttle_time_ms(Some(0))
            .into(),
        18,
        2,
    )?;

    assert_eq!(
        &[
            0, 0, 0, 26, // size
            0, 0, 0, 2, // correlation_id
            0, 0, // error_code
            0, 0, 0, 2, // api_keys
            0, 18, 0, 0, 0, 2, // ApiVersions
            0, 53, 0, 0, 0, 0, // BeginQuorumEpoch
            0, 0, 0, 0, // throttle_time_ms
        ][..],
        &encoded[..]
    );

    Ok(())
}

#[test]
fn begin_quorum_epoch_response_v0_000() -> Result<()> {
    let _guard = init_tracing();

    let encoded = Frame::response(
        Header::Response { correlation_id: 12 },
        BeginQuorumEpochResponse::default()
            .error_code(ErrorCode::None.into())
            .topics(vec![
                TopicData::default()
                    .topic_name("orders".into())
                    .partitions(vec![
                        PartitionData::default()
                            .partition_index(3)
                            .error_code(ErrorCode::None.into())
                            .leader_id(7)
                            .leader_epoch(42),
                    ]),
            ])
            .into(),
        53,
        0,
    )?;

    assert_eq!(
        &[
            0, 0, 0, 36, // size
            0, 0, 0, 12, // correlation_id
            0, 0, // error_code
            0, 0, 0, 1, 0, 6, b'o', b'r', b'd', b'e', b'r', b's', // topics
            0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 0, 0, 7, 0, 0, 0, 42, // partitions
        ][..],
        &encoded[..]
    );

    Ok(())
}

#[test]
fn begin_quorum_epoch_request_unsupported_version() {
    let _guard = init_tracing();

    assert_eq!(
        Err(Error::UnsupportedVersion {
            api_key: 53,
            api_version: 1
        }),
        Frame::request(
            Header::Request {
                api_key: 53,
                api_version: 1,
                correlation_id: 1,
                client_id: None,
            },
            BeginQuorumEpochRequest::default().into(),
        )
    );
}

#[test]
fn begin_quorum_epoch_request_topic_name_too_long() {
    let _guard = init_tracing();

    let topic_name = "t".repeat(32_768);

    let body: Body = BeginQuorumEpochRequest::default()
        .topics(vec![
            begin_quorum_epoch_request::TopicData::default().topic_name(topic_name),
        ])
        .into();

    assert_eq!(
        Err(Error::EncodeValueTooLarge {
            kind: "string",
            length: 32_768,
            limit: 32_767
        }),
        Frame::request(
            Header::Request {
                api_key: 53,
                api_version: 0,
                correlation_id: 1,
                client_id: None,
            },
            body,
        )
    );
}
