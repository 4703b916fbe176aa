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
//
//! A Kafka protocol codec that performs no I/O (it operates only on bytes)
//!
//! ## Design
//!
//! Each Kafka API message is a tree: a top level record, repeated topic
//! records and, within those, repeated partition records. Every record in
//! the tree implements [`Encode`] and [`Decode`], which take the negotiated
//! wire version explicitly. The version is stored on the record and passed
//! unchanged to every nested record, so one Rust type serves every version
//! of a message by branching field by field.
//!
//! The bytes themselves are only ever produced by an [`Encoder`] and consumed
//! by a [`Decoder`]. Message types never do their own byte arithmetic.
//!
//! The [`registry`] maps an API key to its header versions and the range of
//! body versions supported here. [`Frame::request_from_bytes`] consults it
//! before any body is decoded.
//!
//! Some useful starting points:
//!
//! - **Data Structures** - [`Frame`], [`Header`] and [`Body`].
//! - **Leader election** - [`BeginQuorumEpochRequest`] and [`BeginQuorumEpochResponse`]
//! - **Version negotiation** - [`ApiVersionsRequest`], [`ApiVersionsResponse`] and [`Registry`].
//!
//! ## Examples
//!
//! Encoding a [`BeginQuorumEpochRequest`] frame and decoding it again:
//!
//! ```
//! # use talaria_sans_io::Error;
//! # fn main() -> Result<(), Error> {
//! use talaria_sans_io::{
//!     ApiKey as _, BeginQuorumEpochRequest, Frame, Header,
//!     begin_quorum_epoch_request::{PartitionData, TopicData},
//! };
//!
//! let header = Header::Request {
//!     api_key: BeginQuorumEpochRequest::KEY,
//!     api_version: 0,
//!     correlation_id: 12,
//!     client_id: Some("voter-1".into()),
//! };
//!
//! let body = BeginQuorumEpochRequest::default()
//!     .cluster_id(None)
//!     .topics(vec![
//!         TopicData::default()
//!             .topic_name("__cluster_metadata".into())
//!             .partitions(vec![
//!                 PartitionData::default()
//!                     .partition_index(0)
//!                     .leader_id(1)
//!                     .leader_epoch(5),
//!             ]),
//!     ]);
//!
//! let encoded = Frame::request(header.clone(), body.clone().into())?;
//! let decoded = Frame::request_from_bytes(&encoded[..])?;
//!
//! assert_eq!(header, decoded.header);
//! assert_eq!(body, BeginQuorumEpochRequest::try_from(decoded.body)?);
//! # Ok(())
//! # }
//! ```

pub mod api_versions_request;
pub mod api_versions_response;
pub mod begin_quorum_epoch_request;
pub mod begin_quorum_epoch_response;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod registry;

use std::{
    fmt::{self, Display, Formatter},
    num,
    process::{ExitCode, Termination},
    result, str,
};

use bytes::Bytes;

pub use api_versions_request::ApiVersionsRequest;
pub use api_versions_response::ApiVersionsResponse;
pub use begin_quorum_epoch_request::BeginQuorumEpochRequest;
pub use begin_quorum_epoch_response::BeginQuorumEpochResponse;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use frame::{Frame, Header};
pub use registry::{ApiDescriptor, Registry, VersionRange};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("encoded {kind} of {length} bytes exceeds the limit of {limit}")]
    EncodeValueTooLarge {
        kind: &'static str,
        length: usize,
        limit: usize,
    },

    #[error("insufficient data: wanted {wanted} bytes with {remaining} remaining")]
    InsufficientData { wanted: usize, remaining: usize },

    #[error("malformed length: {0}")]
    MalformedLength(i32),

    #[error("request frame")]
    RequestFrame,

    #[error("response frame")]
    ResponseFrame,

    #[error("{0} trailing bytes")]
    TrailingBytes(usize),

    #[error("try from int: {0}")]
    TryFromInt(#[from] num::TryFromIntError),

    #[error("unexpected body: {0}")]
    UnexpectedBody(&'static str),

    #[error("unknown api error code: {0}")]
    UnknownApiErrorCode(i16),

    #[error("unknown api key: {0}")]
    UnknownApiKey(i16),

    #[error("unsupported header version: {0}")]
    UnsupportedHeaderVersion(i16),

    #[error("unsupported version: {api_version} of api key: {api_key}")]
    UnsupportedVersion { api_key: i16, api_version: i16 },

    #[error("utf8: {0}")]
    Utf8(#[from] str::Utf8Error),
}

pub type Result<T, E = Error> = result::Result<T, E>;

pub trait ApiKey {
    const KEY: i16;
}

pub trait ApiName {
    const NAME: &'static str;
}

/// The wire version in force for a record, set by the last encode or decode.
pub trait Versioned {
    fn version(&self) -> i16;
}

pub trait Encode {
    /// Record `version` on this record, then write its fields (and every
    /// nested record at the same version) in declared order.
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()>;

    fn to_bytes(&mut self, version: i16) -> Result<Bytes>
    where
        Self: Sized,
    {
        let mut encoder = Encoder::new();
        self.encode(&mut encoder, version)
            .map(|()| encoder.into_bytes())
    }
}

pub trait Decode: Sized {
    /// Read the fields laid out for `version`, stopping at the first failure.
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self>;

    /// Decode a value that must occupy all of `encoded`.
    fn from_bytes(encoded: &[u8], version: i16) -> Result<Self> {
        let mut decoder = Decoder::new(encoded);

        Self::decode(&mut decoder, version).and_then(|decoded| {
            if decoder.remaining() == 0 {
                Ok(decoded)
            } else {
                Err(Error::TrailingBytes(decoder.remaining()))
            }
        })
    }
}

/// All Kafka API requests implement this trait
pub trait Request:
    ApiKey
    + ApiName
    + Versioned
    + Encode
    + Decode
    + fmt::Debug
    + Default
    + Into<Body>
    + TryFrom<Body, Error = Error>
    + Send
    + Sync
    + 'static
{
    type Response: Response;

    /// The request header version the framing layer must use.
    fn header_version() -> Result<i16> {
        Registry::apis()
            .descriptor(Self::KEY)
            .map(|descriptor| descriptor.request_header_version)
    }

    /// Whether the version currently set on this request is supported.
    fn is_valid_version(&self) -> bool {
        Registry::apis()
            .descriptor(Self::KEY)
            .is_ok_and(|descriptor| descriptor.versions.within(self.version()))
    }

    /// The lowest version able to carry every field of this request.
    fn required_version(&self) -> i16;
}

/// All Kafka API responses implement this trait
pub trait Response:
    ApiKey
    + ApiName
    + Versioned
    + Encode
    + Decode
    + fmt::Debug
    + Default
    + Into<Body>
    + TryFrom<Body, Error = Error>
    + Send
    + Sync
    + 'static
{
    type Request: Request;
}

macro_rules! body {
    ($($request:ident => $response:ident),+ $(,)?) => {
        /// The body of a frame: one of the supported requests or responses.
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum Body {
            $(
                $request($request),
                $response($response),
            )+
        }

        impl Body {
            #[must_use]
            pub fn api_key(&self) -> i16 {
                match self {
                    $(
                        Self::$request(_) => <$request as ApiKey>::KEY,
                        Self::$response(_) => <$response as ApiKey>::KEY,
                    )+
                }
            }

            #[must_use]
            pub fn api_name(&self) -> &'static str {
                match self {
                    $(
                        Self::$request(_) => <$request as ApiName>::NAME,
                        Self::$response(_) => <$response as ApiName>::NAME,
                    )+
                }
            }

            /// True for request bodies, false for response bodies.
            #[must_use]
            pub fn is_request(&self) -> bool {
                match self {
                    $(
                        Self::$request(_) => true,
                        Self::$response(_) => false,
                    )+
                }
            }

            #[must_use]
            pub fn version(&self) -> i16 {
                match self {
                    $(
                        Self::$request(inner) => inner.version(),
                        Self::$response(inner) => inner.version(),
                    )+
                }
            }

            pub(crate) fn decode_request(
                decoder: &mut Decoder<'_>,
                api_key: i16,
                api_version: i16,
            ) -> Result<Self> {
                $(
                    if api_key == <$request as ApiKey>::KEY {
                        return $request::decode(decoder, api_version).map(Self::$request);
                    }
                )+

                Err(Error::UnknownApiKey(api_key))
            }

            pub(crate) fn decode_response(
                decoder: &mut Decoder<'_>,
                api_key: i16,
                api_version: i16,
            ) -> Result<Self> {
                $(
                    if api_key == <$response as ApiKey>::KEY {
                        return $response::decode(decoder, api_version).map(Self::$response);
                    }
                )+

                Err(Error::UnknownApiKey(api_key))
            }
        }

        impl Encode for Body {
            fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
                match self {
                    $(
                        Self::$request(inner) => inner.encode(encoder, version),
                        Self::$response(inner) => inner.encode(encoder, version),
                    )+
                }
            }
        }

        $(
            impl From<$request> for Body {
                fn from(value: $request) -> Self {
                    Self::$request(value)
                }
            }

            impl TryFrom<Body> for $request {
                type Error = Error;

                fn try_from(value: Body) -> Result<Self, Self::Error> {
                    if let Body::$request(inner) = value {
                        Ok(inner)
                    } else {
                        Err(Error::UnexpectedBody(value.api_name()))
                    }
                }
            }

            impl From<$response> for Body {
                fn from(value: $response) -> Self {
                    Self::$response(value)
                }
            }

            impl TryFrom<Body> for $response {
                type Error = Error;

                fn try_from(value: Body) -> Result<Self, Self::Error> {
                    if let Body::$response(inner) = value {
                        Ok(inner)
                    } else {
                        Err(Error::UnexpectedBody(value.api_name()))
                    }
                }
            }
        )+
    };
}

body! {
    ApiVersionsRequest => ApiVersionsResponse,
    BeginQuorumEpochRequest => BeginQuorumEpochResponse,
}

#[non_exhaustive]
#[derive(Clone, Copy, Default, Eq, Hash, Debug, Ord, PartialEq, PartialOrd)]
/// Kafka API response error codes.
pub enum ErrorCode {
    UnknownServerError,
    #[default]
    None,
    CorruptMessage,
    UnknownTopicOrPartition,
    NotLeaderOrFollower,
    ClusterAuthorizationFailed,
    UnsupportedVersion,
    InvalidRequest,
    FencedLeaderEpoch,
    UnknownLeaderEpoch,
    InconsistentVoterSet,
    InconsistentClusterId,
}

impl TryFrom<i16> for ErrorCode {
    type Error = Error;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::UnknownServerError),
            0 => Ok(Self::None),
            2 => Ok(Self::CorruptMessage),
            3 => Ok(Self::UnknownTopicOrPartition),
            6 => Ok(Self::NotLeaderOrFollower),
            31 => Ok(Self::ClusterAuthorizationFailed),
            35 => Ok(Self::UnsupportedVersion),
            42 => Ok(Self::InvalidRequest),
            74 => Ok(Self::FencedLeaderEpoch),
            75 => Ok(Self::UnknownLeaderEpoch),
            94 => Ok(Self::InconsistentVoterSet),
            104 => Ok(Self::InconsistentClusterId),
            otherwise => Err(Error::UnknownApiErrorCode(otherwise)),
        }
    }
}

impl From<ErrorCode> for i16 {
    fn from(value: ErrorCode) -> Self {
        match value {
            ErrorCode::UnknownServerError => -1,
            ErrorCode::None => 0,
            ErrorCode::CorruptMessage => 2,
            ErrorCode::UnknownTopicOrPartition => 3,
            ErrorCode::NotLeaderOrFollower => 6,
            ErrorCode::ClusterAuthorizationFailed => 31,
            ErrorCode::UnsupportedVersion => 35,
            ErrorCode::InvalidRequest => 42,
            ErrorCode::FencedLeaderEpoch => 74,
            ErrorCode::UnknownLeaderEpoch => 75,
            ErrorCode::InconsistentVoterSet => 94,
            ErrorCode::InconsistentClusterId => 104,
        }
    }
}

impl Termination for ErrorCode {
    fn report(self) -> ExitCode {
        if let Self::None = self {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::UnknownServerError => f.write_str(
                "The server experienced an unexpected error when processing the request.",
            ),
            ErrorCode::None => f.write_str("No error."),
            ErrorCode::CorruptMessage => f.write_str(
                "This message has failed its CRC checksum, exceeds the valid size, has a null key \
                 for a compacted topic, or is otherwise corrupt.",
            ),
            ErrorCode::UnknownTopicOrPartition => {
                f.write_str("This server does not host this topic-partition.")
            }
            ErrorCode::NotLeaderOrFollower => f.write_str(
                "For requests intended only for the leader, this error indicates that the broker \
                 is not the current leader.",
            ),
            ErrorCode::ClusterAuthorizationFailed => f.write_str("Cluster authorization failed."),
            ErrorCode::UnsupportedVersion => {
                f.write_str("The version of API is not supported.")
            }
            ErrorCode::InvalidRequest => f.write_str(
                "This most likely occurs because of a request being malformed by the client \
                 library or the message was sent to an incompatible broker.",
            ),
            ErrorCode::FencedLeaderEpoch => f.write_str(
                "The leader epoch in the request is older than the epoch on the broker.",
            ),
            ErrorCode::UnknownLeaderEpoch => f.write_str(
                "The leader epoch in the request is newer than the epoch on the broker.",
            ),
            ErrorCode::InconsistentVoterSet => f.write_str(
                "Indicates that the either the sender or recipient of a voter-only request is not \
                 one of the expected voters.",
            ),
            ErrorCode::InconsistentClusterId => f.write_str(
                "The clusterId in the request does not match that found on the server.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code() -> Result<()> {
        for error_code in [-1, 0, 2, 3, 6, 31, 35, 42, 74, 75, 94, 104] {
            assert_eq!(error_code, ErrorCode::try_from(error_code).map(i16::from)?);
        }

        assert_eq!(
            Err(Error::UnknownApiErrorCode(1)),
            ErrorCode::try_from(1)
        );

        Ok(())
    }

    #[test]
    fn termination() {
        assert_eq!(ExitCode::SUCCESS, ErrorCode::None.report());
        assert_eq!(ExitCode::FAILURE, ErrorCode::UnsupportedVersion.report());
    }

    #[test]
    fn body_conversion() {
        let body = Body::from(BeginQuorumEpochRequest::default());
        assert_eq!(BeginQuorumEpochRequest::KEY, body.api_key());
        assert_eq!("BeginQuorumEpochRequest", body.api_name());

        assert_eq!(
            Err(Error::UnexpectedBody("BeginQuorumEpochRequest")),
            ApiVersionsRequest::try_from(body)
        );
    }
}
