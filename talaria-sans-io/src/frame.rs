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

//! Size prefixed frames: an `int32` byte count, a header and a body.

use bytes::Bytes;

use crate::{Body, Decoder, Encode, Encoder, Error, Registry, Result};

/// Header version assumed for API keys missing from the [`Registry`], so
/// that the correlation id of an unknown request can still be read.
const DEFAULT_REQUEST_HEADER_VERSION: i16 = 1;

/// A Kafka API request or response header.
///
/// Only the non-flexible header versions are understood: request headers
/// 0 and 1, response header 0.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Header {
    /// An API request header.
    Request {
        /// The API key being used for this request.
        api_key: i16,

        /// The API version being used for this request.
        api_version: i16,

        /// The correlation ID that should be used by the response to this request.
        correlation_id: i32,

        /// An optional client ID, absent from request header version 0.
        client_id: Option<String>,
    },

    /// An API response header.
    Response {
        /// The correlation ID for the corresponding request.
        correlation_id: i32,
    },
}

impl Header {
    #[must_use]
    pub fn correlation_id(&self) -> i32 {
        match self {
            Self::Request { correlation_id, .. } | Self::Response { correlation_id } => {
                *correlation_id
            }
        }
    }

    pub fn encode(&self, encoder: &mut Encoder, header_version: i16) -> Result<()> {
        match self {
            Self::Request {
                api_key,
                api_version,
                correlation_id,
                client_id,
            } => {
                if header_version > 1 {
                    return Err(Error::UnsupportedHeaderVersion(header_version));
                }

                encoder.put_i16(*api_key)?;
                encoder.put_i16(*api_version)?;
                encoder.put_i32(*correlation_id)?;

                if header_version >= 1 {
                    encoder.put_nullable_string(client_id.as_deref())?;
                }

                Ok(())
            }

            Self::Response { correlation_id } => {
                if header_version != 0 {
                    return Err(Error::UnsupportedHeaderVersion(header_version));
                }

                encoder.put_i32(*correlation_id)
            }
        }
    }

    /// Decode a request header, where the header version is found from the
    /// API key that leads it.
    pub fn decode_request(decoder: &mut Decoder<'_>) -> Result<Self> {
        let api_key = decoder.get_i16()?;
        let api_version = decoder.get_i16()?;
        let correlation_id = decoder.get_i32()?;

        let header_version = Registry::apis()
            .descriptor(api_key)
            .map_or(DEFAULT_REQUEST_HEADER_VERSION, |descriptor| {
                descriptor.request_header_version
            });

        let client_id = match header_version {
            0 => None,
            1 => decoder.get_nullable_string()?,
            otherwise => return Err(Error::UnsupportedHeaderVersion(otherwise)),
        };

        Ok(Self::Request {
            api_key,
            api_version,
            correlation_id,
            client_id,
        })
    }

    pub fn decode_response(decoder: &mut Decoder<'_>, header_version: i16) -> Result<Self> {
        if header_version != 0 {
            return Err(Error::UnsupportedHeaderVersion(header_version));
        }

        decoder
            .get_i32()
            .map(|correlation_id| Self::Response { correlation_id })
    }
}

/// A Kafka API request or response frame.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Frame {
    /// The size of this frame, excluding the size itself.
    pub size: i32,

    /// The frame header.
    pub header: Header,

    /// The frame body.
    pub body: Body,
}

impl Frame {
    /// Encode an API request into a frame of bytes.
    ///
    /// The body is encoded at the version carried by the header, which must
    /// be supported by the [`Registry`].
    pub fn request(header: Header, mut body: Body) -> Result<Bytes> {
        let Header::Request {
            api_key,
            api_version,
            ..
        } = header
        else {
            return Err(Error::ResponseFrame);
        };

        if !body.is_request() || body.api_key() != api_key {
            return Err(Error::UnexpectedBody(body.api_name()));
        }

        let descriptor = Registry::apis().check(api_key, api_version)?;

        Self::encode(
            &header,
            descriptor.request_header_version,
            &mut body,
            api_version,
        )
    }

    /// Decode a request frame, including its size prefix.
    ///
    /// The version in the header is checked with the [`Registry`] before any
    /// of the body is decoded.
    pub fn request_from_bytes(encoded: &[u8]) -> Result<Frame> {
        let (size, mut decoder) = Self::sized(encoded)?;

        let header = Header::decode_request(&mut decoder)?;

        let Header::Request {
            api_key,
            api_version,
            ..
        } = header
        else {
            return Err(Error::ResponseFrame);
        };

        _ = Registry::apis().check(api_key, api_version)?;

        let body = Body::decode_request(&mut decoder, api_key, api_version)?;

        Self::finished(&decoder).map(|()| Frame { size, header, body })
    }

    /// Decode only the header of a request frame.
    ///
    /// Any API key or version is accepted, so that a response can be
    /// correlated with a request that is otherwise not understood.
    pub fn request_header_from_bytes(encoded: &[u8]) -> Result<Header> {
        Self::sized(encoded).and_then(|(_, mut decoder)| Header::decode_request(&mut decoder))
    }

    /// Encode an API response into a frame of bytes, at the version of the
    /// request that it answers.
    pub fn response(
        header: Header,
        mut body: Body,
        api_key: i16,
        api_version: i16,
    ) -> Result<Bytes> {
        if !matches!(header, Header::Response { .. }) {
            return Err(Error::RequestFrame);
        }

        if body.is_request() || body.api_key() != api_key {
            return Err(Error::UnexpectedBody(body.api_name()));
        }

        let descriptor = Registry::apis().check(api_key, api_version)?;

        Self::encode(
            &header,
            descriptor.response_header_version,
            &mut body,
            api_version,
        )
    }

    /// Decode a response frame. Responses do not carry their API key or
    /// version, which must be remembered from the request.
    pub fn response_from_bytes(encoded: &[u8], api_key: i16, api_version: i16) -> Result<Frame> {
        let descriptor = Registry::apis().check(api_key, api_version)?;

        let (size, mut decoder) = Self::sized(encoded)?;
        let header = Header::decode_response(&mut decoder, descriptor.response_header_version)?;
        let body = Body::decode_response(&mut decoder, api_key, api_version)?;

        Self::finished(&decoder).map(|()| Frame { size, header, body })
    }

    /// API request key
    pub fn api_key(&self) -> Result<i16> {
        if let Header::Request { api_key, .. } = self.header {
            Ok(api_key)
        } else {
            Err(Error::ResponseFrame)
        }
    }

    /// API name
    #[must_use]
    pub fn api_name(&self) -> &str {
        self.body.api_name()
    }

    /// API request version
    pub fn api_version(&self) -> Result<i16> {
        if let Header::Request { api_version, .. } = self.header {
            Ok(api_version)
        } else {
            Err(Error::ResponseFrame)
        }
    }

    /// API request/response correlation ID
    #[must_use]
    pub fn correlation_id(&self) -> i32 {
        self.header.correlation_id()
    }

    /// API request client ID
    pub fn client_id(&self) -> Result<Option<&str>> {
        if let Header::Request { ref client_id, .. } = self.header {
            Ok(client_id.as_deref())
        } else {
            Err(Error::ResponseFrame)
        }
    }

    fn encode(
        header: &Header,
        header_version: i16,
        body: &mut Body,
        version: i16,
    ) -> Result<Bytes> {
        let mut encoder = Encoder::new();

        // size is patched once the header and body are written
        encoder.put_i32(0)?;
        header.encode(&mut encoder, header_version)?;
        body.encode(&mut encoder, version)?;

        let size = i32::try_from(encoder.position() - size_of::<i32>())?;
        encoder.patch_i32(0, size)?;

        Ok(encoder.into_bytes())
    }

    /// Read the size prefix, requiring it to match exactly the bytes that
    /// follow it.
    fn sized(encoded: &[u8]) -> Result<(i32, Decoder<'_>)> {
        let mut decoder = Decoder::new(encoded);
        let size = decoder.get_i32()?;
        let wanted = usize::try_from(size).map_err(|_| Error::MalformedLength(size))?;

        match wanted.cmp(&decoder.remaining()) {
            std::cmp::Ordering::Greater => Err(Error::InsufficientData {
                wanted,
                remaining: decoder.remaining(),
            }),

            std::cmp::Ordering::Less => Err(Error::TrailingBytes(decoder.remaining() - wanted)),

            std::cmp::Ordering::Equal => Ok((size, decoder)),
        }
    }

    fn finished(decoder: &Decoder<'_>) -> Result<()> {
        if decoder.remaining() == 0 {
            Ok(())
        } else {
            Err(Error::TrailingBytes(decoder.remaining()))
        }
    }
}
