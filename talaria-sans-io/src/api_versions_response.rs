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

use crate::{
    ApiDescriptor, ApiKey, ApiName, ApiVersionsRequest, Decode, Decoder, Encode, Encoder,
    ErrorCode, Registry, Response, Result, Versioned,
};

#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ApiVersionsResponse {
    pub version: i16,
    pub error_code: i16,
    pub api_keys: Vec<ApiVersion>,

    /// Present from version 1.
    pub throttle_time_ms: Option<i32>,
}

impl ApiVersionsResponse {
    /// Every API known to the [`Registry`], in key order.
    #[must_use]
    pub fn supported() -> Self {
        Self::default().api_keys(Registry::apis().iter().map(ApiVersion::from).collect())
    }

    #[must_use]
    pub fn error_code(self, error_code: i16) -> Self {
        Self { error_code, ..self }
    }

    #[must_use]
    pub fn api_keys(self, api_keys: Vec<ApiVersion>) -> Self {
        Self { api_keys, ..self }
    }

    #[must_use]
    pub fn throttle_time_ms(self, throttle_time_ms: Option<i32>) -> Self {
        Self {
            throttle_time_ms,
            ..self
        }
    }
}

impl From<ErrorCode> for ApiVersionsResponse {
    fn from(error_code: ErrorCode) -> Self {
        Self::supported().error_code(error_code.into())
    }
}

impl ApiKey for ApiVersionsResponse {
    const KEY: i16 = 18;
}

impl ApiName for ApiVersionsResponse {
    const NAME: &'static str = "ApiVersionsResponse";
}

impl Versioned for ApiVersionsResponse {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Response for ApiVersionsResponse {
    type Request = ApiVersionsRequest;
}

impl Encode for ApiVersionsResponse {
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        encoder.put_i16(self.error_code)?;
        encoder.put_array(&mut self.api_keys, version)?;

        // the field is absent before version 1, and required from it
        if version >= 1 {
            encoder.put_i32(*self.throttle_time_ms.get_or_insert(0))?;
        } else {
            self.throttle_time_ms = None;
        }

        Ok(())
    }
}

impl Decode for ApiVersionsResponse {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let error_code = decoder.get_i16()?;
        let api_keys = decoder.get_array(version)?;

        let throttle_time_ms = if version >= 1 {
            decoder.get_i32().map(Some)?
        } else {
            None
        };

        Ok(Self {
            version,
            error_code,
            api_keys,
            throttle_time_ms,
        })
    }
}

/// The supported version range of one API.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ApiVersion {
    pub version: i16,
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

impl ApiVersion {
    #[must_use]
    pub fn api_key(self, api_key: i16) -> Self {
        Self { api_key, ..self }
    }

    #[must_use]
    pub fn min_version(self, min_version: i16) -> Self {
        Self {
            min_version,
            ..self
        }
    }

    #[must_use]
    pub fn max_version(self, max_version: i16) -> Self {
        Self {
            max_version,
            ..self
        }
    }
}

impl From<&ApiDescriptor> for ApiVersion {
    fn from(descriptor: &ApiDescriptor) -> Self {
        Self::default()
            .api_key(descriptor.api_key)
            .min_version(descriptor.versions.start)
            .max_version(descriptor.versions.end)
    }
}

impl Versioned for ApiVersion {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Encode for ApiVersion {
    fn encode(&mut self, encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        encoder.put_i16(self.api_key)?;
        encoder.put_i16(self.min_version)?;
        encoder.put_i16(self.max_version)
    }
}

impl Decode for ApiVersion {
    fn decode(decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        let api_key = decoder.get_i16()?;
        let min_version = decoder.get_i16()?;
        let max_version = decoder.get_i16()?;

        Ok(Self {
            version,
            api_key,
            min_version,
            max_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported() {
        assert_eq!(
            vec![
                ApiVersion::default()
                    .api_key(18)
                    .min_version(0)
                    .max_version(2),
                ApiVersion::default()
                    .api_key(53)
                    .min_version(0)
                    .max_version(0),
            ],
            ApiVersionsResponse::supported().api_keys
        );
    }

    #[test]
    fn throttle_time_from_v1() -> Result<()> {
        let mut response = ApiVersionsResponse::default().throttle_time_ms(Some(0));

        assert_eq!(&[0, 0, 0, 0, 0, 0][..], &response.to_bytes(0)?[..]);
        assert_eq!(
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0][..],
            &response.to_bytes(1)?[..]
        );

        let decoded = ApiVersionsResponse::from_bytes(&[0, 0, 0, 0, 0, 0][..], 0)?;
        assert_eq!(None, decoded.throttle_time_ms);

        let decoded = ApiVersionsResponse::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 5][..], 2)?;
        assert_eq!(Some(5), decoded.throttle_time_ms);
        assert_eq!(2, decoded.version);

        Ok(())
    }

    #[test]
    fn throttle_time_follows_version() -> Result<()> {
        let mut response = ApiVersionsResponse::default();
        let encoded = response.to_bytes(1)?;

        assert_eq!(Some(0), response.throttle_time_ms);
        assert_eq!(response, ApiVersionsResponse::from_bytes(&encoded[..], 1)?);

        let mut response = ApiVersionsResponse::default().throttle_time_ms(Some(5));
        let encoded = response.to_bytes(0)?;

        assert_eq!(None, response.throttle_time_ms);
        assert_eq!(response, ApiVersionsResponse::from_bytes(&encoded[..], 0)?);

        Ok(())
    }

    #[test]
    fn unsupported_version() -> Result<()> {
        let response = ApiVersionsResponse::from(ErrorCode::UnsupportedVersion);
        assert_eq!(35, response.error_code);
        assert_eq!(2, response.api_keys.len());
        Ok(())
    }
}
