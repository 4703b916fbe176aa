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

//! Ask which APIs and versions are supported (API key 18).
//!
//! Versions 0 through 2 have an empty body.

use crate::{
    ApiKey, ApiName, ApiVersionsResponse, Decode, Decoder, Encode, Encoder, Request, Result,
    Versioned,
};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ApiVersionsRequest {
    pub version: i16,
}

impl ApiKey for ApiVersionsRequest {
    const KEY: i16 = 18;
}

impl ApiName for ApiVersionsRequest {
    const NAME: &'static str = "ApiVersionsRequest";
}

impl Versioned for ApiVersionsRequest {
    fn version(&self) -> i16 {
        self.version
    }
}

impl Request for ApiVersionsRequest {
    type Response = ApiVersionsResponse;

    fn required_version(&self) -> i16 {
        0
    }
}

impl Encode for ApiVersionsRequest {
    fn encode(&mut self, _encoder: &mut Encoder, version: i16) -> Result<()> {
        self.version = version;
        Ok(())
    }
}

impl Decode for ApiVersionsRequest {
    fn decode(_decoder: &mut Decoder<'_>, version: i16) -> Result<Self> {
        Ok(Self { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn empty() -> Result<()> {
        let mut request = ApiVersionsRequest::default();
        assert!(request.to_bytes(2)?.is_empty());
        assert_eq!(2, request.version());

        assert_eq!(
            ApiVersionsRequest { version: 1 },
            ApiVersionsRequest::from_bytes(&[][..], 1)?
        );

        assert_eq!(
            Err(Error::TrailingBytes(1)),
            ApiVersionsRequest::from_bytes(&[0][..], 0)
        );

        Ok(())
    }
}
