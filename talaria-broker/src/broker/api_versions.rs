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

use talaria_sans_io::{ApiVersionsResponse, Body, ErrorCode};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ApiVersionsRequest;

impl ApiVersionsRequest {
    /// Every API in the registry, with no throttling.
    pub fn response(&self) -> Body {
        ApiVersionsResponse::supported()
            .error_code(ErrorCode::None.into())
            .throttle_time_ms(Some(0))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use talaria_sans_io::Registry;

    use super::*;

    #[test]
    fn every_registered_api() {
        let Body::ApiVersionsResponse(response) = ApiVersionsRequest.response() else {
            panic!("expected an api versions response");
        };

        assert_eq!(0, response.error_code);
        assert_eq!(Some(0), response.throttle_time_ms);
        assert_eq!(
            Registry::apis()
                .iter()
                .map(|descriptor| (
                    descriptor.api_key,
                    descriptor.versions.start,
                    descriptor.versions.end
                ))
                .collect::<Vec<_>>(),
            response
                .api_keys
                .iter()
                .map(|api| (api.api_key, api.min_version, api.max_version))
                .collect::<Vec<_>>()
        );
    }
}
