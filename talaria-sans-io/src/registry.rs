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

//! The APIs implemented by this crate, their header versions and the body
//! versions they accept.

use std::{collections::BTreeMap, sync::OnceLock};

use crate::{ApiKey, ApiName, ApiVersionsRequest, BeginQuorumEpochRequest, Error, Result};

/// An inclusive range of versions.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VersionRange {
    pub start: i16,
    pub end: i16,
}

impl VersionRange {
    #[must_use]
    pub const fn within(&self, version: i16) -> bool {
        version >= self.start && version <= self.end
    }
}

/// The immutable description of one API.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ApiDescriptor {
    pub name: &'static str,
    pub api_key: i16,
    pub request_header_version: i16,
    pub response_header_version: i16,
    pub versions: VersionRange,
}

impl ApiDescriptor {
    #[must_use]
    pub const fn is_valid_version(&self, api_version: i16) -> bool {
        self.versions.within(api_version)
    }

    /// The highest version both sides understand: the lesser of the version
    /// the client declared and the highest version supported here.
    pub fn negotiate(&self, client_version: i16) -> Result<i16> {
        let version = client_version.min(self.versions.end);

        if version < self.versions.start {
            Err(Error::UnsupportedVersion {
                api_key: self.api_key,
                api_version: client_version,
            })
        } else {
            Ok(version)
        }
    }
}

static API_DESCRIPTORS: [ApiDescriptor; 2] = [
    ApiDescriptor {
        name: <ApiVersionsRequest as ApiName>::NAME,
        api_key: <ApiVersionsRequest as ApiKey>::KEY,
        request_header_version: 1,
        response_header_version: 0,
        versions: VersionRange { start: 0, end: 2 },
    },
    ApiDescriptor {
        name: <BeginQuorumEpochRequest as ApiName>::NAME,
        api_key: <BeginQuorumEpochRequest as ApiKey>::KEY,
        request_header_version: 1,
        response_header_version: 0,
        versions: VersionRange { start: 0, end: 0 },
    },
];

#[derive(Debug)]
pub struct Registry {
    apis: BTreeMap<i16, &'static ApiDescriptor>,
}

impl Registry {
    fn new() -> Self {
        Self {
            apis: API_DESCRIPTORS
                .iter()
                .map(|descriptor| (descriptor.api_key, descriptor))
                .collect(),
        }
    }

    /// The process wide registry, built on first use and never mutated.
    pub fn apis() -> &'static Registry {
        static APIS: OnceLock<Registry> = OnceLock::new();
        APIS.get_or_init(Registry::new)
    }

    pub fn descriptor(&self, api_key: i16) -> Result<&'static ApiDescriptor> {
        self.apis
            .get(&api_key)
            .copied()
            .ok_or(Error::UnknownApiKey(api_key))
    }

    /// The descriptor for `api_key`, provided `api_version` is supported.
    pub fn check(&self, api_key: i16, api_version: i16) -> Result<&'static ApiDescriptor> {
        self.descriptor(api_key).and_then(|descriptor| {
            if descriptor.is_valid_version(api_version) {
                Ok(descriptor)
            } else {
                Err(Error::UnsupportedVersion {
                    api_key,
                    api_version,
                })
            }
        })
    }

    /// Descriptors in API key order.
    pub fn iter(&self) -> impl Iterator<Item = &'static ApiDescriptor> + '_ {
        self.apis.values().copied()
    }
}
