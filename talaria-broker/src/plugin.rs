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

//! Middleware consulted before a request reaches its handler.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use talaria_sans_io::{ErrorCode, Frame};
use tracing::debug;

/// Inspect a decoded request frame, rejecting it with an [`ErrorCode`].
#[async_trait]
pub trait Plugin: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn setting(&self, _key: &str) -> Option<&str> {
        None
    }

    async fn call(&self, frame: &Frame) -> Result<(), ErrorCode>;
}

/// Plugins in the order they are called. The first rejection wins.
#[derive(Clone, Debug, Default)]
pub struct PluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginChain {
    #[must_use]
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    #[must_use]
    pub fn with(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub async fn call(&self, frame: &Frame) -> Result<(), ErrorCode> {
        for plugin in &self.plugins {
            plugin
                .call(frame)
                .await
                .inspect(|_| debug!(plugin = plugin.name()))
                .inspect_err(|error_code| debug!(plugin = plugin.name(), ?error_code))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use talaria_sans_io::{ApiVersionsRequest, Header};

    use super::*;

    #[derive(Debug, Default)]
    struct Count {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for Count {
        fn name(&self) -> &str {
            "count"
        }

        async fn call(&self, _frame: &Frame) -> Result<(), ErrorCode> {
            _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Deny(ErrorCode);

    #[async_trait]
    impl Plugin for Deny {
        fn name(&self) -> &str {
            "deny"
        }

        fn setting(&self, key: &str) -> Option<&str> {
            (key == "mode").then_some("deny")
        }

        async fn call(&self, _frame: &Frame) -> Result<(), ErrorCode> {
            Err(self.0)
        }
    }

    fn frame() -> Frame {
        Frame {
            size: 0,
            header: Header::Request {
                api_key: 18,
                api_version: 0,
                correlation_id: 1,
                client_id: None,
            },
            body: ApiVersionsRequest::default().into(),
        }
    }

    #[tokio::test]
    async fn empty_chain_allows() {
        let chain = PluginChain::default();
        assert!(chain.is_empty());
        assert_eq!(Ok(()), chain.call(&frame()).await);
    }

    #[tokio::test]
    async fn first_rejection_wins() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));

        let chain = PluginChain::default()
            .with(Count {
                calls: before.clone(),
            })
            .with(Deny(ErrorCode::ClusterAuthorizationFailed))
            .with(Deny(ErrorCode::InvalidRequest))
            .with(Count {
                calls: after.clone(),
            });

        assert_eq!(4, chain.len());
        assert_eq!(
            Err(ErrorCode::ClusterAuthorizationFailed),
            chain.call(&frame()).await
        );
        assert_eq!(1, before.load(Ordering::SeqCst));
        assert_eq!(0, after.load(Ordering::SeqCst));
    }

    #[test]
    fn settings() {
        let deny = Deny(ErrorCode::InvalidRequest);
        assert_eq!(Some("deny"), deny.setting("mode"));
        assert_eq!(None, deny.setting("other"));
        assert_eq!(None, Count::default().setting("mode"));
    }
}
