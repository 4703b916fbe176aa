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

//! Accept connections on each listener, answering one request frame at a
//! time.

pub mod api_versions;
pub mod begin_quorum_epoch;

use std::{io::ErrorKind, marker::PhantomData, net::SocketAddr, time::Duration};

use api_versions::ApiVersionsRequest;
use begin_quorum_epoch::BeginQuorumEpochRequest;
use bytes::Bytes;
use talaria_sans_io::{
    ApiKey, ApiVersionsResponse, BeginQuorumEpochResponse, Body, ErrorCode, Frame, Header,
    Registry,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    signal::unix::{SignalKind, signal},
    sync::broadcast::{self, Receiver},
    task::JoinSet,
    time::sleep,
};
use tracing::{Instrument, Level, debug, debug_span, error, info, span, warn};

use crate::{
    CancelKind, Error, Result,
    config::{BrokerConfig, SecurityProtocol},
    plugin::PluginChain,
};

/// 100 MiB
pub const MAXIMUM_FRAME_SIZE: usize = 100 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Broker {
    config: BrokerConfig,
    cluster_id: String,
    plugins: PluginChain,
    maximum_frame_size: usize,
}

impl Broker {
    pub fn builder() -> PhantomBuilder {
        Builder::default()
    }

    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub async fn main(self) -> Result<ErrorCode> {
        info!(
            broker_id = self.config.broker_id,
            cluster_id = %self.cluster_id,
            rack = ?self.config.rack
        );

        for advertised_listener in &self.config.advertised_listeners {
            info!(%advertised_listener);
        }

        let listeners = self.bind().await?;

        let mut set = JoinSet::new();

        let (sender, _) = broadcast::channel(16);
        debug!(?sender);

        let mut interrupt_signal = signal(SignalKind::interrupt())?;
        debug!(?interrupt_signal);

        let mut terminate_signal = signal(SignalKind::terminate())?;
        debug!(?terminate_signal);

        for listener in listeners {
            let broker = self.clone();
            let interrupts = sender.subscribe();

            _ = set.spawn(async move {
                broker
                    .listen(listener, interrupts)
                    .await
                    .inspect_err(|err| error!(?err))
            });
        }

        let cancellation = tokio::select! {
            v = set.join_next() => {
                debug!(?v);

                match v {
                    Some(Ok(Err(error))) => return Err(error),
                    Some(Err(join)) => return Err(join.into()),
                    _ => None,
                }
            }

            interrupt = interrupt_signal.recv() => {
                debug!(?interrupt);
                Some(CancelKind::Interrupt)
            }

            terminate = terminate_signal.recv() => {
                debug!(?terminate);
                Some(CancelKind::Terminate)
            }
        };

        if let Some(cancellation) = cancellation {
            _ = sender.send(cancellation).inspect_err(|err| debug!(?err))?;

            let cleanup = async {
                while !set.is_empty() {
                    debug!(len = set.len());

                    _ = set.join_next().await;
                }
            };

            let patience = sleep(Duration::from(cancellation));

            tokio::select! {
                v = cleanup => {
                    debug!(?v)
                }

                _ = patience => {
                    debug!(aborting = set.len());
                    set.abort_all();

                    while !set.is_empty() {
                        _ = set.join_next().await;
                    }
                }
            }
        }

        Ok(ErrorCode::None)
    }

    /// Bind every PLAINTEXT listener. Other security protocols are skipped.
    pub async fn bind(&self) -> Result<Vec<TcpListener>> {
        let mut bound = Vec::new();

        for listener in &self.config.listeners {
            if listener.security_protocol != SecurityProtocol::Plaintext {
                warn!(%listener, security_protocol = %listener.security_protocol, "not binding");
                continue;
            }

            let tcp_listener = TcpListener::bind(listener.bind_address())
                .await
                .inspect_err(|err| error!(?err, %listener))?;

            info!(%listener, local_addr = ?tcp_listener.local_addr());

            bound.push(tcp_listener);
        }

        if bound.is_empty() {
            Err(Error::NoListeners)
        } else {
            Ok(bound)
        }
    }

    pub async fn listen(
        &self,
        listener: TcpListener,
        mut interrupts: Receiver<CancelKind>,
    ) -> Result<()> {
        debug!(?listener);

        let mut set = JoinSet::new();

        loop {
            tokio::select! {
                Ok((stream, addr)) = listener.accept() => {
                    debug!(?addr);

                    let broker = self.clone();

                    let handle = set.spawn(async move {
                        let span = span!(Level::DEBUG, "peer", addr = %addr);

                        async move {
                            match broker.stream_handler(&addr, stream).await {
                                Err(Error::Io(ref io))
                                    if io.kind() == ErrorKind::UnexpectedEof
                                        || io.kind() == ErrorKind::BrokenPipe
                                        || io.kind() == ErrorKind::ConnectionReset => {}

                                Err(error) => {
                                    error!(?error);
                                }

                                Ok(_) => {}
                            }
                        }
                        .instrument(span)
                        .await
                    });

                    debug!(?handle);

                    continue;
                }

                v = set.join_next(), if !set.is_empty() => {
                    debug!(?v);
                }

                Ok(message) = interrupts.recv() => {
                    debug!(?message);
                    break;
                }
            }
        }

        while !set.is_empty() {
            debug!(len = set.len());

            _ = set.join_next().await;
        }

        Ok(())
    }

    async fn stream_handler(&self, peer: &SocketAddr, mut stream: TcpStream) -> Result<()> {
        debug!(?peer, ?stream);

        let mut size = [0u8; 4];

        loop {
            _ = stream.read_exact(&mut size).await?;

            let frame_size = i32::from_be_bytes(size);

            if frame_size == 0 {
                debug!("empty frame");
                continue;
            }

            let length =
                usize::try_from(frame_size).map_err(|_| Error::MalformedFrameSize(frame_size))?;

            if length > self.maximum_frame_size {
                return Err(Error::FrameTooLarge {
                    size: length,
                    maximum: self.maximum_frame_size,
                });
            }

            let mut request = vec![0u8; length + size.len()];
            request[..size.len()].copy_from_slice(&size[..]);

            _ = stream
                .read_exact(&mut request[size.len()..])
                .await
                .inspect_err(|error| debug!(?size, ?error))?;

            let response = self
                .process_request(&request)
                .await
                .inspect_err(|error| error!(?request, ?error))?;
            debug!(?response);

            stream
                .write_all(&response)
                .await
                .inspect_err(|error| debug!(?response, ?error))?;
        }
    }

    /// Answer one request frame, including its size prefix.
    ///
    /// Unknown API keys are an error, as a response cannot be encoded for
    /// them. Unsupported versions, malformed bodies and requests rejected
    /// by a plugin are answered with an error code.
    pub async fn process_request(&self, input: &[u8]) -> Result<Bytes> {
        let Header::Request {
            api_key,
            api_version,
            correlation_id,
            client_id,
        } = Frame::request_header_from_bytes(input)?
        else {
            return Err(talaria_sans_io::Error::ResponseFrame.into());
        };

        let descriptor = Registry::apis().descriptor(api_key)?;

        let span = debug_span!(
            "frame",
            api_name = descriptor.name,
            api_key,
            api_version,
            correlation_id,
            client_id = ?client_id
        );

        async move {
            if !descriptor.is_valid_version(api_version) {
                warn!(supported = ?descriptor.versions);
                return self.unsupported_version(api_key, api_version, correlation_id);
            }

            let frame = match Frame::request_from_bytes(input) {
                Ok(frame) => frame,

                Err(error) => {
                    warn!(?error);
                    return self.error_response(
                        api_key,
                        api_version,
                        correlation_id,
                        ErrorCode::InvalidRequest,
                    );
                }
            };

            if let Err(error_code) = self.plugins.call(&frame).await {
                return self.error_response(api_key, api_version, correlation_id, error_code);
            }

            Frame::response(
                Header::Response { correlation_id },
                self.response_for(frame.body)
                    .inspect(|body| debug!(?body))
                    .inspect_err(|err| error!(?err))?,
                api_key,
                api_version,
            )
            .inspect(|response| debug!(?response))
            .map_err(Into::into)
        }
        .instrument(span)
        .await
    }

    pub fn response_for(&self, body: Body) -> Result<Body> {
        match body {
            Body::ApiVersionsRequest(_) => Ok(ApiVersionsRequest.response()),

            Body::BeginQuorumEpochRequest(request) => {
                Ok(BeginQuorumEpochRequest::with_cluster_id(self.cluster_id.as_str())
                    .response(request))
            }

            otherwise => Err(talaria_sans_io::Error::UnexpectedBody(otherwise.api_name()).into()),
        }
    }

    fn unsupported_version(
        &self,
        api_key: i16,
        api_version: i16,
        correlation_id: i32,
    ) -> Result<Bytes> {
        if api_key == talaria_sans_io::ApiVersionsRequest::KEY {
            // the client may not understand the version it sent, so answer
            // at version 0
            return self.error_response(api_key, 0, correlation_id, ErrorCode::UnsupportedVersion);
        }

        Registry::apis()
            .descriptor(api_key)
            .and_then(|descriptor| descriptor.negotiate(api_version))
            .map_err(Into::into)
            .and_then(|negotiated| {
                self.error_response(
                    api_key,
                    negotiated,
                    correlation_id,
                    ErrorCode::UnsupportedVersion,
                )
            })
    }

    fn error_response(
        &self,
        api_key: i16,
        api_version: i16,
        correlation_id: i32,
        error_code: ErrorCode,
    ) -> Result<Bytes> {
        debug!(api_key, api_version, correlation_id, ?error_code);

        let body: Body = if api_key == talaria_sans_io::ApiVersionsRequest::KEY {
            ApiVersionsResponse::from(error_code).into()
        } else if api_key == talaria_sans_io::BeginQuorumEpochRequest::KEY {
            BeginQuorumEpochResponse::from(error_code).into()
        } else {
            return Err(talaria_sans_io::Error::UnknownApiKey(api_key).into());
        };

        Frame::response(
            Header::Response { correlation_id },
            body,
            api_key,
            api_version,
        )
        .map_err(Into::into)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Builder<C, I> {
    config: C,
    cluster_id: I,
    plugins: PluginChain,
    maximum_frame_size: Option<usize>,
}

pub type PhantomBuilder = Builder<PhantomData<BrokerConfig>, PhantomData<String>>;

impl<C, I> Builder<C, I> {
    pub fn config(self, config: BrokerConfig) -> Builder<BrokerConfig, I> {
        Builder {
            config,
            cluster_id: self.cluster_id,
            plugins: self.plugins,
            maximum_frame_size: self.maximum_frame_size,
        }
    }

    pub fn cluster_id(self, cluster_id: impl Into<String>) -> Builder<C, String> {
        Builder {
            config: self.config,
            cluster_id: cluster_id.into(),
            plugins: self.plugins,
            maximum_frame_size: self.maximum_frame_size,
        }
    }

    #[must_use]
    pub fn plugins(self, plugins: PluginChain) -> Self {
        Self { plugins, ..self }
    }

    #[must_use]
    pub fn maximum_frame_size(self, maximum_frame_size: Option<usize>) -> Self {
        Self {
            maximum_frame_size,
            ..self
        }
    }
}

impl Builder<BrokerConfig, String> {
    #[must_use]
    pub fn build(self) -> Broker {
        Broker {
            config: self.config,
            cluster_id: self.cluster_id,
            plugins: self.plugins,
            maximum_frame_size: self.maximum_frame_size.unwrap_or(MAXIMUM_FRAME_SIZE),
        }
    }
}
