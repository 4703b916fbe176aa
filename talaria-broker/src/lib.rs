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

//! Collaborators around the codec: broker configuration, the plugin chain
//! and a TCP server that answers requests one frame at a time.

use std::{fmt, io, result, str::FromStr, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{sync::broadcast::error::SendError, task::JoinError};

pub mod broker;
pub mod config;
pub mod logging;
pub mod plugin;

#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CancelKind {
    Interrupt,
    Terminate,
}

impl From<CancelKind> for Duration {
    fn from(cancellation: CancelKind) -> Self {
        Duration::from_millis(match cancellation {
            CancelKind::Interrupt => 0,
            CancelKind::Terminate => 5_000,
        })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    BrokerIdAboveReserved {
        broker_id: i32,
        reserved_broker_max_id: i32,
    },
    DuplicateListenerName(String),
    DuplicateListenerPort {
        listener_name: String,
        port: u16,
    },
    FrameTooLarge {
        size: usize,
        maximum: usize,
    },
    InvalidBrokerId(i32),
    InvalidListener(String),
    InvalidPort(String),
    InvalidSecurityProtocolMapping(String),
    Io(Arc<io::Error>),
    Join(#[from] JoinError),
    KafkaProtocol(#[from] talaria_sans_io::Error),
    MalformedFrameSize(i32),
    Message(String),
    MissingPort(String),
    NoListeners,
    Send(#[from] SendError<CancelKind>),
    UnadvertisableListener(String),
    UnknownListenerName(String),
    UnknownSecurityProtocol(String),
    UnsupportedTracingFormat(String),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),

            Self::BrokerIdAboveReserved {
                broker_id,
                reserved_broker_max_id,
            } => write!(
                f,
                "the configured broker id is greater than the reserved broker max id, \
                 adjust the reserved broker max id setting [{broker_id} > {reserved_broker_max_id}]"
            ),

            Self::NoListeners => f.write_str("no listeners set"),

            Self::UnadvertisableListener(listener_name) => write!(
                f,
                "advertising listener on 0.0.0.0 address is not allowed for listener {listener_name}"
            ),

            Self::UnknownListenerName(listener_name) => write!(
                f,
                "listener {listener_name} not found in listener security protocol map"
            ),

            error => write!(f, "{error:?}"),
        }
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TracingFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for TracingFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            otherwise => Err(Error::UnsupportedTracingFormat(otherwise.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format() {
        assert!(matches!("text".parse::<TracingFormat>(), Ok(TracingFormat::Text)));
        assert!(matches!("json".parse::<TracingFormat>(), Ok(TracingFormat::Json)));
        assert!(matches!(
            "xml".parse::<TracingFormat>(),
            Err(Error::UnsupportedTracingFormat(format)) if format == "xml"
        ));
    }

    #[test]
    fn patience() {
        assert_eq!(Duration::ZERO, Duration::from(CancelKind::Interrupt));
        assert_eq!(Duration::from_secs(5), Duration::from(CancelKind::Terminate));
    }
}
