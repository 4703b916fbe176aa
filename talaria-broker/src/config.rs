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

//! Broker identity and listener configuration.
//!
//! Listeners are written as `NAME://host:port`, where `NAME` is either a
//! security protocol or a listener name found in the listener security
//! protocol map (`NAME:PROTOCOL,NAME:PROTOCOL`).

use std::{
    collections::BTreeMap,
    fmt,
    marker::PhantomData,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    str::FromStr,
};

use tracing::debug;
use url::{Host, ParseError, Url};

use crate::{Error, Result};

/// Generated broker ids start above this value.
pub const RESERVED_BROKER_MAX_ID: i32 = 1000;

/// A broker id of -1 asks for a generated id.
pub const GENERATED_BROKER_ID: i32 = -1;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SecurityProtocol {
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl FromStr for SecurityProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            "SASL_PLAINTEXT" => Ok(Self::SaslPlaintext),
            "SASL_SSL" => Ok(Self::SaslSsl),
            _ => Err(Error::UnknownSecurityProtocol(s.to_owned())),
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        })
    }
}

/// Listener names, compared without case, with their security protocol.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SecurityProtocolMap(BTreeMap<String, SecurityProtocol>);

impl SecurityProtocolMap {
    #[must_use]
    pub fn get(&self, listener_name: &str) -> Option<SecurityProtocol> {
        self.0.get(&listener_name.to_ascii_lowercase()).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for SecurityProtocolMap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        without_whitespace(s)
            .split(',')
            .filter(|mapping| !mapping.is_empty())
            .map(|mapping| {
                mapping
                    .split_once(':')
                    .filter(|(listener_name, _)| !listener_name.is_empty())
                    .ok_or_else(|| Error::InvalidSecurityProtocolMapping(mapping.to_owned()))
                    .and_then(|(listener_name, security_protocol)| {
                        security_protocol.parse::<SecurityProtocol>().map(|security_protocol| {
                            (listener_name.to_ascii_lowercase(), security_protocol)
                        })
                    })
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Self)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listener {
    /// The lower case scheme of the listener.
    pub listener_name: String,

    /// None when the listener should bind to every interface.
    pub host: Option<Host>,

    pub port: u16,
    pub security_protocol: SecurityProtocol,
}

impl Listener {
    pub fn parse(listener: &str, security_protocol_map: &SecurityProtocolMap) -> Result<Self> {
        let invalid = || Error::InvalidListener(listener.to_owned());

        // listener names such as SASL_SSL are not valid url schemes
        let (scheme, authority) = listener
            .split_once("://")
            .filter(|(scheme, _)| !scheme.is_empty())
            .ok_or_else(invalid)?;

        let security_protocol = scheme.parse::<SecurityProtocol>().or_else(|_| {
            security_protocol_map
                .get(scheme)
                .ok_or_else(|| Error::UnknownListenerName(scheme.to_owned()))
        })?;

        let every_interface = authority.starts_with(':');

        let url = Url::parse(&if every_interface {
            format!("tcp://[::]{authority}")
        } else {
            format!("tcp://{authority}")
        })
        .map_err(|error| match error {
            ParseError::InvalidPort => Error::InvalidPort(listener.to_owned()),
            _ => invalid(),
        })?;

        if !matches!(url.path(), "" | "/")
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
        {
            return Err(invalid());
        }

        let port = url
            .port()
            .ok_or_else(|| Error::MissingPort(listener.to_owned()))?;

        let host = if every_interface {
            None
        } else {
            url.host().map(|host| match host {
                Host::Domain(domain) => domain
                    .parse::<Ipv4Addr>()
                    .map_or_else(|_| Host::Domain(domain.to_owned()), Host::Ipv4),
                Host::Ipv4(ipv4) => Host::Ipv4(ipv4),
                Host::Ipv6(ipv6) => Host::Ipv6(ipv6),
            })
        };

        Ok(Self {
            listener_name: scheme.to_ascii_lowercase(),
            host,
            port,
            security_protocol,
        })
    }

    /// Hostnames and an absent host count as not being IPv4.
    #[must_use]
    pub fn is_ipv4(&self) -> bool {
        matches!(self.host, Some(Host::Ipv4(_)))
    }

    /// Clients cannot connect to an absent or unspecified host.
    #[must_use]
    pub fn is_advertisable(&self) -> bool {
        match self.host {
            None => false,
            Some(Host::Ipv4(ipv4)) => !ipv4.is_unspecified(),
            Some(Host::Ipv6(ipv6)) => !ipv6.is_unspecified(),
            Some(Host::Domain(ref domain)) => !domain.is_empty(),
        }
    }

    /// The address to bind, which is every interface when no host is given.
    #[must_use]
    pub fn bind_address(&self) -> String {
        match self.host {
            None => SocketAddr::from((Ipv6Addr::UNSPECIFIED, self.port)).to_string(),
            Some(Host::Ipv4(ipv4)) => SocketAddr::from((ipv4, self.port)).to_string(),
            Some(Host::Ipv6(ipv6)) => SocketAddr::from((ipv6, self.port)).to_string(),
            Some(Host::Domain(ref domain)) => format!("{domain}:{}", self.port),
        }
    }
}

impl fmt::Display for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            Some(ref host) => write!(f, "{}://{host}:{}", self.listener_name, self.port),
            None => write!(f, "{}://:{}", self.listener_name, self.port),
        }
    }
}

fn without_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse a comma separated list of listeners, ignoring whitespace and empty
/// entries.
pub fn parse_listeners(
    listeners: &str,
    security_protocol_map: &SecurityProtocolMap,
) -> Result<Vec<Listener>> {
    without_whitespace(listeners)
        .split(',')
        .filter(|listener| !listener.is_empty())
        .map(|listener| Listener::parse(listener, security_protocol_map))
        .collect()
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BrokerConfig {
    pub broker_id: i32,
    pub rack: Option<String>,
    pub listeners: Vec<Listener>,
    pub advertised_listeners: Vec<Listener>,
}

impl BrokerConfig {
    pub fn builder() -> PhantomBuilder {
        Builder::default()
    }

    /// Ports and listener names must be unique, unless one listener is
    /// IPv4 and the other is not.
    pub fn validate_listeners(&self) -> Result<()> {
        let mut ports: BTreeMap<u16, &Listener> = BTreeMap::new();
        let mut listener_names: BTreeMap<&str, &Listener> = BTreeMap::new();

        for listener in &self.listeners {
            let same_family = |existing: &&Listener| existing.is_ipv4() == listener.is_ipv4();

            if ports.get(&listener.port).is_some_and(same_family) {
                return Err(Error::DuplicateListenerPort {
                    listener_name: listener.listener_name.clone(),
                    port: listener.port,
                });
            }

            if listener_names
                .get(listener.listener_name.as_str())
                .is_some_and(same_family)
            {
                return Err(Error::DuplicateListenerName(listener.listener_name.clone()));
            }

            _ = ports.insert(listener.port, listener);
            _ = listener_names.insert(listener.listener_name.as_str(), listener);
        }

        Ok(())
    }

    /// Clients cannot connect to an unspecified address.
    pub fn validate_advertised_listeners(&self) -> Result<()> {
        self.advertised_listeners
            .iter()
            .find(|listener| !listener.is_advertisable())
            .map_or(Ok(()), |listener| {
                Err(Error::UnadvertisableListener(
                    listener.listener_name.clone(),
                ))
            })
    }
}

#[derive(Clone, Debug, Default)]
pub struct Builder<L> {
    listeners: L,
    advertised_listeners: Option<String>,
    listener_security_protocol_map: Option<String>,
    broker_id: Option<i32>,
    reserved_broker_max_id: Option<i32>,
    rack: Option<String>,
}

pub type PhantomBuilder = Builder<PhantomData<String>>;

impl<L> Builder<L> {
    pub fn listeners(self, listeners: impl Into<String>) -> Builder<String> {
        Builder {
            listeners: listeners.into(),
            advertised_listeners: self.advertised_listeners,
            listener_security_protocol_map: self.listener_security_protocol_map,
            broker_id: self.broker_id,
            reserved_broker_max_id: self.reserved_broker_max_id,
            rack: self.rack,
        }
    }

    #[must_use]
    pub fn advertised_listeners(self, advertised_listeners: Option<String>) -> Self {
        Self {
            advertised_listeners,
            ..self
        }
    }

    #[must_use]
    pub fn listener_security_protocol_map(
        self,
        listener_security_protocol_map: Option<String>,
    ) -> Self {
        Self {
            listener_security_protocol_map,
            ..self
        }
    }

    #[must_use]
    pub fn broker_id(self, broker_id: Option<i32>) -> Self {
        Self { broker_id, ..self }
    }

    #[must_use]
    pub fn reserved_broker_max_id(self, reserved_broker_max_id: Option<i32>) -> Self {
        Self {
            reserved_broker_max_id,
            ..self
        }
    }

    #[must_use]
    pub fn rack(self, rack: Option<String>) -> Self {
        Self { rack, ..self }
    }
}

impl Builder<String> {
    pub fn build(self) -> Result<BrokerConfig> {
        debug!(?self);

        let security_protocol_map = self
            .listener_security_protocol_map
            .as_deref()
            .map_or(Ok(SecurityProtocolMap::default()), str::parse)?;

        let listeners = parse_listeners(&self.listeners, &security_protocol_map)?;

        if listeners.is_empty() {
            return Err(Error::NoListeners);
        }

        let advertised_listeners = self
            .advertised_listeners
            .as_deref()
            .map(|advertised_listeners| {
                parse_listeners(advertised_listeners, &security_protocol_map)
            })
            .transpose()?
            .filter(|advertised_listeners| !advertised_listeners.is_empty())
            .unwrap_or_else(|| listeners.clone());

        let reserved_broker_max_id = self
            .reserved_broker_max_id
            .unwrap_or(RESERVED_BROKER_MAX_ID);

        let broker_id = match self.broker_id.unwrap_or(GENERATED_BROKER_ID) {
            GENERATED_BROKER_ID => reserved_broker_max_id
                .checked_add(1)
                .ok_or(Error::InvalidBrokerId(GENERATED_BROKER_ID))?,

            broker_id if broker_id > reserved_broker_max_id => {
                return Err(Error::BrokerIdAboveReserved {
                    broker_id,
                    reserved_broker_max_id,
                });
            }

            broker_id if broker_id < 0 => return Err(Error::InvalidBrokerId(broker_id)),

            broker_id => broker_id,
        };

        let config = BrokerConfig {
            broker_id,
            rack: self.rack,
            listeners,
            advertised_listeners,
        };

        config.validate_listeners()?;
        config.validate_advertised_listeners()?;

        Ok(config).inspect(|config| debug!(?config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_whitespace_or_empty_entries() -> Result<()> {
        let listeners = parse_listeners(
            " PLAINTEXT://localhost:9092 , ,SSL://[::1]:9093,",
            &SecurityProtocolMap::default(),
        )?;

        assert_eq!(2, listeners.len());
        assert_eq!("plaintext://localhost:9092", listeners[0].to_string());
        assert_eq!("ssl://[::1]:9093", listeners[1].to_string());
        assert_eq!("[::1]:9093", listeners[1].bind_address());
        assert_eq!("localhost:9092", listeners[0].bind_address());

        Ok(())
    }

    #[test]
    fn bind_every_interface() -> Result<()> {
        let listener = Listener::parse("PLAINTEXT://:9092", &SecurityProtocolMap::default())?;
        assert_eq!("[::]:9092", listener.bind_address());
        assert_eq!("plaintext://:9092", listener.to_string());
        assert!(!listener.is_advertisable());
        Ok(())
    }

    #[test]
    fn generated_broker_id() -> Result<()> {
        let config = BrokerConfig::builder()
            .listeners("PLAINTEXT://localhost:9092")
            .reserved_broker_max_id(Some(2000))
            .build()?;

        assert_eq!(2001, config.broker_id);
        assert_eq!(config.listeners, config.advertised_listeners);

        Ok(())
    }
}
