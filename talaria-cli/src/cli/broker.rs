// Copyright ⓒ 2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::{EnvVarExp, Result};

use clap::Parser;
use talaria_broker::{
    TracingFormat,
    broker::{Broker, MAXIMUM_FRAME_SIZE},
    config::{BrokerConfig, GENERATED_BROKER_ID, RESERVED_BROKER_MAX_ID},
    logging,
};
use talaria_sans_io::ErrorCode;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug, Parser)]
pub(super) struct Arg {
    /// Comma separated listeners, for example: PLAINTEXT://localhost:9092,CLIENT://[::1]:9093
    #[arg(long, env = "OT_LISTENERS", default_value = "PLAINTEXT://localhost:9092")]
    listeners: EnvVarExp<String>,

    /// Listeners advertised to clients, the listeners are used when absent
    #[arg(long, env = "OT_ADVERTISED_LISTENERS")]
    advertised_listeners: Option<EnvVarExp<String>>,

    /// Security protocol of each custom listener name, for example: CLIENT:SSL,REPLICATION:PLAINTEXT
    #[arg(long, env = "OT_LISTENER_SECURITY_PROTOCOL_MAP")]
    listener_security_protocol_map: Option<EnvVarExp<String>>,

    /// The broker id, -1 generates one above the reserved broker max id
    #[arg(long, env = "OT_BROKER_ID", default_value_t = GENERATED_BROKER_ID, allow_negative_numbers = true)]
    broker_id: i32,

    /// Highest broker id that may be configured rather than generated
    #[arg(long, env = "OT_RESERVED_BROKER_MAX_ID", default_value_t = RESERVED_BROKER_MAX_ID)]
    reserved_broker_max_id: i32,

    /// Rack of this broker
    #[arg(long, env = "OT_RACK")]
    rack: Option<EnvVarExp<String>>,

    /// All members of the same cluster should use the same id, a new one is generated when absent
    #[arg(long, env = "OT_CLUSTER_ID")]
    cluster_id: Option<EnvVarExp<String>>,

    /// Frames larger than this many bytes close the connection
    #[arg(long, env = "OT_MAXIMUM_FRAME_SIZE", default_value_t = MAXIMUM_FRAME_SIZE)]
    maximum_frame_size: usize,

    /// Log format: text or json
    #[arg(long, env = "OT_LOG_FORMAT", default_value = "text")]
    log_format: EnvVarExp<TracingFormat>,
}

impl Arg {
    pub(super) async fn main(self) -> Result<ErrorCode> {
        logging::init(self.log_format.clone().into_inner())?;

        self.build()?
            .main()
            .await
            .inspect(|result| debug!(?result))
            .inspect_err(|err| debug!(?err))
            .map_err(Into::into)
    }

    fn build(self) -> Result<Broker> {
        let cluster_id = self
            .cluster_id
            .map_or_else(|| Uuid::now_v7().to_string(), EnvVarExp::into_inner);

        let config = BrokerConfig::builder()
            .listeners(self.listeners.into_inner())
            .advertised_listeners(self.advertised_listeners.map(EnvVarExp::into_inner))
            .listener_security_protocol_map(
                self.listener_security_protocol_map
                    .map(EnvVarExp::into_inner),
            )
            .broker_id(Some(self.broker_id))
            .reserved_broker_max_id(Some(self.reserved_broker_max_id))
            .rack(self.rack.map(EnvVarExp::into_inner))
            .build()?;

        Ok(Broker::builder()
            .config(config)
            .cluster_id(cluster_id)
            .maximum_frame_size(Some(self.maximum_frame_size))
            .build())
    }
}
