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

use std::process;

use crate::Result;
use clap::{Parser, Subcommand};
use talaria_sans_io::ErrorCode;
use tracing::debug;

mod broker;

#[derive(Clone, Debug, Parser)]
#[command(name = "talaria", version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    broker: broker::Arg,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Kafka wire protocol broker [default if no command supplied]
    Broker(Box<broker::Arg>),
}

impl Cli {
    pub async fn main() -> Result<ErrorCode> {
        Cli::parse().run().await
    }

    async fn run(self) -> Result<ErrorCode> {
        debug!(pid = process::id());

        match self.command.unwrap_or(Command::Broker(Box::new(self.broker))) {
            Command::Broker(arg) => arg
                .main()
                .await
                .inspect(|result| debug!(?result))
                .inspect_err(|err| debug!(?err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn broker_is_the_default() -> std::result::Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["talaria", "--listeners", "PLAINTEXT://localhost:9093"])?;
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "talaria",
            "broker",
            "--listeners",
            "PLAINTEXT://localhost:9093",
            "--broker-id",
            "-1",
        ])?;
        assert!(matches!(cli.command, Some(Command::Broker(_))));

        Ok(())
    }
}
