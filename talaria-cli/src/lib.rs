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

use std::{collections::HashMap, convert::Infallible, env::vars, fmt, result, str::FromStr};

mod cli;

pub use cli::Cli;
use regex::{Regex, Replacer};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    Broker(Box<talaria_broker::Error>),
    DotEnv(#[from] dotenv::Error),
    Regex(#[from] regex::Error),
}

impl From<talaria_broker::Error> for Error {
    fn from(value: talaria_broker::Error) -> Self {
        Self::Broker(Box::new(value))
    }
}

impl From<Infallible> for Error {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broker(broker) => write!(f, "{broker}"),
            otherwise => write!(f, "{otherwise:?}"),
        }
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;

/// Replaces `${VAR}` references with their value, or nothing when unset.
#[derive(Clone, Debug)]
pub struct VarRep(HashMap<String, String>);

impl From<HashMap<String, String>> for VarRep {
    fn from(value: HashMap<String, String>) -> Self {
        Self(value)
    }
}

impl VarRep {
    fn replace(&self, haystack: &str) -> Result<String> {
        Regex::new(r"\$\{(?<var>[^\}]+)\}")
            .map(|re| re.replace_all(haystack, self).into_owned())
            .map_err(Into::into)
    }
}

impl Replacer for &VarRep {
    fn replace_append(&mut self, caps: &regex::Captures<'_>, dst: &mut String) {
        if let Some(value) = caps
            .name("var")
            .and_then(|variable| self.0.get(variable.as_str()))
        {
            dst.push_str(value);
        }
    }
}

/// A command line value with environment variables expanded before it is
/// parsed.
#[derive(Clone, Debug)]
pub struct EnvVarExp<T>(T);

impl<T> EnvVarExp<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> FromStr for EnvVarExp<T>
where
    T: FromStr,
    Error: From<<T as FromStr>::Err>,
{
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VarRep::from(vars().collect::<HashMap<_, _>>())
            .replace(s)
            .and_then(|s| T::from_str(&s).map_err(Into::into))
            .map(|t| Self(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_rep() -> VarRep {
        VarRep::from(HashMap::from([
            ("HOST".to_owned(), "broker".to_owned()),
            ("PORT".to_owned(), "9092".to_owned()),
        ]))
    }

    #[test]
    fn replace() -> Result<()> {
        assert_eq!(
            "PLAINTEXT://broker:9092",
            var_rep().replace("PLAINTEXT://${HOST}:${PORT}")?
        );
        Ok(())
    }

    #[test]
    fn unset_is_empty() -> Result<()> {
        assert_eq!("PLAINTEXT://:9092", var_rep().replace("PLAINTEXT://${NOPE}:9092")?);
        Ok(())
    }

    #[test]
    fn without_reference() -> Result<()> {
        assert_eq!("1000", var_rep().replace("1000")?);
        Ok(())
    }
}
