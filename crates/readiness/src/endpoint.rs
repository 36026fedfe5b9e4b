use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised when a member address is not a valid `host:port` pair.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EndpointError {
    /// No `:` separator in the address.
    #[error("endpoint {0:?} is missing a port")]
    MissingPort(String),

    /// Nothing before the `:` separator.
    #[error("endpoint {0:?} is missing a host")]
    MissingHost(String),

    /// The port is not a number in `0..=65535`.
    #[error("endpoint {0:?} has an invalid port")]
    InvalidPort(String),
}

/// A hashring member address in `host:port` form.
///
/// The address string is kept verbatim so that sorting and serialization operate on
/// exactly what the operator wrote.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Endpoint {
    raw: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Parses a `host:port` address. The port follows the last `:`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty or the port is missing or not a
    /// valid `u16`.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let (host, port) = raw
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(raw.to_string()))?;

        if host.is_empty() {
            return Err(EndpointError::MissingHost(raw.to_string()));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointError::InvalidPort(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            host: host.to_string(),
            port,
        })
    }

    /// The address as written in the hashring definition.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The host part of the address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port part of the address.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The port shifted by `offset`, or `None` if the result is not a usable
    /// TCP port.
    #[must_use]
    pub fn port_with_offset(&self, offset: i32) -> Option<u16> {
        let shifted = i32::from(self.port).checked_add(offset)?;

        u16::try_from(shifted).ok().filter(|port| *port != 0)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
