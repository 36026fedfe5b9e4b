//! An implementation of the readiness prober which queries each member's
//! HTTP readiness endpoint.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use ringkeeper_readiness::{Endpoint, ReadinessProber};
use tracing::debug;

/// Path every member exposes for readiness checks.
pub const READY_PATH: &str = "/-/ready";

/// Body a ready member answers with.
pub const READY_BODY: &str = "OK";

/// URL scheme used for readiness requests.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,

    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// The scheme as it appears in a URL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(Error::UnsupportedScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`HttpReadinessProber`].
#[derive(Clone, Debug)]
pub struct HttpProberOptions {
    /// Scheme used to reach members.
    pub scheme: Scheme,

    /// Added to each member's port to find its readiness listener.
    pub port_offset: i32,

    /// Upper bound for a single readiness request, body included.
    pub timeout: Duration,
}

impl Default for HttpProberOptions {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            port_offset: 1,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Readiness prober issuing `GET {scheme}://{host}:{port + offset}/-/ready`.
#[derive(Clone, Debug)]
pub struct HttpReadinessProber {
    client: Client,
    options: HttpProberOptions,
}

impl HttpReadinessProber {
    /// Creates a new `HttpReadinessProber`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(options: HttpProberOptions) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(Error::Client)?;

        Ok(Self { client, options })
    }

    /// The options this prober was built with.
    #[must_use]
    pub const fn options(&self) -> &HttpProberOptions {
        &self.options
    }

    /// Builds the readiness URL for the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the port offset moves the port out of range.
    pub fn ready_url(&self, endpoint: &Endpoint) -> Result<String, Error> {
        let port = endpoint
            .port_with_offset(self.options.port_offset)
            .ok_or_else(|| Error::PortOutOfRange {
                endpoint: endpoint.to_string(),
                offset: self.options.port_offset,
            })?;

        Ok(format!(
            "{}://{}:{}{}",
            self.options.scheme,
            endpoint.host(),
            port,
            READY_PATH
        ))
    }
}

#[async_trait]
impl ReadinessProber for HttpReadinessProber {
    type Error = Error;

    async fn probe(&self, endpoint: &Endpoint) -> Result<(), Self::Error> {
        let url = self.ready_url(endpoint)?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Request {
            url: url.clone(),
            source,
        })?;

        if status == StatusCode::OK && body == READY_BODY {
            debug!("endpoint {} is ready", endpoint);
            Ok(())
        } else {
            Err(Error::NotReady { url, status, body })
        }
    }
}
