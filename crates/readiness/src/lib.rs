//! Abstract interface for probing the readiness of hashring members.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod endpoint;

pub use endpoint::{Endpoint, EndpointError};

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for readiness prober errors.
pub trait ReadinessProberError: Error + Send + Sync + 'static {}

/// Outcome of probing a single member.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeResult {
    /// The member address exactly as it appeared in the definition.
    pub endpoint: String,

    /// Whether the member passed its probe.
    pub ready: bool,
}

/// A trait representing a readiness check against one hashring member.
#[async_trait]
pub trait ReadinessProber
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type explaining why a member is not ready.
    type Error: ReadinessProberError;

    /// Issues a single readiness check against the endpoint.
    ///
    /// Returns `Ok(())` only when the member is ready to serve traffic. The
    /// check is never retried and must not outlive the prober's timeout.
    async fn probe(&self, endpoint: &Endpoint) -> Result<(), Self::Error>;
}
