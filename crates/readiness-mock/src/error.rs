use ringkeeper_readiness::ReadinessProberError;
use thiserror::Error;

/// Error type for the mock readiness prober.
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint was not marked ready.
    #[error("endpoint {0} is not ready")]
    NotReady(String),
}

impl ReadinessProberError for Error {}
