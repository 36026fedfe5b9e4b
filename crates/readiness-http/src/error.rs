use reqwest::StatusCode;
use ringkeeper_readiness::ReadinessProberError;
use thiserror::Error;

/// Errors explaining why a member did not pass its readiness check.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The member answered, but not with `200 OK`.
    #[error("endpoint is not ready: getting {status} from {url}: {body}")]
    NotReady {
        /// URL that was probed.
        url: String,
        /// Status code returned by the member.
        status: StatusCode,
        /// Response body returned by the member.
        body: String,
    },

    /// The configured port offset moves the port out of range.
    #[error("port offset {offset} is out of range for endpoint {endpoint}")]
    PortOutOfRange {
        /// The member address.
        endpoint: String,
        /// The configured offset.
        offset: i32,
    },

    /// The request failed or timed out.
    #[error("error sending request to {url}: {source}")]
    Request {
        /// URL that was probed.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Unsupported URL scheme.
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
}

impl ReadinessProberError for Error {}
