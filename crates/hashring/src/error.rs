use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling hashring files.
#[derive(Debug, Error)]
pub enum Error {
    /// The scheduler was already started.
    #[error("scheduler already started")]
    AlreadyStarted,

    /// Changing ownership of the derived file failed.
    #[error("cannot set {owner} owner on file {path:?}: {source}")]
    Chown {
        /// Requested owner.
        owner: String,
        /// Derived file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: nix::Error,
    },

    /// Source file is not a valid hashring definition.
    #[error("unable to json decode file {path:?}: {source}")]
    Decode {
        /// Source file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Reconciled configuration could not be serialized.
    #[error("unable to json encode hashrings: {0}")]
    Encode(#[source] serde_json::Error),

    /// Directory pattern could not be built.
    #[error("invalid directory pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// The tick interval does not exceed the probe timeout.
    #[error("interval {interval:?} must be greater than endpoint timeout {timeout:?}")]
    IntervalNotGreaterThanTimeout {
        /// Configured interval.
        interval: Duration,
        /// Configured probe timeout.
        timeout: Duration,
    },

    /// Neither or both of a file and a directory were given.
    #[error("either a directory or a file must be set (mutually exclusive)")]
    InvalidSource,

    /// A spawned task panicked or was aborted.
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The configured hashring directory is not a directory.
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    /// Looking up the owner failed.
    #[error("cannot look up owner {owner}: {source}")]
    OwnerLookup {
        /// Requested owner.
        owner: String,
        /// Underlying error.
        #[source]
        source: nix::Error,
    },

    /// A derived file exists but could not be read.
    #[error("unable to read file {path:?}: {source}")]
    ReadDerived {
        /// Derived file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A source file or the hashring directory could not be read.
    #[error("unable to read file {path:?}: {source}")]
    ReadSource {
        /// Source file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The owner does not exist on this system.
    #[error("unknown owner: {0}")]
    UnknownOwner(String),

    /// Writing the derived file failed.
    #[error("cannot save file {path:?}: {source}")]
    WriteDerived {
        /// Derived file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
