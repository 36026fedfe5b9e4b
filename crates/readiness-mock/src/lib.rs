//! A mock implementation of the readiness prober.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ringkeeper_readiness::{Endpoint, ReadinessProber};
use tokio::sync::Mutex;

/// A mock implementation of the `ReadinessProber` trait. Used for testing.
///
/// Endpoints are not ready unless marked otherwise. Clones share state, so
/// readiness can be flipped while a reconciler holds a copy.
#[derive(Clone, Debug, Default)]
pub struct MockReadinessProber {
    ready: Arc<Mutex<HashSet<String>>>,
    latencies: Arc<Mutex<HashMap<String, Duration>>>,
    probes: Arc<AtomicUsize>,
}

impl MockReadinessProber {
    /// Creates a new instance of `MockReadinessProber`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a prober where the given endpoints are ready.
    pub async fn with_ready<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prober = Self::new();
        for endpoint in endpoints {
            prober.set_ready(endpoint, true).await;
        }
        prober
    }

    /// Marks an endpoint as ready or not ready.
    pub async fn set_ready<S: Into<String>>(&self, endpoint: S, ready: bool) {
        let endpoint: String = endpoint.into();
        let mut set = self.ready.lock().await;
        if ready {
            set.insert(endpoint);
        } else {
            set.remove(&endpoint);
        }
    }

    /// Delays every probe of this endpoint by `latency`.
    pub async fn set_latency<S: Into<String>>(&self, endpoint: S, latency: Duration) {
        self.latencies.lock().await.insert(endpoint.into(), latency);
    }

    /// Number of probes issued so far, across all clones.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadinessProber for MockReadinessProber {
    type Error = Error;

    async fn probe(&self, endpoint: &Endpoint) -> Result<(), Self::Error> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        let latency = self.latencies.lock().await.get(endpoint.as_str()).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.ready.lock().await.contains(endpoint.as_str()) {
            Ok(())
        } else {
            Err(Error::NotReady(endpoint.to_string()))
        }
    }
}
