use std::collections::BTreeSet;

use ringkeeper_readiness::{Endpoint, ProbeResult, ReadinessProber};
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::definition::HashringConfig;

/// Derives the live membership of hashrings from member readiness.
#[derive(Clone, Debug)]
pub struct HashringReconciler<P>
where
    P: ReadinessProber,
{
    prober: P,
}

impl<P> HashringReconciler<P>
where
    P: ReadinessProber,
{
    /// Creates a new reconciler probing members with `prober`.
    pub const fn new(prober: P) -> Self {
        Self { prober }
    }

    /// Probes every member of `hashring` concurrently and returns a copy
    /// whose endpoints are the sorted, de-duplicated set of ready members.
    ///
    /// Waits for every probe to finish; each probe is bounded by the
    /// prober's own timeout. A hashring with no ready member comes back with
    /// an empty endpoint list.
    pub async fn reconcile(&self, hashring: &HashringConfig) -> HashringConfig {
        let distinct: BTreeSet<&String> = hashring.endpoints.iter().collect();

        let mut probes = JoinSet::new();
        for raw in distinct {
            let prober = self.prober.clone();
            let raw = raw.clone();

            probes.spawn(async move { probe_member(&prober, raw).await });
        }

        let mut ready = BTreeSet::new();
        while let Some(result) = probes.join_next().await {
            match result {
                Ok(ProbeResult {
                    endpoint,
                    ready: true,
                }) => {
                    ready.insert(endpoint);
                }
                Ok(_) => {}
                Err(e) => error!("probe task failed: {}", e),
            }
        }

        HashringConfig {
            hashring: hashring.hashring.clone(),
            tenants: hashring.tenants.clone(),
            endpoints: ready.into_iter().collect(),
        }
    }
}

async fn probe_member<P: ReadinessProber>(prober: &P, raw: String) -> ProbeResult {
    let ready = match Endpoint::parse(&raw) {
        Ok(endpoint) => match prober.probe(&endpoint).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        },
        Err(e) => {
            warn!("skipping member: {}", e);
            false
        }
    };

    ProbeResult {
        endpoint: raw,
        ready,
    }
}
