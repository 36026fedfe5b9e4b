use std::path::{Path, PathBuf};

use futures::future::join_all;
use ringkeeper_readiness::ReadinessProber;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::error;

use crate::definition::{self, derived_path};
use crate::discovery::HashringSource;
use crate::error::{Error, Result};
use crate::materializer::{Materialized, Materializer};
use crate::reconciler::HashringReconciler;

/// Outcome of one source file within a run.
#[derive(Debug)]
pub struct FileReport {
    /// The source definition file.
    pub source: PathBuf,

    /// What happened to its derived file.
    pub outcome: Result<Materialized>,
}

/// Per-file outcomes of a reconciliation run, in completion order.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per source file.
    pub files: Vec<FileReport>,
}

impl RunReport {
    /// Number of derived files written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, Ok(Materialized::Written(_))))
    }

    /// Number of derived files left untouched because nothing changed.
    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Ok(Materialized::Unchanged(_))))
    }

    /// Number of source files whose processing failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Result::is_err)
    }

    /// Report for the given source file.
    #[must_use]
    pub fn get(&self, source: &Path) -> Option<&FileReport> {
        self.files.iter().find(|f| f.source == source)
    }

    fn count(&self, predicate: impl Fn(&Result<Materialized>) -> bool) -> usize {
        self.files.iter().filter(|f| predicate(&f.outcome)).count()
    }
}

/// Reconciles and materializes a set of hashring definition files.
#[derive(Clone, Debug)]
pub struct ReconciliationRun<P>
where
    P: ReadinessProber,
{
    reconciler: HashringReconciler<P>,
    materializer: Materializer,
}

impl<P> ReconciliationRun<P>
where
    P: ReadinessProber,
{
    /// Creates a new run over the given reconciler and materializer.
    pub const fn new(reconciler: HashringReconciler<P>, materializer: Materializer) -> Self {
        Self {
            reconciler,
            materializer,
        }
    }

    /// Processes every file concurrently and waits for all of them.
    ///
    /// A failing file is logged and reported; it never affects the others.
    pub async fn execute(&self, files: Vec<PathBuf>) -> RunReport {
        let mut pipelines = JoinSet::new();
        for source in files {
            let run = self.clone();

            pipelines.spawn(async move {
                let outcome = run.process_file(&source).await;
                if let Err(e) = &outcome {
                    error!("{}", e);
                }
                FileReport { source, outcome }
            });
        }

        let mut report = RunReport::default();
        while let Some(result) = pipelines.join_next().await {
            match result {
                Ok(file) => report.files.push(file),
                Err(e) => error!("hashring file task failed: {}", Error::Join(e)),
            }
        }

        report
    }

    /// Discovers the files currently held by `source` and processes them.
    ///
    /// # Errors
    ///
    /// Returns an error only if discovery itself fails; per-file failures
    /// are part of the report.
    pub async fn execute_source(&self, source: &HashringSource) -> Result<RunReport> {
        let files = source.discover()?;

        Ok(self.execute(files).await)
    }

    /// Reads, reconciles and materializes a single source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or decoded, or if the
    /// derived file cannot be materialized.
    pub async fn process_file(&self, source: &Path) -> Result<Materialized> {
        let body = fs::read(source).await.map_err(|e| Error::ReadSource {
            path: source.to_path_buf(),
            source: e,
        })?;

        let hashrings = definition::decode(source, &body)?;

        let reconciled = join_all(
            hashrings
                .iter()
                .map(|hashring| self.reconciler.reconcile(hashring)),
        )
        .await;

        self.materializer
            .materialize(&reconciled, &derived_path(source))
            .await
    }
}
