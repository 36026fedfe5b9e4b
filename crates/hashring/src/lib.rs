//! Reconciles hashring definition files against the live readiness of their
//! members.
//!
//! Each definition file holds a list of hashrings. Every member is probed
//! concurrently, unready members are dropped, and the surviving members are
//! written, sorted, to a derived `_generated.json` file next to the source.
//! The derived file is only rewritten when its content actually changes, so
//! consumers watching it are not reloaded needlessly.
//!
//! # Example
//!
//! ```rust,no_run
//! use ringkeeper_hashring::{
//!     HashringReconciler, HashringSource, Materializer, Ownership, ReconciliationRun,
//! };
//! use ringkeeper_readiness::ReadinessProber;
//!
//! async fn reconcile_once<P: ReadinessProber>(prober: P) -> ringkeeper_hashring::Result<()> {
//!     let run = ReconciliationRun::new(
//!         HashringReconciler::new(prober),
//!         Materializer::new(Ownership::Unchanged),
//!     );
//!
//!     let source = HashringSource::Directory("/etc/thanos/hashrings".into());
//!     let report = run.execute_source(&source).await?;
//!     println!("{} written, {} unchanged", report.written(), report.unchanged());
//!
//!     Ok(())
//! }
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod definition;
mod discovery;
mod error;
mod fingerprint;
mod materializer;
mod ownership;
mod reconciler;
mod run;
mod scheduler;

pub use definition::{GENERATED_SUFFIX, HashringConfig, decode, derived_path, encode, is_derived};
pub use discovery::HashringSource;
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use materializer::{Materialized, Materializer};
pub use ownership::{Ownership, ResolvedOwner};
pub use reconciler::HashringReconciler;
pub use run::{FileReport, ReconciliationRun, RunReport};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerState};
