use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use ringkeeper_readiness::ReadinessProber;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use crate::discovery::HashringSource;
use crate::error::{Error, Result};
use crate::run::{ReconciliationRun, RunReport};

/// Timing of the scheduler loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SchedulerConfig {
    interval: Duration,
    probe_timeout: Duration,
}

impl SchedulerConfig {
    /// Creates a scheduler configuration.
    ///
    /// # Errors
    ///
    /// Returns an error unless `interval` is strictly greater than
    /// `probe_timeout`.
    pub fn new(interval: Duration, probe_timeout: Duration) -> Result<Self> {
        if interval <= probe_timeout {
            return Err(Error::IntervalNotGreaterThanTimeout {
                interval,
                timeout: probe_timeout,
            });
        }

        Ok(Self {
            interval,
            probe_timeout,
        })
    }

    /// Time between two ticks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Timeout of a single readiness probe.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

/// Lifecycle of a [`Scheduler`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchedulerState {
    /// Created, not started.
    Idle,

    /// Ticking.
    Running,

    /// Shut down. Terminal.
    Stopped,
}

/// Runs a reconciliation pass over the hashring source on every tick.
pub struct Scheduler<P>
where
    P: ReadinessProber,
{
    config: SchedulerConfig,
    source: HashringSource,
    run: ReconciliationRun<P>,
    state: Arc<RwLock<SchedulerState>>,
    reports: broadcast::Sender<Arc<RunReport>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<P> Scheduler<P>
where
    P: ReadinessProber,
{
    /// Creates a new, idle scheduler.
    #[must_use]
    pub fn new(config: SchedulerConfig, source: HashringSource, run: ReconciliationRun<P>) -> Self {
        let (reports, _) = broadcast::channel(16);

        Self {
            config,
            source,
            run,
            state: Arc::new(RwLock::new(SchedulerState::Idle)),
            reports,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state.read()
    }

    /// Receives the report of every completed tick.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RunReport>> {
        self.reports.subscribe()
    }

    /// Starts ticking. The first pass runs one interval after start.
    ///
    /// Passes run one at a time; ticks missed while a pass is in progress
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler was already started.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        {
            let mut state = self.state.write();
            if *state != SchedulerState::Idle {
                return Err(Error::AlreadyStarted);
            }
            *state = SchedulerState::Running;
        }

        let period = self.config.interval;
        let source = self.source.clone();
        let run = self.run.clone();
        let state = self.state.clone();
        let reports = self.reports.clone();
        let shutdown_token = self.shutdown_token.clone();

        let handle = self.task_tracker.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = shutdown_token.cancelled() => break,
                    _ = ticker.tick() => {
                        info!("tick");
                        // A pass in progress is never interrupted by shutdown.
                        match run.execute_source(&source).await {
                            Ok(report) => {
                                let _ = reports.send(Arc::new(report));
                            }
                            Err(e) => error!("{}", e),
                        }
                    }
                }
            }

            *state.write() = SchedulerState::Stopped;
            info!("scheduler stopped");
        });

        self.task_tracker.close();

        info!("scheduler started (run every {:?})", period);

        Ok(handle)
    }

    /// Stops scheduling new passes and waits for a pass in progress to
    /// finish.
    pub async fn shutdown(&self) {
        info!("scheduler shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        *self.state.write() = SchedulerState::Stopped;
    }
}
