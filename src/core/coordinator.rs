//! Refresh coordinator
//!
//! Single entry point for every refresh trigger (CLI, startup task, HTTP).
//! An async mutex serializes runs: a trigger that arrives while another run
//! is in flight waits for it to finish and then runs in turn, so two
//! transactions never interleave against the same store.

use crate::core::accumulator::BatchConfig;
use crate::core::orchestrator::RefreshOrchestrator;
use crate::types::{IngestError, RefreshSummary};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Where a refresh request came from, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// One-shot `refresh` command
    Cli,
    /// Background run launched when the host starts
    Startup,
    /// HTTP request
    OnDemand,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Cli => "cli",
            Trigger::Startup => "startup",
            Trigger::OnDemand => "on_demand",
        }
    }
}

/// Serializes refresh runs against one store
pub struct RefreshCoordinator {
    pool: SqlitePool,
    source: PathBuf,
    config: BatchConfig,
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(pool: SqlitePool, source: impl Into<PathBuf>, config: BatchConfig) -> Self {
        Self {
            pool,
            source: source.into(),
            config,
            gate: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Run one refresh, waiting for any run already in flight
    pub async fn refresh(
        &self,
        trigger: Trigger,
        cancel: &CancellationToken,
    ) -> Result<RefreshSummary, IngestError> {
        let _guard = self.gate.lock().await;

        let mut orchestrator = RefreshOrchestrator::new(&self.source, self.config);
        let outcome = orchestrator.run(&self.pool, cancel).await;
        report_outcome(trigger, &outcome);
        outcome
    }

    /// Launch the startup refresh as a supervised background task
    ///
    /// The returned handle resolves to the run's outcome; cancelling the
    /// token makes the run roll back and finish with `Cancelled`.
    pub fn spawn_background(
        self: Arc<Self>,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<RefreshSummary, IngestError>> {
        tokio::spawn(async move { self.refresh(Trigger::Startup, &cancel).await })
    }
}

/// Log the outcome of a run the same way for every trigger
pub fn report_outcome(trigger: Trigger, outcome: &Result<RefreshSummary, IngestError>) {
    match outcome {
        Ok(summary) => info!(
            trigger = trigger.as_str(),
            records = summary.records,
            batches = summary.batches,
            "Refresh succeeded"
        ),
        Err(e) => error!(
            trigger = trigger.as_str(),
            kind = e.kind(),
            error = %e,
            "Refresh failed"
        ),
    }
}
