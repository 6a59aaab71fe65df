//! Refresh orchestrator
//!
//! Owns the transaction of one refresh run and drives the pipeline:
//!
//! ```text
//! Idle → Opening → Streaming(n) ⇄ Flushing(n) → Committing → Done
//!                        ↓             ↓            ↓
//!                      Failed(reason) ←─────────────┘
//! ```
//!
//! A transaction is begun before the source is opened. Every batch of the
//! run is written through that one transaction, so any failure (including
//! cancellation) rolls back every batch already flushed. Rollback problems
//! are logged and never replace the error that caused them.

use crate::core::accumulator::{BatchAccumulator, BatchConfig};
use crate::core::normalizer::normalize;
use crate::core::upsert::upsert_batch;
use crate::io::SalesReader;
use crate::types::{IngestError, RefreshSummary};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::fmt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Lifecycle state of a refresh run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    /// Transaction begun, source being opened
    Opening,
    /// Reading records into batch `batch`
    Streaming { batch: usize },
    /// Writing batch `batch`
    Flushing { batch: usize },
    Committing,
    Done,
    Failed { reason: IngestError },
}

impl RefreshState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshState::Done | RefreshState::Failed { .. })
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshState::Idle => write!(f, "idle"),
            RefreshState::Opening => write!(f, "opening"),
            RefreshState::Streaming { batch } => write!(f, "streaming({})", batch),
            RefreshState::Flushing { batch } => write!(f, "flushing({})", batch),
            RefreshState::Committing => write!(f, "committing"),
            RefreshState::Done => write!(f, "done"),
            RefreshState::Failed { reason } => write!(f, "failed({})", reason.kind()),
        }
    }
}

/// Runs the parse, normalize, accumulate and upsert pipeline once
pub struct RefreshOrchestrator {
    source: PathBuf,
    config: BatchConfig,
    state: RefreshState,
}

impl RefreshOrchestrator {
    /// Create an orchestrator for a source file and batch configuration
    pub fn new(source: impl Into<PathBuf>, config: BatchConfig) -> Self {
        Self {
            source: source.into(),
            config,
            state: RefreshState::Idle,
        }
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    fn transition(&mut self, next: RefreshState) {
        debug!(from = %self.state, to = %next, "Refresh state transition");
        self.state = next;
    }

    /// Execute one refresh run against the given store
    ///
    /// # Arguments
    ///
    /// * `pool` - Store the run writes to
    /// * `cancel` - Checked between records and before each flush
    ///
    /// # Returns
    ///
    /// * `Ok(RefreshSummary)` - All batches committed
    /// * `Err(IngestError)` - The first failure; nothing from this run is
    ///   visible in the store
    pub async fn run(
        &mut self,
        pool: &SqlitePool,
        cancel: &CancellationToken,
    ) -> Result<RefreshSummary, IngestError> {
        let span = info_span!("refresh", source = %self.source.display());
        self.run_inner(pool, cancel).instrument(span).await
    }

    async fn run_inner(
        &mut self,
        pool: &SqlitePool,
        cancel: &CancellationToken,
    ) -> Result<RefreshSummary, IngestError> {
        self.state = RefreshState::Idle;
        self.transition(RefreshState::Opening);

        let mut tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(IngestError::transaction_begin(e))),
        };

        let streamed = self.stream(&mut tx, cancel).await;

        match streamed {
            Ok(summary) => {
                self.transition(RefreshState::Committing);
                match tx.commit().await {
                    Ok(()) => {
                        self.transition(RefreshState::Done);
                        info!(
                            records = summary.records,
                            batches = summary.batches,
                            last_batch = summary.last_batch_len,
                            "Data refresh completed successfully"
                        );
                        Ok(summary)
                    }
                    // SQLite can refuse a commit and keep the transaction
                    // open (deferred constraints). Dropping the consumed
                    // `Transaction` queues the rollback, which runs before
                    // the connection is handed out again.
                    Err(e) => Err(self.fail(IngestError::commit_failure(e))),
                }
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(error = %rollback_error, "Rollback failed");
                }
                Err(self.fail(error))
            }
        }
    }

    /// Read, normalize and flush every record of the source
    async fn stream(
        &mut self,
        tx: &mut Transaction<'_, Sqlite>,
        cancel: &CancellationToken,
    ) -> Result<RefreshSummary, IngestError> {
        let mut reader = SalesReader::open(&self.source).await?;
        let mut accumulator = BatchAccumulator::new(self.config);
        let mut summary = RefreshSummary::default();

        self.transition(RefreshState::Streaming { batch: 1 });

        loop {
            if cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let Some(row) = reader.next_row().await? else {
                break;
            };
            summary.records = reader.records_read();

            if accumulator.push(normalize(row)) {
                self.flush(tx, &mut accumulator, &mut summary, cancel)
                    .await?;
            }
        }

        if !accumulator.is_empty() {
            self.flush(tx, &mut accumulator, &mut summary, cancel)
                .await?;
        }

        Ok(summary)
    }

    async fn flush(
        &mut self,
        tx: &mut Transaction<'_, Sqlite>,
        accumulator: &mut BatchAccumulator,
        summary: &mut RefreshSummary,
        cancel: &CancellationToken,
    ) -> Result<(), IngestError> {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let batch_number = summary.batches + 1;
        let batch_len = accumulator.len();
        self.transition(RefreshState::Flushing {
            batch: batch_number,
        });

        upsert_batch(&mut **tx, &accumulator.batch(), batch_number).await?;

        summary.batches = batch_number;
        summary.last_batch_len = batch_len;
        accumulator.reset();

        info!(
            batch = batch_number,
            records = batch_len,
            total = summary.records,
            "Processed batch"
        );

        self.transition(RefreshState::Streaming {
            batch: batch_number + 1,
        });
        Ok(())
    }

    fn fail(&mut self, error: IngestError) -> IngestError {
        self.transition(RefreshState::Failed {
            reason: error.clone(),
        });
        error
    }
}
