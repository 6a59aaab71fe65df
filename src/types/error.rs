//! Error types for the sales ingestion pipeline
//!
//! Every failure of a refresh run is fatal to that run: the transaction is
//! rolled back and the error is returned to the trigger unchanged.
//!
//! # Error Categories
//!
//! - **Source Errors**: file cannot be opened, header cannot be read
//! - **Record Errors**: a data line cannot be decoded
//! - **Store Errors**: begin, upsert or commit failures
//! - **Cancellation**: the caller aborted the run

use crate::types::EntityKind;
use thiserror::Error;

/// Main error type for a refresh run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The source file could not be opened
    ///
    /// No transaction work has been done when this is raised.
    #[error("Source unavailable: {path}: {message}")]
    SourceUnavailable {
        /// Path that failed to open
        path: String,
        /// Underlying I/O error
        message: String,
    },

    /// The header line could not be read (including an empty source)
    #[error("Failed to read header: {message}")]
    HeaderReadError { message: String },

    /// A data line could not be decoded as a field tuple
    ///
    /// Aborts the run; every batch already flushed in the same
    /// transaction is rolled back.
    #[error("Malformed record {record}: {message}")]
    MalformedRecord {
        /// 1-based data record number, header excluded
        record: u64,
        /// Description of the decoding failure
        message: String,
    },

    /// An upsert statement failed
    #[error("Upsert of {entity} failed in batch {batch}: {message}")]
    UpsertFailure {
        /// Entity whose statement failed
        entity: EntityKind,
        /// 1-based batch number
        batch: usize,
        /// Store error message
        message: String,
    },

    /// The transaction could not be started
    #[error("Failed to begin transaction: {message}")]
    TransactionBegin { message: String },

    /// The transaction could not be committed
    #[error("Failed to commit transaction: {message}")]
    CommitFailure { message: String },

    /// The run was cancelled before it could commit
    #[error("Refresh cancelled")]
    Cancelled,
}

// Helper functions for creating common errors

impl IngestError {
    /// Create a SourceUnavailable error
    pub fn source_unavailable(path: &str, message: impl ToString) -> Self {
        IngestError::SourceUnavailable {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a HeaderReadError
    pub fn header_read(message: impl ToString) -> Self {
        IngestError::HeaderReadError {
            message: message.to_string(),
        }
    }

    /// Create a MalformedRecord error
    pub fn malformed_record(record: u64, message: impl ToString) -> Self {
        IngestError::MalformedRecord {
            record,
            message: message.to_string(),
        }
    }

    /// Create an UpsertFailure error
    pub fn upsert_failure(entity: EntityKind, batch: usize, message: impl ToString) -> Self {
        IngestError::UpsertFailure {
            entity,
            batch,
            message: message.to_string(),
        }
    }

    /// Create a TransactionBegin error
    pub fn transaction_begin(message: impl ToString) -> Self {
        IngestError::TransactionBegin {
            message: message.to_string(),
        }
    }

    /// Create a CommitFailure error
    pub fn commit_failure(message: impl ToString) -> Self {
        IngestError::CommitFailure {
            message: message.to_string(),
        }
    }

    /// Short machine-readable name of the failure, used in logs and responses
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::SourceUnavailable { .. } => "source_unavailable",
            IngestError::HeaderReadError { .. } => "header_read_error",
            IngestError::MalformedRecord { .. } => "malformed_record",
            IngestError::UpsertFailure { .. } => "upsert_failure",
            IngestError::TransactionBegin { .. } => "transaction_begin",
            IngestError::CommitFailure { .. } => "commit_failure",
            IngestError::Cancelled => "cancelled",
        }
    }
}
