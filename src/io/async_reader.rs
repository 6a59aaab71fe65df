//! Asynchronous CSV reader for the sales file
//!
//! Provides a lazy, forward-only stream of `SourceRow`s.
//!
//! # Design
//!
//! The SalesReader uses:
//! - csv-async for streaming CSV parsing
//! - tokio-util's compat layer to read a tokio `File`
//! - a `ColumnLayout` resolved from the header line
//!
//! ```text
//! File → SalesReader → SourceRow → normalizer
//!            ↓
//!      csv_format module
//!   (ColumnLayout::resolve / extract)
//! ```
//!
//! # Error Handling
//!
//! Unlike a lenient reader, a record that cannot be decoded is fatal: it is
//! returned as `MalformedRecord` and the caller abandons the whole run.

use crate::io::csv_format::ColumnLayout;
use crate::types::{IngestError, SourceRow};
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use futures::io::AsyncRead;
use std::path::Path;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

/// Asynchronous sales file reader
///
/// Maintains streaming behavior with constant memory usage: one field
/// buffer is reused for every record.
pub struct SalesReader<R: AsyncRead + Unpin> {
    csv_reader: AsyncReader<R>,
    layout: ColumnLayout,
    record: StringRecord,
    records_read: u64,
}

impl SalesReader<Compat<tokio::fs::File>> {
    /// Open a sales file and consume its header line
    ///
    /// # Errors
    ///
    /// - `SourceUnavailable` if the file cannot be opened
    /// - `HeaderReadError` if the header cannot be read or names only some
    ///   of the sales columns
    pub async fn open(path: &Path) -> Result<Self, IngestError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| IngestError::source_unavailable(&path.display().to_string(), e))?;

        Self::from_reader(file.compat()).await
    }
}

impl<R: AsyncRead + Unpin + Send> SalesReader<R> {
    /// Create a SalesReader over any async reader and consume its header line
    ///
    /// Field counts are strict: every data record must have as many
    /// fields as the header.
    pub async fn from_reader(reader: R) -> Result<Self, IngestError> {
        let mut csv_reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .create_reader(reader);

        let header = csv_reader
            .headers()
            .await
            .map_err(IngestError::header_read)?;

        if header.is_empty() {
            return Err(IngestError::header_read("source is empty"));
        }

        let layout = ColumnLayout::resolve(header)?;

        Ok(Self {
            csv_reader,
            layout,
            record: StringRecord::new(),
            records_read: 0,
        })
    }

    /// Number of data records read so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next data record
    ///
    /// # Returns
    ///
    /// * `Ok(Some(SourceRow))` - next record
    /// * `Ok(None)` - end of input
    /// * `Err(MalformedRecord)` - the record could not be decoded
    pub async fn next_row(&mut self) -> Result<Option<SourceRow>, IngestError> {
        let record_number = self.records_read + 1;

        let has_record = self
            .csv_reader
            .read_record(&mut self.record)
            .await
            .map_err(|e| IngestError::malformed_record(record_number, e))?;

        if !has_record {
            return Ok(None);
        }

        self.records_read = record_number;

        match self.layout.extract(&self.record) {
            Some(row) => Ok(Some(row)),
            None => Err(IngestError::malformed_record(
                record_number,
                format!(
                    "expected at least {} fields, found {}",
                    self.layout.width(),
                    self.record.len()
                ),
            )),
        }
    }
}
