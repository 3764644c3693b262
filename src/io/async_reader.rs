//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over transfer records from a CSV file.
//! Supports batch reading for efficient async processing.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures `AsyncRead` so any tokio source can be plugged in through
//!   `tokio_util::compat`
//! - Batch reading for efficient processing
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of TransferRecords
//!                  ↓
//!           csv_format module
//!           (TransferCsvRecord, CsvRow)
//! ```

use crate::io::csv_format::CsvRow;
use crate::types::TransferRecord;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use std::marker::PhantomData;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Provides a batch reading interface over records of type `T`, transfers by
/// default.
pub struct AsyncReader<R: AsyncRead + Unpin, T = TransferRecord> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    skipped: usize,
    _record: PhantomData<fn() -> T>,
}

impl<R, T> AsyncReader<R, T>
where
    R: AsyncRead + Unpin + Send + 'static,
    T: CsvRow,
{
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            skipped: 0,
            _record: PhantomData,
        }
    }

    /// Read a batch of records
    ///
    /// Reads up to `batch_size` rows, converting them with [`CsvRow::from_raw`].
    /// Invalid rows are logged with their line number and skipped.
    ///
    /// # Returns
    ///
    /// A vector of successfully converted records, in file order.
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<T> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<T::Raw>();

        while batch.len() < batch_size {
            let next = match records.next().await {
                Some(next) => next,
                None => break,
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match next {
                Ok(raw) => match T::from_raw(raw) {
                    Ok(record) => batch.push(record),
                    Err(e) => {
                        warn!(line, error = %e, "skipping invalid record");
                        self.skipped += 1;
                    }
                },
                Err(e) => {
                    warn!(line, error = %e, "skipping unparsable CSV row");
                    self.skipped += 1;
                }
            }
        }

        batch
    }

    /// Number of rows skipped so far because they could not be parsed or converted
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferKind;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    fn reader(content: &'static str) -> AsyncReader<Cursor<&'static [u8]>> {
        AsyncReader::new(Cursor::new(content.as_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let mut async_reader = reader(
            "type,source,target,amount\n\
             pocket,ACC-1,Viaje,100.0\n\
             account,ACC-1,ACC-2,50.0\n\
             account,ACC-2,ACC-3,200.0\n",
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].kind, TransferKind::Pocket);
        assert_eq!(batch[0].target, "Viaje");
        assert_eq!(batch[1].target, "ACC-2");

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].source, "ACC-2");
        assert_eq!(batch[0].amount, Decimal::new(2000, 1));

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("type,source,target,amount\n");

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_record() {
        let mut async_reader = reader(
            "type,source,target,amount\n\
             deposit,ACC-1,ACC-2,100.0\n\
             account,ACC-1,ACC-2,\n\
             account,ACC-1,ACC-2,50.0\n",
        );

        // Unknown type and missing amount are logged and skipped
        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].amount, Decimal::new(500, 1));
        assert_eq!(async_reader.skipped(), 2);
    }

    #[tokio::test]
    async fn test_async_reader_counts_skipped_rows_across_batches() {
        let mut async_reader = reader(
            "type,source,target,amount
             account,ACC-1,ACC-2,abc
             account,ACC-1,ACC-2,1
             transfer,ACC-1,ACC-2,1
             account,ACC-1,ACC-2,2
",
        );

        assert_eq!(async_reader.read_batch(1).await.len(), 1);
        assert_eq!(async_reader.skipped(), 1);
        assert_eq!(async_reader.read_batch(1).await.len(), 1);
        assert_eq!(async_reader.skipped(), 2);
        assert!(async_reader.read_batch(1).await.is_empty());
        assert_eq!(async_reader.skipped(), 2);
    }

    #[tokio::test]
    async fn test_async_reader_keeps_negative_amounts() {
        let mut async_reader = reader("type,source,target,amount\npocket,ACC-1,Viaje,-100\n");

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch[0].amount, Decimal::new(-100, 0));
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let mut async_reader =
            reader("type,source,target,amount\n  account  ,  ACC-1  ,  ACC-2  ,  1.5  \n");

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].source, "ACC-1");
        assert_eq!(batch[0].target, "ACC-2");
    }
}
