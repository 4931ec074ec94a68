//! Chunked CSV ingestion on a worker thread
//!
//! The parser runs on its own thread and hands rows to the consumer in
//! discrete batches over a bounded crossbeam channel. The producer knows the
//! row cap and stops parsing once it has sent that many rows. The consumer
//! enforces its own cap as well and fires the stream's [`CancelToken`]
//! exactly once when it is reached. Rows past the cap are never parsed or
//! queued.

use crossbeam_channel::{bounded, Receiver, Sender};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::mem;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::csv::{check_extension, csv_reader, read_header, record_to_row};
use crate::config::{InsightConfig, MAX_ROWS};
use crate::dataset::{Dataset, DatasetBuilder, Row};
use crate::error::{Error, Result};

/// Messages sent from the parser thread
#[derive(Debug)]
pub enum ChunkMessage {
    /// Column names from the header line; always the first message
    Header(Vec<String>),
    /// The next batch of rows
    Rows(Vec<Row>),
    /// Parsing failed; no further messages follow
    Failed(Error),
    /// Parsing stopped; no further messages follow
    Done,
}

/// One-shot stop signal shared between consumer and producer
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the producer to stop.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Progress reported to the consumer after every accepted batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestProgress {
    /// Batches received so far
    pub batches: usize,
    /// Rows retained so far
    pub rows: usize,
    /// Whether the cap has been reached
    pub capped: bool,
}

/// Result of draining a [`CsvStream`]
#[derive(Debug)]
pub struct IngestOutcome {
    pub dataset: Dataset,
    /// Batches received from the producer
    pub batches: usize,
    /// Rows received after the cap and dropped
    pub discarded_rows: usize,
    /// Whether the cancellation signal was fired
    pub cancelled: bool,
}

/// Batches that may wait in the channel before the producer blocks
const PENDING_BATCHES: usize = 2;

/// Spawns parser threads that deliver rows in fixed-size batches
#[derive(Debug, Clone)]
pub struct ChunkedCsvReader {
    chunk_rows: usize,
    max_rows: usize,
}

impl ChunkedCsvReader {
    /// Batches of `chunk_rows` rows, stopping at [`MAX_ROWS`]
    pub fn new(chunk_rows: usize) -> Self {
        ChunkedCsvReader {
            chunk_rows: chunk_rows.max(1),
            max_rows: MAX_ROWS,
        }
    }

    pub fn from_config(config: &InsightConfig) -> Self {
        Self::new(config.chunk_rows).with_max_rows(config.max_rows)
    }

    /// Number of rows after which the producer stops parsing
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Opens a `.csv` file and starts parsing it in the background
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<CsvStream> {
        let path = path.as_ref();
        check_extension(&path.to_string_lossy())?;
        let file = File::open(path).map_err(Error::Io)?;
        Ok(self.spawn(file))
    }

    /// Starts parsing an arbitrary byte source in the background
    pub fn spawn<R: Read + Send + 'static>(&self, source: R) -> CsvStream {
        let (sender, receiver) = bounded(PENDING_BATCHES);
        let cancel = CancelToken::new();
        let producer_cancel = cancel.clone();
        let (chunk_rows, max_rows) = (self.chunk_rows, self.max_rows);

        let handle = thread::spawn(move || {
            produce(source, chunk_rows, max_rows, sender, producer_cancel)
        });

        CsvStream {
            receiver,
            cancel,
            handle: Some(handle),
            finished: false,
        }
    }
}

impl Default for ChunkedCsvReader {
    fn default() -> Self {
        Self::from_config(&InsightConfig::default())
    }
}

fn produce<R: Read>(
    source: R,
    chunk_rows: usize,
    max_rows: usize,
    sender: Sender<ChunkMessage>,
    cancel: CancelToken,
) {
    let mut rdr = csv_reader(source);

    let columns = match read_header(&mut rdr) {
        Ok(columns) => columns,
        Err(e) => {
            let _ = sender.send(ChunkMessage::Failed(e));
            return;
        }
    };
    let width = columns.len();
    if sender.send(ChunkMessage::Header(columns)).is_err() {
        return;
    }

    let mut batch = Vec::with_capacity(chunk_rows.min(max_rows));
    let mut record = StringRecord::new();
    let mut sent = 0;

    loop {
        if sent + batch.len() >= max_rows {
            log::debug!("parser stopped at the row cap of {}", max_rows);
            break;
        }
        if cancel.is_cancelled() {
            log::debug!("parser cancelled; {} buffered rows dropped", batch.len());
            batch.clear();
            break;
        }

        match rdr.read_record(&mut record) {
            Ok(true) => {
                batch.push(record_to_row(&record, width));
                if batch.len() >= chunk_rows {
                    sent += batch.len();
                    let full = mem::replace(&mut batch, Vec::with_capacity(chunk_rows));
                    if sender.send(ChunkMessage::Rows(full)).is_err() {
                        // consumer hung up
                        return;
                    }
                }
            }
            Ok(false) => break,
            Err(e) => {
                let _ = sender.send(ChunkMessage::Failed(e.into()));
                return;
            }
        }
    }

    if !batch.is_empty() && sender.send(ChunkMessage::Rows(batch)).is_err() {
        return;
    }
    let _ = sender.send(ChunkMessage::Done);
}

/// Consumer side of a background parse
#[derive(Debug)]
pub struct CsvStream {
    receiver: Receiver<ChunkMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
    /// Set once `Done` has been received
    finished: bool,
}

impl CsvStream {
    /// Token that stops the producer
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Drains the stream into a dataset of at most `max_rows` rows
    pub fn collect_capped(self, max_rows: usize) -> Result<Dataset> {
        self.collect_with(max_rows, |_| {}).map(|outcome| outcome.dataset)
    }

    /// Drains the stream, reporting progress after each batch.
    ///
    /// The cancellation signal fires once, on the batch that fills the cap.
    pub fn collect_with<F>(mut self, max_rows: usize, mut on_batch: F) -> Result<IngestOutcome>
    where
        F: FnMut(&IngestProgress),
    {
        let mut builder: Option<DatasetBuilder> = None;
        let mut batches = 0;
        let mut cancelled = false;

        for message in self.receiver.iter() {
            match message {
                ChunkMessage::Header(columns) => {
                    builder = Some(DatasetBuilder::new(columns, max_rows));
                }
                ChunkMessage::Rows(rows) => {
                    let Some(builder) = builder.as_mut() else {
                        return Err(Error::InputFormat("rows received before header".into()));
                    };
                    batches += 1;
                    let capped = builder.extend(rows);
                    log::debug!("batch {}: {} rows retained", batches, builder.len());

                    if capped && !cancelled {
                        cancelled = self.cancel.cancel();
                        log::warn!("row cap of {} reached; stopping parser", max_rows);
                    }
                    on_batch(&IngestProgress {
                        batches,
                        rows: builder.len(),
                        capped,
                    });
                }
                ChunkMessage::Failed(e) => return Err(e),
                ChunkMessage::Done => {
                    self.finished = true;
                    break;
                }
            }
        }

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let builder = builder.unwrap_or_else(|| DatasetBuilder::new(Vec::new(), max_rows));
        let discarded_rows = builder.discarded();
        let dataset = builder.finish();
        log::info!(
            "ingested {} rows x {} columns in {} batches",
            dataset.row_count(),
            dataset.column_count(),
            batches
        );

        Ok(IngestOutcome {
            dataset,
            batches,
            discarded_rows,
            cancelled,
        })
    }
}

impl Iterator for CsvStream {
    type Item = ChunkMessage;

    fn next(&mut self) -> Option<ChunkMessage> {
        let message = self.receiver.recv().ok();
        if matches!(message, Some(ChunkMessage::Done)) {
            self.finished = true;
        }
        message
    }
}

impl Drop for CsvStream {
    fn drop(&mut self) {
        // stop an unfinished producer; it exits on its next record or failed send
        if !self.finished {
            self.cancel.cancel();
        }
    }
}
