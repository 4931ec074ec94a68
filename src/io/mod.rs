pub mod csv;
pub mod stream;

// Re-export commonly used functions
pub use csv::{check_extension, read_csv, read_csv_reader, read_csv_str};
pub use stream::{
    CancelToken, ChunkMessage, ChunkedCsvReader, CsvStream, IngestOutcome, IngestProgress,
};
