use thiserror::Error;

use crate::io::csv::MalformedQuote;

/// エラー型の定義
#[derive(Error, Debug)]
pub enum Error {
    /// The source is not a CSV file, or a record could not be parsed.
    #[error("input format error: {0}")]
    InputFormat(String),

    /// The byte stream is not readable as UTF-8 text.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("chart not found: {0}")]
    ChartNotFound(String),

    #[error("chart '{id}' cannot be shown as {kind}: not enough columns")]
    InvalidChartKind { id: String, kind: String },

    #[error("unknown chart kind: {0}")]
    UnknownChartKind(String),
}

/// Resultの型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

// クォート検査のエラーは入出力エラーに包まれて届く
fn malformed_quote(err: &std::io::Error) -> Option<Error> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<MalformedQuote>())
        .map(|quote| Error::InputFormat(quote.to_string()))
}

// csvクレートのエラー種別をエラー分類に振り分ける
impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        let at = |msg: String| match line {
            Some(line) => format!("line {}: {}", line, msg),
            None => msg,
        };

        match err.into_kind() {
            csv::ErrorKind::Io(e) => match malformed_quote(&e) {
                Some(quote) => quote,
                None => Error::Io(e),
            },
            csv::ErrorKind::Utf8 { err, .. } => Error::Encoding(at(err.to_string())),
            other => Error::InputFormat(at(format!("{:?}", other))),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if let Some(quote) = malformed_quote(&err) {
            quote
        } else if err.kind() == std::io::ErrorKind::InvalidData {
            Error::Encoding(err.to_string())
        } else {
            Error::Io(err)
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}
