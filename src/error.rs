use std::fmt;
use std::io;
use thiserror::Error;

/// Error type for whole-batch failures.
///
/// These are precondition or environment failures (unwritable output target,
/// non-seekable stream, invalid configuration). Problems with an individual
/// input file never surface here; they are reported as a [`FailureKind`] on
/// that file's sheet record.
#[derive(Error, Debug)]
pub enum CombineError {
    /// IO error during file or stream operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Workbook serialization error.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A table that cannot be laid out as a worksheet.
    #[error("Invalid table: {0}")]
    InvalidTable(String),
}

/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, CombineError>;

/// Why a single input file produced no sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The file tokenized but yielded zero data rows.
    EmptyResult,
    /// The file could not be tokenized under the detected delimiter.
    ParseError,
    /// The file could not be read at the byte level.
    StreamError,
    /// The table does not fit in a single worksheet.
    SheetLimit,
    /// The worksheet could not be written.
    WriteError,
}

impl FailureKind {
    /// Short machine-friendly name, used in JSON output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FailureKind::EmptyResult => "empty_result",
            FailureKind::ParseError => "parse_error",
            FailureKind::StreamError => "stream_error",
            FailureKind::SheetLimit => "sheet_limit",
            FailureKind::WriteError => "write_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::EmptyResult => write!(f, "no data rows"),
            FailureKind::ParseError => write!(f, "could not be parsed"),
            FailureKind::StreamError => write!(f, "could not be read"),
            FailureKind::SheetLimit => write!(f, "exceeds worksheet size limits"),
            FailureKind::WriteError => write!(f, "could not be written"),
        }
    }
}
