//! csv-combine: merge delimited text files into one multi-sheet workbook
//!
//! Each input may use a different delimiter. The delimiter of every file is
//! detected from its first few lines, the file is parsed into a table, and the
//! table is written as its own sheet (`sheet_1`, `sheet_2`, ...) of a single
//! xlsx workbook.
//!
//! # Quick Start
//!
//! ```no_run
//! use csv_combine::{Combiner, InputFile, OutputTarget};
//!
//! let mut files = vec![
//!     InputFile::open("sales.csv").unwrap(),
//!     InputFile::open("inventory.tsv").unwrap(),
//! ];
//!
//! let report = Combiner::new()
//!     .combine(&mut files, &OutputTarget::path("combined.xlsx"))
//!     .unwrap();
//!
//! println!("Processed sheets: {}", report.successes.join(", "));
//! println!("Failed sheets: {}", report.failures.join(", "));
//! ```
//!
//! # Delimiter detection
//!
//! Candidates are comma, tab, semicolon, pipe and space, in that order of
//! preference. Each is scored by the number of field splits a CSV tokenizer
//! (honouring double-quoted segments) makes over the sampled lines. The best
//! score wins; ties go to the earlier candidate; and when the best candidate
//! does not manage one split per sampled line on average, comma is used.
//!
//! # Fault isolation
//!
//! A file that cannot be read, cannot be tokenized, or has no data rows is
//! reported in [`CombineReport::failures`] and gets no sheet, but its sheet id
//! is still consumed. Malformed rows inside an otherwise good file are skipped.
//! The workbook is finalized exactly once, after the last file.

mod combiner;
mod delimiter;
mod detector;
mod encoding;
mod error;
mod field_type;
mod table;
mod type_detection;
mod workbook;

pub use combiner::{
    CombineReport, Combiner, DiskReader, InputFile, Outcome, SheetRecord, combine, sheet_id,
};
pub use delimiter::{DEFAULT_SAMPLE_LINES, Delimiter};
pub use detector::{Detection, Detector};
pub use error::{CombineError, FailureKind, Result};
pub use field_type::Type;
pub use table::{Table, parse_table};
pub use type_detection::{CellValue, cell_value, detect_cell_type, infer_column_types};
pub use workbook::{
    Artifact, MAX_COLUMNS, MAX_ROWS, OutputTarget, WorkbookWriter, fits_worksheet,
};

// Re-export for advanced usage
pub use encoding::{decode, has_utf8_bom, is_utf8, skip_bom};
