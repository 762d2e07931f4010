//! Batch conversion of many delimited files into one workbook.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::delimiter::Delimiter;
use crate::detector::Detector;
use crate::encoding::decode;
use crate::error::{FailureKind, Result};
use crate::table::{Table, parse_table};
use crate::workbook::{Artifact, OutputTarget, WorkbookWriter, fits_worksheet};

/// One input stream and its display name.
#[derive(Debug)]
pub struct InputFile<R> {
    name: String,
    reader: R,
}

impl<R: Read + Seek> InputFile<R> {
    /// Wrap a seekable reader.
    pub fn new<S: Into<String>>(name: S, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }

    /// Display name of the input.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mutable access to the underlying reader.
    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl InputFile<Cursor<Vec<u8>>> {
    /// An in-memory input, e.g. an uploaded file.
    pub fn from_bytes<S: Into<String>, B: Into<Vec<u8>>>(name: S, bytes: B) -> Self {
        Self::new(name, Cursor::new(bytes.into()))
    }
}

impl InputFile<BufReader<File>> {
    /// Open a file on disk; the display name is the file name.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::new(display_name(path), BufReader::new(file)))
    }
}

impl InputFile<DiskReader> {
    /// Open a file on disk, deferring any open error to the first read.
    ///
    /// A missing or unreadable path then fails only its own sheet in a batch
    /// instead of the whole call.
    pub fn open_deferred<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let reader = match File::open(path) {
            Ok(file) => DiskReader::Open(BufReader::new(file)),
            Err(e) => DiskReader::Unopened {
                kind: e.kind(),
                message: format!("{}: {e}", path.display()),
            },
        };
        Self::new(display_name(path), reader)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

/// Reader behind [`InputFile::open_deferred`].
#[derive(Debug)]
pub enum DiskReader {
    /// The file opened fine.
    Open(BufReader<File>),
    /// The file could not be opened; every read returns this error.
    Unopened {
        /// Kind of the original open error.
        kind: io::ErrorKind,
        /// Path and original error text.
        message: String,
    },
}

impl Read for DiskReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DiskReader::Open(reader) => reader.read(buf),
            DiskReader::Unopened { kind, message } => Err(io::Error::new(*kind, message.clone())),
        }
    }
}

impl Seek for DiskReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            DiskReader::Open(reader) => reader.seek(pos),
            // Nothing to position; the failure surfaces on read.
            DiskReader::Unopened { .. } => Ok(0),
        }
    }
}

/// Conversion outcome for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A sheet was written.
    Success {
        /// Delimiter the file was parsed with.
        delimiter: Delimiter,
        /// Data rows written (header excluded).
        rows: usize,
        /// Columns written.
        columns: usize,
        /// Malformed rows that were dropped.
        skipped_rows: usize,
    },
    /// No sheet was written.
    Failure(FailureKind),
}

/// The record of one input in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecord {
    /// `sheet_<n>`, n being the 1-based input position.
    pub id: String,
    /// Display name of the input.
    pub source: String,
    /// What happened.
    pub outcome: Outcome,
}

impl SheetRecord {
    /// Returns true if a sheet was written for this input.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// Batch-level report.
#[derive(Debug, Clone)]
pub struct CombineReport {
    /// Ids of the sheets written, in input order.
    pub successes: Vec<String>,
    /// Ids of the inputs that produced no sheet, in input order.
    pub failures: Vec<String>,
    /// One record per input, in input order.
    pub records: Vec<SheetRecord>,
    /// The finalized workbook.
    pub artifact: Artifact,
}

impl CombineReport {
    /// Returns true if no input produced a sheet.
    pub fn is_all_failed(&self) -> bool {
        self.successes.is_empty()
    }

    /// Sheet names present in the workbook, in order.
    pub fn sheet_names(&self) -> &[String] {
        &self.successes
    }
}

/// Sheet id for the input at a zero-based position.
pub fn sheet_id(index: usize) -> String {
    format!("sheet_{}", index + 1)
}

/// Batch converter.
///
/// # Example
///
/// ```
/// use csv_combine::{Combiner, InputFile, OutputTarget};
///
/// let mut files = vec![
///     InputFile::from_bytes("a.csv", "a,b\n1,2\n3,4\n"),
///     InputFile::from_bytes("b.csv", ""),
/// ];
///
/// let report = Combiner::new().combine(&mut files, &OutputTarget::Memory).unwrap();
/// assert_eq!(report.successes, vec!["sheet_1"]);
/// assert_eq!(report.failures, vec!["sheet_2"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Combiner {
    detector: Detector,
}

impl Combiner {
    /// Create a combiner with default detection settings.
    pub const fn new() -> Self {
        Self {
            detector: Detector::new(),
        }
    }

    /// Set the number of lines sampled for delimiter detection.
    pub fn sample_lines(&mut self, sample_lines: usize) -> &mut Self {
        self.detector.sample_lines(sample_lines);
        self
    }

    /// Convert every input into its own sheet and finalize the workbook once.
    ///
    /// Inputs are processed strictly in order. A file that cannot be read,
    /// tokenized, or that yields no data rows is recorded as a failure and the
    /// batch moves on. Only precondition problems (invalid configuration,
    /// a stream that cannot seek, an unwritable target) abort the call.
    pub fn combine<R: Read + Seek>(
        &self,
        files: &mut [InputFile<R>],
        target: &OutputTarget,
    ) -> Result<CombineReport> {
        self.detector.validate()?;

        let mut writer = WorkbookWriter::new();
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        let mut records = Vec::with_capacity(files.len());

        for (i, file) in files.iter_mut().enumerate() {
            let id = sheet_id(i);
            let outcome = self.convert(file, &id, &mut writer)?;

            match &outcome {
                Outcome::Success {
                    delimiter,
                    rows,
                    columns,
                    skipped_rows,
                } => {
                    tracing::info!(
                        sheet = %id,
                        source = %file.name,
                        %delimiter,
                        rows,
                        columns,
                        skipped_rows,
                        "converted"
                    );
                    successes.push(id.clone());
                }
                Outcome::Failure(kind) => {
                    tracing::warn!(
                        sheet = %id,
                        source = %file.name,
                        reason = %kind,
                        "conversion failed"
                    );
                    failures.push(id.clone());
                }
            }

            records.push(SheetRecord {
                id,
                source: file.name.clone(),
                outcome,
            });
        }

        let artifact = writer.finish(target)?;

        tracing::info!(
            succeeded = successes.len(),
            failed = failures.len(),
            output = ?artifact.path(),
            "batch finished"
        );

        Ok(CombineReport {
            successes,
            failures,
            records,
            artifact,
        })
    }

    fn convert<R: Read + Seek>(
        &self,
        file: &mut InputFile<R>,
        id: &str,
        writer: &mut WorkbookWriter,
    ) -> Result<Outcome> {
        // A stream that cannot seek is a caller error.
        file.reader.rewind()?;

        let delimiter = match self.detector.detect(&mut file.reader) {
            Ok(delimiter) => delimiter,
            Err(e) => {
                tracing::warn!(source = %file.name, error = %e, "could not sample input");
                return Ok(Outcome::Failure(FailureKind::StreamError));
            }
        };

        let mut data = Vec::new();
        if let Err(e) = file.reader.read_to_end(&mut data) {
            tracing::warn!(source = %file.name, error = %e, "could not read input");
            return Ok(Outcome::Failure(FailureKind::StreamError));
        }

        let text = decode(&data);
        let table = match parse_table(&text, delimiter) {
            Ok(table) => table,
            Err(kind) => return Ok(Outcome::Failure(kind)),
        };

        if !fits_worksheet(&table) {
            return Ok(Outcome::Failure(FailureKind::SheetLimit));
        }

        Ok(write_sheet(writer, id, &table, delimiter))
    }
}

/// Add the table as sheet `id`; a write error fails this sheet only.
fn write_sheet(
    writer: &mut WorkbookWriter,
    id: &str,
    table: &Table,
    delimiter: Delimiter,
) -> Outcome {
    if let Err(e) = writer.add_table(id, table) {
        tracing::warn!(sheet = %id, error = %e, "could not write sheet");
        return Outcome::Failure(FailureKind::WriteError);
    }

    Outcome::Success {
        delimiter,
        rows: table.num_rows(),
        columns: table.num_columns(),
        skipped_rows: table.skipped_rows,
    }
}

/// Combine inputs with default settings. See [`Combiner::combine`].
pub fn combine<R: Read + Seek>(
    files: &mut [InputFile<R>],
    target: &OutputTarget,
) -> Result<CombineReport> {
    Combiner::new().combine(files, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CombineError;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    /// Seekable reader whose reads always fail.
    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    impl Seek for BrokenReader {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    /// Reader that refuses to seek.
    struct Unseekable(Cursor<Vec<u8>>);

    impl Read for Unseekable {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Seek for Unseekable {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "not seekable"))
        }
    }

    #[test]
    fn test_sheet_id() {
        assert_eq!(sheet_id(0), "sheet_1");
        assert_eq!(sheet_id(9), "sheet_10");
    }

    #[test]
    fn test_success_and_empty() {
        let mut files = vec![
            InputFile::from_bytes("first.csv", "a,b\n1,2\n3,4\n"),
            InputFile::from_bytes("second.csv", ""),
        ];

        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert_eq!(report.successes, vec!["sheet_1"]);
        assert_eq!(report.failures, vec!["sheet_2"]);
        assert_eq!(
            report.records[0].outcome,
            Outcome::Success {
                delimiter: Delimiter::Comma,
                rows: 2,
                columns: 2,
                skipped_rows: 0,
            }
        );
        assert_eq!(report.records[1].outcome, Outcome::Failure(FailureKind::EmptyResult));
        assert_eq!(report.records[1].source, "second.csv");
    }

    #[test]
    fn test_partition_covers_every_input() {
        let inputs = ["x;y\n1;2\n", "", "h\n", "p|q\n1|2\n", "only\nrow\n"];
        let mut files: Vec<_> = inputs
            .iter()
            .enumerate()
            .map(|(i, data)| InputFile::from_bytes(format!("f{i}"), *data))
            .collect();

        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert_eq!(report.successes.len() + report.failures.len(), inputs.len());
        assert_eq!(report.successes, vec!["sheet_1", "sheet_4", "sheet_5"]);
        assert_eq!(report.failures, vec!["sheet_2", "sheet_3"]);
        for (i, record) in report.records.iter().enumerate() {
            assert_eq!(record.id, sheet_id(i));
        }
    }

    #[test]
    fn test_all_failed_still_finalizes() {
        let mut files = vec![InputFile::from_bytes("a", ""), InputFile::from_bytes("b", "\n\n")];

        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert!(report.is_all_failed());
        assert!(report.sheet_names().is_empty());
        assert!(report.artifact.read_bytes().unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_unreadable_stream_is_isolated() {
        let mut files = vec![InputFile::new("broken", BrokenReader)];

        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert_eq!(report.failures, vec!["sheet_1"]);
        assert_eq!(report.records[0].outcome, Outcome::Failure(FailureKind::StreamError));
    }

    #[test]
    fn test_unseekable_stream_aborts() {
        let reader = Unseekable(Cursor::new(b"a,b\n1,2\n".to_vec()));
        let mut files = vec![InputFile::new("pipe", reader)];

        let result = combine(&mut files, &OutputTarget::Memory);
        assert!(matches!(result, Err(CombineError::Io(_))));
    }

    #[test]
    fn test_zero_sample_lines_aborts() {
        let mut files = vec![InputFile::from_bytes("a", "a,b\n1,2\n")];
        let mut combiner = Combiner::new();
        combiner.sample_lines(0);

        let result = combiner.combine(&mut files, &OutputTarget::Memory);
        assert!(matches!(result, Err(CombineError::InvalidConfig(_))));
    }

    #[test]
    fn test_inputs_read_from_any_position() {
        let mut file = InputFile::from_bytes("a", "a;b;c\n1;2;3\n");
        file.reader_mut().set_position(6);
        let mut files = vec![file];

        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert_eq!(
            report.records[0].outcome,
            Outcome::Success {
                delimiter: Delimiter::Semicolon,
                rows: 1,
                columns: 3,
                skipped_rows: 0,
            }
        );
    }

    #[test]
    fn test_empty_batch() {
        let mut files: Vec<InputFile<Cursor<Vec<u8>>>> = Vec::new();

        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert!(report.records.is_empty());
        assert!(report.is_all_failed());
    }

    #[test]
    fn test_missing_file_fails_only_its_sheet() {
        let mut good = NamedTempFile::new().unwrap();
        writeln!(good, "a,b").unwrap();
        writeln!(good, "1,2").unwrap();
        good.flush().unwrap();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.csv");

        let mut files = vec![
            InputFile::open_deferred(good.path()),
            InputFile::open_deferred(&missing),
            InputFile::open_deferred(good.path()),
        ];
        let report = combine(&mut files, &OutputTarget::Memory).unwrap();

        assert_eq!(report.successes, vec!["sheet_1", "sheet_3"]);
        assert_eq!(report.failures, vec!["sheet_2"]);
        assert_eq!(report.records[1].source, "missing.csv");
        assert_eq!(report.records[1].outcome, Outcome::Failure(FailureKind::StreamError));
    }

    #[test]
    fn test_write_error_fails_only_its_sheet() {
        let ragged = Table {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec!["1".to_string()]],
            skipped_rows: 0,
        };
        let good = parse_table("a,b\n1,2\n", Delimiter::Comma).unwrap();
        let mut writer = WorkbookWriter::new();

        let outcome = write_sheet(&mut writer, "sheet_1", &ragged, Delimiter::Comma);
        assert_eq!(outcome, Outcome::Failure(FailureKind::WriteError));

        let outcome = write_sheet(&mut writer, "sheet_2", &good, Delimiter::Comma);
        assert!(matches!(outcome, Outcome::Success { rows: 1, .. }));
        assert_eq!(writer.sheet_names(), &["sheet_2"]);
    }
}
