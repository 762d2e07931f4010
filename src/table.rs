//! Tolerant parsing of delimited text into a rectangular table.

use foldhash::{HashSet, HashSetExt};

use crate::delimiter::Delimiter;
use crate::error::FailureKind;

/// A parsed table: one header row plus rectangular data rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names, unique and non-blank.
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells wide.
    pub rows: Vec<Vec<String>>,
    /// Malformed rows that were dropped.
    pub skipped_rows: usize,
}

impl Table {
    /// Returns true if the table has no data rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of data rows (header excluded).
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    #[inline]
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// Iterate over the cells of one column. Rows too short to reach the
    /// column yield an empty cell.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }
}

/// Parse decoded text into a [`Table`] using the given delimiter.
///
/// The first record is the header. Rows wider than the header are dropped and
/// counted in [`Table::skipped_rows`]; narrower rows are padded with empty
/// cells. Fails with [`FailureKind::EmptyResult`] when no data row survives and
/// with [`FailureKind::ParseError`] when the header itself cannot be read.
pub fn parse_table(text: &str, delimiter: Delimiter) -> Result<Table, FailureKind> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => {}
        Ok(false) => return Err(FailureKind::EmptyResult),
        Err(e) => {
            tracing::warn!(error = %e, "could not read header row");
            return Err(FailureKind::ParseError);
        }
    }

    let headers = label_headers(&record);
    let width = headers.len();

    let mut rows = Vec::new();
    let mut skipped_rows = 0;
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {
                if record.len() > width {
                    skipped_rows += 1;
                    tracing::warn!(
                        line = record.position().map(csv::Position::line),
                        expected = width,
                        found = record.len(),
                        "skipping row with too many fields"
                    );
                    continue;
                }
                let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                row.resize(width, String::new());
                rows.push(row);
            }
            Ok(false) => break,
            Err(e) => {
                if e.is_io_error() {
                    tracing::warn!(error = %e, "stopping at unreadable input");
                    break;
                }
                skipped_rows += 1;
                tracing::warn!(error = %e, "skipping malformed row");
            }
        }
    }

    if rows.is_empty() {
        return Err(FailureKind::EmptyResult);
    }

    Ok(Table {
        headers,
        rows,
        skipped_rows,
    })
}

/// Turn the header record into unique, non-blank column names.
fn label_headers(record: &csv::StringRecord) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(record.len());
    let mut headers = Vec::with_capacity(record.len());

    for (i, name) in record.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("field_{}", i + 1)
        } else {
            name.to_string()
        };

        let mut label = base.clone();
        let mut suffix = 1;
        while seen.contains(&label) {
            label = format!("{base}.{suffix}");
            suffix += 1;
        }

        seen.insert(label.clone());
        headers.push(label);
    }

    headers
}
