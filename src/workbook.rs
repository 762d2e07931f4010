//! Output workbook: one worksheet per converted table, finalized once.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::{CombineError, Result};
use crate::table::Table;
use crate::type_detection::{CellValue, cell_value, infer_column_types};

/// Maximum rows in a worksheet, header row included.
pub const MAX_ROWS: usize = 1_048_576;
/// Maximum columns in a worksheet.
pub const MAX_COLUMNS: usize = 16_384;
/// Maximum characters in a single cell.
const MAX_STRING_LEN: usize = 32_767;

/// Where the finalized workbook goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Create or overwrite a file.
    Path(PathBuf),
    /// Keep the workbook bytes in memory.
    Memory,
}

impl OutputTarget {
    /// Target a file path.
    pub fn path<P: Into<PathBuf>>(path: P) -> Self {
        OutputTarget::Path(path.into())
    }
}

impl From<PathBuf> for OutputTarget {
    fn from(path: PathBuf) -> Self {
        OutputTarget::Path(path)
    }
}

impl From<&Path> for OutputTarget {
    fn from(path: &Path) -> Self {
        OutputTarget::Path(path.to_path_buf())
    }
}

/// A finalized workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Written to this path.
    Path(PathBuf),
    /// Serialized in memory.
    Bytes(Vec<u8>),
}

impl Artifact {
    /// Read the workbook back as bytes, e.g. to offer it for download.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Artifact::Path(path) => Ok(std::fs::read(path)?),
            Artifact::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// The file path, if the workbook was written to disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Artifact::Path(path) => Some(path),
            Artifact::Bytes(_) => None,
        }
    }
}

/// Returns true if the table (plus its header row) fits in one worksheet.
pub fn fits_worksheet(table: &Table) -> bool {
    table.num_rows() < MAX_ROWS && table.num_columns() <= MAX_COLUMNS
}

/// Incrementally built workbook.
///
/// Sheets are appended in call order. [`WorkbookWriter::finish`] consumes the
/// writer, so a workbook is finalized exactly once.
pub struct WorkbookWriter {
    workbook: Workbook,
    header_format: Format,
    sheet_names: Vec<String>,
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookWriter {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            header_format: Format::new().set_bold(),
            sheet_names: Vec::new(),
        }
    }

    /// Names of the sheets added so far, in order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Write a table as a new sheet.
    ///
    /// Row 0 holds the bold column headers; data starts at row 1 and no index
    /// column is written. The sheet is only added to the workbook once every
    /// cell has been written, so on error the workbook is left unchanged.
    ///
    /// Tables that do not [fit a worksheet](fits_worksheet) or whose rows do
    /// not all match the header width are rejected.
    pub fn add_table(&mut self, name: &str, table: &Table) -> Result<()> {
        if !fits_worksheet(table) {
            return Err(CombineError::InvalidTable(format!(
                "{} rows x {} columns exceeds worksheet limits",
                table.num_rows(),
                table.num_columns()
            )));
        }
        let width = table.num_columns();
        if let Some(i) = table.rows.iter().position(|row| row.len() != width) {
            return Err(CombineError::InvalidTable(format!(
                "row {} has {} fields, expected {width}",
                i + 1,
                table.rows[i].len()
            )));
        }

        let types = infer_column_types(table);

        let mut worksheet = Worksheet::new();
        worksheet.set_name(name)?;

        for (col, header) in table.headers.iter().enumerate() {
            let col = column_index(col)?;
            worksheet.write_string_with_format(0, col, clip(header), &self.header_format)?;
        }

        for (i, row) in table.rows.iter().enumerate() {
            let row_index = row_index(i + 1)?;
            for (col, (raw, &column_type)) in row.iter().zip(&types).enumerate() {
                let col = column_index(col)?;
                match cell_value(raw, column_type) {
                    CellValue::Empty => {}
                    CellValue::Bool(value) => {
                        worksheet.write_boolean(row_index, col, value)?;
                    }
                    CellValue::Number(value) => {
                        worksheet.write_number(row_index, col, value)?;
                    }
                    CellValue::Text(value) => {
                        worksheet.write_string(row_index, col, clip(value))?;
                    }
                }
            }
        }

        self.workbook.push_worksheet(worksheet);
        self.sheet_names.push(name.to_string());
        Ok(())
    }

    /// Serialize the workbook to the target.
    ///
    /// With no sheets added, a single blank `Sheet1` is written since the
    /// format requires at least one worksheet.
    pub fn finish(mut self, target: &OutputTarget) -> Result<Artifact> {
        if self.sheet_names.is_empty() {
            self.workbook.add_worksheet();
        }

        match target {
            OutputTarget::Path(path) => {
                self.workbook.save(path)?;
                Ok(Artifact::Path(path.clone()))
            }
            OutputTarget::Memory => Ok(Artifact::Bytes(self.workbook.save_to_buffer()?)),
        }
    }
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| CombineError::InvalidTable(format!("column {col} is out of range")))
}

fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row)
        .map_err(|_| CombineError::InvalidTable(format!("row {row} is out of range")))
}

/// Truncate strings that exceed the per-cell character limit.
fn clip(value: &str) -> &str {
    match value.char_indices().nth(MAX_STRING_LEN) {
        Some((end, _)) => {
            tracing::warn!(
                limit = MAX_STRING_LEN,
                "truncating cell text longer than the worksheet limit"
            );
            &value[..end]
        }
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delimiter::Delimiter;
    use crate::table::parse_table;

    #[test]
    fn test_add_table_records_names() {
        let table = parse_table("a,b\n1,2\n", Delimiter::Comma).unwrap();
        let mut writer = WorkbookWriter::new();

        writer.add_table("sheet_1", &table).unwrap();
        writer.add_table("sheet_3", &table).unwrap();

        assert_eq!(writer.sheet_names(), &["sheet_1", "sheet_3"]);
    }

    #[test]
    fn test_finish_to_memory_is_zip() {
        let table = parse_table("a,b\n1,2\n", Delimiter::Comma).unwrap();
        let mut writer = WorkbookWriter::new();
        writer.add_table("sheet_1", &table).unwrap();

        let artifact = writer.finish(&OutputTarget::Memory).unwrap();
        let bytes = artifact.read_bytes().unwrap();

        assert!(artifact.path().is_none());
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_finish_without_sheets() {
        let artifact = WorkbookWriter::new().finish(&OutputTarget::Memory).unwrap();
        assert!(artifact.read_bytes().unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_clip() {
        let long = "x".repeat(MAX_STRING_LEN + 10);
        assert_eq!(clip(&long).len(), MAX_STRING_LEN);
        assert_eq!(clip("short"), "short");
    }

    #[test]
    fn test_fits_worksheet() {
        let table = parse_table("a\n1\n", Delimiter::Comma).unwrap();
        assert!(fits_worksheet(&table));

        let wide = Table {
            headers: (0..=MAX_COLUMNS).map(|i| format!("c{i}")).collect(),
            rows: vec![vec![String::new(); MAX_COLUMNS + 1]],
            skipped_rows: 0,
        };
        assert!(!fits_worksheet(&wide));
    }

    #[test]
    fn test_ragged_table_is_rejected() {
        let ragged = Table {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec!["1".to_string()]],
            skipped_rows: 0,
        };
        let mut writer = WorkbookWriter::new();

        let err = writer.add_table("sheet_1", &ragged).unwrap_err();
        assert!(matches!(err, CombineError::InvalidTable(_)));
        assert!(writer.sheet_names().is_empty());
    }

    #[test]
    fn test_oversized_table_is_rejected() {
        let wide = Table {
            headers: (0..=u16::MAX as usize).map(|i| format!("c{i}")).collect(),
            rows: vec![vec![String::new(); u16::MAX as usize + 1]],
            skipped_rows: 0,
        };
        let mut writer = WorkbookWriter::new();

        let err = writer.add_table("sheet_1", &wide).unwrap_err();
        assert!(matches!(err, CombineError::InvalidTable(_)));
        assert!(writer.sheet_names().is_empty());
    }

    #[test]
    fn test_index_conversion() {
        assert_eq!(column_index(3).unwrap(), 3);
        assert!(column_index(usize::from(u16::MAX) + 1).is_err());
        assert_eq!(row_index(1).unwrap(), 1);
    }
}
