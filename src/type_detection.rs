//! Column type inference and typed cell conversion.

use std::sync::LazyLock;

use regex::Regex;

use crate::field_type::Type;
use crate::table::Table;

/// Pattern for floating point numbers (decimal point and/or exponent).
static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\d*\.?\d+)(?:[eE][-+]?\d+)?$").expect("Invalid float pattern")
});

/// A cell ready to be written to a worksheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    /// Blank cell.
    Empty,
    /// Boolean cell.
    Bool(bool),
    /// Numeric cell.
    Number(f64),
    /// String cell.
    Text(&'a str),
}

/// The usual missing-value tokens of tabular readers.
#[inline]
fn is_null_value(s: &str) -> bool {
    matches!(
        s,
        "" | "#N/A"
            | "#N/A N/A"
            | "#NA"
            | "-1.#IND"
            | "-1.#QNAN"
            | "-NaN"
            | "-nan"
            | "1.#IND"
            | "1.#QNAN"
            | "<NA>"
            | "N/A"
            | "NA"
            | "NULL"
            | "NaN"
            | "None"
            | "n/a"
            | "nan"
            | "null"
    )
}

/// Limit to 19 digits so every value fits in u64.
#[inline]
fn is_unsigned_int(s: &str) -> bool {
    let s = s.strip_prefix('+').unwrap_or(s);
    !s.is_empty() && s.len() <= 19 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Negative integers only; positive ones are unsigned.
#[inline]
fn is_signed_int(s: &str) -> bool {
    match s.strip_prefix('-') {
        Some(rest) => {
            !rest.is_empty() && rest.len() <= 19 && rest.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[inline]
fn parse_boolean(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[inline]
fn is_float(s: &str) -> bool {
    (s.contains('.') || s.contains('e') || s.contains('E')) && FLOAT_PATTERN.is_match(s)
}

/// Detect the type of a single cell value.
pub fn detect_cell_type(value: &str) -> Type {
    if is_null_value(value) {
        return Type::NULL;
    }

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Type::NULL;
    }

    if is_unsigned_int(trimmed) {
        return Type::Unsigned;
    }
    if is_signed_int(trimmed) {
        return Type::Signed;
    }
    if parse_boolean(trimmed).is_some() {
        return Type::Boolean;
    }
    if is_float(trimmed) {
        return Type::Float;
    }

    Type::Text
}

/// Infer one type per column by merging the types of all its cells.
///
/// A column with no non-null cell stays [`Type::NULL`].
pub fn infer_column_types(table: &Table) -> Vec<Type> {
    (0..table.num_columns())
        .map(|i| {
            let mut column_type = Type::NULL;
            for cell in table.column(i) {
                column_type = column_type.merge(detect_cell_type(cell));
                if column_type == Type::Text {
                    break;
                }
            }
            column_type
        })
        .collect()
}

/// Convert a raw cell into a typed value according to its column type.
///
/// Null tokens are always blank. Cells of text (or mixed) columns keep their
/// raw string.
pub fn cell_value(raw: &str, column_type: Type) -> CellValue<'_> {
    if detect_cell_type(raw) == Type::NULL {
        return CellValue::Empty;
    }

    let trimmed = raw.trim();
    match column_type {
        t if t.is_numeric() => match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => CellValue::Number(number),
            _ => CellValue::Text(raw),
        },
        Type::Boolean => match parse_boolean(trimmed) {
            Some(value) => CellValue::Bool(value),
            None => CellValue::Text(raw),
        },
        _ => CellValue::Text(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delimiter::Delimiter;
    use crate::table::parse_table;

    #[test]
    fn test_detect_cell_type() {
        assert_eq!(detect_cell_type("42"), Type::Unsigned);
        assert_eq!(detect_cell_type(" 42 "), Type::Unsigned);
        assert_eq!(detect_cell_type("-7"), Type::Signed);
        assert_eq!(detect_cell_type("3.14"), Type::Float);
        assert_eq!(detect_cell_type("1e5"), Type::Float);
        assert_eq!(detect_cell_type("True"), Type::Boolean);
        assert_eq!(detect_cell_type("FALSE"), Type::Boolean);
        assert_eq!(detect_cell_type("NA"), Type::NULL);
        assert_eq!(detect_cell_type(""), Type::NULL);
        assert_eq!(detect_cell_type("yes"), Type::Text);
        assert_eq!(detect_cell_type("1,234"), Type::Text);
        assert_eq!(detect_cell_type("2023-01-15"), Type::Text);
    }

    #[test]
    fn test_long_digit_strings_stay_text() {
        assert_eq!(detect_cell_type("12345678901234567890123"), Type::Text);
    }

    #[test]
    fn test_infer_column_types() {
        let table = parse_table(
            "id,name,score,active,empty\n1,Alice,95.5,true,\n-2,Bob,NA,False,\n",
            Delimiter::Comma,
        )
        .unwrap();

        let types = infer_column_types(&table);
        assert_eq!(
            types,
            vec![Type::Signed, Type::Text, Type::Float, Type::Boolean, Type::NULL]
        );
    }

    #[test]
    fn test_short_rows_read_as_blank() {
        let table = Table {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec!["1".to_string()], vec!["2".to_string(), "3".to_string()]],
            skipped_rows: 0,
        };
        assert_eq!(infer_column_types(&table), vec![Type::Unsigned, Type::Unsigned]);
    }

    #[test]
    fn test_mixed_column_is_text() {
        let table = parse_table("value\n100\nhello\n300\n", Delimiter::Comma).unwrap();
        assert_eq!(infer_column_types(&table), vec![Type::Text]);
    }

    #[test]
    fn test_cell_value() {
        assert_eq!(cell_value("7", Type::Unsigned), CellValue::Number(7.0));
        assert_eq!(cell_value("2.5", Type::Float), CellValue::Number(2.5));
        assert_eq!(cell_value("true", Type::Boolean), CellValue::Bool(true));
        assert_eq!(cell_value("NULL", Type::Float), CellValue::Empty);
        assert_eq!(cell_value("100", Type::Text), CellValue::Text("100"));
        assert_eq!(cell_value("n/a", Type::Text), CellValue::Empty);
        assert_eq!(cell_value("1e400", Type::Float), CellValue::Text("1e400"));
    }
}
