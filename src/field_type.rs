use std::fmt;

/// How the cells of a worksheet column are written.
///
/// Every cell of a column is written the same way: integer and float columns
/// become numeric cells, boolean columns become `TRUE`/`FALSE` cells, and
/// anything else is written as the raw string. Missing-value tokens are blank
/// in every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    /// Whole numbers, none negative.
    Unsigned,
    /// Whole numbers with at least one negative value.
    Signed,
    /// Numbers with a decimal point or exponent.
    Float,
    /// `true`/`false` in any letter case.
    Boolean,
    /// Only missing-value tokens seen so far.
    NULL,
    /// Written verbatim.
    #[default]
    Text,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Unsigned => "unsigned",
            Type::Signed => "signed",
            Type::Float => "float",
            Type::Boolean => "boolean",
            Type::NULL => "null",
            Type::Text => "text",
        };
        f.write_str(name)
    }
}

impl Type {
    /// Returns true if cells of this column become numeric cells.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Unsigned | Type::Signed | Type::Float)
    }

    /// Fold the type of one more cell into a column type.
    ///
    /// Blank cells never change a column. Mixing integers with floats keeps the
    /// column numeric; any other mix turns it into text, so a single word in a
    /// numeric column keeps every cell as a string.
    pub fn merge(self, other: Type) -> Type {
        match (self, other) {
            (a, b) if a == b => a,
            (Type::NULL, t) | (t, Type::NULL) => t,
            (Type::Unsigned, Type::Signed) | (Type::Signed, Type::Unsigned) => Type::Signed,
            (a, b) if a.is_numeric() && b.is_numeric() => Type::Float,
            _ => Type::Text,
        }
    }
}
