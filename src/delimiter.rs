use std::fmt;

/// Number of leading lines sampled for delimiter detection.
pub const DEFAULT_SAMPLE_LINES: usize = 5;

/// Field delimiter candidate.
///
/// Variant order is the preference order used to break ties during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Delimiter {
    /// `,`
    #[default]
    Comma,
    /// `\t`
    Tab,
    /// `;`
    Semicolon,
    /// `|`
    Pipe,
    /// ` `
    Space,
}

impl Delimiter {
    /// All candidates, in preference order.
    pub const CANDIDATES: [Delimiter; 5] = [
        Delimiter::Comma,
        Delimiter::Tab,
        Delimiter::Semicolon,
        Delimiter::Pipe,
        Delimiter::Space,
    ];

    /// Returns the delimiter byte.
    #[inline]
    pub const fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
            Delimiter::Semicolon => b';',
            Delimiter::Pipe => b'|',
            Delimiter::Space => b' ',
        }
    }

    /// Returns the delimiter as a char.
    #[inline]
    pub const fn as_char(&self) -> char {
        self.as_byte() as char
    }

    /// Look up the candidate for a byte, if it is one.
    pub const fn from_byte(byte: u8) -> Option<Delimiter> {
        match byte {
            b',' => Some(Delimiter::Comma),
            b'\t' => Some(Delimiter::Tab),
            b';' => Some(Delimiter::Semicolon),
            b'|' => Some(Delimiter::Pipe),
            b' ' => Some(Delimiter::Space),
            _ => None,
        }
    }

    /// Human-readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Tab => "tab",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Pipe => "pipe",
            Delimiter::Space => "space",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
