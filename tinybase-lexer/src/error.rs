#[cfg(not(feature = "std"))]
use alloc::string::String;
use core::fmt;

/// A 1-based line/column position in the source text.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// 1-based line number.
    pub line: u64,
    /// 1-based column number.
    pub column: u64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl Location {
    /// A location at the start of the input.
    pub fn start() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Advances the position past `ch`, wrapping the column on newline.
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Builds a [`LexerError`] anchored at this location.
    pub fn into_error(self, message: impl Into<String>) -> LexerError {
        LexerError {
            message: message.into(),
            location: self,
        }
    }
}

/// A lexing failure: an unterminated literal, an unrecognised character, or
/// a malformed number/date literal, reported with its source position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LexerError {
    /// Human-readable description.
    pub message: String,
    /// Where in the source text the error was detected.
    pub location: Location,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.location)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LexerError {}
