//! # tinybase-error
//!
//! The error taxonomy shared by every layer of the tinybase engine (§6, §7).
//! Each variant corresponds to exactly one entry in the surfaced error list;
//! callers match on `kind()`/the band helpers to decide whether a failure is
//! a programmer mistake, a constraint violation, or an environment fault.

#![deny(missing_docs)]
#![deny(unused_imports)]

use std::io;

use thiserror::Error;
use tinybase_lexer::Location;

/// Every error the engine can surface to a caller (§6).
///
/// Variants are grouped into three bands per §7: Band A (programmer error
/// in SQL text), Band B (data/constraint violation), Band C (environment).
/// [`Error::band`] reports which band a given error belongs to.
#[derive(Debug, Error)]
pub enum Error {
    /// The lexer or parser rejected the input.
    #[error("syntax error at {location}: {message}")]
    SyntaxError {
        /// What went wrong.
        message: String,
        /// Where in the source text.
        location: Location,
    },
    /// A statement named a table that does not exist in the catalog.
    #[error("unknown table '{0}'")]
    UnknownTable(String),
    /// A statement named a column that does not exist on the resolved table(s).
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    /// An unqualified column name resolved to more than one source table.
    #[error("ambiguous column '{0}'")]
    AmbiguousColumn(String),
    /// A value's runtime type did not match the column's declared type, or
    /// an operator was applied to operands of incompatible types.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// A NOT NULL (or implied-by-PRIMARY-KEY) column received a NULL value.
    #[error("NULL value not allowed for column '{0}'")]
    NullViolation(String),
    /// A UNIQUE or PRIMARY KEY column would have gained a duplicate value.
    #[error("duplicate value for unique column '{0}': {1}")]
    UniqueViolation(String, String),
    /// A FOREIGN KEY column's value does not exist in the referenced column.
    #[error("foreign key violation: {table}.{column} has no matching {ref_table}.{ref_column} = {value}")]
    FKViolation {
        /// The referencing table.
        table: String,
        /// The referencing column.
        column: String,
        /// The referenced table.
        ref_table: String,
        /// The referenced column.
        ref_column: String,
        /// The offending value, rendered for the message.
        value: String,
    },
    /// `DROP TABLE` was refused because another table still references it.
    #[error("cannot drop table '{table}': referenced by {referencing_table}.{referencing_column}")]
    RefusedDrop {
        /// The table that was asked to be dropped.
        table: String,
        /// A table still holding a foreign key into it.
        referencing_table: String,
        /// The referencing column.
        referencing_column: String,
    },
    /// `DELETE` was refused because a row is still the target of a foreign key.
    #[error("cannot delete from '{table}': row is referenced by {referencing_table}.{referencing_column}")]
    RefusedDelete {
        /// The table the delete targeted.
        table: String,
        /// A table still holding a foreign key into the deleted row.
        referencing_table: String,
        /// The referencing column.
        referencing_column: String,
    },
    /// `CREATE INDEX`/probing referenced an index that is not registered.
    #[error("no such index '{0}'")]
    NoSuchIndex(String),
    /// An aggregate was used where it isn't allowed, or a non-aggregate
    /// projection item was not named in GROUP BY (§9 Open question).
    #[error("aggregate misuse: {0}")]
    AggregateMisuse(String),
    /// A filesystem operation failed. After this error during commit, the
    /// on-disk state is guaranteed to be the pre-statement state (§7).
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Which of the three failure bands (§7) an [`Error`] belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Band {
    /// Programmer error in SQL text: never mutates persistent state.
    A,
    /// Data or constraint violation: never mutates persistent state.
    B,
    /// Environment fault: on-disk state remains the pre-statement state.
    C,
}

impl Error {
    /// Builds a [`Error::SyntaxError`] at the given location.
    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Error::SyntaxError {
            message: message.into(),
            location,
        }
    }

    /// The failure band this error belongs to (§7).
    pub fn band(&self) -> Band {
        match self {
            Error::SyntaxError { .. }
            | Error::UnknownTable(_)
            | Error::UnknownColumn(_)
            | Error::AmbiguousColumn(_)
            | Error::AggregateMisuse(_) => Band::A,
            Error::TypeMismatch(_)
            | Error::NullViolation(_)
            | Error::UniqueViolation(_, _)
            | Error::FKViolation { .. }
            | Error::RefusedDrop { .. }
            | Error::RefusedDelete { .. }
            | Error::NoSuchIndex(_) => Band::B,
            Error::IoError(_) => Band::C,
        }
    }

    /// A short machine-readable name for the variant, matching §6's taxonomy
    /// (used by the facade's `Ack`/error reporting and by tests).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::SyntaxError { .. } => "SyntaxError",
            Error::UnknownTable(_) => "UnknownTable",
            Error::UnknownColumn(_) => "UnknownColumn",
            Error::AmbiguousColumn(_) => "AmbiguousColumn",
            Error::TypeMismatch(_) => "TypeMismatch",
            Error::NullViolation(_) => "NullViolation",
            Error::UniqueViolation(_, _) => "UniqueViolation",
            Error::FKViolation { .. } => "FKViolation",
            Error::RefusedDrop { .. } => "RefusedDrop",
            Error::RefusedDelete { .. } => "RefusedDelete",
            Error::NoSuchIndex(_) => "NoSuchIndex",
            Error::AggregateMisuse(_) => "AggregateMisuse",
            Error::IoError(_) => "IOError",
        }
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_match_the_taxonomy() {
        assert_eq!(Error::UnknownTable("t".into()).band(), Band::A);
        assert_eq!(
            Error::UniqueViolation("e".into(), "a".into()).band(),
            Band::B
        );
        assert_eq!(
            Error::IoError(io::Error::new(io::ErrorKind::Other, "disk full")).band(),
            Band::C
        );
    }

    #[test]
    fn kind_names_match_external_taxonomy() {
        assert_eq!(Error::UnknownTable("t".into()).kind(), "UnknownTable");
        assert_eq!(
            Error::IoError(io::Error::new(io::ErrorKind::Other, "x")).kind(),
            "IOError"
        );
    }
}
