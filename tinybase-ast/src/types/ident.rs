#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An unquoted identifier: a table name, column name, or alias.
///
/// The dialect only supports the unquoted ASCII form (§6: "Identifiers are
/// unquoted ASCII letters/digits/underscore starting with a letter"), so
/// unlike a general-purpose SQL AST there is no quote style to track here.
/// `value` is stored exactly as written; case-insensitive comparison is the
/// catalog's job, not the AST's.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ident {
    /// The identifier text, exactly as written in the source.
    pub value: String,
}

impl Ident {
    /// Creates a new identifier with the given value.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Ident {
            value: value.into(),
        }
    }

    /// Returns the identifier compared case-insensitively, for catalog lookups.
    pub fn to_canonical(&self) -> String {
        self.value.to_lowercase()
    }
}

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Ident::new(value)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.value)
    }
}
