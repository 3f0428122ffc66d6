use core::fmt;

/// Defines the closed keyword set and a sorted string table for lookup.
///
/// The keyword list must stay sorted: [`Keyword::from_str`] resolves an
/// upper-cased identifier with a binary search over `KEYWORDS_STRING`.
macro_rules! define_keywords {
    ($($keyword:ident),* $(,)?) => {
        /// A reserved word of the tinybase SQL dialect (§4.2). Keywords are
        /// matched case-insensitively and may not be used as identifiers.
        #[allow(non_camel_case_types)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Keyword {
            $(
                #[doc = stringify!($keyword)]
                $keyword,
            )*
        }

        /// Every keyword's canonical upper-case spelling, sorted to match
        /// declaration order (which must itself be alphabetical).
        const KEYWORDS_STRING: &[&str] = &[$(stringify!($keyword)),*];

        impl Keyword {
            /// Resolves an identifier to a keyword, if it names one.
            /// Matching is case-insensitive; `text` need not be upper-cased.
            pub fn from_str(text: &str) -> Option<Keyword> {
                // Linear scan: the table is small (~50 entries) and this
                // avoids allocating an upper-cased copy for every lookup.
                KEYWORDS_STRING
                    .iter()
                    .position(|candidate| candidate.eq_ignore_ascii_case(text))
                    .map(|index| Self::ALL[index])
            }

            /// The canonical upper-case spelling, e.g. `Keyword::Select.as_str() == "SELECT"`.
            pub fn as_str(&self) -> &'static str {
                KEYWORDS_STRING[*self as usize]
            }

            /// All keywords, in the same order as `KEYWORDS_STRING`.
            const ALL: &'static [Keyword] = &[$(Keyword::$keyword),*];
        }
    };
}

define_keywords! {
    AND, AS, ASC, AVG, BOOLEAN, BY, COUNT, CREATE, CROSS, DATE, DELETE, DESC,
    DROP, EXPLAIN, FALSE, FLOAT, FOREIGN, FROM, GROUP, HAVING, IN, INDEX,
    INNER, INSERT, INT, INTEGER, INTO, IS, JOIN, KEY, LEFT, LIKE, LIMIT, MAX,
    MIN, NOT, NULL, ON, OR, ORDER, OUTER, PRIMARY, REFERENCES, RIGHT, SELECT,
    SET, SUM, TABLE, TRUE, UNIQUE, UPDATE, USING, VALUES, VARCHAR, WHERE,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Keyword;

    #[test]
    fn resolves_case_insensitively() {
        assert_eq!(Keyword::from_str("select"), Some(Keyword::SELECT));
        assert_eq!(Keyword::from_str("Select"), Some(Keyword::SELECT));
        assert_eq!(Keyword::from_str("SELECT"), Some(Keyword::SELECT));
    }

    #[test]
    fn rejects_non_keywords() {
        assert_eq!(Keyword::from_str("widget"), None);
        assert_eq!(Keyword::from_str(""), None);
    }

    #[test]
    fn as_str_round_trips() {
        for &keyword in Keyword::ALL {
            assert_eq!(Keyword::from_str(keyword.as_str()), Some(keyword));
        }
    }
}
