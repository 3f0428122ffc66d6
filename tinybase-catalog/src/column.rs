use tinybase_types::DataType;

/// A resolved column of a table (§3 "Column"): its declared type and the
/// column-level constraints that apply to it, flattened from both the
/// column-level and table-level constraint syntax (§4.2).
#[derive(Clone, Debug)]
pub struct Column {
    /// The column name, stored exactly as declared.
    pub name: String,
    /// The declared type.
    pub data_type: DataType,
    /// Whether this column is the table's primary key. Implies `unique`
    /// and `not_null`.
    pub primary_key: bool,
    /// Whether this column carries a `UNIQUE` constraint (or is implied
    /// unique by `primary_key`).
    pub unique: bool,
    /// Whether this column carries a `NOT NULL` constraint (or is implied
    /// not-null by `primary_key`).
    pub not_null: bool,
    /// The `REFERENCES table(column)` target, if any.
    pub references: Option<ForeignKey>,
}

/// A `REFERENCES table(column)` target (§3 "Foreign-key references").
#[derive(Clone, Debug)]
pub struct ForeignKey {
    /// The referenced table, canonical (lower-cased) name.
    pub table: String,
    /// The referenced column, canonical (lower-cased) name.
    pub column: String,
}

impl Column {
    /// Whether this column may hold `NULL`.
    pub fn is_nullable(&self) -> bool {
        !self.not_null
    }
}
