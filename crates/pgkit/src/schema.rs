//! Table schemas and input validation.
//!
//! A [`TableSchema`] lists the columns a caller is willing to write. It is
//! used by [`validate_prop_vals_for_input`] to drop undeclared columns before
//! they reach generated SQL.
//!
//! Schemas deserialize from a name plus a column map, where each column is
//! either a bare type tag or an object with a `kind`:
//!
//! ```rust
//! use pgkit::{ColumnKind, TableSchema};
//!
//! let schema: TableSchema = serde_json::from_str(
//!     r#"{"name": "users", "columns": {"name": "String", "rank": {"kind": "Integer"}}}"#,
//! ).unwrap();
//! assert_eq!(schema.get("rank").map(|c| &c.kind), Some(&ColumnKind::Integer));
//! ```

use crate::error::{PgError, PgResult};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Declared type of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    String,
    Integer,
    Float,
    Boolean,
    Json,
    Uuid,
    Timestamp,
    /// Any tag not recognised above, kept as written.
    Other(String),
}

impl ColumnKind {
    /// Parse a free-form type tag (`"String"`, `"integer"`, `"character varying"`, ...).
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "string" | "text" | "varchar" | "character varying" | "char" | "character"
            | "name" => Self::String,
            "integer" | "int" | "int2" | "int4" | "int8" | "smallint" | "bigint" => Self::Integer,
            "number" | "float" | "float4" | "float8" | "real" | "double precision"
            | "numeric" | "decimal" => Self::Float,
            "boolean" | "bool" => Self::Boolean,
            "json" | "jsonb" | "object" => Self::Json,
            "uuid" => Self::Uuid,
            "date" | "timestamp" | "timestamptz" | "timestamp with time zone"
            | "timestamp without time zone" => Self::Timestamp,
            _ => Self::Other(tag.to_string()),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Json => "Json",
            Self::Uuid => "Uuid",
            Self::Timestamp => "Timestamp",
            Self::Other(tag) => tag,
        };
        f.write_str(s)
    }
}

impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub kind: ColumnKind,
}

impl ColumnSchema {
    pub fn new(kind: ColumnKind) -> Self {
        Self { kind }
    }
}

impl<'de> Deserialize<'de> for ColumnSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Tag(ColumnKind),
            Full { kind: ColumnKind },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Tag(kind) | Repr::Full { kind } => Self { kind },
        })
    }
}

/// Columns of one table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(deserialize_with = "ordered_columns")]
    pub columns: Vec<(String, ColumnSchema)>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add or replace a column (builder style).
    pub fn column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.add_column(name, kind);
        self
    }

    pub fn add_column(&mut self, name: impl Into<String>, kind: ColumnKind) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = ColumnSchema::new(kind),
            None => self.columns.push((name, ColumnSchema::new(kind))),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn ordered_columns<'de, D>(deserializer: D) -> Result<Vec<(String, ColumnSchema)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ColumnsVisitor;

    impl<'de> Visitor<'de> for ColumnsVisitor {
        type Value = Vec<(String, ColumnSchema)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of column name to column definition")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut columns = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, column)) = map.next_entry::<String, ColumnSchema>()? {
                columns.push((name, column));
            }
            Ok(columns)
        }
    }

    deserializer.deserialize_map(ColumnsVisitor)
}

/// Column/value pairs that survived validation, still paired by position.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredInput<V> {
    pub cols: Vec<String>,
    pub vals: Vec<V>,
}

impl<V> FilteredInput<V> {
    pub fn len(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }
}

/// Keep only the pairs whose column is declared in `schema`.
///
/// Order and column/value pairing are preserved. Undeclared columns are
/// dropped without error; `columns` and `values` of different lengths are a
/// [`PgError::Mismatch`].
pub fn validate_prop_vals_for_input<S, V>(
    schema: &TableSchema,
    columns: &[S],
    values: Vec<V>,
) -> PgResult<FilteredInput<V>>
where
    S: AsRef<str>,
{
    if columns.len() != values.len() {
        return Err(PgError::mismatch(
            "input columns/values",
            columns.len(),
            values.len(),
        ));
    }

    let mut cols = Vec::with_capacity(columns.len());
    let mut vals = Vec::with_capacity(values.len());

    for (column, value) in columns.iter().zip(values) {
        let column = column.as_ref();
        if schema.has_column(column) {
            cols.push(column.to_string());
            vals.push(value);
        } else {
            tracing::trace!(
                target: "pgkit.schema",
                table = %schema.name,
                column,
                "dropping undeclared column"
            );
        }
    }

    Ok(FilteredInput { cols, vals })
}
