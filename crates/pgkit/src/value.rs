//! Scalar values and rows.
//!
//! [`Value`] is the parameter type accepted by [`QueryClient::query_with`](crate::QueryClient)
//! and the cell type of a decoded [`Row`]. Binding adapts to the column type the server
//! reports for the placeholder, so an `Int` can fill an `int2`, `int4` or `int8` slot.

use crate::error::{PgError, PgResult};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

/// A scalar value as exchanged with the driver.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if let Kind::Domain(base) = ty.kind() {
            return self.to_sql(base, out);
        }
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => v.to_sql_checked(ty, out),
            Self::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Self::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Self::Text(v) => v.to_sql_checked(ty, out),
            Self::Json(v) => v.to_sql_checked(ty, out),
            Self::Uuid(v) => v.to_sql_checked(ty, out),
            Self::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Self::Bytes(v) => v.to_sql_checked(ty, out),
        }
    }

    // The variant decides; mismatches surface from the inner `to_sql_checked`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v $(as $cast)?)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    f32 => Float as f64,
    f64 => Float,
    String => Text,
    serde_json::Value => Json,
    uuid::Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A decoded row: column names mapped to values, in result-column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column (builder style).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column, replacing an existing value of the same name.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Get a column or fail with a decode error naming it.
    pub fn try_get(&self, column: &str) -> PgResult<&Value> {
        self.get(column)
            .ok_or_else(|| PgError::decode(column, "column not present in row"))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Decode every column of a driver row.
    pub fn from_pg(row: &tokio_postgres::Row) -> PgResult<Self> {
        let columns = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Ok((col.name().to_string(), decode_cell(row, idx, col)?)))
            .collect::<PgResult<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Build a row from the simple query protocol, where every cell is text.
    pub fn from_simple(row: &tokio_postgres::SimpleQueryRow) -> PgResult<Self> {
        let mut columns = Vec::with_capacity(row.len());
        for (idx, col) in row.columns().iter().enumerate() {
            let cell = row
                .try_get(idx)
                .map_err(|e| PgError::decode(col.name(), e.to_string()))?;
            columns.push((col.name().to_string(), Value::from(cell)));
        }
        Ok(Self { columns })
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn decode_cell(
    row: &tokio_postgres::Row,
    idx: usize,
    col: &tokio_postgres::Column,
) -> PgResult<Value> {
    fn get<'a, T>(row: &'a tokio_postgres::Row, idx: usize, name: &str) -> PgResult<Value>
    where
        T: tokio_postgres::types::FromSql<'a> + Into<Value>,
    {
        row.try_get::<_, Option<T>>(idx)
            .map(Value::from)
            .map_err(|e| PgError::decode(name, e.to_string()))
    }

    let name = col.name();
    match *col.type_() {
        Type::BOOL => get::<bool>(row, idx, name),
        Type::INT2 => get::<i16>(row, idx, name),
        Type::INT4 => get::<i32>(row, idx, name),
        Type::INT8 => get::<i64>(row, idx, name),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)
            .map(|v| Value::from(v.map(i64::from)))
            .map_err(|e| PgError::decode(name, e.to_string())),
        Type::FLOAT4 => get::<f32>(row, idx, name),
        Type::FLOAT8 => get::<f64>(row, idx, name),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, idx, name)
        }
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, name),
        Type::UUID => get::<uuid::Uuid>(row, idx, name),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx, name),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map(|v| Value::from(v.map(|ts| ts.and_utc())))
            .map_err(|e| PgError::decode(name, e.to_string())),
        Type::BYTEA => get::<Vec<u8>>(row, idx, name),
        ref other if matches!(other.kind(), Kind::Domain(_)) => row
            .try_get::<_, Option<DomainCell>>(idx)
            .map(|v| v.map_or(Value::Null, |cell| cell.0))
            .map_err(|e| PgError::decode(name, e.to_string())),
        ref other => Err(PgError::decode(
            name,
            format!("unsupported column type {other}"),
        )),
    }
}

/// A cell whose type is a domain (`information_schema.sql_identifier`,
/// `cardinal_number`, ...), decoded through its base type.
struct DomainCell(Value);

impl<'a> FromSql<'a> for DomainCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        match ty.kind() {
            Kind::Domain(base) => decode_base(base, raw).map(DomainCell),
            _ => Err(format!("{ty} is not a domain type").into()),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Domain(_))
    }
}

fn decode_base(ty: &Type, raw: &[u8]) -> Result<Value, Box<dyn Error + Sync + Send>> {
    Ok(match *ty {
        Type::BOOL => bool::from_sql(ty, raw)?.into(),
        Type::INT2 => i16::from_sql(ty, raw)?.into(),
        Type::INT4 => i32::from_sql(ty, raw)?.into(),
        Type::INT8 => i64::from_sql(ty, raw)?.into(),
        Type::FLOAT4 => f32::from_sql(ty, raw)?.into(),
        Type::FLOAT8 => f64::from_sql(ty, raw)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => String::from_sql(ty, raw)?.into(),
        Type::TIMESTAMPTZ => DateTime::<Utc>::from_sql(ty, raw)?.into(),
        Type::TIMESTAMP => NaiveDateTime::from_sql(ty, raw)?.and_utc().into(),
        ref other => match other.kind() {
            Kind::Domain(base) => decode_base(base, raw)?,
            _ => return Err(format!("unsupported domain base type {other}").into()),
        },
    })
}
