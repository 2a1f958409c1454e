//! Bindable values and argument expressions.
//!
//! Every comparable literal belongs to exactly one [`Family`]. [`Arg`] is what
//! a statement accepts in an argument position: a literal, an inlined
//! [`Instruction`], or a function-wrapped arg mirroring [`Column`] wrapping.
//!
//! [`Column`]: crate::Column

use crate::column::SqlFunction;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type ToSqlResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// The four closed value families. Each owns its own operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Text,
    Number,
    Boolean,
    Bytes,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Bytes => "bytes",
        })
    }
}

/// A PostgreSQL `interval`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl Interval {
    pub const fn from_microseconds(microseconds: i64) -> Self {
        Self {
            months: 0,
            days: 0,
            microseconds,
        }
    }
}

impl From<std::time::Duration> for Interval {
    fn from(duration: std::time::Duration) -> Self {
        Self::from_microseconds(i64::try_from(duration.as_micros()).unwrap_or(i64::MAX))
    }
}

impl From<chrono::TimeDelta> for Interval {
    fn from(delta: chrono::TimeDelta) -> Self {
        Self::from_microseconds(delta.num_microseconds().unwrap_or(if delta < chrono::TimeDelta::zero() {
            i64::MIN
        } else {
            i64::MAX
        }))
    }
}

impl ToSql for Interval {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> ToSqlResult {
        out.put_i64(self.microseconds);
        out.put_i32(self.days);
        out.put_i32(self.months);
        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INTERVAL
    }

    to_sql_checked!();
}

/// Number family literals: integers, floats, instants and durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Timestamp(DateTime<Utc>),
    Interval(Interval),
}

impl Number {
    fn to_sql_checked_inner(&self, ty: &Type, out: &mut BytesMut) -> ToSqlResult {
        // Lossless widening, so an `i32` can be bound where the server infers `int8`.
        match (self, ty) {
            (Self::SmallInt(v), t) if *t == Type::INT4 => i32::from(*v).to_sql_checked(ty, out),
            (Self::SmallInt(v), t) if *t == Type::INT8 => i64::from(*v).to_sql_checked(ty, out),
            (Self::Int(v), t) if *t == Type::INT8 => i64::from(*v).to_sql_checked(ty, out),
            (Self::Real(v), t) if *t == Type::FLOAT8 => f64::from(*v).to_sql_checked(ty, out),
            (Self::SmallInt(v), _) => v.to_sql_checked(ty, out),
            (Self::Int(v), _) => v.to_sql_checked(ty, out),
            (Self::BigInt(v), _) => v.to_sql_checked(ty, out),
            (Self::Real(v), _) => v.to_sql_checked(ty, out),
            (Self::Double(v), _) => v.to_sql_checked(ty, out),
            (Self::Timestamp(v), _) => v.to_sql_checked(ty, out),
            (Self::Interval(v), _) => v.to_sql_checked(ty, out),
        }
    }
}

/// A bindable literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(Number),
    Boolean(bool),
    Bytes(Vec<u8>),
    /// Bindable in changes, but not comparable through a family operator.
    Uuid(Uuid),
    /// Bindable in changes, but not comparable through a family operator.
    Json(serde_json::Value),
}

impl Value {
    /// The family this value belongs to, if any.
    pub fn family(&self) -> Option<Family> {
        match self {
            Self::Text(_) => Some(Family::Text),
            Self::Number(_) => Some(Family::Number),
            Self::Boolean(_) => Some(Family::Boolean),
            Self::Bytes(_) => Some(Family::Bytes),
            Self::Uuid(_) | Self::Json(_) => None,
        }
    }

    /// Deduplication key: concrete type tag plus canonical bytes. Values of
    /// different types never share a key even if their bytes are equal.
    pub(crate) fn dedup_key(&self) -> ArgKey {
        let (tag, bytes): (u8, Vec<u8>) = match self {
            Self::Text(v) => (1, v.as_bytes().to_vec()),
            Self::Number(Number::SmallInt(v)) => (2, v.to_le_bytes().to_vec()),
            Self::Number(Number::Int(v)) => (3, v.to_le_bytes().to_vec()),
            Self::Number(Number::BigInt(v)) => (4, v.to_le_bytes().to_vec()),
            Self::Number(Number::Real(v)) => (5, v.to_bits().to_le_bytes().to_vec()),
            Self::Number(Number::Double(v)) => (6, v.to_bits().to_le_bytes().to_vec()),
            Self::Number(Number::Timestamp(v)) => {
                let mut bytes = v.timestamp().to_le_bytes().to_vec();
                bytes.extend_from_slice(&v.timestamp_subsec_nanos().to_le_bytes());
                (7, bytes)
            }
            Self::Number(Number::Interval(v)) => {
                let mut bytes = v.microseconds.to_le_bytes().to_vec();
                bytes.extend_from_slice(&v.days.to_le_bytes());
                bytes.extend_from_slice(&v.months.to_le_bytes());
                (8, bytes)
            }
            Self::Boolean(v) => (9, vec![u8::from(*v)]),
            Self::Bytes(v) => (10, v.clone()),
            Self::Uuid(v) => (11, v.as_bytes().to_vec()),
            Self::Json(v) => (12, v.to_string().into_bytes()),
        };
        ArgKey { tag, bytes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ArgKey {
    tag: u8,
    bytes: Vec<u8>,
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> ToSqlResult {
        match self {
            Self::Text(v) if *ty == Type::BYTEA => {
                let bytes: &[u8] = v.as_bytes();
                bytes.to_sql(ty, out)
            }
            Self::Text(v) => v.to_sql(ty, out),
            Self::Number(v) => v.to_sql_checked_inner(ty, out),
            Self::Boolean(v) => v.to_sql(ty, out),
            Self::Bytes(v) => v.to_sql(ty, out),
            Self::Uuid(v) => v.to_sql(ty, out),
            Self::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn to_sql_checked(&self, ty: &Type, out: &mut BytesMut) -> ToSqlResult {
        match self {
            Self::Text(v) if *ty == Type::BYTEA => {
                let bytes: &[u8] = v.as_bytes();
                bytes.to_sql_checked(ty, out)
            }
            Self::Text(v) => v.to_sql_checked(ty, out),
            Self::Number(v) => v.to_sql_checked_inner(ty, out),
            Self::Boolean(v) => v.to_sql_checked(ty, out),
            Self::Bytes(v) => v.to_sql_checked(ty, out),
            Self::Uuid(v) => v.to_sql_checked(ty, out),
            Self::Json(v) => v.to_sql_checked(ty, out),
        }
    }
}

/// Literal SQL keywords that bypass parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Now,
    Null,
    Default,
}

impl Instruction {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Now => "NOW()",
            Self::Null => "NULL",
            Self::Default => "DEFAULT",
        }
    }
}

/// Anything that can be written in an argument position.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Instruction(Instruction),
    Function(SqlFunction, Box<Arg>),
    /// `COALESCE(arg, fallback)`
    Coalesce(Box<Arg>, Box<Arg>),
}

impl Arg {
    /// Wrap an argument in `LOWER(...)`.
    pub fn lower(arg: impl Into<Arg>) -> Self {
        Self::Function(SqlFunction::Lower, Box::new(arg.into()))
    }

    /// Wrap an argument in `SHA256(...)`.
    pub fn sha256(arg: impl Into<Arg>) -> Self {
        Self::Function(SqlFunction::Sha256, Box::new(arg.into()))
    }

    /// `COALESCE(arg, fallback)`
    pub fn coalesce(arg: impl Into<Arg>, fallback: impl Into<Arg>) -> Self {
        Self::Coalesce(Box::new(arg.into()), Box::new(fallback.into()))
    }

    /// The family of the wrapped literal. `NOW()` counts as a number
    /// (a time instant); `NULL` and `DEFAULT` have no family.
    pub fn family(&self) -> Option<Family> {
        match self {
            Self::Value(v) => v.family(),
            Self::Instruction(Instruction::Now) => Some(Family::Number),
            Self::Instruction(_) => None,
            Self::Function(_, inner) => inner.family(),
            Self::Coalesce(arg, fallback) => arg.family().or_else(|| fallback.family()),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Instruction> for Arg {
    fn from(instruction: Instruction) -> Self {
        Self::Instruction(instruction)
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Self::Number(number)
    }
}

impl From<Number> for Arg {
    fn from(number: Number) -> Self {
        Self::Value(Value::Number(number))
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => |$v:ident| $expr:expr;)*) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $expr
                }
            }

            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_value_from! {
    String => |v| Value::Text(v);
    &str => |v| Value::Text(v.to_string());
    &String => |v| Value::Text(v.clone());
    std::borrow::Cow<'_, str> => |v| Value::Text(v.into_owned());
    i16 => |v| Value::Number(Number::SmallInt(v));
    i32 => |v| Value::Number(Number::Int(v));
    i64 => |v| Value::Number(Number::BigInt(v));
    f32 => |v| Value::Number(Number::Real(v));
    f64 => |v| Value::Number(Number::Double(v));
    DateTime<Utc> => |v| Value::Number(Number::Timestamp(v));
    Interval => |v| Value::Number(Number::Interval(v));
    std::time::Duration => |v| Value::Number(Number::Interval(Interval::from(v)));
    chrono::TimeDelta => |v| Value::Number(Number::Interval(Interval::from(v)));
    bool => |v| Value::Boolean(v);
    Vec<u8> => |v| Value::Bytes(v);
    &[u8] => |v| Value::Bytes(v.to_vec());
    Uuid => |v| Value::Uuid(v);
    serde_json::Value => |v| Value::Json(v);
}
