//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::mysql::{MySql, MySqlTypeInfo};
use sqlx::{Database, Type};

/// A value that can be bound to a MySQL statement. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    /// Arrays and objects, bound as their JSON text.
    Json(Value),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    BindValue::U64(u)
                } else {
                    BindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => BindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        }
    }
}

impl From<&Value> for BindValue {
    fn from(v: &Value) -> Self {
        BindValue::from_json(v)
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::String(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::String(s.to_string())
    }
}

impl From<i64> for BindValue {
    fn from(n: i64) -> Self {
        BindValue::I64(n)
    }
}

impl<'q> Encode<'q, MySql> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <MySql as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null => IsNull::Yes,
            BindValue::Bool(b) => <bool as Encode<MySql>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<MySql>>::encode_by_ref(n, buf)?,
            BindValue::U64(n) => <u64 as Encode<MySql>>::encode_by_ref(n, buf)?,
            BindValue::F64(n) => <f64 as Encode<MySql>>::encode_by_ref(n, buf)?,
            BindValue::String(s) => <String as Encode<MySql>>::encode_by_ref(s, buf)?,
            BindValue::Json(v) => {
                let text = v.to_string();
                <String as Encode<MySql>>::encode_by_ref(&text, buf)?
            }
        })
    }

    /// The wire type differs per variant; report it so the server parses the bytes correctly.
    fn produces(&self) -> Option<MySqlTypeInfo> {
        Some(match self {
            BindValue::Bool(_) => <bool as Type<MySql>>::type_info(),
            BindValue::I64(_) => <i64 as Type<MySql>>::type_info(),
            BindValue::U64(_) => <u64 as Type<MySql>>::type_info(),
            BindValue::F64(_) => <f64 as Type<MySql>>::type_info(),
            BindValue::Null | BindValue::String(_) | BindValue::Json(_) => {
                <String as Type<MySql>>::type_info()
            }
        })
    }
}

impl Type<MySql> for BindValue {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<MySql>>::type_info()
    }
}
