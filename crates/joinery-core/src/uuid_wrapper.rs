//! Normalizing UUID values.
//!
//! In memory a UUID is always [`Value::Uuid`]. The database may hold it as
//! hyphenated text or as 16 raw bytes; [`UuidWrapper`] converts between the
//! forms. Everything here needs the `uuid` feature; without it each call
//! fails with [`Error::Logic`].

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// UUID generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UuidVersion {
    /// Random
    V4,
    /// Time-ordered
    #[default]
    V7,
}

/// Conversions between the typed UUID value and its storage forms.
pub struct UuidWrapper;

#[cfg(feature = "uuid")]
impl UuidWrapper {
    /// Normalize `value` into [`Value::Uuid`].
    ///
    /// Accepts an already wrapped UUID, 16 raw bytes, or text in any format
    /// the `uuid` crate parses. NULL passes through. Anything else is a type
    /// error.
    #[allow(clippy::result_large_err)]
    pub fn wrap(value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Uuid(bytes) => Ok(Value::Uuid(*bytes)),
            Value::Bytes(bytes) => ::uuid::Uuid::from_slice(bytes)
                .map(|id| Value::Uuid(id.into_bytes()))
                .map_err(|_| not_a_uuid(value)),
            Value::Text(text) => ::uuid::Uuid::parse_str(text.trim())
                .map(|id| Value::Uuid(id.into_bytes()))
                .map_err(|_| not_a_uuid(value)),
            other => Err(not_a_uuid(other)),
        }
    }

    /// Like [`wrap`](Self::wrap), but unrecognized input becomes NULL.
    #[allow(clippy::result_large_err)]
    pub fn try_wrap(value: &Value) -> Result<Value> {
        Ok(Self::wrap(value).unwrap_or(Value::Null))
    }

    /// A fresh UUID of the given version.
    #[allow(clippy::result_large_err)]
    pub fn generate(version: UuidVersion) -> Result<Value> {
        let id = match version {
            UuidVersion::V4 => ::uuid::Uuid::new_v4(),
            UuidVersion::V7 => ::uuid::Uuid::now_v7(),
        };
        tracing::trace!(%id, ?version, "generated uuid");
        Ok(Value::Uuid(id.into_bytes()))
    }

    /// The hyphenated text form of a UUID value. NULL stays NULL.
    #[allow(clippy::result_large_err)]
    pub fn to_text(value: &Value) -> Result<Value> {
        match Self::wrap(value)? {
            Value::Uuid(bytes) => Ok(Value::Text(
                ::uuid::Uuid::from_bytes(bytes).hyphenated().to_string(),
            )),
            other => Ok(other),
        }
    }

    /// The 16-byte binary form of a UUID value. NULL stays NULL.
    #[allow(clippy::result_large_err)]
    pub fn to_binary(value: &Value) -> Result<Value> {
        match Self::wrap(value)? {
            Value::Uuid(bytes) => Ok(Value::Bytes(bytes.to_vec())),
            other => Ok(other),
        }
    }
}

#[cfg(not(feature = "uuid"))]
impl UuidWrapper {
    #[allow(clippy::result_large_err)]
    pub fn wrap(_value: &Value) -> Result<Value> {
        Err(missing_uuid_support())
    }

    #[allow(clippy::result_large_err)]
    pub fn try_wrap(_value: &Value) -> Result<Value> {
        Err(missing_uuid_support())
    }

    #[allow(clippy::result_large_err)]
    pub fn generate(_version: UuidVersion) -> Result<Value> {
        Err(missing_uuid_support())
    }

    #[allow(clippy::result_large_err)]
    pub fn to_text(_value: &Value) -> Result<Value> {
        Err(missing_uuid_support())
    }

    #[allow(clippy::result_large_err)]
    pub fn to_binary(_value: &Value) -> Result<Value> {
        Err(missing_uuid_support())
    }
}

#[cfg(not(feature = "uuid"))]
fn missing_uuid_support() -> Error {
    Error::Logic(
        "Please enable the `uuid` feature of joinery to use UUID casters.".to_string(),
    )
}

#[cfg_attr(not(feature = "uuid"), allow(dead_code))]
fn not_a_uuid(value: &Value) -> Error {
    Error::Type(TypeError {
        expected: "UUID",
        actual: value.type_name().to_string(),
        column: None,
        rust_type: Some("[u8; 16]"),
    })
}
