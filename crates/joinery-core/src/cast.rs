//! Field casters.
//!
//! A caster transforms one field's value. [`ValueCast`]s run on every read
//! (hydrate) and write (extract); [`SaveCast`]s run once more right before an
//! entity is stored, with knowledge of whether it is being inserted.

use crate::Result;
use crate::error::Error;
use crate::orm::Orm;
use crate::uuid_wrapper::{UuidVersion, UuidWrapper};
use crate::value::Value;
use chrono::{DateTime, Months, TimeDelta, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// Option bit: an empty value is stored as NULL instead of a new UUID.
pub const NULLABLE: u8 = 1 << 0;

/// What a caster knows about the entity it is working on.
#[derive(Debug, Clone, Copy)]
pub struct CastContext<'a> {
    pub orm: &'a Orm,
    /// The entity has not been stored yet.
    pub is_new: bool,
    /// The entity declares a primary key.
    pub entity_has_key: bool,
    /// The field being cast is part of the primary key.
    pub field_is_key: bool,
}

/// A caster attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCaster {
    Value(ValueCast),
    Save(SaveCast),
}

/// Read/write casters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCast {
    Uuid(UuidCast),
    UuidBin(UuidBinCast),
}

impl ValueCast {
    /// Convert a stored value into its in-memory form.
    #[allow(clippy::result_large_err)]
    pub fn hydrate(&self, value: &Value, _ctx: &CastContext<'_>) -> Result<Value> {
        match self {
            ValueCast::Uuid(cast) => cast.hydrate(value),
            ValueCast::UuidBin(cast) => cast.hydrate(value),
        }
    }

    /// Convert an in-memory value into the form handed to the store.
    #[allow(clippy::result_large_err)]
    pub fn extract(&self, value: &Value, _ctx: &CastContext<'_>) -> Result<Value> {
        match self {
            ValueCast::Uuid(cast) => cast.extract(value),
            ValueCast::UuidBin(cast) => cast.extract(value),
        }
    }
}

/// Casters applied before storing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveCast {
    CreatedTime(CreatedTime),
    Uuid(UuidCast),
    UuidBin(UuidBinCast),
}

impl SaveCast {
    #[allow(clippy::result_large_err)]
    pub fn cast_for_save(&self, value: Value, ctx: &CastContext<'_>) -> Result<Value> {
        match self {
            SaveCast::CreatedTime(cast) => cast.cast_for_save(value, ctx),
            SaveCast::Uuid(cast) => cast.cast_for_save(&value),
            SaveCast::UuidBin(cast) => cast.cast_for_save(&value),
        }
    }
}

/// Stamps a creation time on insert.
///
/// `time` is `"now"` or a relative expression such as `"+1 day"`,
/// `"-2 hours"` or `"now +1 week -3 days"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedTime {
    pub time: &'static str,
}

impl CreatedTime {
    pub const fn now() -> Self {
        Self { time: "now" }
    }

    pub const fn at(time: &'static str) -> Self {
        Self { time }
    }

    /// The configured time, resolved against the clock.
    #[allow(clippy::result_large_err)]
    pub fn current(&self) -> Result<Value> {
        let at = resolve_time(self.time, Utc::now())?;
        Ok(Value::TimestampTz(at.timestamp_micros()))
    }

    /// Ignore `value` and return the configured time.
    #[allow(clippy::result_large_err)]
    pub fn filter(&self, _value: &Value) -> Result<Value> {
        self.current()
    }

    /// Fill an empty created time.
    ///
    /// NULL or the adapter's null date is replaced by the current time when
    /// the entity has no primary key, or has one and is new. Other values are
    /// kept.
    #[allow(clippy::result_large_err)]
    pub fn cast_for_save(&self, value: Value, ctx: &CastContext<'_>) -> Result<Value> {
        let is_null = value.is_null() || ctx.orm.adapter().is_null_date(&value);
        if is_null && (!ctx.entity_has_key || ctx.is_new) {
            return self.current();
        }
        Ok(value)
    }
}

impl Default for CreatedTime {
    fn default() -> Self {
        Self::now()
    }
}

/// UUID stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UuidCast {
    pub version: UuidVersion,
}

impl UuidCast {
    pub const fn new() -> Self {
        Self {
            version: UuidVersion::V7,
        }
    }

    pub const fn version(mut self, version: UuidVersion) -> Self {
        self.version = version;
        self
    }

    /// Wrap a stored id. Empty values become NULL.
    #[allow(clippy::result_large_err)]
    pub fn hydrate(&self, value: &Value) -> Result<Value> {
        wrap_present(value)
    }

    /// Wrap an in-memory id. Empty values become NULL, leaving generation to
    /// the save step.
    #[allow(clippy::result_large_err)]
    pub fn extract(&self, value: &Value) -> Result<Value> {
        wrap_present(value)
    }

    /// Generate an id for an empty value, then store the text form.
    #[allow(clippy::result_large_err)]
    pub fn cast_for_save(&self, value: &Value) -> Result<Value> {
        let id = if value.is_falsy() {
            UuidWrapper::generate(self.version)?
        } else {
            UuidWrapper::wrap(value)?
        };
        UuidWrapper::to_text(&id)
    }
}

#[allow(clippy::result_large_err)]
fn wrap_present(value: &Value) -> Result<Value> {
    if value.is_falsy() {
        return Ok(Value::Null);
    }
    UuidWrapper::wrap(value)
}

/// UUID stored as 16 raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UuidBinCast {
    pub version: UuidVersion,
    pub options: u8,
}

impl UuidBinCast {
    pub const fn new() -> Self {
        Self {
            version: UuidVersion::V7,
            options: 0,
        }
    }

    pub const fn version(mut self, version: UuidVersion) -> Self {
        self.version = version;
        self
    }

    pub const fn options(mut self, options: u8) -> Self {
        self.options = options;
        self
    }

    /// Shorthand for `options(NULLABLE)`.
    pub const fn nullable(self) -> Self {
        self.options(self.options | NULLABLE)
    }

    pub const fn is_nullable(&self) -> bool {
        self.options & NULLABLE != 0
    }

    #[allow(clippy::result_large_err)]
    pub fn hydrate(&self, value: &Value) -> Result<Value> {
        UuidWrapper::try_wrap(value)
    }

    #[allow(clippy::result_large_err)]
    pub fn extract(&self, value: &Value) -> Result<Value> {
        UuidWrapper::try_wrap(value)
    }

    /// Generate an id for an empty value, unless nullable, then store the
    /// binary form.
    #[allow(clippy::result_large_err)]
    pub fn cast_for_save(&self, value: &Value) -> Result<Value> {
        if value.is_falsy() {
            if self.is_nullable() {
                // Fail fast without UUID support even when nothing is generated.
                UuidWrapper::try_wrap(&Value::Null)?;
                return Ok(Value::Null);
            }
            return UuidWrapper::to_binary(&UuidWrapper::generate(self.version)?);
        }
        UuidWrapper::to_binary(&UuidWrapper::wrap(value)?)
    }
}

fn offset_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?i)\s*([+-]?)\s*(\d+)\s*(seconds?|secs?|minutes?|mins?|hours?|days?|weeks?|months?|years?)(\s+ago)?",
            )
        })
        .as_ref()
        .map_err(|e| Error::Custom(format!("invalid time pattern: {e}")))
}

/// Resolve a time expression against `now`.
#[allow(clippy::result_large_err)]
pub fn resolve_time(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let invalid = || Error::InvalidArgument(format!("Unsupported time expression: {expr}"));

    let mut rest = expr.trim();
    if rest.get(..3).is_some_and(|head| head.eq_ignore_ascii_case("now")) {
        rest = &rest[3..];
    }

    let mut at = now;
    let mut pos = 0;
    for caps in offset_pattern()?.captures_iter(rest) {
        let whole = caps.get(0).ok_or_else(invalid)?;
        if whole.start() != pos {
            return Err(invalid());
        }
        pos = whole.end();

        let amount: i64 = caps[2].parse().map_err(|_| invalid())?;
        let negative = (&caps[1] == "-") ^ caps.get(4).is_some();
        let unit = caps[3].to_ascii_lowercase();

        at = if unit.starts_with("month") || unit.starts_with("year") {
            let months = if unit.starts_with("year") {
                amount.checked_mul(12)
            } else {
                Some(amount)
            };
            let months = months
                .and_then(|m| u32::try_from(m).ok())
                .map(Months::new)
                .ok_or_else(invalid)?;
            if negative {
                at.checked_sub_months(months)
            } else {
                at.checked_add_months(months)
            }
            .ok_or_else(invalid)?
        } else {
            let seconds_per = match unit.as_bytes()[0] {
                b's' => 1,
                b'm' => 60,
                b'h' => 3_600,
                b'd' => 86_400,
                _ => 604_800,
            };
            let seconds = amount
                .checked_mul(seconds_per)
                .map(|s| if negative { -s } else { s })
                .ok_or_else(invalid)?;
            let delta = TimeDelta::try_seconds(seconds).ok_or_else(invalid)?;
            at.checked_add_signed(delta).ok_or_else(invalid)?
        };
    }

    if !rest[pos..].trim().is_empty() {
        return Err(invalid());
    }
    Ok(at)
}
