//! ORM configuration.

use crate::Result;
use crate::dialect::Dialect;
use crate::error::{ConfigError, Error};
use serde::Deserialize;

/// Settings shared by every query created from one [`Orm`](crate::Orm).
///
/// # Example
///
/// ```
/// use joinery_core::{Dialect, OrmConfig};
///
/// let config = OrmConfig::from_json(r#"{ "dialect": "mysql", "group_divider": "__" }"#).unwrap();
/// assert_eq!(config.dialect, Dialect::Mysql);
/// assert_eq!(config.group_divider, "__");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrmConfig {
    /// SQL dialect for quoting and placeholders.
    pub dialect: Dialect,
    /// Divider between alias and column in auto-selected output names.
    pub group_divider: String,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            group_divider: ".".to_string(),
        }
    }
}

impl OrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document. Missing keys take their defaults.
    #[allow(clippy::result_large_err)]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid ORM configuration: {e}"),
                source: Some(Box::new(e)),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.group_divider.is_empty() {
            return Err(Error::Config(ConfigError {
                message: "group_divider must not be empty".to_string(),
                source: None,
            }));
        }
        Ok(())
    }

    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn group_divider(mut self, divider: impl Into<String>) -> Self {
        self.group_divider = divider.into();
        self
    }
}
