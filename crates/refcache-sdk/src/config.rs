use refcache_types::UidField;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Settings for one cache instance.
///
/// Loaded from TOML:
///
/// ```toml
/// uid_field = "id"
/// max_history = 50
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Property that marks a record as an entity.
    pub uid_field: String,
    /// Most nodes a thread keeps after a write. Unlimited when unset.
    pub max_history: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            uid_field: refcache_types::uid::DEFAULT_UID_FIELD.to_string(),
            max_history: None,
        }
    }
}

impl CacheConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Set the uid property name.
    pub fn with_uid_field(mut self, name: impl Into<String>) -> Self {
        self.uid_field = name.into();
        self
    }

    /// Cap every thread at `max` nodes.
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = Some(max);
        self
    }

    /// The uid capability described by `uid_field`.
    pub fn field(&self) -> SdkResult<UidField> {
        Ok(UidField::new(self.uid_field.as_str())?)
    }

    /// Check that the settings can be applied.
    pub fn validate(&self) -> SdkResult<()> {
        self.field()?;
        if self.max_history == Some(0) {
            return Err(SdkError::Config("max_history must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = CacheConfig::default();
        assert_eq!(c.uid_field, "uid");
        assert!(c.max_history.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parse_toml() {
        let c = CacheConfig::from_toml_str("uid_field = \"id\"\nmax_history = 5\n").unwrap();
        assert_eq!(c, CacheConfig::default().with_uid_field("id").with_max_history(5));
        assert_eq!(c.field().unwrap().name(), "id");
    }

    #[test]
    fn missing_keys_use_defaults() {
        let c = CacheConfig::from_toml_str("").unwrap();
        assert_eq!(c, CacheConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let c = CacheConfig::default().with_max_history(3);
        let text = c.to_toml_string().unwrap();
        assert_eq!(CacheConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn reject_bad_values() {
        assert!(matches!(
            CacheConfig::from_toml_str("max_history = 0"),
            Err(SdkError::Config(_))
        ));
        assert!(matches!(
            CacheConfig::from_toml_str("uid_field = \"\""),
            Err(SdkError::Type(_))
        ));
        assert!(matches!(
            CacheConfig::from_toml_str("colour = \"red\""),
            Err(SdkError::Config(_))
        ));
    }
}
