//! Platform configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use edu_types::{Address, FundParams};
use edu_utils::LogFormat;

use crate::PlatformError;

/// Configuration for an [`EducationPlatform`](crate::EducationPlatform).
///
/// Can be loaded from a TOML file via [`PlatformConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// The administrator address at deployment. Required.
    pub admin: Address,

    /// Reward and donation parameters.
    #[serde(default)]
    pub params: FundParams,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PlatformConfig {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            params: FundParams::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }

    pub fn with_params(mut self, params: FundParams) -> Self {
        self.params = params;
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PlatformError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PlatformError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, PlatformError> {
        let config: Self = toml::from_str(s).map_err(|e| PlatformError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, PlatformError> {
        toml::to_string_pretty(self).map_err(|e| PlatformError::Config(e.to_string()))
    }

    /// Reject values the platform cannot operate with.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if !self.admin.is_valid() {
            return Err(PlatformError::InvalidAddress(self.admin.to_string()));
        }
        if self.params.reward_slots == 0 {
            return Err(PlatformError::Config("params.reward_slots must be at least 1".into()));
        }
        if self.params.min_donation == 0 {
            return Err(PlatformError::Config("params.min_donation must be at least 1".into()));
        }
        Ok(())
    }

    /// Install the global log subscriber described by this config.
    /// Returns `false` if one was already installed.
    pub fn init_logging(&self) -> bool {
        edu_utils::init_logging(self.log_format, &self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = PlatformConfig::from_toml_str(r#"admin = "deployer""#).unwrap();
        assert_eq!(config.admin, Address::new("deployer"));
        assert_eq!(config.params, FundParams::default());
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            admin = "deployer"
            log_format = "json"
            log_level = "debug"

            [params]
            reward_slots = 4
            min_donation = 1000
        "#;
        let config = PlatformConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.params.reward_slots, 4);
        assert_eq!(config.params.min_donation, 1000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_admin_is_rejected() {
        let err = PlatformConfig::from_toml_str("log_level = \"info\"").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn test_zero_reward_slots_is_rejected() {
        let toml = "admin = \"deployer\"\n[params]\nreward_slots = 0\n";
        let err = PlatformConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn test_zero_min_donation_is_rejected() {
        let toml = "admin = \"deployer\"\n[params]\nmin_donation = 0\n";
        assert!(PlatformConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_empty_admin_is_rejected() {
        let err = PlatformConfig::from_toml_str(r#"admin = """#).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidAddress(_)));
    }

    #[test]
    fn test_toml_string_roundtrip() {
        let config = PlatformConfig::new(Address::new("deployer"))
            .with_params(FundParams::default().with_reward_slots(3));
        let text = config.to_toml_string().unwrap();
        assert_eq!(PlatformConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin = \"deployer\"").unwrap();
        writeln!(file, "[params]").unwrap();
        writeln!(file, "reward_slots = 1").unwrap();

        let config = PlatformConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.params.reward_slots, 1);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PlatformConfig::from_toml_file("/nonexistent/edu.toml").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }
}
