//! Operator configuration
//!
//! Settings are read from a YAML file (`--config` / `HMC_CONFIG`); every
//! field is optional and falls back to the values the controller ships with.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{CoreError, Result};
use crate::{DEFAULT_CORE_CAPI_TEMPLATE, DEFAULT_CORE_HMC_TEMPLATE, DEFAULT_NAMESPACE};

/// Default Segment tracking endpoint
pub const DEFAULT_TELEMETRY_ENDPOINT: &str = "https://api.segment.io/v1/track";

/// Controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    /// Namespace where the controller and its dependencies run
    pub system_namespace: String,

    /// Namespace holding `Template` objects
    pub templates_namespace: String,

    /// Template used for the core service when a Management has no core
    pub default_core_template: String,

    /// Template used for cluster-api when a Management has no core
    pub default_orchestration_template: String,

    /// Interval the release controller re-reconciles each release at
    #[serde(with = "humantime_serde")]
    pub release_interval: Duration,

    /// Delay before a failed pass is retried
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Field manager used for server-side apply
    pub field_manager: String,

    pub telemetry: TelemetryConfig,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            system_namespace: DEFAULT_NAMESPACE.to_string(),
            templates_namespace: DEFAULT_NAMESPACE.to_string(),
            default_core_template: DEFAULT_CORE_HMC_TEMPLATE.to_string(),
            default_orchestration_template: DEFAULT_CORE_CAPI_TEMPLATE.to_string(),
            release_interval: Duration::from_secs(10 * 60),
            retry_interval: Duration::from_secs(30),
            field_manager: "hmc-controller".to_string(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Anonymous usage reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelemetryConfig {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_key: Option<String>,

    pub endpoint: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            write_key: None,
            endpoint: DEFAULT_TELEMETRY_ENDPOINT.to_string(),
        }
    }
}

impl OperatorConfig {
    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject settings the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("systemNamespace", &self.system_namespace),
            ("templatesNamespace", &self.templates_namespace),
            ("defaultCoreTemplate", &self.default_core_template),
            ("defaultOrchestrationTemplate", &self.default_orchestration_template),
            ("fieldManager", &self.field_manager),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(CoreError::InvalidConfig {
                message: format!("{} must not be empty", field),
            });
        }
        if self.retry_interval.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "retryInterval must be greater than zero".to_string(),
            });
        }
        if self.telemetry.enabled && self.telemetry.write_key.is_none() {
            return Err(CoreError::InvalidConfig {
                message: "telemetry.writeKey is required when telemetry is enabled".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = OperatorConfig::default();
        assert_eq!(config.templates_namespace, "hmc-system");
        assert_eq!(config.default_core_template, "hmc");
        assert_eq!(config.default_orchestration_template, "cluster-api");
        assert_eq!(config.release_interval, Duration::from_secs(600));
        assert!(!config.telemetry.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = OperatorConfig::from_yaml(
            "templatesNamespace: templates\nretryInterval: 1m 30s\n",
        )
        .unwrap();

        assert_eq!(config.templates_namespace, "templates");
        assert_eq!(config.retry_interval, Duration::from_secs(90));
        assert_eq!(config.system_namespace, "hmc-system");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            OperatorConfig::from_yaml("  \n").unwrap(),
            OperatorConfig::default()
        );
    }

    #[test]
    fn test_rejects_empty_namespace() {
        let err = OperatorConfig::from_yaml("systemNamespace: \"\"\n").unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"invalid operator configuration: systemNamespace must not be empty"
        );
    }

    #[test]
    fn test_rejects_telemetry_without_key() {
        let err = OperatorConfig::from_yaml("telemetry:\n  enabled: true\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = OperatorConfig::default();
        config.telemetry.enabled = true;
        config.telemetry.write_key = Some("key".to_string());

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("releaseInterval: 10m"));
        assert_eq!(OperatorConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fieldManager: custom").unwrap();

        let config = OperatorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.field_manager, "custom");
    }

    #[test]
    fn test_load_missing_file() {
        let err = OperatorConfig::load(Some(Path::new("/nonexistent/hmc.yaml"))).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
