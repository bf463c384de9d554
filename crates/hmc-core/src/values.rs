//! Typed view over the core component configuration
//!
//! The core component's `config` is an opaque JSON document handed to the
//! release. The controller only ever needs one field of it, the admission
//! webhook switch, so that field is typed and everything else is carried
//! through untouched in flattened maps.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Configuration of the HMC core service release
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreValues {
    #[serde(default, deserialize_with = "null_as_default")]
    pub admission_webhook: AdmissionWebhookValues,

    /// Every other key, preserved as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `admissionWebhook` section of the core values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionWebhookValues {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An explicit `null` (an empty YAML section) reads as the default
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl CoreValues {
    /// Parse a component config; a missing or `null` config yields the defaults
    pub fn from_config(config: Option<&Value>) -> Result<Self> {
        match config {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value @ Value::Object(_)) => {
                serde_json::from_value(value.clone()).map_err(|e| CoreError::InvalidValues {
                    message: format!("core service config: {}", e),
                })
            }
            Some(other) => Err(CoreError::InvalidValues {
                message: format!("core service config must be an object, got {}", other),
            }),
        }
    }

    /// Turn the admission webhook on; never turns it off
    pub fn enable_admission_webhook(mut self) -> Self {
        self.admission_webhook.enabled = true;
        self
    }

    /// Serialize back into a component config
    pub fn to_config(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_config_is_default() {
        assert_eq!(CoreValues::from_config(None).unwrap(), CoreValues::default());
        assert_eq!(
            CoreValues::from_config(Some(&Value::Null)).unwrap(),
            CoreValues::default()
        );
    }

    #[test]
    fn test_enable_preserves_unknown_keys() {
        let config = json!({
            "controller": {"replicas": 2},
            "admissionWebhook": {"port": 9443}
        });

        let values = CoreValues::from_config(Some(&config))
            .unwrap()
            .enable_admission_webhook();

        assert_eq!(
            values.to_config().unwrap(),
            json!({
                "controller": {"replicas": 2},
                "admissionWebhook": {"enabled": true, "port": 9443}
            })
        );
    }

    #[test]
    fn test_enable_adds_section_when_missing() {
        let values = CoreValues::from_config(Some(&json!({})))
            .unwrap()
            .enable_admission_webhook();

        assert_eq!(
            values.to_config().unwrap(),
            json!({"admissionWebhook": {"enabled": true}})
        );
    }

    #[test]
    fn test_null_webhook_section_is_default() {
        let config = json!({"admissionWebhook": null, "controller": {"replicas": 1}});

        let values = CoreValues::from_config(Some(&config)).unwrap();
        assert_eq!(values.admission_webhook, AdmissionWebhookValues::default());

        assert_eq!(
            values.enable_admission_webhook().to_config().unwrap(),
            json!({
                "controller": {"replicas": 1},
                "admissionWebhook": {"enabled": true}
            })
        );
    }

    #[test]
    fn test_null_enabled_flag_is_off() {
        let config = json!({"admissionWebhook": {"enabled": null, "port": 9443}});
        let values = CoreValues::from_config(Some(&config)).unwrap();
        assert!(!values.admission_webhook.enabled);
        assert_eq!(values.admission_webhook.extra["port"], json!(9443));
    }

    #[test]
    fn test_enable_never_disables() {
        let config = json!({"admissionWebhook": {"enabled": true}});
        let values = CoreValues::from_config(Some(&config)).unwrap();
        assert!(values.admission_webhook.enabled);
        assert!(values.enable_admission_webhook().admission_webhook.enabled);
    }

    #[test]
    fn test_rejects_non_object_config() {
        let err = CoreValues::from_config(Some(&json!(["a"]))).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @r#"invalid component configuration: core service config must be an object, got ["a"]"#
        );
    }

    #[test]
    fn test_rejects_mistyped_webhook_section() {
        let config = json!({"admissionWebhook": true});
        let err = CoreValues::from_config(Some(&config)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidValues { .. }));
    }
}
