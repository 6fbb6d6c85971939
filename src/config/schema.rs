//! Config schema and deserialization

use crate::engine_api::{ConfigObject, SeverityLevel};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::PathBuf;

/// Key injected into every engine config holding the config root
pub const CONFIG_ROOT_KEY: &str = "config_root";

/// Per-rule overrides. Unset fields keep the engine's values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleOverride {
    /// Severity as a level number (1-5) or name ("High")
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub severity: Option<SeverityLevel>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl RuleOverride {
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.tags.is_none()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeverityValue {
    Number(u8),
    Name(String),
}

fn deserialize_severity<'de, D>(deserializer: D) -> Result<Option<SeverityLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<SeverityValue> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(SeverityValue::Number(n)) => SeverityLevel::try_from(n)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(SeverityValue::Name(name)) => name
            .parse::<SeverityLevel>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Root config structure for code-analyzer.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Folder that relative paths (plugin modules, engine settings) resolve against.
    /// Defaults to the folder holding the config file.
    #[serde(default)]
    pub config_root: Option<PathBuf>,

    /// Rule overrides: engine name -> rule name -> override
    #[serde(default)]
    pub rules: HashMap<String, HashMap<String, RuleOverride>>,

    /// Free-form settings per engine name
    #[serde(default)]
    pub engines: HashMap<String, ConfigObject>,
}

impl Config {
    /// Config with no overrides, rooted at the current directory
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config_root(&self) -> PathBuf {
        match &self.config_root {
            Some(root) => crate::utils::to_absolute_path(root),
            None => std::env::current_dir().unwrap_or_default(),
        }
    }

    /// Settings for `engine_name`, with `config_root` filled in
    pub fn engine_config_for(&self, engine_name: &str) -> ConfigObject {
        let mut config = self.engines.get(engine_name).cloned().unwrap_or_default();
        if !config.contains_key(CONFIG_ROOT_KEY) {
            config.insert(
                CONFIG_ROOT_KEY.to_string(),
                serde_json::Value::String(self.config_root().to_string_lossy().into_owned()),
            );
        }
        config
    }

    pub fn rule_override_for(&self, engine_name: &str, rule_name: &str) -> RuleOverride {
        self.rules
            .get(engine_name)
            .and_then(|rules| rules.get(rule_name))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_override_by_number_or_name() {
        let config: Config = serde_json::from_str(
            r#"{
                "rules": {
                    "pmd": {
                        "ApexDoc": { "severity": 2 },
                        "ApexCRUDViolation": { "severity": "critical", "tags": ["Security"] }
                    }
                }
            }"#,
        )
        .unwrap();

        let o = config.rule_override_for("pmd", "ApexDoc");
        assert_eq!(o.severity, Some(SeverityLevel::High));
        assert_eq!(o.tags, None);

        let o = config.rule_override_for("pmd", "ApexCRUDViolation");
        assert_eq!(o.severity, Some(SeverityLevel::Critical));
        assert_eq!(o.tags, Some(vec!["Security".to_string()]));

        assert!(config.rule_override_for("pmd", "Other").is_empty());
        assert!(config.rule_override_for("eslint", "ApexDoc").is_empty());
    }

    #[test]
    fn test_invalid_severity_is_rejected() {
        let res: Result<Config, _> =
            serde_json::from_str(r#"{ "rules": { "pmd": { "ApexDoc": { "severity": 7 } } } }"#);
        assert!(res.is_err());
        let res: Result<Config, _> = serde_json::from_str(
            r#"{ "rules": { "pmd": { "ApexDoc": { "severity": "urgent" } } } }"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_engine_config_gets_config_root() {
        let config: Config = serde_json::from_str(
            r#"{
                "configRoot": "/opt/project",
                "engines": { "eslint": { "auto_discover_eslint_config": true } }
            }"#,
        )
        .unwrap();

        let eslint = config.engine_config_for("eslint");
        assert_eq!(eslint["auto_discover_eslint_config"], serde_json::json!(true));
        assert_eq!(eslint[CONFIG_ROOT_KEY], serde_json::json!("/opt/project"));

        let pmd = config.engine_config_for("pmd");
        assert_eq!(pmd.len(), 1);
        assert_eq!(pmd[CONFIG_ROOT_KEY], serde_json::json!("/opt/project"));
    }
}
