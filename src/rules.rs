//! Rules, selector matching and rule selections

use crate::engine_api;
use crate::error::{AnalyzerError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Tag selected when the caller passes no selectors
pub const DEFAULT_SELECTOR: &str = "Recommended";

/// Severity of a rule (1 = most severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum SeverityLevel {
    Critical = 1,
    High = 2,
    Moderate = 3,
    Low = 4,
    Info = 5,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Critical,
        SeverityLevel::High,
        SeverityLevel::Moderate,
        SeverityLevel::Low,
        SeverityLevel::Info,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }
}

impl From<SeverityLevel> for u8 {
    fn from(level: SeverityLevel) -> Self {
        level.value()
    }
}

impl From<engine_api::SeverityLevel> for SeverityLevel {
    fn from(level: engine_api::SeverityLevel) -> Self {
        match level {
            engine_api::SeverityLevel::Critical => SeverityLevel::Critical,
            engine_api::SeverityLevel::High => SeverityLevel::High,
            engine_api::SeverityLevel::Moderate => SeverityLevel::Moderate,
            engine_api::SeverityLevel::Low => SeverityLevel::Low,
            engine_api::SeverityLevel::Info => SeverityLevel::Info,
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityLevel::Critical => write!(f, "Critical"),
            SeverityLevel::High => write!(f, "High"),
            SeverityLevel::Moderate => write!(f, "Moderate"),
            SeverityLevel::Low => write!(f, "Low"),
            SeverityLevel::Info => write!(f, "Info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleType {
    Standard,
    DataFlow,
    Flow,
    PathBased,
    /// Placeholder type for results standing in for an engine failure
    UnexpectedError,
}

impl From<engine_api::RuleType> for RuleType {
    fn from(rule_type: engine_api::RuleType) -> Self {
        match rule_type {
            engine_api::RuleType::Standard => RuleType::Standard,
            engine_api::RuleType::DataFlow => RuleType::DataFlow,
            engine_api::RuleType::Flow => RuleType::Flow,
            engine_api::RuleType::PathBased => RuleType::PathBased,
        }
    }
}

/// One checkable condition offered by one engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    name: String,
    engine_name: String,
    severity_level: SeverityLevel,
    #[serde(rename = "type")]
    rule_type: RuleType,
    tags: Vec<String>,
    description: String,
    resource_urls: Vec<String>,
}

impl Rule {
    pub fn new(engine_name: impl Into<String>, description: engine_api::RuleDescription) -> Self {
        Self {
            name: description.name,
            engine_name: engine_name.into(),
            severity_level: description.severity_level.into(),
            rule_type: description.rule_type.into(),
            tags: description.tags,
            description: description.description,
            resource_urls: description.resource_urls,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn severity_level(&self) -> SeverityLevel {
        self.severity_level
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn resource_urls(&self) -> &[String] {
        &self.resource_urls
    }

    /// Whether every `:`-separated part of `selector` matches this rule.
    ///
    /// A part matches on `all`, the engine name, the rule name, any tag,
    /// or the numeric severity level.
    pub fn matches_selector(&self, selector: &str) -> bool {
        selector.split(':').all(|part| self.matches_selector_part(part))
    }

    fn matches_selector_part(&self, part: &str) -> bool {
        part == "all"
            || part == self.engine_name
            || part == self.name
            || self.tags.iter().any(|t| t == part)
            || part == self.severity_level.value().to_string()
    }
}

/// Rules chosen for a run, partitioned by engine
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleSelection {
    rules_by_engine: BTreeMap<String, Vec<Arc<Rule>>>,
}

impl RuleSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection of every rule matching at least one selector.
    ///
    /// An empty selector list means `["Recommended"]`.
    pub fn from_selectors<S: AsRef<str>>(rules: &[Arc<Rule>], selectors: &[S]) -> Self {
        let selectors: Vec<&str> = if selectors.is_empty() {
            vec![DEFAULT_SELECTOR]
        } else {
            selectors.iter().map(|s| s.as_ref()).collect()
        };

        let mut selection = Self::new();
        for rule in rules {
            if selectors.iter().any(|s| rule.matches_selector(s)) {
                selection.add_rule(Arc::clone(rule));
            }
        }
        selection
    }

    /// Add a rule unless one with the same engine and name is already present
    pub(crate) fn add_rule(&mut self, rule: Arc<Rule>) {
        let rules = self
            .rules_by_engine
            .entry(rule.engine_name().to_string())
            .or_default();
        if !rules.iter().any(|r| r.name() == rule.name()) {
            rules.push(rule);
        }
    }

    pub fn count(&self) -> usize {
        self.rules_by_engine.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Engines with at least one selected rule, sorted by name
    pub fn engine_names(&self) -> Vec<String> {
        self.rules_by_engine.keys().cloned().collect()
    }

    pub fn rules_for(&self, engine_name: &str) -> &[Arc<Rule>] {
        self.rules_by_engine
            .get(engine_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rule(&self, engine_name: &str, rule_name: &str) -> Result<&Arc<Rule>> {
        self.rules_for(engine_name)
            .iter()
            .find(|r| r.name() == rule_name)
            .ok_or_else(|| AnalyzerError::RuleNotInSelection {
                engine: engine_name.to_string(),
                rule: rule_name.to_string(),
            })
    }
}
