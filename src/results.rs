//! Normalized run results

use crate::engine_api;
use crate::rules::{Rule, RuleSelection, SeverityLevel};
use crate::utils::to_absolute_path;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A validated code location. File paths are absolute; lines and columns 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeLocation {
    pub file: PathBuf,
    pub start_line: usize,
    pub start_column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl From<&engine_api::CodeLocation> for CodeLocation {
    fn from(loc: &engine_api::CodeLocation) -> Self {
        Self {
            file: to_absolute_path(&loc.file),
            start_line: loc.start_line,
            start_column: loc.start_column,
            end_line: loc.end_line,
            end_column: loc.end_line.and(loc.end_column),
        }
    }
}

/// One reported instance of a rule being broken
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule: Arc<Rule>,
    pub message: String,
    pub code_locations: Vec<CodeLocation>,
    pub primary_location_index: usize,
    pub resource_urls: Vec<String>,
}

impl Violation {
    pub(crate) fn new(rule: Arc<Rule>, violation: &engine_api::Violation) -> Self {
        let mut resource_urls: Vec<String> = rule.resource_urls().to_vec();
        for url in &violation.resource_urls {
            if !resource_urls.contains(url) {
                resource_urls.push(url.clone());
            }
        }
        Self {
            rule,
            message: violation.message.clone(),
            code_locations: violation.code_locations.iter().map(Into::into).collect(),
            primary_location_index: violation.primary_location_index,
            resource_urls,
        }
    }

    pub fn primary_location(&self) -> Option<&CodeLocation> {
        self.code_locations.get(self.primary_location_index)
    }

    pub fn severity_level(&self) -> SeverityLevel {
        self.rule.severity_level()
    }
}

/// Outcome of running one engine
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EngineRunResults {
    #[serde(rename_all = "camelCase")]
    Completed {
        engine_name: String,
        violations: Vec<Violation>,
    },
    /// The engine failed; no violations are available from it
    #[serde(rename_all = "camelCase")]
    UnexpectedError {
        engine_name: String,
        error_message: String,
        #[serde(skip)]
        cause: Option<Arc<anyhow::Error>>,
    },
}

impl EngineRunResults {
    /// Normalize engine output. Violations must already have been validated
    /// against `selection`; unknown rules are skipped here.
    pub(crate) fn completed(
        engine_name: &str,
        results: &engine_api::EngineRunResults,
        selection: &RuleSelection,
    ) -> Self {
        let violations = results
            .violations
            .iter()
            .filter_map(|v| {
                selection
                    .rule(engine_name, &v.rule_name)
                    .ok()
                    .map(|rule| Violation::new(Arc::clone(rule), v))
            })
            .collect();
        EngineRunResults::Completed {
            engine_name: engine_name.to_string(),
            violations,
        }
    }

    pub(crate) fn unexpected_error(engine_name: &str, error: anyhow::Error) -> Self {
        EngineRunResults::UnexpectedError {
            engine_name: engine_name.to_string(),
            error_message: format!("{:#}", error),
            cause: Some(Arc::new(error)),
        }
    }

    pub fn engine_name(&self) -> &str {
        match self {
            EngineRunResults::Completed { engine_name, .. }
            | EngineRunResults::UnexpectedError { engine_name, .. } => engine_name,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            EngineRunResults::Completed { violations, .. } => violations,
            EngineRunResults::UnexpectedError { .. } => &[],
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations().len()
    }

    pub fn violation_count_of_severity(&self, level: SeverityLevel) -> usize {
        self.violations()
            .iter()
            .filter(|v| v.severity_level() == level)
            .count()
    }

    pub fn is_unexpected_error(&self) -> bool {
        matches!(self, EngineRunResults::UnexpectedError { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            EngineRunResults::UnexpectedError { error_message, .. } => Some(error_message),
            EngineRunResults::Completed { .. } => None,
        }
    }
}

/// Results of every engine invoked by one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResults {
    engines: BTreeMap<String, Arc<EngineRunResults>>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_engine_run_results(&mut self, results: Arc<EngineRunResults>) {
        self.engines.insert(results.engine_name().to_string(), results);
    }

    /// Engines that were invoked, sorted by name
    pub fn engine_names(&self) -> Vec<String> {
        self.engines.keys().cloned().collect()
    }

    pub fn engine_run_results(&self, engine_name: &str) -> Option<&EngineRunResults> {
        self.engines.get(engine_name).map(Arc::as_ref)
    }

    /// All violations across engines, grouped by engine name
    pub fn violations(&self) -> Vec<&Violation> {
        self.engines
            .values()
            .flat_map(|r| r.violations().iter())
            .collect()
    }

    pub fn violation_count(&self) -> usize {
        self.engines.values().map(|r| r.violation_count()).sum()
    }

    pub fn violation_count_of_severity(&self, level: SeverityLevel) -> usize {
        self.engines
            .values()
            .map(|r| r.violation_count_of_severity(level))
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
