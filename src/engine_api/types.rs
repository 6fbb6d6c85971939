//! Data exchanged between the analyzer and engines

use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity as declared by an engine (1 = most severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SeverityLevel {
    Critical = 1,
    High = 2,
    Moderate = 3,
    Low = 4,
    Info = 5,
}

impl TryFrom<u8> for SeverityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SeverityLevel::Critical),
            2 => Ok(SeverityLevel::High),
            3 => Ok(SeverityLevel::Moderate),
            4 => Ok(SeverityLevel::Low),
            5 => Ok(SeverityLevel::Info),
            other => Err(format!("invalid severity level {}, expected 1-5", other)),
        }
    }
}

impl From<SeverityLevel> for u8 {
    fn from(level: SeverityLevel) -> Self {
        level as u8
    }
}

impl std::str::FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" | "1" => Ok(SeverityLevel::Critical),
            "high" | "2" => Ok(SeverityLevel::High),
            "moderate" | "3" => Ok(SeverityLevel::Moderate),
            "low" | "4" => Ok(SeverityLevel::Low),
            "info" | "5" => Ok(SeverityLevel::Info),
            _ => Err(format!("invalid severity level '{}'", s)),
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Kind of rule as declared by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RuleType {
    #[default]
    Standard,
    DataFlow,
    Flow,
    PathBased,
}

/// Metadata for one rule offered by an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDescription {
    pub name: String,
    pub severity_level: SeverityLevel,
    #[serde(rename = "type", default)]
    pub rule_type: RuleType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_urls: Vec<String>,
}

/// Options passed to `Engine::describe_rules`
#[derive(Debug, Clone, Default)]
pub struct DescribeOptions {
    pub workspace: Option<Workspace>,
}

/// A file (optionally narrowed to one method) where path-based analysis starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
}

impl PathPoint {
    pub fn file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            method_name: None,
        }
    }

    pub fn method(file: impl Into<PathBuf>, method_name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            method_name: Some(method_name.into()),
        }
    }
}

/// Options passed to `Engine::run_rules`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    pub workspace: Workspace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_start_points: Option<Vec<PathPoint>>,
}

/// A location as reported by an engine. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeLocation {
    pub file: PathBuf,
    pub start_line: usize,
    pub start_column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

/// A violation as reported by an engine, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_name: String,
    pub message: String,
    pub code_locations: Vec<CodeLocation>,
    pub primary_location_index: usize,
    #[serde(default)]
    pub resource_urls: Vec<String>,
}

/// What an engine returns from `run_rules`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRunResults {
    pub violations: Vec<Violation>,
}
