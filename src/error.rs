//! Errors surfaced to callers of the analyzer.
//!
//! Each variant's message template is the user-visible text for that
//! failure; engine, rule and value names are always interpolated.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("The file or folder '{}' does not exist.", .0.display())]
    FileOrFolderDoesNotExist(PathBuf),

    #[error("Invalid run options: at least one file or folder must be included.")]
    AtLeastOneFileOrFolderMustBeIncluded,

    #[error("The path start point '{0}' is invalid. Expected '<file>' or '<file>#<method1>;<method2>;...' where each method name matches ^[A-Za-z][A-Za-z0-9_]*$.")]
    InvalidPathStartPoint(String),

    #[error("The path start point '{start_point}' references the file '{}' which does not exist.", file.display())]
    PathStartPointFileDoesNotExist { start_point: String, file: PathBuf },

    #[error("The path start point '{start_point}' lists methods, so '{}' must be a file and not a folder.", file.display())]
    PathStartPointWithMethodMustNotBeFolder { start_point: String, file: PathBuf },

    #[error("The path start point file '{}' must be inside the workspace: {workspace}", file.display())]
    PathStartPointMustBeInsideWorkspace { file: PathBuf, workspace: String },

    #[error("Failed to get the available engine names from an engine plugin: {source}")]
    PluginErrorFromGetAvailableEngineNames {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to gather rules from engine '{engine}': {source}")]
    EngineFailedToDescribeRules {
        engine: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Engine '{engine}' returned more than one rule with the name '{rule}'.")]
    EngineReturnedMultipleRulesWithSameName { engine: String, rule: String },

    #[error("No rule '{rule}' for engine '{engine}' exists in the rule selection.")]
    RuleNotInSelection { engine: String, rule: String },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' which was not selected.")]
    EngineReturnedViolationForUnselectedRule {
        engine: String,
        rule: String,
        #[source]
        source: Box<AnalyzerError>,
    },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' with primary location index {index}, but it must be an integer from 0 to {} since the violation has {count} code location(s).", .count.saturating_sub(1))]
    EngineReturnedViolationWithInvalidPrimaryLocationIndex {
        engine: String,
        rule: String,
        index: usize,
        count: usize,
    },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' with a code location file '{}' that does not exist.", file.display())]
    EngineReturnedViolationWithCodeLocationFileThatDoesNotExist {
        engine: String,
        rule: String,
        file: PathBuf,
    },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' with a code location file '{}' that is a folder instead of a file.", file.display())]
    EngineReturnedViolationWithCodeLocationFileAsFolder {
        engine: String,
        rule: String,
        file: PathBuf,
    },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' with an invalid '{field}' value of {value}. It must be a positive integer.")]
    EngineReturnedViolationWithCodeLocationWithInvalidLineOrColumn {
        engine: String,
        rule: String,
        field: &'static str,
        value: usize,
    },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' with a code location whose endLine {end_line} is before its startLine {start_line}.")]
    EngineReturnedViolationWithCodeLocationWithEndLineBeforeStartLine {
        engine: String,
        rule: String,
        end_line: usize,
        start_line: usize,
    },

    #[error("Engine '{engine}' returned a violation for rule '{rule}' with a code location whose endColumn {end_column} is before its startColumn {start_column} on the same line.")]
    EngineReturnedViolationWithCodeLocationWithEndColumnBeforeStartColumnOnSameLine {
        engine: String,
        rule: String,
        end_column: usize,
        start_column: usize,
    },

    #[error("Failed to dynamically load module '{module}': {reason}")]
    FailedToDynamicallyLoadModule { module: String, reason: String },

    #[error("Failed to dynamically add engine plugin from module '{module}' because it does not export a 'create_engine_plugin' factory.")]
    FailedToDynamicallyAddEnginePlugin { module: String },
}
