//! Checks applied to everything an engine hands back.
//!
//! A conforming engine never trips these, so every failure is fatal.

use crate::engine_api::{CodeLocation, EngineRunResults, RuleDescription, Violation};
use crate::error::{AnalyzerError, Result};
use crate::rules::RuleSelection;
use crate::utils::to_absolute_path;
use std::collections::HashSet;

pub(crate) fn validate_rule_descriptions(
    engine_name: &str,
    descriptions: &[RuleDescription],
) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for description in descriptions {
        if !seen.insert(description.name.as_str()) {
            return Err(AnalyzerError::EngineReturnedMultipleRulesWithSameName {
                engine: engine_name.to_string(),
                rule: description.name.clone(),
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_engine_run_results(
    engine_name: &str,
    results: &EngineRunResults,
    selection: &RuleSelection,
) -> Result<()> {
    for violation in &results.violations {
        validate_violation_rule_name(engine_name, violation, selection)?;
        validate_violation_primary_location_index(engine_name, violation)?;
        validate_violation_code_locations(engine_name, violation)?;
    }
    Ok(())
}

fn validate_violation_rule_name(
    engine_name: &str,
    violation: &Violation,
    selection: &RuleSelection,
) -> Result<()> {
    selection
        .rule(engine_name, &violation.rule_name)
        .map(|_| ())
        .map_err(|source| AnalyzerError::EngineReturnedViolationForUnselectedRule {
            engine: engine_name.to_string(),
            rule: violation.rule_name.clone(),
            source: Box::new(source),
        })
}

fn validate_violation_primary_location_index(engine_name: &str, violation: &Violation) -> Result<()> {
    if violation.primary_location_index >= violation.code_locations.len() {
        return Err(
            AnalyzerError::EngineReturnedViolationWithInvalidPrimaryLocationIndex {
                engine: engine_name.to_string(),
                rule: violation.rule_name.clone(),
                index: violation.primary_location_index,
                count: violation.code_locations.len(),
            },
        );
    }
    Ok(())
}

fn validate_violation_code_locations(engine_name: &str, violation: &Violation) -> Result<()> {
    for location in &violation.code_locations {
        validate_code_location(engine_name, &violation.rule_name, location)?;
    }
    Ok(())
}

fn validate_code_location(engine_name: &str, rule_name: &str, location: &CodeLocation) -> Result<()> {
    let file = to_absolute_path(&location.file);
    if !file.exists() {
        return Err(
            AnalyzerError::EngineReturnedViolationWithCodeLocationFileThatDoesNotExist {
                engine: engine_name.to_string(),
                rule: rule_name.to_string(),
                file,
            },
        );
    }
    if !file.is_file() {
        return Err(AnalyzerError::EngineReturnedViolationWithCodeLocationFileAsFolder {
            engine: engine_name.to_string(),
            rule: rule_name.to_string(),
            file,
        });
    }

    let invalid = |field: &'static str, value: usize| {
        AnalyzerError::EngineReturnedViolationWithCodeLocationWithInvalidLineOrColumn {
            engine: engine_name.to_string(),
            rule: rule_name.to_string(),
            field,
            value,
        }
    };

    if location.start_line == 0 {
        return Err(invalid("startLine", location.start_line));
    }
    if location.start_column == 0 {
        return Err(invalid("startColumn", location.start_column));
    }

    // endColumn only means something alongside endLine
    let Some(end_line) = location.end_line else {
        return Ok(());
    };
    if end_line == 0 {
        return Err(invalid("endLine", end_line));
    }
    if end_line < location.start_line {
        return Err(
            AnalyzerError::EngineReturnedViolationWithCodeLocationWithEndLineBeforeStartLine {
                engine: engine_name.to_string(),
                rule: rule_name.to_string(),
                end_line,
                start_line: location.start_line,
            },
        );
    }

    if let Some(end_column) = location.end_column {
        if end_column == 0 {
            return Err(invalid("endColumn", end_column));
        }
        if end_line == location.start_line && end_column < location.start_column {
            return Err(AnalyzerError::EngineReturnedViolationWithCodeLocationWithEndColumnBeforeStartColumnOnSameLine {
                engine: engine_name.to_string(),
                rule: rule_name.to_string(),
                end_column,
                start_column: location.start_column,
            });
        }
    }
    Ok(())
}
