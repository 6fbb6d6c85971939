//! Parsing of path start points: `<file>` or `<file>#<method1>;<method2>;...`

use crate::engine_api::PathPoint;
use crate::error::{AnalyzerError, Result};
use crate::utils::to_absolute_path;
use crate::workspace::{validate_file_or_folder, Workspace};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn valid_method_name() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("method name pattern is a valid regex")
    })
}

/// Expand one start point string into engine path points
pub(crate) fn parse_path_start_point(start_point: &str) -> Result<Vec<PathPoint>> {
    let parts: Vec<&str> = start_point.split('#').collect();
    match parts.as_slice() {
        [file] => Ok(vec![PathPoint::file(validate_file_or_folder(Path::new(file))?)]),
        [file, methods] => {
            let file = validate_start_point_file(file, start_point)?;
            methods
                .trim_end_matches(|c: char| c.is_whitespace() || c == ';')
                .split(';')
                .map(|method| {
                    if valid_method_name().is_match(method) {
                        Ok(PathPoint::method(file.clone(), method))
                    } else {
                        Err(AnalyzerError::InvalidPathStartPoint(start_point.to_string()))
                    }
                })
                .collect()
        }
        _ => Err(AnalyzerError::InvalidPathStartPoint(start_point.to_string())),
    }
}

/// A start point that names methods must refer to an existing regular file
fn validate_start_point_file(file: &str, start_point: &str) -> Result<PathBuf> {
    let abs = to_absolute_path(Path::new(file));
    if !abs.exists() {
        return Err(AnalyzerError::PathStartPointFileDoesNotExist {
            start_point: start_point.to_string(),
            file: abs,
        });
    }
    if abs.is_dir() {
        return Err(AnalyzerError::PathStartPointWithMethodMustNotBeFolder {
            start_point: start_point.to_string(),
            file: abs,
        });
    }
    Ok(abs)
}

pub(crate) fn validate_path_start_points_are_inside_workspace(
    points: &[PathPoint],
    workspace: &Workspace,
) -> Result<()> {
    for point in points {
        if !workspace.contains(&point.file) {
            let entries: Vec<String> = workspace
                .files_and_folders()
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            return Err(AnalyzerError::PathStartPointMustBeInsideWorkspace {
                file: point.file.clone(),
                workspace: serde_json::to_string(&entries).unwrap_or_default(),
            });
        }
    }
    Ok(())
}
