//! The set of files and folders under analysis

use crate::error::{AnalyzerError, Result};
use crate::utils::to_absolute_path;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Files and folders to analyze, identified by a unique id.
///
/// The id doubles as the rules-cache key, so two workspaces with the same
/// paths still discover rules independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    id: String,
    files_and_folders: Vec<PathBuf>,
}

impl Workspace {
    /// Build a workspace, making every entry absolute and checking that it exists.
    pub fn new<P: AsRef<Path>>(id: impl Into<String>, files_and_folders: &[P]) -> Result<Self> {
        let files_and_folders = files_and_folders
            .iter()
            .map(|p| validate_file_or_folder(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: id.into(),
            files_and_folders,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn files_and_folders(&self) -> &[PathBuf] {
        &self.files_and_folders
    }

    pub fn is_empty(&self) -> bool {
        self.files_and_folders.is_empty()
    }

    /// Whether `file` is one of the entries or lives underneath a folder entry
    pub fn contains(&self, file: &Path) -> bool {
        self.files_and_folders
            .iter()
            .any(|entry| entry == file || (entry.is_dir() && file.starts_with(entry)))
    }
}

/// Absolute form of `path`, or an error if nothing exists there
pub(crate) fn validate_file_or_folder(path: &Path) -> Result<PathBuf> {
    let abs = to_absolute_path(path);
    if !abs.exists() {
        return Err(AnalyzerError::FileOrFolderDoesNotExist(abs));
    }
    Ok(abs)
}
