use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

/// Solidity source file selected for mutation.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as given on the command line or resolved from a config file.
    pub path: PathBuf,

    /// The path's normal components only (no root, `.` or `..`), used to lay out outputs.
    pub normalized: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let normalized = normal_components(&path);
        Self { path, normalized }
    }

    /// Absolute or working-directory-relative path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without the `.sol` extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mutant".to_string())
    }

    /// Directory for this file's mutants: `<mutants_root>/<normalized parent dir>`.
    pub fn mutant_dir(&self, mutants_root: &Path) -> PathBuf {
        match self.normalized.parent() {
            Some(parent) => mutants_root.join(parent),
            None => mutants_root.to_path_buf(),
        }
    }

    /// Load the full file contents as UTF-8 text.
    pub fn read_to_string(&self) -> Result<String> {
        fs::read_to_string(&self.path).with_context(|| format!("failed to read {:?}", self.path))
    }
}

/// Keep only the `Normal` components of `path`.
pub fn normal_components(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_components_drop_root_and_dots() {
        assert_eq!(
            normal_components(Path::new("../../contracts/./token/T.sol")),
            PathBuf::from("contracts/token/T.sol")
        );
        assert_eq!(
            normal_components(Path::new("/abs/C.sol")),
            PathBuf::from("abs/C.sol")
        );
        assert_eq!(normal_components(Path::new("")), PathBuf::new());
    }

    #[test]
    fn mutant_dir_mirrors_the_source_layout() {
        let src = SourceFile::new("../contracts/Token.sol");
        assert_eq!(src.stem(), "Token");
        assert_eq!(
            src.mutant_dir(Path::new("out/mutants")),
            PathBuf::from("out/mutants/contracts")
        );

        let flat = SourceFile::new("Token.sol");
        assert_eq!(flat.mutant_dir(Path::new("m")), PathBuf::from("m"));
    }

    #[test]
    fn read_missing_file_has_context() {
        let err = SourceFile::new("no/such/File.sol").read_to_string().unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
