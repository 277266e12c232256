//! JSON configuration files for `sol-mutant mutate --config`.
//!
//! A config file holds either one object or an array of objects. Every
//! object describes one source file to mutate; field names match the CLI
//! flags in snake_case. Relative paths are resolved against the directory
//! of the config file, not the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One entry of a config file. Absent fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub filename: Option<PathBuf>,
    pub ast: Option<PathBuf>,
    pub num_mutants: Option<usize>,
    pub seed: Option<String>,
    pub outdir: Option<PathBuf>,
    pub solc: Option<String>,
    pub functions: Option<Vec<String>>,
    pub contract: Option<String>,
    pub mutations: Option<Vec<String>>,
    pub validate: Option<bool>,
    pub solc_basepath: Option<PathBuf>,
    pub solc_allowpaths: Option<Vec<PathBuf>>,
    pub solc_remappings: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConfigFile {
    Many(Vec<FileConfig>),
    One(FileConfig),
}

impl FileConfig {
    /// Make every relative path in this entry relative to `base` instead.
    fn resolve_paths(mut self, base: &Path) -> Self {
        let rebase = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

        self.filename = self.filename.map(rebase);
        self.ast = self.ast.map(rebase);
        self.outdir = self.outdir.map(rebase);
        self.solc_basepath = self.solc_basepath.map(rebase);
        self.solc_allowpaths = self
            .solc_allowpaths
            .map(|paths| paths.into_iter().map(rebase).collect());
        self
    }
}

/// Parse config text. Paths are left as written.
pub fn parse_config(text: &str) -> Result<Vec<FileConfig>> {
    let parsed: ConfigFile = serde_json::from_str(text).context("invalid config JSON")?;
    let entries = match parsed {
        ConfigFile::Many(entries) => entries,
        ConfigFile::One(entry) => vec![entry],
    };

    if entries.is_empty() {
        anyhow::bail!("config contains no entries");
    }
    Ok(entries)
}

/// Read a config file and resolve its relative paths.
pub fn load_config(path: &Path) -> Result<Vec<FileConfig>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read config {:?}", path))?;
    let entries = parse_config(&text).with_context(|| format!("in config {:?}", path))?;

    let base = path.parent().unwrap_or(Path::new(""));
    Ok(entries.into_iter().map(|e| e.resolve_paths(base)).collect())
}
