use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mutant::Mutant;
use crate::sampler::SamplingStats;

/// Summary counts for a whole `mutate` run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Source files processed, including failed ones.
    pub files: usize,

    /// Source files aborted by an error.
    pub failed_files: usize,

    /// Candidates generated across all files.
    pub attempts: usize,

    /// Mutants kept.
    pub accepted: usize,

    /// Candidates dropped as repeats.
    pub duplicates: usize,

    /// Candidates rejected by the compiler.
    pub invalid: usize,
}

impl RunSummary {
    pub fn from_files(files: &[FileReport]) -> Self {
        files.iter().fold(Self::default(), |mut acc, f| {
            acc.files += 1;
            if f.error.is_some() {
                acc.failed_files += 1;
            }
            acc.attempts += f.stats.attempts;
            acc.accepted += f.stats.accepted;
            acc.duplicates += f.stats.duplicates;
            acc.invalid += f.stats.invalid;
            acc
        })
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: PathBuf,

    /// Mutants requested for this file.
    pub requested: usize,

    #[serde(flatten)]
    pub stats: SamplingStats,

    /// Why the file was aborted, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Machine-readable report of a `mutate` run.
///
/// Written to `<outdir>/results.json`; in `--json` mode also printed to stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRunReport {
    /// Tool name, stable across versions.
    pub tool: String,

    /// Crate version that produced the report.
    pub version: String,

    /// Seed string of the run.
    pub seed: String,

    pub outdir: PathBuf,

    /// `solc --version`, when the compiler could be queried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    pub summary: RunSummary,

    pub files: Vec<FileReport>,

    /// Accepted mutants in id order.
    pub mutants: Vec<Mutant>,

    /// Optional high-level error message (for example an unusable output directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationRunReport {
    pub fn success(
        seed: String,
        outdir: PathBuf,
        compiler: Option<String>,
        files: Vec<FileReport>,
        mutants: Vec<Mutant>,
    ) -> Self {
        Self {
            tool: "sol-mutant".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            seed,
            outdir,
            compiler,
            summary: RunSummary::from_files(&files),
            files,
            mutants,
            error: None,
        }
    }

    pub fn failure(seed: String, outdir: PathBuf, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::success(seed, outdir, None, Vec::new(), Vec::new())
        }
    }

    /// Did any file fail, or the run as a whole?
    pub fn has_errors(&self) -> bool {
        self.error.is_some() || self.files.iter().any(|f| f.error.is_some())
    }
}
