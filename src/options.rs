use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::FileConfig;
use crate::mutation::MutationType;
use crate::solc::Solc;

pub const DEFAULT_NUM_MUTANTS: usize = 5;
pub const DEFAULT_SEED: &str = "0";
pub const DEFAULT_OUTDIR: &str = "out";
pub const DEFAULT_SOLC: &str = "solc";

/// How one source file is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    /// Solidity file to mutate.
    pub file: PathBuf,

    /// Precompiled compact JSON AST. When absent, `solc` produces one.
    pub ast: Option<PathBuf>,

    /// Number of mutants to aim for.
    pub num_mutants: usize,

    /// Only mutate inside these functions.
    pub functions: Option<Vec<String>>,

    /// Only mutate inside this contract.
    pub contract: Option<String>,

    /// Enabled operators.
    pub mutations: Vec<MutationType>,

    /// Check every candidate with `solc` before accepting it.
    pub validate: bool,
}

/// Compiler settings shared by the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolcOptions {
    pub solc: String,
    pub basepath: Option<String>,
    pub allow_paths: Vec<String>,
    pub remappings: Vec<String>,
}

impl SolcOptions {
    pub fn compiler(&self) -> Solc {
        Solc::new(self.solc.clone())
            .with_basepath(self.basepath.clone())
            .with_allow_paths(self.allow_paths.clone())
            .with_remappings(self.remappings.clone())
    }
}

/// Fully resolved options of one `mutate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutateOptions {
    /// Where mutants and reports are written.
    pub outdir: PathBuf,

    /// Seed string for the run's random source.
    pub seed: String,

    pub solc: SolcOptions,

    /// Files to mutate, in processing order.
    pub jobs: Vec<FileJob>,
}

impl MutateOptions {
    /// Resolve config entries (from a file or from the command line) into run options.
    ///
    /// Run-wide settings (`seed`, `outdir` and the `solc` flags) come from the
    /// first entry. Later entries that disagree are reported and ignored.
    pub fn from_entries(entries: Vec<FileConfig>) -> Result<Self> {
        let Some(first) = entries.first() else {
            anyhow::bail!("nothing to mutate: no source files given");
        };

        let outdir = first
            .outdir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR));
        let seed = first
            .seed
            .clone()
            .unwrap_or_else(|| DEFAULT_SEED.to_string());
        let solc = SolcOptions {
            solc: first
                .solc
                .clone()
                .unwrap_or_else(|| DEFAULT_SOLC.to_string()),
            basepath: first
                .solc_basepath
                .as_ref()
                .map(|p| p.display().to_string()),
            allow_paths: first
                .solc_allowpaths
                .iter()
                .flatten()
                .map(|p| p.display().to_string())
                .collect(),
            remappings: first.solc_remappings.clone().unwrap_or_default(),
        };

        for (i, entry) in entries.iter().enumerate().skip(1) {
            warn_if_differs(i, "seed", &entry.seed, &first.seed);
            warn_if_differs(i, "outdir", &entry.outdir, &first.outdir);
            warn_if_differs(i, "solc", &entry.solc, &first.solc);
            warn_if_differs(i, "solc_basepath", &entry.solc_basepath, &first.solc_basepath);
            warn_if_differs(i, "solc_allowpaths", &entry.solc_allowpaths, &first.solc_allowpaths);
            warn_if_differs(i, "solc_remappings", &entry.solc_remappings, &first.solc_remappings);
        }

        let jobs = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| job_from_entry(entry).with_context(|| format!("entry {}", i + 1)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            outdir,
            seed,
            solc,
            jobs,
        })
    }
}

fn job_from_entry(entry: FileConfig) -> Result<FileJob> {
    let file = entry.filename.context("no `filename` given")?;

    let mutations = match entry.mutations {
        None => MutationType::ALL.to_vec(),
        Some(names) if names.is_empty() => anyhow::bail!("`mutations` is empty"),
        Some(names) => parse_mutations(&names)?,
    };

    Ok(FileJob {
        file,
        ast: entry.ast,
        num_mutants: entry.num_mutants.unwrap_or(DEFAULT_NUM_MUTANTS),
        functions: entry.functions,
        contract: entry.contract,
        mutations,
        validate: entry.validate.unwrap_or(true),
    })
}

/// Parse operator names, dropping repeats and keeping catalog order.
pub fn parse_mutations(names: &[String]) -> Result<Vec<MutationType>> {
    let mut parsed = names
        .iter()
        .map(|n| {
            n.parse::<MutationType>()
                .with_context(|| format!("known mutations: {}", known_mutations()))
        })
        .collect::<Result<Vec<_>>>()?;

    parsed.sort();
    parsed.dedup();
    Ok(parsed)
}

fn known_mutations() -> String {
    MutationType::ALL
        .iter()
        .map(MutationType::name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn warn_if_differs<T: PartialEq + std::fmt::Debug>(
    index: usize,
    field: &str,
    value: &Option<T>,
    first: &Option<T>,
) {
    if value.is_some() && value != first {
        log::warn!(
            "config entry {}: `{field}` = {:?} ignored, the first entry's value applies to the whole run",
            index + 1,
            value
        );
    }
}
