use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use serde_json::Value;
use similar::TextDiff;

use crate::ast::SolNode;
use crate::mutant::{Change, Mutant};
use crate::options::{FileJob, MutateOptions};
use crate::run_report::{FileReport, MutationRunReport};
use crate::sampler::{
    MutantSink, PointFilter, SampledMutant, SamplingStats, collect_mutation_points,
    rng_from_seed, sample_mutants,
};
use crate::solc::{Solc, read_ast_json};
use crate::source::SourceFile;
use crate::span::SourceSpan;
use crate::ui::Ui;

/// Subdirectory of the output dir holding the annotated mutant files.
pub const MUTANTS_DIR: &str = "mutants";

/// The compiler-facing side of a run: AST production and the validity check.
pub trait Toolchain {
    /// Compact JSON AST of `file`; `outdir` may be used for intermediate files.
    fn compile_ast(&self, file: &Path, outdir: &Path) -> Result<Value>;

    /// Does the mutant at `file` compile?
    fn is_valid(&mut self, file: &Path) -> bool;
}

impl Toolchain for Solc {
    fn compile_ast(&self, file: &Path, outdir: &Path) -> Result<Value> {
        Solc::compile_ast(self, file, outdir)
    }

    fn is_valid(&mut self, file: &Path) -> bool {
        Solc::is_valid(self, file)
    }
}

/// Generate mutants for every file of `opts` with the real compiler.
pub fn run_mutations(opts: &MutateOptions, ui: &mut Ui) -> Result<MutationRunReport> {
    let mut solc = opts.solc.compiler();

    let needs_solc = opts.jobs.iter().any(|j| j.ast.is_none() || j.validate);
    let compiler = if needs_solc {
        match solc.version() {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("could not determine compiler version: {e:#}");
                None
            }
        }
    } else {
        None
    };

    run_mutations_with(opts, &mut solc, compiler, ui)
}

/// Generate mutants for every file of `opts`, in order, with one shared random source.
///
/// A file that fails (unreadable source, bad AST, malformed span) is recorded
/// in the report and the run continues with the next one. Mutant ids are
/// 1-based and increase across files.
pub fn run_mutations_with(
    opts: &MutateOptions,
    toolchain: &mut impl Toolchain,
    compiler: Option<String>,
    ui: &mut Ui,
) -> Result<MutationRunReport> {
    let mutants_root = opts.outdir.join(MUTANTS_DIR);
    clear_dir(&mutants_root)?;

    let mut rng = rng_from_seed(&opts.seed);
    let mut files = Vec::with_capacity(opts.jobs.len());
    let mut mutants: Vec<Mutant> = Vec::new();
    // Mutant file names are numbered run-wide so jobs on the same file do not collide.
    let mut attempts_so_far = 0;

    for job in &opts.jobs {
        let source = SourceFile::new(&job.file);
        log::info!("mutating {:?}", source.path());

        let next_id = mutants.len() as u64 + 1;
        let result = mutate_file(
            job,
            &source,
            &opts.outdir,
            &mutants_root,
            next_id,
            attempts_so_far,
            toolchain,
            &mut rng,
        );

        match result {
            Ok((file_mutants, stats)) => {
                attempts_so_far += stats.attempts;
                for m in &file_mutants {
                    ui.mutant_generated(m);
                }
                let report = FileReport {
                    file: job.file.clone(),
                    requested: job.num_mutants,
                    stats,
                    error: None,
                };
                ui.file_incomplete(&report);
                files.push(report);
                mutants.extend(file_mutants);
            }
            Err(e) => {
                log::error!("failed to mutate {:?}: {e:#}", job.file);
                let report = FileReport {
                    file: job.file.clone(),
                    requested: job.num_mutants,
                    stats: SamplingStats::default(),
                    error: Some(format!("{e:#}")),
                };
                ui.file_error(&report);
                files.push(report);
            }
        }
    }

    Ok(MutationRunReport::success(
        opts.seed.clone(),
        opts.outdir.clone(),
        compiler,
        files,
        mutants,
    ))
}

fn mutate_file(
    job: &FileJob,
    source: &SourceFile,
    outdir: &Path,
    mutants_root: &Path,
    first_id: u64,
    first_attempt: usize,
    toolchain: &mut impl Toolchain,
    rng: &mut impl Rng,
) -> Result<(Vec<Mutant>, SamplingStats)> {
    let text = source.read_to_string()?;

    let ast = match &job.ast {
        Some(path) => read_ast_json(path)?,
        None => toolchain
            .compile_ast(source.path(), outdir)
            .with_context(|| format!("failed to build AST for {:?}", source.path()))?,
    };

    let filter = PointFilter {
        functions: job.functions.clone(),
        contract: job.contract.clone(),
    };
    let points = collect_mutation_points(SolNode::new(&ast), &job.mutations, &filter);
    if points.is_empty() {
        log::info!("no mutation points in {:?}", source.path());
    }

    let sink = MutantSink::new(source.mutant_dir(mutants_root), source.stem())
        .starting_at(first_attempt);
    let validate = job.validate;
    let (sampled, stats) = sample_mutants(&text, &points, job.num_mutants, &sink, rng, |p: &Path| {
        !validate || toolchain.is_valid(p)
    })?;

    let mutants = sampled
        .into_iter()
        .zip(first_id..)
        .map(|(s, id)| to_mutant(id, source, &text, s))
        .collect();

    Ok((mutants, stats))
}

fn to_mutant(id: u64, source: &SourceFile, original: &str, sampled: SampledMutant) -> Mutant {
    let change = Change::between(original, &sampled.text);
    let (line, column) = change.line_col(original);

    let diff = TextDiff::from_lines(original, sampled.text.as_str())
        .unified_diff()
        .header(
            &source.path().display().to_string(),
            &sampled.path.display().to_string(),
        )
        .to_string();

    Mutant {
        id,
        operator: sampled.operator,
        span: SourceSpan {
            file: source.path().to_path_buf(),
            start: sampled.node_span.0,
            end: sampled.node_span.1,
        },
        line,
        column,
        original_snippet: change.original,
        mutated_snippet: change.replacement,
        path: sampled.path,
        diff,
    }
}

/// Remove `dir` (a file or a whole tree) if it exists.
fn clear_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        fs::remove_dir_all(dir).with_context(|| format!("failed to clear {:?}", dir))?;
    } else if dir.exists() {
        fs::remove_file(dir).with_context(|| format!("failed to remove {:?}", dir))?;
    }
    Ok(())
}
