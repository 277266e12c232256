//! Mutation point selection and randomized, validated sampling.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ast::SolNode;
use crate::mutant::annotate;
use crate::mutation::MutationType;

/// Attempts allowed per requested mutant.
pub const ATTEMPTS_FACTOR: usize = 50;

/// Nodes claimed by each operator, keyed in catalog order.
pub type MutationPoints<'a> = BTreeMap<MutationType, Vec<SolNode<'a>>>;

/// Restricts which parts of a file are mutated.
#[derive(Debug, Clone, Default)]
pub struct PointFilter {
    /// Only mutate inside functions with these names. `None` means everywhere.
    pub functions: Option<Vec<String>>,

    /// Only mutate inside the contract with this name.
    pub contract: Option<String>,
}

impl PointFilter {
    fn accept(&self, node: &SolNode<'_>) -> bool {
        match &self.functions {
            None => true,
            Some(names) => {
                node.is("FunctionDefinition")
                    && node
                        .name()
                        .is_some_and(|n| names.iter().any(|want| want == n))
            }
        }
    }

    fn skip(&self, node: &SolNode<'_>) -> bool {
        if is_assert_call(node) {
            return true;
        }

        match &self.contract {
            Some(contract) if node.is("ContractDefinition") => node.name() != Some(contract),
            _ => false,
        }
    }
}

/// Is `node` a call to `assert(...)`?
pub fn is_assert_call(node: &SolNode<'_>) -> bool {
    node.callee_name() == Some("assert")
}

/// Random source for a whole run, derived from the seed string.
pub fn rng_from_seed(seed: &str) -> Pcg64 {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Pcg64::from_seed(bytes)
}

/// Walk the AST once and record, for every enabled operator, every node it claims.
pub fn collect_mutation_points<'a>(
    ast: SolNode<'a>,
    mutations: &[MutationType],
    filter: &PointFilter,
) -> MutationPoints<'a> {
    let claims = ast.traverse(
        |node| {
            let ops: Vec<MutationType> = mutations
                .iter()
                .copied()
                .filter(|m| m.is_mutation_point(node))
                .collect();
            (!ops.is_empty()).then(|| (ops, *node))
        },
        |node| filter.skip(node),
        |node| filter.accept(node),
    );

    let mut points = MutationPoints::new();
    for (ops, node) in claims {
        for op in ops {
            points.entry(op).or_default().push(node);
        }
    }
    points
}

/// Cycle the operators that have points into a queue of `num_mutants` entries.
pub fn build_work_queue(points: &MutationPoints<'_>, num_mutants: usize) -> VecDeque<MutationType> {
    let available: Vec<MutationType> = points
        .iter()
        .filter(|(_, nodes)| !nodes.is_empty())
        .map(|(op, _)| *op)
        .collect();

    available.iter().copied().cycle().take(num_mutants).collect()
}

/// Counters for one file's sampling loop.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingStats {
    /// Number of (operator, node) mutation points found.
    pub points: usize,

    /// Candidates generated, including rejected ones.
    pub attempts: usize,

    /// Candidates kept.
    pub accepted: usize,

    /// Candidates dropped because their text was already produced.
    pub duplicates: usize,

    /// Candidates rejected by the validity check.
    pub invalid: usize,

    /// True when the loop stopped because it ran out of attempts.
    pub budget_exhausted: bool,
}

/// A candidate that passed de-duplication and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledMutant {
    pub operator: MutationType,

    /// Span of the mutated node in the original file.
    pub node_span: (usize, usize),

    /// Mutated file text without the annotation comment.
    pub text: String,

    /// Where the annotated mutant was written.
    pub path: PathBuf,
}

/// Where candidates of one source file are written: `<dir>/<stem>_<n>.sol`.
///
/// `n` is `first_attempt` plus the attempt number within the file, so sinks
/// of one run that share a directory and stem never reuse a name as long as
/// each starts past the attempts of the ones before it.
#[derive(Debug, Clone)]
pub struct MutantSink {
    pub dir: PathBuf,
    pub stem: String,
    pub first_attempt: usize,
}

impl MutantSink {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            first_attempt: 0,
        }
    }

    pub fn starting_at(mut self, first_attempt: usize) -> Self {
        self.first_attempt = first_attempt;
        self
    }

    fn path_for(&self, attempt: usize) -> PathBuf {
        self.dir
            .join(format!("{}_{}.sol", self.stem, self.first_attempt + attempt))
    }
}

/// Draw up to `num_mutants` distinct, valid mutants of `source`.
///
/// Operators are taken from a round-robin work queue. For each, a point is
/// drawn uniformly (with replacement) and mutated. A text seen before (the
/// original included) is dropped; otherwise the annotated mutant is written
/// and checked with `is_valid`. A rejected candidate is deleted and its
/// operator goes back to the end of the queue. The loop stops once the queue
/// is empty or `ATTEMPTS_FACTOR * num_mutants` attempts were made.
pub fn sample_mutants(
    source: &str,
    points: &MutationPoints<'_>,
    num_mutants: usize,
    sink: &MutantSink,
    rng: &mut impl Rng,
    mut is_valid: impl FnMut(&Path) -> bool,
) -> Result<(Vec<SampledMutant>, SamplingStats)> {
    let mut stats = SamplingStats {
        points: points.values().map(Vec::len).sum(),
        ..SamplingStats::default()
    };
    let mut mutants = Vec::new();

    let mut queue = build_work_queue(points, num_mutants);
    if queue.is_empty() {
        return Ok((mutants, stats));
    }

    fs::create_dir_all(&sink.dir)
        .with_context(|| format!("failed to create mutant dir {:?}", sink.dir))?;

    let budget = ATTEMPTS_FACTOR * num_mutants;
    let mut seen: HashSet<String> = HashSet::from([source.to_string()]);

    while stats.attempts < budget {
        let Some(op) = queue.pop_front() else {
            break;
        };
        let Some(point) = points.get(&op).and_then(|nodes| nodes.choose(&mut *rng)) else {
            continue;
        };

        let attempt = stats.attempts;
        stats.attempts += 1;

        let mutated = op.mutate_randomly(point, source, rng)?;
        if !seen.insert(mutated.clone()) {
            log::debug!("attempt {attempt}: {op} produced a duplicate, dropping it");
            stats.duplicates += 1;
            continue;
        }

        let path = sink.path_for(attempt);
        let annotated = annotate(source, &mutated, op);
        fs::write(&path, annotated)
            .with_context(|| format!("failed to write mutant {:?}", path))?;

        if is_valid(&path) {
            log::debug!("attempt {attempt}: {op} accepted as {:?}", path);
            stats.accepted += 1;
            mutants.push(SampledMutant {
                operator: op,
                node_span: point.bounds()?,
                text: mutated,
                path,
            });
        } else {
            log::debug!("attempt {attempt}: {op} did not compile, requeueing");
            stats.invalid += 1;
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("failed to remove rejected mutant {:?}: {e}", path);
            }
            queue.push_back(op);
        }
    }

    stats.budget_exhausted = !queue.is_empty();
    if mutants.len() < num_mutants {
        log::info!(
            "generated {} of {} requested mutants in {} attempts",
            mutants.len(),
            num_mutants,
            stats.attempts
        );
    }

    Ok((mutants, stats))
}
