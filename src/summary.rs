//! `sol-mutant summary`: inspect the results of an earlier `mutate` run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::mutant::Mutant;
use crate::out::RESULTS_JSON;
use crate::report::{format_mutant_long, format_mutant_short, format_statistics};
use crate::run_report::MutationRunReport;

/// What to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryMode {
    /// Per-operator counts and a total.
    Statistics,

    /// The mutants with these ids, in id order.
    Mutants { ids: Vec<u64>, short: bool },
}

/// Load `<outdir>/results.json`.
pub fn load_results(outdir: &Path) -> Result<MutationRunReport> {
    if !outdir.is_dir() {
        anyhow::bail!(
            "missing output directory {:?}; run `sol-mutant mutate` first or pass `--outdir`",
            outdir
        );
    }

    let path = outdir.join(RESULTS_JSON);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read results {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("ill-formed results {:?}", path))
}

/// Render the summary lines for `mode`.
///
/// Unknown ids are reported through `log` and otherwise ignored.
pub fn summarize(report: &MutationRunReport, mode: &SummaryMode) -> Vec<String> {
    match mode {
        SummaryMode::Statistics => {
            if report.mutants.is_empty() {
                return vec!["no mutants".to_string()];
            }
            format_statistics(&report.mutants)
        }
        SummaryMode::Mutants { ids, short } => {
            let mut wanted = ids.clone();
            wanted.sort_unstable();
            wanted.dedup();

            wanted
                .iter()
                .filter_map(|id| {
                    let found = find_mutant(report, *id);
                    if found.is_none() {
                        log::warn!("no mutant with id {id}");
                    }
                    found
                })
                .map(|m| {
                    if *short {
                        format_mutant_short(m)
                    } else {
                        format_mutant_long(m)
                    }
                })
                .collect()
        }
    }
}

fn find_mutant(report: &MutationRunReport, id: u64) -> Option<&Mutant> {
    report.mutants.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationType;
    use crate::out::write_all;
    use crate::span::SourceSpan;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn mutant(id: u64, operator: MutationType, orig: &str, repl: &str) -> Mutant {
        Mutant {
            id,
            operator,
            span: SourceSpan {
                file: PathBuf::from("C.sol"),
                start: 0,
                end: 1,
            },
            line: 2,
            column: 9,
            original_snippet: orig.to_string(),
            mutated_snippet: repl.to_string(),
            path: PathBuf::from(format!("out/mutants/C_{}.sol", id - 1)),
            diff: format!("-{orig}\n+{repl}\n"),
        }
    }

    fn report() -> MutationRunReport {
        MutationRunReport::success(
            "0".to_string(),
            PathBuf::from("out"),
            Some("0.8.19+commit.7dd6d404".to_string()),
            Vec::new(),
            vec![
                mutant(1, MutationType::RequireMutation, "c", "!(c)"),
                mutant(2, MutationType::ArithmeticBinaryOpMutation, "+", "*"),
            ],
        )
    }

    #[test]
    fn results_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let r = report();
        write_all(dir.path(), &r).unwrap();

        let loaded = load_results(dir.path()).unwrap();
        assert_eq!(loaded.mutants, r.mutants);
        assert_eq!(loaded.compiler.as_deref(), Some("0.8.19+commit.7dd6d404"));
    }

    #[test]
    fn missing_directory_or_results_fail() {
        let dir = TempDir::new().unwrap();
        assert!(load_results(&dir.path().join("nope")).is_err());

        let err = load_results(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read results"));
    }

    #[test]
    fn short_lines_for_selected_ids() {
        let lines = summarize(
            &report(),
            &SummaryMode::Mutants {
                ids: vec![2, 9, 1, 2],
                short: true,
            },
        );
        insta::assert_debug_snapshot!(lines, @r###"
        [
            "(1) RequireMutation (out/mutants/C_0.sol) c -> !(c)",
            "(2) ArithmeticBinaryOpMutation (out/mutants/C_1.sol) + -> *",
        ]
        "###);
    }

    #[test]
    fn long_form_carries_the_diff() {
        let lines = summarize(
            &report(),
            &SummaryMode::Mutants {
                ids: vec![2],
                short: false,
            },
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("-+\n+*\n"));
    }

    #[test]
    fn statistics_of_an_empty_run() {
        let empty = MutationRunReport::success(
            "0".to_string(),
            PathBuf::from("out"),
            None,
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(summarize(&empty, &SummaryMode::Statistics), vec!["no mutants"]);
        assert_eq!(summarize(&report(), &SummaryMode::Statistics).len(), 4);
    }
}
