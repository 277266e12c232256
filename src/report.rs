use std::collections::BTreeMap;

use crate::mutant::Mutant;
use crate::mutation::MutationType;
use crate::run_report::FileReport;

/// Print a detailed list of all mutants.
pub fn print_all_mutants(mutants: &[Mutant]) {
    if mutants.is_empty() {
        return;
    }

    println!("--- mutants (detailed) ---");
    for m in collect_sorted(mutants) {
        println!("{}", format_mutant_with_location(m));
    }
}

/// Print one line per source file with its sampling counters.
pub fn print_file_reports(files: &[FileReport]) {
    for f in files {
        println!("{}", format_file_report(f));
    }
}

fn collect_sorted(mutants: &[Mutant]) -> Vec<&Mutant> {
    let mut v: Vec<&Mutant> = mutants.iter().collect();
    v.sort_by_key(|m| m.id);
    v
}

/// `#3 contracts/C.sol:12:16 ArithmeticBinaryOpMutation: "+" -> "-"`
pub fn format_mutant_with_location(m: &Mutant) -> String {
    format!(
        "#{id} {file}:{line}:{col} {op}: {orig:?} -> {mutated:?}",
        id = m.id,
        file = m.span.file.display(),
        line = m.line,
        col = m.column,
        op = m.operator,
        orig = m.original_snippet,
        mutated = m.mutated_snippet,
    )
}

/// `(3) ArithmeticBinaryOpMutation (out/mutants/contracts/C_4.sol) + -> -`
pub fn format_mutant_short(m: &Mutant) -> String {
    format!(
        "({}) {} ({}) {} -> {}",
        m.id,
        m.operator,
        m.path.display(),
        m.original_snippet,
        m.mutated_snippet
    )
}

/// Header, stored diff and location of one mutant.
pub fn format_mutant_long(m: &Mutant) -> String {
    let mut out = format!("=== Mutant ID: {} [{}] ===\n\n", m.id, m.operator);
    out.push_str(&m.diff);
    if !m.diff.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("\nPath: {}\n", m.path.display()));
    out
}

pub fn format_file_report(f: &FileReport) -> String {
    match &f.error {
        Some(err) => format!("{}: failed: {err}", f.file.display()),
        None => format!(
            "{}: {} of {} mutants ({} points, {} attempts, {} duplicates, {} invalid{})",
            f.file.display(),
            f.stats.accepted,
            f.requested,
            f.stats.points,
            f.stats.attempts,
            f.stats.duplicates,
            f.stats.invalid,
            if f.stats.budget_exhausted {
                ", attempt budget exhausted"
            } else {
                ""
            }
        ),
    }
}

/// Per-operator counts with percentages, in catalog order, and a total line.
pub fn format_statistics(mutants: &[Mutant]) -> Vec<String> {
    let mut freq: BTreeMap<MutationType, usize> = BTreeMap::new();
    for m in mutants {
        *freq.entry(m.operator).or_default() += 1;
    }

    let total = mutants.len();
    let width = freq
        .keys()
        .map(|op| op.name().len())
        .max()
        .unwrap_or(0)
        .max("TOTAL".len());

    let mut lines: Vec<String> = freq
        .iter()
        .map(|(op, n)| {
            format!(
                "{:<width$} {:6} ({:>6.2}%)",
                op.name(),
                n,
                100.0 * (*n as f64) / (total as f64)
            )
        })
        .collect();

    lines.push("-".repeat(width + 17));
    lines.push(format!("{:<width$} {:6} (100.00%)", "TOTAL", total));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SamplingStats;
    use crate::span::SourceSpan;
    use std::path::PathBuf;

    fn mutant(id: u64, operator: MutationType) -> Mutant {
        Mutant {
            id,
            operator,
            span: SourceSpan {
                file: PathBuf::from("contracts/C.sol"),
                start: 100,
                end: 105,
            },
            line: 7,
            column: 16,
            original_snippet: "+".to_string(),
            mutated_snippet: "-".to_string(),
            path: PathBuf::from("out/mutants/contracts/C_4.sol"),
            diff: "--- original\n+++ mutant\n@@ -7 +7 @@\n-a + b\n+a - b\n".to_string(),
        }
    }

    #[test]
    fn format_lines_are_stable() {
        let m = mutant(3, MutationType::ArithmeticBinaryOpMutation);
        assert_eq!(
            format_mutant_with_location(&m),
            r#"#3 contracts/C.sol:7:16 ArithmeticBinaryOpMutation: "+" -> "-""#
        );
        assert_eq!(
            format_mutant_short(&m),
            "(3) ArithmeticBinaryOpMutation (out/mutants/contracts/C_4.sol) + -> -"
        );
    }

    #[test]
    fn long_form_includes_diff_and_path() {
        let long = format_mutant_long(&mutant(1, MutationType::IfStatementMutation));
        assert!(long.starts_with("=== Mutant ID: 1 [IfStatementMutation] ===\n\n--- original\n"));
        assert!(long.ends_with("+a - b\n\nPath: out/mutants/contracts/C_4.sol\n"));
    }

    #[test]
    fn statistics_count_per_operator() {
        let mutants = vec![
            mutant(1, MutationType::RequireMutation),
            mutant(2, MutationType::ArithmeticBinaryOpMutation),
            mutant(3, MutationType::RequireMutation),
            mutant(4, MutationType::RequireMutation),
        ];

        let lines = format_statistics(&mutants);
        assert_eq!(
            lines,
            vec![
                "ArithmeticBinaryOpMutation      1 ( 25.00%)",
                "RequireMutation                 3 ( 75.00%)",
                "-------------------------------------------",
                "TOTAL                           4 (100.00%)",
            ]
        );
    }

    #[test]
    fn file_report_lines() {
        let ok = FileReport {
            file: PathBuf::from("C.sol"),
            requested: 5,
            stats: SamplingStats {
                points: 9,
                attempts: 7,
                accepted: 5,
                duplicates: 1,
                invalid: 1,
                budget_exhausted: false,
            },
            error: None,
        };
        assert_eq!(
            format_file_report(&ok),
            "C.sol: 5 of 5 mutants (9 points, 7 attempts, 1 duplicates, 1 invalid)"
        );

        let failed = FileReport {
            error: Some("bad span".to_string()),
            ..ok
        };
        assert_eq!(format_file_report(&failed), "C.sol: failed: bad span");
    }
}
