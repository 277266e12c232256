use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::mutant::Mutant;
use crate::run_report::MutationRunReport;

pub const RESULTS_JSON: &str = "results.json";
pub const MUTANTS_LOG: &str = "mutants.log";
pub const DIFF_DIR: &str = "diff";

/// Write every run artifact: `results.json`, `mutants.log` and `diff/`.
pub fn write_all(out_dir: &Path, report: &MutationRunReport) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output dir {:?}", out_dir))?;

    write_results_json(out_dir, report)?;
    write_mutants_log(out_dir, &report.mutants)?;
    write_diff_dir(out_dir, &report.mutants)?;
    Ok(())
}

/// Write `results.json` with the full run report.
pub fn write_results_json(out_dir: &Path, report: &MutationRunReport) -> Result<()> {
    write_pretty_json(&out_dir.join(RESULTS_JSON), report)
}

/// Write `mutants.log`, one line per mutant: `id,Operator,file,line:col,orig,repl`.
///
/// The file is created even when there are no mutants.
pub fn write_mutants_log(out_dir: &Path, mutants: &[Mutant]) -> Result<()> {
    let path = out_dir.join(MUTANTS_LOG);

    let mut ordered: Vec<&Mutant> = mutants.iter().collect();
    ordered.sort_by_key(|m| m.id);

    let mut w = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {:?}", path))?;
    for m in ordered {
        let line_col = format!("{}:{}", m.line, m.column);
        let file = m.span.file.display().to_string();
        w.write_record([
            m.id.to_string().as_str(),
            m.operator.name(),
            file.as_str(),
            line_col.as_str(),
            m.original_snippet.as_str(),
            m.mutated_snippet.as_str(),
        ])
        .with_context(|| format!("failed to write {:?}", path))?;
    }

    w.flush().with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

/// Write one unified diff per mutant to `diff/<id>.diff`.
///
/// Stale diffs of an earlier run are removed first.
pub fn write_diff_dir(out_dir: &Path, mutants: &[Mutant]) -> Result<()> {
    let diff_dir = out_dir.join(DIFF_DIR);
    if diff_dir.is_dir() {
        fs::remove_dir_all(&diff_dir)
            .with_context(|| format!("failed to clear diff dir {:?}", diff_dir))?;
    }
    fs::create_dir_all(&diff_dir)
        .with_context(|| format!("failed to create diff dir {:?}", diff_dir))?;

    for m in mutants {
        let path = diff_dir.join(format!("{}.diff", m.id));
        fs::write(&path, &m.diff).with_context(|| format!("failed to write {:?}", path))?;
    }

    Ok(())
}

fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize json")?;
    fs::write(path, json).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}
