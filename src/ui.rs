use console::{Term, style};
use std::{env, fmt::Display};

use crate::mutant::Mutant;
use crate::run_report::FileReport;

/// Small UI helper:
/// - normal mode: human output to stdout, errors to stderr
/// - `--json` mode: ALL human output to stderr (stdout stays machine-readable JSON)
/// - fancy styling only on a real TTY and when NO_COLOR/CI are not set
#[derive(Debug, Clone)]
pub struct Ui {
    out: Term,
    err: Term,
    fancy: bool,
    enabled: bool,

    // Counters only; they do not affect output.
    mutants_generated: u64,
    file_errors: u64,
}

impl Ui {
    pub fn new(json: bool) -> Self {
        let out = if json { Term::stderr() } else { Term::stdout() };
        let err = Term::stderr();

        // Style only when the stream used for human output is a TTY.
        let out_is_tty = out.is_term();

        let no_color = env::var_os("NO_COLOR").is_some();
        let in_ci = env::var_os("CI").is_some();

        let fancy = out_is_tty && !no_color && !in_ci;

        Self {
            out,
            err,
            fancy,
            enabled: true,
            mutants_generated: 0,
            file_errors: 0,
        }
    }

    /// Useful for unit tests to avoid noisy output.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            fancy: false,
            enabled: false,
            mutants_generated: 0,
            file_errors: 0,
        }
    }

    fn write_out(&self, s: &str) {
        if self.enabled {
            let _ = self.out.write_line(s);
        }
    }

    fn write_err(&self, s: &str) {
        if self.enabled {
            let _ = self.err.write_line(s);
        }
    }

    pub fn line(&self, msg: impl Display) {
        self.write_out(&msg.to_string());
    }

    pub fn title(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_out(&style(s).bold().to_string());
        } else {
            self.write_out(&s);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_err(&style(s).yellow().to_string());
        } else {
            self.write_err(&s);
        }
    }

    pub fn error(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_err(&style(s).red().bold().to_string());
        } else {
            self.write_err(&s);
        }
    }

    /// One line per accepted mutant.
    pub fn mutant_generated(&mut self, m: &Mutant) {
        self.mutants_generated = self.mutants_generated.saturating_add(1);

        if !self.fancy {
            self.line(format!(
                "mutant {} {} at {}:{}:{}",
                m.id,
                m.operator,
                m.span.file.display(),
                m.line,
                m.column
            ));
            return;
        }

        self.line(format!(
            "{tag} #{id} {file}:{line}:{col} {op}: {orig:?} -> {mutated:?}",
            tag = style("MUTANT").green().bold(),
            id = m.id,
            file = m.span.file.display(),
            line = m.line,
            col = m.column,
            op = style(m.operator).blue(),
            orig = m.original_snippet,
            mutated = m.mutated_snippet,
        ));
    }

    /// A file that could not be mutated; the run goes on with the next one.
    pub fn file_error(&mut self, file: &FileReport) {
        self.file_errors += 1;
        if let Some(err) = &file.error {
            self.error(format!("failed to mutate {}: {err}", file.file.display()));
        }
    }

    /// Sampling stopped short of the requested count.
    pub fn file_incomplete(&self, file: &FileReport) {
        if file.error.is_none() && file.stats.accepted < file.requested {
            self.warn(format!(
                "{}: generated {} of {} requested mutants",
                file.file.display(),
                file.stats.accepted,
                file.requested
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationType;
    use crate::sampler::SamplingStats;
    use crate::span::SourceSpan;
    use std::path::PathBuf;

    fn mutant() -> Mutant {
        Mutant {
            id: 1,
            operator: MutationType::RequireMutation,
            span: SourceSpan {
                file: PathBuf::from("C.sol"),
                start: 0,
                end: 1,
            },
            line: 1,
            column: 1,
            original_snippet: "c".to_string(),
            mutated_snippet: "!(c)".to_string(),
            path: PathBuf::from("out/mutants/C_0.sol"),
            diff: String::new(),
        }
    }

    #[test]
    fn mutant_generated_increments_counter() {
        let mut ui = Ui::silent();
        ui.mutant_generated(&mutant());
        ui.mutant_generated(&mutant());
        assert_eq!(ui.mutants_generated, 2);
        assert_eq!(ui.file_errors, 0);
    }

    #[test]
    fn file_error_increments_counter() {
        let mut ui = Ui::silent();
        let report = FileReport {
            file: PathBuf::from("C.sol"),
            requested: 3,
            stats: SamplingStats::default(),
            error: Some("boom".to_string()),
        };

        ui.file_error(&report);
        ui.file_incomplete(&report);
        assert_eq!(ui.file_errors, 1);
    }
}
