use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::{FileConfig, load_config};
use crate::options::{DEFAULT_OUTDIR, MutateOptions};
use crate::out::write_all;
use crate::report::{print_all_mutants, print_file_reports};
use crate::run_report::MutationRunReport;
use crate::runner::run_mutations;
use crate::summary::{SummaryMode, load_results, summarize};
use crate::ui::Ui;

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;

/// Top-level CLI arguments for the `sol-mutant` binary.
#[derive(Debug, Parser)]
#[command(
    name = "sol-mutant",
    version,
    about = "Mutant generation for Solidity contracts"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands supported by `sol-mutant`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate mutants of Solidity source files.
    Mutate(MutateArgs),

    /// Summarize the results of an earlier `mutate` run.
    Summary {
        /// Output directory of the run to summarize.
        #[arg(long, short = 'o', default_value = DEFAULT_OUTDIR)]
        outdir: PathBuf,

        /// Print only the mutants with these ids.
        #[arg(long = "mids", num_args = 1..)]
        mids: Vec<u64>,

        /// One line per mutant instead of the full diff.
        #[arg(long)]
        short: bool,
    },
}

#[derive(Debug, Args)]
pub struct MutateArgs {
    /// Solidity file(s) to mutate.
    #[arg(long, short = 'f', num_args = 1.., required_unless_present = "config")]
    pub filename: Vec<PathBuf>,

    /// JSON config file describing the files to mutate.
    #[arg(long, conflicts_with = "filename")]
    pub config: Option<PathBuf>,

    /// Precompiled compact JSON AST (only with a single source file).
    #[arg(long)]
    pub ast: Option<PathBuf>,

    /// Number of mutants to generate per file [default: 5].
    #[arg(long, short = 'n')]
    pub num_mutants: Option<usize>,

    /// Seed string for the random choices [default: 0].
    #[arg(long)]
    pub seed: Option<String>,

    /// Directory for mutants and reports [default: out].
    #[arg(long, short = 'o')]
    pub outdir: Option<PathBuf>,

    /// Solidity compiler executable [default: solc].
    #[arg(long)]
    pub solc: Option<String>,

    /// Only mutate inside these functions.
    #[arg(long, num_args = 1..)]
    pub functions: Vec<String>,

    /// Only mutate inside this contract.
    #[arg(long)]
    pub contract: Option<String>,

    /// Enabled mutation operators [default: all].
    #[arg(long, num_args = 1..)]
    pub mutations: Vec<String>,

    /// Accept every candidate without compiling it.
    #[arg(long)]
    pub no_validate: bool,

    /// `--base-path` passed to solc.
    #[arg(long)]
    pub solc_basepath: Option<PathBuf>,

    /// `--allow-paths` passed to solc.
    #[arg(long, num_args = 1..)]
    pub solc_allowpaths: Vec<PathBuf>,

    /// Import remapping passed to solc, e.g. `@oz/=lib/oz/`.
    #[arg(long)]
    pub solc_remapping: Vec<String>,

    /// Emit a machine-readable JSON report to stdout.
    #[arg(long)]
    pub json: bool,

    /// Print a detailed list of all mutants.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl MutateArgs {
    /// Per-file entries: from `--config`, or one per `--filename`.
    fn entries(&self) -> Result<Vec<FileConfig>> {
        let mut entries = match &self.config {
            Some(path) => load_config(path)?,
            None => self
                .filename
                .iter()
                .map(|f| FileConfig {
                    filename: Some(f.clone()),
                    ..FileConfig::default()
                })
                .collect(),
        };

        if self.ast.is_some() && entries.len() != 1 {
            anyhow::bail!("`--ast` needs exactly one source file, got {}", entries.len());
        }

        for entry in &mut entries {
            self.apply_to(entry);
        }
        Ok(entries)
    }

    /// Flags given on the command line win over config values.
    fn apply_to(&self, entry: &mut FileConfig) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        fn set_list<T: Clone>(slot: &mut Option<Vec<T>>, values: &[T]) {
            if !values.is_empty() {
                *slot = Some(values.to_vec());
            }
        }

        set(&mut entry.ast, &self.ast);
        set(&mut entry.num_mutants, &self.num_mutants);
        set(&mut entry.seed, &self.seed);
        set(&mut entry.outdir, &self.outdir);
        set(&mut entry.solc, &self.solc);
        set(&mut entry.contract, &self.contract);
        set(&mut entry.solc_basepath, &self.solc_basepath);
        set_list(&mut entry.functions, &self.functions);
        set_list(&mut entry.mutations, &self.mutations);
        set_list(&mut entry.solc_allowpaths, &self.solc_allowpaths);
        set_list(&mut entry.solc_remappings, &self.solc_remapping);
        if self.no_validate {
            entry.validate = Some(false);
        }
    }
}

fn print_json_and_exit(report: MutationRunReport, exit_code: i32) -> ! {
    let json = serde_json::to_string_pretty(&report).expect("serialize report to json");
    println!("{json}");
    std::process::exit(exit_code);
}

/// Parse CLI arguments and dispatch the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Mutate(args) => mutate(args),
        Command::Summary {
            outdir,
            mids,
            short,
        } => {
            let report = load_results(&outdir)?;
            let mode = if mids.is_empty() {
                SummaryMode::Statistics
            } else {
                SummaryMode::Mutants { ids: mids, short }
            };

            for line in summarize(&report, &mode) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn mutate(args: MutateArgs) -> Result<()> {
    let json = args.json;
    let mut ui = Ui::new(json);

    ui.title("sol-mutant: mutate");

    let opts = match args.entries().and_then(MutateOptions::from_entries) {
        Ok(opts) => opts,
        Err(e) => {
            if json {
                let report = MutationRunReport::failure(
                    args.seed.unwrap_or_default(),
                    args.outdir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR)),
                    format!("invalid options: {e:#}"),
                );
                print_json_and_exit(report, EXIT_ERROR);
            }
            return Err(e);
        }
    };

    ui.line(format!("seed: {:?}", opts.seed));
    ui.line(format!("outdir: {}", opts.outdir.display()));

    let report = match run_mutations(&opts, &mut ui) {
        Ok(r) => r,
        Err(e) => {
            if json {
                let report = MutationRunReport::failure(
                    opts.seed.clone(),
                    opts.outdir.clone(),
                    format!("{e:#}"),
                );
                print_json_and_exit(report, EXIT_ERROR);
            }
            return Err(e);
        }
    };

    if let Err(e) = write_all(&opts.outdir, &report) {
        ui.error(format!("failed to write results: {e:#}"));
        if json {
            print_json_and_exit(report, EXIT_ERROR);
        }
        return Err(e);
    }

    let exit_code = if report.has_errors() {
        EXIT_ERROR
    } else {
        EXIT_OK
    };

    if json {
        print_json_and_exit(report, exit_code);
    }

    println!("--- mutation summary ---");
    print_file_reports(&report.files);
    println!("mutants generated: {}", report.summary.accepted);
    println!("attempts:          {}", report.summary.attempts);
    println!("duplicates:        {}", report.summary.duplicates);
    println!("invalid:           {}", report.summary.invalid);

    if args.verbose {
        print_all_mutants(&report.mutants);
    }

    if exit_code != EXIT_OK {
        eprintln!(
            "{} of {} file(s) could not be mutated",
            report.summary.failed_files, report.summary.files
        );
        std::process::exit(exit_code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> MutateArgs {
        let cli = Cli::try_parse_from(args).expect("arguments should parse");
        match cli.command {
            Command::Mutate(args) => args,
            other => panic!("expected mutate, got {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filenames_become_entries_with_overrides() {
        let args = parse(&[
            "sol-mutant",
            "mutate",
            "-f",
            "A.sol",
            "B.sol",
            "-n",
            "3",
            "--mutations",
            "RequireMutation",
            "--no-validate",
        ]);

        let entries = args.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].filename, Some(PathBuf::from("B.sol")));
        for e in &entries {
            assert_eq!(e.num_mutants, Some(3));
            assert_eq!(e.mutations, Some(vec!["RequireMutation".to_string()]));
            assert_eq!(e.validate, Some(false));
            assert_eq!(e.seed, None);
        }
    }

    #[test]
    fn ast_requires_a_single_file() {
        let args = parse(&["sol-mutant", "mutate", "-f", "A.sol", "B.sol", "--ast", "A.json"]);
        let err = args.entries().unwrap_err();
        assert!(err.to_string().contains("exactly one source file"));
    }

    #[test]
    fn config_and_filename_conflict() {
        assert!(
            Cli::try_parse_from(["sol-mutant", "mutate", "-f", "A.sol", "--config", "c.json"])
                .is_err()
        );
        assert!(Cli::try_parse_from(["sol-mutant", "mutate"]).is_err());
    }

    #[test]
    fn summary_arguments() {
        let cli = Cli::try_parse_from(["sol-mutant", "summary", "--mids", "3", "1", "--short"])
            .unwrap();
        match cli.command {
            Command::Summary {
                outdir,
                mids,
                short,
            } => {
                assert_eq!(outdir, PathBuf::from("out"));
                assert_eq!(mids, vec![3, 1]);
                assert!(short);
            }
            other => panic!("expected summary, got {other:?}"),
        }
    }
}
