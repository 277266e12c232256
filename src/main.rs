mod ast;
mod cli;
mod config;
mod error;
mod mutant;
mod mutation;
mod options;
mod out;
mod patch;
mod report;
mod run_report;
mod runner;
mod sampler;
mod solc;
mod source;
mod span;
mod summary;
mod ui;

/// Entry point for the `sol-mutant` binary.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run()
}
