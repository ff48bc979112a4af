use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{allocate::AllocateArg, analyse::AnalyseArg, outcomes::OutcomesArg};

mod allocate;
mod analyse;
mod outcomes;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "GENESURV_LOG";

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run a survival analysis described by a JSON request
    Analyse(#[clap(flatten)] AnalyseArg),
    /// List the outcomes a study has enough cases for
    Outcomes(#[clap(flatten)] OutcomesArg),
    /// Label percentiles with one threshold specification
    Allocate(#[clap(flatten)] AllocateArg),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing();
    match args.mode {
        Mode::Analyse(arg) => analyse::run(&arg)?,
        Mode::Outcomes(arg) => outcomes::run(&arg)?,
        Mode::Allocate(arg) => allocate::run(&arg)?,
    }
    Ok(())
}
