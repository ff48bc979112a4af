use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use genesurv_analysis::{
    provider::{DataProvider, JsonFileProvider},
    study::{MIN_OUTCOME_CASES, valid_outcomes},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct OutcomesArg {
    /// Study identifier
    pub study: String,

    /// Directory holding `clinical/<study>.json`
    #[arg(long)]
    pub data_dir: PathBuf,
}

pub(crate) fn run(arg: &OutcomesArg) -> anyhow::Result<()> {
    let provider = JsonFileProvider::new(&arg.data_dir);
    let clinical = provider
        .clinical_data(&arg.study)
        .with_context(|| format!("Failed to load clinical data for study {}", arg.study))?;

    let outcomes = valid_outcomes(&clinical);
    if outcomes.is_empty() {
        eprintln!(
            "No outcome of study {} has at least {MIN_OUTCOME_CASES} cases",
            arg.study
        );
    }
    for (kind, count) in outcomes {
        println!("{kind}\t{count}\t{}", kind.description());
    }
    Ok(())
}
