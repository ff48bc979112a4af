use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use genesurv_analysis::{
    AnalysisResponse, config::RawAnalysisRequest, perform_request, provider::JsonFileProvider,
};

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyseArg {
    /// Path to the analysis request JSON file
    pub config: PathBuf,

    /// Directory holding `clinical/<study>.json` and `molecular/<profile>.json`
    #[arg(long)]
    pub data_dir: PathBuf,

    /// Output file path (defaults to stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &AnalyseArg) -> anyhow::Result<()> {
    let request: RawAnalysisRequest = util::read_json_file("analysis request", &arg.config)?;
    let analysis_id = request.analysis_id;
    let provider = JsonFileProvider::new(&arg.data_dir);

    let outcome = perform_request(&provider, request);
    let failure = outcome.as_ref().err().map(ToString::to_string);
    Output::save_json(&AnalysisResponse::from(outcome), arg.output.clone())?;

    if let Some(message) = failure {
        bail!("analysis {analysis_id} failed: {message}");
    }
    Ok(())
}
