//! The analysis pipeline
//!
//! ```text
//! validate -> fetch -> group + join -> size gate -> fit -> assemble
//! ```
//!
//! Every step may end the run with an [`AnalysisError`]; nothing is retried.

use genesurv_stats::cox::{CoxFit, CoxRegression};
use tracing::{debug, info, info_span, warn};

use crate::{
    cohort::{CohortRow, join_cohort},
    config::{AnalysisConfig, RawAnalysisRequest},
    error::AnalysisError,
    group::combine,
    provider::DataProvider,
    result::{AnalysisResult, assemble_result},
};

/// Smallest joined cohort the regression is attempted on.
pub const MIN_COHORT_SIZE: usize = 20;

/// Runs one analysis against `provider`.
///
/// The configuration is validated before any data is fetched. Provider
/// failures become [`AnalysisError::Api`], cohorts smaller than
/// [`MIN_COHORT_SIZE`] become [`AnalysisError::InsufficientData`] and
/// regression failures, including an empty arm, become
/// [`AnalysisError::ModelFitting`].
pub fn perform<P>(provider: &P, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError>
where
    P: DataProvider + ?Sized,
{
    let span = info_span!("analysis", id = config.analysis_id, study = %config.study_id);
    let _enter = span.enter();

    config.validate()?;

    debug!(profile = %config.profile_id, "fetching clinical and molecular data");
    let clinical = provider
        .clinical_data(&config.study_id)
        .map_err(|err| fetch_failed("clinical", &err))?;
    let molecular = provider
        .molecular_data(&config.genes(), &config.profile_id)
        .map_err(|err| fetch_failed("molecular", &err))?;

    let labels = combine(&molecular, &config.thresholds).map_err(|err| {
        AnalysisError::validation(format!("Invalid mirrored threshold: {err}."))
    })?;
    let rows = join_cohort(&clinical, &labels, config.outcome);
    debug!(
        clinical = clinical.len(),
        molecular = molecular.subjects().len(),
        cohort = rows.len(),
        "joined cohort"
    );

    if rows.len() < MIN_COHORT_SIZE {
        warn!(count = rows.len(), "cohort below minimum size");
        return Err(AnalysisError::InsufficientData { count: rows.len() });
    }

    let fit = fit_model(&rows)?;
    debug!(
        hazard_ratio = fit.hazard_ratio,
        p_value = fit.p_value,
        iterations = fit.iterations,
        "fitted proportional hazards model"
    );

    let result = assemble_result(config, &clinical, &rows, &fit);
    info!(
        num_test = result.num_test,
        num_control = result.num_control,
        "analysis complete"
    );
    Ok(result)
}

/// Parses and validates a raw request, then runs it.
pub fn perform_request<P>(
    provider: &P,
    request: RawAnalysisRequest,
) -> Result<AnalysisResult, AnalysisError>
where
    P: DataProvider + ?Sized,
{
    let config = AnalysisConfig::try_from(request)?;
    perform(provider, &config)
}

fn fetch_failed(source: &str, err: &anyhow::Error) -> AnalysisError {
    let detail = format!("{err:#}");
    warn!(source, error = %detail, "data fetch failed");
    AnalysisError::api(detail)
}

fn fit_model(rows: &[CohortRow]) -> Result<CoxFit, AnalysisError> {
    let times = rows.iter().map(|row| row.months).collect::<Vec<_>>();
    let events = rows.iter().map(|row| row.status.is_event()).collect::<Vec<_>>();
    let group = rows
        .iter()
        .map(|row| f64::from(u8::from(row.group)))
        .collect::<Vec<_>>();

    CoxRegression::new()
        .fit(&times, &events, &group)
        .map_err(|err| {
            warn!(error = %err, "proportional hazards fit failed");
            AnalysisError::model_fitting(err.to_string())
        })
}
