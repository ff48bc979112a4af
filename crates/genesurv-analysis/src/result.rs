//! Result assembly and the success/failure envelope

use std::{borrow::Cow, iter};

use genesurv_stats::{cox::CoxFit, survival::KaplanMeierCurve};
use serde::Serialize;

use crate::{
    cohort::{Arm, CohortRow},
    config::{AnalysisConfig, OutcomeKind},
    data::ClinicalTable,
    error::{AnalysisError, ErrorReport},
};

/// Two-sided level of the reported hazard ratio interval.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// One step of a Kaplan-Meier curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivalPoint {
    pub time: f64,
    pub survival_probability: f64,
}

/// Kaplan-Meier curve of one arm with its censoring overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArmCurve {
    pub points: Vec<SurvivalPoint>,
    /// Curve points at which at least one subject of the arm was censored.
    pub censors: Vec<SurvivalPoint>,
    pub median_survival: Option<f64>,
}

impl ArmCurve {
    /// Fits the curve over the rows belonging to `arm`.
    #[must_use]
    pub fn fit(rows: &[CohortRow], arm: Arm) -> Self {
        let observations = rows
            .iter()
            .filter(|row| row.group == arm)
            .map(|row| (row.months, row.status.is_censored()))
            .collect::<Vec<_>>();
        let curve = KaplanMeierCurve::from_observations(&observations);

        let points = curve
            .points()
            .map(|(time, survival_probability)| SurvivalPoint {
                time,
                survival_probability,
            })
            .collect::<Vec<_>>();
        let censors = points
            .iter()
            .zip(&curve.censored)
            .filter(|(_, censored)| **censored > 0)
            .map(|(point, _)| *point)
            .collect();

        Self {
            points,
            censors,
            median_survival: curve.median_survival(),
        }
    }
}

/// Counts describing how the study population shrank to the cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortCounts {
    pub test: usize,
    pub control: usize,
    pub clinical: usize,
    pub excluded: usize,
}

impl CohortCounts {
    #[must_use]
    pub fn new(rows: &[CohortRow], clinical: &ClinicalTable) -> Self {
        let test = rows.iter().filter(|row| row.group.is_test()).count();
        let control = rows.len() - test;
        let clinical = clinical.max_column_count();
        Self {
            test,
            control,
            clinical,
            excluded: clinical.saturating_sub(test + control),
        }
    }
}

/// Quotes a CSV field when it holds a delimiter, a quote or a line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Renders the cohort as CSV with a `subject_id,months,status,group` header.
#[must_use]
pub fn cohort_csv(rows: &[CohortRow]) -> String {
    iter::once(String::from("subject_id,months,status,group\n"))
        .chain(rows.iter().map(|row| {
            format!(
                "{},{},{},{}\n",
                csv_field(&row.subject_id),
                row.months,
                u8::from(row.status),
                u8::from(row.group)
            )
        }))
        .collect()
}

/// Successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_id: u64,
    pub num_test: usize,
    pub num_control: usize,
    pub num_clinical: usize,
    pub num_excluded: usize,
    pub outcome: OutcomeKind,
    pub outcome_units: &'static str,
    pub hazard_ratio: f64,
    pub p_value: f64,
    pub coefficient: f64,
    pub standard_error: f64,
    pub hazard_ratio_lower: f64,
    pub hazard_ratio_upper: f64,
    pub test_km_data: Vec<SurvivalPoint>,
    pub test_km_censors: Vec<SurvivalPoint>,
    pub test_median_survival: Option<f64>,
    pub cont_km_data: Vec<SurvivalPoint>,
    pub cont_km_censors: Vec<SurvivalPoint>,
    pub cont_median_survival: Option<f64>,
    pub csv_data: String,
}

/// Packages the fitted model, both arm curves and the cohort export.
#[must_use]
pub fn assemble_result(
    config: &AnalysisConfig,
    clinical: &ClinicalTable,
    rows: &[CohortRow],
    fit: &CoxFit,
) -> AnalysisResult {
    let counts = CohortCounts::new(rows, clinical);
    let test = ArmCurve::fit(rows, Arm::Test);
    let control = ArmCurve::fit(rows, Arm::Control);
    let (hazard_ratio_lower, hazard_ratio_upper) = fit.hazard_ratio_interval(CONFIDENCE_LEVEL);

    AnalysisResult {
        analysis_id: config.analysis_id,
        num_test: counts.test,
        num_control: counts.control,
        num_clinical: counts.clinical,
        num_excluded: counts.excluded,
        outcome: config.outcome,
        outcome_units: config.outcome.units(),
        hazard_ratio: fit.hazard_ratio,
        p_value: fit.p_value,
        coefficient: fit.coefficient,
        standard_error: fit.standard_error,
        hazard_ratio_lower,
        hazard_ratio_upper,
        test_km_data: test.points,
        test_km_censors: test.censors,
        test_median_survival: test.median_survival,
        cont_km_data: control.points,
        cont_km_censors: control.censors,
        cont_median_survival: control.median_survival,
        csv_data: cohort_csv(rows),
    }
}

/// Wire envelope holding exactly one of a result or an error.
///
/// ```json
/// {"status": "ok", "analysisId": 1, "hazardRatio": 1.8, ...}
/// {"status": "error", "type": "data", "message": "...", "debug": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum AnalysisResponse {
    #[serde(rename = "ok")]
    Success(Box<AnalysisResult>),
    #[serde(rename = "error")]
    Failure(ErrorReport),
}

impl AnalysisResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<AnalysisResult, AnalysisError>> for AnalysisResponse {
    fn from(result: Result<AnalysisResult, AnalysisError>) -> Self {
        match result {
            Ok(result) => Self::Success(Box::new(result)),
            Err(err) => Self::Failure(err.report()),
        }
    }
}
