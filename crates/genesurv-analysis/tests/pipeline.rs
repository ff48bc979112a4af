use std::thread;

use approx::assert_relative_eq;
use genesurv_analysis::{
    AnalysisError, AnalysisResponse,
    analysis::{MIN_COHORT_SIZE, perform, perform_request},
    config::{
        AnalysisConfig, ControlMode, Direction, GeneId, OutcomeKind, RawAnalysisRequest,
        ThresholdSpec,
    },
    data::{ClinicalRecord, ClinicalTable, ExpressionMeasurement},
    error::ErrorKind,
    provider::InMemoryProvider,
};

const STUDY: &str = "brca_tcga";
const PROFILE: &str = "brca_tcga_mrna";

fn subject(i: usize) -> String {
    format!("TCGA-{i:02}")
}

#[expect(clippy::cast_precision_loss)]
fn clinical(n: usize, extra: usize) -> ClinicalTable {
    let records = (0..n)
        .map(|i| ClinicalRecord {
            subject_id: subject(i),
            os_months: Some(5.0 + ((i * 7) % 23) as f64),
            os_status: Some(if i % 3 == 0 { 0.0 } else { 1.0 }),
            dfs_months: None,
            dfs_status: None,
        })
        .chain((0..extra).map(|i| ClinicalRecord {
            subject_id: format!("clinical-only-{i}"),
            os_months: Some(12.0),
            os_status: Some(1.0),
            ..ClinicalRecord::default()
        }))
        .collect();
    ClinicalTable::new(records)
}

#[expect(clippy::cast_precision_loss)]
fn molecular(n: usize) -> Vec<ExpressionMeasurement> {
    (0..n)
        .flat_map(|i| {
            [
                (672, i as f64),
                (675, (n - 1 - i) as f64),
            ]
            .map(|(gene, value)| ExpressionMeasurement {
                subject_id: subject(i),
                entrez_gene_id: GeneId(gene),
                value: Some(value),
            })
        })
        .collect()
}

fn provider(n: usize, extra: usize) -> InMemoryProvider {
    InMemoryProvider::new()
        .with_clinical(STUDY, clinical(n, extra))
        .with_molecular(PROFILE, molecular(n))
}

fn threshold(
    gene: u32,
    threshold: f64,
    direction: Direction,
    control: ControlMode,
) -> ThresholdSpec {
    ThresholdSpec {
        gene: GeneId(gene),
        threshold,
        direction,
        control,
    }
}

fn config(thresholds: Vec<ThresholdSpec>) -> AnalysisConfig {
    AnalysisConfig {
        analysis_id: 42,
        study_id: STUDY.to_owned(),
        profile_id: PROFILE.to_owned(),
        outcome: OutcomeKind::Os,
        thresholds,
    }
}

fn median_split() -> AnalysisConfig {
    config(vec![threshold(672, 0.5, Direction::Above, ControlMode::Complement)])
}

#[test]
fn test_median_split_succeeds() {
    let result = perform(&provider(30, 3), &median_split()).unwrap();

    assert_eq!(result.analysis_id, 42);
    assert_eq!(result.num_test, 15);
    assert_eq!(result.num_control, 15);
    assert_eq!(result.num_clinical, 33);
    assert_eq!(result.num_excluded, 3);
    assert_eq!(result.outcome_units, "months");
    assert!(result.hazard_ratio > 0.0);
    assert!((0.0..=1.0).contains(&result.p_value));
    assert_relative_eq!(result.hazard_ratio, result.coefficient.exp(), max_relative = 1e-12);

    for curve in [&result.test_km_data, &result.cont_km_data] {
        assert_eq!(curve[0].time, 0.0);
        assert_eq!(curve[0].survival_probability, 1.0);
        assert!(curve.windows(2).all(|w| w[0].time < w[1].time));
        assert!(
            curve
                .windows(2)
                .all(|w| w[1].survival_probability <= w[0].survival_probability)
        );
    }
    for (curve, censors) in [
        (&result.test_km_data, &result.test_km_censors),
        (&result.cont_km_data, &result.cont_km_censors),
    ] {
        assert!(!censors.is_empty());
        assert!(censors.iter().all(|c| curve.contains(c)));
    }

    let mut lines = result.csv_data.lines();
    assert_eq!(lines.next(), Some("subject_id,months,status,group"));
    assert_eq!(lines.count(), 30);
}

#[test]
fn test_two_genes_are_and_combined() {
    let config = config(vec![
        threshold(672, 0.5, Direction::Above, ControlMode::Complement),
        threshold(675, 0.5, Direction::Below, ControlMode::Complement),
    ]);
    let result = perform(&provider(30, 0), &config).unwrap();

    // subject 15 is test on the first gene but control on the second
    assert_eq!(result.num_test, 14);
    assert_eq!(result.num_control, 15);
    assert!(!result.csv_data.contains(&subject(15)));
}

#[test]
fn test_mirrored_bands_shrink_cohort_below_gate() {
    let config = config(vec![threshold(672, 0.75, Direction::Above, ControlMode::Mirrored)]);
    let err = perform(&provider(30, 0), &config).unwrap_err();

    assert_eq!(err, AnalysisError::InsufficientData { count: 15 });
}

#[test]
fn test_small_study_is_insufficient() {
    let err = perform(&provider(MIN_COHORT_SIZE - 1, 0), &median_split()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Data);
    assert!(err.to_string().contains(&format!("n={}", MIN_COHORT_SIZE - 1)));
}

#[test]
fn test_gate_admits_exact_minimum() {
    assert!(perform(&provider(MIN_COHORT_SIZE, 0), &median_split()).is_ok());
}

#[test]
fn test_missing_profile_is_api_error() {
    let provider = InMemoryProvider::new().with_clinical(STUDY, clinical(30, 0));
    let report = perform(&provider, &median_split()).unwrap_err().report();

    assert_eq!(report.kind, ErrorKind::Api);
    assert_eq!(report.message, "There was an API error. Let us know.");
    assert!(report.debug.contains(PROFILE));
}

#[test]
fn test_empty_arm_is_model_error() {
    let config = config(vec![threshold(672, 1.0, Direction::Above, ControlMode::Complement)]);
    let err = perform(&provider(30, 0), &config).unwrap_err();

    assert!(err.is_model_fitting());
    assert_eq!(
        err.to_string(),
        "Performing the Cox Proportional Hazards analysis failed during fitting."
    );
    assert!(!err.debug().is_empty());
}

#[test]
fn test_unknown_direction_is_validation_error() {
    let request: RawAnalysisRequest = serde_json::from_value(serde_json::json!({
        "analysisId": 1,
        "studyId": STUDY,
        "profileId": PROFILE,
        "outcomeId": "os",
        "thresholds": [
            {
                "gene": {"entrez": 672},
                "threshold": 0.5,
                "direction": "sideways",
                "control": "complement"
            }
        ]
    }))
    .unwrap();
    let err = perform_request(&provider(30, 0), request).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.to_string(),
        "Unknown threshold direction: 'sideways' ('above' or 'below' expected)."
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let provider = provider(30, 3);
    let config = median_split();

    let first = perform(&provider, &config).unwrap();
    let second = perform(&provider, &config).unwrap();
    assert_eq!(first, second);

    let concurrent = thread::scope(|s| {
        let handles = (0..4)
            .map(|_| s.spawn(|| perform(&provider, &config)))
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect::<Vec<_>>()
    });
    assert!(concurrent.iter().all(|result| *result == first));
}

#[test]
fn test_response_envelope_is_tagged() {
    let ok = AnalysisResponse::from(perform(&provider(30, 0), &median_split()));
    assert!(ok.is_success());
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["numTest"], 15);
    assert!(json["testKmData"][0]["survivalProbability"].is_number());

    let err = AnalysisResponse::from(perform(&provider(5, 0), &median_split()));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["type"], "data");
}
