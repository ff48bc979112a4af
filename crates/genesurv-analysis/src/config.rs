//! Analysis configuration
//!
//! A request arrives as a [`RawAnalysisRequest`] whose enumerated fields are
//! still free-form strings. [`AnalysisConfig::try_from`] parses those strings
//! into closed enumerations and checks every threshold once, so nothing
//! downstream has to re-check them.
//!
//! ```json
//! {
//!   "analysisId": 0,
//!   "studyId": "brca_metabric",
//!   "profileId": "brca_metabric_mrna",
//!   "outcomeId": "os",
//!   "thresholds": [
//!     { "gene": { "entrez": 675 }, "threshold": 0.7, "direction": "above", "control": "complement" },
//!     { "gene": { "entrez": 5728 }, "threshold": 0.3, "direction": "below", "control": "mirrored" }
//!   ]
//! }
//! ```
//!
//! Snake-case keys (`analysis_id`, `study_id`, ...) are accepted as well.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Entrez identifier of a gene.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct GeneId(pub u32);

/// Which side of the threshold the test group lies on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
#[display(rename_all = "lowercase")]
#[from_str(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

/// How the control group is defined relative to the test group.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
#[display(rename_all = "lowercase")]
#[from_str(rename_all = "lowercase")]
pub enum ControlMode {
    /// Controls lie beyond the mirrored threshold `1 - threshold`, on the opposite side.
    Mirrored,
    /// Every subject that is not in the test group is a control.
    Complement,
}

/// Survival outcome analysed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(rename_all = "lowercase")]
#[display(rename_all = "lowercase")]
#[from_str(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// Overall survival
    Os,
    /// Disease-free survival
    Dfs,
}

impl OutcomeKind {
    pub const ALL: [Self; 2] = [Self::Os, Self::Dfs];

    /// Unit of the duration column; both outcomes are recorded in months.
    #[must_use]
    pub fn units(self) -> &'static str {
        "months"
    }

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Os => "os",
            Self::Dfs => "dfs",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Os => "Overall Survival",
            Self::Dfs => "Disease-Free Survival",
        }
    }
}

/// Parses one enumerated request field, naming the field and its accepted
/// values when `value` matches none of them.
fn parse_field<T: FromStr>(value: &str, field: &str, expected: &str) -> Result<T, AnalysisError> {
    value.parse().map_err(|_| {
        AnalysisError::validation(format!("Unknown {field}: '{value}' ({expected} expected)."))
    })
}

/// Percentile threshold applied to one gene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSpec {
    pub gene: GeneId,
    /// Percentile in `[0, 1]`; subjects exactly on it are never in the test group.
    pub threshold: f64,
    pub direction: Direction,
    pub control: ControlMode,
}

impl ThresholdSpec {
    /// Checks the threshold range and, for mirrored controls, that the test
    /// band and the mirrored control band cannot share a subject.
    ///
    /// `Above` + `Mirrored` overlaps when `threshold < 0.5`, `Below` +
    /// `Mirrored` when `threshold > 0.5`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(AnalysisError::validation(format!(
                "Threshold {} for gene {} is outside the range [0, 1].",
                self.threshold, self.gene
            )));
        }
        let overlapping = match (self.control, self.direction) {
            (ControlMode::Complement, _) => false,
            (ControlMode::Mirrored, Direction::Above) => self.threshold < 0.5,
            (ControlMode::Mirrored, Direction::Below) => self.threshold > 0.5,
        };
        if overlapping {
            return Err(AnalysisError::validation(format!(
                "Threshold {} for gene {} with direction '{}' and mirrored controls makes the test and control groups overlap.",
                self.threshold, self.gene, self.direction
            )));
        }
        Ok(())
    }
}

/// Fully parsed configuration of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    pub analysis_id: u64,
    pub study_id: String,
    pub profile_id: String,
    pub outcome: OutcomeKind,
    pub thresholds: Vec<ThresholdSpec>,
}

impl AnalysisConfig {
    /// Checks the invariants that the types alone cannot express.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.thresholds.is_empty() {
            return Err(AnalysisError::validation(
                "At least one gene threshold is required.",
            ));
        }
        self.thresholds.iter().try_for_each(ThresholdSpec::validate)
    }

    /// Distinct genes referenced by the thresholds, in first-use order.
    #[must_use]
    pub fn genes(&self) -> Vec<GeneId> {
        let mut genes = Vec::with_capacity(self.thresholds.len());
        for spec in &self.thresholds {
            if !genes.contains(&spec.gene) {
                genes.push(spec.gene);
            }
        }
        genes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGene {
    pub entrez: u32,
}

/// A threshold as submitted, before its strings are checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawThreshold {
    pub gene: RawGene,
    pub threshold: f64,
    pub direction: String,
    pub control: String,
}

/// An analysis request as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysisRequest {
    #[serde(alias = "analysis_id", default)]
    pub analysis_id: u64,
    #[serde(alias = "study_id")]
    pub study_id: String,
    #[serde(alias = "profile_id")]
    pub profile_id: String,
    #[serde(alias = "outcome_id")]
    pub outcome_id: String,
    pub thresholds: Vec<RawThreshold>,
}

impl TryFrom<RawThreshold> for ThresholdSpec {
    type Error = AnalysisError;

    fn try_from(raw: RawThreshold) -> Result<Self, Self::Error> {
        let spec = Self {
            gene: GeneId(raw.gene.entrez),
            threshold: raw.threshold,
            direction: parse_field(&raw.direction, "threshold direction", "'above' or 'below'")?,
            control: parse_field(&raw.control, "control type", "'mirrored' or 'complement'")?,
        };
        spec.validate()?;
        Ok(spec)
    }
}

impl TryFrom<RawAnalysisRequest> for AnalysisConfig {
    type Error = AnalysisError;

    fn try_from(raw: RawAnalysisRequest) -> Result<Self, Self::Error> {
        let config = Self {
            analysis_id: raw.analysis_id,
            study_id: raw.study_id,
            profile_id: raw.profile_id,
            outcome: parse_field(&raw.outcome_id, "outcome", "'os' or 'dfs'")?,
            thresholds: raw
                .thresholds
                .into_iter()
                .map(ThresholdSpec::try_from)
                .collect::<Result<_, _>>()?,
        };
        config.validate()?;
        Ok(config)
    }
}
