//! Clinical and molecular tables supplied by a data provider
//!
//! Both tables are keyed by subject identifier. Any clinical field and any
//! expression value may be missing for a given subject.
//!
//! # Serialization
//!
//! Clinical records and expression measurements deserialize from the shapes
//! served by cBioPortal-style providers. Numeric fields accept JSON numbers or
//! numeric strings, and status fields additionally accept coded strings such
//! as `"1:DECEASED"` or `"0:DiseaseFree"`, of which only the leading code is
//! kept.
//!
//! ```json
//! [
//!   { "subjectId": "TCGA-A1-A0SB", "osStatus": "0:LIVING", "osMonths": "43.2" },
//!   { "subjectId": "TCGA-A1-A0SD", "osStatus": 1, "osMonths": 12.0, "dfsStatus": null }
//! ]
//! ```

use std::collections::BTreeMap;

use genesurv_stats::rank::percentile_ranks;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{GeneId, OutcomeKind};

/// One subject's clinical outcome fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecord {
    #[serde(alias = "subject_id", alias = "patientId")]
    pub subject_id: String,
    #[serde(default, alias = "os_status", deserialize_with = "deserialize_status")]
    pub os_status: Option<f64>,
    #[serde(default, alias = "os_months", deserialize_with = "deserialize_number")]
    pub os_months: Option<f64>,
    #[serde(default, alias = "dfs_status", deserialize_with = "deserialize_status")]
    pub dfs_status: Option<f64>,
    #[serde(default, alias = "dfs_months", deserialize_with = "deserialize_number")]
    pub dfs_months: Option<f64>,
}

impl ClinicalRecord {
    /// Returns `(months, status)` for the selected outcome.
    #[must_use]
    pub fn outcome(&self, outcome: OutcomeKind) -> (Option<f64>, Option<f64>) {
        match outcome {
            OutcomeKind::Os => (self.os_months, self.os_status),
            OutcomeKind::Dfs => (self.dfs_months, self.dfs_status),
        }
    }
}

/// Clinical records of a study, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClinicalTable {
    pub records: Vec<ClinicalRecord>,
}

impl ClinicalTable {
    #[must_use]
    pub fn new(records: Vec<ClinicalRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest number of non-missing values found in any single clinical column.
    ///
    /// This approximates how many subjects the study could contribute before
    /// joining with molecular data.
    #[must_use]
    pub fn max_column_count(&self) -> usize {
        let columns: [fn(&ClinicalRecord) -> Option<f64>; 4] = [
            |r| r.os_status,
            |r| r.os_months,
            |r| r.dfs_status,
            |r| r.dfs_months,
        ];
        columns
            .iter()
            .map(|column| self.records.iter().filter_map(column).count())
            .max()
            .unwrap_or(0)
    }

    /// Number of subjects with a recorded duration for the outcome.
    #[must_use]
    pub fn outcome_count(&self, outcome: OutcomeKind) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome(outcome).0.is_some())
            .count()
    }
}

/// One expression value as served by a provider (long format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionMeasurement {
    #[serde(alias = "subject_id", alias = "patientId")]
    pub subject_id: String,
    #[serde(alias = "entrez_gene_id", alias = "entrez")]
    pub entrez_gene_id: GeneId,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub value: Option<f64>,
}

/// Subject-by-gene expression values with gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionMatrix {
    subjects: Vec<String>,
    columns: BTreeMap<GeneId, Vec<Option<f64>>>,
}

impl ExpressionMatrix {
    /// Pivots long-format measurements into a matrix.
    ///
    /// Subjects keep their first-seen order. A repeated `(subject, gene)` pair
    /// keeps the last value.
    pub fn from_measurements<I>(measurements: I) -> Self
    where
        I: IntoIterator<Item = ExpressionMeasurement>,
    {
        let mut matrix = Self::default();
        let mut index = BTreeMap::<String, usize>::new();

        for m in measurements {
            let row = *index.entry(m.subject_id.clone()).or_insert_with(|| {
                matrix.subjects.push(m.subject_id.clone());
                for column in matrix.columns.values_mut() {
                    column.push(None);
                }
                matrix.subjects.len() - 1
            });
            let n_subjects = matrix.subjects.len();
            let column = matrix
                .columns
                .entry(m.entrez_gene_id)
                .or_insert_with(|| vec![None; n_subjects]);
            column[row] = m.value.filter(|v| v.is_finite());
        }

        matrix
    }

    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn genes(&self) -> impl Iterator<Item = GeneId> + '_ {
        self.columns.keys().copied()
    }

    /// Raw values for a gene aligned with [`subjects`](Self::subjects), or
    /// `None` if the gene was never measured.
    #[must_use]
    pub fn values(&self, gene: GeneId) -> Option<&[Option<f64>]> {
        self.columns.get(&gene).map(Vec::as_slice)
    }

    /// Percentile rank of every subject's value for `gene`.
    ///
    /// Ranks are computed over every subject in the matrix that has a value
    /// for the gene, independent of any later cohort filtering. An unmeasured
    /// gene yields an all-missing column.
    #[must_use]
    pub fn percentiles(&self, gene: GeneId) -> Vec<Option<f64>> {
        match self.values(gene) {
            Some(values) => percentile_ranks(values),
            None => vec![None; self.subjects.len()],
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn parse_number_text(text: &str) -> Result<Option<f64>, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || ["na", "nan"].iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(|n| Some(n).filter(|n| n.is_finite()))
        .map_err(|_| format!("invalid number: '{text}'"))
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n).filter(|n| n.is_finite())),
        Some(NumberOrText::Text(text)) => {
            parse_number_text(&text).map_err(serde::de::Error::custom)
        }
    }
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => {
            let code = text.split(':').next().unwrap_or_default().trim();
            if code.is_empty() {
                return Ok(None);
            }
            code.parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid status: '{text}'")))
        }
    }
}
