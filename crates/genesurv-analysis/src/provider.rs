//! Sources of clinical and molecular data
//!
//! The orchestrator receives a [`DataProvider`] per call instead of reaching
//! for a global client, so tests and concurrent callers can each bring their
//! own.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};

use crate::{
    config::GeneId,
    data::{ClinicalTable, ExpressionMatrix, ExpressionMeasurement},
};

/// Collaborator serving study data.
pub trait DataProvider {
    /// Clinical outcome fields of every subject in the study.
    fn clinical_data(&self, study_id: &str) -> anyhow::Result<ClinicalTable>;

    /// Expression values of `genes` for every subject in the profile.
    fn molecular_data(&self, genes: &[GeneId], profile_id: &str)
    -> anyhow::Result<ExpressionMatrix>;
}

fn select_genes<'a, I>(measurements: I, genes: &[GeneId]) -> ExpressionMatrix
where
    I: IntoIterator<Item = &'a ExpressionMeasurement>,
{
    let wanted = genes.iter().copied().collect::<HashSet<_>>();
    ExpressionMatrix::from_measurements(
        measurements
            .into_iter()
            .filter(|m| wanted.contains(&m.entrez_gene_id))
            .cloned(),
    )
}

/// Provider backed by tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    clinical: BTreeMap<String, ClinicalTable>,
    molecular: BTreeMap<String, Vec<ExpressionMeasurement>>,
}

impl InMemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clinical(mut self, study_id: impl Into<String>, table: ClinicalTable) -> Self {
        self.clinical.insert(study_id.into(), table);
        self
    }

    #[must_use]
    pub fn with_molecular(
        mut self,
        profile_id: impl Into<String>,
        measurements: Vec<ExpressionMeasurement>,
    ) -> Self {
        self.molecular.insert(profile_id.into(), measurements);
        self
    }
}

impl DataProvider for InMemoryProvider {
    fn clinical_data(&self, study_id: &str) -> anyhow::Result<ClinicalTable> {
        self.clinical
            .get(study_id)
            .cloned()
            .with_context(|| format!("unknown study: {study_id}"))
    }

    fn molecular_data(
        &self,
        genes: &[GeneId],
        profile_id: &str,
    ) -> anyhow::Result<ExpressionMatrix> {
        let measurements = self
            .molecular
            .get(profile_id)
            .with_context(|| format!("unknown molecular profile: {profile_id}"))?;
        Ok(select_genes(measurements, genes))
    }
}

/// Provider reading a prefetched data directory.
///
/// ```text
/// <root>/clinical/<study_id>.json     array of clinical records
/// <root>/molecular/<profile_id>.json  array of expression measurements
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    root: PathBuf,
}

impl JsonFileProvider {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, kind: &str, id: &str) -> anyhow::Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            bail!("invalid {kind} identifier: '{id}'");
        }
        Ok(self.root.join(kind).join(format!("{id}.json")))
    }

    fn read_json<T>(path: &Path) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON file: {}", path.display()))
    }
}

impl DataProvider for JsonFileProvider {
    fn clinical_data(&self, study_id: &str) -> anyhow::Result<ClinicalTable> {
        let path = self.path_for("clinical", study_id)?;
        tracing::debug!(path = %path.display(), "reading clinical data");
        Self::read_json(&path)
    }

    fn molecular_data(
        &self,
        genes: &[GeneId],
        profile_id: &str,
    ) -> anyhow::Result<ExpressionMatrix> {
        let path = self.path_for("molecular", profile_id)?;
        tracing::debug!(path = %path.display(), "reading molecular data");
        let measurements: Vec<ExpressionMeasurement> = Self::read_json(&path)?;
        Ok(select_genes(&measurements, genes))
    }
}
