//! Joining group labels with clinical outcomes

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::{config::OutcomeKind, data::ClinicalTable, group::GroupLabel};

/// Outcome status of one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::IsVariant)]
#[serde(into = "u8")]
pub enum EventStatus {
    Censored,
    Event,
}

impl EventStatus {
    #[expect(clippy::float_cmp)]
    fn from_code(code: f64) -> Option<Self> {
        if code == 0.0 {
            Some(Self::Censored)
        } else if code == 1.0 {
            Some(Self::Event)
        } else {
            None
        }
    }
}

impl From<EventStatus> for u8 {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Censored => 0,
            EventStatus::Event => 1,
        }
    }
}

/// One of the two analysed arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, derive_more::IsVariant)]
#[serde(into = "u8")]
pub enum Arm {
    Control,
    Test,
}

impl Arm {
    fn from_label(label: GroupLabel) -> Option<Self> {
        match label {
            GroupLabel::Test => Some(Self::Test),
            GroupLabel::Control => Some(Self::Control),
            GroupLabel::Excluded => None,
        }
    }
}

impl From<Arm> for u8 {
    fn from(arm: Arm) -> Self {
        match arm {
            Arm::Control => 0,
            Arm::Test => 1,
        }
    }
}

/// A subject with complete outcome data in the test or control arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortRow {
    pub subject_id: String,
    pub months: f64,
    pub status: EventStatus,
    pub group: Arm,
}

/// Inner-joins clinical records with combined labels for one outcome.
///
/// Rows follow clinical order. A record is dropped when its months, status or
/// label is missing, when its label is [`GroupLabel::Excluded`], when months
/// is negative or not finite, or when status is not `0` or `1`.
#[must_use]
pub fn join_cohort(
    clinical: &ClinicalTable,
    labels: &BTreeMap<String, GroupLabel>,
    outcome: OutcomeKind,
) -> Vec<CohortRow> {
    clinical
        .records
        .iter()
        .filter_map(|record| {
            let group = labels.get(&record.subject_id).copied().and_then(Arm::from_label)?;
            let (Some(months), Some(status)) = record.outcome(outcome) else {
                return None;
            };
            if !months.is_finite() || months < 0.0 {
                warn!(
                    subject = %record.subject_id,
                    months,
                    "dropping subject with invalid duration"
                );
                return None;
            }
            let Some(status) = EventStatus::from_code(status) else {
                warn!(subject = %record.subject_id, status, "dropping subject with invalid status");
                return None;
            };
            Some(CohortRow {
                subject_id: record.subject_id.clone(),
                months,
                status,
                group,
            })
        })
        .collect()
}
