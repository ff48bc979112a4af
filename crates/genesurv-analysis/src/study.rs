//! Outcome eligibility of a study

use crate::{config::OutcomeKind, data::ClinicalTable};

/// Subjects with a recorded duration an outcome needs before it is offered.
pub const MIN_OUTCOME_CASES: usize = 40;

/// Outcomes with at least [`MIN_OUTCOME_CASES`] recorded durations, with
/// their counts.
///
/// # Examples
///
/// ```
/// use genesurv_analysis::{
///     config::OutcomeKind,
///     data::{ClinicalRecord, ClinicalTable},
///     study::valid_outcomes,
/// };
///
/// let table = ClinicalTable::new(
///     (0..45)
///         .map(|i| ClinicalRecord {
///             subject_id: format!("s{i}"),
///             os_months: Some(10.0),
///             dfs_months: (i < 30).then_some(5.0),
///             ..ClinicalRecord::default()
///         })
///         .collect(),
/// );
/// assert_eq!(valid_outcomes(&table), [(OutcomeKind::Os, 45)]);
/// ```
#[must_use]
pub fn valid_outcomes(clinical: &ClinicalTable) -> Vec<(OutcomeKind, usize)> {
    OutcomeKind::ALL
        .into_iter()
        .map(|kind| (kind, clinical.outcome_count(kind)))
        .filter(|(_, count)| *count >= MIN_OUTCOME_CASES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ClinicalRecord;

    #[test]
    fn test_boundary_is_inclusive() {
        let table = |n: usize| {
            ClinicalTable::new(
                (0..n)
                    .map(|i| ClinicalRecord {
                        subject_id: i.to_string(),
                        os_months: Some(1.0),
                        dfs_months: Some(1.0),
                        ..ClinicalRecord::default()
                    })
                    .collect(),
            )
        };
        assert!(valid_outcomes(&table(MIN_OUTCOME_CASES - 1)).is_empty());
        assert_eq!(valid_outcomes(&table(MIN_OUTCOME_CASES)), [
            (OutcomeKind::Os, MIN_OUTCOME_CASES),
            (OutcomeKind::Dfs, MIN_OUTCOME_CASES),
        ]);
    }
}
