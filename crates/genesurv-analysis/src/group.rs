//! Test/control group allocation from expression percentiles
//!
//! Each [`ThresholdSpec`] labels every subject from its percentile rank for
//! one gene. The per-gene labels are then AND-combined: a subject is in the
//! test group only if every gene puts it there, and likewise for control.
//!
//! # Control modes
//!
//! With `direction = Above` and `threshold = 0.75`:
//!
//! ```text
//! percentile   0 ........ 0.25 ........ 0.75 ........ 1
//! complement   |--------- control ---------|-- test --|
//! mirrored     |- control -|-- excluded ---|-- test --|
//! ```
//!
//! A percentile exactly equal to a threshold never satisfies either condition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::{ControlMode, Direction, ThresholdSpec},
    data::ExpressionMatrix,
};

/// Group membership of one subject.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
#[display(rename_all = "lowercase")]
pub enum GroupLabel {
    Test,
    Control,
    /// Out of band or ambiguous; never analysed as a third arm.
    Excluded,
}

/// A subject met both the test and the mirrored control condition.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error)]
#[display(
    "percentile {percentile} at position {index} satisfies both the test and the mirrored control condition"
)]
pub struct OverlapError {
    pub index: usize,
    pub percentile: f64,
}

fn satisfies(direction: Direction, percentile: f64, threshold: f64) -> bool {
    match direction {
        Direction::Above => percentile > threshold,
        Direction::Below => percentile < threshold,
    }
}

fn opposite(direction: Direction) -> Direction {
    match direction {
        Direction::Above => Direction::Below,
        Direction::Below => Direction::Above,
    }
}

/// Labels each percentile for one gene threshold.
///
/// Missing percentiles are labelled [`GroupLabel::Excluded`]. With
/// [`ControlMode::Complement`] every present percentile is either test or
/// control. With [`ControlMode::Mirrored`] the control condition is the
/// opposite comparison against `1 - threshold`, and a percentile satisfying
/// both conditions is reported as an [`OverlapError`].
///
/// # Examples
///
/// ```
/// use genesurv_analysis::{
///     config::{ControlMode, Direction},
///     group::{GroupLabel, allocate_group},
/// };
///
/// let percentiles = [Some(0.1), Some(0.5), Some(0.9), None];
/// let labels =
///     allocate_group(&percentiles, 0.75, Direction::Above, ControlMode::Mirrored).unwrap();
/// assert_eq!(
///     labels,
///     [GroupLabel::Control, GroupLabel::Excluded, GroupLabel::Test, GroupLabel::Excluded]
/// );
/// ```
pub fn allocate_group(
    percentiles: &[Option<f64>],
    threshold: f64,
    direction: Direction,
    control: ControlMode,
) -> Result<Vec<GroupLabel>, OverlapError> {
    percentiles
        .iter()
        .enumerate()
        .map(|(index, percentile)| {
            let Some(percentile) = *percentile else {
                return Ok(GroupLabel::Excluded);
            };
            let is_test = satisfies(direction, percentile, threshold);
            let label = match control {
                ControlMode::Complement if is_test => GroupLabel::Test,
                ControlMode::Complement => GroupLabel::Control,
                ControlMode::Mirrored => {
                    let is_control = satisfies(opposite(direction), percentile, 1.0 - threshold);
                    match (is_test, is_control) {
                        (true, true) => return Err(OverlapError { index, percentile }),
                        (true, false) => GroupLabel::Test,
                        (false, true) => GroupLabel::Control,
                        (false, false) => GroupLabel::Excluded,
                    }
                }
            };
            Ok(label)
        })
        .collect()
}

/// AND-combines per-gene label vectors subject by subject.
///
/// A subject is [`GroupLabel::Test`] only if every gene labels it test, and
/// [`GroupLabel::Control`] only if every gene labels it control. Any other mix
/// yields [`GroupLabel::Excluded`]. Without any gene there is nothing to
/// label and the result is empty.
///
/// # Panics
///
/// Panics if the label vectors differ in length.
#[must_use]
pub fn combine_labels(per_gene: &[Vec<GroupLabel>]) -> Vec<GroupLabel> {
    let Some(first) = per_gene.first() else {
        return vec![];
    };
    assert!(
        per_gene.iter().all(|labels| labels.len() == first.len()),
        "per-gene label vectors must have equal length"
    );

    (0..first.len())
        .map(|subject| {
            let mut labels = per_gene.iter().map(|labels| labels[subject]);
            let head = labels.next().unwrap_or(GroupLabel::Excluded);
            if head != GroupLabel::Excluded && labels.all(|label| label == head) {
                head
            } else {
                GroupLabel::Excluded
            }
        })
        .collect()
}

/// Applies every threshold to the matrix and AND-combines the results.
///
/// Returns the combined label of each subject in the matrix. Subjects without
/// a value for some gene end up excluded.
pub fn combine(
    matrix: &ExpressionMatrix,
    thresholds: &[ThresholdSpec],
) -> Result<BTreeMap<String, GroupLabel>, OverlapError> {
    let per_gene = thresholds
        .iter()
        .map(|spec| {
            if matrix.values(spec.gene).is_none() {
                tracing::warn!(gene = %spec.gene, "no expression values returned for gene");
            }
            allocate_group(
                &matrix.percentiles(spec.gene),
                spec.threshold,
                spec.direction,
                spec.control,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let combined = if per_gene.is_empty() {
        vec![GroupLabel::Excluded; matrix.subjects().len()]
    } else {
        combine_labels(&per_gene)
    };

    Ok(matrix.subjects().iter().cloned().zip(combined).collect())
}
