/// Computes the percentile rank of each observed value in a column.
///
/// Each non-missing value receives `rank / n`, where `rank` is its 1-based
/// position in ascending order and `n` is the number of non-missing values.
/// Tied values share the average of the ranks they span. Missing entries
/// (`None` or NaN) are skipped when ranking and stay `None` in the output.
///
/// Every returned rank lies in `(0, 1]`; the largest value ranks exactly 1.
///
/// # Examples
///
/// ```
/// use genesurv_stats::rank::percentile_ranks;
///
/// let ranks = percentile_ranks(&[Some(0.8), Some(0.8), Some(0.5), Some(0.9)]);
/// assert_eq!(ranks, vec![Some(0.625), Some(0.625), Some(0.25), Some(1.0)]);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn percentile_ranks(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut observed = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| !x.is_nan()).map(|x| (i, x)))
        .collect::<Vec<_>>();
    observed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let n = observed.len() as f64;
    let mut ranks = vec![None; values.len()];

    let mut i = 0;
    while i < observed.len() {
        let value = observed[i].1;
        let mut j = i;
        while j < observed.len() && observed[j].1.total_cmp(&value).is_eq() {
            j += 1;
        }

        // positions i..j hold 1-based ranks i+1..=j
        let average_rank = (i + 1 + j) as f64 / 2.0;
        for &(index, _) in &observed[i..j] {
            ranks[index] = Some(average_rank / n);
        }

        i = j;
    }

    ranks
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_empty_column() {
        assert!(percentile_ranks(&[]).is_empty());
        assert_eq!(percentile_ranks(&[None, None]), vec![None, None]);
    }

    #[test]
    fn test_distinct_values() {
        let ranks = percentile_ranks(&[Some(3.0), Some(1.0), Some(2.0), Some(4.0)]);
        assert_eq!(ranks, vec![Some(0.75), Some(0.25), Some(0.5), Some(1.0)]);
    }

    #[test]
    fn test_ties_use_average_rank() {
        let column = [0.8, 0.8, 0.5, 0.9, 0.2, 0.0].map(Some);
        let ranks = percentile_ranks(&column);
        let expected = [0.75, 0.75, 0.5, 1.0, 2.0 / 6.0, 1.0 / 6.0];
        for (rank, expected) in ranks.iter().zip(expected) {
            assert_relative_eq!(rank.unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_missing_values_are_not_ranked() {
        let ranks = percentile_ranks(&[Some(2.0), None, Some(f64::NAN), Some(1.0)]);
        assert_eq!(ranks, vec![Some(1.0), None, None, Some(0.5)]);
    }

    proptest! {
        #[test]
        fn ranks_stay_in_unit_interval(
            column in prop::collection::vec(prop::option::of(-1e6..1e6f64), 0..64),
        ) {
            let ranks = percentile_ranks(&column);
            prop_assert_eq!(ranks.len(), column.len());
            for (value, rank) in column.iter().zip(&ranks) {
                prop_assert_eq!(value.is_some(), rank.is_some());
                if let Some(rank) = rank {
                    prop_assert!(*rank > 0.0 && *rank <= 1.0);
                }
            }
        }
    }
}
