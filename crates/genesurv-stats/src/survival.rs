/// Kaplan-Meier survival curve for survival analysis.
///
/// The Kaplan-Meier estimator is a non-parametric statistic used to estimate the survival
/// function from lifetime data. It accounts for censored data (observations where the event
/// of interest has not occurred by the end of the study period).
///
/// # Fields
///
/// The curve stores parallel vectors describing a right-continuous step function. There is
/// one entry per distinct observed time, whether an event or a censoring happened there, so
/// censored times can be overlaid on the curve. When no observation sits at time zero, the
/// curve opens with an origin entry `(0.0, 1.0)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KaplanMeierCurve {
    /// Distinct observed times in ascending order.
    pub times: Vec<f64>,
    /// Survival probability just after each corresponding time point.
    /// Values range from 0.0 (no survival) to 1.0 (complete survival).
    pub survival_prob: Vec<f64>,
    /// Number of subjects at risk (time >= this time point) at each time point.
    pub at_risk: Vec<usize>,
    /// Number of events (non-censored observations) at each time point.
    pub events: Vec<usize>,
    /// Number of censored observations at each time point.
    pub censored: Vec<usize>,
}

impl KaplanMeierCurve {
    /// Computes the Kaplan-Meier survival curve from survival data.
    ///
    /// # Arguments
    ///
    /// * `data` - A slice of tuples where each tuple contains:
    ///   - `time`: The time at which the observation ended
    ///   - `is_censored`: `true` if the observation was censored (event did not occur),
    ///     `false` if the event occurred
    ///
    /// An empty input yields an empty curve.
    ///
    /// # Examples
    ///
    /// ```
    /// # use genesurv_stats::survival::KaplanMeierCurve;
    /// let data = [(10.0, false), (20.0, true), (30.0, false)];
    /// let curve = KaplanMeierCurve::from_observations(&data);
    /// assert_eq!(curve.times, vec![0.0, 10.0, 20.0, 30.0]);
    /// assert_eq!(curve.censored, vec![0, 0, 1, 0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_observations(data: &[(f64, bool)]) -> Self {
        let mut curve = Self::default();
        if data.is_empty() {
            return curve;
        }

        let mut data = data.to_vec();
        data.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = data.len();
        if data[0].0 > 0.0 {
            curve.push(0.0, 1.0, total, 0, 0);
        }

        let mut current_survival = 1.0;
        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].0;
            let at_risk = total - i;

            let mut event_count = 0;
            let mut censored_count = 0;
            let mut j = i;
            while j < data.len() && data[j].0.total_cmp(&current_time).is_eq() {
                if data[j].1 {
                    censored_count += 1;
                } else {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                current_survival *= 1.0 - (event_count as f64 / at_risk as f64);
            }
            curve.push(
                current_time,
                current_survival,
                at_risk,
                event_count,
                censored_count,
            );

            i = j;
        }

        curve
    }

    fn push(&mut self, time: f64, prob: f64, at_risk: usize, events: usize, censored: usize) {
        self.times.push(time);
        self.survival_prob.push(prob);
        self.at_risk.push(at_risk);
        self.events.push(events);
        self.censored.push(censored);
    }

    /// Returns the number of points on the curve.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns `true` if the curve was built from no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterates over `(time, survival_prob)` pairs in time order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.survival_prob.iter().copied())
    }

    /// Returns the median survival time.
    ///
    /// This is the first time at which the step function drops to or below 50%.
    /// Returns `None` if the survival probability never reaches 50%.
    ///
    /// # Examples
    ///
    /// ```
    /// # use genesurv_stats::survival::KaplanMeierCurve;
    /// let data = [(10.0, false), (20.0, true), (30.0, false), (40.0, false)];
    /// let curve = KaplanMeierCurve::from_observations(&data);
    /// assert_eq!(curve.median_survival(), Some(30.0));
    /// ```
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        self.points()
            .find(|(_, prob)| *prob <= 0.5)
            .map(|(time, _)| time)
    }

}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_empty_data() {
        let curve = KaplanMeierCurve::from_observations(&[]);
        assert!(curve.is_empty());
        assert_eq!(curve.median_survival(), None);
    }

    #[test]
    fn test_textbook_example() {
        // 6 subjects: events at 3, 5 (x2), 9; censored at 5 and 12
        let data = [
            (3.0, false),
            (5.0, false),
            (5.0, false),
            (5.0, true),
            (9.0, false),
            (12.0, true),
        ];
        let curve = KaplanMeierCurve::from_observations(&data);

        assert_eq!(curve.times, vec![0.0, 3.0, 5.0, 9.0, 12.0]);
        assert_eq!(curve.at_risk, vec![6, 6, 5, 2, 1]);
        assert_eq!(curve.events, vec![0, 1, 2, 1, 0]);
        assert_eq!(curve.censored, vec![0, 0, 1, 0, 1]);

        let s3 = 5.0 / 6.0;
        let s5 = s3 * (3.0 / 5.0);
        let s9 = s5 * 0.5;
        let expected = [1.0, s3, s5, s9, s9];
        for (prob, expected) in curve.survival_prob.iter().zip(expected) {
            assert_relative_eq!(*prob, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_curve_is_non_increasing() {
        let data = [
            (1.5, true),
            (2.0, false),
            (2.0, true),
            (4.0, false),
            (7.25, true),
            (8.0, false),
        ];
        let curve = KaplanMeierCurve::from_observations(&data);
        assert_eq!(curve.survival_prob[0], 1.0);
        assert!(curve.survival_prob.windows(2).all(|w| w[1] <= w[0]));
        assert!(curve.times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_event_at_time_zero() {
        let data = [(0.0, false), (1.0, false), (2.0, true), (3.0, false)];
        let curve = KaplanMeierCurve::from_observations(&data);
        assert_eq!(curve.times[0], 0.0);
        assert_relative_eq!(curve.survival_prob[0], 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_all_censored_stays_at_one() {
        let data = [(1.0, true), (2.0, true), (3.0, true)];
        let curve = KaplanMeierCurve::from_observations(&data);
        assert!(curve.survival_prob.iter().all(|p| *p == 1.0));
        assert_eq!(curve.median_survival(), None);
    }
}
