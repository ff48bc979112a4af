//! Cox proportional-hazards regression for a single covariate.
//!
//! The partial likelihood uses Efron's approximation for tied event times and
//! is maximized by Newton-Raphson with step halving, starting from `beta = 0`.
//! The covariate is centered before fitting; centering leaves the coefficient
//! unchanged but keeps `exp(beta * x)` well scaled.
//!
//! Significance is reported as a two-sided Wald test against a standard
//! normal distribution.

use statrs::distribution::{ContinuousCDF, Normal};

/// Coefficient magnitude past which the likelihood is treated as monotone
/// (complete separation) rather than converging.
const MAX_ABS_COEFFICIENT: f64 = 30.0;

const MAX_STEP_HALVINGS: usize = 30;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum CoxError {
    #[display("no observations to fit")]
    EmptyData,
    #[display("input lengths differ: {times} times, {events} events, {covariate} covariate values")]
    LengthMismatch {
        times: usize,
        events: usize,
        covariate: usize,
    },
    #[display("invalid survival time {time} at index {index}")]
    InvalidTime { index: usize, time: f64 },
    #[display("covariate has no variance; the design matrix is singular")]
    NoVariance,
    #[display("no events observed; the partial likelihood is flat")]
    NoEvents,
    #[display("convergence halted after {iterations} iterations (coefficient {coefficient})")]
    DidNotConverge { iterations: usize, coefficient: f64 },
    #[display("numerical failure: {message}")]
    Numerical { message: String },
}

impl CoxError {
    fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }
}

/// Fitted single-covariate Cox model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoxFit {
    /// Estimated log hazard ratio.
    pub coefficient: f64,
    /// Standard error of the coefficient from the observed information.
    pub standard_error: f64,
    /// `exp(coefficient)`.
    pub hazard_ratio: f64,
    /// Wald statistic `coefficient / standard_error`.
    pub z: f64,
    /// Two-sided Wald p-value.
    pub p_value: f64,
    /// Partial log-likelihood at the estimate.
    pub log_likelihood: f64,
    /// Newton iterations performed.
    pub iterations: usize,
}

impl CoxFit {
    /// Confidence interval for the hazard ratio at the given two-sided level.
    ///
    /// # Examples
    ///
    /// ```
    /// use genesurv_stats::cox::CoxRegression;
    ///
    /// let times = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let events = [true, true, false, true, true, false];
    /// let group = [1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
    /// let fit = CoxRegression::new().fit(&times, &events, &group).unwrap();
    /// let (lower, upper) = fit.hazard_ratio_interval(0.95);
    /// assert!(lower < fit.hazard_ratio && fit.hazard_ratio < upper);
    /// ```
    #[must_use]
    pub fn hazard_ratio_interval(&self, level: f64) -> (f64, f64) {
        let z = Normal::standard().inverse_cdf(0.5 + level / 2.0);
        (
            (self.coefficient - z * self.standard_error).exp(),
            (self.coefficient + z * self.standard_error).exp(),
        )
    }
}

/// Cox regression settings.
#[derive(Debug, Clone, Copy)]
pub struct CoxRegression {
    max_iterations: usize,
    tolerance: f64,
}

impl Default for CoxRegression {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-9,
        }
    }
}

/// Partial log-likelihood with its first derivative and the observed information.
#[derive(Debug, Clone, Copy)]
struct Derivatives {
    log_likelihood: f64,
    score: f64,
    information: f64,
}

impl CoxRegression {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fits the model to durations, event indicators and one covariate.
    ///
    /// `events[i]` is `true` when subject `i` experienced the event and
    /// `false` when it was censored at `times[i]`.
    #[expect(clippy::cast_precision_loss)]
    pub fn fit(
        &self,
        times: &[f64],
        events: &[bool],
        covariate: &[f64],
    ) -> Result<CoxFit, CoxError> {
        if times.len() != events.len() || times.len() != covariate.len() {
            return Err(CoxError::LengthMismatch {
                times: times.len(),
                events: events.len(),
                covariate: covariate.len(),
            });
        }
        if times.is_empty() {
            return Err(CoxError::EmptyData);
        }
        if let Some((index, &time)) = times
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_finite() || **t < 0.0)
        {
            return Err(CoxError::InvalidTime { index, time });
        }
        if covariate.iter().any(|x| !x.is_finite()) {
            return Err(CoxError::numerical("covariate contains non-finite values"));
        }
        if !events.iter().any(|e| *e) {
            return Err(CoxError::NoEvents);
        }

        let mean = covariate.iter().sum::<f64>() / covariate.len() as f64;
        let centered = covariate.iter().map(|x| x - mean).collect::<Vec<_>>();
        if centered.iter().all(|x| x.abs() < f64::EPSILON) {
            return Err(CoxError::NoVariance);
        }

        let data = RiskData::new(times, events, &centered);

        let mut beta = 0.0;
        let mut current = data.derivatives(beta);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;
            if !(current.information.is_finite() && current.information > 0.0) {
                return Err(CoxError::numerical(format!(
                    "observed information is {} at coefficient {beta}",
                    current.information
                )));
            }

            let mut step = current.score / current.information;
            let mut candidate = data.derivatives(beta + step);
            let mut halvings = 0;
            while !(candidate.log_likelihood.is_finite()
                && candidate.log_likelihood >= current.log_likelihood - self.tolerance)
            {
                if halvings == MAX_STEP_HALVINGS {
                    return Err(CoxError::numerical(
                        "step halving failed to improve the partial likelihood",
                    ));
                }
                step /= 2.0;
                candidate = data.derivatives(beta + step);
                halvings += 1;
            }

            beta += step;
            current = candidate;

            if beta.abs() > MAX_ABS_COEFFICIENT {
                break;
            }
            if step.abs() < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(CoxError::DidNotConverge {
                iterations,
                coefficient: beta,
            });
        }
        if !(current.information.is_finite() && current.information > 0.0) {
            return Err(CoxError::numerical(
                "observed information is not positive at the estimate",
            ));
        }

        let standard_error = current.information.sqrt().recip();
        let z = beta / standard_error;
        let p_value = (2.0 * Normal::standard().sf(z.abs())).clamp(0.0, 1.0);
        let hazard_ratio = beta.exp();
        if !(hazard_ratio.is_finite() && p_value.is_finite()) {
            return Err(CoxError::numerical(format!(
                "non-finite estimate: hazard ratio {hazard_ratio}, p-value {p_value}"
            )));
        }

        Ok(CoxFit {
            coefficient: beta,
            standard_error,
            hazard_ratio,
            z,
            p_value,
            log_likelihood: current.log_likelihood,
            iterations,
        })
    }
}

/// Subjects grouped by distinct time, latest first, so the risk set can be
/// accumulated while walking backwards in time.
#[derive(Debug)]
struct RiskData {
    /// `(covariate, is_event)` per subject, grouped by time in descending order.
    blocks: Vec<Vec<(f64, bool)>>,
}

impl RiskData {
    fn new(times: &[f64], events: &[bool], covariate: &[f64]) -> Self {
        let mut order = (0..times.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| times[b].total_cmp(&times[a]));

        let mut blocks: Vec<Vec<(f64, bool)>> = vec![];
        let mut last_time: Option<f64> = None;
        for i in order {
            let entry = (covariate[i], events[i]);
            let same_time = last_time.is_some_and(|t| times[i].total_cmp(&t).is_eq());
            match blocks.last_mut() {
                Some(block) if same_time => block.push(entry),
                _ => blocks.push(vec![entry]),
            }
            last_time = Some(times[i]);
        }

        Self { blocks }
    }

    #[expect(clippy::cast_precision_loss)]
    fn derivatives(&self, beta: f64) -> Derivatives {
        let mut log_likelihood = 0.0;
        let mut score = 0.0;
        let mut information = 0.0;

        // running risk-set sums of w, w*x, w*x^2 with w = exp(beta * x)
        let (mut s0, mut s1, mut s2) = (0.0, 0.0, 0.0);

        for block in &self.blocks {
            let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
            let mut event_count = 0usize;
            let mut event_x_sum = 0.0;

            for &(x, is_event) in block {
                let w = (beta * x).exp();
                s0 += w;
                s1 += w * x;
                s2 += w * x * x;
                if is_event {
                    t0 += w;
                    t1 += w * x;
                    t2 += w * x * x;
                    event_count += 1;
                    event_x_sum += x;
                }
            }

            if event_count == 0 {
                continue;
            }

            log_likelihood += beta * event_x_sum;
            score += event_x_sum;

            let m = event_count as f64;
            for l in 0..event_count {
                let fraction = l as f64 / m;
                let d0 = s0 - fraction * t0;
                let d1 = s1 - fraction * t1;
                let d2 = s2 - fraction * t2;
                let mean = d1 / d0;

                log_likelihood -= d0.ln();
                score -= mean;
                information += d2 / d0 - mean * mean;
            }
        }

        Derivatives {
            log_likelihood,
            score,
            information,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn sample_cohort() -> (Vec<f64>, Vec<bool>, Vec<f64>) {
        let times = vec![
            2.0, 3.5, 4.0, 4.0, 6.0, 7.5, 9.0, 11.0, 12.0, 15.0, 3.0, 5.0, 8.0, 10.0, 13.0, 13.0,
            16.0, 18.5, 21.0, 24.0,
        ];
        let events = vec![
            true, true, false, true, true, true, false, true, true, false, true, false, true,
            true, true, false, true, false, true, false,
        ];
        let group = [[1.0; 10], [0.0; 10]].concat();
        (times, events, group)
    }

    #[test]
    fn test_score_vanishes_at_estimate() {
        let (times, events, group) = sample_cohort();
        let fit = CoxRegression::new().fit(&times, &events, &group).unwrap();

        let mean = group.iter().sum::<f64>() / group.len() as f64;
        let centered = group.iter().map(|x| x - mean).collect::<Vec<_>>();
        let derivatives = RiskData::new(&times, &events, &centered).derivatives(fit.coefficient);

        assert_relative_eq!(derivatives.score, 0.0, epsilon = 1e-6);
        assert_relative_eq!(fit.hazard_ratio, fit.coefficient.exp(), epsilon = 1e-12);
        assert!(fit.hazard_ratio > 1.0, "early-failing arm should carry the higher hazard");
        assert!((0.0..=1.0).contains(&fit.p_value));
    }

    #[test]
    fn test_swapping_groups_inverts_hazard_ratio() {
        let (times, events, group) = sample_cohort();
        let flipped = group.iter().map(|x| 1.0 - x).collect::<Vec<_>>();

        let fit = CoxRegression::new().fit(&times, &events, &group).unwrap();
        let flipped_fit = CoxRegression::new().fit(&times, &events, &flipped).unwrap();

        assert_relative_eq!(fit.coefficient, -flipped_fit.coefficient, epsilon = 1e-7);
        assert_relative_eq!(fit.p_value, flipped_fit.p_value, epsilon = 1e-7);
    }

    #[test]
    fn test_identical_arms_give_unit_hazard() {
        let times = [1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0];
        let events = [true, false, true, true, true, false, true, true];
        let group = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let fit = CoxRegression::new().fit(&times, &events, &group).unwrap();

        assert_relative_eq!(fit.coefficient, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fit.hazard_ratio, 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.p_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_confidence_interval_brackets_estimate() {
        let (times, events, group) = sample_cohort();
        let fit = CoxRegression::new().fit(&times, &events, &group).unwrap();
        let (lower, upper) = fit.hazard_ratio_interval(0.95);
        assert!(lower < fit.hazard_ratio && fit.hazard_ratio < upper);
        assert_relative_eq!(
            upper.ln() - fit.coefficient,
            1.959_963_984_540_054 * fit.standard_error,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_single_arm_is_singular() {
        let times = [1.0, 2.0, 3.0];
        let events = [true, true, false];
        let group = [1.0, 1.0, 1.0];
        assert_eq!(
            CoxRegression::new().fit(&times, &events, &group),
            Err(CoxError::NoVariance)
        );
    }

    #[test]
    fn test_no_events() {
        let times = [1.0, 2.0, 3.0];
        let events = [false, false, false];
        let group = [1.0, 0.0, 1.0];
        assert_eq!(
            CoxRegression::new().fit(&times, &events, &group),
            Err(CoxError::NoEvents)
        );
    }

    #[test]
    fn test_empty_and_mismatched_input() {
        assert_eq!(
            CoxRegression::new().fit(&[], &[], &[]),
            Err(CoxError::EmptyData)
        );
        assert!(matches!(
            CoxRegression::new().fit(&[1.0, 2.0], &[true], &[0.0, 1.0]),
            Err(CoxError::LengthMismatch { .. })
        ));
        assert!(matches!(
            CoxRegression::new().fit(&[1.0, -2.0], &[true, true], &[0.0, 1.0]),
            Err(CoxError::InvalidTime { index: 1, .. })
        ));
    }

    #[test]
    fn test_complete_separation_does_not_converge() {
        // every treated subject fails before any control subject is at risk of failing
        let times = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let events = [true, true, true, true, true, true];
        let group = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        assert!(matches!(
            CoxRegression::new().fit(&times, &events, &group),
            Err(CoxError::DidNotConverge { .. } | CoxError::Numerical { .. })
        ));
    }
}
