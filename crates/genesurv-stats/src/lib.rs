//! Statistical building blocks for gene-stratified survival analysis.
//!
//! This crate provides the numerical core used by `genesurv-analysis`:
//!
//! - **Percentile ranks**: fractional average-rank of each observation within
//!   its population, with missing values left untouched
//! - **Kaplan-Meier**: nonparametric survival curves from right-censored data
//! - **Cox proportional hazards**: single-covariate regression with Efron tie
//!   handling, reporting the hazard ratio and its Wald p-value
//!
//! # Modules
//!
//! - [`rank`]: percentile ranking of partially observed columns
//! - [`survival`]: Kaplan-Meier survival curves for time-to-event data
//! - [`cox`]: proportional-hazards regression for a binary or continuous covariate
//!
//! # Examples
//!
//! ## Ranking a column with gaps
//!
//! ```
//! use genesurv_stats::rank::percentile_ranks;
//!
//! let ranks = percentile_ranks(&[Some(3.0), None, Some(1.0), Some(3.0)]);
//! assert_eq!(ranks, vec![Some(2.5 / 3.0), None, Some(1.0 / 3.0), Some(2.5 / 3.0)]);
//! ```
//!
//! ## Analyzing survival data
//!
//! ```
//! use genesurv_stats::survival::KaplanMeierCurve;
//!
//! // Data: (time, is_censored)
//! let data = [(10.0, false), (20.0, true), (30.0, false)];
//! let curve = KaplanMeierCurve::from_observations(&data);
//! assert_eq!(curve.survival_prob[0], 1.0);
//! ```
//!
//! ## Fitting a Cox model
//!
//! ```
//! use genesurv_stats::cox::CoxRegression;
//!
//! let times = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let events = [true, true, false, true, true, false];
//! let group = [1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
//! let fit = CoxRegression::new().fit(&times, &events, &group).unwrap();
//! assert!(fit.hazard_ratio > 0.0);
//! ```

pub mod cox;
pub mod rank;
pub mod survival;
