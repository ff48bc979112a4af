//! Survival analysis of cohorts stratified by gene expression.
//!
//! Subjects are split into a test and a control arm by percentile thresholds
//! on one or more genes, joined with their clinical outcomes, and compared
//! with a Cox proportional-hazards model and per-arm Kaplan-Meier curves.
//!
//! # Modules
//!
//! - [`config`]: analysis configuration and the raw request it is parsed from
//! - [`data`]: clinical tables and expression matrices
//! - [`group`]: per-gene allocation and multi-gene combination
//! - [`cohort`]: joining labels with clinical outcomes
//! - [`result`]: result assembly and the response envelope
//! - [`analysis`]: the end-to-end pipeline
//! - [`provider`]: data sources injected into the pipeline
//! - [`study`]: which outcomes a study can support
//!
//! # Example
//!
//! ```
//! use genesurv_analysis::{
//!     analysis::perform_request,
//!     config::RawAnalysisRequest,
//!     provider::InMemoryProvider,
//! };
//!
//! let request: RawAnalysisRequest = serde_json::from_str(
//!     r#"{
//!         "analysisId": 1,
//!         "studyId": "brca_tcga",
//!         "profileId": "brca_tcga_mrna",
//!         "outcomeId": "os",
//!         "thresholds": [
//!             {"gene": {"entrez": 672}, "threshold": 0.75, "direction": "above", "control": "mirrored"}
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! // no data registered for the study
//! let err = perform_request(&InMemoryProvider::new(), request).unwrap_err();
//! assert!(err.is_api());
//! ```

pub mod analysis;
pub mod cohort;
pub mod config;
pub mod data;
pub mod error;
pub mod group;
pub mod provider;
pub mod result;
pub mod study;

pub use self::{
    analysis::{perform, perform_request},
    error::AnalysisError,
    result::{AnalysisResponse, AnalysisResult},
};
