use serde::Serialize;

use crate::analysis::MIN_COHORT_SIZE;

/// Failure of one analysis invocation.
///
/// Every variant is terminal. User-facing messages for upstream and fitting
/// failures stay generic; the underlying cause is kept in `debug`.
#[derive(
    Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::IsVariant,
)]
pub enum AnalysisError {
    #[display("{message}")]
    Validation {
        #[error(not(source))]
        message: String,
    },
    #[display("There was an API error. Let us know.")]
    Api {
        #[error(not(source))]
        debug: String,
    },
    #[display(
        "There was insufficient data to perform the analysis (n={count} after joining clinical data with available molecular data)."
    )]
    InsufficientData { count: usize },
    #[display("Performing the Cox Proportional Hazards analysis failed during fitting.")]
    ModelFitting {
        #[error(not(source))]
        debug: String,
    },
}

/// Wire tag of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Api,
    Data,
    Model,
    Validation,
}

impl AnalysisError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn api(debug: impl Into<String>) -> Self {
        Self::Api {
            debug: debug.into(),
        }
    }

    pub fn model_fitting(debug: impl Into<String>) -> Self {
        Self::ModelFitting {
            debug: debug.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Api { .. } => ErrorKind::Api,
            Self::InsufficientData { .. } => ErrorKind::Data,
            Self::ModelFitting { .. } => ErrorKind::Model,
        }
    }

    /// Diagnostic detail that is not shown in the user-facing message.
    #[must_use]
    pub fn debug(&self) -> String {
        match self {
            Self::Api { debug } | Self::ModelFitting { debug } => debug.clone(),
            Self::InsufficientData { count } => {
                format!("cohort size {count} is below the minimum of {MIN_COHORT_SIZE}")
            }
            Self::Validation { .. } => String::new(),
        }
    }

    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            debug: self.debug(),
        }
    }
}

/// Serializable form of an [`AnalysisError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub debug: String,
}
