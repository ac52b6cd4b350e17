//! Error types
//!
//! Three channels are kept apart:
//! - [`ProviderError`] for failures inside a data provider
//! - [`AnalysisError`] for operational failures of the pipeline
//! - [`IntegrityViolation`] for broken tree invariants found by validation
//!
//! Failed derivations are not errors at all; they are recorded in the tree
//! as [`SolutionError`](super::model::SolutionError) values.

use super::arena::{SolutionId, WordFormId};
use thiserror::Error;

/// Failure reported by a provider
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// The backing store could not be reached
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Stored data is malformed
    #[error("Invalid provider data: {0}")]
    InvalidData(String),
}

/// Operational failure of an analysis
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The target entry has no text
    #[error("Entry text is empty")]
    EmptyEntry,

    /// A parameter vector of the wrong length was supplied
    #[error("Expected {expected} parameters, got {actual}")]
    InvalidParameterCount {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Import mode without a committed target
    #[error("Constraint filtering requires a target entry")]
    MissingConstraintTarget,

    /// The root form has no solution in analyze mode
    #[error("No solutions found for '{entry}'")]
    NoSolutions {
        /// Root entry text
        entry: String,
    },

    /// A provider call failed
    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),

    /// The dedicated worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Cooperative cancellation marker, never returned by `Analyzer::analyze`
    #[error("Analysis canceled")]
    Canceled,
}

impl AnalysisError {
    /// Stable message code for the failure
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::EmptyEntry => "analysis.empty_entry",
            AnalysisError::InvalidParameterCount { .. } => "analysis.invalid_parameters",
            AnalysisError::MissingConstraintTarget => "analysis.missing_target",
            AnalysisError::NoSolutions { .. } => "analysis.no_solutions",
            AnalysisError::Provider(_) => "analysis.provider",
            AnalysisError::ThreadPool(_) => "analysis.thread_pool",
            AnalysisError::Canceled => "analysis.canceled",
        }
    }

    /// Whether this is the cancellation marker
    #[inline]
    pub fn is_canceled(&self) -> bool {
        matches!(self, AnalysisError::Canceled)
    }
}

/// Result alias used by every stage
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// A broken structural invariant of a solution tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// A word form handle points outside the arena
    #[error("Word form handle {0:?} does not resolve")]
    DanglingWordForm(WordFormId),

    /// A solution handle points outside the arena
    #[error("Solution handle {0:?} does not resolve")]
    DanglingSolution(SolutionId),

    /// An error solution survived pruning
    #[error("Solution {0:?} carries an error outside debug mode")]
    ErrorSolution(SolutionId),

    /// A collapsed solution cannot be folded
    #[error("Collapsed solution {0:?} has no left part")]
    CollapsedWithoutLeft(SolutionId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AnalysisError::EmptyEntry.code(), "analysis.empty_entry");
        assert_eq!(
            AnalysisError::NoSolutions { entry: "x".into() }.code(),
            "analysis.no_solutions"
        );
        assert!(AnalysisError::Canceled.is_canceled());
    }

    #[test]
    fn test_provider_error_converts() {
        let err: AnalysisError = ProviderError::Unavailable("db".into()).into();
        assert_eq!(err.code(), "analysis.provider");
        assert_eq!(err.to_string(), "Provider failure: Provider unavailable: db");
    }
}
