//! Morphtree - Morphological Word-Form Analysis
//!
//! Decomposes a word form into rated trees of candidate derivations. Each
//! solution explains a form either as a dictionary entry or as a rule
//! applied across a sandhi boundary to a left and a right part, which are
//! analysed recursively. It provides:
//! - Recursive, memoized decomposition over pluggable providers
//! - Arena storage with copy-on-write node derivation
//! - Collapsing, filtering, parameter propagation and deduplication passes
//! - Rating and ordering of the surviving solutions
//! - Cooperative cancellation and depth progress reporting
//! - Optional parallel fan-out on a dedicated worker pool
//! - Developer tools (tree printer, DOT export)
//!
//! ## Quick Start
//!
//! ```rust
//! use morphtree::prelude::*;
//! use std::sync::Arc;
//!
//! let stem = MorphEntry::new("kat").with_id(1).with_base(MorphBase::None);
//! // "-a" plural: the stem is the left part, the suffix is dropped
//! let mut plural = MorphRule::new(10, "");
//! plural.left_type = MorphRuleType::Copy;
//! plural.base = MorphBase::Left;
//!
//! let providers = Providers::new(
//!     Arc::new(InMemoryDictionary::new(vec![stem])),
//!     Arc::new(InMemoryRules::new(vec![plural], vec![SandhiMatch::new("a", "", "a")])),
//!     Arc::new(InMemoryCombinations::permissive()),
//!     Arc::new(FrequencyTable::new()),
//! );
//! let analyzer = Analyzer::new(providers, AnalyzerConfig::default()).unwrap();
//! let outcome = analyzer
//!     .analyze(&AnalysisRequest::new(MorphEntry::new("kata")), &CancellationToken::new())
//!     .unwrap();
//!
//! let tree = outcome.into_tree().unwrap();
//! assert!(tree.dictionary_ids().contains(&1));
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Fan stages out on a rayon worker pool (default)
//! - `logging` - Enable debug logging using the `log` crate (default)

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]
#![allow(clippy::redundant_closure)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

// Analysis engine
pub mod engine;

/// Re-export commonly used types for convenience
pub use engine::{
    // Debug tools
    debug::TreePrinter,
    // Errors
    error::{AnalysisError, AnalysisResult, IntegrityViolation, ProviderError},
    // Pipeline
    pipeline::{AnalysisOutcome, AnalysisRequest, Analyzer, SolutionTree},
    AnalyzerConfig,
    CancellationToken,
    MorphBase,
    MorphEntry,
    MorphRule,
    ParameterVector,
    ParsingMode,
    Providers,
    SandhiMatch,
    Solution,
    SolutionArena,
    SolutionError,
    WordForm,
};
