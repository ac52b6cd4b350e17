//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from morphtree.
//! Importing this module with a wildcard import brings the core types into scope:
//!
//! ```
//! use morphtree::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Pipeline
//! - [`Analyzer`] - Runs analyses against a set of providers
//! - [`AnalysisRequest`] - One analysis request
//! - [`AnalysisOutcome`] - Completed tree or cancellation
//! - [`SolutionTree`] - Result of a completed analysis
//!
//! ## Data Model
//! - [`MorphEntry`] - Dictionary or target entry
//! - [`MorphRule`] - Grammatical rule
//! - [`SandhiMatch`] - Observed sandhi boundary
//! - [`ParameterVector`] - Grammatical parameter slots
//! - [`Solution`] / [`WordForm`] - Tree nodes
//!
//! ## Providers
//! - [`Providers`] - Provider bundle
//! - [`InMemoryDictionary`], [`InMemoryRules`], [`InMemoryCombinations`], [`FrequencyTable`]
//!
//! ## Error Handling
//! - [`AnalysisError`] - Operational failure
//! - [`SolutionError`] - Recorded outcome of a derivation

// ============================================================================
// Pipeline
// ============================================================================

pub use crate::engine::pipeline::{AnalysisOutcome, AnalysisRequest, Analyzer, SolutionTree};

// ============================================================================
// Data Model
// ============================================================================

pub use crate::engine::arena::{Solution, SolutionArena, SolutionId, WordForm, WordFormId};
pub use crate::engine::model::{
    EntrySource, EntryTemplate, MorphBase, MorphEntry, MorphRule, MorphRuleType, SandhiGroup,
    SandhiMatch, SolutionContent, SolutionError,
};
pub use crate::engine::parameters::{ParameterVector, PARAMETER_COUNT};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::engine::config::{AnalyzerConfig, ChronologicalLayer, ParallelConfig, ParsingMode};
pub use crate::engine::context::CancellationToken;

// ============================================================================
// Providers
// ============================================================================

pub use crate::engine::memory::{
    FrequencyTable, InMemoryCombinations, InMemoryDictionary, InMemoryRules,
};
pub use crate::engine::provider::{
    CombinationProvider, DepthObserver, Dictionary, FrequencyProvider, Providers, RuleProvider,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::engine::error::{AnalysisError, AnalysisResult, ProviderError};

// ============================================================================
// Debug Tools
// ============================================================================

pub use crate::engine::debug::TreePrinter;
