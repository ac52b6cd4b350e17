//! Morphological analysis engine
//!
//! # Module Organization
//!
//! ## Data Model
//! - [`parameters`] - Fixed-width grammatical parameter vectors
//! - [`model`] - Entries, rules, sandhi matches and solution content
//! - [`arena`] - Node storage with copy-on-write derivation
//!
//! ## Providers
//! - [`provider`] - Contracts for dictionary, rule, combination and frequency data
//! - [`memory`] - In-memory provider implementations
//!
//! ## Request State
//! - [`config`] - Analyzer configuration
//! - [`context`] - Per-request context and cancellation
//! - [`cache`] - Sandhi memo shared across one parse
//! - [`parallel`] - Worker pool and fan-out helpers
//!
//! ## Stages
//! - [`parser`] - Recursive decomposition into a solution tree
//! - [`collapse`] - Folding collapsed rules into their parents
//! - [`derivative`] - Consistency filter for rule completions
//! - [`propagate`] - Parameter propagation from children
//! - [`dedup`] - Exact and similar duplicate merging
//! - [`constraint`] - Import-mode constraint filter
//! - [`rating`] - Rating and ordering
//! - [`validate`] - Structural integrity checks
//! - [`pipeline`] - Stage orchestration
//!
//! ## Developer Tools
//! - [`debug`] - Tree printer and DOT export

// ============================================================================
// Module Declarations
// ============================================================================

pub mod arena;
pub mod cache;
pub mod collapse;
pub mod config;
pub mod constraint;
pub mod context;
pub mod debug;
pub mod dedup;
pub mod derivative;
pub mod error;
pub mod memory;
pub mod model;
pub mod parameters;
pub mod parser;
pub mod pipeline;
pub mod propagate;
pub mod provider;
pub mod rating;
pub mod regex_cache;
pub mod validate;

// Parallel fan-out (always available, uses rayon when feature is enabled)
pub mod parallel;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Core Types
// ============================================================================

pub use arena::{Solution, SolutionArena, SolutionId, WordForm, WordFormId};
pub use model::{
    EntrySource, EntryTemplate, MorphBase, MorphEntry, MorphRule, MorphRuleType, SandhiGroup,
    SandhiMatch, SolutionContent, SolutionError,
};
pub use parameters::{ParameterVector, PARAMETER_COUNT, UNKNOWN};

// ============================================================================
// Pipeline
// ============================================================================

pub use pipeline::{AnalysisOutcome, AnalysisRequest, Analyzer, SolutionTree};

// ============================================================================
// Configuration
// ============================================================================

pub use config::{AnalyzerConfig, ChronologicalLayer, ParallelConfig, ParsingMode, StageThresholds};
pub use context::{CancellationToken, RequestContext};

// ============================================================================
// Providers
// ============================================================================

pub use memory::{FrequencyTable, InMemoryCombinations, InMemoryDictionary, InMemoryRules};
pub use provider::{
    CombinationProvider, DepthObserver, Dictionary, FrequencyProvider, Layer, Providers,
    RuleProvider, UniformFrequency,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{AnalysisError, AnalysisResult, IntegrityViolation, ProviderError};

// ============================================================================
// Caching
// ============================================================================

pub use cache::{MemoStats, SandhiKey, SandhiMemo};

// ============================================================================
// Debug Tools
// ============================================================================

pub use debug::TreePrinter;
