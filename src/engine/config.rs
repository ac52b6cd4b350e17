//! Analyzer configuration
//!
//! [`AnalyzerConfig`] bundles the tunables of the pipeline. Use
//! [`AnalyzerConfig::default()`] for sensible defaults or the `with_*`
//! setters to customize individual fields. The struct is serde-enabled so
//! a host application can keep it in its own settings file.
//!
//! # Example
//!
//! ```rust
//! use morphtree::engine::config::{AnalyzerConfig, ChronologicalLayer};
//!
//! let config = AnalyzerConfig::new()
//!     .with_max_depth_level(6)
//!     .with_freq_rating_ratio(0.3)
//!     .with_layer(ChronologicalLayer::Fixed(2));
//! assert!((config.morph_rule_ratio() - 0.7).abs() < 1e-9);
//! ```

use super::provider::Layer;
use serde::{Deserialize, Serialize};

/// Default maximum derivation depth
pub const DEFAULT_MAX_DEPTH_LEVEL: usize = 4;

/// Default weight of frequency data in the rating
pub const DEFAULT_FREQ_RATING_RATIO: f64 = 0.2;

/// How the pipeline treats the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParsingMode {
    /// Regular analysis: prune failures, collapse, rate and sort
    #[default]
    Analyze,
    /// Keep failed derivations and skip collapsing for inspection
    Debug,
    /// Re-validate an edited entry: constraint filter, no rating
    Import,
}

impl ParsingMode {
    /// Whether failed derivations stay in the tree
    #[inline]
    pub fn keeps_errors(self) -> bool {
        self == ParsingMode::Debug
    }
}

/// Which frequency layer feeds the rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChronologicalLayer {
    /// Derive the layer from the target entry text
    #[default]
    Auto,
    /// Use a fixed layer
    Fixed(Layer),
}

/// Branching factor at which a stage switches to parallel fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    /// Candidate rules at one parser node
    pub parse_rules: usize,
    /// Solutions per word form while collapsing
    pub collapse: usize,
    /// Solutions per word form in the derivative filter
    pub derivative: usize,
    /// Solutions per word form while propagating parameters
    pub propagate: usize,
    /// Solutions per word form while merging duplicates
    pub dedup: usize,
    /// Solutions per word form while validating
    pub validate: usize,
    /// Solutions per word form while rating
    pub rating: usize,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            parse_rules: 20,
            collapse: 40,
            derivative: 40,
            propagate: 30,
            dedup: 30,
            validate: 40,
            rating: 40,
        }
    }
}

impl StageThresholds {
    /// Thresholds that never fan out
    pub fn sequential() -> Self {
        Self {
            parse_rules: usize::MAX,
            collapse: usize::MAX,
            derivative: usize::MAX,
            propagate: usize::MAX,
            dedup: usize::MAX,
            validate: usize::MAX,
            rating: usize::MAX,
        }
    }

    /// Thresholds that fan out at every branching node
    pub fn eager() -> Self {
        Self {
            parse_rules: 2,
            collapse: 2,
            derivative: 2,
            propagate: 2,
            dedup: 2,
            validate: 2,
            rating: 2,
        }
    }
}

/// Configuration for parallel work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Number of worker threads (None = global pool)
    pub num_threads: Option<usize>,
    /// Per-stage fan-out thresholds
    pub thresholds: StageThresholds,
}

impl ParallelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads to use
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set the fan-out thresholds
    pub fn with_thresholds(mut self, thresholds: StageThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Configuration of an [`Analyzer`](super::pipeline::Analyzer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum derivation depth
    pub max_depth_level: usize,
    /// Weight of frequency data in the rating (`0..=1`)
    pub freq_rating_ratio: f64,
    /// Frequency layer selection
    pub layer: ChronologicalLayer,
    /// Parallelism
    pub parallel: ParallelConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth_level: DEFAULT_MAX_DEPTH_LEVEL,
            freq_rating_ratio: DEFAULT_FREQ_RATING_RATIO,
            layer: ChronologicalLayer::Auto,
            parallel: ParallelConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum derivation depth
    pub fn with_max_depth_level(mut self, depth: usize) -> Self {
        self.max_depth_level = depth;
        self
    }

    /// Set the frequency weight, clamped to `0..=1`
    pub fn with_freq_rating_ratio(mut self, ratio: f64) -> Self {
        self.freq_rating_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the frequency layer selection
    pub fn with_layer(mut self, layer: ChronologicalLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Set the parallel configuration
    pub fn with_parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }

    /// Weight of the rule-based part of the rating
    #[inline]
    pub fn morph_rule_ratio(&self) -> f64 {
        1.0 - self.freq_rating_ratio.clamp(0.0, 1.0)
    }

    /// Parse a configuration from JSON, missing fields take defaults
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
