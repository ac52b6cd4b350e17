//! Provider contracts
//!
//! The engine reads dictionary entries, rules, sandhi boundaries,
//! parameter combinations and frequency ratings through these traits.
//! Providers are shared by every worker of a running analysis, so they
//! must be `Send + Sync` and keep their caches internally synchronized.
//! The engine calls `clear()` on every cache once an analysis finishes.

use super::error::ProviderError;
use super::model::{MorphBase, MorphEntry, MorphRule, SandhiMatch};
use super::parameters::ParameterVector;
use std::sync::Arc;

/// Dictionary lookup
pub trait Dictionary: Send + Sync {
    /// All entries spelled `text`, memoized
    fn get_and_cache(&self, text: &str) -> Result<Arc<[Arc<MorphEntry>]>, ProviderError>;

    /// Entries spelled `text` that agree with the given shape
    ///
    /// An entry matches if every known slot of `parameters` equals the
    /// entry's slot, `base` is `Unknown` or equal, and `is_virtual` is
    /// `None` or equal.
    fn find_entries(
        &self,
        text: &str,
        parameters: &ParameterVector,
        base: MorphBase,
        is_virtual: Option<bool>,
    ) -> Result<Vec<Arc<MorphEntry>>, ProviderError> {
        let entries = self.get_and_cache(text)?;
        Ok(entries
            .iter()
            .filter(|e| e.parameters.satisfies(parameters))
            .filter(|e| base == MorphBase::Unknown || e.base == base)
            .filter(|e| is_virtual.is_none() || e.is_virtual == is_virtual)
            .cloned()
            .collect())
    }

    /// Drop memoized lookups
    fn clear(&self);
}

/// Rule and sandhi lookup
pub trait RuleProvider: Send + Sync {
    /// Rules for a label that accept the given parameters, memoized
    fn rules_for(
        &self,
        label: &str,
        parameters: &ParameterVector,
    ) -> Result<Arc<[Arc<MorphRule>]>, ProviderError>;

    /// Sandhi boundaries occurring in `text` that `rule` may use, memoized
    ///
    /// A boundary is usable if its expression satisfies the rule's `entry`
    /// pattern (when the rule has one). An empty list means the rule
    /// cannot split the text.
    fn sandhi_matches(
        &self,
        text: &str,
        rule: &MorphRule,
    ) -> Result<Arc<[Arc<SandhiMatch>]>, ProviderError>;

    /// Drop memoized lookups
    fn clear(&self);
}

/// Parameter-combination validity
pub trait CombinationProvider: Send + Sync {
    /// Whether some valid combination agrees with every known slot
    fn is_valid(&self, parameters: &ParameterVector) -> Result<bool, ProviderError>;

    /// Intersection of all valid combinations agreeing with `parameters`
    ///
    /// Returns `None` if there is no such combination. Memoized by input.
    fn collective(
        &self,
        parameters: &ParameterVector,
    ) -> Result<Option<ParameterVector>, ProviderError>;

    /// Drop memoized lookups
    fn clear(&self);
}

/// Chronological layer used to pick frequency data
pub type Layer = u32;

/// Frequency ratings
pub trait FrequencyProvider: Send + Sync {
    /// Rating of `text` in `0..=1` within a layer
    fn rating(&self, layer: Layer, text: &str) -> f64;

    /// Layer that best fits an entry text
    fn layer_for_entry(&self, text: &str) -> Layer;
}

/// Receives depth progress while a parse runs
pub trait DepthObserver: Send + Sync {
    /// The deepest recursion level reached so far grew to `depth`
    fn depth_changed(&self, depth: usize);
}

impl<F> DepthObserver for F
where
    F: Fn(usize) + Send + Sync,
{
    fn depth_changed(&self, depth: usize) {
        self(depth)
    }
}

/// Frequency provider rating every text the same
#[derive(Debug, Clone, Copy)]
pub struct UniformFrequency(pub f64);

impl FrequencyProvider for UniformFrequency {
    fn rating(&self, _layer: Layer, _text: &str) -> f64 {
        self.0
    }

    fn layer_for_entry(&self, _text: &str) -> Layer {
        0
    }
}

/// The set of providers one analyzer works against
#[derive(Clone)]
pub struct Providers {
    /// Dictionary
    pub dictionary: Arc<dyn Dictionary>,
    /// Rules and sandhi
    pub rules: Arc<dyn RuleProvider>,
    /// Parameter combinations
    pub combinations: Arc<dyn CombinationProvider>,
    /// Frequency ratings
    pub frequency: Arc<dyn FrequencyProvider>,
}

impl Providers {
    /// Bundle the providers
    pub fn new(
        dictionary: Arc<dyn Dictionary>,
        rules: Arc<dyn RuleProvider>,
        combinations: Arc<dyn CombinationProvider>,
        frequency: Arc<dyn FrequencyProvider>,
    ) -> Self {
        Self {
            dictionary,
            rules,
            combinations,
            frequency,
        }
    }

    /// Clear every provider cache
    pub fn clear_caches(&self) {
        self.dictionary.clear();
        self.rules.clear();
        self.combinations.clear();
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}
