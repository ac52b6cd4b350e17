//! In-memory providers
//!
//! Reference implementations of the provider contracts backed by plain
//! collections. They memoize exactly like a store-backed provider would,
//! which makes them suitable for tests, benchmarks and small embedded
//! lexicons. `cache_len()` exposes how many memoized lookups are held.

use super::cache::FastDashMap;
use super::error::ProviderError;
use super::model::{MorphEntry, MorphRule, SandhiMatch};
use super::parameters::ParameterVector;
use super::provider::{CombinationProvider, Dictionary, FrequencyProvider, Layer, RuleProvider};
use super::regex_cache;
use hashbrown::HashMap;
use std::sync::Arc;

/// Dictionary held in memory
#[derive(Debug, Default)]
pub struct InMemoryDictionary {
    by_text: HashMap<String, Vec<Arc<MorphEntry>>>,
    cache: FastDashMap<String, Arc<[Arc<MorphEntry>]>>,
}

impl InMemoryDictionary {
    /// Create a dictionary from entries
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = MorphEntry>,
    {
        let mut by_text: HashMap<String, Vec<Arc<MorphEntry>>> = HashMap::new();
        for entry in entries {
            by_text
                .entry(entry.entry.clone())
                .or_default()
                .push(Arc::new(entry));
        }
        Self {
            by_text,
            cache: FastDashMap::default(),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.by_text.values().map(Vec::len).sum()
    }

    /// Whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }

    /// Number of memoized lookups
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Dictionary for InMemoryDictionary {
    fn get_and_cache(&self, text: &str) -> Result<Arc<[Arc<MorphEntry>]>, ProviderError> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(Arc::clone(&hit));
        }
        let entries: Arc<[Arc<MorphEntry>]> = self
            .by_text
            .get(text)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_else(|| Arc::from(Vec::new()));
        let stored = self
            .cache
            .entry(text.to_string())
            .or_insert(entries)
            .clone();
        Ok(stored)
    }

    fn clear(&self) {
        self.cache.clear();
    }
}

/// Rules and sandhi boundaries held in memory
#[derive(Debug, Default)]
pub struct InMemoryRules {
    rules: Vec<Arc<MorphRule>>,
    sandhi: Vec<Arc<SandhiMatch>>,
    rule_cache: FastDashMap<(String, ParameterVector), Arc<[Arc<MorphRule>]>>,
    sandhi_cache: FastDashMap<(String, u64), Arc<[Arc<SandhiMatch>]>>,
}

impl InMemoryRules {
    /// Create a provider from rules and a sandhi table
    pub fn new<R, S>(rules: R, sandhi: S) -> Self
    where
        R: IntoIterator<Item = MorphRule>,
        S: IntoIterator<Item = SandhiMatch>,
    {
        Self {
            rules: rules.into_iter().map(Arc::new).collect(),
            sandhi: sandhi.into_iter().map(Arc::new).collect(),
            rule_cache: FastDashMap::default(),
            sandhi_cache: FastDashMap::default(),
        }
    }

    /// Number of rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of memoized lookups (rules and sandhi)
    pub fn cache_len(&self) -> usize {
        self.rule_cache.len() + self.sandhi_cache.len()
    }
}

impl RuleProvider for InMemoryRules {
    fn rules_for(
        &self,
        label: &str,
        parameters: &ParameterVector,
    ) -> Result<Arc<[Arc<MorphRule>]>, ProviderError> {
        let key = (label.to_string(), *parameters);
        if let Some(hit) = self.rule_cache.get(&key) {
            return Ok(Arc::clone(&hit));
        }
        let matching: Arc<[Arc<MorphRule>]> = self
            .rules
            .iter()
            .filter(|r| r.label == label && !r.parameters.conflicts_with(parameters))
            .cloned()
            .collect();
        Ok(self.rule_cache.entry(key).or_insert(matching).clone())
    }

    /// Boundaries whose expression occurs in `text` and satisfies the
    /// rule's `entry` pattern
    fn sandhi_matches(
        &self,
        text: &str,
        rule: &MorphRule,
    ) -> Result<Arc<[Arc<SandhiMatch>]>, ProviderError> {
        let key = (text.to_string(), rule.id);
        if let Some(hit) = self.sandhi_cache.get(&key) {
            return Ok(Arc::clone(&hit));
        }
        let matching: Arc<[Arc<SandhiMatch>]> = self
            .sandhi
            .iter()
            .filter(|s| !text.is_empty() && text.contains(s.expression.as_str()))
            .filter(|s| {
                rule.entry
                    .as_deref()
                    .is_none_or(|pattern| regex_cache::is_match(pattern, &s.expression))
            })
            .cloned()
            .collect();
        Ok(self.sandhi_cache.entry(key).or_insert(matching).clone())
    }

    fn clear(&self) {
        self.rule_cache.clear();
        self.sandhi_cache.clear();
    }
}

/// Valid parameter combinations held in memory
///
/// Unknown slots of a stored combination act as wildcards.
#[derive(Debug, Default)]
pub struct InMemoryCombinations {
    combinations: Vec<ParameterVector>,
    permissive: bool,
    cache: FastDashMap<ParameterVector, Option<ParameterVector>>,
}

impl InMemoryCombinations {
    /// Create a provider from the list of valid combinations
    pub fn new<I>(combinations: I) -> Self
    where
        I: IntoIterator<Item = ParameterVector>,
    {
        Self {
            combinations: combinations.into_iter().collect(),
            permissive: false,
            cache: FastDashMap::default(),
        }
    }

    /// A provider that accepts every vector unchanged
    pub fn permissive() -> Self {
        Self {
            combinations: Vec::new(),
            permissive: true,
            cache: FastDashMap::default(),
        }
    }

    /// Number of memoized lookups
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn compute(&self, parameters: &ParameterVector) -> Option<ParameterVector> {
        if self.permissive {
            return Some(*parameters);
        }
        let mut agreeing = self
            .combinations
            .iter()
            .filter(|c| c.accepts(parameters))
            .peekable();
        agreeing.peek()?;
        Some(ParameterVector::collective(agreeing))
    }
}

impl CombinationProvider for InMemoryCombinations {
    fn is_valid(&self, parameters: &ParameterVector) -> Result<bool, ProviderError> {
        Ok(self.collective(parameters)?.is_some())
    }

    fn collective(
        &self,
        parameters: &ParameterVector,
    ) -> Result<Option<ParameterVector>, ProviderError> {
        if let Some(hit) = self.cache.get(parameters) {
            return Ok(*hit);
        }
        let result = self.compute(parameters);
        Ok(*self.cache.entry(*parameters).or_insert(result))
    }

    fn clear(&self) {
        self.cache.clear();
    }
}

/// Frequency ratings per chronological layer
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    layers: HashMap<Layer, HashMap<String, f64>>,
    default_layer: Layer,
    unknown_rating: f64,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
            default_layer: 0,
            unknown_rating: 0.5,
        }
    }
}

impl FrequencyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a rating, clamped to `0..=1`
    pub fn with_rating(mut self, layer: Layer, text: impl Into<String>, rating: f64) -> Self {
        self.layers
            .entry(layer)
            .or_default()
            .insert(text.into(), rating.clamp(0.0, 1.0));
        self
    }

    /// Layer used when no layer contains an entry
    pub fn with_default_layer(mut self, layer: Layer) -> Self {
        self.default_layer = layer;
        self
    }

    /// Rating of texts missing from a layer
    pub fn with_unknown_rating(mut self, rating: f64) -> Self {
        self.unknown_rating = rating.clamp(0.0, 1.0);
        self
    }
}

impl FrequencyProvider for FrequencyTable {
    fn rating(&self, layer: Layer, text: &str) -> f64 {
        self.layers
            .get(&layer)
            .and_then(|table| table.get(text))
            .copied()
            .unwrap_or(self.unknown_rating)
    }

    /// The lowest layer that knows the entry, else the default layer
    fn layer_for_entry(&self, text: &str) -> Layer {
        self.layers
            .iter()
            .filter(|(_, table)| table.contains_key(text))
            .map(|(&layer, _)| layer)
            .min()
            .unwrap_or(self.default_layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::MorphBase;

    #[test]
    fn test_dictionary_memoizes() {
        let dict = InMemoryDictionary::new([
            MorphEntry::new("ka").with_id(1),
            MorphEntry::new("ka").with_id(2),
            MorphEntry::new("ta").with_id(3),
        ]);
        assert_eq!(dict.len(), 3);

        assert_eq!(dict.get_and_cache("ka").unwrap().len(), 2);
        assert_eq!(dict.get_and_cache("zz").unwrap().len(), 0);
        assert_eq!(dict.cache_len(), 2);

        let found = dict
            .find_entries("ta", &ParameterVector::new(), MorphBase::Unknown, None)
            .unwrap();
        assert_eq!(found[0].id, 3);

        dict.clear();
        assert_eq!(dict.cache_len(), 0);
    }

    #[test]
    fn test_rules_for_label_and_parameters() {
        let mut noun = MorphRule::new(1, "");
        noun.parameters = ParameterVector::new().with(0, 1);
        let mut verb = MorphRule::new(2, "");
        verb.parameters = ParameterVector::new().with(0, 2);
        let other = MorphRule::new(3, "stem");

        let rules = InMemoryRules::new([noun, verb, other], Vec::<SandhiMatch>::new());

        let any = rules.rules_for("", &ParameterVector::new()).unwrap();
        assert_eq!(any.len(), 2);

        let nouns = rules
            .rules_for("", &ParameterVector::new().with(0, 1))
            .unwrap();
        assert_eq!(nouns.len(), 1);
        assert_eq!(nouns[0].id, 1);

        let stems = rules.rules_for("stem", &ParameterVector::new()).unwrap();
        assert_eq!(stems[0].id, 3);
        assert_eq!(rules.cache_len(), 3);
    }

    #[test]
    fn test_sandhi_matches_filter() {
        let mut rule = MorphRule::new(1, "");
        let rules = InMemoryRules::new(
            Vec::<MorphRule>::new(),
            [
                SandhiMatch::new("e", "a", "i"),
                SandhiMatch::new("o", "a", "u"),
                SandhiMatch::new("", "", ""),
            ],
        );

        let found = rules.sandhi_matches("deva", &rule).unwrap();
        let expressions: Vec<&str> = found.iter().map(|s| s.expression.as_str()).collect();
        assert_eq!(expressions, vec!["e", ""]);

        rule.id = 2;
        rule.entry = Some("^e$".into());
        let found = rules.sandhi_matches("deva", &rule).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].expression, "e");

        assert!(rules.sandhi_matches("", &rule).unwrap().is_empty());
    }

    #[test]
    fn test_combinations_collective() {
        let combos = InMemoryCombinations::new([
            ParameterVector::new().with(0, 1).with(1, 1).with(2, 3),
            ParameterVector::new().with(0, 1).with(1, 2).with(2, 3),
            ParameterVector::new().with(0, 2).with(1, 1),
        ]);

        let common = combos
            .collective(&ParameterVector::new().with(0, 1))
            .unwrap()
            .unwrap();
        assert_eq!(common.get(0), 1);
        assert!(common.is_unknown(1));
        assert_eq!(common.get(2), 3);

        assert!(!combos
            .is_valid(&ParameterVector::new().with(0, 3))
            .unwrap());
        assert!(combos.cache_len() >= 2);

        combos.clear();
        assert_eq!(combos.cache_len(), 0);
    }

    #[test]
    fn test_permissive_combinations() {
        let combos = InMemoryCombinations::permissive();
        let v = ParameterVector::new().with(4, 9);
        assert_eq!(combos.collective(&v).unwrap(), Some(v));
    }

    #[test]
    fn test_frequency_layers() {
        let table = FrequencyTable::new()
            .with_rating(2, "ka", 0.9)
            .with_rating(1, "ka", 0.4)
            .with_rating(3, "ta", 0.7)
            .with_default_layer(3)
            .with_unknown_rating(0.1);

        assert_eq!(table.layer_for_entry("ka"), 1);
        assert_eq!(table.layer_for_entry("zz"), 3);
        assert_eq!(table.rating(2, "ka"), 0.9);
        assert_eq!(table.rating(2, "ta"), 0.1);
    }
}
