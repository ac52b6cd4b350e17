//! Shared fixtures for the integration tests

#![allow(dead_code)]

use morphtree::prelude::*;
use std::sync::Arc;

/// Providers whose concrete halves stay reachable for cache inspection
pub struct Fixture {
    pub dictionary: Arc<InMemoryDictionary>,
    pub rules: Arc<InMemoryRules>,
    pub combinations: Arc<InMemoryCombinations>,
    pub providers: Providers,
}

impl Fixture {
    pub fn new(entries: Vec<MorphEntry>, rules: Vec<MorphRule>, sandhi: Vec<SandhiMatch>) -> Self {
        Self::with_frequency(entries, rules, sandhi, FrequencyTable::new())
    }

    pub fn with_frequency(
        entries: Vec<MorphEntry>,
        rules: Vec<MorphRule>,
        sandhi: Vec<SandhiMatch>,
        frequency: FrequencyTable,
    ) -> Self {
        let dictionary = Arc::new(InMemoryDictionary::new(entries));
        let rules = Arc::new(InMemoryRules::new(rules, sandhi));
        let combinations = Arc::new(InMemoryCombinations::permissive());
        let providers = Providers::new(
            dictionary.clone(),
            rules.clone(),
            combinations.clone(),
            Arc::new(frequency),
        );
        Self {
            dictionary,
            rules,
            combinations,
            providers,
        }
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer_with(AnalyzerConfig::default())
    }

    pub fn analyzer_with(&self, config: AnalyzerConfig) -> Analyzer {
        Analyzer::new(self.providers.clone(), config).unwrap()
    }

    /// Total memoized provider lookups
    pub fn cached_lookups(&self) -> usize {
        self.dictionary.cache_len() + self.rules.cache_len() + self.combinations.cache_len()
    }
}

/// A stored, complete stem
pub fn stem(id: u64, text: &str) -> MorphEntry {
    MorphEntry::new(text).with_id(id).with_base(MorphBase::None)
}

/// Suffix rule: the left part is the stem, the right part is dropped
pub fn suffix_rule(id: u64) -> MorphRule {
    let mut rule = MorphRule::new(id, "");
    rule.left_type = MorphRuleType::Copy;
    rule.base = MorphBase::Left;
    rule
}

/// Compound rule: both parts are parsed as independent words
pub fn compound_rule(id: u64) -> MorphRule {
    let mut rule = MorphRule::new(id, "");
    rule.left_type = MorphRuleType::New;
    rule.right_type = MorphRuleType::New;
    rule.base = MorphBase::Both;
    rule
}

/// Boundary splitting at every character
pub fn anywhere() -> SandhiMatch {
    SandhiMatch::new("", "", "")
}

/// Boundary at an "a" suffix
pub fn a_suffix() -> SandhiMatch {
    SandhiMatch::new("a", "", "a")
}

pub fn analyze(analyzer: &Analyzer, request: &AnalysisRequest) -> SolutionTree {
    analyzer
        .analyze(request, &CancellationToken::new())
        .unwrap()
        .into_tree()
        .unwrap()
}
