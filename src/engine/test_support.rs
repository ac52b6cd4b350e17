//! Builders shared by the stage unit tests

use super::arena::{Solution, SolutionArena, SolutionId, WordForm, WordFormId};
use super::memory::{FrequencyTable, InMemoryCombinations, InMemoryDictionary, InMemoryRules};
use super::model::{MorphBase, MorphEntry, MorphRule, SandhiMatch, SolutionContent};
use super::parameters::ParameterVector;
use super::provider::Providers;
use std::sync::Arc;

pub(crate) fn providers(
    entries: Vec<MorphEntry>,
    rules: Vec<MorphRule>,
    sandhi: Vec<SandhiMatch>,
) -> Providers {
    Providers::new(
        Arc::new(InMemoryDictionary::new(entries)),
        Arc::new(InMemoryRules::new(rules, sandhi)),
        Arc::new(InMemoryCombinations::permissive()),
        Arc::new(FrequencyTable::new()),
    )
}

pub(crate) fn with_combinations(combinations: Vec<ParameterVector>) -> Providers {
    Providers::new(
        Arc::new(InMemoryDictionary::new(Vec::new())),
        Arc::new(InMemoryRules::new(Vec::<MorphRule>::new(), Vec::<SandhiMatch>::new())),
        Arc::new(InMemoryCombinations::new(combinations)),
        Arc::new(FrequencyTable::new()),
    )
}

pub(crate) fn empty_providers() -> Providers {
    providers(Vec::new(), Vec::new(), Vec::new())
}

pub(crate) fn rule(id: u64, collapsed: bool, rating: f64) -> Arc<MorphRule> {
    let mut rule = MorphRule::new(id, "");
    rule.is_collapsed = collapsed;
    rule.rating = rating;
    Arc::new(rule)
}

pub(crate) fn content(id: u64, parameters: ParameterVector, base: MorphBase) -> SolutionContent {
    SolutionContent {
        id,
        parameters,
        base,
        ..SolutionContent::default()
    }
}

/// Dictionary leaf with no children
pub(crate) fn leaf(arena: &SolutionArena, id: u64) -> SolutionId {
    arena.alloc_solution(Solution::new(content(id, ParameterVector::new(), MorphBase::None)))
}

pub(crate) fn form(arena: &SolutionArena, text: &str, solutions: Vec<SolutionId>) -> WordFormId {
    arena.alloc_word_form(WordForm::new(text, solutions))
}

/// Rule-derived solution over the given children
pub(crate) fn derived(
    arena: &SolutionArena,
    rule: &Arc<MorphRule>,
    left: Option<WordFormId>,
    right: Option<WordFormId>,
) -> SolutionId {
    arena.alloc_solution(
        Solution::new(SolutionContent::default())
            .with_children(left, right)
            .with_rule(Arc::clone(rule)),
    )
}
