//! Arena storage for solution trees
//!
//! Every [`Solution`] and [`WordForm`] of one analysis lives in a single
//! append-only [`SolutionArena`] and is addressed by a small `Copy` handle.
//! Parents store handles, so one memoized sub-solution can be shared by
//! any number of parents. Nodes are never mutated after allocation: a
//! stage that changes a node allocates a new one and rewires the parent
//! (copy-on-write). Dropping the arena frees the whole tree at once.
//!
//! Allocation takes `&self` so parallel workers can extend the arena
//! while other workers read from it.

use super::model::{MorphRule, SandhiMatch, SolutionContent};
use std::sync::{Arc, PoisonError, RwLock};

/// Handle of a [`Solution`] in a [`SolutionArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolutionId(u32);

/// Handle of a [`WordForm`] in a [`SolutionArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordFormId(u32);

impl SolutionId {
    /// Raw index into the arena
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl WordFormId {
    /// Raw index into the arena
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Neutral collapse rating of a solution that was never folded
pub const FULL_COLLAPSE_RATING: f64 = 1.0;

/// One candidate derivation of a word form
#[derive(Debug, Clone)]
pub struct Solution {
    /// Grammatical content
    pub content: SolutionContent,
    /// Left part
    pub left: Option<WordFormId>,
    /// Right part
    pub right: Option<WordFormId>,
    /// Rules that produced this solution; the first one governs collapsing
    pub rules: Vec<Arc<MorphRule>>,
    /// Sandhi boundaries used
    pub sandhi_matches: Vec<Arc<SandhiMatch>>,
    /// Starts at 1.0 and shrinks each time the solution is folded upward
    pub collapse_rating: f64,
    /// Computed rating, `None` until the rating stage ran
    pub rating: Option<f64>,
    /// Solution this one was derived from (not owned)
    pub original: Option<SolutionId>,
}

impl Solution {
    /// Create a childless, rule-less solution
    pub fn new(content: SolutionContent) -> Self {
        Self {
            content,
            left: None,
            right: None,
            rules: Vec::new(),
            sandhi_matches: Vec::new(),
            collapse_rating: FULL_COLLAPSE_RATING,
            rating: None,
            original: None,
        }
    }

    /// Set both parts
    pub fn with_children(mut self, left: Option<WordFormId>, right: Option<WordFormId>) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: Arc<MorphRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a sandhi boundary
    pub fn with_sandhi(mut self, sandhi: Arc<SandhiMatch>) -> Self {
        self.sandhi_matches.push(sandhi);
        self
    }

    /// Set the originating solution
    pub fn with_original(mut self, original: Option<SolutionId>) -> Self {
        self.original = original;
        self
    }

    /// The rule governing collapse behavior
    #[inline]
    pub fn first_rule(&self) -> Option<&MorphRule> {
        self.rules.first().map(|r| r.as_ref())
    }

    /// Whether the governing rule is a collapsed rule
    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.first_rule().is_some_and(|r| r.is_collapsed)
    }

    /// Whether the derivation succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        self.content.is_success()
    }

    /// Ids of the applied rules, in order
    pub fn rule_ids(&self) -> Vec<u64> {
        self.rules.iter().map(|r| r.id).collect()
    }

    /// Highest rating among the applied rules
    pub fn rule_rating(&self) -> Option<f64> {
        self.rules.iter().map(|r| r.rating).reduce(f64::max)
    }
}

/// The competing solutions for one text at one tree position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordForm {
    /// Text of the form
    pub entry: String,
    /// Candidate solutions
    pub solutions: Vec<SolutionId>,
}

impl WordForm {
    /// Create a word form
    pub fn new(entry: impl Into<String>, solutions: Vec<SolutionId>) -> Self {
        Self {
            entry: entry.into(),
            solutions,
        }
    }

    /// Whether the form has no solutions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

/// Append-only storage for the nodes of one analysis
#[derive(Debug, Default)]
pub struct SolutionArena {
    solutions: RwLock<Vec<Arc<Solution>>>,
    word_forms: RwLock<Vec<Arc<WordForm>>>,
}

impl SolutionArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create an arena with room for `capacity` solutions
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            solutions: RwLock::new(Vec::with_capacity(capacity)),
            word_forms: RwLock::new(Vec::with_capacity(capacity / 2)),
        }
    }

    /// Create an arena sized for an entry of the given length
    ///
    /// Longer entries admit more split points, and the number of
    /// solutions grows roughly with the square of the length.
    pub fn for_entry(entry_len: usize) -> Self {
        let estimated = (entry_len * entry_len * 4).clamp(64, 100_000);
        Self::with_capacity(estimated)
    }

    /// Store a solution
    pub fn alloc_solution(&self, solution: Solution) -> SolutionId {
        let mut solutions = self.solutions.write().unwrap_or_else(PoisonError::into_inner);
        solutions.push(Arc::new(solution));
        SolutionId((solutions.len() - 1) as u32)
    }

    /// Store a word form
    pub fn alloc_word_form(&self, word_form: WordForm) -> WordFormId {
        let mut forms = self.word_forms.write().unwrap_or_else(PoisonError::into_inner);
        forms.push(Arc::new(word_form));
        WordFormId((forms.len() - 1) as u32)
    }

    /// Get a solution
    ///
    /// Handles are only produced by this arena, so a foreign handle is a
    /// programming error and panics.
    #[inline]
    pub fn solution(&self, id: SolutionId) -> Arc<Solution> {
        let solutions = self.solutions.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&solutions[id.index()])
    }

    /// Get a word form (panics on a foreign handle)
    #[inline]
    pub fn word_form(&self, id: WordFormId) -> Arc<WordForm> {
        let forms = self.word_forms.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&forms[id.index()])
    }

    /// Get a solution if the handle resolves
    pub fn try_solution(&self, id: SolutionId) -> Option<Arc<Solution>> {
        let solutions = self.solutions.read().unwrap_or_else(PoisonError::into_inner);
        solutions.get(id.index()).cloned()
    }

    /// Get a word form if the handle resolves
    pub fn try_word_form(&self, id: WordFormId) -> Option<Arc<WordForm>> {
        let forms = self.word_forms.read().unwrap_or_else(PoisonError::into_inner);
        forms.get(id.index()).cloned()
    }

    /// Resolve all solutions of a word form
    pub fn solutions_of(&self, id: WordFormId) -> Vec<Arc<Solution>> {
        let form = self.word_form(id);
        let solutions = self.solutions.read().unwrap_or_else(PoisonError::into_inner);
        form.solutions
            .iter()
            .map(|s| Arc::clone(&solutions[s.index()]))
            .collect()
    }

    /// Store a copy of a solution with the given modification applied
    pub fn derive_solution<F>(&self, id: SolutionId, f: F) -> SolutionId
    where
        F: FnOnce(&mut Solution),
    {
        let mut copy = Solution::clone(&self.solution(id));
        f(&mut copy);
        self.alloc_solution(copy)
    }

    /// Number of stored solutions
    pub fn solution_count(&self) -> usize {
        self.solutions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of stored word forms
    pub fn word_form_count(&self) -> usize {
        self.word_forms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been allocated
    pub fn is_empty(&self) -> bool {
        self.solution_count() == 0 && self.word_form_count() == 0
    }

    /// Drop every node, invalidating all handles
    pub fn clear(&self) {
        self.solutions.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.word_forms.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::SolutionError;
    use crate::engine::parameters::ParameterVector;

    fn content(id: u64) -> SolutionContent {
        SolutionContent {
            id,
            ..SolutionContent::default()
        }
    }

    #[test]
    fn test_alloc_and_get() {
        let arena = SolutionArena::new();
        let s = arena.alloc_solution(Solution::new(content(4)));
        let w = arena.alloc_word_form(WordForm::new("ab", vec![s]));

        assert_eq!(arena.solution(s).content.id, 4);
        assert_eq!(arena.word_form(w).entry, "ab");
        assert_eq!(arena.solutions_of(w).len(), 1);
        assert_eq!(arena.solution_count(), 1);
        assert_eq!(arena.word_form_count(), 1);
    }

    #[test]
    fn test_derive_is_copy_on_write() {
        let arena = SolutionArena::new();
        let s = arena.alloc_solution(Solution::new(content(1)));
        let t = arena.derive_solution(s, |sol| {
            sol.content.parameters = ParameterVector::new().with(0, 5);
        });

        assert_ne!(s, t);
        assert!(arena.solution(s).content.parameters.is_fully_unknown());
        assert_eq!(arena.solution(t).content.parameters.get(0), 5);
    }

    #[test]
    fn test_try_get_out_of_range() {
        let arena = SolutionArena::new();
        assert!(arena.try_solution(SolutionId(3)).is_none());
        assert!(arena.try_word_form(WordFormId(0)).is_none());
    }

    #[test]
    fn test_collapsed_flag_from_first_rule() {
        let mut collapsed = MorphRule::new(1, "");
        collapsed.is_collapsed = true;
        let plain = MorphRule::new(2, "");

        let a = Solution::new(content(0))
            .with_rule(Arc::new(collapsed.clone()))
            .with_rule(Arc::new(plain.clone()));
        let b = Solution::new(content(0))
            .with_rule(Arc::new(plain))
            .with_rule(Arc::new(collapsed));

        assert!(a.is_collapsed());
        assert!(!b.is_collapsed());
        assert_eq!(a.rule_ids(), vec![1, 2]);
    }

    #[test]
    fn test_rule_rating_is_max() {
        let mut low = MorphRule::new(1, "");
        low.rating = 0.25;
        let mut high = MorphRule::new(2, "");
        high.rating = 0.75;
        let s = Solution::new(content(0))
            .with_rule(Arc::new(low))
            .with_rule(Arc::new(high));
        assert_eq!(s.rule_rating(), Some(0.75));
        assert_eq!(Solution::new(content(0)).rule_rating(), None);
    }

    #[test]
    fn test_error_content() {
        let arena = SolutionArena::new();
        let s = arena.alloc_solution(Solution::new(
            content(0).with_error(SolutionError::DepthIsExceeded),
        ));
        assert!(!arena.solution(s).is_success());
    }

    #[test]
    fn test_clear() {
        let arena = SolutionArena::new();
        arena.alloc_solution(Solution::new(content(0)));
        assert!(!arena.is_empty());
        arena.clear();
        assert!(arena.is_empty());
    }
}
