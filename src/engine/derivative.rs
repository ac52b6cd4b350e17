//! Derivative-consistency filter
//!
//! Rule derivations started from a stored entry remember that entry's
//! solution as their `original`. A derivation survives only if it still
//! has the original's shape: same base (unless the original's is
//! unknown), the same parts with the same texts, and every known
//! parameter slot of the original. A part whose original resolves to a
//! stored entry must resolve to that same entry first.

use super::arena::{Solution, SolutionId, WordForm, WordFormId};
use super::cache::FastDashMap;
use super::context::RequestContext;
use super::error::AnalysisResult;
use super::model::MorphBase;
use super::parallel;

/// Remove inconsistent derivations from the tree under `root`
pub fn filter_derivatives(ctx: &RequestContext<'_>, root: WordFormId) -> AnalysisResult<WordFormId> {
    DerivativeFilter::new(ctx).filter_form(root)
}

/// Whether `derived` still matches the solution it was derived from
pub fn is_consistent(ctx: &RequestContext<'_>, derived: &Solution, original: &Solution) -> bool {
    if original.content.base != MorphBase::Unknown && derived.content.base != original.content.base {
        return false;
    }
    if !derived.content.parameters.satisfies(&original.content.parameters) {
        return false;
    }
    side_matches(ctx, derived.left, original.left) && side_matches(ctx, derived.right, original.right)
}

fn side_matches(ctx: &RequestContext<'_>, derived: Option<WordFormId>, original: Option<WordFormId>) -> bool {
    let Some(original) = original else {
        return true;
    };
    let Some(derived) = derived else {
        return false;
    };

    let arena = ctx.arena;
    let original = arena.word_form(original);
    let derived = arena.word_form(derived);
    if original.entry != derived.entry {
        return false;
    }

    let first_id = |form: &WordForm| {
        form.solutions
            .first()
            .map_or(0, |&s| arena.solution(s).content.id)
    };
    let stored_id = first_id(original.as_ref());
    stored_id == 0 || first_id(derived.as_ref()) == stored_id
}

struct DerivativeFilter<'c, 'a> {
    ctx: &'c RequestContext<'a>,
    forms: FastDashMap<WordFormId, WordFormId>,
    solutions: FastDashMap<SolutionId, Option<SolutionId>>,
}

impl<'c, 'a> DerivativeFilter<'c, 'a> {
    fn new(ctx: &'c RequestContext<'a>) -> Self {
        Self {
            ctx,
            forms: FastDashMap::default(),
            solutions: FastDashMap::default(),
        }
    }

    fn filter_form(&self, id: WordFormId) -> AnalysisResult<WordFormId> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.forms.get(&id) {
            return Ok(*hit);
        }

        let form = self.ctx.arena.word_form(id);
        let filtered = parallel::try_map(&form.solutions, self.ctx.thresholds().derivative, |&s| {
            self.filter_solution(s)
        })?;
        let kept: Vec<SolutionId> = filtered.into_iter().flatten().collect();

        let result = if kept == form.solutions {
            id
        } else {
            log_trace!(
                "'{}': dropped {} inconsistent derivations",
                form.entry,
                form.solutions.len() - kept.len()
            );
            self.ctx
                .arena
                .alloc_word_form(WordForm::new(form.entry.clone(), kept))
        };
        Ok(*self.forms.entry(id).or_insert(result))
    }

    fn filter_solution(&self, id: SolutionId) -> AnalysisResult<Option<SolutionId>> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.solutions.get(&id) {
            return Ok(*hit);
        }

        let arena = self.ctx.arena;
        let solution = arena.solution(id);
        let consistent = match solution.original {
            Some(original) => is_consistent(self.ctx, &solution, &arena.solution(original)),
            None => true,
        };

        let result = if consistent {
            let left = solution.left.map(|l| self.filter_form(l)).transpose()?;
            let right = solution.right.map(|r| self.filter_form(r)).transpose()?;
            if left == solution.left && right == solution.right {
                Some(id)
            } else {
                Some(arena.derive_solution(id, |s| {
                    s.left = left;
                    s.right = right;
                }))
            }
        } else {
            None
        };
        Ok(*self.solutions.entry(id).or_insert(result))
    }
}
