//! Structural integrity checks
//!
//! A failed check means an earlier stage is broken, not that the input
//! was bad, so violations are reported as [`IntegrityViolation`] instead
//! of an [`AnalysisError`](super::error::AnalysisError). The pipeline runs
//! this in debug builds only and panics on a violation.

use super::arena::{SolutionId, WordFormId};
use super::context::RequestContext;
use super::error::IntegrityViolation;
use super::parallel;
use dashmap::DashSet;

/// Check the tree under `root`
///
/// Every handle must resolve. Outside debug parsing no error solution may
/// remain, and every collapsed solution must have a left part.
pub fn validate_tree(ctx: &RequestContext<'_>, root: WordFormId) -> Result<(), IntegrityViolation> {
    let validator = Validator {
        ctx,
        strict: !ctx.keeps_errors(),
        seen: DashSet::default(),
    };
    validator.check_form(root)
}

struct Validator<'c, 'a> {
    ctx: &'c RequestContext<'a>,
    strict: bool,
    seen: DashSet<WordFormId, ahash::RandomState>,
}

impl Validator<'_, '_> {
    fn check_form(&self, id: WordFormId) -> Result<(), IntegrityViolation> {
        if !self.seen.insert(id) {
            return Ok(());
        }
        let form = self
            .ctx
            .arena
            .try_word_form(id)
            .ok_or(IntegrityViolation::DanglingWordForm(id))?;
        parallel::try_map(&form.solutions, self.ctx.thresholds().validate, |&s| {
            self.check_solution(s)
        })?;
        Ok(())
    }

    fn check_solution(&self, id: SolutionId) -> Result<(), IntegrityViolation> {
        let solution = self
            .ctx
            .arena
            .try_solution(id)
            .ok_or(IntegrityViolation::DanglingSolution(id))?;

        if self.strict {
            if !solution.is_success() {
                return Err(IntegrityViolation::ErrorSolution(id));
            }
            if solution.is_collapsed() && solution.left.is_none() {
                return Err(IntegrityViolation::CollapsedWithoutLeft(id));
            }
        }

        if let Some(left) = solution.left {
            self.check_form(left)?;
        }
        if let Some(right) = solution.right {
            self.check_form(right)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arena::{Solution, SolutionArena};
    use crate::engine::config::{AnalyzerConfig, ParsingMode};
    use crate::engine::context::CancellationToken;
    use crate::engine::model::{SolutionContent, SolutionError};
    use crate::engine::test_support::{derived, empty_providers, form, leaf, rule};

    fn check(arena: &SolutionArena, root: WordFormId, mode: ParsingMode) -> Result<(), IntegrityViolation> {
        let providers = empty_providers();
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(arena, &providers, &config, mode, &cancel);
        validate_tree(&ctx, root)
    }

    #[test]
    fn test_valid_tree() {
        let arena = SolutionArena::new();
        let ka = form(&arena, "ka", vec![leaf(&arena, 1)]);
        let s = derived(&arena, &rule(1, false, 1.0), Some(ka), None);
        let root = form(&arena, "kat", vec![s]);
        assert_eq!(check(&arena, root, ParsingMode::Analyze), Ok(()));
    }

    #[test]
    fn test_error_solution_only_allowed_in_debug() {
        let arena = SolutionArena::new();
        let failed = arena.alloc_solution(Solution::new(
            SolutionContent::default().with_error(SolutionError::NoSandhiMatches),
        ));
        let root = form(&arena, "ka", vec![failed]);

        assert_eq!(
            check(&arena, root, ParsingMode::Analyze),
            Err(IntegrityViolation::ErrorSolution(failed))
        );
        assert_eq!(check(&arena, root, ParsingMode::Debug), Ok(()));
    }

    #[test]
    fn test_collapsed_without_left() {
        let arena = SolutionArena::new();
        let folded = derived(&arena, &rule(2, true, 1.0), None, None);
        let root = form(&arena, "ka", vec![folded]);

        assert_eq!(
            check(&arena, root, ParsingMode::Analyze),
            Err(IntegrityViolation::CollapsedWithoutLeft(folded))
        );
    }

    #[test]
    fn test_dangling_handle() {
        let arena = SolutionArena::new();
        let other = SolutionArena::new();
        for _ in 0..3 {
            leaf(&other, 1);
        }
        let foreign = leaf(&other, 1);
        let root = form(&arena, "ka", vec![foreign]);

        assert_eq!(
            check(&arena, root, ParsingMode::Analyze),
            Err(IntegrityViolation::DanglingSolution(foreign))
        );
    }
}
