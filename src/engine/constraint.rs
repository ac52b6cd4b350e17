//! Constraint filter
//!
//! Re-validates an edited or imported entry against its analysis: only
//! top-level solutions agreeing with the committed entry survive.

use super::arena::{WordForm, WordFormId};
use super::context::RequestContext;
use super::error::{AnalysisError, AnalysisResult};
use super::model::MorphEntry;

/// Keep the top-level solutions that agree with `target`
///
/// A solution agrees if none of its known parameter slots contradicts a
/// known slot of the target and, for every part the target names, it has
/// a part with the same text (and, for a stored part, a solution with the
/// same dictionary id).
pub fn filter_constraints(
    ctx: &RequestContext<'_>,
    root: WordFormId,
    target: Option<&MorphEntry>,
) -> AnalysisResult<WordFormId> {
    let target = target.ok_or(AnalysisError::MissingConstraintTarget)?;
    ctx.check_canceled()?;

    let arena = ctx.arena;
    let form = arena.word_form(root);
    let part_matches = |part: Option<WordFormId>, wanted: Option<&MorphEntry>| match wanted {
        None => true,
        Some(wanted) => part.is_some_and(|p| {
            let part = arena.word_form(p);
            part.entry == wanted.entry
                && (!wanted.is_stored()
                    || part
                        .solutions
                        .iter()
                        .any(|&s| arena.solution(s).content.id == wanted.id))
        }),
    };

    let kept: Vec<_> = form
        .solutions
        .iter()
        .copied()
        .filter(|&s| {
            let solution = arena.solution(s);
            !solution.content.parameters.conflicts_with(&target.parameters)
                && part_matches(solution.left, target.left.as_deref())
                && part_matches(solution.right, target.right.as_deref())
        })
        .collect();

    if kept == form.solutions {
        return Ok(root);
    }
    log_debug!(
        "constraint filter kept {} of {} solutions",
        kept.len(),
        form.solutions.len()
    );
    Ok(arena.alloc_word_form(WordForm::new(form.entry.clone(), kept)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arena::{Solution, SolutionArena};
    use crate::engine::config::{AnalyzerConfig, ParsingMode};
    use crate::engine::context::CancellationToken;
    use crate::engine::model::MorphBase;
    use crate::engine::parameters::ParameterVector;
    use crate::engine::test_support::{content, empty_providers, form, leaf};

    #[test]
    fn test_filters_by_parameters_and_parts() {
        let arena = SolutionArena::new();
        let ka = form(&arena, "ka", vec![leaf(&arena, 3)]);
        let kha = form(&arena, "kha", vec![leaf(&arena, 3)]);
        let ka_other = form(&arena, "ka", vec![leaf(&arena, 4)]);

        let solution = |params: ParameterVector, left: WordFormId| {
            arena.alloc_solution(
                Solution::new(content(0, params, MorphBase::Left)).with_children(Some(left), None),
            )
        };
        let good = solution(ParameterVector::new().with(0, 1), ka);
        let conflicting = solution(ParameterVector::new().with(0, 2), ka);
        let wrong_text = solution(ParameterVector::new(), kha);
        let wrong_id = solution(ParameterVector::new(), ka_other);
        let root = form(&arena, "kata", vec![good, conflicting, wrong_text, wrong_id]);

        let target = MorphEntry::new("kata")
            .with_parameters(ParameterVector::new().with(0, 1))
            .with_left(MorphEntry::new("ka").with_id(3));

        let providers = empty_providers();
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(&arena, &providers, &config, ParsingMode::Import, &cancel);

        let filtered = filter_constraints(&ctx, root, Some(&target)).unwrap();
        assert_eq!(arena.word_form(filtered).solutions, vec![good]);
    }

    #[test]
    fn test_missing_target() {
        let arena = SolutionArena::new();
        let root = form(&arena, "ka", vec![leaf(&arena, 1)]);
        let providers = empty_providers();
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(&arena, &providers, &config, ParsingMode::Import, &cancel);

        assert_eq!(
            filter_constraints(&ctx, root, None),
            Err(AnalysisError::MissingConstraintTarget)
        );
    }

    #[test]
    fn test_unconstrained_target_keeps_everything() {
        let arena = SolutionArena::new();
        let root = form(&arena, "ka", vec![leaf(&arena, 1), leaf(&arena, 2)]);
        let providers = empty_providers();
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(&arena, &providers, &config, ParsingMode::Import, &cancel);

        let target = MorphEntry::new("ka");
        assert_eq!(filter_constraints(&ctx, root, Some(&target)).unwrap(), root);
    }
}
