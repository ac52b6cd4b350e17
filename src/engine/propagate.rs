//! Parameter propagation
//!
//! Fills unknown parameter slots of a solution from what all of its
//! contributing parts agree on. Which parts contribute is given by the
//! solution's base. The merged vector is refined against the combination
//! provider; if the parts' values cannot all be taken together, they are
//! tried slot by slot and only the slots that keep the vector valid are
//! kept.
//!
//! Propagation never changes a known slot, and parts are propagated
//! before the solutions built on them.

use super::arena::{SolutionId, WordForm, WordFormId};
use super::cache::FastDashMap;
use super::context::RequestContext;
use super::error::AnalysisResult;
use super::model::MorphBase;
use super::parallel;
use super::parameters::ParameterVector;

/// Propagate parameters through the tree under `root`
pub fn propagate(ctx: &RequestContext<'_>, root: WordFormId) -> AnalysisResult<WordFormId> {
    Propagator::new(ctx).propagate_form(root)
}

/// Merge the parts' common parameters into `parameters`
///
/// Returns the refined vector, which equals the input when nothing could
/// be added.
pub fn merge_collective(
    ctx: &RequestContext<'_>,
    parameters: &ParameterVector,
    collective: &ParameterVector,
) -> AnalysisResult<ParameterVector> {
    let combinations = &ctx.providers.combinations;

    let merged = parameters.overridden_by(collective);
    if merged == *parameters {
        return Ok(merged);
    }
    if let Some(refined) = combinations.collective(&merged)? {
        return Ok(merged.overridden_by(&refined));
    }

    let mut trial = *parameters;
    for (slot, value) in collective.known() {
        if !trial.is_unknown(slot) {
            continue;
        }
        let candidate = trial.with(slot, value);
        if combinations.collective(&candidate)?.is_some() {
            trial = candidate;
        }
    }
    if let Some(refined) = combinations.collective(&trial)? {
        trial.override_by(&refined);
    }
    Ok(trial)
}

struct Propagator<'c, 'a> {
    ctx: &'c RequestContext<'a>,
    forms: FastDashMap<WordFormId, WordFormId>,
    solutions: FastDashMap<SolutionId, SolutionId>,
}

impl<'c, 'a> Propagator<'c, 'a> {
    fn new(ctx: &'c RequestContext<'a>) -> Self {
        Self {
            ctx,
            forms: FastDashMap::default(),
            solutions: FastDashMap::default(),
        }
    }

    fn propagate_form(&self, id: WordFormId) -> AnalysisResult<WordFormId> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.forms.get(&id) {
            return Ok(*hit);
        }

        let form = self.ctx.arena.word_form(id);
        let updated = parallel::try_map(&form.solutions, self.ctx.thresholds().propagate, |&s| {
            self.propagate_solution(s)
        })?;

        let result = if updated == form.solutions {
            id
        } else {
            self.ctx
                .arena
                .alloc_word_form(WordForm::new(form.entry.clone(), updated))
        };
        Ok(*self.forms.entry(id).or_insert(result))
    }

    fn propagate_solution(&self, id: SolutionId) -> AnalysisResult<SolutionId> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.solutions.get(&id) {
            return Ok(*hit);
        }

        let arena = self.ctx.arena;
        let solution = arena.solution(id);
        let left = solution.left.map(|l| self.propagate_form(l)).transpose()?;
        let right = solution.right.map(|r| self.propagate_form(r)).transpose()?;

        let parameters = solution.content.parameters;
        let sources: Vec<WordFormId> = match solution.content.base {
            MorphBase::Left => left.into_iter().collect(),
            MorphBase::Right => right.into_iter().collect(),
            MorphBase::Both => left.into_iter().chain(right).collect(),
            MorphBase::None | MorphBase::Unknown => Vec::new(),
        };

        let mut refined = parameters;
        if parameters.has_unknown() && !sources.is_empty() {
            let part_parameters: Vec<ParameterVector> = sources
                .iter()
                .flat_map(|&form| arena.solutions_of(form))
                .filter(|s| s.is_success())
                .map(|s| s.content.parameters)
                .collect();
            if !part_parameters.is_empty() {
                let collective = ParameterVector::collective(&part_parameters);
                refined = merge_collective(self.ctx, &parameters, &collective)?;
            }
        }

        let result = if refined == parameters && left == solution.left && right == solution.right {
            id
        } else {
            if refined != parameters {
                log_trace!("propagated {} -> {}", parameters, refined);
            }
            arena.derive_solution(id, |s| {
                s.content.parameters = refined;
                s.left = left;
                s.right = right;
            })
        };
        Ok(*self.solutions.entry(id).or_insert(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arena::{Solution, SolutionArena};
    use crate::engine::config::{AnalyzerConfig, ParsingMode};
    use crate::engine::context::CancellationToken;
    use crate::engine::provider::Providers;
    use crate::engine::test_support::{content, empty_providers, form, with_combinations};

    fn part(arena: &SolutionArena, id: u64, parameters: ParameterVector) -> SolutionId {
        arena.alloc_solution(Solution::new(content(id, parameters, MorphBase::None)))
    }

    fn run(providers: &Providers, arena: &SolutionArena, root: WordFormId) -> WordFormId {
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(arena, providers, &config, ParsingMode::Analyze, &cancel);
        propagate(&ctx, root).unwrap()
    }

    fn parent_parameters(arena: &SolutionArena, root: WordFormId) -> ParameterVector {
        arena.solution(arena.word_form(root).solutions[0]).content.parameters
    }

    #[test]
    fn test_fills_from_agreeing_parts() {
        let arena = SolutionArena::new();
        let left = form(
            &arena,
            "ka",
            vec![
                part(&arena, 1, ParameterVector::from_array([1, 2, 0, 0, 0, 0, 0, 0, 0, 0])),
                part(&arena, 2, ParameterVector::from_array([1, 3, 0, 0, 0, 0, 0, 0, 0, 0])),
            ],
        );
        let parent = arena.alloc_solution(
            Solution::new(content(0, ParameterVector::new(), MorphBase::Left))
                .with_children(Some(left), None),
        );
        let root = form(&arena, "kata", vec![parent]);

        let result = run(&empty_providers(), &arena, root);
        let params = parent_parameters(&arena, result);
        assert_eq!(params.get(0), 1);
        assert!(params.is_unknown(1));
    }

    #[test]
    fn test_never_overwrites_known_slot() {
        let arena = SolutionArena::new();
        let left = form(
            &arena,
            "ka",
            vec![part(&arena, 1, ParameterVector::new().with(0, 1).with(1, 2))],
        );
        let parent = arena.alloc_solution(
            Solution::new(content(0, ParameterVector::new().with(0, 4), MorphBase::Left))
                .with_children(Some(left), None),
        );
        let root = form(&arena, "kata", vec![parent]);

        let params = parent_parameters(&arena, run(&empty_providers(), &arena, root));
        assert_eq!(params.get(0), 4);
        assert_eq!(params.get(1), 2);
    }

    #[test]
    fn test_falls_back_to_single_slots() {
        let arena = SolutionArena::new();
        let providers = with_combinations(vec![
            ParameterVector::new().with(0, 1).with(1, 5),
            ParameterVector::new().with(0, 2).with(1, 5),
        ]);
        let both = form(
            &arena,
            "ka",
            vec![part(&arena, 1, ParameterVector::new().with(0, 1).with(1, 7))],
        );
        let parent = arena.alloc_solution(
            Solution::new(content(0, ParameterVector::new(), MorphBase::Both))
                .with_children(Some(both), None),
        );
        let root = form(&arena, "kata", vec![parent]);

        let params = parent_parameters(&arena, run(&providers, &arena, root));
        assert_eq!(params.get(0), 1);
        assert_eq!(params.get(1), 5);
    }

    #[test]
    fn test_root_base_is_untouched() {
        let arena = SolutionArena::new();
        let left = form(&arena, "ka", vec![part(&arena, 1, ParameterVector::new().with(0, 1))]);
        let parent = arena.alloc_solution(
            Solution::new(content(0, ParameterVector::new(), MorphBase::None))
                .with_children(Some(left), None),
        );
        let root = form(&arena, "kata", vec![parent]);

        assert_eq!(run(&empty_providers(), &arena, root), root);
    }

    #[test]
    fn test_right_base_reads_right_part() {
        let arena = SolutionArena::new();
        let left = form(&arena, "ka", vec![part(&arena, 1, ParameterVector::new().with(0, 1))]);
        let right = form(&arena, "ta", vec![part(&arena, 2, ParameterVector::new().with(0, 2))]);
        let parent = arena.alloc_solution(
            Solution::new(content(0, ParameterVector::new(), MorphBase::Right))
                .with_children(Some(left), Some(right)),
        );
        let root = form(&arena, "kata", vec![parent]);

        let params = parent_parameters(&arena, run(&empty_providers(), &arena, root));
        assert_eq!(params.get(0), 2);
    }
}
