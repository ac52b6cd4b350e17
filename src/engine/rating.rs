//! Rating & Sort stage
//!
//! Rates every solution bottom-up and orders each word form's solutions.
//!
//! | Solution | Rating |
//! |----------|--------|
//! | error | `0` |
//! | no rules, never folded | `2` |
//! | otherwise | `m * (L * R * rule * collapse) + f * (lf * rf) + dict` |
//!
//! where `m` and `f` are the morphological and frequency ratios of the
//! configuration, `L`/`R` the best rating of each part capped at 1, `lf`/`rf`
//! the frequency rating of each part's text, `rule` the best rule rating
//! and `dict` 1 for a dictionary-backed solution. A missing part counts
//! as 1 in both products. The result is clamped to `0..=2`.

use super::arena::{Solution, SolutionId, WordForm, WordFormId, FULL_COLLAPSE_RATING};
use super::cache::FastDashMap;
use super::config::ParsingMode;
use super::context::RequestContext;
use super::error::AnalysisResult;
use super::parallel;
use super::provider::Layer;
use std::cmp::Ordering;

/// Rating of a failed derivation
pub const ERROR_RATING: f64 = 0.0;

/// Rating of a definite dictionary leaf
pub const DEFINITE_RATING: f64 = 2.0;

/// Rate and sort the tree under `root` using frequency data of `layer`
pub fn rate_and_sort(
    ctx: &RequestContext<'_>,
    root: WordFormId,
    layer: Layer,
) -> AnalysisResult<WordFormId> {
    Rater::new(ctx, layer).rate_form(root)
}

/// Order solutions for presentation
///
/// Debug mode lists rule-derived solutions by ascending rule id first,
/// then the rest by rating. Otherwise solutions are ordered by rating,
/// best first. Equal solutions keep their relative order.
pub fn sort_solutions(solutions: &mut [(SolutionId, &Solution)], mode: ParsingMode) {
    let by_rating = |a: &Solution, b: &Solution| {
        let a = a.rating.unwrap_or(ERROR_RATING);
        let b = b.rating.unwrap_or(ERROR_RATING);
        b.total_cmp(&a)
    };

    if mode == ParsingMode::Debug {
        solutions.sort_by(|(_, a), (_, b)| match (a.first_rule(), b.first_rule()) {
            (Some(ra), Some(rb)) => ra.id.cmp(&rb.id),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => by_rating(*a, *b),
        });
    } else {
        solutions.sort_by(|(_, a), (_, b)| by_rating(*a, *b));
    }
}

struct Rater<'c, 'a> {
    ctx: &'c RequestContext<'a>,
    layer: Layer,
    forms: FastDashMap<WordFormId, WordFormId>,
    solutions: FastDashMap<SolutionId, SolutionId>,
}

impl<'c, 'a> Rater<'c, 'a> {
    fn new(ctx: &'c RequestContext<'a>, layer: Layer) -> Self {
        Self {
            ctx,
            layer,
            forms: FastDashMap::default(),
            solutions: FastDashMap::default(),
        }
    }

    fn rate_form(&self, id: WordFormId) -> AnalysisResult<WordFormId> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.forms.get(&id) {
            return Ok(*hit);
        }

        let arena = self.ctx.arena;
        let form = arena.word_form(id);
        let rated = parallel::try_map(&form.solutions, self.ctx.thresholds().rating, |&s| {
            self.rate_solution(s)
        })?;

        let resolved: Vec<_> = rated.iter().map(|&s| arena.solution(s)).collect();
        let mut order: Vec<(SolutionId, &Solution)> = rated
            .iter()
            .copied()
            .zip(resolved.iter().map(|s| s.as_ref()))
            .collect();
        if order.len() > 1 {
            sort_solutions(&mut order, self.ctx.mode);
        }
        let sorted: Vec<SolutionId> = order.into_iter().map(|(s, _)| s).collect();

        let result = if sorted == form.solutions {
            id
        } else {
            arena.alloc_word_form(WordForm::new(form.entry.clone(), sorted))
        };
        Ok(*self.forms.entry(id).or_insert(result))
    }

    fn rate_solution(&self, id: SolutionId) -> AnalysisResult<SolutionId> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.solutions.get(&id) {
            return Ok(*hit);
        }

        let arena = self.ctx.arena;
        let solution = arena.solution(id);
        let left = solution.left.map(|l| self.rate_form(l)).transpose()?;
        let right = solution.right.map(|r| self.rate_form(r)).transpose()?;

        let result = if solution.rating.is_some() && left == solution.left && right == solution.right {
            id
        } else {
            let rating = self.compute(&solution, left, right);
            arena.derive_solution(id, |s| {
                s.left = left;
                s.right = right;
                s.rating = Some(rating);
            })
        };
        Ok(*self.solutions.entry(id).or_insert(result))
    }

    fn compute(&self, solution: &Solution, left: Option<WordFormId>, right: Option<WordFormId>) -> f64 {
        if !solution.is_success() {
            return ERROR_RATING;
        }
        if solution.rules.is_empty() && solution.collapse_rating == FULL_COLLAPSE_RATING {
            return DEFINITE_RATING;
        }

        let (left_rating, left_frequency) = self.part_factors(left);
        let (right_rating, right_frequency) = self.part_factors(right);
        let rule_rating = solution.rule_rating().unwrap_or(1.0);
        let dictionary_bonus = if solution.content.is_dictionary() { 1.0 } else { 0.0 };

        let config = self.ctx.config;
        let rating = config.morph_rule_ratio()
            * (left_rating.min(1.0) * right_rating.min(1.0) * rule_rating * solution.collapse_rating)
            + config.freq_rating_ratio * (left_frequency * right_frequency)
            + dictionary_bonus;
        rating.clamp(ERROR_RATING, DEFINITE_RATING)
    }

    /// Best rating and frequency of a part, both 1 when the part is missing
    fn part_factors(&self, part: Option<WordFormId>) -> (f64, f64) {
        let Some(part) = part else {
            return (1.0, 1.0);
        };
        let arena = self.ctx.arena;
        let form = arena.word_form(part);
        let best = form
            .solutions
            .iter()
            .filter_map(|&s| arena.solution(s).rating)
            .fold(ERROR_RATING, f64::max);
        let frequency = self.ctx.providers.frequency.rating(self.layer, &form.entry);
        (best, frequency)
    }
}
