//! Dedup/Merge stage
//!
//! Within every word form, solutions that describe the same derivation
//! are folded into one:
//!
//! - **Exact duplicates** share content, rules, sandhi boundaries and part
//!   texts. They are merged unconditionally.
//! - **Similar solutions** agree on everything except parameters, rules
//!   and boundaries. A solution with an unknown slot absorbs every other
//!   one whose known slots it accepts.
//!
//! Merging keeps the first solution's content with unknown slots filled
//! from the absorbed one, unions the solutions of both parts, the rules
//! (by id) and the boundaries (by value), and keeps the larger collapse
//! rating. Both passes repeat until nothing merges, and every merged part
//! is deduplicated again, so running the stage twice changes nothing.

use super::arena::{Solution, SolutionId, WordForm, WordFormId};
use super::cache::FastDashMap;
use super::context::RequestContext;
use super::error::AnalysisResult;
use super::model::{MorphBase, SandhiMatch, SolutionContent, SolutionError};
use super::parallel;
use hashbrown::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Deduplicate the tree under `root`
pub fn dedup(ctx: &RequestContext<'_>, root: WordFormId) -> AnalysisResult<WordFormId> {
    Deduper::new(ctx).dedup_form(root)
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ExactKey {
    content: SolutionContent,
    rules: Vec<u64>,
    sandhi: Vec<Arc<SandhiMatch>>,
    left: Option<String>,
    right: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct SimilarKey {
    id: u64,
    base: MorphBase,
    is_virtual: Option<bool>,
    error: SolutionError,
    left: Option<String>,
    right: Option<String>,
}

/// Indices of `items` grouped by key, groups in first-occurrence order
fn group_by<K, T, F>(items: &[T], key: F) -> Vec<Vec<usize>>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let slot = *index.entry(key(item)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

struct Deduper<'c, 'a> {
    ctx: &'c RequestContext<'a>,
    forms: FastDashMap<WordFormId, WordFormId>,
    solutions: FastDashMap<SolutionId, SolutionId>,
}

impl<'c, 'a> Deduper<'c, 'a> {
    fn new(ctx: &'c RequestContext<'a>) -> Self {
        Self {
            ctx,
            forms: FastDashMap::default(),
            solutions: FastDashMap::default(),
        }
    }

    fn dedup_form(&self, id: WordFormId) -> AnalysisResult<WordFormId> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.forms.get(&id) {
            return Ok(*hit);
        }

        let form = self.ctx.arena.word_form(id);
        let mut solutions = parallel::try_map(&form.solutions, self.ctx.thresholds().dedup, |&s| {
            self.dedup_parts(s)
        })?;
        let mut changed = solutions != form.solutions;

        loop {
            self.ctx.check_canceled()?;
            let (exact, merged_exact) = self.merge_exact(solutions)?;
            let (similar, merged_similar) = self.merge_similar(exact)?;
            solutions = similar;
            if !merged_exact && !merged_similar {
                break;
            }
            changed = true;
        }

        let result = if changed {
            log_trace!(
                "'{}': {} -> {} solutions",
                form.entry,
                form.solutions.len(),
                solutions.len()
            );
            self.ctx
                .arena
                .alloc_word_form(WordForm::new(form.entry.clone(), solutions))
        } else {
            id
        };
        Ok(*self.forms.entry(id).or_insert(result))
    }

    /// The solution rewired to its deduplicated parts
    fn dedup_parts(&self, id: SolutionId) -> AnalysisResult<SolutionId> {
        if let Some(hit) = self.solutions.get(&id) {
            return Ok(*hit);
        }

        let solution = self.ctx.arena.solution(id);
        let left = solution.left.map(|l| self.dedup_form(l)).transpose()?;
        let right = solution.right.map(|r| self.dedup_form(r)).transpose()?;

        let result = if left == solution.left && right == solution.right {
            id
        } else {
            self.ctx.arena.derive_solution(id, |s| {
                s.left = left;
                s.right = right;
            })
        };
        Ok(*self.solutions.entry(id).or_insert(result))
    }

    fn part_text(&self, part: Option<WordFormId>) -> Option<String> {
        part.map(|p| self.ctx.arena.word_form(p).entry.clone())
    }

    fn merge_exact(&self, ids: Vec<SolutionId>) -> AnalysisResult<(Vec<SolutionId>, bool)> {
        let solutions: Vec<Arc<Solution>> = ids.iter().map(|&s| self.ctx.arena.solution(s)).collect();
        let groups = group_by(&solutions, |s| ExactKey {
            content: s.content.clone(),
            rules: s.rule_ids(),
            sandhi: s.sandhi_matches.clone(),
            left: self.part_text(s.left),
            right: self.part_text(s.right),
        });
        if groups.len() == ids.len() {
            return Ok((ids, false));
        }

        let mut result = Vec::with_capacity(groups.len());
        for group in groups {
            let mut merged = ids[group[0]];
            for &other in &group[1..] {
                merged = self.merge(merged, ids[other])?;
            }
            result.push(merged);
        }
        Ok((result, true))
    }

    fn merge_similar(&self, ids: Vec<SolutionId>) -> AnalysisResult<(Vec<SolutionId>, bool)> {
        let arena = self.ctx.arena;
        let solutions: Vec<Arc<Solution>> = ids.iter().map(|&s| arena.solution(s)).collect();
        let groups = group_by(&solutions, |s| SimilarKey {
            id: s.content.id,
            base: s.content.base,
            is_virtual: s.content.is_virtual,
            error: s.content.error,
            left: self.part_text(s.left),
            right: self.part_text(s.right),
        });

        let mut alive: Vec<Option<SolutionId>> = ids.iter().copied().map(Some).collect();
        let mut changed = false;
        for group in groups.iter().filter(|g| g.len() > 1) {
            for &i in group {
                let Some(mut absorber) = alive[i] else {
                    continue;
                };
                for &j in group {
                    if i == j {
                        continue;
                    }
                    let Some(other) = alive[j] else {
                        continue;
                    };
                    let mine = arena.solution(absorber).content.parameters;
                    if !mine.has_unknown() {
                        break;
                    }
                    if mine.accepts(&arena.solution(other).content.parameters) {
                        absorber = self.merge(absorber, other)?;
                        alive[j] = None;
                        changed = true;
                    }
                }
                alive[i] = Some(absorber);
            }
        }

        Ok((alive.into_iter().flatten().collect(), changed))
    }

    /// Fold `b` into `a`
    fn merge(&self, a: SolutionId, b: SolutionId) -> AnalysisResult<SolutionId> {
        let arena = self.ctx.arena;
        let first = arena.solution(a);
        let second = arena.solution(b);

        let left = self.union_parts(first.left, second.left)?;
        let right = self.union_parts(first.right, second.right)?;

        let mut merged = Solution::clone(&first);
        merged.content.parameters.override_by(&second.content.parameters);
        merged.left = left;
        merged.right = right;
        merged.collapse_rating = first.collapse_rating.max(second.collapse_rating);
        for rule in &second.rules {
            if !merged.rules.iter().any(|r| r.id == rule.id) {
                merged.rules.push(Arc::clone(rule));
            }
        }
        for sandhi in &second.sandhi_matches {
            if !merged.sandhi_matches.iter().any(|s| s == sandhi) {
                merged.sandhi_matches.push(Arc::clone(sandhi));
            }
        }
        Ok(arena.alloc_solution(merged))
    }

    fn union_parts(
        &self,
        a: Option<WordFormId>,
        b: Option<WordFormId>,
    ) -> AnalysisResult<Option<WordFormId>> {
        match (a, b) {
            (Some(x), Some(y)) if x != y => {
                let arena = self.ctx.arena;
                let first = arena.word_form(x);
                let mut solutions = first.solutions.clone();
                for &s in &arena.word_form(y).solutions {
                    if !solutions.contains(&s) {
                        solutions.push(s);
                    }
                }
                let union = arena.alloc_word_form(WordForm::new(first.entry.clone(), solutions));
                self.dedup_form(union).map(Some)
            }
            (Some(x), _) => Ok(Some(x)),
            (None, y) => Ok(y),
        }
    }
}
