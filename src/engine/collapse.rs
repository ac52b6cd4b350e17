//! Collapse stage
//!
//! A solution produced by a collapsed rule is not kept as its own node:
//! the solutions of its left part take its place one level up. Lifted
//! solutions are copies whose collapse rating is multiplied by the
//! collapsed solution's collapse rating and its rule's rating.
//!
//! Lifting can change the text a word form stands for. A word form is
//! therefore collapsed into one or more *groups*, one per resulting text.
//! A parent whose child splits into several groups is rebuilt once per
//! group combination; the copy keeping the original text replaces the
//! parent, the others are hoisted next to it as siblings. The root keeps
//! its own text and simply receives every group's solutions.
//!
//! The walk is post-order and memoized per node, so shared sub-trees are
//! collapsed once and stay shared.

use super::arena::{SolutionId, WordForm, WordFormId, FULL_COLLAPSE_RATING};
use super::cache::FastDashMap;
use super::context::RequestContext;
use super::error::AnalysisResult;
use super::parallel;
use std::sync::Arc;

/// Collapse the tree under `root`
///
/// Returns `root` itself if nothing was collapsed.
pub fn collapse(ctx: &RequestContext<'_>, root: WordFormId) -> AnalysisResult<WordFormId> {
    Collapser::new(ctx).collapse_root(root)
}

/// Where a collapsed solution ends up
#[derive(Debug, Clone)]
struct Placement {
    /// Text of the group it joins, `None` for the word form it came from
    text: Option<String>,
    solution: SolutionId,
}

struct Collapser<'c, 'a> {
    ctx: &'c RequestContext<'a>,
    forms: FastDashMap<WordFormId, Arc<[WordFormId]>>,
    placements: FastDashMap<SolutionId, Arc<[Placement]>>,
}

impl<'c, 'a> Collapser<'c, 'a> {
    fn new(ctx: &'c RequestContext<'a>) -> Self {
        Self {
            ctx,
            forms: FastDashMap::default(),
            placements: FastDashMap::default(),
        }
    }

    fn collapse_root(&self, root: WordFormId) -> AnalysisResult<WordFormId> {
        let groups = self.collapse_form(root)?;
        if groups.len() == 1 && groups[0] == root {
            return Ok(root);
        }

        let arena = self.ctx.arena;
        let entry = arena.word_form(root).entry.clone();
        let solutions = groups
            .iter()
            .flat_map(|&group| arena.word_form(group).solutions.clone())
            .collect();
        log_debug!("collapsed root '{}' from {} groups", entry, groups.len());
        Ok(arena.alloc_word_form(WordForm::new(entry, solutions)))
    }

    /// Collapse one word form into its groups, first group first
    fn collapse_form(&self, id: WordFormId) -> AnalysisResult<Arc<[WordFormId]>> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.forms.get(&id) {
            return Ok(Arc::clone(&hit));
        }

        let arena = self.ctx.arena;
        let form = arena.word_form(id);
        let placed = parallel::try_map(&form.solutions, self.ctx.thresholds().collapse, |&s| {
            self.place(s)
        })?;

        let mut groups: Vec<(String, Vec<SolutionId>)> = vec![(form.entry.clone(), Vec::new())];
        for placement in placed.iter().flat_map(|p| p.iter()) {
            let text = placement.text.as_deref().unwrap_or(&form.entry);
            match groups.iter().position(|(t, _)| t == text) {
                Some(i) => groups[i].1.push(placement.solution),
                None => groups.push((text.to_string(), vec![placement.solution])),
            }
        }
        if groups.len() > 1 && groups[0].1.is_empty() {
            groups.remove(0);
        }

        let unchanged =
            groups.len() == 1 && groups[0].0 == form.entry && groups[0].1 == form.solutions;
        let result: Arc<[WordFormId]> = if unchanged {
            Arc::from([id])
        } else {
            groups
                .into_iter()
                .map(|(text, solutions)| arena.alloc_word_form(WordForm::new(text, solutions)))
                .collect()
        };
        Ok(Arc::clone(&self.forms.entry(id).or_insert(result)))
    }

    /// Where a solution lands after its sub-tree was collapsed
    fn place(&self, id: SolutionId) -> AnalysisResult<Arc<[Placement]>> {
        self.ctx.check_canceled()?;
        if let Some(hit) = self.placements.get(&id) {
            return Ok(Arc::clone(&hit));
        }

        let arena = self.ctx.arena;
        let mut placements = Vec::new();
        for variant in self.rebuild(id)? {
            let solution = arena.solution(variant);
            if !solution.is_collapsed() {
                placements.push(Placement {
                    text: None,
                    solution: variant,
                });
                continue;
            }
            let Some(left) = solution.left else {
                log_trace!("dropping collapsed solution without left part");
                continue;
            };

            let factor =
                solution.collapse_rating * solution.first_rule().map_or(1.0, |r| r.rating);
            let lifted = arena.word_form(left);
            for &child in &lifted.solutions {
                let child = if factor == FULL_COLLAPSE_RATING {
                    child
                } else {
                    arena.derive_solution(child, |s| s.collapse_rating *= factor)
                };
                placements.push(Placement {
                    text: Some(lifted.entry.clone()),
                    solution: child,
                });
            }
        }

        let placements: Arc<[Placement]> = placements.into();
        Ok(Arc::clone(&self.placements.entry(id).or_insert(placements)))
    }

    /// The solution rewired to its collapsed children, once per group pair
    fn rebuild(&self, id: SolutionId) -> AnalysisResult<Vec<SolutionId>> {
        let solution = self.ctx.arena.solution(id);
        let lefts = self.collapse_side(solution.left)?;
        let rights = self.collapse_side(solution.right)?;

        if lefts == [solution.left] && rights == [solution.right] {
            return Ok(vec![id]);
        }

        let mut variants = Vec::with_capacity(lefts.len() * rights.len());
        for &left in &lefts {
            for &right in &rights {
                variants.push(self.ctx.arena.derive_solution(id, |s| {
                    s.left = left;
                    s.right = right;
                }));
            }
        }
        Ok(variants)
    }

    fn collapse_side(&self, side: Option<WordFormId>) -> AnalysisResult<Vec<Option<WordFormId>>> {
        match side {
            Some(form) => Ok(self.collapse_form(form)?.iter().copied().map(Some).collect()),
            None => Ok(vec![None]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arena::SolutionArena;
    use crate::engine::config::{AnalyzerConfig, ParsingMode};
    use crate::engine::context::CancellationToken;
    use crate::engine::test_support::{derived, empty_providers, form, leaf, rule};

    fn run<F>(build: F) -> (SolutionArena, WordFormId, WordFormId)
    where
        F: FnOnce(&SolutionArena) -> WordFormId,
    {
        let arena = SolutionArena::new();
        let root = build(&arena);
        let providers = empty_providers();
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(&arena, &providers, &config, ParsingMode::Analyze, &cancel);
        let collapsed = collapse(&ctx, root).unwrap();
        (arena, root, collapsed)
    }

    #[test]
    fn test_no_collapsed_rules_is_noop() {
        let (_, root, collapsed) = run(|arena| {
            let plain = rule(1, false, 1.0);
            let ka = form(arena, "ka", vec![leaf(arena, 1)]);
            let ta = form(arena, "ta", vec![leaf(arena, 2)]);
            let s = derived(arena, &plain, Some(ka), Some(ta));
            form(arena, "kata", vec![s])
        });
        assert_eq!(root, collapsed);
    }

    #[test]
    fn test_lifts_left_solutions_with_rating() {
        let (arena, _, collapsed) = run(|arena| {
            let plain = rule(1, false, 1.0);
            let folded = rule(2, true, 0.5);
            let kaa = form(arena, "kaa", vec![leaf(arena, 7)]);
            let b = derived(arena, &folded, Some(kaa), None);
            let ka = form(arena, "ka", vec![b]);
            let ta = form(arena, "ta", vec![leaf(arena, 2)]);
            let a = derived(arena, &plain, Some(ka), Some(ta));
            form(arena, "kata", vec![a])
        });

        let root = arena.word_form(collapsed);
        assert_eq!(root.entry, "kata");
        assert_eq!(root.solutions.len(), 1);

        let a = arena.solution(root.solutions[0]);
        let left = arena.word_form(a.left.unwrap());
        assert_eq!(left.entry, "kaa");
        let lifted = arena.solution(left.solutions[0]);
        assert_eq!(lifted.content.id, 7);
        assert!((lifted.collapse_rating - 0.5).abs() < 1e-9);
        assert!(!lifted.is_collapsed());
    }

    #[test]
    fn test_collapsed_root_keeps_text() {
        let (arena, _, collapsed) = run(|arena| {
            let folded = rule(2, true, 1.0);
            let inner = leaf(arena, 3);
            let y = form(arena, "y", vec![inner]);
            let c = derived(arena, &folded, Some(y), None);
            form(arena, "x", vec![c])
        });

        let root = arena.word_form(collapsed);
        assert_eq!(root.entry, "x");
        assert_eq!(root.solutions.len(), 1);
        let only = arena.solution(root.solutions[0]);
        assert_eq!(only.content.id, 3);
    }

    #[test]
    fn test_collapsed_without_left_is_dropped() {
        let (arena, _, collapsed) = run(|arena| {
            let folded = rule(2, true, 1.0);
            let y = form(arena, "y", vec![leaf(arena, 3)]);
            let c = derived(arena, &folded, None, Some(y));
            let keep = leaf(arena, 4);
            form(arena, "x", vec![c, keep])
        });

        let root = arena.word_form(collapsed);
        assert_eq!(root.solutions.len(), 1);
        assert_eq!(arena.solution(root.solutions[0]).content.id, 4);
    }

    #[test]
    fn test_hoists_siblings_for_each_text() {
        let (arena, _, collapsed) = run(|arena| {
            let plain = rule(1, false, 1.0);
            let folded = rule(2, true, 1.0);
            let kaa = form(arena, "kaa", vec![leaf(arena, 10)]);
            let kah = form(arena, "kah", vec![leaf(arena, 11)]);
            let b1 = derived(arena, &folded, Some(kaa), None);
            let b2 = derived(arena, &folded, Some(kah), None);
            let n = leaf(arena, 12);
            let ka = form(arena, "ka", vec![b1, n, b2]);
            let ta = form(arena, "ta", vec![leaf(arena, 2)]);
            let a = derived(arena, &plain, Some(ka), Some(ta));
            form(arena, "kata", vec![a])
        });

        let root = arena.word_form(collapsed);
        assert_eq!(root.solutions.len(), 3);
        let left_texts: Vec<String> = root
            .solutions
            .iter()
            .map(|&s| arena.word_form(arena.solution(s).left.unwrap()).entry.clone())
            .collect();
        assert_eq!(left_texts, vec!["ka", "kaa", "kah"]);

        // the right part is shared unchanged by every hoisted sibling
        let rights: Vec<_> = root
            .solutions
            .iter()
            .map(|&s| arena.solution(s).right.unwrap())
            .collect();
        assert!(rights.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_shared_subtree_collapsed_once() {
        let (arena, _, collapsed) = run(|arena| {
            let plain = rule(1, false, 1.0);
            let folded = rule(2, true, 0.5);
            let kaa = form(arena, "kaa", vec![leaf(arena, 7)]);
            let b = derived(arena, &folded, Some(kaa), None);
            let shared = form(arena, "ka", vec![b]);
            let a1 = derived(arena, &plain, Some(shared), None);
            let a2 = derived(arena, &plain, None, Some(shared));
            form(arena, "root", vec![a1, a2])
        });

        let root = arena.word_form(collapsed);
        let a1 = arena.solution(root.solutions[0]);
        let a2 = arena.solution(root.solutions[1]);
        assert_eq!(a1.left, a2.right);
    }

    #[test]
    fn test_chained_collapse() {
        let (arena, _, collapsed) = run(|arena| {
            let plain = rule(1, false, 1.0);
            let outer = rule(2, true, 0.5);
            let inner = rule(3, true, 0.5);
            let base = form(arena, "kaa", vec![leaf(arena, 9)]);
            let c2 = derived(arena, &inner, Some(base), None);
            let mid = form(arena, "kax", vec![c2]);
            let c1 = derived(arena, &outer, Some(mid), None);
            let ka = form(arena, "ka", vec![c1]);
            let a = derived(arena, &plain, Some(ka), None);
            form(arena, "kat", vec![a])
        });

        let root = arena.word_form(collapsed);
        let a = arena.solution(root.solutions[0]);
        let left = arena.word_form(a.left.unwrap());
        assert_eq!(left.entry, "kaa");
        let lifted = arena.solution(left.solutions[0]);
        assert_eq!(lifted.content.id, 9);
        assert!((lifted.collapse_rating - 0.25).abs() < 1e-9);
    }
}
