//! Property-based tests using proptest
//!
//! These tests check the parameter algebra and the analysis passes across
//! a wide range of inputs.

mod common;

use common::*;
use morphtree::engine::dedup::dedup;
use morphtree::engine::{ParallelConfig, RequestContext, StageThresholds};
use morphtree::prelude::*;
use proptest::prelude::*;

fn parameters() -> impl Strategy<Value = ParameterVector> {
    prop::array::uniform10(0u8..4).prop_map(ParameterVector::from_array)
}

// =============================================================================
// Parameter Algebra
// =============================================================================

proptest! {
    /// Overriding keeps known slots and fills unknown ones
    #[test]
    fn test_override_fills_only_unknown_slots(a in parameters(), b in parameters()) {
        let merged = a.overridden_by(&b);
        for slot in 0..PARAMETER_COUNT {
            if a.is_unknown(slot) {
                prop_assert_eq!(merged.get(slot), b.get(slot));
            } else {
                prop_assert_eq!(merged.get(slot), a.get(slot));
            }
        }
        prop_assert_eq!(merged.overridden_by(&b), merged);
    }

    /// Compatibility does not depend on the direction
    #[test]
    fn test_accepts_is_symmetric(a in parameters(), b in parameters()) {
        prop_assert_eq!(a.accepts(&b), b.accepts(&a));
        prop_assert_eq!(a.conflicts_with(&b), !a.accepts(&b));
    }

    /// Satisfying a pattern is the stricter relation
    #[test]
    fn test_satisfies_implies_accepts(a in parameters(), b in parameters()) {
        if a.satisfies(&b) {
            prop_assert!(a.accepts(&b));
        }
    }

    /// Every input satisfies the collective of all inputs
    #[test]
    fn test_collective_is_common_ground(vectors in prop::collection::vec(parameters(), 1..6)) {
        let collective = ParameterVector::collective(vectors.iter());
        for v in &vectors {
            prop_assert!(v.satisfies(&collective));
        }
        prop_assert_eq!(ParameterVector::collective([vectors[0], vectors[0]].iter()), vectors[0]);
    }
}

// =============================================================================
// Dedup
// =============================================================================

proptest! {
    /// A second dedup pass changes nothing
    #[test]
    fn test_dedup_is_idempotent(
        leaves in prop::collection::vec((1u64..4, parameters()), 1..8),
    ) {
        let arena = SolutionArena::new();
        let solutions = leaves
            .iter()
            .map(|&(id, parameters)| {
                arena.alloc_solution(Solution::new(SolutionContent {
                    id,
                    parameters,
                    base: MorphBase::None,
                    ..SolutionContent::default()
                }))
            })
            .collect();
        let root = arena.alloc_word_form(WordForm::new("ka", solutions));

        let fixture = Fixture::new(Vec::new(), Vec::new(), Vec::new());
        let config = AnalyzerConfig::default();
        let cancel = CancellationToken::new();
        let ctx = RequestContext::new(&arena, &fixture.providers, &config, ParsingMode::Analyze, &cancel);

        let once = dedup(&ctx, root).unwrap();
        let twice = dedup(&ctx, once).unwrap();
        prop_assert_eq!(once, twice);
        prop_assert!(arena.word_form(once).solutions.len() <= leaves.len());
    }
}

// =============================================================================
// Rating
// =============================================================================

fn all_ratings(tree: &SolutionTree) -> Vec<f64> {
    let mut ratings = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(form) = stack.pop() {
        for solution in tree.solutions_of(form) {
            ratings.extend(solution.rating);
            stack.extend(solution.left);
            stack.extend(solution.right);
        }
    }
    ratings
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Ratings stay within bounds whatever the weights
    #[test]
    fn test_ratings_stay_in_bounds(
        compound_rating in 0.0f64..=1.0,
        suffix_rating in 0.0f64..=1.0,
        frequency_ratio in 0.0f64..=1.0,
        stem_frequency in 0.0f64..=1.0,
        collapsed in any::<bool>(),
    ) {
        let mut compound = compound_rule(1);
        compound.rating = compound_rating;
        let mut suffix = suffix_rule(2);
        suffix.rating = suffix_rating;
        suffix.is_collapsed = collapsed;

        let fixture = Fixture::with_frequency(
            vec![stem(1, "ka"), stem(2, "ta")],
            vec![compound, suffix],
            vec![anywhere()],
            FrequencyTable::new().with_rating(0, "ka", stem_frequency),
        );
        let analyzer = fixture.analyzer_with(
            AnalyzerConfig::default()
                .with_freq_rating_ratio(frequency_ratio)
                .with_parallel(ParallelConfig::new().with_thresholds(StageThresholds::sequential())),
        );

        let tree = analyze(&analyzer, &AnalysisRequest::new(MorphEntry::new("kata")));
        let ratings = all_ratings(&tree);
        prop_assert!(!ratings.is_empty());
        for rating in ratings {
            prop_assert!((0.0..=2.0).contains(&rating));
        }
    }
}
