//! Analysis pipeline
//!
//! [`Analyzer::analyze`] runs the stages strictly in order, each one
//! finishing before the next starts:
//!
//! | Stage | Runs when |
//! |-------|-----------|
//! | parse | always |
//! | collapse | not debug mode, and the request allows collapsing |
//! | derivative filter | always |
//! | parameter propagation | always |
//! | dedup | always |
//! | constraint filter | import mode |
//! | rating & sort | not import mode |
//! | validate | debug builds |
//!
//! Caches are cleared when the analysis ends, however it ends.
//!
//! # Example
//!
//! ```rust
//! use morphtree::prelude::*;
//! use std::sync::Arc;
//!
//! let entry = MorphEntry::new("ab")
//!     .with_id(1)
//!     .with_base(MorphBase::None)
//!     .with_virtual(true);
//! let providers = Providers::new(
//!     Arc::new(InMemoryDictionary::new(vec![entry])),
//!     Arc::new(InMemoryRules::new(Vec::<MorphRule>::new(), Vec::<SandhiMatch>::new())),
//!     Arc::new(InMemoryCombinations::permissive()),
//!     Arc::new(FrequencyTable::new()),
//! );
//! let analyzer = Analyzer::new(providers, AnalyzerConfig::default()).unwrap();
//!
//! let request = AnalysisRequest::new(MorphEntry::new("ab").with_virtual(true));
//! let outcome = analyzer.analyze(&request, &CancellationToken::new()).unwrap();
//! let tree = outcome.into_tree().unwrap();
//! assert_eq!(tree.root_solutions().len(), 1);
//! ```

use super::arena::{Solution, SolutionArena, SolutionId, WordForm, WordFormId};
use super::cache::MemoStats;
use super::collapse::collapse;
use super::config::{AnalyzerConfig, ChronologicalLayer, ParsingMode};
use super::constraint::filter_constraints;
use super::context::{CancellationToken, RequestContext};
use super::debug::TreePrinter;
use super::dedup::dedup;
use super::derivative::filter_derivatives;
use super::error::{AnalysisError, AnalysisResult};
use super::model::MorphEntry;
use super::parallel::WorkerPool;
use super::parameters::{ParameterVector, PARAMETER_COUNT};
use super::parser::MorphParser;
use super::propagate::propagate;
use super::provider::{DepthObserver, Layer, Providers};
use super::rating::rate_and_sort;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Entry to analyze
    pub entry: MorphEntry,
    /// How the tree is treated
    pub mode: ParsingMode,
    /// Depth limit overriding the configured one
    pub max_depth: Option<usize>,
    /// Rule label the root is parsed with
    pub label: String,
    /// Whether collapsed rules are folded
    pub collapse: bool,
    /// Committed entry for import mode (defaults to `entry`)
    pub constraint: Option<MorphEntry>,
}

impl AnalysisRequest {
    /// Analyze an entry with default options
    pub fn new(entry: MorphEntry) -> Self {
        Self {
            entry,
            mode: ParsingMode::Analyze,
            max_depth: None,
            label: String::new(),
            collapse: true,
            constraint: None,
        }
    }

    /// Analyze a free-form text with the given parameter slots
    ///
    /// `parameters` must hold exactly [`PARAMETER_COUNT`] codes.
    pub fn from_text(text: impl Into<String>, parameters: &[u8]) -> AnalysisResult<Self> {
        let invalid = || AnalysisError::InvalidParameterCount {
            expected: PARAMETER_COUNT,
            actual: parameters.len(),
        };
        let values: [u8; PARAMETER_COUNT] = parameters.try_into().map_err(|_| invalid())?;
        let parameters = ParameterVector::from_array(values);
        Ok(Self::new(MorphEntry::new(text).with_parameters(parameters)))
    }

    /// Set the parsing mode
    pub fn with_mode(mut self, mode: ParsingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the depth limit
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set the root rule label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Enable or disable collapsing
    pub fn with_collapse(mut self, collapse: bool) -> Self {
        self.collapse = collapse;
        self
    }

    /// Set the committed entry checked in import mode
    pub fn with_constraint(mut self, constraint: MorphEntry) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// How an analysis ended
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Every stage ran
    Completed(SolutionTree),
    /// The caller canceled; nothing was produced
    Canceled,
}

impl AnalysisOutcome {
    /// Whether the analysis was canceled
    pub fn is_canceled(&self) -> bool {
        matches!(self, AnalysisOutcome::Canceled)
    }

    /// The tree, if the analysis completed
    pub fn tree(&self) -> Option<&SolutionTree> {
        match self {
            AnalysisOutcome::Completed(tree) => Some(tree),
            AnalysisOutcome::Canceled => None,
        }
    }

    /// Take the tree, if the analysis completed
    pub fn into_tree(self) -> Option<SolutionTree> {
        match self {
            AnalysisOutcome::Completed(tree) => Some(tree),
            AnalysisOutcome::Canceled => None,
        }
    }
}

/// Result of a completed analysis
///
/// Owns every node; handles returned by its accessors are only valid for
/// this tree.
#[derive(Debug)]
pub struct SolutionTree {
    arena: SolutionArena,
    root: WordFormId,
    mode: ParsingMode,
    memo: MemoStats,
    max_depth: usize,
}

impl SolutionTree {
    /// Root word form handle
    pub fn root(&self) -> WordFormId {
        self.root
    }

    /// Root word form
    pub fn root_form(&self) -> Arc<WordForm> {
        self.arena.word_form(self.root)
    }

    /// Solutions of the root, in final order
    pub fn root_solutions(&self) -> Vec<Arc<Solution>> {
        self.arena.solutions_of(self.root)
    }

    /// Look up a word form of this tree
    pub fn word_form(&self, id: WordFormId) -> Option<Arc<WordForm>> {
        self.arena.try_word_form(id)
    }

    /// Look up a solution of this tree
    pub fn solution(&self, id: SolutionId) -> Option<Arc<Solution>> {
        self.arena.try_solution(id)
    }

    /// Solutions of a word form of this tree
    pub fn solutions_of(&self, id: WordFormId) -> Vec<Arc<Solution>> {
        self.arena.solutions_of(id)
    }

    /// Node storage
    pub fn arena(&self) -> &SolutionArena {
        &self.arena
    }

    /// Mode the tree was built in
    pub fn mode(&self) -> ParsingMode {
        self.mode
    }

    /// Memo statistics of the parse
    pub fn memo_stats(&self) -> MemoStats {
        self.memo
    }

    /// Deepest recursion level the parse reached
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Dictionary ids of the leaves reachable through successful solutions
    pub fn dictionary_ids(&self) -> BTreeSet<u64> {
        leaf_dictionary_ids(&self.arena, self.root)
    }

    /// Indented text rendering
    pub fn render(&self) -> String {
        TreePrinter::new().print(&self.arena, self.root)
    }
}

/// Dictionary ids of the successful leaves under `root`
pub fn leaf_dictionary_ids(arena: &SolutionArena, root: WordFormId) -> BTreeSet<u64> {
    let mut ids = BTreeSet::new();
    let mut seen = hashbrown::HashSet::new();
    let mut stack = vec![root];
    while let Some(form) = stack.pop() {
        if !seen.insert(form) {
            continue;
        }
        for solution in arena.solutions_of(form) {
            if !solution.is_success() {
                continue;
            }
            if solution.left.is_none() && solution.right.is_none() && solution.content.is_dictionary()
            {
                ids.insert(solution.content.id);
            }
            stack.extend(solution.left);
            stack.extend(solution.right);
        }
    }
    ids
}

/// Runs analyses against one set of providers
///
/// The analyzer holds no per-request state, so one instance can serve
/// concurrent requests.
#[derive(Debug)]
pub struct Analyzer {
    providers: Providers,
    config: AnalyzerConfig,
    pool: WorkerPool,
}

impl Analyzer {
    /// Create an analyzer, building its worker pool
    pub fn new(providers: Providers, config: AnalyzerConfig) -> AnalysisResult<Self> {
        let pool = WorkerPool::new(&config.parallel)?;
        Ok(Self {
            providers,
            config,
            pool,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Providers in use
    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Analyze an entry
    ///
    /// Cancellation is not an error: it yields
    /// [`AnalysisOutcome::Canceled`].
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> AnalysisResult<AnalysisOutcome> {
        self.run(request, cancel, None)
    }

    /// Analyze an entry, reporting depth progress to `observer`
    pub fn analyze_with_observer(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
        observer: &dyn DepthObserver,
    ) -> AnalysisResult<AnalysisOutcome> {
        self.run(request, cancel, Some(observer))
    }

    fn run(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
        observer: Option<&dyn DepthObserver>,
    ) -> AnalysisResult<AnalysisOutcome> {
        if request.entry.entry.is_empty() {
            return Err(AnalysisError::EmptyEntry);
        }

        let arena = SolutionArena::for_entry(request.entry.entry.len());
        let finished = {
            let mut ctx = RequestContext::new(
                &arena,
                &self.providers,
                &self.config,
                request.mode,
                cancel,
            )
            .with_max_depth(request.max_depth.unwrap_or(self.config.max_depth_level));
            if let Some(observer) = observer {
                ctx = ctx.with_observer(observer);
            }

            let result = self.pool.install(|| self.run_stages(&ctx, request));
            let stats = ctx.memo.stats();
            let deepest = ctx.depth.deepest();
            ctx.clear_caches();
            result.map(|root| (root, stats, deepest))
        };

        match finished {
            Ok((root, memo, max_depth)) => Ok(AnalysisOutcome::Completed(SolutionTree {
                arena,
                root,
                mode: request.mode,
                memo,
                max_depth,
            })),
            Err(AnalysisError::Canceled) => {
                log_debug!("analysis of '{}' canceled", request.entry.entry);
                Ok(AnalysisOutcome::Canceled)
            }
            Err(e) => Err(e),
        }
    }

    fn run_stages(
        &self,
        ctx: &RequestContext<'_>,
        request: &AnalysisRequest,
    ) -> AnalysisResult<WordFormId> {
        let mode = request.mode;

        let mut root = MorphParser::new(ctx).parse(&request.entry, &request.label)?;
        let stats = ctx.memo.stats();
        log_debug!(
            "parsed '{}': {} solutions, depth {}, memo {} entries ({:.1}% hits)",
            request.entry.entry,
            ctx.arena.solution_count(),
            ctx.depth.deepest(),
            stats.entries,
            stats.hit_rate * 100.0
        );

        if mode != ParsingMode::Debug && request.collapse {
            root = collapse(ctx, root)?;
            log_trace!("collapse done");
        }
        root = filter_derivatives(ctx, root)?;
        root = propagate(ctx, root)?;
        root = dedup(ctx, root)?;
        log_trace!("filter, propagation and dedup done");

        if mode == ParsingMode::Import {
            let target = request.constraint.as_ref().unwrap_or(&request.entry);
            root = filter_constraints(ctx, root, Some(target))?;
        } else {
            root = rate_and_sort(ctx, root, self.layer_for(&request.entry))?;
        }

        #[cfg(debug_assertions)]
        if let Err(violation) = super::validate::validate_tree(ctx, root) {
            panic!("solution tree integrity violated: {}", violation);
        }

        if mode == ParsingMode::Analyze && ctx.arena.word_form(root).is_empty() {
            return Err(AnalysisError::NoSolutions {
                entry: request.entry.entry.clone(),
            });
        }
        log_debug!(
            "analysis of '{}' finished with {} root solutions",
            request.entry.entry,
            ctx.arena.word_form(root).solutions.len()
        );
        Ok(root)
    }

    fn layer_for(&self, entry: &MorphEntry) -> Layer {
        match self.config.layer {
            ChronologicalLayer::Fixed(layer) => layer,
            ChronologicalLayer::Auto => self.providers.frequency.layer_for_entry(&entry.entry),
        }
    }
}
