//! Per-request analysis context
//!
//! All mutable state of one analysis lives in a [`RequestContext`] that
//! is created when the request starts and dropped when it ends. Stages
//! receive the context by reference, so the same [`Analyzer`] can serve
//! concurrent requests without sharing anything but the providers.
//!
//! [`Analyzer`]: super::pipeline::Analyzer

use super::arena::SolutionArena;
use super::cache::SandhiMemo;
use super::config::{AnalyzerConfig, ParsingMode, StageThresholds};
use super::error::{AnalysisError, AnalysisResult};
use super::provider::{DepthObserver, Providers};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and an analysis
///
/// Workers poll it at every loop iteration and recursive entry.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not canceled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Fail with [`AnalysisError::Canceled`] if cancellation was requested
    #[inline]
    pub fn check(&self) -> AnalysisResult<()> {
        if self.is_canceled() {
            Err(AnalysisError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Tracks the deepest recursion level reached and reports growth
pub struct DepthTracker<'a> {
    deepest: AtomicUsize,
    observer: Option<&'a dyn DepthObserver>,
}

impl<'a> DepthTracker<'a> {
    /// Create a tracker starting at depth 0
    pub fn new(observer: Option<&'a dyn DepthObserver>) -> Self {
        Self {
            deepest: AtomicUsize::new(0),
            observer,
        }
    }

    /// Record that `depth` was reached, notifying on a new maximum
    #[inline]
    pub fn reach(&self, depth: usize) {
        let previous = self.deepest.fetch_max(depth, Ordering::AcqRel);
        if depth > previous {
            if let Some(observer) = self.observer {
                observer.depth_changed(depth);
            }
        }
    }

    /// Deepest level reached so far
    #[inline]
    pub fn deepest(&self) -> usize {
        self.deepest.load(Ordering::Acquire)
    }

    /// Start over at depth 0
    pub fn reset(&self) {
        self.deepest.store(0, Ordering::Release);
    }
}

impl std::fmt::Debug for DepthTracker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthTracker")
            .field("deepest", &self.deepest())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

/// Mutable state of one analysis
#[derive(Debug)]
pub struct RequestContext<'a> {
    /// Node storage
    pub arena: &'a SolutionArena,
    /// Memoized sandhi resolutions
    pub memo: SandhiMemo,
    /// Data providers
    pub providers: &'a Providers,
    /// Analyzer configuration
    pub config: &'a AnalyzerConfig,
    /// How the tree is treated
    pub mode: ParsingMode,
    /// Depth limit of this request
    pub max_depth: usize,
    /// Depth progress
    pub depth: DepthTracker<'a>,
    /// Cancellation flag
    pub cancel: &'a CancellationToken,
}

impl<'a> RequestContext<'a> {
    /// Create a context for one request
    pub fn new(
        arena: &'a SolutionArena,
        providers: &'a Providers,
        config: &'a AnalyzerConfig,
        mode: ParsingMode,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            arena,
            memo: SandhiMemo::new(),
            providers,
            config,
            mode,
            max_depth: config.max_depth_level,
            depth: DepthTracker::new(None),
            cancel,
        }
    }

    /// Override the depth limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Attach a depth observer
    pub fn with_observer(mut self, observer: &'a dyn DepthObserver) -> Self {
        self.depth = DepthTracker::new(Some(observer));
        self
    }

    /// Fan-out thresholds
    #[inline]
    pub fn thresholds(&self) -> &StageThresholds {
        &self.config.parallel.thresholds
    }

    /// Fail if cancellation was requested
    #[inline]
    pub fn check_canceled(&self) -> AnalysisResult<()> {
        self.cancel.check()
    }

    /// Whether failed derivations stay in the tree
    #[inline]
    pub fn keeps_errors(&self) -> bool {
        self.mode.keeps_errors()
    }

    /// Clear the memo and every provider cache
    pub fn clear_caches(&self) {
        self.memo.clear();
        self.providers.clear_caches();
    }
}
