//! Recursive morphological parser
//!
//! Builds the raw solution tree for one entry. A text is looked up in the
//! dictionary first; what the dictionary cannot fully explain is split by
//! rules across sandhi boundaries and both halves are parsed recursively.
//!
//! # Sharing
//!
//! Every sandhi resolution is memoized in the request's [`SandhiMemo`],
//! so identical sub-problems reached through different parents resolve to
//! the same [`SolutionId`]. The tree is therefore a DAG.
//!
//! # Depth
//!
//! Each resolution descends one level. A resolution that would exceed the
//! request's depth limit becomes a terminal
//! [`SolutionError::DepthIsExceeded`] solution.
//!
//! [`SandhiMemo`]: super::cache::SandhiMemo

use super::arena::{Solution, SolutionId, WordForm, WordFormId};
use super::cache::SandhiKey;
use super::context::RequestContext;
use super::error::{AnalysisError, AnalysisResult};
use super::model::{
    EntryTemplate, MorphBase, MorphEntry, MorphRule, MorphRuleType, SandhiGroup, SandhiMatch,
    SolutionContent, SolutionError,
};
use super::parallel;
use super::parameters::ParameterVector;
use super::regex_cache;
use hashbrown::HashSet;
use std::sync::Arc;

/// Label that restricts a lookup to the dictionary
pub const DICTIONARY_LABEL: &str = "dict";

/// What a free-form text must look like
#[derive(Debug, Clone, Copy)]
pub struct FormQuery<'q> {
    /// Surface text
    pub text: &'q str,
    /// Required parameter slots
    pub parameters: ParameterVector,
    /// Required base (`Unknown` accepts any)
    pub base: MorphBase,
    /// Required virtual flag (`None` accepts any)
    pub is_virtual: Option<bool>,
    /// Rule label
    pub label: &'q str,
}

impl<'q> FormQuery<'q> {
    /// Query for a text with no requirements and the default label
    pub fn new(text: &'q str) -> Self {
        Self {
            text,
            parameters: ParameterVector::new(),
            base: MorphBase::Unknown,
            is_virtual: None,
            label: "",
        }
    }

    /// Set the required parameters
    pub fn with_parameters(mut self, parameters: ParameterVector) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the required base
    pub fn with_base(mut self, base: MorphBase) -> Self {
        self.base = base;
        self
    }

    /// Set the required virtual flag
    pub fn with_virtual(mut self, is_virtual: Option<bool>) -> Self {
        self.is_virtual = is_virtual;
        self
    }

    /// Set the rule label
    pub fn with_label(mut self, label: &'q str) -> Self {
        self.label = label;
        self
    }

    fn consults_dictionary(&self) -> bool {
        self.label.is_empty() || self.label == DICTIONARY_LABEL
    }

    fn content(&self) -> SolutionContent {
        SolutionContent::synthesized(self.parameters, self.base, self.is_virtual)
    }
}

/// One way to split a text across a sandhi boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandhiCandidate {
    /// Text of the left part
    pub left: String,
    /// Text of the right part
    pub right: String,
    /// Boundary the split was made at
    pub sandhi: Arc<SandhiMatch>,
}

/// Whether a solution's children cover what its base requires
pub fn is_complete(base: MorphBase, has_left: bool, has_right: bool) -> bool {
    match base {
        MorphBase::None => true,
        MorphBase::Left => has_left,
        MorphBase::Right => has_right,
        MorphBase::Both => has_left && has_right,
        MorphBase::Unknown => has_left || has_right,
    }
}

/// All splits of `text` a rule may make across the given boundaries
///
/// Every occurrence of a boundary's expression is a split point. The
/// expression is replaced by the boundary's left and/or right resolution
/// according to the sandhi group, then each side is run through the
/// rule's entry template. Rules with regex templates also try the
/// one-sided groups when their own group is [`SandhiGroup::Both`].
pub fn sandhi_candidates(
    text: &str,
    rule: &MorphRule,
    matches: &[Arc<SandhiMatch>],
) -> Vec<SandhiCandidate> {
    let groups: &[SandhiGroup] = match (rule.sandhi_group, rule.is_regex_mode()) {
        (SandhiGroup::Both, true) => &[SandhiGroup::Both, SandhiGroup::Left, SandhiGroup::Right],
        (SandhiGroup::Both, false) => &[SandhiGroup::Both],
        (SandhiGroup::Left, _) => &[SandhiGroup::Left],
        (SandhiGroup::Right, _) => &[SandhiGroup::Right],
    };

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for sandhi in matches {
        let expression = sandhi.expression.as_str();
        for position in split_points(text, expression) {
            let prefix = &text[..position];
            let suffix = &text[position + expression.len()..];

            for &group in groups {
                let (left, right) = match group {
                    SandhiGroup::Left => (format!("{}{}", prefix, sandhi.left), suffix.to_string()),
                    SandhiGroup::Right => (prefix.to_string(), format!("{}{}", sandhi.right, suffix)),
                    SandhiGroup::Both => (
                        format!("{}{}", prefix, sandhi.left),
                        format!("{}{}", sandhi.right, suffix),
                    ),
                };

                let Some(left) = apply_template(&rule.left_entry, left) else {
                    continue;
                };
                let Some(right) = apply_template(&rule.right_entry, right) else {
                    continue;
                };
                if rule.left_type != MorphRuleType::None && left.is_empty() {
                    continue;
                }
                if rule.right_type != MorphRuleType::None && right.is_empty() {
                    continue;
                }

                let candidate = SandhiCandidate {
                    left,
                    right,
                    sandhi: Arc::clone(sandhi),
                };
                if seen.insert((
                    candidate.left.clone(),
                    candidate.right.clone(),
                    candidate.sandhi.expression.clone(),
                )) {
                    candidates.push(candidate);
                }
            }
        }
    }

    candidates
}

/// Byte positions where `expression` starts (every boundary when empty)
fn split_points<'t>(text: &'t str, expression: &'t str) -> impl Iterator<Item = usize> + 't {
    (0..=text.len()).filter(move |&p| {
        text.is_char_boundary(p)
            && text[p..].starts_with(expression)
            && (!expression.is_empty() || p > 0)
    })
}

fn apply_template(template: &EntryTemplate, text: String) -> Option<String> {
    match template {
        EntryTemplate::Any => Some(text),
        EntryTemplate::Literal(fixed) => Some(fixed.clone()),
        EntryTemplate::Regex(pattern) => regex_cache::is_full_match(pattern, &text).then_some(text),
    }
}

/// Parser bound to one request
///
/// Cheap to construct; all state lives in the [`RequestContext`].
pub struct MorphParser<'c, 'a> {
    ctx: &'c RequestContext<'a>,
}

impl<'c, 'a> MorphParser<'c, 'a> {
    /// Create a parser for a request
    pub fn new(ctx: &'c RequestContext<'a>) -> Self {
        Self { ctx }
    }

    /// Parse a target entry into the root word form
    ///
    /// A stored entry, or one that names its own sub-entries, is taken as
    /// a solution as is and only completed by rules where its structure is
    /// missing. Any other entry is parsed from its text.
    pub fn parse(&self, target: &MorphEntry, label: &str) -> AnalysisResult<WordFormId> {
        if target.entry.is_empty() {
            return Err(AnalysisError::EmptyEntry);
        }
        self.ctx.depth.reset();
        log_debug!(
            "parsing '{}' (label '{}', max depth {})",
            target.entry,
            label,
            self.ctx.max_depth
        );

        if target.is_stored() || target.left.is_some() || target.right.is_some() {
            self.parse_stated(target, label, 0)
        } else {
            let query = FormQuery::new(&target.entry)
                .with_parameters(target.parameters)
                .with_base(target.base)
                .with_virtual(target.is_virtual)
                .with_label(label);
            self.parse_form(&query, 0)
        }
    }

    /// Parse a free-form text
    pub fn parse_form(&self, query: &FormQuery<'_>, depth: usize) -> AnalysisResult<WordFormId> {
        self.ctx.check_canceled()?;

        let mut solutions = Vec::new();
        if query.consults_dictionary() {
            let entries = self.ctx.providers.dictionary.find_entries(
                query.text,
                &query.parameters,
                query.base,
                query.is_virtual,
            )?;
            log_trace!("'{}': {} dictionary entries", query.text, entries.len());

            if entries.is_empty() && query.label == DICTIONARY_LABEL {
                return Ok(self.ctx.arena.alloc_word_form(WordForm::new(query.text, Vec::new())));
            }
            for entry in &entries {
                solutions.extend(self.entry_solutions(entry, query.label, depth)?);
            }
            if entries.is_empty() {
                solutions.extend(self.derive(query.text, &query.content(), query.label, depth, None)?);
            }
        } else {
            solutions.extend(self.derive(query.text, &query.content(), query.label, depth, None)?);
        }

        Ok(self.finish_word_form(query.text, solutions))
    }

    /// Word form holding a stated entry and the rule derivations completing it
    fn parse_stated(&self, entry: &MorphEntry, label: &str, depth: usize) -> AnalysisResult<WordFormId> {
        self.ctx.check_canceled()?;
        let solutions = self.entry_solutions(entry, label, depth)?;
        Ok(self.finish_word_form(&entry.entry, solutions))
    }

    /// The entry's own solution plus, if incomplete, its rule derivations
    fn entry_solutions(
        &self,
        entry: &MorphEntry,
        label: &str,
        depth: usize,
    ) -> AnalysisResult<Vec<SolutionId>> {
        let left = entry
            .left
            .as_deref()
            .map(|sub| self.parse_sub_entry(sub, depth + 1))
            .transpose()?;
        let right = entry
            .right
            .as_deref()
            .map(|sub| self.parse_sub_entry(sub, depth + 1))
            .transpose()?;

        let content = SolutionContent::from_entry(entry);
        let complete = is_complete(content.base, left.is_some(), right.is_some());
        let own = self
            .ctx
            .arena
            .alloc_solution(Solution::new(content.clone()).with_children(left, right));

        let mut solutions = vec![own];
        if !complete {
            // dictionary label only selects the lookup; completion uses default rules
            let rule_label = if label == DICTIONARY_LABEL { "" } else { label };
            solutions.extend(self.derive(&entry.entry, &content, rule_label, depth, Some(own))?);
        }
        Ok(solutions)
    }

    fn parse_sub_entry(&self, sub: &MorphEntry, depth: usize) -> AnalysisResult<WordFormId> {
        if sub.is_stored() || sub.left.is_some() || sub.right.is_some() {
            self.parse_stated(sub, "", depth)
        } else {
            let query = FormQuery::new(&sub.entry)
                .with_parameters(sub.parameters)
                .with_base(sub.base)
                .with_virtual(sub.is_virtual);
            self.parse_form(&query, depth)
        }
    }

    fn finish_word_form(&self, text: &str, mut solutions: Vec<SolutionId>) -> WordFormId {
        if !self.ctx.keeps_errors() {
            let arena = self.ctx.arena;
            solutions.retain(|&id| arena.solution(id).is_success());
        }
        self.ctx.arena.alloc_word_form(WordForm::new(text, solutions))
    }

    /// Apply every rule of `label` to a content
    fn derive(
        &self,
        text: &str,
        content: &SolutionContent,
        label: &str,
        depth: usize,
        original: Option<SolutionId>,
    ) -> AnalysisResult<Vec<SolutionId>> {
        self.ctx.check_canceled()?;

        let rules = self.ctx.providers.rules.rules_for(label, &content.parameters)?;
        if rules.is_empty() {
            let failed = Solution::new(content.with_error(SolutionError::NoRuleMatches))
                .with_original(original);
            return Ok(vec![self.ctx.arena.alloc_solution(failed)]);
        }

        let per_rule = parallel::try_map(&rules, self.ctx.thresholds().parse_rules, |rule| {
            self.apply_rule(text, content, rule, depth, original)
        })?;
        Ok(per_rule.into_iter().flatten().collect())
    }

    /// Solutions produced by one rule
    fn apply_rule(
        &self,
        text: &str,
        parent: &SolutionContent,
        rule: &Arc<MorphRule>,
        depth: usize,
        original: Option<SolutionId>,
    ) -> AnalysisResult<Vec<SolutionId>> {
        self.ctx.check_canceled()?;

        let mut content = parent.clone();
        content.parameters.override_by(&rule.parameters);
        if content.base == MorphBase::Unknown {
            content.base = rule.base;
        }
        if rule.need_to_check {
            match self.ctx.providers.combinations.collective(&content.parameters)? {
                Some(collective) => {
                    content.parameters.override_by(&collective);
                }
                None => {
                    return Ok(vec![self.failed(
                        &content,
                        SolutionError::NoMorphCombinationMatches,
                        rule,
                        original,
                    )]);
                }
            }
        }

        let matches = self.ctx.providers.rules.sandhi_matches(text, rule)?;
        let candidates = sandhi_candidates(text, rule, &matches);
        if candidates.is_empty() {
            return Ok(vec![self.failed(
                &content,
                SolutionError::NoSandhiMatches,
                rule,
                original,
            )]);
        }

        candidates
            .iter()
            .map(|candidate| self.resolve(&content, rule, candidate, depth, original))
            .collect()
    }

    fn failed(
        &self,
        content: &SolutionContent,
        error: SolutionError,
        rule: &Arc<MorphRule>,
        original: Option<SolutionId>,
    ) -> SolutionId {
        let solution = Solution::new(content.with_error(error))
            .with_rule(Arc::clone(rule))
            .with_original(original);
        self.ctx.arena.alloc_solution(solution)
    }

    /// Memoized resolution of one sandhi split
    fn resolve(
        &self,
        content: &SolutionContent,
        rule: &Arc<MorphRule>,
        candidate: &SandhiCandidate,
        depth: usize,
        original: Option<SolutionId>,
    ) -> AnalysisResult<SolutionId> {
        self.ctx.check_canceled()?;

        let next = depth + 1;
        let key = SandhiKey {
            content_id: content.id,
            parameters: content.parameters,
            base: content.base,
            is_virtual: content.is_virtual,
            rule_id: rule.id,
            left: candidate.left.clone(),
            right: candidate.right.clone(),
            sandhi: (*candidate.sandhi).clone(),
            depth: next,
            errored: false,
        };

        if next > self.ctx.max_depth {
            let (id, _) = self
                .ctx
                .memo
                .get_or_insert_with::<_, AnalysisError>(key.errored(), || {
                    log_debug!(
                        "depth limit {} reached at '{}' + '{}'",
                        self.ctx.max_depth,
                        candidate.left,
                        candidate.right
                    );
                    let solution = Solution::new(content.with_error(SolutionError::DepthIsExceeded))
                        .with_rule(Arc::clone(rule))
                        .with_sandhi(Arc::clone(&candidate.sandhi))
                        .with_original(original);
                    Ok(self.ctx.arena.alloc_solution(solution))
                })?;
            return Ok(id);
        }

        let (id, _) = self.ctx.memo.get_or_insert_with(key, || {
            self.build_resolution(content, rule, candidate, next, original)
        })?;
        Ok(id)
    }

    fn build_resolution(
        &self,
        content: &SolutionContent,
        rule: &Arc<MorphRule>,
        candidate: &SandhiCandidate,
        depth: usize,
        original: Option<SolutionId>,
    ) -> AnalysisResult<SolutionId> {
        self.ctx.depth.reach(depth);

        let left = self.parse_child(
            &candidate.left,
            rule.left_type,
            &rule.left_parameters,
            &rule.left_label,
            content,
            depth,
        )?;
        let right = self.parse_child(
            &candidate.right,
            rule.right_type,
            &rule.right_parameters,
            &rule.right_label,
            content,
            depth,
        )?;

        let error = match (self.child_error(left), self.child_error(right)) {
            (Some(ChildFailure::Empty), _) => SolutionError::NoLeftMatches,
            (Some(ChildFailure::NoSuccess), _) => SolutionError::NotFoundLeftByParameters,
            (None, Some(ChildFailure::Empty)) => SolutionError::NoRightMatches,
            (None, Some(ChildFailure::NoSuccess)) => SolutionError::NotFoundRightByParameters,
            (None, None) => SolutionError::Success,
        };

        let solution = Solution::new(content.with_error(error))
            .with_children(left, right)
            .with_rule(Arc::clone(rule))
            .with_sandhi(Arc::clone(&candidate.sandhi))
            .with_original(original);
        Ok(self.ctx.arena.alloc_solution(solution))
    }

    fn parse_child(
        &self,
        text: &str,
        kind: MorphRuleType,
        rule_parameters: &ParameterVector,
        label: &str,
        parent: &SolutionContent,
        depth: usize,
    ) -> AnalysisResult<Option<WordFormId>> {
        let parameters = match kind {
            MorphRuleType::None => return Ok(None),
            MorphRuleType::New => *rule_parameters,
            MorphRuleType::Copy => parent.parameters.overridden_by(rule_parameters),
        };
        let query = FormQuery::new(text)
            .with_parameters(parameters)
            .with_label(label);
        self.parse_form(&query, depth).map(Some)
    }

    fn child_error(&self, child: Option<WordFormId>) -> Option<ChildFailure> {
        let form = self.ctx.arena.word_form(child?);
        if form.solutions.is_empty() {
            Some(ChildFailure::Empty)
        } else if form
            .solutions
            .iter()
            .any(|&id| self.ctx.arena.solution(id).is_success())
        {
            None
        } else {
            Some(ChildFailure::NoSuccess)
        }
    }
}

enum ChildFailure {
    Empty,
    NoSuccess,
}
