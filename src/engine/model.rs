//! Morphological data model
//!
//! Dictionary entries, grammatical rules and sandhi matches are owned by
//! the providers and read by the engine. [`SolutionContent`] is the
//! per-solution mutable copy the pipeline works on.

use super::parameters::ParameterVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side(s) of a split a form inherits its parameters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MorphBase {
    /// Root form, nothing is inherited
    None,
    /// Inherited from the left part
    Left,
    /// Inherited from the right part
    Right,
    /// Inherited from both parts
    Both,
    /// Not determined yet
    #[default]
    Unknown,
}

impl MorphBase {
    /// Whether the left part contributes parameters
    #[inline]
    pub fn uses_left(self) -> bool {
        matches!(self, MorphBase::Left | MorphBase::Both)
    }

    /// Whether the right part contributes parameters
    #[inline]
    pub fn uses_right(self) -> bool {
        matches!(self, MorphBase::Right | MorphBase::Both)
    }
}

/// How a rule derives a child's parameter vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MorphRuleType {
    /// No child on this side
    #[default]
    None,
    /// Fresh vector taken from the rule
    New,
    /// Parent vector with unknown slots filled from the rule
    Copy,
}

/// Which side of a sandhi boundary a rule rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SandhiGroup {
    /// The left part absorbs the boundary
    Left,
    /// The right part absorbs the boundary
    Right,
    /// Both parts are rewritten
    #[default]
    Both,
}

/// Provenance of a dictionary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntrySource {
    /// Unknown provenance
    #[default]
    Unknown,
    /// Curated dictionary
    Dictionary,
    /// Bulk import
    Import,
    /// Produced by a previous analysis
    Analysis,
    /// Entered by hand
    Manual,
}

/// A dictionary entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MorphEntry {
    /// Persistent id (0 = not stored)
    #[serde(default)]
    pub id: u64,
    /// Entry text
    pub entry: String,
    /// Grammatical parameters
    #[serde(default)]
    pub parameters: ParameterVector,
    /// Which side parameters come from
    #[serde(default)]
    pub base: MorphBase,
    /// Virtual entries exist only as derivation intermediates
    #[serde(default)]
    pub is_virtual: Option<bool>,
    /// Left sub-entry
    #[serde(default)]
    pub left: Option<Box<MorphEntry>>,
    /// Right sub-entry
    #[serde(default)]
    pub right: Option<Box<MorphEntry>>,
    /// Provenance
    #[serde(default)]
    pub source: EntrySource,
}

impl MorphEntry {
    /// Create an unstored entry with unknown parameters
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            ..Self::default()
        }
    }

    /// Set the persistent id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Set the parameter vector
    pub fn with_parameters(mut self, parameters: ParameterVector) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the base
    pub fn with_base(mut self, base: MorphBase) -> Self {
        self.base = base;
        self
    }

    /// Set the virtual flag
    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = Some(is_virtual);
        self
    }

    /// Set the left sub-entry
    pub fn with_left(mut self, left: MorphEntry) -> Self {
        self.left = Some(Box::new(left));
        self
    }

    /// Set the right sub-entry
    pub fn with_right(mut self, right: MorphEntry) -> Self {
        self.right = Some(Box::new(right));
        self
    }

    /// Set the provenance
    pub fn with_source(mut self, source: EntrySource) -> Self {
        self.source = source;
        self
    }

    /// Whether the entry is persisted in the dictionary
    #[inline]
    pub fn is_stored(&self) -> bool {
        self.id > 0
    }
}

/// Text template for one side of a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntryTemplate {
    /// Use the text produced by the sandhi split
    #[default]
    Any,
    /// Replace the side's text with a fixed string
    Literal(String),
    /// Keep the split text only if it fully matches the pattern
    Regex(String),
}

impl EntryTemplate {
    /// Whether this template is regex-governed
    #[inline]
    pub fn is_regex(&self) -> bool {
        matches!(self, EntryTemplate::Regex(_))
    }
}

/// A grammatical rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphRule {
    /// Rule id
    pub id: u64,
    /// Context label selecting where the rule applies
    #[serde(default)]
    pub label: String,
    /// Collapsed rules are folded into their parent
    #[serde(default)]
    pub is_collapsed: bool,
    /// Base of the derived form
    #[serde(default)]
    pub base: MorphBase,
    /// Parameters the rule contributes to the derived form
    #[serde(default)]
    pub parameters: ParameterVector,
    /// Left child derivation
    #[serde(default)]
    pub left_type: MorphRuleType,
    /// Right child derivation
    #[serde(default)]
    pub right_type: MorphRuleType,
    /// Label used to parse the left child
    #[serde(default)]
    pub left_label: String,
    /// Label used to parse the right child
    #[serde(default)]
    pub right_label: String,
    /// Left text template
    #[serde(default)]
    pub left_entry: EntryTemplate,
    /// Right text template
    #[serde(default)]
    pub right_entry: EntryTemplate,
    /// Parameters for the left child
    #[serde(default)]
    pub left_parameters: ParameterVector,
    /// Parameters for the right child
    #[serde(default)]
    pub right_parameters: ParameterVector,
    /// Regex the sandhi expression must match
    #[serde(default)]
    pub entry: Option<String>,
    /// Side of the boundary the rule rewrites
    #[serde(default)]
    pub sandhi_group: SandhiGroup,
    /// Whether the derived vector must be checked against combinations
    #[serde(default)]
    pub need_to_check: bool,
    /// Rule rating in `0..=1`
    #[serde(default = "default_rule_rating")]
    pub rating: f64,
}

fn default_rule_rating() -> f64 {
    1.0
}

impl MorphRule {
    /// Create a rule with the given id and label and neutral settings
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            is_collapsed: false,
            base: MorphBase::Unknown,
            parameters: ParameterVector::new(),
            left_type: MorphRuleType::None,
            right_type: MorphRuleType::None,
            left_label: String::new(),
            right_label: String::new(),
            left_entry: EntryTemplate::Any,
            right_entry: EntryTemplate::Any,
            left_parameters: ParameterVector::new(),
            right_parameters: ParameterVector::new(),
            entry: None,
            sandhi_group: SandhiGroup::Both,
            need_to_check: false,
            rating: 1.0,
        }
    }

    /// Whether the rule uses regex templates on either side
    #[inline]
    pub fn is_regex_mode(&self) -> bool {
        self.left_entry.is_regex() || self.right_entry.is_regex()
    }
}

/// An observed sandhi boundary
///
/// `expression` is the surface text at the boundary, `left` and `right`
/// are what the boundary resolves into on either side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SandhiMatch {
    /// Surface text of the boundary
    pub expression: String,
    /// Underlying ending of the left part
    #[serde(default)]
    pub left: String,
    /// Underlying beginning of the right part
    #[serde(default)]
    pub right: String,
    /// Ids of the sandhi rules producing this boundary
    #[serde(default)]
    pub rules: Vec<u64>,
}

impl SandhiMatch {
    /// Create a boundary resolving `expression` into `left` + `right`
    pub fn new(
        expression: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            expression: expression.into(),
            left: left.into(),
            right: right.into(),
            rules: Vec::new(),
        }
    }

    /// Attach sandhi rule ids
    pub fn with_rules(mut self, rules: Vec<u64>) -> Self {
        self.rules = rules;
        self
    }
}

/// Outcome of one derivation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SolutionError {
    /// The derivation holds
    #[default]
    Success,
    /// No rule applies to the form
    NoRuleMatches,
    /// The rule applies but no sandhi boundary was found
    NoSandhiMatches,
    /// The derived parameters form no valid combination
    NoMorphCombinationMatches,
    /// No left child satisfies the required parameters
    NotFoundLeftByParameters,
    /// No right child satisfies the required parameters
    NotFoundRightByParameters,
    /// The left text has no analysis
    NoLeftMatches,
    /// The right text has no analysis
    NoRightMatches,
    /// Recursion reached the depth limit
    DepthIsExceeded,
}

impl SolutionError {
    /// Whether this is the success value
    #[inline]
    pub fn is_success(self) -> bool {
        self == SolutionError::Success
    }

    /// Short stable code
    pub fn code(self) -> &'static str {
        match self {
            SolutionError::Success => "ok",
            SolutionError::NoRuleMatches => "no-rule",
            SolutionError::NoSandhiMatches => "no-sandhi",
            SolutionError::NoMorphCombinationMatches => "no-combination",
            SolutionError::NotFoundLeftByParameters => "no-left-by-parameters",
            SolutionError::NotFoundRightByParameters => "no-right-by-parameters",
            SolutionError::NoLeftMatches => "no-left",
            SolutionError::NoRightMatches => "no-right",
            SolutionError::DepthIsExceeded => "depth-exceeded",
        }
    }
}

impl fmt::Display for SolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Grammatical content of a solution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SolutionContent {
    /// Dictionary id (0 = synthesized)
    pub id: u64,
    /// Working copy of the parameters
    pub parameters: ParameterVector,
    /// Which side parameters come from
    pub base: MorphBase,
    /// Virtual flag
    pub is_virtual: Option<bool>,
    /// Derivation outcome
    pub error: SolutionError,
}

impl SolutionContent {
    /// Content of a free-form (not dictionary-backed) form
    pub fn synthesized(parameters: ParameterVector, base: MorphBase, is_virtual: Option<bool>) -> Self {
        Self {
            id: 0,
            parameters,
            base,
            is_virtual,
            error: SolutionError::Success,
        }
    }

    /// Content copied from a dictionary entry
    pub fn from_entry(entry: &MorphEntry) -> Self {
        Self {
            id: entry.id,
            parameters: entry.parameters,
            base: entry.base,
            is_virtual: entry.is_virtual,
            error: SolutionError::Success,
        }
    }

    /// Copy of the content carrying an error
    pub fn with_error(&self, error: SolutionError) -> Self {
        Self {
            error,
            ..self.clone()
        }
    }

    /// Whether the content is dictionary-backed
    #[inline]
    pub fn is_dictionary(&self) -> bool {
        self.id > 0
    }

    /// Whether the derivation succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        self.error.is_success()
    }
}
