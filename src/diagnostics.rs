//! # Sutra Match Diagnostics
//!
//! Every failure the engine can report lives here, split by when it happens:
//!
//! - [`GrammarError`]: found while building or checking a grammar. Fatal; no
//!   execution starts while one is outstanding.
//! - [`MatchError`]: a single match attempt failed. Recoverable by an enclosing
//!   `Alternation`, `Optional` or `Repetition`, except for the fatal kinds
//!   ([`MatchErrorKind::is_fatal`]).
//! - [`ReaderError`]: misuse of the reader's save/rewind discipline.
//!
//! [`MatchDiagnostic`] attaches the input text to a `MatchError` so that a
//! `miette::Report` can render it with a labelled span.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceLocation;

pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// READER ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error("load or discard called with no save point on the stack")]
    EmptySaveStack,
    #[error("location at byte {offset} is not a character boundary of a {len}-byte text")]
    InvalidLocation { offset: usize, len: usize },
}

// ============================================================================
// GRAMMAR ERRORS
// ============================================================================

/// Construction-time grammar problems.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GrammarError {
    #[error("undefined rule '{name}'{}", .referenced_from.as_ref().map(|r| format!(" referenced from '{r}'")).unwrap_or_default())]
    #[diagnostic(
        code(sutra_match::grammar::undefined_rule),
        help("define the rule in the table or fix the reference")
    )]
    UndefinedRule {
        name: String,
        referenced_from: Option<String>,
    },

    #[error("rule '{name}' is defined more than once")]
    #[diagnostic(code(sutra_match::grammar::duplicate_rule))]
    DuplicateRule { name: String },

    #[error("root rule '{name}' is not defined")]
    #[diagnostic(code(sutra_match::grammar::missing_root))]
    MissingRoot { name: String },

    #[error("the rule table has no root rule")]
    #[diagnostic(code(sutra_match::grammar::no_root))]
    NoRoot,

    #[error("malformed grammar{}: {reason}", .rule.as_ref().map(|r| format!(" in rule '{r}'")).unwrap_or_default())]
    #[diagnostic(code(sutra_match::grammar::malformed))]
    MalformedGrammar {
        rule: Option<String>,
        reason: String,
    },
}

impl GrammarError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGrammar {
            rule: None,
            reason: reason.into(),
        }
    }

    /// Attaches the enclosing rule name to a malformed-grammar report that
    /// does not carry one yet.
    pub fn in_rule(self, name: &str) -> Self {
        match self {
            Self::MalformedGrammar { rule: None, reason } => Self::MalformedGrammar {
                rule: Some(name.to_string()),
                reason,
            },
            other => other,
        }
    }
}

// ============================================================================
// MATCH ERRORS
// ============================================================================

/// What went wrong in one match attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchErrorKind {
    /// A primitive matcher did not find what it expected.
    SyntaxMismatch { expected: String },
    /// No branch of an alternation matched.
    AlternationExhausted,
    /// Fewer repeats than the minimum.
    RepetitionUnderflow { min: usize, matched: usize },
    /// The inner matcher of a negation succeeded.
    UnexpectedMatch,
    /// A `Loading` matcher named a value nothing saved.
    UnknownBackreference { name: String },
    /// The upcoming text differs from the saved value.
    BackreferenceMismatch { name: String, expected: String },
    /// Rule invocations nested deeper than the configured limit.
    RecursionLimit { depth: usize },
    /// The engine broke its own save/rewind discipline.
    Internal { reason: String },
}

impl MatchErrorKind {
    /// Fatal kinds abort the whole execution; no combinator absorbs them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RecursionLimit { .. } | Self::Internal { .. })
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::SyntaxMismatch { .. } => "syntax_mismatch",
            Self::AlternationExhausted => "alternation_exhausted",
            Self::RepetitionUnderflow { .. } => "repetition_underflow",
            Self::UnexpectedMatch => "unexpected_match",
            Self::UnknownBackreference { .. } => "unknown_backreference",
            Self::BackreferenceMismatch { .. } => "backreference_mismatch",
            Self::RecursionLimit { .. } => "recursion_limit",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn code(&self) -> String {
        format!("sutra_match::match::{}", self.code_suffix())
    }

    fn describe(&self) -> String {
        match self {
            Self::SyntaxMismatch { expected } => format!("expected {expected}"),
            Self::AlternationExhausted => "no alternative matched".to_string(),
            Self::RepetitionUnderflow { min, matched } => {
                format!("expected at least {min} repetitions, found {matched}")
            }
            Self::UnexpectedMatch => "unexpected match".to_string(),
            Self::UnknownBackreference { name } => format!("unknown backreference '{name}'"),
            Self::BackreferenceMismatch { name, expected } => {
                format!("expected '{expected}' saved as '{name}'")
            }
            Self::RecursionLimit { depth } => {
                format!("rule nesting exceeded the limit of {depth}")
            }
            Self::Internal { reason } => format!("internal engine error: {reason}"),
        }
    }
}

/// A failed match attempt: the kind, where it happened, and for aggregate
/// failures the branch failure that got furthest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {location}")]
pub struct MatchError {
    pub kind: MatchErrorKind,
    pub location: SourceLocation,
    pub message: String,
    #[source]
    pub cause: Option<Box<MatchError>>,
}

impl MatchError {
    pub fn new(kind: MatchErrorKind, location: SourceLocation) -> Self {
        let message = kind.describe();
        Self {
            kind,
            location,
            message,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: MatchError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// The deepest error in the cause chain.
    pub fn root_cause(&self) -> &MatchError {
        let mut current = self;
        while let Some(next) = current.cause.as_deref() {
            current = next;
        }
        current
    }

    /// The location furthest into the input anywhere in the cause chain.
    pub fn furthest_location(&self) -> SourceLocation {
        let mut furthest = self.location;
        let mut current = self.cause.as_deref();
        while let Some(err) = current {
            if err.location.offset > furthest.offset {
                furthest = err.location;
            }
            current = err.cause.as_deref();
        }
        furthest
    }

    /// An `Internal` failure raised by the reader while it stood at `location`.
    pub fn reader_fault(err: ReaderError, location: SourceLocation) -> Self {
        MatchError::new(
            MatchErrorKind::Internal {
                reason: err.to_string(),
            },
            location,
        )
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Converts input text into a named source for diagnostics.
pub fn to_error_source(name: &str, text: &str) -> SourceArc {
    Arc::new(NamedSource::new(name, text.to_string()))
}

/// A [`MatchError`] paired with the text it was raised against.
#[derive(Debug)]
pub struct MatchDiagnostic {
    pub error: MatchError,
    pub source: SourceArc,
}

impl MatchDiagnostic {
    pub fn new(error: MatchError, source: SourceArc) -> Self {
        Self { error, source }
    }
}

impl fmt::Display for MatchDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match error: {}", self.error.message)
    }
}

impl std::error::Error for MatchDiagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error
            .cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl Diagnostic for MatchDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.error.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let root = self.error.root_cause();
        if std::ptr::eq(root, &self.error) {
            return None;
        }
        Some(Box::new(format!(
            "furthest failure: {} at {}",
            root.message, root.location
        )))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&*self.source as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let len = self.source.inner().len();
        let at = self.error.location.offset.min(len);
        // One character wide, or zero wide at the end of input.
        let width = usize::from(at < len);
        let mut labels = vec![LabeledSpan::new(
            Some(self.error.message.clone()),
            at,
            width,
        )];
        let root = self.error.root_cause();
        if !std::ptr::eq(root, &self.error) && root.location.offset != at {
            let root_at = root.location.offset.min(len);
            labels.push(LabeledSpan::new(
                Some(root.message.clone()),
                root_at,
                usize::from(root_at < len),
            ));
        }
        Some(Box::new(labels.into_iter()))
    }
}
