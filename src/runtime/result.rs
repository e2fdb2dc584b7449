use crate::diagnostics::{MatchDiagnostic, MatchError, SourceArc};
use crate::source::SourceRange;

/// What a successful step produced.
#[derive(Debug)]
pub(crate) struct Output<T> {
    pub fragments: Vec<String>,
    pub nodes: Vec<T>,
}

impl<T> Output<T> {
    pub fn empty() -> Self {
        Self {
            fragments: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn single(fragment: String) -> Self {
        Self {
            fragments: vec![fragment],
            nodes: Vec::new(),
        }
    }

    pub fn append(&mut self, other: Output<T>) {
        self.fragments.extend(other.fragments);
        self.nodes.extend(other.nodes);
    }
}

/// The outcome of one top-level execution.
///
/// On failure `fragments` and `nodes` are empty, `error` says why, and
/// `range` is the zero-width range at the starting location.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<T = ()> {
    pub success: bool,
    pub fragments: Vec<String>,
    pub nodes: Vec<T>,
    pub error: Option<MatchError>,
    pub range: SourceRange,
    matched: String,
}

impl<T> MatchResult<T> {
    pub(crate) fn matched(output: Output<T>, range: SourceRange, text: String) -> Self {
        Self {
            success: true,
            fragments: output.fragments,
            nodes: output.nodes,
            error: None,
            range,
            matched: text,
        }
    }

    pub(crate) fn failed(error: MatchError, range: SourceRange) -> Self {
        Self {
            success: false,
            fragments: Vec::new(),
            nodes: Vec::new(),
            error: Some(error),
            range,
            matched: String::new(),
        }
    }

    /// The input text the match consumed, including ignored parts.
    pub fn matched_text(&self) -> &str {
        &self.matched
    }

    /// Number of characters consumed.
    pub fn consumed(&self) -> usize {
        self.matched.chars().count()
    }

    /// Converts into a `Result`, pairing a failure with its input text for
    /// rendering.
    pub fn into_result(mut self, source: SourceArc) -> Result<Self, MatchDiagnostic> {
        if self.success {
            return Ok(self);
        }
        match self.error.take() {
            Some(error) => Err(MatchDiagnostic::new(error, source)),
            None => Ok(self),
        }
    }
}
