use im::HashMap;

use crate::config::EngineConfig;
use crate::rules::RuleTable;
use crate::source::SourceRange;

// ============================================================================
// MARKER SINK
// ============================================================================

/// Receives every successful `Marker` match, e.g. for a grammar builder
/// collecting spans of interest.
pub trait MarkerSink {
    fn marked(&mut self, range: SourceRange, fragments: &[String]);
}

impl<F> MarkerSink for F
where
    F: FnMut(SourceRange, &[String]),
{
    fn marked(&mut self, range: SourceRange, fragments: &[String]) {
        self(range, fragments)
    }
}

/// Drops every notification.
pub struct NullMarkerSink;

impl MarkerSink for NullMarkerSink {
    fn marked(&mut self, _range: SourceRange, _fragments: &[String]) {}
}

// ============================================================================
// EXECUTION CONTEXT
// ============================================================================

/// State of one top-level execution. Created fresh for every run so saved
/// backreferences never leak from one parse into the next.
pub(crate) struct ExecutionContext<'a, 'm, T> {
    pub rules: &'a RuleTable<T>,
    pub marker: &'m mut dyn MarkerSink,
    /// Backreference values. Cloning is cheap, so combinators snapshot it
    /// before an attempt and put the snapshot back when they rewind.
    pub saves: HashMap<String, String>,
    pub depth: usize,
    pub max_depth: usize,
    pub trace_rules: bool,
}

impl<'a, 'm, T> ExecutionContext<'a, 'm, T> {
    pub fn new(
        rules: &'a RuleTable<T>,
        marker: &'m mut dyn MarkerSink,
        config: &EngineConfig,
    ) -> Self {
        Self {
            rules,
            marker,
            saves: HashMap::new(),
            depth: 0,
            max_depth: config.max_depth,
            trace_rules: config.trace_rules,
        }
    }
}
