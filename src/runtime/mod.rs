//! # Execution
//!
//! The [`Executor`] runs a matcher tree against a [`SourceReader`], resolving
//! rule references through a [`RuleTable`].
//!
//! Grammar problems are fatal and come back as `Err(GrammarError)` before
//! anything runs. A match that simply fails is `Ok` with
//! `MatchResult::success == false`; the reader is then back where it started.

mod context;
mod eval;
mod result;

pub use context::{MarkerSink, NullMarkerSink};
pub use result::MatchResult;

use crate::config::EngineConfig;
use crate::diagnostics::GrammarError;
use crate::matcher::Matcher;
use crate::rules::RuleTable;
use crate::source::{SourceRange, SourceReader};
use context::ExecutionContext;

pub struct Executor<'r, T = ()> {
    rules: &'r RuleTable<T>,
    config: EngineConfig,
    marker: Box<dyn MarkerSink + 'r>,
}

impl<'r, T> Executor<'r, T> {
    /// An executor using the table's own config.
    pub fn new(rules: &'r RuleTable<T>) -> Self {
        Self {
            rules,
            config: rules.config().clone(),
            marker: Box::new(NullMarkerSink),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_marker_sink(mut self, sink: impl MarkerSink + 'r) -> Self {
        self.marker = Box::new(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `matcher` from the reader's current position. The matcher is
    /// checked against the table first.
    pub fn run(
        &mut self,
        matcher: &Matcher,
        reader: &mut SourceReader,
    ) -> Result<MatchResult<T>, GrammarError> {
        self.rules.check(matcher)?;
        Ok(self.execute(matcher, reader))
    }

    /// Runs the named rule.
    pub fn run_rule(
        &mut self,
        name: &str,
        reader: &mut SourceReader,
    ) -> Result<MatchResult<T>, GrammarError> {
        let rules = self.rules;
        let rule = rules.get(name).ok_or_else(|| GrammarError::UndefinedRule {
            name: name.to_string(),
            referenced_from: None,
        })?;
        Ok(self.execute(rule.body(), reader))
    }

    /// Runs the table's root rule.
    pub fn run_root(&mut self, reader: &mut SourceReader) -> Result<MatchResult<T>, GrammarError> {
        let rules = self.rules;
        let rule = rules.root().ok_or(GrammarError::NoRoot)?;
        Ok(self.execute(rule.body(), reader))
    }

    fn execute(&mut self, matcher: &Matcher, reader: &mut SourceReader) -> MatchResult<T> {
        let start = reader.location();
        let mut ctx = ExecutionContext::new(self.rules, &mut *self.marker, &self.config);
        match eval::evaluate(matcher, reader, &mut ctx) {
            Ok(output) => {
                let end = reader.location();
                let text = reader.slice(start.offset, end.offset).unwrap_or_default();
                MatchResult::matched(output, SourceRange::new(start, end), text.to_string())
            }
            Err(error) => MatchResult::failed(error, SourceRange::empty(start)),
        }
    }
}

/// Runs `matcher` once against `reader` with a default executor.
pub fn execute<T>(
    matcher: &Matcher,
    reader: &mut SourceReader,
    rules: &RuleTable<T>,
) -> Result<MatchResult<T>, GrammarError> {
    Executor::new(rules).run(matcher, reader)
}

/// Matches `matcher`, which must not reference any rules, at the start of
/// `text`.
pub fn execute_str(matcher: &Matcher, text: &str) -> Result<MatchResult, GrammarError> {
    let rules = RuleTable::empty();
    let mut reader = SourceReader::new(text);
    execute(matcher, &mut reader, &rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_leaves_the_reader_in_place() {
        let m = Matcher::sequence([Matcher::Literal('a'), Matcher::Literal('b')]).unwrap();
        let rules = RuleTable::empty();
        let mut reader = SourceReader::new("ac");
        let result = execute::<()>(&m, &mut reader, &rules).unwrap();
        assert!(!result.success);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.save_depth(), 0);
        assert!(result.fragments.is_empty());
    }

    #[test]
    fn unknown_rule_is_a_grammar_error() {
        let err = execute_str(&Matcher::rule("missing"), "x").unwrap_err();
        assert!(matches!(err, GrammarError::UndefinedRule { .. }));
    }

    #[test]
    fn run_root_without_root() {
        let rules: RuleTable = RuleTable::builder()
            .rule("a", Matcher::Literal('a'))
            .build()
            .unwrap();
        let mut reader = SourceReader::new("a");
        assert_eq!(
            Executor::new(&rules).run_root(&mut reader).unwrap_err(),
            GrammarError::NoRoot
        );
        let result = Executor::new(&rules).run_rule("a", &mut reader).unwrap();
        assert_eq!(result.fragments, vec!["a"]);
    }
}
