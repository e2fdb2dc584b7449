//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sutra_match::{execute, execute_str, Matcher, MatchResult, RuleTable, SourceReader};

pub fn lit(ch: char) -> Matcher {
    Matcher::literal(ch)
}

pub fn text(s: &str) -> Matcher {
    Matcher::literal_str(s).expect("non-empty literal")
}

pub fn range(lo: char, hi: char) -> Matcher {
    Matcher::range(lo, hi).expect("ordered range")
}

pub fn seq(children: Vec<Matcher>) -> Matcher {
    Matcher::sequence(children).expect("non-empty sequence")
}

pub fn alt(children: Vec<Matcher>) -> Matcher {
    Matcher::alternation(children).expect("non-empty alternation")
}

pub fn arc(m: Matcher) -> Arc<Matcher> {
    Arc::new(m)
}

/// Runs a rule-free matcher at the start of `input`.
pub fn run(m: &Matcher, input: &str) -> MatchResult {
    execute_str(m, input).expect("matcher passes validation")
}

/// Runs `m` against `input` and also returns where the reader ended up.
pub fn run_at<T>(m: &Matcher, input: &str, rules: &RuleTable<T>) -> (MatchResult<T>, usize) {
    let mut reader = SourceReader::new(input);
    let result = execute(m, &mut reader, rules).expect("matcher passes validation");
    (result, reader.position())
}
