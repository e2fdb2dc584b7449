//! Alternation rewriting.
//!
//! Nested alternations are flattened first. The children are then split
//! into maximal runs of consecutive single-character children, and each run
//! is rewritten on its own:
//!
//! 1. rangify: the characters of every `Literal` and `Set` are pooled, and
//!    each stretch of consecutive characters becomes a `Range`
//! 2. join: overlapping or adjacent ranges are merged
//! 3. prune: characters already covered by a range are dropped
//! 4. re-merge: the characters left over become one `Set` (or `Literal`)
//!
//! Within a run every child consumes exactly one character, so reordering
//! it cannot change the outcome. Children between runs keep their place,
//! which keeps ordered choice intact.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use crate::matcher::{Matcher, MatcherRef};

pub(super) fn rewrite(children: Vec<MatcherRef>) -> Matcher {
    let before = children.len();
    let flat = flatten(children);

    let mut rewritten = Vec::with_capacity(flat.len());
    let mut run = Vec::new();
    for child in flat {
        if child.is_single_char() {
            run.push(child);
            continue;
        }
        if !run.is_empty() {
            rewritten.extend(merge_run(std::mem::take(&mut run)));
        }
        rewritten.push(child);
    }
    if !run.is_empty() {
        rewritten.extend(merge_run(run));
    }

    trace!(before, after = rewritten.len(), "rewrote alternation");

    if rewritten.len() == 1 {
        if let Some(only) = rewritten.pop() {
            return Matcher::clone(&only);
        }
    }
    Matcher::Alternation(rewritten)
}

/// Splices the children of nested alternations into the parent.
fn flatten(children: Vec<MatcherRef>) -> Vec<MatcherRef> {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match &*child {
            Matcher::Alternation(grandchildren) => flat.extend(grandchildren.iter().cloned()),
            _ => flat.push(child),
        }
    }
    flat
}

fn merge_run(run: Vec<MatcherRef>) -> Vec<MatcherRef> {
    let mut chars = BTreeSet::new();
    let mut ranges = Vec::new();
    let mut predicates = Vec::new();
    for child in run {
        match &*child {
            Matcher::Literal(ch) => {
                chars.insert(*ch);
            }
            Matcher::Set(set) => chars.extend(set.iter().copied()),
            Matcher::Range(lo, hi) => ranges.push((*lo, *hi)),
            _ => predicates.push(child),
        }
    }

    let mut singles = rangify(&chars, &mut ranges);
    let ranges = join_ranges(ranges);
    singles.retain(|ch| !ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(ch)));

    let mut merged: Vec<MatcherRef> = ranges
        .into_iter()
        .map(|(lo, hi)| Arc::new(Matcher::Range(lo, hi)))
        .collect();
    match singles.len() {
        0 => {}
        1 => merged.push(Arc::new(Matcher::Literal(singles[0]))),
        _ => merged.push(Arc::new(Matcher::Set(singles))),
    }
    merged.extend(predicates);
    merged
}

/// Moves every stretch of two or more consecutive characters into `ranges`
/// and returns the isolated characters, ascending.
fn rangify(chars: &BTreeSet<char>, ranges: &mut Vec<(char, char)>) -> Vec<char> {
    let mut singles = Vec::new();
    let mut iter = chars.iter().copied();
    let Some(first) = iter.next() else {
        return singles;
    };
    let (mut lo, mut hi) = (first, first);
    for ch in iter {
        if hi as u32 + 1 == ch as u32 {
            hi = ch;
            continue;
        }
        push_stretch(lo, hi, ranges, &mut singles);
        lo = ch;
        hi = ch;
    }
    push_stretch(lo, hi, ranges, &mut singles);
    singles
}

fn push_stretch(lo: char, hi: char, ranges: &mut Vec<(char, char)>, singles: &mut Vec<char>) {
    if lo == hi {
        singles.push(lo);
    } else {
        ranges.push((lo, hi));
    }
}

/// Sorts ranges and merges those that overlap or touch.
fn join_ranges(mut ranges: Vec<(char, char)>) -> Vec<(char, char)> {
    ranges.sort_unstable();
    let mut joined: Vec<(char, char)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        match joined.last_mut() {
            Some(last) if lo as u32 <= last.1 as u32 + 1 => last.1 = last.1.max(hi),
            _ => joined.push((lo, hi)),
        }
    }
    joined
}
