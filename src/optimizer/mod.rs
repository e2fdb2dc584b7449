//! # Tree Optimizer
//!
//! A bottom-up rewrite that specializes alternations over single characters
//! into ranges and sets. Every other node is rebuilt around its optimized
//! children and otherwise left alone.
//!
//! The rewrite never changes which strings a tree accepts nor how many
//! characters a successful match consumes. It is idempotent: optimizing an
//! optimized tree yields an equal tree.

mod alternation;

use std::collections::HashMap;
use std::sync::Arc;

use crate::matcher::{Matcher, MatcherRef};

/// Optimizes a single tree.
pub fn optimize(matcher: &Matcher) -> Matcher {
    Optimizer::new().optimize(matcher)
}

/// One optimization session.
///
/// Shared subtrees are rewritten once per session: results are memoized by
/// node address, so a subtree reused by many rules comes out shared too.
#[derive(Debug, Default)]
pub struct Optimizer {
    memo: HashMap<*const Matcher, MatcherRef>,
    // Keeps memoized inputs alive so their addresses cannot be reused.
    pinned: Vec<MatcherRef>,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn optimize_ref(&mut self, node: &MatcherRef) -> MatcherRef {
        let key = Arc::as_ptr(node);
        if let Some(done) = self.memo.get(&key) {
            return done.clone();
        }
        let optimized = Arc::new(self.optimize(node));
        self.pinned.push(node.clone());
        self.memo.insert(key, optimized.clone());
        optimized
    }

    pub fn optimize(&mut self, matcher: &Matcher) -> Matcher {
        match matcher {
            Matcher::Alternation(children) => {
                let children = self.optimize_all(children);
                alternation::rewrite(children)
            }
            Matcher::Optional(inner) => {
                let inner = self.optimize_ref(inner);
                // x?? accepts exactly what x? does.
                if let Matcher::Optional(_) = &*inner {
                    return Matcher::clone(&inner);
                }
                Matcher::Optional(inner)
            }
            Matcher::Sequence(children) => Matcher::Sequence(self.optimize_all(children)),
            Matcher::Repetition { inner, min, max } => Matcher::Repetition {
                inner: self.optimize_ref(inner),
                min: *min,
                max: *max,
            },
            Matcher::Negated(inner) => Matcher::Negated(self.optimize_ref(inner)),
            Matcher::RuleWrapper { name, inner } => Matcher::RuleWrapper {
                name: name.clone(),
                inner: self.optimize_ref(inner),
            },
            Matcher::Ignore(inner) => Matcher::Ignore(self.optimize_ref(inner)),
            Matcher::Join(inner) => Matcher::Join(self.optimize_ref(inner)),
            Matcher::Marker(inner) => Matcher::Marker(self.optimize_ref(inner)),
            Matcher::Saving { name, inner } => Matcher::Saving {
                name: name.clone(),
                inner: self.optimize_ref(inner),
            },
            Matcher::Literal(_)
            | Matcher::LiteralString(_)
            | Matcher::Range(..)
            | Matcher::Set(_)
            | Matcher::Predicate(_)
            | Matcher::EndOfInput
            | Matcher::RuleRef(_)
            | Matcher::Loading(_) => matcher.clone(),
        }
    }

    fn optimize_all(&mut self, children: &[MatcherRef]) -> Vec<MatcherRef> {
        children.iter().map(|c| self.optimize_ref(c)).collect()
    }
}
