use std::collections::HashSet;
use std::sync::Arc;

use crate::matcher::{Matcher, MatcherRef};

/// Hash-consing table for matcher trees.
///
/// Structurally identical subtrees interned through the same table come back
/// as the same `Arc`, so a grammar that spells `[a-z]` in twenty rules holds
/// one node for it. Sharing only saves memory; execution never looks at node
/// identity.
#[derive(Debug, Default)]
pub struct MatcherInterner {
    nodes: HashSet<MatcherRef>,
}

impl MatcherInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `matcher` and, bottom-up, every subtree below it.
    pub fn intern(&mut self, matcher: Matcher) -> MatcherRef {
        let matcher = self.intern_children(matcher);
        if let Some(existing) = self.nodes.get(&matcher) {
            return existing.clone();
        }
        let node = Arc::new(matcher);
        self.nodes.insert(node.clone());
        node
    }

    /// Number of distinct nodes held.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn intern_ref(&mut self, node: &MatcherRef) -> MatcherRef {
        match self.nodes.get(node) {
            Some(existing) => existing.clone(),
            None => self.intern(Matcher::clone(node)),
        }
    }

    fn intern_children(&mut self, matcher: Matcher) -> Matcher {
        match matcher {
            Matcher::Sequence(children) => {
                Matcher::Sequence(children.iter().map(|c| self.intern_ref(c)).collect())
            }
            Matcher::Alternation(children) => {
                Matcher::Alternation(children.iter().map(|c| self.intern_ref(c)).collect())
            }
            Matcher::Repetition { inner, min, max } => Matcher::Repetition {
                inner: self.intern_ref(&inner),
                min,
                max,
            },
            Matcher::Optional(inner) => Matcher::Optional(self.intern_ref(&inner)),
            Matcher::Negated(inner) => Matcher::Negated(self.intern_ref(&inner)),
            Matcher::RuleWrapper { name, inner } => Matcher::RuleWrapper {
                inner: self.intern_ref(&inner),
                name,
            },
            Matcher::Ignore(inner) => Matcher::Ignore(self.intern_ref(&inner)),
            Matcher::Join(inner) => Matcher::Join(self.intern_ref(&inner)),
            Matcher::Marker(inner) => Matcher::Marker(self.intern_ref(&inner)),
            Matcher::Saving { name, inner } => Matcher::Saving {
                inner: self.intern_ref(&inner),
                name,
            },
            leaf => leaf,
        }
    }
}
