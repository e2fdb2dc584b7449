//! # Matcher Trees
//!
//! A grammar is a tree of [`Matcher`] nodes. The tree is plain immutable data:
//! children are shared through [`MatcherRef`] (`Arc<Matcher>`) so identical
//! subtrees can be built once and reused by many rules without that sharing
//! ever showing up in match results.
//!
//! - `build`: checked constructors that enforce the node invariants
//! - `display`: reconstructs a grammar expression from a tree
//! - `intern`: hash-consing of structurally identical subtrees

mod build;
mod display;
mod intern;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use intern::MatcherInterner;

/// Shared handle to a matcher node.
pub type MatcherRef = Arc<Matcher>;

/// One node of a grammar tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Exactly this character.
    Literal(char),
    /// Exactly this non-empty string.
    LiteralString(String),
    /// Any character in the inclusive range `lo..=hi`.
    Range(char, char),
    /// Any character of a sorted, duplicate-free, non-empty list.
    Set(Vec<char>),
    /// Any character the predicate accepts. Opaque to the optimizer.
    Predicate(CharPredicate),
    /// Only at the end of the text; consumes nothing.
    EndOfInput,
    /// Every child in order.
    Sequence(Vec<MatcherRef>),
    /// The first child, in order, that matches.
    Alternation(Vec<MatcherRef>),
    /// `inner` repeated greedily between `min` and `max` times. `max: None`
    /// means no upper bound.
    Repetition {
        inner: MatcherRef,
        min: usize,
        max: Option<usize>,
    },
    /// `inner` zero or one time. Never fails.
    Optional(MatcherRef),
    /// Succeeds without consuming iff `inner` fails here.
    Negated(MatcherRef),
    /// The rule of this name in the rule table.
    RuleRef(String),
    /// `inner`, tagged with the rule it implements.
    RuleWrapper { name: String, inner: MatcherRef },
    /// `inner`, with its fragments dropped.
    Ignore(MatcherRef),
    /// `inner`, with its fragments concatenated into one.
    Join(MatcherRef),
    /// `inner`, reported to the marker sink on success.
    Marker(MatcherRef),
    /// `inner`; on success its text is saved under `name`.
    Saving { name: String, inner: MatcherRef },
    /// The text saved under `name` earlier in the same execution.
    Loading(String),
}

impl Matcher {
    /// Direct children of this node, in order.
    pub fn children(&self) -> Vec<&MatcherRef> {
        match self {
            Matcher::Sequence(children) | Matcher::Alternation(children) => {
                children.iter().collect()
            }
            Matcher::Repetition { inner, .. }
            | Matcher::Optional(inner)
            | Matcher::Negated(inner)
            | Matcher::RuleWrapper { inner, .. }
            | Matcher::Ignore(inner)
            | Matcher::Join(inner)
            | Matcher::Marker(inner)
            | Matcher::Saving { inner, .. } => vec![inner],
            Matcher::Literal(_)
            | Matcher::LiteralString(_)
            | Matcher::Range(..)
            | Matcher::Set(_)
            | Matcher::Predicate(_)
            | Matcher::EndOfInput
            | Matcher::RuleRef(_)
            | Matcher::Loading(_) => Vec::new(),
        }
    }

    /// True for nodes that always consume exactly one character on success.
    pub fn is_single_char(&self) -> bool {
        matches!(
            self,
            Matcher::Literal(_) | Matcher::Range(..) | Matcher::Set(_) | Matcher::Predicate(_)
        )
    }

    /// Number of nodes in the tree, counting shared subtrees once per use.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }
}

// ============================================================================
// CHARACTER PREDICATES
// ============================================================================

/// A named character test.
///
/// Two predicates are equal when they carry the same name and the same
/// function object, so clones of one predicate compare equal while two
/// separately built closures never do.
#[derive(Clone)]
pub struct CharPredicate {
    name: Arc<str>,
    test: Arc<dyn Fn(char) -> bool + Send + Sync>,
}

impl CharPredicate {
    pub fn new(name: impl Into<Arc<str>>, test: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn test(&self, ch: char) -> bool {
        (self.test)(ch)
    }

    fn fn_addr(&self) -> *const () {
        Arc::as_ptr(&self.test) as *const ()
    }
}

impl PartialEq for CharPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.fn_addr() == other.fn_addr()
    }
}

impl Eq for CharPredicate {}

impl Hash for CharPredicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for CharPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharPredicate({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_clones_compare_equal() {
        let digit = CharPredicate::new("digit", |c: char| c.is_ascii_digit());
        let other = CharPredicate::new("digit", |c: char| c.is_ascii_digit());
        assert_eq!(digit, digit.clone());
        assert_ne!(digit, other);
        assert!(digit.test('7'));
        assert!(!digit.test('x'));
    }

    #[test]
    fn structural_equality_sees_through_sharing() {
        let a: MatcherRef = Arc::new(Matcher::Literal('a'));
        let shared = Matcher::Sequence(vec![a.clone(), a.clone()]);
        let fresh = Matcher::Sequence(vec![
            Arc::new(Matcher::Literal('a')),
            Arc::new(Matcher::Literal('a')),
        ]);
        assert_eq!(shared, fresh);
        assert_eq!(shared.node_count(), 3);
    }
}
