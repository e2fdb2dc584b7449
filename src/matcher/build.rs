//! Checked constructors.
//!
//! The enum variants are public so trees can be pattern matched, but building
//! through these functions rejects invariant violations up front with a
//! `MalformedGrammar` error instead of at table-validation time.

use crate::diagnostics::GrammarError;
use crate::matcher::{CharPredicate, Matcher, MatcherRef};

type BuildResult = Result<Matcher, GrammarError>;

impl Matcher {
    pub fn literal(ch: char) -> Matcher {
        Matcher::Literal(ch)
    }

    /// A literal string. Single-character strings become a `Literal`.
    pub fn literal_str(text: impl Into<String>) -> BuildResult {
        let text = text.into();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(GrammarError::malformed("literal string must not be empty")),
            (Some(ch), None) => Ok(Matcher::Literal(ch)),
            _ => Ok(Matcher::LiteralString(text)),
        }
    }

    pub fn range(lo: char, hi: char) -> BuildResult {
        if lo > hi {
            return Err(GrammarError::malformed(format!(
                "range {lo:?}..{hi:?} has its lower bound above its upper bound"
            )));
        }
        Ok(Matcher::Range(lo, hi))
    }

    /// Any of the given characters; sorted and deduplicated here.
    pub fn set(chars: impl IntoIterator<Item = char>) -> BuildResult {
        let mut chars: Vec<char> = chars.into_iter().collect();
        chars.sort_unstable();
        chars.dedup();
        if chars.is_empty() {
            return Err(GrammarError::malformed("character set must not be empty"));
        }
        Ok(Matcher::Set(chars))
    }

    pub fn predicate(
        name: &str,
        test: impl Fn(char) -> bool + Send + Sync + 'static,
    ) -> Matcher {
        Matcher::Predicate(CharPredicate::new(name, test))
    }

    pub fn end_of_input() -> Matcher {
        Matcher::EndOfInput
    }

    pub fn sequence<I, M>(children: I) -> BuildResult
    where
        I: IntoIterator<Item = M>,
        M: Into<MatcherRef>,
    {
        let children: Vec<MatcherRef> = children.into_iter().map(Into::into).collect();
        if children.is_empty() {
            return Err(GrammarError::malformed("sequence needs at least one child"));
        }
        Ok(Matcher::Sequence(children))
    }

    pub fn alternation<I, M>(children: I) -> BuildResult
    where
        I: IntoIterator<Item = M>,
        M: Into<MatcherRef>,
    {
        let children: Vec<MatcherRef> = children.into_iter().map(Into::into).collect();
        if children.is_empty() {
            return Err(GrammarError::malformed("alternation needs at least one child"));
        }
        Ok(Matcher::Alternation(children))
    }

    pub fn repeat(inner: impl Into<MatcherRef>, min: usize, max: Option<usize>) -> BuildResult {
        if let Some(max) = max {
            if min > max {
                return Err(GrammarError::malformed(format!(
                    "repetition minimum {min} exceeds maximum {max}"
                )));
            }
        }
        Ok(Matcher::Repetition {
            inner: inner.into(),
            min,
            max,
        })
    }

    /// Zero or more.
    pub fn many(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Repetition {
            inner: inner.into(),
            min: 0,
            max: None,
        }
    }

    /// One or more.
    pub fn many1(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Repetition {
            inner: inner.into(),
            min: 1,
            max: None,
        }
    }

    pub fn optional(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Optional(inner.into())
    }

    pub fn not(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Negated(inner.into())
    }

    pub fn rule(name: impl Into<String>) -> Matcher {
        Matcher::RuleRef(name.into())
    }

    pub fn wrap_rule(name: impl Into<String>, inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::RuleWrapper {
            name: name.into(),
            inner: inner.into(),
        }
    }

    pub fn ignore(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Ignore(inner.into())
    }

    pub fn join(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Join(inner.into())
    }

    pub fn mark(inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Marker(inner.into())
    }

    pub fn save(name: impl Into<String>, inner: impl Into<MatcherRef>) -> Matcher {
        Matcher::Saving {
            name: name.into(),
            inner: inner.into(),
        }
    }

    pub fn load(name: impl Into<String>) -> Matcher {
        Matcher::Loading(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_is_rejected() {
        assert!(matches!(
            Matcher::range('z', 'a'),
            Err(GrammarError::MalformedGrammar { .. })
        ));
        assert_eq!(Matcher::range('a', 'a'), Ok(Matcher::Range('a', 'a')));
    }

    #[test]
    fn set_is_normalized() {
        assert_eq!(
            Matcher::set("cabca".chars()),
            Ok(Matcher::Set(vec!['a', 'b', 'c']))
        );
        assert!(Matcher::set(std::iter::empty()).is_err());
    }

    #[test]
    fn empty_combinators_are_rejected() {
        assert!(Matcher::sequence(Vec::<Matcher>::new()).is_err());
        assert!(Matcher::alternation(Vec::<Matcher>::new()).is_err());
        assert!(Matcher::literal_str("").is_err());
        assert_eq!(Matcher::literal_str("x"), Ok(Matcher::Literal('x')));
    }

    #[test]
    fn repetition_bounds() {
        assert!(Matcher::repeat(Matcher::literal('a'), 3, Some(2)).is_err());
        assert!(Matcher::repeat(Matcher::literal('a'), 3, None).is_ok());
    }
}
