//! Property-based tests for the executor and optimizer.
//!
//! Trees are drawn over a four-letter alphabet so that random inputs hit
//! both matches and near-misses. They may reference the rules in
//! [`rules`] and save or load the backreferences `x` and `y`. Trees the
//! validator rejects (loops over empty matches, nested optionals) are
//! skipped.

use std::sync::Arc;

use proptest::prelude::*;
use sutra_match::{
    execute, optimize, CharPredicate, MatchResult, Matcher, RuleTable, SourceReader,
};

const NAMES: [&str; 2] = ["x", "y"];

/// Rules the generated trees may call.
fn rules() -> RuleTable {
    let pair = Matcher::sequence([Matcher::literal('a'), Matcher::literal('b')]).unwrap();
    let word = Matcher::many1(Matcher::range('a', 'd').unwrap());
    let echo = Matcher::sequence([
        Matcher::save("x", Matcher::range('a', 'd').unwrap()),
        Matcher::load("x"),
    ])
    .unwrap();
    RuleTable::builder()
        .rule("pair", pair)
        .rule("word", word)
        .rule("echo", echo)
        .build()
        .unwrap()
}

/// Leaf matchers over `a..=d`
fn leaf_strategy() -> impl Strategy<Value = Matcher> {
    let letter = || proptest::char::range('a', 'd');
    let early = CharPredicate::new("early", |ch| ch == 'a' || ch == 'b');
    prop_oneof![
        letter().prop_map(Matcher::Literal),
        (letter(), letter()).prop_map(|(x, y)| Matcher::Range(x.min(y), x.max(y))),
        prop::collection::btree_set(letter(), 1..4)
            .prop_map(|set| Matcher::Set(set.into_iter().collect())),
        prop::sample::select(vec!["ab", "ba", "abc", "dd"])
            .prop_map(|s| Matcher::LiteralString(s.to_string())),
        Just(Matcher::EndOfInput),
        Just(Matcher::Predicate(early)),
        prop::sample::select(vec!["pair", "word", "echo"]).prop_map(|name| Matcher::rule(name)),
        prop::sample::select(NAMES.to_vec()).prop_map(|name| Matcher::load(name)),
    ]
}

/// Arbitrary trees built from the combinators
fn matcher_strategy() -> impl Strategy<Value = Matcher> {
    leaf_strategy().prop_recursive(4, 32, 4, |inner| {
        let child = inner.prop_map(Arc::new);
        prop_oneof![
            prop::collection::vec(child.clone(), 1..4).prop_map(Matcher::Sequence),
            prop::collection::vec(child.clone(), 1..5).prop_map(Matcher::Alternation),
            (child.clone(), 0usize..3, prop::option::of(0usize..3)).prop_map(
                |(inner, min, extra)| Matcher::Repetition {
                    inner,
                    min,
                    max: extra.map(|extra| min + extra),
                }
            ),
            child.clone().prop_map(Matcher::Optional),
            child.clone().prop_map(Matcher::Negated),
            child.clone().prop_map(Matcher::Ignore),
            child.clone().prop_map(Matcher::Join),
            child.clone().prop_map(Matcher::Marker),
            (prop::sample::select(NAMES.to_vec()), child).prop_map(|(name, inner)| {
                Matcher::Saving {
                    name: name.to_string(),
                    inner,
                }
            }),
        ]
    })
}

fn input_strategy() -> impl Strategy<Value = String> {
    "[a-d]{0,8}"
}

fn is_valid(m: &Matcher, rules: &RuleTable) -> bool {
    rules.check(m).is_ok()
}

fn run(m: &Matcher, input: &str, rules: &RuleTable) -> MatchResult {
    execute(m, &mut SourceReader::new(input), rules).unwrap()
}

proptest! {
    #[test]
    fn execution_is_deterministic(m in matcher_strategy(), input in input_strategy()) {
        let rules = rules();
        prop_assume!(is_valid(&m, &rules));
        let first = run(&m, &input, &rules);
        let second = run(&m, &input, &rules);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn optimize_is_idempotent(m in matcher_strategy()) {
        prop_assume!(is_valid(&m, &rules()));
        let once = optimize(&m);
        let twice = optimize(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn optimize_preserves_the_language(m in matcher_strategy(), input in input_strategy()) {
        let rules = rules();
        prop_assume!(is_valid(&m, &rules));
        let optimized = optimize(&m);
        prop_assert!(is_valid(&optimized, &rules), "optimized tree rejected: {}", optimized);

        let before = run(&m, &input, &rules);
        let after = run(&optimized, &input, &rules);
        prop_assert_eq!(before.success, after.success, "{} vs {}", m, optimized);
        prop_assert_eq!(before.consumed(), after.consumed(), "{} vs {}", m, optimized);

        let optimized_rules = rules.optimized();
        let after = run(&m, &input, &optimized_rules);
        prop_assert_eq!(before.success, after.success);
        prop_assert_eq!(before.consumed(), after.consumed());
    }

    #[test]
    fn failure_leaves_the_reader_untouched(
        m in matcher_strategy(),
        input in input_strategy(),
        skip in 0usize..3,
    ) {
        let rules = rules();
        prop_assume!(is_valid(&m, &rules));
        let mut reader = SourceReader::new(input.as_str());
        reader.advance(skip);
        let start = reader.position();

        let result = execute(&m, &mut reader, &rules).unwrap();
        prop_assert_eq!(reader.save_depth(), 0);
        if result.success {
            prop_assert_eq!(reader.position(), result.range.end.offset);
        } else {
            prop_assert_eq!(reader.position(), start);
            prop_assert!(result.fragments.is_empty());
        }
    }

    #[test]
    fn negation_is_lookahead_only(m in matcher_strategy(), input in input_strategy()) {
        let rules = rules();
        prop_assume!(is_valid(&m, &rules));
        let negated = Matcher::not(m.clone());
        let mut reader = SourceReader::new(input.as_str());

        let plain = execute(&m, &mut SourceReader::new(input.as_str()), &rules).unwrap();
        let result = execute(&negated, &mut reader, &rules).unwrap();
        prop_assert_eq!(reader.position(), 0);
        prop_assert!(result.fragments.is_empty());
        prop_assert_eq!(result.success, !plain.success);
    }
}
