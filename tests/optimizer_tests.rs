//! Optimizer rewrites checked through the public API.

mod common;

use common::{alt, lit, range, run, seq, text};
use sutra_match::{optimize, EngineConfig, Executor, Matcher, MatchErrorKind, RuleTable, SourceReader};

#[test]
fn test_redundant_literal_inside_range_is_dropped() {
    let m = alt(vec![range('0', '9'), lit('5')]);
    let optimized = optimize(&m);
    assert_eq!(optimized, Matcher::Range('0', '9'));

    let result = run(&optimized, "5");
    assert!(result.success);
    assert_eq!(result.consumed(), 1);
}

#[test]
fn test_literals_merge_into_a_range() {
    let m = alt(vec![lit('a'), lit('b'), lit('c')]);
    let optimized = optimize(&m);
    assert_eq!(optimized, Matcher::Range('a', 'c'));
    assert!(run(&optimized, "b").success);

    let miss = run(&optimized, "d");
    assert!(!miss.success);
    // The unoptimized tree reports exhaustion; the range reports its class.
    assert_eq!(
        run(&m, "d").error.unwrap().kind,
        MatchErrorKind::AlternationExhausted
    );
}

#[test]
fn test_rewrite_reaches_nested_alternations() {
    let vowel = alt(vec![lit('a'), lit('e'), lit('i'), lit('o'), lit('u')]);
    let m = seq(vec![
        Matcher::many1(vowel),
        Matcher::optional(alt(vec![lit('x'), lit('y'), lit('z')])),
    ]);
    let optimized = optimize(&m);
    assert_eq!(optimized.to_string(), "[aeiou]+ [x-z]?");
    for input in ["aei", "ouz", "b", "aax"] {
        let before = run(&m, input);
        let after = run(&optimized, input);
        assert_eq!(before.success, after.success, "input {input:?}");
        assert_eq!(before.consumed(), after.consumed(), "input {input:?}");
    }
}

#[test]
fn test_ordered_choice_is_kept_around_strings() {
    // 'a' must still be tried before "ab", so "ab" never wins.
    let m = alt(vec![lit('a'), text("ab"), lit('b')]);
    let optimized = optimize(&m);
    assert_eq!(optimized, m);
    let result = run(&optimized, "ab");
    assert_eq!(result.matched_text(), "a");
}

#[test]
fn test_optimize_is_idempotent() {
    let m = alt(vec![
        lit('q'),
        alt(vec![range('a', 'f'), lit('g')]),
        text("if"),
        Matcher::set(['1', '3', '2']).unwrap(),
        lit('z'),
    ]);
    let once = optimize(&m);
    let twice = optimize(&once);
    assert_eq!(once, twice);
    assert_eq!(once.to_string(), "[a-f] | [gq] | 'if' | [1-3] | 'z'");
}

#[test]
fn test_optimized_table_matches_the_same_language() {
    let ident = seq(vec![
        alt(vec![range('a', 'z'), range('A', 'Z'), lit('_')]),
        Matcher::many(alt(vec![
            range('a', 'z'),
            range('A', 'Z'),
            range('0', '9'),
            lit('_'),
        ])),
    ]);
    let table: RuleTable = RuleTable::builder()
        .root("ident")
        .rule("ident", ident)
        .build()
        .unwrap();
    let optimized = table.optimized();
    assert!(optimized.config().optimize);

    for input in ["snake_case9", "_x", "9lives", "Ab-c"] {
        let mut a = SourceReader::new(input);
        let mut b = SourceReader::new(input);
        let plain = Executor::new(&table).run_root(&mut a).unwrap();
        let fast = Executor::new(&optimized).run_root(&mut b).unwrap();
        assert_eq!(plain.success, fast.success, "input {input:?}");
        assert_eq!(plain.fragments, fast.fragments, "input {input:?}");
        assert_eq!(a.position(), b.position());
    }

    let built: RuleTable = RuleTable::builder()
        .root("ident")
        .rule("ident", table.get("ident").unwrap().definition().clone())
        .config(EngineConfig::default().with_optimize(true))
        .build()
        .unwrap();
    assert_eq!(
        built.get("ident").unwrap().definition(),
        optimized.get("ident").unwrap().definition()
    );
}
