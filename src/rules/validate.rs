//! Static checks run once when a rule table is built.
//!
//! Each check focuses on a single concern and stops at the first problem,
//! walking rules in declaration order so reports are reproducible.

use std::collections::HashSet;

use im::HashMap;

use crate::diagnostics::GrammarError;
use crate::matcher::Matcher;
use crate::rules::{Rule, RuleTable};

pub(crate) fn validate_table<T>(table: &mut RuleTable<T>) -> Result<(), GrammarError> {
    for rule in &table.rules {
        check_references(rule.body(), table, Some(rule.name()))?;
    }

    table.nullable = nullable_rules(&table.rules);

    for rule in &table.rules {
        check_well_formed(rule.body(), &table.nullable).map_err(|e| e.in_rule(rule.name()))?;
    }

    check_left_recursion(table)
}

// ============================================================================
// REFERENCES
// ============================================================================

/// Reports the first rule name under `matcher` that the table lacks.
pub(crate) fn check_references<T>(
    matcher: &Matcher,
    table: &RuleTable<T>,
    from: Option<&str>,
) -> Result<(), GrammarError> {
    let name = match matcher {
        Matcher::RuleRef(name) | Matcher::RuleWrapper { name, .. } => Some(name),
        _ => None,
    };
    if let Some(name) = name {
        if !table.contains(name) {
            return Err(GrammarError::UndefinedRule {
                name: name.clone(),
                referenced_from: from.map(str::to_string),
            });
        }
    }
    for child in matcher.children() {
        check_references(child, table, from)?;
    }
    Ok(())
}

// ============================================================================
// NODE INVARIANTS
// ============================================================================

/// Per-node invariants, plus the loop check: an unbounded repetition whose
/// body can match the empty string would never terminate.
pub(crate) fn check_well_formed(
    matcher: &Matcher,
    nullable: &HashMap<String, bool>,
) -> Result<(), GrammarError> {
    match matcher {
        Matcher::LiteralString(text) if text.is_empty() => {
            return Err(GrammarError::malformed("literal string must not be empty"));
        }
        Matcher::Range(lo, hi) if lo > hi => {
            return Err(GrammarError::malformed(format!(
                "range {lo:?}..{hi:?} has its lower bound above its upper bound"
            )));
        }
        Matcher::Set(chars) => {
            if chars.is_empty() {
                return Err(GrammarError::malformed("character set must not be empty"));
            }
            if chars.windows(2).any(|w| w[0] >= w[1]) {
                return Err(GrammarError::malformed(format!(
                    "character set {matcher} is not sorted and duplicate-free"
                )));
            }
        }
        Matcher::Sequence(children) if children.is_empty() => {
            return Err(GrammarError::malformed("sequence needs at least one child"));
        }
        Matcher::Alternation(children) if children.is_empty() => {
            return Err(GrammarError::malformed("alternation needs at least one child"));
        }
        Matcher::Repetition { inner, min, max } => {
            if let Some(max) = max {
                if min > max {
                    return Err(GrammarError::malformed(format!(
                        "repetition minimum {min} exceeds maximum {max}"
                    )));
                }
            } else if is_nullable(inner, nullable) {
                return Err(GrammarError::malformed(format!(
                    "unbounded repetition {matcher} can loop forever on an empty match"
                )));
            }
        }
        Matcher::Optional(inner) if matches!(**inner, Matcher::Optional(_)) => {
            return Err(GrammarError::malformed(format!(
                "optional directly inside an optional: {matcher}"
            )));
        }
        Matcher::RuleRef(name)
        | Matcher::RuleWrapper { name, .. }
        | Matcher::Saving { name, .. }
        | Matcher::Loading(name)
            if name.is_empty() =>
        {
            return Err(GrammarError::malformed("names must not be empty"));
        }
        _ => {}
    }
    for child in matcher.children() {
        check_well_formed(child, nullable)?;
    }
    Ok(())
}

// ============================================================================
// NULLABILITY
// ============================================================================

/// Whether `matcher` can succeed without consuming input. Rule references
/// are answered from `nullable`; unknown names count as not nullable.
///
/// `Loading` counts as nullable since the saved text may be empty.
pub(crate) fn is_nullable(matcher: &Matcher, nullable: &HashMap<String, bool>) -> bool {
    match matcher {
        Matcher::Literal(_)
        | Matcher::LiteralString(_)
        | Matcher::Range(..)
        | Matcher::Set(_)
        | Matcher::Predicate(_) => false,
        Matcher::EndOfInput | Matcher::Optional(_) | Matcher::Negated(_) | Matcher::Loading(_) => {
            true
        }
        Matcher::Sequence(children) => children.iter().all(|c| is_nullable(c, nullable)),
        Matcher::Alternation(children) => children.iter().any(|c| is_nullable(c, nullable)),
        Matcher::Repetition { inner, min, .. } => *min == 0 || is_nullable(inner, nullable),
        Matcher::RuleRef(name) => nullable.get(name).copied().unwrap_or(false),
        Matcher::RuleWrapper { inner, .. }
        | Matcher::Ignore(inner)
        | Matcher::Join(inner)
        | Matcher::Marker(inner)
        | Matcher::Saving { inner, .. } => is_nullable(inner, nullable),
    }
}

/// Least fixed point of rule nullability.
fn nullable_rules<T>(rules: &[Rule<T>]) -> HashMap<String, bool> {
    let mut nullable: HashMap<String, bool> =
        rules.iter().map(|r| (r.name.clone(), false)).collect();
    loop {
        let mut changed = false;
        for rule in rules {
            if nullable.get(&rule.name).copied().unwrap_or(false) {
                continue;
            }
            if is_nullable(rule.body(), &nullable) {
                nullable.insert(rule.name.clone(), true);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

// ============================================================================
// LEFT RECURSION
// ============================================================================

/// Rules `matcher` may invoke before consuming any input.
fn leading_refs<'m>(matcher: &'m Matcher, nullable: &HashMap<String, bool>, out: &mut Vec<&'m str>) {
    match matcher {
        Matcher::RuleRef(name) => out.push(name),
        Matcher::Sequence(children) => {
            for child in children {
                leading_refs(child, nullable, out);
                if !is_nullable(child, nullable) {
                    break;
                }
            }
        }
        Matcher::Alternation(children) => {
            for child in children {
                leading_refs(child, nullable, out);
            }
        }
        Matcher::Repetition { inner, .. }
        | Matcher::Optional(inner)
        | Matcher::Negated(inner)
        | Matcher::RuleWrapper { inner, .. }
        | Matcher::Ignore(inner)
        | Matcher::Join(inner)
        | Matcher::Marker(inner)
        | Matcher::Saving { inner, .. } => leading_refs(inner, nullable, out),
        Matcher::Literal(_)
        | Matcher::LiteralString(_)
        | Matcher::Range(..)
        | Matcher::Set(_)
        | Matcher::Predicate(_)
        | Matcher::EndOfInput
        | Matcher::Loading(_) => {}
    }
}

/// Rejects any rule that can reach itself without consuming input,
/// reporting the cycle as `a -> b -> a`.
fn check_left_recursion<T>(table: &RuleTable<T>) -> Result<(), GrammarError> {
    let graph: Vec<(&str, Vec<&str>)> = table
        .rules
        .iter()
        .map(|rule| {
            let mut refs = Vec::new();
            leading_refs(rule.body(), &table.nullable, &mut refs);
            (rule.name(), refs)
        })
        .collect();
    let edges: std::collections::HashMap<&str, &[&str]> = graph
        .iter()
        .map(|(name, refs)| (*name, refs.as_slice()))
        .collect();

    let mut done: HashSet<&str> = HashSet::new();
    for (name, _) in &graph {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle(name, &edges, &mut path, &mut done) {
            return Err(GrammarError::MalformedGrammar {
                rule: cycle.first().map(|s| s.to_string()),
                reason: format!("left recursion: {}", cycle.join(" -> ")),
            });
        }
    }
    Ok(())
}

fn find_cycle<'a>(
    name: &'a str,
    edges: &std::collections::HashMap<&'a str, &[&'a str]>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Option<Vec<&'a str>> {
    if let Some(start) = path.iter().position(|&n| n == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        return Some(cycle);
    }
    if done.contains(name) {
        return None;
    }
    path.push(name);
    for &next in edges.get(name).copied().unwrap_or_default() {
        if let Some(cycle) = find_cycle(next, edges, path, done) {
            return Some(cycle);
        }
    }
    path.pop();
    done.insert(name);
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn table(rules: Vec<(&str, Matcher)>) -> Result<RuleTable, GrammarError> {
        rules
            .into_iter()
            .fold(RuleTable::builder(), |b, (name, body)| b.rule(name, body))
            .build()
    }

    #[test]
    fn first_undefined_reference_is_reported() {
        let err = table(vec![
            ("a", Matcher::rule("b")),
            ("c", Matcher::rule("d")),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            GrammarError::UndefinedRule {
                name: "b".into(),
                referenced_from: Some("a".into()),
            }
        );
    }

    #[test]
    fn loop_over_empty_match_is_rejected() {
        let body = Matcher::many(Matcher::optional(Matcher::Literal('a')));
        let err = table(vec![("loop", body)]).unwrap_err();
        assert!(matches!(
            err,
            GrammarError::MalformedGrammar { rule: Some(ref r), .. } if r == "loop"
        ));
    }

    #[test]
    fn loop_check_sees_through_rules() {
        let err = table(vec![
            ("spaces", Matcher::many(Matcher::Literal(' '))),
            ("body", Matcher::many1(Matcher::rule("spaces"))),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("unbounded repetition"), "{err}");

        let bounded = Matcher::repeat(Matcher::rule("spaces"), 0, Some(3)).unwrap();
        assert!(table(vec![
            ("spaces", Matcher::many(Matcher::Literal(' '))),
            ("body", bounded),
        ])
        .is_ok());
    }

    #[test]
    fn nested_optional_is_rejected() {
        let body = Matcher::optional(Matcher::optional(Matcher::Literal('a')));
        assert!(table(vec![("opt", body)]).is_err());
    }

    #[test]
    fn unsorted_set_is_rejected() {
        let err = table(vec![("set", Matcher::Set(vec!['b', 'a']))]).unwrap_err();
        assert!(matches!(err, GrammarError::MalformedGrammar { .. }));
    }

    #[test]
    fn left_recursion_reports_the_cycle() {
        let expr = Matcher::sequence([Matcher::rule("term"), Matcher::Literal('+')]).unwrap();
        let term = Matcher::alternation([Matcher::rule("expr"), Matcher::Literal('1')]).unwrap();
        let err = table(vec![("expr", expr), ("term", term)]).unwrap_err();
        assert_eq!(
            err,
            GrammarError::MalformedGrammar {
                rule: Some("expr".into()),
                reason: "left recursion: expr -> term -> expr".into(),
            }
        );
    }

    #[test]
    fn recursion_after_consumption_is_fine() {
        let parens = Matcher::sequence([
            Arc::new(Matcher::Literal('(')),
            Arc::new(Matcher::optional(Matcher::rule("parens"))),
            Arc::new(Matcher::Literal(')')),
        ])
        .unwrap();
        assert!(table(vec![("parens", parens)]).is_ok());
    }
}
