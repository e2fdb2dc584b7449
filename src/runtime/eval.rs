//! Backtracking interpretation of matcher trees.
//!
//! Every step returns `Result<Output<T>, MatchError>`. A failing step leaves
//! the reader, and the saved backreferences, exactly as it found them.
//!
//! Backtracking follows two disciplines:
//!
//! - `Sequence`, `Repetition` and `Optional` nest, so they use the reader's
//!   save stack (`save` / `load` / `discard_save`).
//! - `Alternation` and `Negated` return to one origin repeatedly, so they
//!   record it and `rewind` to it directly.
//!
//! Fatal failures (`RecursionLimit`, `Internal`) pass through every
//! combinator untouched.

use tracing::trace;

use crate::diagnostics::{MatchError, MatchErrorKind};
use crate::matcher::{Matcher, MatcherRef};
use crate::runtime::context::ExecutionContext;
use crate::runtime::result::Output;
use crate::source::{SourceLocation, SourceRange, SourceReader};

type Step<T> = Result<Output<T>, MatchError>;

/// Remaining stack below which a rule body runs on a freshly allocated segment.
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_GROWTH: usize = 4 * 1024 * 1024;

pub(crate) fn evaluate<T>(
    matcher: &Matcher,
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    match matcher {
        Matcher::Literal(expected) => match_char(matcher, reader, |ch| ch == *expected),
        Matcher::LiteralString(expected) => {
            if !reader.is_next(expected) {
                return Err(mismatch(matcher, reader));
            }
            reader.advance_bytes(expected.len());
            Ok(Output::single(expected.clone()))
        }
        Matcher::Range(lo, hi) => match_char(matcher, reader, |ch| (*lo..=*hi).contains(&ch)),
        Matcher::Set(chars) => match_char(matcher, reader, |ch| chars.binary_search(&ch).is_ok()),
        Matcher::Predicate(predicate) => match_char(matcher, reader, |ch| predicate.test(ch)),
        Matcher::EndOfInput => {
            if reader.is_at_end() {
                Ok(Output::empty())
            } else {
                Err(mismatch(matcher, reader))
            }
        }
        Matcher::Sequence(children) => evaluate_sequence(children, reader, ctx),
        Matcher::Alternation(children) => evaluate_alternation(children, reader, ctx),
        Matcher::Repetition { inner, min, max } => {
            evaluate_repetition(inner, *min, *max, reader, ctx)
        }
        Matcher::Optional(inner) => evaluate_optional(inner, reader, ctx),
        Matcher::Negated(inner) => evaluate_negated(inner, reader, ctx),
        Matcher::RuleRef(name) => {
            let rules = ctx.rules;
            let Some(rule) = rules.get(name) else {
                return Err(internal(format!("rule '{name}' is not in the table"), reader));
            };
            evaluate(rule.body(), reader, ctx)
        }
        Matcher::RuleWrapper { name, inner } => evaluate_rule(name, inner, reader, ctx),
        Matcher::Ignore(inner) => {
            let output = evaluate(inner, reader, ctx)?;
            Ok(Output {
                fragments: Vec::new(),
                nodes: output.nodes,
            })
        }
        Matcher::Join(inner) => {
            let output = evaluate(inner, reader, ctx)?;
            Ok(Output {
                fragments: vec![output.fragments.concat()],
                nodes: output.nodes,
            })
        }
        Matcher::Marker(inner) => {
            let start = reader.location();
            let output = evaluate(inner, reader, ctx)?;
            ctx.marker
                .marked(SourceRange::new(start, reader.location()), &output.fragments);
            Ok(output)
        }
        Matcher::Saving { name, inner } => {
            let output = evaluate(inner, reader, ctx)?;
            ctx.saves.insert(name.clone(), output.fragments.concat());
            Ok(output)
        }
        Matcher::Loading(name) => {
            let Some(expected) = ctx.saves.get(name).cloned() else {
                return Err(MatchError::new(
                    MatchErrorKind::UnknownBackreference { name: name.clone() },
                    reader.location(),
                ));
            };
            if !reader.is_next(&expected) {
                return Err(MatchError::new(
                    MatchErrorKind::BackreferenceMismatch {
                        name: name.clone(),
                        expected,
                    },
                    reader.location(),
                ));
            }
            reader.advance_bytes(expected.len());
            Ok(Output::single(expected))
        }
    }
}

// ============================================================================
// PRIMITIVES
// ============================================================================

fn match_char<T>(
    matcher: &Matcher,
    reader: &mut SourceReader,
    accept: impl Fn(char) -> bool,
) -> Step<T> {
    match reader.peek(0) {
        Some(ch) if accept(ch) => {
            reader.advance(1);
            Ok(Output::single(ch.to_string()))
        }
        _ => Err(mismatch(matcher, reader)),
    }
}

fn mismatch(matcher: &Matcher, reader: &SourceReader) -> MatchError {
    let expected = match matcher {
        Matcher::EndOfInput => "end of input".to_string(),
        other => other.to_string(),
    };
    MatchError::new(MatchErrorKind::SyntaxMismatch { expected }, reader.location())
}

fn internal(reason: String, reader: &SourceReader) -> MatchError {
    MatchError::new(MatchErrorKind::Internal { reason }, reader.location())
}

fn load(reader: &mut SourceReader) -> Result<SourceLocation, MatchError> {
    let at = reader.location();
    reader.load().map_err(|err| MatchError::reader_fault(err, at))
}

fn discard_save(reader: &mut SourceReader) -> Result<SourceLocation, MatchError> {
    let at = reader.location();
    reader
        .discard_save()
        .map_err(|err| MatchError::reader_fault(err, at))
}

fn rewind(reader: &mut SourceReader, to: SourceLocation) -> Result<(), MatchError> {
    let at = reader.location();
    reader
        .rewind(to)
        .map_err(|err| MatchError::reader_fault(err, at))
}

// ============================================================================
// COMBINATORS
// ============================================================================

fn evaluate_sequence<T>(
    children: &[MatcherRef],
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    let saves = ctx.saves.clone();
    reader.save();
    let mut output = Output::empty();
    for child in children {
        match evaluate(child, reader, ctx) {
            Ok(step) => output.append(step),
            Err(err) => {
                load(reader)?;
                ctx.saves = saves;
                return Err(err);
            }
        }
    }
    discard_save(reader)?;
    Ok(output)
}

fn evaluate_alternation<T>(
    children: &[MatcherRef],
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    let start = reader.location();
    let saves = ctx.saves.clone();
    let mut furthest: Option<MatchError> = None;
    for child in children {
        let err = match evaluate(child, reader, ctx) {
            Ok(output) => return Ok(output),
            Err(err) => err,
        };
        rewind(reader, start)?;
        ctx.saves = saves.clone();
        if err.is_fatal() {
            return Err(err);
        }
        furthest = Some(match furthest {
            Some(best) if reach(&best) >= reach(&err) => best,
            _ => err,
        });
    }
    let exhausted = MatchError::new(MatchErrorKind::AlternationExhausted, start);
    Err(match furthest {
        Some(cause) => exhausted.with_cause(cause),
        None => exhausted,
    })
}

fn reach(err: &MatchError) -> usize {
    err.furthest_location().offset
}

fn evaluate_repetition<T>(
    inner: &Matcher,
    min: usize,
    max: Option<usize>,
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    let start = reader.location();
    let saves = ctx.saves.clone();
    reader.save();
    let mut output = Output::empty();
    let mut count = 0;
    let mut last_failure = None;
    while max.map_or(true, |max| count < max) {
        let before = reader.location();
        let saves_before = ctx.saves.clone();
        match evaluate(inner, reader, ctx) {
            Ok(step) => {
                output.append(step);
                count += 1;
                // A zero-width step would repeat identically until `max`.
                if reader.position() == before.offset {
                    count = count.max(min);
                    break;
                }
            }
            Err(err) if err.is_fatal() => {
                load(reader)?;
                ctx.saves = saves;
                return Err(err);
            }
            Err(err) => {
                // The failed attempt may have moved before giving up.
                rewind(reader, before)?;
                ctx.saves = saves_before;
                last_failure = Some(err);
                break;
            }
        }
    }

    if count < min {
        load(reader)?;
        ctx.saves = saves;
        let underflow = MatchError::new(
            MatchErrorKind::RepetitionUnderflow {
                min,
                matched: count,
            },
            start,
        );
        return Err(match last_failure {
            Some(cause) => underflow.with_cause(cause),
            None => underflow,
        });
    }
    discard_save(reader)?;
    Ok(output)
}

fn evaluate_optional<T>(
    inner: &Matcher,
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    let saves = ctx.saves.clone();
    reader.save();
    match evaluate(inner, reader, ctx) {
        Ok(output) => {
            discard_save(reader)?;
            Ok(output)
        }
        Err(err) => {
            load(reader)?;
            ctx.saves = saves;
            if err.is_fatal() {
                return Err(err);
            }
            Ok(Output::empty())
        }
    }
}

fn evaluate_negated<T>(
    inner: &Matcher,
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    let start = reader.location();
    let saves = ctx.saves.clone();
    let outcome = evaluate(inner, reader, ctx);
    rewind(reader, start)?;
    ctx.saves = saves;
    match outcome {
        Ok(_) => Err(MatchError::new(MatchErrorKind::UnexpectedMatch, start)),
        Err(err) if err.is_fatal() => Err(err),
        Err(_) => Ok(Output::empty()),
    }
}

// ============================================================================
// RULES
// ============================================================================

fn evaluate_rule<T>(
    name: &str,
    inner: &Matcher,
    reader: &mut SourceReader,
    ctx: &mut ExecutionContext<'_, '_, T>,
) -> Step<T> {
    if ctx.depth >= ctx.max_depth {
        return Err(MatchError::new(
            MatchErrorKind::RecursionLimit {
                depth: ctx.max_depth,
            },
            reader.location(),
        ));
    }

    let start = reader.location();
    if ctx.trace_rules {
        trace!(rule = name, at = %start, depth = ctx.depth, "enter rule");
    }

    ctx.depth += 1;
    let outcome = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
        evaluate(inner, reader, ctx)
    });
    ctx.depth -= 1;

    if ctx.trace_rules {
        trace_exit(name, start, reader.location(), &outcome);
    }

    let mut output = outcome?;
    let rules = ctx.rules;
    if let Some(factory) = rules.get(name).and_then(|rule| rule.factory()) {
        let nodes = std::mem::take(&mut output.nodes);
        output.nodes = vec![factory(name, &output.fragments, nodes)];
    }
    Ok(output)
}

fn trace_exit<T>(name: &str, start: SourceLocation, end: SourceLocation, outcome: &Step<T>) {
    match outcome {
        Ok(_) => trace!(rule = name, from = %start, to = %end, "rule matched"),
        Err(err) => trace!(rule = name, at = %start, error = %err, "rule failed"),
    }
}
