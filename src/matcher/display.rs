use std::fmt::{self, Display, Write};

use crate::matcher::Matcher;

// Binding strength, loosest first.
const ALTERNATION: u8 = 0;
const SEQUENCE: u8 = 1;
const UNARY: u8 = 2;

impl Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_matcher(f, self, ALTERNATION)
    }
}

fn precedence(m: &Matcher) -> u8 {
    match m {
        Matcher::Alternation(children) if children.len() > 1 => ALTERNATION,
        Matcher::Sequence(children) if children.len() > 1 => SEQUENCE,
        _ => UNARY,
    }
}

fn write_matcher(f: &mut fmt::Formatter<'_>, m: &Matcher, context: u8) -> fmt::Result {
    if precedence(m) < context {
        f.write_char('(')?;
        write_bare(f, m)?;
        return f.write_char(')');
    }
    write_bare(f, m)
}

fn write_bare(f: &mut fmt::Formatter<'_>, m: &Matcher) -> fmt::Result {
    match m {
        Matcher::Literal(ch) => {
            f.write_char('\'')?;
            write_escaped(f, *ch, '\'')?;
            f.write_char('\'')
        }
        Matcher::LiteralString(text) => {
            f.write_char('\'')?;
            for ch in text.chars() {
                write_escaped(f, ch, '\'')?;
            }
            f.write_char('\'')
        }
        Matcher::Range(lo, hi) => {
            f.write_char('[')?;
            write_escaped(f, *lo, ']')?;
            f.write_char('-')?;
            write_escaped(f, *hi, ']')?;
            f.write_char(']')
        }
        Matcher::Set(chars) => {
            f.write_char('[')?;
            for ch in chars {
                write_escaped(f, *ch, ']')?;
            }
            f.write_char(']')
        }
        Matcher::Predicate(p) => write!(f, "<{}>", p.name()),
        Matcher::EndOfInput => f.write_str("$"),
        Matcher::Sequence(children) => {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_char(' ')?;
                }
                write_matcher(f, child, UNARY)?;
            }
            Ok(())
        }
        Matcher::Alternation(children) => {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write_matcher(f, child, SEQUENCE)?;
            }
            Ok(())
        }
        Matcher::Repetition { inner, min, max } => {
            write_matcher(f, inner, UNARY)?;
            match (min, max) {
                (0, None) => f.write_char('*'),
                (1, None) => f.write_char('+'),
                (min, None) => write!(f, "{{{min},}}"),
                (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
                (min, Some(max)) => write!(f, "{{{min},{max}}}"),
            }
        }
        Matcher::Optional(inner) => {
            write_matcher(f, inner, UNARY)?;
            f.write_char('?')
        }
        Matcher::Negated(inner) => {
            f.write_char('!')?;
            write_matcher(f, inner, UNARY)
        }
        Matcher::RuleRef(name) => f.write_str(name),
        Matcher::RuleWrapper { name, inner } => write!(f, "{name}:({inner})"),
        Matcher::Ignore(inner) => write!(f, "ignore({inner})"),
        Matcher::Join(inner) => write!(f, "join({inner})"),
        Matcher::Marker(inner) => write!(f, "mark({inner})"),
        Matcher::Saving { name, inner } => write!(f, "save:{name}({inner})"),
        Matcher::Loading(name) => write!(f, "load:{name}"),
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, ch: char, delimiter: char) -> fmt::Result {
    match ch {
        '\n' => f.write_str("\\n"),
        '\r' => f.write_str("\\r"),
        '\t' => f.write_str("\\t"),
        '\\' => f.write_str("\\\\"),
        ch if ch == delimiter => {
            f.write_char('\\')?;
            f.write_char(ch)
        }
        ch => f.write_char(ch),
    }
}

#[cfg(test)]
mod tests {
    use crate::matcher::Matcher;

    #[test]
    fn prints_grammar_expressions() {
        let digit = Matcher::range('0', '9').unwrap();
        let sign = Matcher::optional(Matcher::set(['+', '-']).unwrap());
        let number = Matcher::sequence([sign, Matcher::many1(digit)]).unwrap();
        assert_eq!(number.to_string(), "[+-]? [0-9]+");

        let choice =
            Matcher::alternation([Matcher::literal('a'), Matcher::rule("word")]).unwrap();
        let seq = Matcher::sequence([choice, Matcher::literal_str("it's").unwrap()]).unwrap();
        assert_eq!(seq.to_string(), "('a' | word) 'it\\'s'");
    }

    #[test]
    fn prints_bounded_repetition() {
        let rep = Matcher::repeat(Matcher::rule("name"), 2, Some(4)).unwrap();
        assert_eq!(rep.to_string(), "name{2,4}");
        let exact = Matcher::repeat(Matcher::literal('x'), 3, Some(3)).unwrap();
        assert_eq!(exact.to_string(), "'x'{3}");
    }
}
