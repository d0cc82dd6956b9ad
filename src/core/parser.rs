use crate::core::ast::{Ast, CharRange, Repeat};
use crate::core::lexer::{Tok, Token};
use crate::errors::{PatternError, PatternErrorKind};

/// Turns a token stream into a syntax tree.
///
/// The grammar is the usual one for basic regular expressions: alternation
/// outermost, then concatenation, then postfix repetition, with groups and
/// character classes at the bottom. A stream with no tokens at all denotes
/// the empty match.
///
/// # Errors
///
/// Returns a [`PatternError`] naming the offending construct and offset.
pub fn parse(tokens: &[Token]) -> Result<Ast, PatternError> {
    let mut cur = Cursor::new(tokens);
    if cur.peek().is_none() {
        return Ok(Ast::Empty);
    }

    let ast = alternation(&mut cur)?;
    match cur.bump() {
        None => Ok(ast),
        Some(leftover) => Err(PatternError::new(
            leftover.at,
            PatternErrorKind::Unexpected {
                found: leftover.kind.to_string(),
            },
        )),
    }
}

/// alternation := sequence ('|' sequence)*
fn alternation(cur: &mut Cursor) -> Result<Ast, PatternError> {
    let mut branches = vec![sequence(cur)?];
    while cur.eat(Tok::Alt) {
        branches.push(sequence(cur)?);
    }
    Ok(Ast::branch(branches))
}

/// sequence := term+
fn sequence(cur: &mut Cursor) -> Result<Ast, PatternError> {
    let mut parts = Vec::new();
    while starts_term(cur.peek()) {
        parts.push(term(cur)?);
    }

    if parts.is_empty() {
        return match cur.peek() {
            Some(Tok::Star | Tok::Plus | Tok::Opt) => cur.err(PatternErrorKind::StrayOperator),
            _ => cur.err(PatternErrorKind::EmptyBranch),
        };
    }
    Ok(Ast::seq(parts))
}

/// term := primary ('*' | '+' | '?')*
fn term(cur: &mut Cursor) -> Result<Ast, PatternError> {
    let mut node = primary(cur)?;
    loop {
        let kind = match cur.peek() {
            Some(Tok::Star) => Repeat::ZeroOrMore,
            Some(Tok::Plus) => Repeat::OneOrMore,
            Some(Tok::Opt) => Repeat::ZeroOrOne,
            _ => break,
        };
        cur.bump();
        node = Ast::repeat(node, kind);
    }
    Ok(node)
}

fn starts_term(tok: Option<Tok>) -> bool {
    matches!(
        tok,
        Some(Tok::Lit(_) | Tok::Range | Tok::Wild | Tok::GroupOpen | Tok::ClassOpen)
    )
}

/// primary := literal | '-' | '.' | '(' alternation ')' | class
fn primary(cur: &mut Cursor) -> Result<Ast, PatternError> {
    let Some(token) = cur.bump() else {
        return cur.err(PatternErrorKind::EmptyBranch);
    };
    match token.kind {
        Tok::Lit(c) => Ok(Ast::Lit(c)),
        // A dash with no class around it is nothing special.
        Tok::Range => Ok(Ast::Lit('-')),
        Tok::Wild => Ok(Ast::Any),
        Tok::GroupOpen => {
            let inner = alternation(cur)?;
            if cur.eat(Tok::GroupClose) {
                Ok(inner)
            } else {
                Err(PatternError::new(token.at, PatternErrorKind::UnclosedGroup))
            }
        }
        Tok::ClassOpen => class_body(cur, token.at),
        other => Err(PatternError::new(
            token.at,
            PatternErrorKind::Unexpected {
                found: other.to_string(),
            },
        )),
    }
}

/// Reads class members up to the closing bracket.
///
/// Between brackets the operator tokens lose their meaning and stand for
/// their source characters, so `[a*]` matches `a` or `*`. Errors about the
/// class as a whole blame `open_at`, the offset of the `[`.
fn class_body(cur: &mut Cursor, open_at: usize) -> Result<Ast, PatternError> {
    let mut ranges: Vec<CharRange> = Vec::new();

    loop {
        let Some(token) = cur.bump() else {
            return Err(PatternError::new(open_at, PatternErrorKind::UnclosedClass));
        };
        match token.kind {
            Tok::ClassClose => break,
            Tok::Range => ranges.push(('-', '-')),
            kind => ranges.push(class_item(cur, kind.literal())?),
        }
    }

    if ranges.is_empty() {
        return Err(PatternError::new(open_at, PatternErrorKind::EmptyClass));
    }
    Ok(Ast::Class(ranges))
}

/// Extends a class character into a `lo-hi` range when a dash and another
/// class character follow; a dash right before the closing bracket stays a
/// literal and is picked up by the caller's next iteration.
fn class_item(cur: &mut Cursor, lo: char) -> Result<CharRange, PatternError> {
    let range_follows = cur.peek() == Some(Tok::Range)
        && !matches!(cur.peek_second(), Some(Tok::ClassClose) | None);
    if !range_follows {
        return Ok((lo, lo));
    }

    cur.bump();
    if let Some(hi_token) = cur.bump() {
        let hi = hi_token.kind.literal();
        if lo > hi {
            return Err(PatternError::new(
                hi_token.at,
                PatternErrorKind::ReversedRange { lo, hi },
            ));
        }
        return Ok((lo, hi));
    }
    Ok((lo, lo))
}

/// Read head over the token stream.
struct Cursor<'a> {
    tokens: &'a [Token],
    at: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, at: 0 }
    }

    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.at).map(|t| t.kind)
    }

    fn peek_second(&self) -> Option<Tok> {
        self.tokens.get(self.at + 1).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.at).copied();
        if token.is_some() {
            self.at += 1;
        }
        token
    }

    fn eat(&mut self, kind: Tok) -> bool {
        if self.peek() == Some(kind) {
            self.at += 1;
            true
        } else {
            false
        }
    }

    /// Offset to blame in an error raised here: the upcoming token, or one
    /// past the final token when the stream has run dry.
    fn here(&self) -> usize {
        match self.tokens.get(self.at) {
            Some(token) => token.at,
            None => self.tokens.last().map_or(0, |t| t.at + 1),
        }
    }

    fn err<T>(&self, kind: PatternErrorKind) -> Result<T, PatternError> {
        Err(PatternError::new(self.here(), kind))
    }
}
