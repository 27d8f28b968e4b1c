use super::{ParseResult, Parser};
use crate::ast::Pattern;
use crate::intern::Symbol;
use crate::token::TokenKind;

/// Switch-case patterns. Alternatives are tried in order: object,
/// array, rest, number, string, variable/underscore.
pub trait PatternParsing {
    fn parse_pattern(&mut self) -> ParseResult<Option<Pattern>>;
}

impl<'a, 'int> PatternParsing for Parser<'a, 'int> {
    fn parse_pattern(&mut self) -> ParseResult<Option<Pattern>> {
        if let Some(pattern) = self.try_parse(parse_object_pattern)? {
            return Ok(Some(pattern));
        }
        if let Some(pattern) = self.try_parse(parse_array_pattern)? {
            return Ok(Some(pattern));
        }
        if let Some(pattern) = self.try_parse(parse_rest_pattern)? {
            return Ok(Some(pattern));
        }
        if let Some(value) = self.eat_numeric() {
            return Ok(Some(Pattern::Number(value)));
        }
        if let Some(sym) = self.eat_str() {
            return Ok(Some(Pattern::Str(sym)));
        }
        if let Some(name) = self.eat_ident() {
            let pattern = if self.is_hole(name) {
                Pattern::Underscore
            } else {
                Pattern::Variable(name)
            };
            return Ok(Some(pattern));
        }
        Ok(None)
    }
}

/// `..`
fn parse_rest_pattern<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<Pattern>> {
    if !p.eat(&TokenKind::Dot) {
        return Ok(None);
    }
    if !p.eat(&TokenKind::Dot) {
        return Ok(None);
    }
    Ok(Some(Pattern::Rest))
}

/// `[pattern, pattern, ..]`
fn parse_array_pattern<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<Pattern>> {
    if !p.eat(&TokenKind::OpenSquare) {
        return Ok(None);
    }
    let mut patterns = Vec::new();
    if !p.check(&TokenKind::CloseSquare) {
        loop {
            let pattern = match p.parse_pattern()? {
                Some(pattern) => pattern,
                None => return Ok(None),
            };
            patterns.push(pattern);
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
    }
    if !p.eat(&TokenKind::CloseSquare) {
        return Ok(None);
    }
    Ok(Some(Pattern::Array(patterns)))
}

/// `{ key: pattern, .., key: pattern }`; a `..` entry matches any
/// remaining fields.
fn parse_object_pattern<'a, 'int>(p: &mut Parser<'a, 'int>) -> ParseResult<Option<Pattern>> {
    if !p.eat(&TokenKind::OpenCurly) {
        return Ok(None);
    }
    let mut pairs: Vec<(Symbol, Pattern)> = Vec::new();
    if !p.check(&TokenKind::CloseCurly) {
        loop {
            if let Some(rest) = p.try_parse(parse_rest_pattern)? {
                // The key carries no name for a rest entry.
                let hole = p.interner.intern("_");
                pairs.push((hole, rest));
            } else {
                let key = match p.eat_ident() {
                    Some(key) => key,
                    None => return Ok(None),
                };
                if !p.eat(&TokenKind::Colon) {
                    return Ok(None);
                }
                let pattern = match p.parse_pattern()? {
                    Some(pattern) => pattern,
                    None => return Ok(None),
                };
                pairs.push((key, pattern));
            }
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
    }
    if !p.eat(&TokenKind::CloseCurly) {
        return Ok(None);
    }
    Ok(Some(Pattern::Object(pairs)))
}
