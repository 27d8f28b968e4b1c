use crate::intern::Interner;
use crate::token::{Position, Token, TokenKind};

fn is_special(byte: u8) -> bool {
    matches!(
        byte,
        b':' | b';'
            | b'('
            | b')'
            | b'-'
            | b'>'
            | b'<'
            | b'{'
            | b'}'
            | b'['
            | b']'
            | b'='
            | b'!'
            | b'%'
            | b'/'
            | b','
            | b'|'
            | b'\''
            | b'"'
            | b'*'
            | b'+'
            | b'&'
            | b'#'
            | b'.'
            | b'?'
    )
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\n' | b'\t' | b'\r')
}

/// Byte-level lexer. Identifiers are maximal runs of non-special,
/// non-whitespace bytes, reclassified afterwards as numerics (the whole
/// run parses as a decimal number) or keywords. A malformed character
/// literal ends the token stream; lexing itself is never fatal.
pub struct Lexer<'s, 'int> {
    bytes: &'s [u8],
    pos: usize,
    row: u32,
    col: u32,
    interner: &'int mut Interner,
}

impl<'s, 'int> Lexer<'s, 'int> {
    pub fn new(source: &'s str, interner: &'int mut Interner) -> Self {
        Lexer {
            bytes: source.as_bytes(),
            pos: 0,
            row: 1,
            col: 1,
            interner,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        if byte == b'\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(byte)
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let start = Position::new(self.row, self.col, 1);
            let byte = self.bump()?;

            let simple = match byte {
                b':' => Some(TokenKind::Colon),
                b';' => Some(TokenKind::Semicolon),
                b'#' => Some(TokenKind::Hash),
                b'(' => Some(TokenKind::OpenRound),
                b')' => Some(TokenKind::CloseRound),
                b'{' => Some(TokenKind::OpenCurly),
                b'}' => Some(TokenKind::CloseCurly),
                b'[' => Some(TokenKind::OpenSquare),
                b']' => Some(TokenKind::CloseSquare),
                b'=' => Some(TokenKind::Eq),
                b'!' => Some(TokenKind::Bang),
                b'%' => Some(TokenKind::Mod),
                b'/' => Some(TokenKind::Div),
                b',' => Some(TokenKind::Comma),
                b'|' => Some(TokenKind::Pipe),
                b'>' => Some(TokenKind::RightArrow),
                b'<' => Some(TokenKind::LeftArrow),
                b'*' => Some(TokenKind::Star),
                b'&' => Some(TokenKind::And),
                b'.' => Some(TokenKind::Dot),
                b'?' => Some(TokenKind::Question),
                b'+' => Some(TokenKind::Plus),
                _ => None,
            };
            if let Some(kind) = simple {
                return Some(Token::new(kind, start));
            }

            match byte {
                b'-' => {
                    if self.peek_byte() == Some(b'>') {
                        self.bump();
                        return Some(Token::new(
                            TokenKind::RightArrow,
                            Position::new(start.row, start.col, 2),
                        ));
                    }
                    return Some(Token::new(TokenKind::Minus, start));
                }
                b'\'' => {
                    let value = self.bump()?;
                    if self.bump()? != b'\'' {
                        return None;
                    }
                    return Some(Token::new(
                        TokenKind::CharLit(value),
                        Position::new(start.row, start.col, 3),
                    ));
                }
                b'"' => {
                    let content_start = self.pos;
                    while let Some(b) = self.peek_byte() {
                        if b == b'"' {
                            break;
                        }
                        self.bump();
                    }
                    let content =
                        String::from_utf8_lossy(&self.bytes[content_start..self.pos]).into_owned();
                    self.bump(); // closing quote, if any
                    let sym = self.interner.intern(&content);
                    return Some(Token::new(
                        TokenKind::StrLit(sym),
                        Position::new(start.row, start.col, content.len() as u32 + 2),
                    ));
                }
                _ if is_whitespace(byte) => continue,
                _ => {
                    let ident_start = self.pos - 1;
                    while let Some(b) = self.peek_byte() {
                        if is_special(b) || is_whitespace(b) {
                            break;
                        }
                        self.bump();
                    }
                    let text = String::from_utf8_lossy(&self.bytes[ident_start..self.pos]);
                    let len = (self.pos - ident_start) as u32;
                    let pos = Position::new(start.row, start.col, len);

                    if let Some(keyword) = TokenKind::keyword(&text) {
                        return Some(Token::new(keyword, pos));
                    }
                    if let Ok(numeric) = text.parse::<f64>() {
                        return Some(Token::new(TokenKind::Numeric(numeric), pos));
                    }
                    let sym = self.interner.intern(&text);
                    return Some(Token::new(TokenKind::Ident(sym), pos));
                }
            }
        }
    }
}
