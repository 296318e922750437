//! Source text to token stream.
//!
//! Grounded on `original_source/src/token.c`: a hand-written, single-pass
//! lexer over raw bytes (not `str`, since script source may contain
//! arbitrary-byte string escapes), batch-producing the whole token stream
//! ahead of parsing rather than interleaving lex/parse.

use crate::error::CompileError;
use crate::token::{lookup_keyword, Token, TokenKind};

pub struct Lexer<'a> {
    filename: String,
    source: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &str, source: &'a [u8]) -> Self {
        Lexer {
            filename: filename.to_string(),
            source,
            pos: 0,
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::Lex {
            file: self.filename.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let c = self.peek();
        if c == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
        c
    }

    fn strip_whitespace_and_comments(&mut self) {
        loop {
            let c = self.peek();
            if c == 0 && self.pos >= self.source.len() {
                return;
            }
            if c.is_ascii_whitespace() {
                self.advance();
                continue;
            }
            if c == b'/' && self.peek_at(1) == b'/' {
                while self.peek() != b'\n' && self.pos < self.source.len() {
                    self.advance();
                }
                continue;
            }
            return;
        }
    }

    fn next_token(&mut self) -> Result<Token, CompileError> {
        self.strip_whitespace_and_comments();
        let line = self.line;

        if self.pos >= self.source.len() {
            return Ok(Token { kind: TokenKind::Eof, line });
        }

        let c = self.peek();

        if c.is_ascii_digit() {
            return self.parse_number(line);
        }

        if is_identifier_start(c) {
            return self.parse_identifier(line);
        }

        if c == b'\'' || c == b'"' {
            return self.parse_string(line);
        }

        self.advance();
        let kind = match c {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'&' => {
                if self.advance() != b'&' {
                    return Err(self.error("only '&&' is recognized, not a lone '&'"));
                }
                TokenKind::AndAnd
            }
            b'|' => {
                if self.advance() != b'|' {
                    return Err(self.error("only '||' is recognized, not a lone '|'"));
                }
                TokenKind::OrOr
            }
            b'=' => self.optional_equals(TokenKind::Equal, TokenKind::Assign),
            b'!' => self.optional_equals(TokenKind::NotEqual, TokenKind::Not),
            b'<' => self.optional_equals(TokenKind::LessThanOrEqual, TokenKind::LessThan),
            b'>' => self.optional_equals(TokenKind::GreaterThanOrEqual, TokenKind::GreaterThan),
            b'+' => self.optional_equals(TokenKind::AddAssign, TokenKind::Add),
            b'-' => self.optional_equals(TokenKind::SubtractAssign, TokenKind::Subtract),
            b'*' => self.optional_equals(TokenKind::MultiplyAssign, TokenKind::Multiply),
            b'/' => self.optional_equals(TokenKind::DivideAssign, TokenKind::Divide),
            b'%' => self.optional_equals(TokenKind::ModuloAssign, TokenKind::Modulo),
            other => return Err(self.error(format!("unknown token start: '{}'", other as char))),
        };

        Ok(Token { kind, line })
    }

    fn optional_equals(&mut self, if_equal: TokenKind, if_not_equal: TokenKind) -> TokenKind {
        if self.peek() == b'=' {
            self.advance();
            if_equal
        } else {
            if_not_equal
        }
    }

    fn parse_number(&mut self, line: u32) -> Result<Token, CompileError> {
        let mut value: i64 = 0;
        while self.peek().is_ascii_digit() {
            value = value.wrapping_mul(10).wrapping_add((self.advance() - b'0') as i64);
        }
        if is_identifier_continue(self.peek()) {
            return Err(self.error(format!(
                "bad character '{}' after integer literal",
                self.peek() as char
            )));
        }
        Ok(Token { kind: TokenKind::Number(value), line })
    }

    fn parse_identifier(&mut self, line: u32) -> Result<Token, CompileError> {
        let start = self.pos;
        while is_identifier_continue(self.peek()) {
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        let kind = lookup_keyword(&text).unwrap_or(TokenKind::Identifier(text));
        Ok(Token { kind, line })
    }

    fn parse_hex_digit(&mut self) -> Result<u8, CompileError> {
        let c = self.advance();
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(self.error(format!("unknown hex digit '{}'", c as char))),
        }
    }

    fn parse_escape(&mut self) -> Result<u8, CompileError> {
        let c = self.advance();
        Ok(match c {
            b'\'' | b'\"' | b'\\' => c,
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'f' => 0x0c,
            b'0' => 0,
            b'x' => {
                let upper = self.parse_hex_digit()?;
                let lower = self.parse_hex_digit()?;
                (upper << 4) | lower
            }
            other => return Err(self.error(format!("unknown escape character '{}'", other as char))),
        })
    }

    fn parse_string(&mut self, starting_line: u32) -> Result<Token, CompileError> {
        let quote = self.advance();
        let mut bytes = Vec::new();
        loop {
            if self.pos >= self.source.len() {
                return Err(CompileError::Lex {
                    file: self.filename.clone(),
                    line: starting_line,
                    message: format!("unterminated quote encountered starting on line {}", starting_line),
                });
            }
            let c = self.advance();
            if c == quote {
                break;
            }
            if c == b'\\' {
                bytes.push(self.parse_escape()?);
            } else {
                bytes.push(c);
            }
        }
        Ok(Token { kind: TokenKind::StringLiteral(bytes), line: starting_line })
    }
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new("<test>", src.as_bytes())
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_punctuation() {
        assert_eq!(
            kinds("function main() { return 2 + 3; }"),
            vec![
                TokenKind::Function,
                TokenKind::Identifier("main".to_string()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Number(2),
                TokenKind::Add,
                TokenKind::Number(3),
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_compound_operators() {
        assert_eq!(
            kinds("a += 1; b == c; d != e"),
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::AddAssign,
                TokenKind::Number(1),
                TokenKind::Semicolon,
                TokenKind::Identifier("b".to_string()),
                TokenKind::Equal,
                TokenKind::Identifier("c".to_string()),
                TokenKind::Semicolon,
                TokenKind::Identifier("d".to_string()),
                TokenKind::NotEqual,
                TokenKind::Identifier("e".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decodes_escapes_including_hex() {
        let tokens = Lexer::new("<test>", br#""a\nb\x41""#).tokenize().unwrap();
        match &tokens[0].kind {
            TokenKind::StringLiteral(bytes) => assert_eq!(bytes, b"a\nbA"),
            other => panic!("expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn strips_line_comments() {
        assert_eq!(kinds("1 // two\n+ 3"), vec![TokenKind::Number(1), TokenKind::Add, TokenKind::Number(3), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_is_lex_error() {
        assert!(Lexer::new("<test>", b"\"abc").tokenize().is_err());
    }

    #[test]
    fn bad_character_after_integer_errors() {
        assert!(Lexer::new("<test>", b"123abc").tokenize().is_err());
    }
}
