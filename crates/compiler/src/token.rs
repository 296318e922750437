//! Token kinds produced by the lexer.
//!
//! Grounded on `original_source/src/token.c`/`token.h`'s keyword set and
//! punctuation, with the original's thematic surface spellings
//! (`mission`/`hedgehog`/`dr_eggman`/...) replaced by the plain keywords
//! the GLOSSARY describes them as mapping to.

use fen_core::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(i64),
    StringLiteral(Vec<u8>),
    True,
    False,
    Null,
    Identifier(String),

    Import,
    Global,
    Function,
    Local,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Return,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,

    AndAnd,
    OrOr,
    Not,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

impl TokenKind {
    /// The constant `Value` a literal token kind carries, if any. Used by
    /// the parser to build `Expr::Literal` nodes without re-matching on
    /// every call site.
    pub fn literal_value(&self) -> Option<Value> {
        match self {
            TokenKind::Number(n) => Some(Value::Number(*n)),
            TokenKind::True => Some(Value::Boolean(true)),
            TokenKind::False => Some(Value::Boolean(false)),
            TokenKind::Null => Some(Value::Null),
            TokenKind::StringLiteral(bytes) => {
                Some(Value::String(fen_core::ScriptString::new(bytes.clone())))
            }
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

pub fn lookup_keyword(identifier: &str) -> Option<TokenKind> {
    Some(match identifier {
        "import" => TokenKind::Import,
        "global" => TokenKind::Global,
        "function" => TokenKind::Function,
        "local" => TokenKind::Local,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => return None,
    })
}
