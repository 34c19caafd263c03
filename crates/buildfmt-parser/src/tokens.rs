//! Token types produced by the [`lexer`](super::lexer).

use std::fmt;

use buildfmt_core::{Span, StringKind};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    // Keywords
    And,
    Or,
    Not,
    In,
    If,
    Else,
    For,

    Identifier(&'a str),
    /// A string literal with its decoded value.
    String {
        value: String,
        kind: StringKind,
        quote: char,
    },
    Int(&'a str),
    Float(&'a str),

    // Brackets and separators
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,

    // Assignment operators
    Equals,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    SlashSlashEquals,
    PercentEquals,

    // Comparison operators
    EqualsEquals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Pipe,
    Tilde,

    /// `# ...` up to, not including, the newline.
    Comment(&'a str),
    Newline,
    /// Spaces, tabs and backslash line continuations.
    Whitespace,
    Eof,
}

impl Token<'_> {
    /// Returns `true` for tokens that open a bracketed region.
    pub fn is_open_bracket(&self) -> bool {
        matches!(self, Token::LeftParen | Token::LeftBracket | Token::LeftBrace)
    }

    /// Returns `true` for tokens that close a bracketed region.
    pub fn is_close_bracket(&self) -> bool {
        matches!(
            self,
            Token::RightParen | Token::RightBracket | Token::RightBrace
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::And => "`and`",
            Token::Or => "`or`",
            Token::Not => "`not`",
            Token::In => "`in`",
            Token::If => "`if`",
            Token::Else => "`else`",
            Token::For => "`for`",
            Token::Identifier(name) => return write!(f, "identifier `{name}`"),
            Token::String { .. } => "string",
            Token::Int(_) | Token::Float(_) => "number",
            Token::LeftParen => "`(`",
            Token::RightParen => "`)`",
            Token::LeftBracket => "`[`",
            Token::RightBracket => "`]`",
            Token::LeftBrace => "`{`",
            Token::RightBrace => "`}`",
            Token::Comma => "`,`",
            Token::Colon => "`:`",
            Token::Semicolon => "`;`",
            Token::Dot => "`.`",
            Token::Equals => "`=`",
            Token::PlusEquals => "`+=`",
            Token::MinusEquals => "`-=`",
            Token::StarEquals => "`*=`",
            Token::SlashEquals => "`/=`",
            Token::SlashSlashEquals => "`//=`",
            Token::PercentEquals => "`%=`",
            Token::EqualsEquals => "`==`",
            Token::NotEquals => "`!=`",
            Token::Less => "`<`",
            Token::LessEquals => "`<=`",
            Token::Greater => "`>`",
            Token::GreaterEquals => "`>=`",
            Token::Plus => "`+`",
            Token::Minus => "`-`",
            Token::Star => "`*`",
            Token::StarStar => "`**`",
            Token::Slash => "`/`",
            Token::SlashSlash => "`//`",
            Token::Percent => "`%`",
            Token::Pipe => "`|`",
            Token::Tilde => "`~`",
            Token::Comment(_) => "comment",
            Token::Newline => "newline",
            Token::Whitespace => "whitespace",
            Token::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// A token together with the source range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'a> {
    pub token: Token<'a>,
    pub span: Span,
}

impl<'a> PositionedToken<'a> {
    pub fn new(token: Token<'a>, span: Span) -> Self {
        Self { token, span }
    }
}
