//! Lexical analyzer for BUILD files.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! Whitespace, comments and newlines are kept as tokens; deciding which
//! newlines end a statement is left to the parser, which tracks bracket depth.
//!
//! The public entry point is [`tokenize`]. Lexing stops at the first invalid
//! character or unterminated string.

use winnow::{
    Parser as _,
    combinator::{alt, opt},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, one_of, take_while},
};

use buildfmt_core::{LineIndex, Span, StringKind};

use crate::{
    error::{Diagnostic, ErrorCode},
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors to provide error codes, help text and the
/// start of the offending construct.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Build a cut error carrying `diagnostic`.
fn lex_error(
    input: &Input<'_>,
    diagnostic: LexerDiagnostic,
) -> ErrMode<ContextError<LexerDiagnostic>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), diagnostic))
}

fn unterminated(
    input: &Input<'_>,
    start: usize,
    quote: char,
    triple: bool,
) -> ErrMode<ContextError<LexerDiagnostic>> {
    let help = match (quote, triple) {
        ('"', false) => "add closing `\"` before the end of the line",
        ('"', true) => "add closing `\"\"\"`",
        (_, false) => "add closing `'` before the end of the line",
        (_, true) => "add closing `'''`",
    };
    lex_error(
        input,
        LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some(help),
            start,
        },
    )
}

/// Parse exactly `digits` hex digits of a `\x`, `\u` or `\U` escape.
fn hex_escape(input: &mut Input<'_>, digits: usize, escape_start: usize) -> IResult<char> {
    let invalid = |input: &Input<'_>| {
        lex_error(
            input,
            LexerDiagnostic {
                code: ErrorCode::E004,
                message: "invalid escape sequence",
                help: Some("use `\\xXX`, `\\uXXXX` or `\\UXXXXXXXX` with a valid code point"),
                start: escape_start,
            },
        )
    };

    let hex = take_while(digits..=digits, |c: char| c.is_ascii_hexdigit())
        .parse_next(input)
        .map_err(|_: ErrMode<ContextError<LexerDiagnostic>>| invalid(input))?;
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| invalid(input))
}

/// Parse up to two more octal digits after `first`.
fn octal_escape(input: &mut Input<'_>, first: char) -> char {
    let mut code = first.to_digit(8).unwrap_or_default();
    for _ in 0..2 {
        match input.peek_finish().chars().next().and_then(|c| c.to_digit(8)) {
            Some(digit) => {
                code = code * 8 + digit;
                input.next_token();
            }
            None => break,
        }
    }
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Decode one escape sequence; the backslash is already consumed.
fn string_escape(
    input: &mut Input<'_>,
    value: &mut String,
    escape_start: usize,
    quote: char,
    triple: bool,
) -> IResult<()> {
    let Some(c) = input.next_token() else {
        return Err(unterminated(input, escape_start, quote, triple));
    };
    match c {
        // Escaped newline joins the lines
        '\n' => {}
        '\r' if input.peek_finish().starts_with('\n') => {
            input.next_token();
        }
        'n' => value.push('\n'),
        't' => value.push('\t'),
        'r' => value.push('\r'),
        'a' => value.push('\u{07}'),
        'b' => value.push('\u{08}'),
        'f' => value.push('\u{0C}'),
        'v' => value.push('\u{0B}'),
        '\\' | '\'' | '"' => value.push(c),
        '0'..='7' => value.push(octal_escape(input, c)),
        'x' => value.push(hex_escape(input, 2, escape_start)?),
        'u' => value.push(hex_escape(input, 4, escape_start)?),
        'U' => value.push(hex_escape(input, 8, escape_start)?),
        // Unknown escapes keep their backslash
        other => {
            value.push('\\');
            value.push(other);
        }
    }
    Ok(())
}

/// Parse the optional `r` prefix and the opening quote.
fn string_prefix(input: &mut Input<'_>) -> IResult<(bool, char)> {
    (opt('r'), one_of(['"', '\'']))
        .map(|(raw, quote)| (raw.is_some(), quote))
        .parse_next(input)
}

/// Parse a string literal in any of its forms.
///
/// - Quotes: `"..."` or `'...'`
/// - Triple quotes: `"""..."""` or `'''...'''`, which may span lines
/// - Raw prefix: `r"..."`, where backslashes are kept verbatim
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();

    let (raw, quote) = string_prefix(input)?;

    // Past the opening quote every failure is a real error
    let pair = if quote == '"' { "\"\"" } else { "''" };
    let triple = input.peek_finish().starts_with(pair);
    if triple {
        input.next_slice(pair.len());
    }

    let mut value = String::new();
    loop {
        let Some(c) = input.peek_finish().chars().next() else {
            return Err(unterminated(input, start, quote, triple));
        };
        if c == '\n' && !triple {
            return Err(unterminated(input, start, quote, triple));
        }
        input.next_token();

        if c == quote {
            if !triple {
                break;
            }
            if input.peek_finish().starts_with(pair) {
                input.next_slice(pair.len());
                break;
            }
            value.push(c);
        } else if c != '\\' {
            value.push(c);
        } else if raw {
            // The escaped character is kept and cannot close the string
            value.push('\\');
            match input.next_token() {
                Some(next) => value.push(next),
                None => return Err(unterminated(input, start, quote, triple)),
            }
        } else {
            let escape_start = input.current_token_start() - 1;
            string_escape(input, &mut value, escape_start, quote, triple)?;
        }
    }

    let kind = match (raw, triple) {
        (false, false) => StringKind::Plain,
        (true, false) => StringKind::Raw,
        (false, true) => StringKind::Triple,
        (true, true) => StringKind::RawTriple,
    };
    Ok(Token::String { value, kind, quote })
}

/// Parse identifiers and keywords
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(|word: &str| match word {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "in" => Token::In,
            "if" => Token::If,
            "else" => Token::Else,
            "for" => Token::For,
            _ => Token::Identifier(word),
        })
        .parse_next(input)
}

fn digits<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

fn exponent<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    (one_of(['e', 'E']), opt(one_of(['+', '-'])), digits)
        .take()
        .parse_next(input)
}

/// Parse integer and float literals
///
/// - Integers: `42`, `0x2A`, `0o52`
/// - Floats: `1.5`, `1.`, `.5`, `1e3`, `2.5e-3`
fn number<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        (
            '0',
            one_of(['x', 'X']),
            take_while(1.., |c: char| c.is_ascii_hexdigit()),
        )
            .take()
            .map(Token::Int),
        ('0', one_of(['o', 'O']), take_while(1.., '0'..='7'))
            .take()
            .map(Token::Int),
        alt((
            (digits, opt(('.', opt(digits))), opt(exponent)).take(),
            ('.', digits, opt(exponent)).take(),
        ))
        .map(|text: &str| {
            if text.contains(['.', 'e', 'E']) {
                Token::Float(text)
            } else {
                Token::Int(text)
            }
        }),
    ))
    .parse_next(input)
}

/// Parse line comment starting with '#'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    ('#', take_while(0.., |c: char| c != '\n'))
        .take()
        .map(Token::Comment)
        .parse_next(input)
}

/// Parse multi-character operators (longest first)
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("//=").value(Token::SlashSlashEquals),
        literal("**").value(Token::StarStar),
        literal("//").value(Token::SlashSlash),
        literal("==").value(Token::EqualsEquals),
        literal("!=").value(Token::NotEquals),
        literal("<=").value(Token::LessEquals),
        literal(">=").value(Token::GreaterEquals),
        literal("+=").value(Token::PlusEquals),
        literal("-=").value(Token::MinusEquals),
        literal("*=").value(Token::StarEquals),
        literal("/=").value(Token::SlashEquals),
        literal("%=").value(Token::PercentEquals),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        alt((
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            '{'.value(Token::LeftBrace),
            '}'.value(Token::RightBrace),
            ','.value(Token::Comma),
            ':'.value(Token::Colon),
            ';'.value(Token::Semicolon),
            '.'.value(Token::Dot),
        )),
        alt((
            '='.value(Token::Equals),
            '<'.value(Token::Less),
            '>'.value(Token::Greater),
            '+'.value(Token::Plus),
            '-'.value(Token::Minus),
            '*'.value(Token::Star),
            '/'.value(Token::Slash),
            '%'.value(Token::Percent),
            '|'.value(Token::Pipe),
            '~'.value(Token::Tilde),
        )),
    ))
    .parse_next(input)
}

/// Parse whitespace (not newlines) and backslash line continuations
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        take_while(1.., |c: char| matches!(c, ' ' | '\t' | '\r' | '\u{0C}')).void(),
        ('\\', opt('\r'), '\n').void(),
    ))
    .value(Token::Whitespace)
    .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token
fn token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        line_comment,
        string_literal,      // Must come before identifier (`r"..."`)
        identifier,          // Also produces keywords
        number,              // Must come before `.`
        newline,             // Must come before whitespace
        whitespace,          // Includes `\` continuations
        multi_char_operator, // Must come before single char operators
        single_char_token,
    ))
    .parse_next(input)
}

/// Convert an ErrMode to a Diagnostic.
///
/// Uses the `LexerDiagnostic` context when present. Errors without context
/// mean no token matched at `token_start`, which is reported as E002.
fn convert_err_mode(
    err: ErrMode<ContextError<LexerDiagnostic>>,
    token_start: usize,
    error_pos: usize,
    source: &str,
    index: &LineIndex<'_>,
) -> Diagnostic {
    let context_error = match err {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    if let Some(LexerDiagnostic {
        code,
        message,
        help,
        start,
    }) = context_error.context().next()
    {
        let span = index.span(*start..error_pos.max(*start));
        let mut diag = Diagnostic::error(*message)
            .with_code(*code)
            .with_label(span, code.description());
        if let Some(h) = help {
            diag = diag.with_help(*h);
        }
        return diag;
    }

    let found = source[token_start..].chars().next();
    let width = found.map_or(0, char::len_utf8);
    let span = index.span(token_start..token_start + width);
    let message = match found {
        Some(c) => format!("unexpected character `{}`", c.escape_debug()),
        None => "unexpected end of input".to_string(),
    };
    Diagnostic::error(message)
        .with_code(ErrorCode::E002)
        .with_label(span, ErrorCode::E002.description())
}

/// Split source text into tokens.
///
/// The returned sequence always ends with [`Token::Eof`].
///
/// # Errors
///
/// Returns a diagnostic for the first unterminated string, invalid escape
/// or unexpected character.
pub fn tokenize(source: &str) -> Result<Vec<PositionedToken<'_>>, Diagnostic> {
    let index = LineIndex::new(source);
    let mut input = LocatingSlice::new(source);
    let mut tokens = Vec::new();

    while input.eof_offset() > 0 {
        let start = input.current_token_start();
        match token(&mut input) {
            Ok(token) => {
                let end = input.current_token_start();
                tokens.push(PositionedToken::new(token, index.span(start..end)));
            }
            Err(err) => {
                let error_pos = input.current_token_start();
                return Err(convert_err_mode(err, start, error_pos, source, &index));
            }
        }
    }

    tokens.push(PositionedToken::new(Token::Eof, Span::point(index.end())));
    Ok(tokens)
}
