//! Parser for BUILD file tokens.
//!
//! This module turns the token stream from the [`lexer`](super::lexer) into a
//! [`File`]. It is a recursive-descent parser with one function per
//! precedence level, driven by a cursor over the token vector.
//!
//! Newlines end statements only outside brackets. Inside brackets the cursor
//! skips them, and comments it skips are parked in a pending buffer that the
//! enclosing item or statement collects into its `after` trivia, so no comment
//! is ever dropped. Sequence items (list elements, call arguments, dict
//! entries, tuple elements) pick up their own leading comments, blank lines
//! and same-line suffix comments before the generic lookahead can see them.

use indexmap::IndexMap;
use log::{debug, trace};

use buildfmt_core::{
    AssignOp, BinaryOp, Call, Clause, Comment, Comprehension, Dict, DictEntry, Expr, ExprKind,
    File, List, Literal, Position, Span, Stmt, StmtKind, StringLit, Trivia, UnaryOp,
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    tokens::{PositionedToken, Token},
};

/// Deepest expression nesting accepted. Brackets, conditionals and prefix
/// operators each count one level.
const MAX_DEPTH: usize = 64;

/// Most binary operators and postfix operations in one statement. Each of
/// them wraps the expression built so far one level deeper.
const MAX_CHAIN: usize = 512;

/// Cursor state over one file's tokens.
struct Parser<'src> {
    source: &'src str,
    /// Tokens without whitespace; always ends with [`Token::Eof`].
    tokens: Vec<PositionedToken<'src>>,
    pos: usize,
    /// End of the last significant token consumed.
    last_end: Position,
    /// Open brackets, innermost last.
    brackets: Vec<(&'static str, Span)>,
    /// Comments skipped inside brackets, waiting for an owner.
    pending: Vec<Comment>,
    /// Current expression nesting, bounded by [`MAX_DEPTH`].
    depth: usize,
    /// Operations chained in the current statement, bounded by [`MAX_CHAIN`].
    chained: usize,
}

fn closing_bracket(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

fn assign_op(token: &Token<'_>) -> Option<AssignOp> {
    Some(match token {
        Token::Equals => AssignOp::Assign,
        Token::PlusEquals => AssignOp::AddAssign,
        Token::MinusEquals => AssignOp::SubAssign,
        Token::StarEquals => AssignOp::MulAssign,
        Token::SlashEquals => AssignOp::DivAssign,
        Token::SlashSlashEquals => AssignOp::FloorDivAssign,
        Token::PercentEquals => AssignOp::ModAssign,
        _ => return None,
    })
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, tokens: Vec<PositionedToken<'src>>) -> Self {
        let tokens: Vec<_> = tokens
            .into_iter()
            .filter(|t| t.token != Token::Whitespace)
            .collect();
        Self {
            source,
            tokens,
            pos: 0,
            last_end: Position::default(),
            brackets: Vec::new(),
            pending: Vec::new(),
            depth: 0,
            chained: 0,
        }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// The token at the cursor, including newlines and comments.
    fn raw(&self) -> &PositionedToken<'src> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance_raw(&mut self) {
        if self.raw().token != Token::Eof {
            self.pos += 1;
        }
    }

    fn in_brackets(&self) -> bool {
        !self.brackets.is_empty()
    }

    /// Index of the `n`th significant token from the cursor.
    ///
    /// Inside brackets, newlines and comments are not significant.
    fn significant_index(&self, n: usize) -> usize {
        let last = self.tokens.len() - 1;
        let mut index = self.pos.min(last);
        let mut remaining = n;
        loop {
            let token = &self.tokens[index].token;
            let skip =
                self.in_brackets() && matches!(token, Token::Newline | Token::Comment(_));
            if !skip {
                if remaining == 0 || index == last {
                    return index;
                }
                remaining -= 1;
            }
            index = (index + 1).min(last);
        }
    }

    fn peek(&self) -> &Token<'src> {
        &self.tokens[self.significant_index(0)].token
    }

    fn peek_nth(&self, n: usize) -> &Token<'src> {
        &self.tokens[self.significant_index(n)].token
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.significant_index(0)].span
    }

    /// Consume the next significant token, parking skipped comments.
    fn bump(&mut self) -> PositionedToken<'src> {
        let target = self.significant_index(0);
        while self.pos < target {
            if let Token::Comment(text) = self.raw().token {
                let comment = Comment::new(text, self.raw().span);
                self.pending.push(comment);
            }
            self.pos += 1;
        }

        let token = self.raw().clone();
        self.advance_raw();
        self.last_end = token.span.end();

        if token.token.is_open_bracket() {
            let open = match token.token {
                Token::LeftParen => "(",
                Token::LeftBracket => "[",
                _ => "{",
            };
            self.brackets.push((open, token.span));
        } else if token.token.is_close_bracket() {
            self.brackets.pop();
        }
        token
    }

    fn expect(&mut self, token: &Token<'_>, expected: &str) -> Result<PositionedToken<'src>> {
        if self.peek() == token {
            Ok(self.bump())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            debug!(depth = self.depth; "Expression nesting limit reached");
            return Err(self.too_deep(format!(
                "expression nested too deeply, the limit is {MAX_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Count one more operation wrapping the current expression.
    fn chain(&mut self) -> Result<()> {
        self.chained += 1;
        if self.chained > MAX_CHAIN {
            return Err(self.too_deep(format!(
                "statement chains too many operations, the limit is {MAX_CHAIN}"
            )));
        }
        Ok(())
    }

    fn too_deep(&self, message: String) -> Diagnostic {
        Diagnostic::error(message)
            .with_code(ErrorCode::E103)
            .with_label(self.peek_span(), "too deep here")
            .with_help("assign inner parts to variables")
    }

    /// Diagnostic for the next significant token, which is not `expected`.
    fn unexpected(&self, expected: &str) -> Diagnostic {
        let found = &self.tokens[self.significant_index(0)];
        if found.token != Token::Eof {
            return Diagnostic::error(format!("expected {expected}, found {}", found.token))
                .with_code(ErrorCode::E100)
                .with_label(found.span, format!("unexpected {}", found.token));
        }

        match self.brackets.last() {
            Some((open, open_span)) => Diagnostic::error(format!(
                "unexpected end of input: unclosed `{open}`, expected {expected}"
            ))
            .with_code(ErrorCode::E101)
            .with_label(found.span, "input ends here")
            .with_secondary_label(*open_span, format!("unclosed `{open}` opened here"))
            .with_help(format!("add the missing `{}`", closing_bracket(open))),
            None => Diagnostic::error(format!("unexpected end of input, expected {expected}"))
                .with_code(ErrorCode::E101)
                .with_label(found.span, "input ends here"),
        }
    }

    // =========================================================================
    // Trivia
    // =========================================================================

    /// Collect comments and blank lines before a sequence item or closer.
    fn leading_trivia(&mut self) -> Trivia {
        let mut trivia = Trivia::default();
        let mut newlines = 0;
        loop {
            match self.raw().token {
                Token::Newline => {
                    newlines += 1;
                    if newlines >= 2 && trivia.before.is_empty() {
                        trivia.blank_lines_before = 1;
                    }
                }
                Token::Comment(text) => {
                    trivia.before.push(Comment::new(text, self.raw().span));
                    newlines = 0;
                }
                _ => break,
            }
            self.advance_raw();
        }
        trivia
    }

    /// Take a comment that sits on `line`, right at the cursor.
    fn take_suffix(&mut self, trivia: &mut Trivia, line: usize) {
        if let Token::Comment(text) = self.raw().token {
            if self.raw().span.start().line() == line {
                trivia.suffix.push(Comment::new(text, self.raw().span));
                self.advance_raw();
            }
        }
    }

    /// Finish a sequence item: stray comments, suffix comment and separator.
    fn item_tail(
        &mut self,
        trivia: &mut Trivia,
        end_line: usize,
        close: &Token<'_>,
        expected: &str,
    ) -> Result<()> {
        trivia.after.append(&mut self.pending);
        self.take_suffix(trivia, end_line);

        if *self.peek() == Token::Comma {
            let comma = self.bump();
            trivia.after.append(&mut self.pending);
            self.take_suffix(trivia, comma.span.end().line());
            return Ok(());
        }
        if self.peek() == close {
            return Ok(());
        }
        Err(self.unexpected(expected))
    }

    fn push_item(
        &mut self,
        items: &mut Vec<Expr>,
        mut item: Expr,
        mut trivia: Trivia,
        close: &Token<'_>,
        expected: &str,
    ) -> Result<()> {
        trivia.absorb(std::mem::take(&mut item.trivia));
        self.item_tail(&mut trivia, item.span.end().line(), close, expected)?;
        item.trivia = trivia;
        items.push(item);
        Ok(())
    }

    /// Parse items up to and including `close`.
    ///
    /// Returns the comments before the closer and the closing token.
    fn items(
        &mut self,
        close: &Token<'_>,
        expected: &str,
        parse: fn(&mut Self) -> Result<Expr>,
        items: &mut Vec<Expr>,
    ) -> Result<(Vec<Comment>, PositionedToken<'src>)> {
        loop {
            let trivia = self.leading_trivia();
            if self.peek() == close {
                return Ok((trivia.before, self.bump()));
            }
            let item = parse(self)?;
            self.push_item(items, item, trivia, close, expected)?;
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse the whole file.
    fn file(mut self, path: &str) -> Result<File> {
        let mut stmts = Vec::new();
        let mut at_start = true;
        while let Some(trivia) = self.top_level_trivia(&mut stmts, at_start) {
            at_start = false;
            let stmt = self.statement(trivia)?;
            stmts.push(stmt);
        }
        debug!(path, statements = stmts.len(); "Parsed file");
        Ok(File::from_stmts(path, stmts, self.source.len()))
    }

    /// Consume blank lines and comment groups between statements.
    ///
    /// A comment group followed by a blank line or the end of input becomes a
    /// standalone [`StmtKind::CommentBlock`]; a group directly above a
    /// statement becomes that statement's leading trivia. Returns `None` at the
    /// end of input.
    fn top_level_trivia(&mut self, stmts: &mut Vec<Stmt>, at_start: bool) -> Option<Trivia> {
        // At the start of input we are already at the beginning of a line
        let mut newlines = usize::from(at_start);
        let mut group: Vec<Comment> = Vec::new();
        let mut group_blank = false;

        loop {
            match self.raw().token {
                Token::Newline => newlines += 1,
                Token::Comment(text) => {
                    let blank = newlines >= 2;
                    if blank && !group.is_empty() {
                        stmts.push(comment_block(std::mem::take(&mut group), group_blank));
                    }
                    if group.is_empty() {
                        group_blank = blank;
                    }
                    group.push(Comment::new(text, self.raw().span));
                    newlines = 0;
                }
                Token::Eof => {
                    if !group.is_empty() {
                        stmts.push(comment_block(group, group_blank));
                    }
                    return None;
                }
                _ => {
                    let blank = newlines >= 2;
                    let mut trivia = Trivia::default();
                    if group.is_empty() {
                        trivia.blank_lines_before = usize::from(blank);
                    } else if blank {
                        stmts.push(comment_block(group, group_blank));
                        trivia.blank_lines_before = 1;
                    } else {
                        trivia.blank_lines_before = usize::from(group_blank);
                        trivia.before = group;
                    }
                    return Some(trivia);
                }
            }
            self.advance_raw();
        }
    }

    fn statement(&mut self, mut trivia: Trivia) -> Result<Stmt> {
        self.chained = 0;
        let start = self.peek_span().start();
        let expr = self.expression_statement()?;
        let span = Span::new(start, self.last_end);

        let kind = match expr.kind {
            ExprKind::Call(call) if call.callee_name() == Some("load") => {
                validate_load(&call, span)?;
                StmtKind::Load(call)
            }
            kind => {
                let mut expr = Expr {
                    kind,
                    span: expr.span,
                    trivia: expr.trivia,
                };
                if let ExprKind::Call(call) = &mut expr.kind {
                    if call.callee_name().is_some() {
                        collapse_duplicate_attrs(call);
                    }
                }
                StmtKind::Expr(expr)
            }
        };

        trivia.after.append(&mut self.pending);
        self.take_suffix(&mut trivia, self.last_end.line());
        match self.raw().token {
            Token::Newline | Token::Eof => {}
            Token::Semicolon => self.advance_raw(),
            _ => return Err(self.unexpected("newline")),
        }

        trace!(line = span.start().line(); "Parsed statement");
        Ok(Stmt { kind, span, trivia })
    }

    /// `targets [assign_op values]`, where both sides may be bare tuples.
    fn expression_statement(&mut self) -> Result<Expr> {
        let lhs = self.test_list()?;
        let Some(op) = assign_op(self.peek()) else {
            return Ok(lhs);
        };
        self.bump();
        let rhs = self.test_list()?;
        let span = lhs.span.union(rhs.span);
        Ok(Expr::new(
            ExprKind::Assign {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
            span,
        ))
    }

    /// One expression, or several separated by commas forming a tuple.
    fn test_list(&mut self) -> Result<Expr> {
        let first = self.test()?;
        if *self.peek() != Token::Comma {
            return Ok(first);
        }

        let mut span = first.span;
        let mut elements = vec![first];
        while *self.peek() == Token::Comma {
            self.bump();
            if matches!(
                self.peek(),
                Token::Newline | Token::Eof | Token::Comment(_) | Token::Semicolon
            ) || assign_op(self.peek()).is_some()
            {
                break;
            }
            let element = self.test()?;
            span = span.union(element.span);
            elements.push(element);
        }
        Ok(Expr::new(
            ExprKind::Tuple(List {
                elements,
                end_comments: Vec::new(),
                bare: true,
            }),
            span,
        ))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn test(&mut self) -> Result<Expr> {
        self.nested(Self::conditional)
    }

    /// `or_test ['if' or_test 'else' test]`
    fn conditional(&mut self) -> Result<Expr> {
        let then = self.binary(1)?;
        if *self.peek() != Token::If {
            return Ok(then);
        }
        self.bump();
        let cond = self.binary(1)?;
        self.expect(&Token::Else, "`else`")?;
        let otherwise = self.test()?;
        let span = then.span.union(otherwise.span);
        Ok(Expr::new(
            ExprKind::Conditional {
                then: Box::new(then),
                cond: Box::new(cond),
                otherwise: Box::new(otherwise),
            },
            span,
        ))
    }

    /// The binary operator at the cursor, if any.
    fn peek_binary_op(&self) -> Option<BinaryOp> {
        Some(match self.peek() {
            Token::Or => BinaryOp::Or,
            Token::And => BinaryOp::And,
            Token::EqualsEquals => BinaryOp::Eq,
            Token::NotEquals => BinaryOp::NotEq,
            Token::Less => BinaryOp::Lt,
            Token::LessEquals => BinaryOp::Le,
            Token::Greater => BinaryOp::Gt,
            Token::GreaterEquals => BinaryOp::Ge,
            Token::In => BinaryOp::In,
            Token::Not if *self.peek_nth(1) == Token::In => BinaryOp::NotIn,
            Token::Pipe => BinaryOp::Pipe,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::SlashSlash => BinaryOp::FloorDiv,
            Token::Percent => BinaryOp::Mod,
            _ => return None,
        })
    }

    /// Left-associative binary operators at precedence `level` and above.
    ///
    /// Level 3 is the prefix `not`; levels past 7 are unary operators.
    fn binary(&mut self, level: u8) -> Result<Expr> {
        if level == 3 {
            return self.not_test();
        }
        if level > 7 {
            return self.unary();
        }

        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self.peek_binary_op() {
            if op.precedence() != level {
                break;
            }
            self.chain()?;
            self.bump();
            if op == BinaryOp::NotIn {
                self.bump();
            }
            let rhs = self.binary(level + 1)?;
            let span = lhs.span.union(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn not_test(&mut self) -> Result<Expr> {
        if *self.peek() != Token::Not {
            return self.binary(4);
        }
        let start = self.bump().span;
        let operand = self.nested(Self::not_test)?;
        let span = start.union(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            Token::Tilde => UnaryOp::Invert,
            _ => return self.postfix(),
        };
        let start = self.bump().span;
        let operand = self.nested(Self::unary)?;
        let span = start.union(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// Calls, attribute access and indexing.
    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if matches!(self.peek(), Token::LeftParen | Token::Dot | Token::LeftBracket) {
                self.chain()?;
            }
            expr = match self.peek() {
                Token::LeftParen => self.call(expr)?,
                Token::Dot => {
                    self.bump();
                    let (name, name_span) = self.identifier()?;
                    let span = expr.span.union(name_span);
                    Expr::new(
                        ExprKind::Dot {
                            object: Box::new(expr),
                            name,
                        },
                        span,
                    )
                }
                Token::LeftBracket => {
                    self.bump();
                    let index = self.test()?;
                    let close = self.expect(&Token::RightBracket, "`]`")?;
                    let span = expr.span.union(close.span);
                    Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    )
                }
                _ => return Ok(expr),
            };
        }
    }

    fn identifier(&mut self) -> Result<(String, Span)> {
        match *self.peek() {
            Token::Identifier(name) => {
                let span = self.bump().span;
                Ok((name.to_string(), span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.peek() {
            Token::LeftBracket => return self.list(),
            Token::LeftBrace => return self.dict(),
            Token::LeftParen => return self.paren(),
            Token::Identifier(_) | Token::Int(_) | Token::Float(_) | Token::String { .. } => {}
            _ => return Err(self.unexpected("expression")),
        }

        let PositionedToken { token, span } = self.bump();
        let kind = match token {
            Token::Identifier("True") => ExprKind::Literal(Literal::Bool(true)),
            Token::Identifier("False") => ExprKind::Literal(Literal::Bool(false)),
            Token::Identifier(name) => ExprKind::Ident(name.to_string()),
            Token::Int(text) => ExprKind::Literal(Literal::Int(text.to_string())),
            Token::Float(text) => ExprKind::Literal(Literal::Float(text.to_string())),
            Token::String { value, kind, quote } => ExprKind::Literal(Literal::String(StringLit {
                value,
                raw: self.source[span.range()].to_string(),
                kind,
                quote,
            })),
            other => {
                return Err(Diagnostic::error(format!("expected expression, found {other}"))
                    .with_code(ErrorCode::E100)
                    .with_label(span, format!("unexpected {other}")));
            }
        };
        Ok(Expr::new(kind, span))
    }

    /// A call argument: positional, `key = value`, `*args` or `**kwargs`.
    fn argument(&mut self) -> Result<Expr> {
        let splat = match self.peek() {
            Token::Star => Some(UnaryOp::Star),
            Token::StarStar => Some(UnaryOp::StarStar),
            _ => None,
        };
        if let Some(op) = splat {
            let start = self.bump().span;
            let operand = self.test()?;
            let span = start.union(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let is_keyword =
            matches!(self.peek(), Token::Identifier(_)) && *self.peek_nth(1) == Token::Equals;
        if !is_keyword {
            return self.test();
        }

        let (key, key_span) = self.identifier()?;
        self.bump();
        let value = self.test()?;
        let span = key_span.union(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                lhs: Box::new(Expr::new(ExprKind::Ident(key), key_span)),
                op: AssignOp::Assign,
                rhs: Box::new(value),
            },
            span,
        ))
    }

    fn call(&mut self, callee: Expr) -> Result<Expr> {
        self.bump();
        let mut args = Vec::new();
        let (end_comments, close) =
            self.items(&Token::RightParen, "`,` or `)`", Self::argument, &mut args)?;
        let span = callee.span.union(close.span);
        Ok(Expr::new(
            ExprKind::Call(Call {
                callee: Box::new(callee),
                args,
                end_comments,
            }),
            span,
        ))
    }

    /// `[...]`, either a list display or a list comprehension.
    fn list(&mut self) -> Result<Expr> {
        let open = self.bump();
        let mut elements = Vec::new();
        let (end_comments, close) = loop {
            let trivia = self.leading_trivia();
            if *self.peek() == Token::RightBracket {
                break (trivia.before, self.bump());
            }
            let item = self.test()?;
            if elements.is_empty() && *self.peek() == Token::For {
                self.pending.extend(trivia.before);
                return self.comprehension(open.span, item, None);
            }
            self.push_item(
                &mut elements,
                item,
                trivia,
                &Token::RightBracket,
                "`,` or `]`",
            )?;
        };
        Ok(Expr::new(
            ExprKind::List(List {
                elements,
                end_comments,
                bare: false,
            }),
            open.span.union(close.span),
        ))
    }

    /// `{...}`, either a dict display or a dict comprehension.
    fn dict(&mut self) -> Result<Expr> {
        let open = self.bump();
        let mut entries: Vec<DictEntry> = Vec::new();
        let (end_comments, close) = loop {
            let mut trivia = self.leading_trivia();
            if *self.peek() == Token::RightBrace {
                break (trivia.before, self.bump());
            }
            let key = self.test()?;
            self.expect(&Token::Colon, "`:`")?;
            let value = self.test()?;
            if entries.is_empty() && *self.peek() == Token::For {
                self.pending.extend(trivia.before);
                return self.comprehension(open.span, key, Some(value));
            }

            let span = key.span.union(value.span);
            self.item_tail(
                &mut trivia,
                span.end().line(),
                &Token::RightBrace,
                "`,` or `}`",
            )?;
            entries.push(DictEntry {
                key,
                value,
                span,
                trivia,
            });
        };
        Ok(Expr::new(
            ExprKind::Dict(Dict {
                entries,
                end_comments,
            }),
            open.span.union(close.span),
        ))
    }

    /// The `for`/`if` clauses of a comprehension, through the closing bracket.
    fn comprehension(&mut self, open: Span, body: Expr, value: Option<Expr>) -> Result<Expr> {
        let curly = value.is_some();
        let (close_token, expected) = if curly {
            (Token::RightBrace, "`for`, `if` or `}`")
        } else {
            (Token::RightBracket, "`for`, `if` or `]`")
        };

        let mut clauses = Vec::new();
        let close = loop {
            match self.peek() {
                Token::For => {
                    self.bump();
                    let mut vars = vec![self.binary(5)?];
                    while *self.peek() == Token::Comma {
                        self.bump();
                        vars.push(self.binary(5)?);
                    }
                    self.expect(&Token::In, "`in`")?;
                    let iter = self.binary(1)?;
                    clauses.push(Clause::For { vars, iter });
                }
                Token::If => {
                    self.bump();
                    clauses.push(Clause::If(self.binary(1)?));
                }
                token if *token == close_token => break self.bump(),
                _ => return Err(self.unexpected(expected)),
            }
        };

        Ok(Expr::new(
            ExprKind::Comprehension(Box::new(Comprehension {
                curly,
                body,
                value,
                clauses,
            })),
            open.union(close.span),
        ))
    }

    /// `(...)`: a parenthesised expression or a tuple.
    fn paren(&mut self) -> Result<Expr> {
        let open = self.bump();
        let trivia = self.leading_trivia();
        if *self.peek() == Token::RightParen {
            let close = self.bump();
            return Ok(Expr::new(
                ExprKind::Tuple(List {
                    elements: Vec::new(),
                    end_comments: trivia.before,
                    bare: false,
                }),
                open.span.union(close.span),
            ));
        }

        let first = self.test()?;
        if *self.peek() != Token::Comma {
            self.pending.extend(trivia.before);
            let close = self.expect(&Token::RightParen, "`)`")?;
            return Ok(Expr::new(
                ExprKind::Paren(Box::new(first)),
                open.span.union(close.span),
            ));
        }

        let mut elements = Vec::new();
        self.push_item(
            &mut elements,
            first,
            trivia,
            &Token::RightParen,
            "`,` or `)`",
        )?;
        let (end_comments, close) =
            self.items(&Token::RightParen, "`,` or `)`", Self::test, &mut elements)?;
        Ok(Expr::new(
            ExprKind::Tuple(List {
                elements,
                end_comments,
                bare: false,
            }),
            open.span.union(close.span),
        ))
    }
}

fn comment_block(comments: Vec<Comment>, blank: bool) -> Stmt {
    let span = match (comments.first(), comments.last()) {
        (Some(first), Some(last)) => first.span().union(last.span()),
        _ => Span::default(),
    };
    let mut stmt = Stmt::new(StmtKind::CommentBlock, span);
    stmt.trivia.blank_lines_before = usize::from(blank);
    stmt.trivia.before = comments;
    stmt
}

/// Check the argument shapes of a `load` statement.
fn validate_load(call: &Call, span: Span) -> Result<()> {
    let invalid = |span: Span, message: &str| {
        Diagnostic::error(message.to_string())
            .with_code(ErrorCode::E102)
            .with_label(span, ErrorCode::E102.description())
            .with_help("write `load(\"//pkg:defs.bzl\", \"symbol\", alias = \"symbol\")`")
    };

    let mut args = call.args.iter();
    let Some(module) = args.next() else {
        return Err(invalid(span, "`load` needs a module and at least one symbol"));
    };
    if module.as_string().is_none() {
        return Err(invalid(
            module.span,
            "the first argument of `load` must be a module string",
        ));
    }
    if call.args.len() < 2 {
        return Err(invalid(span, "`load` needs at least one symbol"));
    }
    for arg in args {
        let valid = arg.as_string().is_some()
            || arg
                .as_keyword()
                .is_some_and(|(_, value)| value.as_string().is_some());
        if !valid {
            return Err(invalid(
                arg.span,
                "`load` symbols must be strings or `alias = \"symbol\"` pairs",
            ));
        }
    }
    Ok(())
}

/// Keep only the last occurrence of each keyword attribute of a rule.
///
/// The kept attribute stays at its own position. Comments of the dropped
/// occurrences are moved in front of its leading comments.
fn collapse_duplicate_attrs(call: &mut Call) {
    let mut last_index: IndexMap<String, usize> = IndexMap::new();
    let mut keywords = 0;
    for (i, arg) in call.args.iter().enumerate() {
        if let Some((key, _)) = arg.as_keyword() {
            last_index.insert(key.to_string(), i);
            keywords += 1;
        }
    }
    if keywords == last_index.len() {
        return;
    }

    let mut carried: IndexMap<usize, Vec<Comment>> = IndexMap::new();
    let mut kept = Vec::with_capacity(call.args.len());
    for (i, mut arg) in std::mem::take(&mut call.args).into_iter().enumerate() {
        let winner = arg
            .as_keyword()
            .and_then(|(key, _)| last_index.get(key).copied());
        match winner {
            Some(winner) if winner != i => {
                debug!(
                    attr = arg.as_keyword().map(|(key, _)| key).unwrap_or_default();
                    "Dropping duplicate attribute"
                );
                carried
                    .entry(winner)
                    .or_default()
                    .extend(arg.trivia.take_comments());
            }
            _ => {
                if let Some(mut comments) = carried.shift_remove(&i) {
                    comments.append(&mut arg.trivia.before);
                    arg.trivia.before = comments;
                }
                kept.push(arg);
            }
        }
    }
    call.args = kept;
}

/// Parse a token stream produced by [`tokenize`](crate::lexer::tokenize).
pub(crate) fn parse_tokens<'src>(
    path: &str,
    source: &'src str,
    tokens: Vec<PositionedToken<'src>>,
) -> Result<File> {
    Parser::new(source, tokens).file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> File {
        let tokens = tokenize(source).unwrap();
        parse_tokens("BUILD", source, tokens).unwrap()
    }

    fn parse_err(source: &str) -> Diagnostic {
        let tokens = tokenize(source).unwrap();
        parse_tokens("BUILD", source, tokens).unwrap_err()
    }

    fn stmt_expr(file: &File, index: usize) -> &Expr {
        file.stmts[index].expr().unwrap()
    }

    #[test]
    fn test_precedence() {
        let file = parse("x = a or b and not c == d + e * -f\n");
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op, rhs: and, .. } = &rhs.kind else {
            panic!("expected `or`");
        };
        assert_eq!(*op, BinaryOp::Or);
        let ExprKind::Binary { op, rhs: not, .. } = &and.kind else {
            panic!("expected `and`");
        };
        assert_eq!(*op, BinaryOp::And);
        let ExprKind::Unary { op, operand } = &not.kind else {
            panic!("expected `not`");
        };
        assert_eq!(*op, UnaryOp::Not);
        let ExprKind::Binary { op, rhs: sum, .. } = &operand.kind else {
            panic!("expected `==`");
        };
        assert_eq!(*op, BinaryOp::Eq);
        let ExprKind::Binary { op, rhs: product, .. } = &sum.kind else {
            panic!("expected `+`");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            product.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_left_associative() {
        let file = parse("x = a - b - c\n");
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { lhs, rhs: c, .. } = &rhs.kind else {
            panic!("expected binary");
        };
        assert_eq!(c.as_ident(), Some("c"));
        assert!(matches!(lhs.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_not_in() {
        let file = parse("x = a not in b\n");
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: BinaryOp::NotIn,
                ..
            }
        ));
    }

    #[test]
    fn test_newlines_inside_brackets() {
        let file = parse("x = foo(\n    a,\n\n    b = 1 +\n        2,\n)\ny = 3\n");
        assert_eq!(file.stmts.len(), 2);
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        let call = rhs.as_call().unwrap();
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[1].trivia.blank_lines_before, 1);
    }

    #[test]
    fn test_comment_attachment_in_list() {
        let source = "\
srcs = [
    # leading
    \"a.go\",  # suffix

    \"b.go\",
    # trailing
]
";
        let file = parse(source);
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        let ExprKind::List(list) = &rhs.kind else {
            panic!("expected list");
        };
        assert_eq!(list.elements[0].trivia.before[0].text(), "# leading");
        assert_eq!(list.elements[0].trivia.suffix[0].text(), "# suffix");
        assert_eq!(list.elements[1].trivia.blank_lines_before, 1);
        assert!(list.elements[1].trivia.before.is_empty());
        assert_eq!(list.end_comments[0].text(), "# trailing");
    }

    #[test]
    fn test_suffix_without_comma() {
        let file = parse("x = [\n    \"a\"  # last\n]\n");
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        let ExprKind::List(list) = &rhs.kind else {
            panic!("expected list");
        };
        assert_eq!(list.elements[0].trivia.suffix[0].text(), "# last");
        assert!(list.end_comments.is_empty());
    }

    #[test]
    fn test_stray_comment_goes_to_item_after() {
        let file = parse("f(\n    a = # inside\n        1,\n)\n");
        let call = stmt_expr(&file, 0).as_call().unwrap();
        assert_eq!(call.args[0].trivia.after[0].text(), "# inside");
    }

    #[test]
    fn test_top_level_comment_groups() {
        let source = "\
# file header

# attached
x = 1  # suffix

# dangling
";
        let file = parse(source);
        assert_eq!(file.stmts.len(), 3);
        assert_eq!(file.stmts[0].kind, StmtKind::CommentBlock);
        assert_eq!(file.stmts[0].trivia.before[0].text(), "# file header");

        let stmt = &file.stmts[1];
        assert_eq!(stmt.trivia.blank_lines_before, 1);
        assert_eq!(stmt.trivia.before[0].text(), "# attached");
        assert_eq!(stmt.trivia.suffix[0].text(), "# suffix");

        assert_eq!(file.stmts[2].kind, StmtKind::CommentBlock);
        assert_eq!(file.stmts[2].trivia.blank_lines_before, 1);
    }

    #[test]
    fn test_load_statement() {
        let file = parse("load(\"//a:b.bzl\", \"x\", y = \"z\")\n");
        let StmtKind::Load(call) = &file.stmts[0].kind else {
            panic!("expected load");
        };
        assert_eq!(call.args.len(), 3);
    }

    #[test]
    fn test_invalid_load() {
        let err = parse_err("load(\"//a:b.bzl\", x)\n");
        assert_eq!(err.code(), Some(ErrorCode::E102));
        assert_eq!(err.primary_span().unwrap().range(), 18..19);

        let err = parse_err("load(name)\n");
        assert_eq!(err.code(), Some(ErrorCode::E102));

        let err = parse_err("load(\"//a:b.bzl\")\n");
        assert_eq!(err.code(), Some(ErrorCode::E102));
    }

    #[test]
    fn test_duplicate_attributes_collapse() {
        let source = "\
go_library(
    # first
    name = \"a\",
    srcs = [],
    name = \"b\",
)
";
        let file = parse(source);
        let rule = file.rules("").next().unwrap();
        assert_eq!(rule.attr_keys().collect::<Vec<_>>(), ["srcs", "name"]);
        assert_eq!(rule.name(), "b");
        let name_arg = &rule.call().args[1];
        assert_eq!(name_arg.trivia.before[0].text(), "# first");
    }

    #[test]
    fn test_comprehensions() {
        let file = parse("x = [a for a, b in items if a]\ny = {k: v for k in d}\n");
        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 0).kind else {
            panic!("expected assignment");
        };
        let ExprKind::Comprehension(comp) = &rhs.kind else {
            panic!("expected comprehension");
        };
        assert!(!comp.curly);
        assert_eq!(comp.clauses.len(), 2);

        let ExprKind::Assign { rhs, .. } = &stmt_expr(&file, 1).kind else {
            panic!("expected assignment");
        };
        let ExprKind::Comprehension(comp) = &rhs.kind else {
            panic!("expected comprehension");
        };
        assert!(comp.curly);
        assert!(comp.value.is_some());
    }

    #[test]
    fn test_tuples_and_parens() {
        let file = parse("a = (1)\nb = (1,)\nc = ()\nd, e = 1, 2\n");
        let rhs = |i: usize| match &stmt_expr(&file, i).kind {
            ExprKind::Assign { rhs, .. } => rhs.kind.clone(),
            _ => panic!("expected assignment"),
        };
        assert!(matches!(rhs(0), ExprKind::Paren(_)));
        assert!(matches!(rhs(1), ExprKind::Tuple(ref l) if l.elements.len() == 1 && !l.bare));
        assert!(matches!(rhs(2), ExprKind::Tuple(ref l) if l.elements.is_empty() && !l.bare));
        assert!(matches!(rhs(3), ExprKind::Tuple(ref l) if l.elements.len() == 2 && l.bare));
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = format!("{}1{}\n", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(parse(&at_limit).stmts.len(), 1);

        let source = format!("x = {}1\n", "[".repeat(MAX_DEPTH + 10));
        let err = parse_err(&source);
        assert_eq!(err.code(), Some(ErrorCode::E103));
        // The bracket past the limit
        assert_eq!(err.primary_span().unwrap().start().offset(), 4 + MAX_DEPTH);
    }

    #[test]
    fn test_chain_limit_is_per_statement() {
        let sum = format!("x = 1{}\n", " + 1".repeat(MAX_CHAIN / 2));
        let file = parse(&sum.repeat(3));
        assert_eq!(file.stmts.len(), 3);

        let dots = format!("x = a{}\n", ".b".repeat(MAX_CHAIN + 1));
        assert_eq!(parse_err(&dots).code(), Some(ErrorCode::E103));
    }

    #[test]
    fn test_semicolon_separates_statements() {
        let file = parse("a = 1; b = 2\n");
        assert_eq!(file.stmts.len(), 2);
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_err("x = )\n");
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.message(), "expected expression, found `)`");
        assert_eq!(err.primary_span().unwrap().range(), 4..5);

        let err = parse_err("x = 1 2\n");
        assert_eq!(err.code(), Some(ErrorCode::E100));
        assert_eq!(err.message(), "expected newline, found number");
    }

    #[test]
    fn test_unclosed_bracket_at_end() {
        let err = parse_err("go_library(name=");
        assert_eq!(err.code(), Some(ErrorCode::E101));
        assert!(err.message().contains("unclosed `(`"));
        assert_eq!(err.primary_span().unwrap().start().offset(), 16);
        let secondary = err.labels().iter().find(|l| l.is_secondary()).unwrap();
        assert_eq!(secondary.span().range(), 10..11);
        assert_eq!(err.help(), Some("add the missing `)`"));
    }
}
