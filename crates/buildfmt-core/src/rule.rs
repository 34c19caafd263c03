//! Rule queries and rule construction.
//!
//! A rule is a top-level call statement whose callee is an identifier, such as
//! `go_library(name = "x", srcs = [...])`. [`Rule`] is a borrowed view over
//! such a statement; [`RuleBuilder`] creates new ones in memory.

use crate::{
    expr::{Call, Expr, ExprKind, UnaryOp},
    file::{Stmt, StmtKind},
    span::Span,
};

/// Where a rule's logical name may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// The `name = "..."` keyword attribute.
    Keyword,
    /// The first positional argument, when it is a string literal.
    Positional,
}

/// Name sources in order of precedence. The first one that yields a name wins.
pub const NAME_SOURCES: [NameSource; 2] = [NameSource::Keyword, NameSource::Positional];

/// A read-only view over one top-level rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule<'a> {
    stmt: &'a Stmt,
    kind: &'a str,
    call: &'a Call,
}

impl<'a> Rule<'a> {
    /// View `stmt` as a rule, if it is a call with an identifier callee.
    pub fn from_stmt(stmt: &'a Stmt) -> Option<Self> {
        let StmtKind::Expr(expr) = &stmt.kind else {
            return None;
        };
        let call = expr.as_call()?;
        let kind = call.callee_name()?;
        Some(Self { stmt, kind, call })
    }

    /// The callee identifier, e.g. `go_library`.
    pub fn kind(&self) -> &'a str {
        self.kind
    }

    /// The logical name, resolved through [`NAME_SOURCES`]; `""` when none applies.
    pub fn name(&self) -> &'a str {
        NAME_SOURCES
            .iter()
            .find_map(|source| match source {
                NameSource::Keyword => self.attr_string("name"),
                NameSource::Positional => self.positional().next().and_then(Expr::as_string),
            })
            .unwrap_or_default()
    }

    /// Value of the keyword attribute `key`.
    pub fn attr(&self, key: &str) -> Option<&'a Expr> {
        self.call.keyword(key)
    }

    /// Value of the keyword attribute `key` when it is a string literal.
    pub fn attr_string(&self, key: &str) -> Option<&'a str> {
        self.attr(key).and_then(Expr::as_string)
    }

    /// Keyword attribute keys in their current order.
    pub fn attr_keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.call
            .args
            .iter()
            .filter_map(|arg| arg.as_keyword().map(|(key, _)| key))
    }

    /// Arguments that are neither keyword attributes nor splats.
    pub fn positional(&self) -> impl Iterator<Item = &'a Expr> + 'a {
        self.call.args.iter().filter(|arg| {
            !matches!(
                arg.kind,
                ExprKind::Assign { .. }
                    | ExprKind::Unary {
                        op: UnaryOp::Star | UnaryOp::StarStar,
                        ..
                    }
            )
        })
    }

    /// The underlying call expression.
    pub fn call(&self) -> &'a Call {
        self.call
    }

    /// Span of the whole statement.
    pub fn span(&self) -> Span {
        self.stmt.span
    }
}

/// Builds a rule call from a kind and attributes.
///
/// ```
/// # use buildfmt_core::{File, RuleBuilder};
/// let mut file = File::new("pkg/BUILD");
/// file.push_rule(
///     RuleBuilder::new("go_library")
///         .string("name", "pkg")
///         .string_list("srcs", ["pkg.go"]),
/// );
/// assert_eq!(file.rules("go_library").next().map(|r| r.name()), Some("pkg"));
/// ```
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    kind: String,
    args: Vec<Expr>,
}

impl RuleBuilder {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            args: Vec::new(),
        }
    }

    /// Add a string attribute.
    pub fn string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr(key, Expr::string(value))
    }

    /// Add a list-of-strings attribute.
    pub fn string_list<I, S>(self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = Expr::list(values.into_iter().map(Expr::string).collect());
        self.attr(key, list)
    }

    /// Add an attribute with an arbitrary value. A repeated key replaces the earlier one.
    pub fn attr(mut self, key: impl Into<String>, value: Expr) -> Self {
        let key = key.into();
        let arg = Expr::keyword(key.as_str(), value);
        match self
            .args
            .iter()
            .position(|a| a.as_keyword().is_some_and(|(k, _)| k == key))
        {
            Some(index) => self.args[index] = arg,
            None => self.args.push(arg),
        }
        self
    }

    /// Produce the call expression.
    pub fn build(self) -> Expr {
        Expr::new(
            ExprKind::Call(Call {
                callee: Box::new(Expr::ident(self.kind)),
                args: self.args,
                end_comments: Vec::new(),
            }),
            Span::default(),
        )
    }
}
