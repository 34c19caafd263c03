//! Expression tree.
//!
//! [`Expr`] is a closed enum of every expression form the language has.
//! Each node owns its children, its [`Span`] and its [`Trivia`], so a tree
//! can be printed back without consulting the source text.

use std::fmt;

use crate::{
    span::Span,
    trivia::{Comment, Trivia},
};

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub trivia: Trivia,
}

/// The shape of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    Literal(Literal),
    List(List),
    /// Tuple display. A one-element tuple prints with a trailing comma.
    Tuple(List),
    Dict(Dict),
    /// A parenthesised expression, kept so the printer reproduces the parentheses.
    Paren(Box<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call(Call),
    Dot {
        object: Box<Expr>,
        name: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `then if cond else otherwise`
    Conditional {
        then: Box<Expr>,
        cond: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Assignment statements and keyword arguments (`key = value`).
    Assign {
        lhs: Box<Expr>,
        op: AssignOp,
        rhs: Box<Expr>,
    },
    Comprehension(Box<Comprehension>),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(StringLit),
    /// Integer text as written (`42`, `0x2a`, `0o52`).
    Int(String),
    /// Float text as written (`1.5`, `.5`, `1e3`).
    Float(String),
    Bool(bool),
}

/// How a string literal was spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Plain,
    Raw,
    Triple,
    RawTriple,
}

impl StringKind {
    pub fn is_raw(self) -> bool {
        matches!(self, StringKind::Raw | StringKind::RawTriple)
    }

    pub fn is_triple(self) -> bool {
        matches!(self, StringKind::Triple | StringKind::RawTriple)
    }
}

/// A string literal: its decoded value plus the exact source spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLit {
    /// Decoded logical value.
    pub value: String,
    /// Source text including prefix and quotes. This is what gets printed.
    pub raw: String,
    pub kind: StringKind,
    /// `"` or `'`.
    pub quote: char,
}

impl StringLit {
    /// A plain double-quoted string holding `value`.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            raw: quote(&value),
            value,
            kind: StringKind::Plain,
            quote: '"',
        }
    }

    /// Replace the value, re-encoding it as a plain double-quoted string.
    pub fn set_value(&mut self, value: impl Into<String>) {
        *self = Self::new(value);
    }

    /// The text between the quotes (and after any `r` prefix).
    pub fn body(&self) -> &str {
        let prefix = usize::from(self.kind.is_raw());
        let quotes = if self.kind.is_triple() { 3 } else { 1 };
        self.raw
            .get(prefix + quotes..self.raw.len().saturating_sub(quotes))
            .unwrap_or_default()
    }
}

/// Encode `value` as a double-quoted string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Elements of a list or tuple display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    pub elements: Vec<Expr>,
    /// Comments between the last element and the closing bracket.
    pub end_comments: Vec<Comment>,
    /// A tuple written without parentheses, as in `a, b = c`.
    pub bare: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dict {
    pub entries: Vec<DictEntry>,
    pub end_comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub key: Expr,
    pub value: Expr,
    pub span: Span,
    pub trivia: Trivia,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Box<Expr>,
    /// Positional arguments, keyword arguments (`Assign`), `*args` and `**kwargs`.
    pub args: Vec<Expr>,
    pub end_comments: Vec<Comment>,
}

impl Call {
    /// Identifier name of the callee, if it is a plain identifier.
    pub fn callee_name(&self) -> Option<&str> {
        self.callee.as_ident()
    }

    /// Value of the keyword argument `key`.
    pub fn keyword(&self, key: &str) -> Option<&Expr> {
        self.args.iter().find_map(|arg| match arg.as_keyword() {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        })
    }

    /// Mutable value of the keyword argument `key`.
    pub fn keyword_mut(&mut self, key: &str) -> Option<&mut Expr> {
        self.args
            .iter_mut()
            .find_map(|arg| match arg.as_keyword_mut() {
                Some((k, v)) if k == key => Some(v),
                _ => None,
            })
    }

    /// Returns `true` if any argument is a `*args` or `**kwargs` splat.
    pub fn has_splat(&self) -> bool {
        self.args.iter().any(|arg| {
            matches!(
                arg.kind,
                ExprKind::Unary {
                    op: UnaryOp::Star | UnaryOp::StarStar,
                    ..
                }
            )
        })
    }
}

/// `[body for ... if ...]` or `{key: value for ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub curly: bool,
    /// The element, or the key for dict comprehensions.
    pub body: Expr,
    /// The value for dict comprehensions.
    pub value: Option<Expr>,
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    For { vars: Vec<Expr>, iter: Expr },
    If(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
    /// `*args` in a call.
    Star,
    /// `**kwargs` in a call.
    StarStar,
}

impl UnaryOp {
    /// Printed form, including the space after `not`.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not ",
            UnaryOp::Star => "*",
            UnaryOp::StarStar => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Pipe,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "not in",
            BinaryOp::Pipe => "|",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
        }
    }

    /// Binding strength; higher binds tighter. `not` sits at level 3.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::In
            | BinaryOp::NotIn => 4,
            BinaryOp::Pipe => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod => 7,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    FloorDivAssign,
    ModAssign,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::FloorDivAssign => "//=",
            AssignOp::ModAssign => "%=",
        }
    }
}

impl Expr {
    /// Create a node without trivia.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            trivia: Trivia::default(),
        }
    }

    /// An identifier with an empty span.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()), Span::default())
    }

    /// A double-quoted string literal with an empty span.
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(
            ExprKind::Literal(Literal::String(StringLit::new(value))),
            Span::default(),
        )
    }

    /// A list display with an empty span.
    pub fn list(elements: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::List(List {
                elements,
                end_comments: Vec::new(),
                bare: false,
            }),
            Span::default(),
        )
    }

    /// A `key = value` keyword argument with an empty span.
    pub fn keyword(key: impl Into<String>, value: Expr) -> Self {
        Self::new(
            ExprKind::Assign {
                lhs: Box::new(Self::ident(key)),
                op: AssignOp::Assign,
                rhs: Box::new(value),
            },
            Span::default(),
        )
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Decoded value of a string literal.
    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Literal(Literal::String(s)) => Some(&s.value),
            _ => None,
        }
    }

    pub fn as_string_lit_mut(&mut self) -> Option<&mut StringLit> {
        match &mut self.kind {
            ExprKind::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_call_mut(&mut self) -> Option<&mut Call> {
        match &mut self.kind {
            ExprKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Key and value of a `key = value` keyword argument.
    pub fn as_keyword(&self) -> Option<(&str, &Expr)> {
        match &self.kind {
            ExprKind::Assign {
                lhs,
                op: AssignOp::Assign,
                rhs,
            } => lhs.as_ident().map(|key| (key, rhs.as_ref())),
            _ => None,
        }
    }

    pub fn as_keyword_mut(&mut self) -> Option<(&str, &mut Expr)> {
        match &mut self.kind {
            ExprKind::Assign {
                lhs,
                op: AssignOp::Assign,
                rhs,
            } => match &lhs.kind {
                ExprKind::Ident(key) => Some((key.as_str(), rhs.as_mut())),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns `true` for a string literal whose source spelling spans lines.
    pub fn is_multiline_literal(&self) -> bool {
        matches!(&self.kind, ExprKind::Literal(Literal::String(s)) if s.raw.contains('\n'))
    }

    /// Direct sub-expressions, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Ident(_) | ExprKind::Literal(_) => Vec::new(),
            ExprKind::List(list) | ExprKind::Tuple(list) => list.elements.iter().collect(),
            ExprKind::Dict(dict) => dict
                .entries
                .iter()
                .flat_map(|entry| [&entry.key, &entry.value])
                .collect(),
            ExprKind::Paren(inner) => vec![inner.as_ref()],
            ExprKind::Unary { operand, .. } => vec![operand.as_ref()],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            ExprKind::Call(call) => std::iter::once(call.callee.as_ref())
                .chain(call.args.iter())
                .collect(),
            ExprKind::Dot { object, .. } => vec![object.as_ref()],
            ExprKind::Index { object, index } => vec![object.as_ref(), index.as_ref()],
            ExprKind::Conditional {
                then,
                cond,
                otherwise,
            } => vec![then.as_ref(), cond.as_ref(), otherwise.as_ref()],
            ExprKind::Assign { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            ExprKind::Comprehension(comp) => {
                let mut children = vec![&comp.body];
                children.extend(comp.value.as_ref());
                for clause in &comp.clauses {
                    match clause {
                        Clause::For { vars, iter } => {
                            children.extend(vars.iter());
                            children.push(iter);
                        }
                        Clause::If(cond) => children.push(cond),
                    }
                }
                children
            }
        }
    }

    /// Mutable direct sub-expressions, in source order.
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            ExprKind::Ident(_) | ExprKind::Literal(_) => Vec::new(),
            ExprKind::List(list) | ExprKind::Tuple(list) => list.elements.iter_mut().collect(),
            ExprKind::Dict(dict) => dict
                .entries
                .iter_mut()
                .flat_map(|entry| [&mut entry.key, &mut entry.value])
                .collect(),
            ExprKind::Paren(inner) => vec![inner.as_mut()],
            ExprKind::Unary { operand, .. } => vec![operand.as_mut()],
            ExprKind::Binary { lhs, rhs, .. } => vec![lhs.as_mut(), rhs.as_mut()],
            ExprKind::Call(call) => std::iter::once(call.callee.as_mut())
                .chain(call.args.iter_mut())
                .collect(),
            ExprKind::Dot { object, .. } => vec![object.as_mut()],
            ExprKind::Index { object, index } => vec![object.as_mut(), index.as_mut()],
            ExprKind::Conditional {
                then,
                cond,
                otherwise,
            } => vec![then.as_mut(), cond.as_mut(), otherwise.as_mut()],
            ExprKind::Assign { lhs, rhs, .. } => vec![lhs.as_mut(), rhs.as_mut()],
            ExprKind::Comprehension(comp) => {
                let Comprehension {
                    body,
                    value,
                    clauses,
                    ..
                } = comp.as_mut();
                let mut children = vec![body];
                children.extend(value.as_mut());
                for clause in clauses {
                    match clause {
                        Clause::For { vars, iter } => {
                            children.extend(vars.iter_mut());
                            children.push(iter);
                        }
                        Clause::If(cond) => children.push(cond),
                    }
                }
                children
            }
        }
    }

    /// Visit this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Mutably visit this node and every descendant, parents first.
    ///
    /// Children are collected after `f` returns, so a node replaced by `f`
    /// is descended into in its new shape.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        f(self);
        for child in self.children_mut() {
            child.walk_mut(f);
        }
    }

    /// Mutably visit every descendant first, then this node.
    pub fn walk_mut_post(&mut self, f: &mut impl FnMut(&mut Expr)) {
        for child in self.children_mut() {
            child.walk_mut_post(f);
        }
        f(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::new(
            ExprKind::Call(Call {
                callee: Box::new(Expr::ident(name)),
                args,
                end_comments: Vec::new(),
            }),
            Span::default(),
        )
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("back\\slash"), "\"back\\\\slash\"");
        assert_eq!(quote("line\nbreak\t"), "\"line\\nbreak\\t\"");
        assert_eq!(quote("\u{1}"), "\"\\x01\"");
        assert_eq!(quote("héllo"), "\"héllo\"");
    }

    #[test]
    fn test_string_lit_body() {
        let lit = StringLit {
            value: "x".to_string(),
            raw: "r'''x'''".to_string(),
            kind: StringKind::RawTriple,
            quote: '\'',
        };
        assert_eq!(lit.body(), "x");
        assert_eq!(StringLit::new("abc").body(), "abc");
    }

    #[test]
    fn test_keyword_accessors() {
        let mut expr = call(
            "go_library",
            vec![
                Expr::string("positional"),
                Expr::keyword("name", Expr::string("x")),
            ],
        );

        let call_ref = expr.as_call().unwrap();
        assert_eq!(call_ref.callee_name(), Some("go_library"));
        assert_eq!(
            call_ref.keyword("name").and_then(Expr::as_string),
            Some("x")
        );
        assert!(call_ref.keyword("srcs").is_none());
        assert!(!call_ref.has_splat());

        let value = expr.as_call_mut().unwrap().keyword_mut("name").unwrap();
        value.as_string_lit_mut().unwrap().set_value("y");
        assert_eq!(
            expr.as_call().unwrap().keyword("name").and_then(Expr::as_string),
            Some("y")
        );
    }

    #[test]
    fn test_has_splat() {
        let splat = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::StarStar,
                operand: Box::new(Expr::ident("kwargs")),
            },
            Span::default(),
        );
        let expr = call("rule", vec![splat]);
        assert!(expr.as_call().unwrap().has_splat());
    }

    #[test]
    fn test_walk_visits_dict_and_comprehension() {
        let dict = Expr::new(
            ExprKind::Dict(Dict {
                entries: vec![DictEntry {
                    key: Expr::string("k"),
                    value: Expr::ident("v"),
                    span: Span::default(),
                    trivia: Trivia::default(),
                }],
                end_comments: Vec::new(),
            }),
            Span::default(),
        );
        let comp = Expr::new(
            ExprKind::Comprehension(Box::new(Comprehension {
                curly: false,
                body: Expr::ident("x"),
                value: None,
                clauses: vec![
                    Clause::For {
                        vars: vec![Expr::ident("x")],
                        iter: dict,
                    },
                    Clause::If(Expr::ident("cond")),
                ],
            })),
            Span::default(),
        );

        let mut idents = Vec::new();
        comp.walk(&mut |e| {
            if let Some(name) = e.as_ident() {
                idents.push(name);
            }
            if let Some(s) = e.as_string() {
                idents.push(s);
            }
        });
        assert_eq!(idents, ["x", "x", "k", "v", "cond"]);
    }

    #[test]
    fn test_walk_mut_post_order() {
        let mut expr = Expr::list(vec![Expr::string("a"), Expr::string("b")]);
        let mut order = Vec::new();
        expr.walk_mut_post(&mut |e| {
            order.push(match &e.kind {
                ExprKind::List(_) => "list".to_string(),
                _ => e.as_string().unwrap_or_default().to_string(),
            });
        });
        assert_eq!(order, ["a", "b", "list"]);
    }

    #[test]
    fn test_is_multiline_literal() {
        let mut expr = Expr::string("a");
        assert!(!expr.is_multiline_literal());
        if let Some(lit) = expr.as_string_lit_mut() {
            lit.raw = "\"\"\"a\nb\"\"\"".to_string();
            lit.kind = StringKind::Triple;
        }
        assert!(expr.is_multiline_literal());
    }

    #[test]
    fn test_binary_precedence_order() {
        assert!(BinaryOp::Or.precedence() < BinaryOp::And.precedence());
        assert!(BinaryOp::In.precedence() < BinaryOp::Pipe.precedence());
        assert!(BinaryOp::Add.precedence() < BinaryOp::Mod.precedence());
        assert_eq!(BinaryOp::NotIn.to_string(), "not in");
    }
}
