//! Top-level statements and the [`File`] that owns them.

use log::trace;

use crate::{
    expr::{Call, Expr},
    rule::{Rule, RuleBuilder},
    span::Span,
    trivia::Trivia,
};

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub trivia: Trivia,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// An expression or assignment statement. Rules are calls here.
    Expr(Expr),
    /// `load("module", "symbol", alias = "symbol")`
    Load(Call),
    /// A standalone comment group; its comments live in `trivia.before`.
    CommentBlock,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            kind,
            span,
            trivia: Trivia::default(),
        }
    }

    /// The statement's expression, if it has one.
    pub fn expr(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Expr(expr) => Some(expr),
            StmtKind::Load(_) | StmtKind::CommentBlock => None,
        }
    }
}

/// A parsed BUILD file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct File {
    path: String,
    pub stmts: Vec<Stmt>,
    source_len: usize,
}

impl File {
    /// An empty in-memory file at the logical location `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stmts: Vec::new(),
            source_len: 0,
        }
    }

    /// A file built from parsed statements.
    pub fn from_stmts(path: impl Into<String>, stmts: Vec<Stmt>, source_len: usize) -> Self {
        Self {
            path: path.into(),
            stmts,
            source_len,
        }
    }

    /// Logical location, used by path-sensitive rewrites.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Byte length of the text the file was parsed from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Top-level rules whose kind is `kind`, or every rule when `kind` is empty.
    pub fn rules<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = Rule<'a>> + 'a {
        self.stmts
            .iter()
            .filter_map(Rule::from_stmt)
            .filter(move |rule| kind.is_empty() || rule.kind() == kind)
    }

    /// Append a rule built by `builder` as a new statement.
    pub fn push_rule(&mut self, builder: RuleBuilder) {
        let expr = builder.build();
        trace!(stmts = self.stmts.len(); "Appending rule");
        let mut stmt = Stmt::new(StmtKind::Expr(expr), Span::default());
        if !self.stmts.is_empty() {
            stmt.trivia.blank_lines_before = 1;
        }
        self.stmts.push(stmt);
    }

    /// Visit every expression of every statement, parents first.
    pub fn walk_exprs<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        for stmt in &self.stmts {
            match &stmt.kind {
                StmtKind::Expr(expr) => expr.walk(f),
                StmtKind::Load(call) => call.args.iter().for_each(|arg| arg.walk(f)),
                StmtKind::CommentBlock => {}
            }
        }
    }

    /// Mutably visit every expression of every statement, parents first.
    pub fn walk_exprs_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        for stmt in &mut self.stmts {
            match &mut stmt.kind {
                StmtKind::Expr(expr) => expr.walk_mut(f),
                StmtKind::Load(call) => call.args.iter_mut().for_each(|arg| arg.walk_mut(f)),
                StmtKind::CommentBlock => {}
            }
        }
    }
}
