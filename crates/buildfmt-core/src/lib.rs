//! # buildfmt core
//!
//! The syntax tree shared by the parser, the rewriter and the formatter.
//!
//! - [`span`]: byte offsets with line and column information
//! - [`trivia`]: comments and blank lines attached to nodes
//! - [`expr`]: the closed expression enum and its walkers
//! - [`file`]: statements and the [`File`] that owns them
//! - [`rule`]: rule queries ([`Rule`]) and construction ([`RuleBuilder`])

pub mod expr;
pub mod file;
pub mod rule;
pub mod span;
pub mod trivia;

pub use expr::{
    AssignOp, BinaryOp, Call, Clause, Comprehension, Dict, DictEntry, Expr, ExprKind, List,
    Literal, StringKind, StringLit, UnaryOp,
};
pub use file::{File, Stmt, StmtKind};
pub use rule::{NAME_SOURCES, NameSource, Rule, RuleBuilder};
pub use span::{LineIndex, Position, Span};
pub use trivia::{Comment, Trivia};
