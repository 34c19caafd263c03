//! Canonical printer.
//!
//! [`format`] is a pure function from a [`File`] to text. Layout decisions are
//! made bottom-up: children are rendered first at the indentation they would
//! have if their parent expanded, then the parent decides between the
//! one-line and the one-item-per-line form.
//!
//! A parent expands when any of its items carries comments, when any rendered
//! item spans several lines, or when its context asks for it:
//!
//! - a statement-level call with two or more arguments;
//! - a list, tuple or dict with two or more elements in an attribute context.
//!
//! A call whose only argument is a positional one without comments hugs it,
//! so `glob([...])` and `select({...})` keep their brackets together.

use log::debug;

use buildfmt_core::{
    BinaryOp, Call, Clause, Comment, Comprehension, Expr, ExprKind, File, Literal, Stmt, StmtKind, Trivia,
    UnaryOp,
};

const INDENT: &str = "    ";

/// Whether containers with several elements expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Attribute values and the right-hand side of top-level assignments.
    Wide,
    Nested,
}

/// One rendered element of a bracketed sequence.
struct Item<'a> {
    text: String,
    trivia: &'a Trivia,
}

impl Item<'_> {
    fn forces_expansion(&self) -> bool {
        self.text.contains('\n') || self.trivia.has_comments()
    }

    fn blank_before(&self) -> bool {
        self.trivia.blank_lines_before > 0
    }
}

/// Print `file` in canonical form.
///
/// Non-empty output ends with exactly one newline; an empty file prints as
/// the empty string.
pub fn format(file: &File) -> String {
    debug!(path = file.path(), stmts = file.stmts.len(); "Formatting file");

    let mut out = String::with_capacity(file.source_len());
    for (i, stmt) in file.stmts.iter().enumerate() {
        if i > 0 && stmt.trivia.blank_lines_before > 0 {
            out.push('\n');
        }
        statement(&mut out, stmt);
    }
    out
}

fn push_comment_lines(out: &mut String, comments: &[Comment], indent: usize) {
    for comment in comments {
        push_indent(out, indent);
        out.push_str(comment.text());
        out.push('\n');
    }
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

fn push_suffix(out: &mut String, suffix: &[Comment]) {
    for comment in suffix {
        out.push_str("  ");
        out.push_str(comment.text());
    }
}

fn statement(out: &mut String, stmt: &Stmt) {
    push_comment_lines(out, &stmt.trivia.before, 0);

    let text = match &stmt.kind {
        StmtKind::CommentBlock => return,
        StmtKind::Load(call) => load(call),
        StmtKind::Expr(expr) => match &expr.kind {
            ExprKind::Call(call) => call_expr(call, 0, Context::Wide, true),
            ExprKind::Assign { lhs, op, rhs } => format!(
                "{} {} {}",
                target(lhs),
                op.as_str(),
                render(rhs, 0, Context::Wide)
            ),
            _ => render(expr, 0, Context::Nested),
        },
    };

    out.push_str(&text);
    push_suffix(out, &stmt.trivia.suffix);
    out.push('\n');
    push_comment_lines(out, &stmt.trivia.after, 0);
}

/// Assignment target; `a, b = ...` keeps its bare tuple.
fn target(lhs: &Expr) -> String {
    let ExprKind::Tuple(tuple) = &lhs.kind else {
        return render(lhs, 0, Context::Nested);
    };
    let items = elements(&tuple.elements, 0);
    let bare = tuple.bare
        && !items.is_empty()
        && tuple.end_comments.is_empty()
        && !items.iter().any(Item::forces_expansion);
    if !bare {
        return render(lhs, 0, Context::Nested);
    }

    let mut text = items
        .into_iter()
        .map(|item| item.text)
        .collect::<Vec<_>>()
        .join(", ");
    if tuple.elements.len() == 1 {
        text.push(',');
    }
    text
}

fn load(call: &Call) -> String {
    let items = call
        .args
        .iter()
        .map(|arg| Item {
            text: render(arg, 1, Context::Nested),
            trivia: &arg.trivia,
        })
        .collect();
    sequence("load(", ")", items, &call.end_comments, 0, false, false)
}

/// Render `expr` with its first line unindented and later lines indented
/// for nesting depth `indent`.
fn render(expr: &Expr, indent: usize, ctx: Context) -> String {
    match &expr.kind {
        ExprKind::Ident(name) => name.clone(),
        ExprKind::Literal(literal) => match literal {
            Literal::String(lit) => lit.raw.clone(),
            Literal::Int(text) | Literal::Float(text) => text.clone(),
            Literal::Bool(true) => "True".to_string(),
            Literal::Bool(false) => "False".to_string(),
        },
        ExprKind::List(list) => {
            let items = elements(&list.elements, indent);
            let wide = ctx == Context::Wide && list.elements.len() >= 2;
            sequence("[", "]", items, &list.end_comments, indent, wide, false)
        }
        ExprKind::Tuple(list) => {
            let items = elements(&list.elements, indent);
            let wide = ctx == Context::Wide && list.elements.len() >= 2;
            let single = list.elements.len() == 1;
            sequence("(", ")", items, &list.end_comments, indent, wide, single)
        }
        ExprKind::Dict(dict) => {
            let value_ctx = ctx;
            let items = dict
                .entries
                .iter()
                .map(|entry| Item {
                    text: format!(
                        "{}: {}",
                        render(&entry.key, indent + 1, Context::Nested),
                        render(&entry.value, indent + 1, value_ctx)
                    ),
                    trivia: &entry.trivia,
                })
                .collect();
            let wide = ctx == Context::Wide && dict.entries.len() >= 2;
            sequence("{", "}", items, &dict.end_comments, indent, wide, false)
        }
        ExprKind::Paren(inner) => format!("({})", render(inner, indent, ctx)),
        ExprKind::Unary { op, operand } => {
            let operand_text = render(operand, indent, Context::Nested);
            // `- -x`, not `--x`
            let gap = match (op, &operand.kind) {
                (
                    UnaryOp::Neg | UnaryOp::Pos,
                    ExprKind::Unary {
                        op: UnaryOp::Neg | UnaryOp::Pos,
                        ..
                    },
                ) => " ",
                _ => "",
            };
            format!("{}{gap}{operand_text}", op.as_str())
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let operand_ctx = match op {
                BinaryOp::Add => ctx,
                _ => Context::Nested,
            };
            format!(
                "{} {} {}",
                render(lhs, indent, operand_ctx),
                op.as_str(),
                render(rhs, indent, operand_ctx)
            )
        }
        ExprKind::Call(call) => call_expr(call, indent, ctx, false),
        ExprKind::Dot { object, name } => {
            format!("{}.{name}", render(object, indent, Context::Nested))
        }
        ExprKind::Index { object, index } => format!(
            "{}[{}]",
            render(object, indent, Context::Nested),
            render(index, indent, Context::Nested)
        ),
        ExprKind::Conditional {
            then,
            cond,
            otherwise,
        } => format!(
            "{} if {} else {}",
            render(then, indent, Context::Nested),
            render(cond, indent, Context::Nested),
            render(otherwise, indent, Context::Nested)
        ),
        ExprKind::Assign { lhs, op, rhs } => format!(
            "{} {} {}",
            render(lhs, indent, Context::Nested),
            op.as_str(),
            render(rhs, indent, ctx)
        ),
        ExprKind::Comprehension(comp) => comprehension(comp, indent),
    }
}

fn elements(elements: &[Expr], indent: usize) -> Vec<Item<'_>> {
    elements
        .iter()
        .map(|element| Item {
            text: render(element, indent + 1, Context::Nested),
            trivia: &element.trivia,
        })
        .collect()
}

fn comprehension(comp: &Comprehension, indent: usize) -> String {
    let (open, close) = if comp.curly { ("{", "}") } else { ("[", "]") };
    let mut text = String::from(open);
    text.push_str(&render(&comp.body, indent, Context::Nested));
    if let Some(value) = &comp.value {
        text.push_str(": ");
        text.push_str(&render(value, indent, Context::Nested));
    }
    for clause in &comp.clauses {
        match clause {
            Clause::For { vars, iter } => {
                let vars: Vec<_> = vars
                    .iter()
                    .map(|var| render(var, indent, Context::Nested))
                    .collect();
                text.push_str(&format!(
                    " for {} in {}",
                    vars.join(", "),
                    render(iter, indent, Context::Nested)
                ));
            }
            Clause::If(cond) => {
                text.push_str(" if ");
                text.push_str(&render(cond, indent, Context::Nested));
            }
        }
    }
    text.push_str(close);
    text
}

fn is_positional(arg: &Expr) -> bool {
    !matches!(
        arg.kind,
        ExprKind::Assign { .. }
            | ExprKind::Unary {
                op: UnaryOp::Star | UnaryOp::StarStar,
                ..
            }
    )
}

fn call_expr(call: &Call, indent: usize, ctx: Context, statement: bool) -> String {
    let head = render(&call.callee, indent, Context::Nested);

    if let [only] = call.args.as_slice() {
        if call.end_comments.is_empty() && is_positional(only) && !only.trivia.has_comments() {
            return format!("{head}({})", render(only, indent, ctx));
        }
    }

    let items = call
        .args
        .iter()
        .map(|arg| Item {
            text: render(arg, indent + 1, ctx),
            trivia: &arg.trivia,
        })
        .collect();
    let open = format!("{head}(");
    let wide = statement && call.args.len() >= 2;
    sequence(&open, ")", items, &call.end_comments, indent, wide, false)
}

/// Lay out a bracketed sequence on one line or one item per line.
fn sequence(
    open: &str,
    close: &str,
    items: Vec<Item<'_>>,
    end_comments: &[Comment],
    indent: usize,
    wide: bool,
    single_tuple: bool,
) -> String {
    let expand = wide || !end_comments.is_empty() || items.iter().any(Item::forces_expansion);

    if !expand {
        let texts: Vec<_> = items.into_iter().map(|item| item.text).collect();
        let trailing = if single_tuple { "," } else { "" };
        return format!("{open}{}{trailing}{close}", texts.join(", "));
    }

    let mut out = String::from(open);
    out.push('\n');
    for (i, item) in items.iter().enumerate() {
        // The blank line before an item is printed above the previous item's
        // trailing comments, where re-parsing finds it again
        if i > 0 && item.blank_before() && items[i - 1].trivia.after.is_empty() {
            out.push('\n');
        }

        let trivia = item.trivia;
        push_comment_lines(&mut out, &trivia.before, indent + 1);
        push_indent(&mut out, indent + 1);
        out.push_str(&item.text);
        out.push(',');
        push_suffix(&mut out, &trivia.suffix);
        out.push('\n');

        if !trivia.after.is_empty() && items.get(i + 1).is_some_and(Item::blank_before) {
            out.push('\n');
        }
        push_comment_lines(&mut out, &trivia.after, indent + 1);
    }
    push_comment_lines(&mut out, end_comments, indent + 1);
    push_indent(&mut out, indent);
    out.push_str(close);
    out
}
