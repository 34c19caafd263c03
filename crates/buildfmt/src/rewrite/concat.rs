use buildfmt_core::{BinaryOp, Expr, ExprKind, File, List, StmtKind};

use super::{RewriteContext, RewriteInfo, RewritePass};

/// Collapses `+` between list displays and drops `+ []`.
pub(super) struct ConcatPass;

impl RewritePass for ConcatPass {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, file: &mut File, _ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        for stmt in &mut file.stmts {
            let StmtKind::Expr(expr) = &mut stmt.kind else {
                continue;
            };
            // Children first, so `[a] + [b] + [c]` folds completely
            expr.walk_mut_post(&mut |node| {
                let line = node.span.start().line();
                if let Some(change) = collapse(node) {
                    info.record(self.name(), format!("line {line}: {change}"));
                }
            });
        }
    }
}

/// A list display with no elements and no comments anywhere.
fn is_bare_empty(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::List(list) if list.elements.is_empty() && list.end_comments.is_empty())
        && !expr.trivia.has_comments()
}

fn is_mergeable(lhs: &Expr, rhs: &Expr) -> bool {
    let (ExprKind::List(left), ExprKind::List(_)) = (&lhs.kind, &rhs.kind) else {
        return false;
    };
    left.end_comments.is_empty() && !lhs.trivia.has_comments() && !rhs.trivia.has_comments()
}

/// Rewrite one `+` node in place, describing the change.
fn collapse(expr: &mut Expr) -> Option<&'static str> {
    let kind = std::mem::replace(&mut expr.kind, ExprKind::List(List::default()));
    let (lhs, rhs) = match kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } => (lhs, rhs),
        other => {
            expr.kind = other;
            return None;
        }
    };

    if is_mergeable(&lhs, &rhs) {
        let span = lhs.span.union(rhs.span);
        if let (ExprKind::List(mut left), ExprKind::List(right)) = (lhs.kind, rhs.kind) {
            left.elements.extend(right.elements);
            left.end_comments = right.end_comments;
            expr.kind = ExprKind::List(left);
            expr.span = span;
        }
        return Some("merged list concatenation");
    }

    let kept = if is_bare_empty(&rhs) {
        lhs
    } else if is_bare_empty(&lhs) {
        rhs
    } else {
        expr.kind = ExprKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        };
        return None;
    };

    let mut kept = *kept;
    let mut trivia = std::mem::take(&mut expr.trivia);
    trivia.absorb(std::mem::take(&mut kept.trivia));
    kept.trivia = trivia;
    *expr = kept;
    Some("removed concatenation with an empty list")
}
