//! Where lists may be reordered.

use buildfmt_core::{BinaryOp, Expr, ExprKind};

/// Attributes whose list values are order-insensitive for every rule kind.
///
/// Kept sorted for `binary_search`.
const SORTABLE_ATTRS: &[&str] = &[
    "data",
    "deps",
    "embed",
    "exported_deps",
    "exports",
    "hdrs",
    "implementation_deps",
    "resources",
    "runtime_deps",
    "srcs",
    "tags",
    "textual_hdrs",
    "visibility",
];

pub(super) fn is_sortable_attr(attr: &str) -> bool {
    SORTABLE_ATTRS.binary_search(&attr).is_ok()
}

/// Visit every list literal reachable from an attribute value.
///
/// Lists are reached through parentheses, `+` operands, the values of the
/// dict passed to `select` and the arguments of `glob`.
pub(super) fn for_each_list(value: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    if matches!(value.kind, ExprKind::List(_)) {
        f(value);
        return;
    }
    match &mut value.kind {
        ExprKind::Paren(inner) => for_each_list(inner, f),
        ExprKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } => {
            for_each_list(lhs, f);
            for_each_list(rhs, f);
        }
        ExprKind::Call(call) => match call.callee_name() {
            Some("select") => {
                if let Some(ExprKind::Dict(dict)) = call.args.first_mut().map(|arg| &mut arg.kind)
                {
                    for entry in &mut dict.entries {
                        for_each_list(&mut entry.value, f);
                    }
                }
            }
            Some("glob") => {
                for arg in &mut call.args {
                    if let Some((_, value)) = arg.as_keyword_mut() {
                        for_each_list(value, f);
                    } else {
                        for_each_list(arg, f);
                    }
                }
            }
            _ => {}
        },
        _ => {}
    }
}

/// Visit every string literal an attribute value holds directly or through a
/// reachable list.
pub(super) fn for_each_string(value: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    if value.as_string().is_some() {
        f(value);
        return;
    }
    match &mut value.kind {
        ExprKind::List(list) => {
            for element in &mut list.elements {
                if element.as_string().is_some() {
                    f(element);
                }
            }
        }
        ExprKind::Paren(inner) => for_each_string(inner, f),
        ExprKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        } => {
            for_each_string(lhs, f);
            for_each_string(rhs, f);
        }
        ExprKind::Call(call) if call.callee_name() == Some("select") => {
            if let Some(ExprKind::Dict(dict)) = call.args.first_mut().map(|arg| &mut arg.kind) {
                for entry in &mut dict.entries {
                    for_each_string(&mut entry.value, f);
                }
            }
        }
        _ => {}
    }
}
