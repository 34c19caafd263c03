use buildfmt_core::{Expr, ExprKind, File};

use super::{RewriteContext, RewriteInfo, RewritePass, for_each_rule_attr, sortable};

/// Removes repeated strings from lists in sortable attributes.
///
/// The first occurrence survives. A later occurrence carrying comments is
/// kept so no comment is lost.
pub(super) struct DedupPass;

impl RewritePass for DedupPass {
    fn name(&self) -> &'static str {
        "dedup"
    }

    fn apply(&self, file: &mut File, ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        for_each_rule_attr(file, |kind, attr, value| {
            if !ctx.is_sortable(kind, attr) {
                return;
            }
            sortable::for_each_list(value, &mut |list| {
                for removed in dedup_list(list) {
                    info.record(self.name(), format!("{kind}.{attr}: {removed}"));
                }
            });
        });
    }
}

/// Drop repeated string elements of a list display, returning their values.
fn dedup_list(list: &mut Expr) -> Vec<String> {
    let ExprKind::List(list) = &mut list.kind else {
        return Vec::new();
    };

    let mut seen: Vec<String> = Vec::new();
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(list.elements.len());
    let mut carried_blank = 0;

    for mut element in list.elements.drain(..) {
        let Some(value) = element.as_string().map(str::to_string) else {
            element.trivia.blank_lines_before =
                element.trivia.blank_lines_before.max(carried_blank);
            carried_blank = 0;
            kept.push(element);
            continue;
        };
        if seen.contains(&value) && !element.trivia.has_comments() {
            carried_blank = carried_blank.max(element.trivia.blank_lines_before);
            removed.push(value);
            continue;
        }
        element.trivia.blank_lines_before = element.trivia.blank_lines_before.max(carried_blank);
        carried_blank = 0;
        seen.push(value);
        kept.push(element);
    }

    list.elements = kept;
    removed
}
