//! Sorting of string lists.
//!
//! A list is cut into chunks at every element preceded by a comment or a
//! blank line, and at every element that is not a string. Each chunk of
//! strings is sorted on its own, so hand-made groups stay where they are.
//! The comments and blank line that open a chunk stay at its top.
//!
//! Strings compare label-aware: plain names first, then `:local` targets,
//! then `//absolute` labels, then `@repository` labels. Within a phase the
//! `:` and `.` separated components compare piecewise, so `//a:z` sorts
//! before `//a/b`.

use std::cmp::Ordering;

use log::trace;

use buildfmt_core::{Expr, ExprKind, File};

use super::{RewriteContext, RewriteInfo, RewritePass, for_each_rule_attr, sortable};

pub(super) struct ListSortPass;

impl RewritePass for ListSortPass {
    fn name(&self) -> &'static str {
        "listsort"
    }

    fn apply(&self, file: &mut File, ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        for_each_rule_attr(file, |kind, attr, value| {
            if !ctx.is_sortable(kind, attr) {
                return;
            }
            sortable::for_each_list(value, &mut |list| {
                if sort_list(list) {
                    info.record(self.name(), format!("{kind}.{attr}"));
                }
            });
        });
    }
}

/// Sort key of one string element.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey<'a> {
    phase: u8,
    components: Vec<&'a str>,
    value: &'a str,
}

impl<'a> SortKey<'a> {
    fn new(value: &'a str) -> Self {
        let phase = if value.starts_with(':') {
            1
        } else if value.starts_with("//") {
            2
        } else if value.starts_with('@') {
            3
        } else {
            0
        };
        Self {
            phase,
            components: value.split([':', '.']).collect(),
            value,
        }
    }
}

fn sort_key(expr: &Expr) -> SortKey<'_> {
    SortKey::new(expr.as_string().unwrap_or_default())
}

fn compare(a: &Expr, b: &Expr) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Sort the string chunks of a list display. Returns `true` if anything moved.
fn sort_list(list: &mut Expr) -> bool {
    let ExprKind::List(list) = &mut list.kind else {
        return false;
    };

    let mut changed = false;
    let mut start = 0;
    while start < list.elements.len() {
        if list.elements[start].as_string().is_none() {
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < list.elements.len() && continues_chunk(&list.elements[end]) {
            end += 1;
        }
        changed |= sort_chunk(&mut list.elements[start..end]);
        start = end;
    }
    changed
}

fn continues_chunk(element: &Expr) -> bool {
    element.as_string().is_some()
        && element.trivia.before.is_empty()
        && element.trivia.blank_lines_before == 0
}

fn sort_chunk(chunk: &mut [Expr]) -> bool {
    if chunk.windows(2).all(|pair| compare(&pair[0], &pair[1]) != Ordering::Greater) {
        return false;
    }
    trace!(len = chunk.len(); "Sorting list chunk");

    let Some(first) = chunk.first_mut() else {
        return false;
    };
    let before = std::mem::take(&mut first.trivia.before);
    let blank = std::mem::take(&mut first.trivia.blank_lines_before);

    chunk.sort_by(compare);

    if let Some(first) = chunk.first_mut() {
        first.trivia.before = before;
        first.trivia.blank_lines_before = blank;
    }
    true
}
