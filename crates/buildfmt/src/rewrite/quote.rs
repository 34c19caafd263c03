use log::trace;

use buildfmt_core::{File, StringKind, StringLit};

use super::{RewriteContext, RewriteInfo, RewritePass};

/// Rewrites single-quoted string literals with double quotes.
pub(super) struct QuotePass;

impl RewritePass for QuotePass {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn apply(&self, file: &mut File, _ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        file.walk_exprs_mut(&mut |expr| {
            let line = expr.span.start().line();
            let Some(lit) = expr.as_string_lit_mut() else {
                return;
            };
            if lit.quote != '\'' {
                return;
            }
            let Some(raw) = requote(lit) else {
                trace!(raw = lit.raw.as_str(), line; "Keeping single quotes");
                return;
            };
            info.record(self.name(), format!("line {line}: {} -> {raw}", lit.raw));
            lit.raw = raw;
            lit.quote = '"';
        });
    }
}

/// Spelling of `lit` with double quotes, or `None` when its body cannot be
/// carried over without changing the value.
fn requote(lit: &StringLit) -> Option<String> {
    let body = lit.body();
    match lit.kind {
        StringKind::Plain => Some(format!("\"{}\"", plain_body(body))),
        StringKind::Raw if !body.contains('"') => Some(format!("r\"{body}\"")),
        StringKind::Triple if !body.contains('"') => Some(format!("\"\"\"{body}\"\"\"")),
        StringKind::RawTriple if !body.contains('"') => Some(format!("r\"\"\"{body}\"\"\"")),
        _ => None,
    }
}

/// Swap the escaping of the two quote characters in a plain string body.
fn plain_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out
}
