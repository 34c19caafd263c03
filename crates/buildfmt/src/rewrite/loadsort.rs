use log::trace;

use buildfmt_core::{Expr, File, StmtKind};

use super::{RewriteContext, RewriteInfo, RewritePass};

/// Sorts loaded symbols by the name they bind and drops repeated ones.
pub(super) struct LoadSortPass;

impl RewritePass for LoadSortPass {
    fn name(&self) -> &'static str {
        "loadsort"
    }

    fn apply(&self, file: &mut File, _ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        for stmt in &mut file.stmts {
            let StmtKind::Load(call) = &mut stmt.kind else {
                continue;
            };
            if call.args.len() < 2 {
                continue;
            }
            let module = call.args[0].as_string().unwrap_or_default().to_string();

            let mut symbols = call.args.split_off(1);
            let before: Vec<String> = symbols.iter().map(spelling).collect();

            symbols.sort_by(|a, b| local_name(a).cmp(local_name(b)));
            let mut seen: Vec<String> = Vec::with_capacity(symbols.len());
            symbols.retain(|symbol| {
                let key = spelling(symbol);
                if seen.contains(&key) && !symbol.trivia.has_comments() {
                    trace!(module = module.as_str(), symbol = key.as_str(); "Dropping repeated load symbol");
                    return false;
                }
                seen.push(key);
                true
            });

            let after: Vec<String> = symbols.iter().map(spelling).collect();
            call.args.append(&mut symbols);
            if before != after {
                info.record(self.name(), module);
            }
        }
    }
}

/// The name a load symbol binds in the loading file.
fn local_name(symbol: &Expr) -> &str {
    match symbol.as_keyword() {
        Some((alias, _)) => alias,
        None => symbol.as_string().unwrap_or_default(),
    }
}

/// `alias=symbol` or `symbol`, for comparing symbols exactly.
fn spelling(symbol: &Expr) -> String {
    match symbol.as_keyword() {
        Some((alias, value)) => format!("{alias}={}", value.as_string().unwrap_or_default()),
        None => symbol.as_string().unwrap_or_default().to_string(),
    }
}
