use log::trace;

use buildfmt_core::{Expr, File};

use super::{RewriteContext, RewriteInfo, RewritePass, rule_calls};

/// Ordering weights of well-known attributes. Unlisted attributes weigh 0
/// and keep their relative order.
const PRIORITIES: &[(&str, i32)] = &[
    ("name", -99),
    ("gwt_name", -98),
    ("package_name", -97),
    ("visible_node_name", -96),
    ("size", -95),
    ("timeout", -94),
    ("testonly", -93),
    ("src", -92),
    ("srcdir", -91),
    ("srcs", -90),
    ("out", -89),
    ("outs", -88),
    ("hdrs", -87),
    ("has_services", -86),
    ("include", -85),
    ("of", -84),
    ("baseline", -83),
    ("destdir", 1),
    ("exports", 2),
    ("runtime_deps", 3),
    ("deps", 4),
    ("implementation", 5),
    ("implements", 6),
    ("alwayslink", 7),
];

fn priority(key: &str) -> i32 {
    PRIORITIES
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(0, |(_, weight)| *weight)
}

/// Stable-sorts the keyword arguments of every rule by [`PRIORITIES`].
///
/// Positional arguments stay where they are; keyword arguments are permuted
/// among the slots keywords already occupy. Calls with `*args` or `**kwargs`
/// are left alone.
pub(super) struct CallSortPass;

impl RewritePass for CallSortPass {
    fn name(&self) -> &'static str {
        "callsort"
    }

    fn apply(&self, file: &mut File, _ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        for (kind, call) in rule_calls(file) {
            if call.has_splat() {
                trace!(kind = kind.as_str(); "Skipping call with splat arguments");
                continue;
            }

            let slots: Vec<usize> = call
                .args
                .iter()
                .enumerate()
                .filter(|(_, arg)| arg.as_keyword().is_some())
                .map(|(i, _)| i)
                .collect();
            let keys: Vec<i32> = slots.iter().map(|&i| weight(&call.args[i])).collect();
            if keys.windows(2).all(|pair| pair[0] <= pair[1]) {
                continue;
            }

            let mut keywords: Vec<Expr> = Vec::with_capacity(slots.len());
            for &slot in slots.iter().rev() {
                keywords.push(call.args.remove(slot));
            }
            keywords.reverse();
            keywords.sort_by_key(weight);
            for (slot, keyword) in slots.into_iter().zip(keywords) {
                call.args.insert(slot, keyword);
            }

            let name = call
                .keyword("name")
                .and_then(Expr::as_string)
                .unwrap_or_default();
            info.record(self.name(), format!("{kind}({name})"));
        }
    }
}

fn weight(arg: &Expr) -> i32 {
    arg.as_keyword().map_or(0, |(key, _)| priority(key))
}
