//! Rewrite pipeline.
//!
//! A rewrite is a fixed, ordered list of passes. Every pass is a value
//! implementing [`RewritePass`]; [`rewrite`] runs the enabled ones once, in
//! order, and collects what they changed into a [`RewriteInfo`].
//!
//! | order | pass       | effect                                              |
//! |-------|------------|-----------------------------------------------------|
//! | 1     | `quote`    | single-quoted strings become double-quoted          |
//! | 2     | `concat`   | `[a] + [b]` becomes `[a, b]`; `x + []` becomes `x`  |
//! | 3     | `loadsort` | load symbols sorted by local name, duplicates gone  |
//! | 4     | `label`    | redundant label parts dropped                       |
//! | 5     | `callsort` | rule attributes ordered by a priority table         |
//! | 6     | `dedup`    | duplicate strings removed from sortable lists       |
//! | 7     | `listsort` | sortable string lists sorted                        |

mod callsort;
mod concat;
mod dedup;
mod label;
mod listsort;
mod loadsort;
mod quote;
mod sortable;

use std::fmt;

use log::{debug, trace};

use buildfmt_core::{Call, Expr, File, StmtKind};

use crate::config::RewriteConfig;

/// A named, independently toggleable tree transformation.
///
/// Implementations must be idempotent: applying a pass to its own output
/// changes nothing and records nothing.
pub trait RewritePass: Sync {
    /// The name used to disable the pass and to label its log entries.
    fn name(&self) -> &'static str;

    /// Rewrite `file` in place, recording one entry per changed node.
    fn apply(&self, file: &mut File, ctx: &RewriteContext<'_>, info: &mut RewriteInfo);
}

/// All passes, in the order they run.
static PASSES: &[&dyn RewritePass] = &[
    &quote::QuotePass,
    &concat::ConcatPass,
    &loadsort::LoadSortPass,
    &label::LabelPass,
    &callsort::CallSortPass,
    &dedup::DedupPass,
    &listsort::ListSortPass,
];

/// Names of all passes, in the order they run.
pub fn pass_names() -> impl Iterator<Item = &'static str> {
    PASSES.iter().map(|pass| pass.name())
}

/// Per-file inputs shared by all passes.
#[derive(Debug, Clone)]
pub struct RewriteContext<'a> {
    config: &'a RewriteConfig,
    package: Option<String>,
}

impl<'a> RewriteContext<'a> {
    /// Build the context for a file at logical location `path`.
    pub fn new(path: &str, config: &'a RewriteConfig) -> Self {
        Self {
            config,
            package: package_of(path),
        }
    }

    pub fn config(&self) -> &'a RewriteConfig {
        self.config
    }

    /// The package the file belongs to, when its path names a BUILD file.
    ///
    /// The root package is `""`.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Returns `true` if lists in `attr` of a `kind` rule may be reordered.
    pub fn is_sortable(&self, kind: &str, attr: &str) -> bool {
        sortable::is_sortable_attr(attr) || self.config.allows_sort(kind, attr)
    }
}

/// Package path of a BUILD file path: `a/b/BUILD` and `a/b/BUILD.bazel` give `a/b`.
fn package_of(path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let path = path.trim_start_matches("./");
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", path),
    };
    matches!(file, "BUILD" | "BUILD.bazel").then(|| dir.trim_matches('/').to_string())
}

/// One recorded change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteEntry {
    pass: &'static str,
    description: String,
}

impl RewriteEntry {
    pub fn pass(&self) -> &'static str {
        self.pass
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for RewriteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pass, self.description)
    }
}

/// The ordered change log of one [`rewrite`] call.
///
/// `Display` renders the short summary: the distinct pass names that changed
/// something, in order of first appearance, separated by spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteInfo {
    entries: Vec<RewriteEntry>,
}

impl RewriteInfo {
    /// Append a change made by `pass`.
    pub fn record(&mut self, pass: &'static str, description: impl Into<String>) {
        let entry = RewriteEntry {
            pass,
            description: description.into(),
        };
        trace!(entry:% = entry; "Recorded rewrite");
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RewriteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries rendered as `pass: description`, in recording order.
    pub fn log(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Distinct pass names, in order of first appearance.
    pub fn passes(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.pass) {
                names.push(entry.pass);
            }
        }
        names
    }
}

impl fmt::Display for RewriteInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.passes().join(" "))
    }
}

/// Run every enabled pass over `file`, once, in order.
pub fn rewrite(file: &mut File, config: &RewriteConfig) -> RewriteInfo {
    let ctx = RewriteContext::new(file.path(), config);
    let mut info = RewriteInfo::default();

    for pass in PASSES {
        if config.is_disabled(pass.name()) {
            debug!(pass = pass.name(); "Skipping disabled rewrite pass");
            continue;
        }
        let before = info.len();
        pass.apply(file, &ctx, &mut info);
        debug!(pass = pass.name(), changes = info.len() - before; "Applied rewrite pass");
    }
    info
}

/// The call of every top-level rule, with its kind.
pub(crate) fn rule_calls(file: &mut File) -> impl Iterator<Item = (String, &mut Call)> {
    file.stmts.iter_mut().filter_map(|stmt| {
        let StmtKind::Expr(expr) = &mut stmt.kind else {
            return None;
        };
        let call = expr.as_call_mut()?;
        let kind = call.callee_name()?.to_string();
        Some((kind, call))
    })
}

/// Visit `(kind, attribute, value)` for every keyword attribute of every rule.
pub(crate) fn for_each_rule_attr(file: &mut File, mut f: impl FnMut(&str, &str, &mut Expr)) {
    for (kind, call) in rule_calls(file) {
        for arg in &mut call.args {
            if let Some((key, value)) = arg.as_keyword_mut() {
                f(&kind, key, value);
            }
        }
    }
}
