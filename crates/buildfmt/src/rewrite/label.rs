//! Label shortening.
//!
//! `//a/b:b` and `@r//a/b:b` lose the target name that repeats the package
//! name, `@r//:r` becomes `@r`, and labels into the file's own package become
//! `:name`. Only attributes known to hold labels are touched.

use buildfmt_core::{File, StringKind};

use super::{RewriteContext, RewriteInfo, RewritePass, for_each_rule_attr, sortable};

/// Kept sorted for `binary_search`.
const LABEL_ATTRS: &[&str] = &[
    "actual",
    "data",
    "deps",
    "embed",
    "exported_deps",
    "exports",
    "hdrs",
    "implementation_deps",
    "plugins",
    "resources",
    "runtime_deps",
    "src",
    "srcs",
    "tests",
    "textual_hdrs",
    "toolchains",
];

pub(super) struct LabelPass;

impl RewritePass for LabelPass {
    fn name(&self) -> &'static str {
        "label"
    }

    fn apply(&self, file: &mut File, ctx: &RewriteContext<'_>, info: &mut RewriteInfo) {
        for_each_rule_attr(file, |_, attr, value| {
            if LABEL_ATTRS.binary_search(&attr).is_err() {
                return;
            }
            sortable::for_each_string(value, &mut |expr| {
                let Some(lit) = expr.as_string_lit_mut() else {
                    return;
                };
                if lit.kind != StringKind::Plain || lit.quote != '"' {
                    return;
                }
                if let Some(short) = shorten(&lit.value, ctx.package()) {
                    info.record(self.name(), format!("{} -> {short}", lit.value));
                    lit.set_value(short);
                }
            });
        });
    }
}

/// The shortest spelling of `label`, or `None` when it is already short.
fn shorten(label: &str, package: Option<&str>) -> Option<String> {
    let (repo, rest) = if label.starts_with('@') {
        label.split_once("//")?
    } else {
        ("", label.strip_prefix("//")?)
    };
    let (pkg, name) = rest.split_once(':')?;

    if repo.is_empty() && package == Some(pkg) {
        return Some(format!(":{name}"));
    }
    if !pkg.is_empty() && pkg.rsplit('/').next() == Some(name) {
        return Some(format!("{repo}//{pkg}"));
    }
    if pkg.is_empty() && !repo.is_empty() && repo.get(1..) == Some(name) {
        return Some(repo.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use buildfmt_parser::parse;

    use super::*;
    use crate::{config::RewriteConfig, format::format};

    fn run(path: &str, source: &str) -> (String, RewriteInfo) {
        let mut file = parse(path, source).unwrap();
        let config = RewriteConfig::default();
        let ctx = RewriteContext::new(path, &config);
        let mut info = RewriteInfo::default();
        LabelPass.apply(&mut file, &ctx, &mut info);
        (format(&file), info)
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("//a/b:b", None).as_deref(), Some("//a/b"));
        assert_eq!(shorten("@r//a/b:b", None).as_deref(), Some("@r//a/b"));
        assert_eq!(shorten("@r//:r", None).as_deref(), Some("@r"));
        assert_eq!(shorten("//pkg:x", Some("pkg")).as_deref(), Some(":x"));
        assert_eq!(shorten("//:x", Some("")).as_deref(), Some(":x"));
        assert_eq!(shorten("//pkg:pkg", Some("pkg")).as_deref(), Some(":pkg"));
        assert_eq!(shorten("@r//pkg:x", Some("pkg")), None);
        assert_eq!(shorten("//a/b:c", None), None);
        assert_eq!(shorten("//a/b", None), None);
        assert_eq!(shorten(":local", Some("pkg")), None);
        assert_eq!(shorten("@r", None), None);
        assert_eq!(shorten("file.go", None), None);
    }

    #[test]
    fn test_rewrites_label_attributes_only() {
        let (out, info) = run(
            "app/BUILD",
            r#"go_binary(
    name = "app",
    srcs = ["//app:main.go"],
    deps = ["//lib/util:util"] + select({"//conditions:default": ["@com_x//:com_x"]}),
    args = ["//lib/util:util"],
    visibility = ["//app:__subpackages__"],
)
"#,
        );

        assert_eq!(
            out,
            r#"go_binary(
    name = "app",
    srcs = [":main.go"],
    deps = ["//lib/util"] + select({"//conditions:default": ["@com_x"]}),
    args = ["//lib/util:util"],
    visibility = ["//app:__subpackages__"],
)
"#
        );
        assert_eq!(
            info.log(),
            [
                "label: //app:main.go -> :main.go",
                "label: //lib/util:util -> //lib/util",
                "label: @com_x//:com_x -> @com_x",
            ]
        );
    }

    #[test]
    fn test_no_package_outside_build_files() {
        let (_, info) = run("defs.bzl", "x_library(deps = [\"//defs:a\"])\n");
        assert!(info.is_empty());
    }
}
