use buildfmt::{
    BuildFormatter, BuildfmtError, ErrorCode, File,
    config::{AppConfig, RewriteConfig},
};

fn formatter(rewrite: RewriteConfig) -> BuildFormatter {
    BuildFormatter::new(AppConfig { rewrite })
}

#[test]
fn test_canonical_text_round_trips() {
    let source = r#"# Server binary.

load("@rules_go//go:def.bzl", "go_binary", "go_library")

go_library(
    name = "server_lib",
    srcs = [
        "handler.go",
        "main.go",  # entry point
    ],
    importpath = "example.com/server",
    visibility = ["//visibility:private"],
    deps = [
        # keep sorted
        ":config",
        "//lib/log",
        "@com_github_pkg_errors//:errors",
    ],
)

go_binary(
    name = "server",
    embed = [":server_lib"],
)
"#;

    let processed = BuildFormatter::default()
        .process("cmd/server/BUILD", source)
        .expect("Failed to process");

    assert_eq!(processed.reformatted, source);
    assert_eq!(processed.formatted, source);
    assert!(processed.info.is_empty(), "{:?}", processed.info.log());
}

#[test]
fn test_formatting_is_idempotent() {
    let source = "cc_library(name='a',srcs=['x.cc','y.cc'],copts=['-O2'],\n\n\n deps=[':b',# why\n':c'])\nexports_files(['LICENSE'])";

    let formatter = formatter(RewriteConfig::default().with_disabled([
        "quote", "concat", "loadsort", "label", "callsort", "dedup", "listsort",
    ]));
    let once = formatter.process("BUILD", source).expect("first pass");
    let twice = formatter.process("BUILD", &once.formatted).expect("second pass");

    assert_ne!(once.formatted, source);
    assert_eq!(twice.formatted, once.formatted);
    assert_eq!(twice.reformatted, once.formatted);
}

#[test]
fn test_rewriting_is_idempotent() {
    let source = r#"go_test(
    deps = ["//b", '//a', "//b"] + [":c"] + [],
    srcs = ['b_test.go', 'a_test.go'],
    name = "t",
)
"#;

    let formatter = BuildFormatter::default();
    let first = formatter.process("pkg/BUILD", source).expect("first run");
    assert_eq!(first.info.to_string(), "quote concat callsort dedup listsort");

    let second = formatter.process("pkg/BUILD", &first.formatted).expect("second run");
    assert!(second.info.is_empty(), "{:?}", second.info.log());
    assert_eq!(second.formatted, first.formatted);
}

#[test]
fn test_sorting_scenario() {
    let processed = BuildFormatter::default()
        .process("BUILD", r#"go_library(name = "x", srcs = ["b.go", "a.go"])"#)
        .expect("Failed to process");

    assert_eq!(
        processed.formatted,
        "go_library(\n    name = \"x\",\n    srcs = [\n        \"a.go\",\n        \"b.go\",\n    ],\n)\n"
    );
    assert_eq!(processed.info.to_string(), "listsort");
}

#[test]
fn test_dedup_scenario() {
    let processed = BuildFormatter::default()
        .process("BUILD", r#"go_library(deps = ["//a", "//a", "//b"])"#)
        .expect("Failed to process");

    assert_eq!(
        processed.formatted,
        "go_library(\n    deps = [\n        \"//a\",\n        \"//b\",\n    ],\n)\n"
    );
    assert_eq!(processed.info.log(), ["dedup: go_library.deps: //a"]);
}

#[test]
fn test_selective_disabling() {
    let source = r#"go_library(deps = ["//b", "//a", "//b"])"#;

    let processed = formatter(RewriteConfig::default().with_disabled(["listsort"]))
        .process("BUILD", source)
        .expect("Failed to process");

    assert_eq!(
        processed.formatted,
        "go_library(\n    deps = [\n        \"//b\",\n        \"//a\",\n    ],\n)\n"
    );
    assert_eq!(processed.info.to_string(), "dedup");
}

#[test]
fn test_comments_are_preserved() {
    let source = r#"# header
load(":defs.bzl", "rule")  # load

# before
rule(
    # the name
    name = "x",  # suffix
    srcs = [
        "a",
        # last
    ],
    # end of call
)

# trailing
"#;

    let processed = BuildFormatter::default()
        .process("BUILD", source)
        .expect("Failed to process");

    for comment in [
        "# header",
        "# load",
        "# before",
        "# the name",
        "# suffix",
        "# last",
        "# end of call",
        "# trailing",
    ] {
        assert!(
            processed.formatted.contains(comment),
            "{comment} lost in:\n{}",
            processed.formatted
        );
    }
}

#[test]
fn test_malformed_input_scenario() {
    let err = BuildFormatter::default()
        .process("pkg/BUILD", "go_library(name=")
        .expect_err("should fail");

    let BuildfmtError::Parse { err, src, path } = err else {
        panic!("Expected parse error");
    };
    assert_eq!(path, "pkg/BUILD");
    assert_eq!(src, "go_library(name=");

    let diag = err.first().expect("diagnostic");
    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert_eq!(diag.primary_span().map(|s| s.start().offset()), Some(16));
    assert!(diag.message().contains("unclosed `(`"));
}

#[test]
fn test_name_resolution_prefers_keyword() {
    let formatter = BuildFormatter::default();
    let file = formatter
        .parse("BUILD", r#"cc_library("positional", name = "keyword")"#)
        .expect("Failed to parse");

    let rule = file.rules("cc_library").next().expect("rule");
    assert_eq!(rule.name(), "keyword");
}

#[test]
fn test_process_bytes_rejects_invalid_utf8() {
    let err = BuildFormatter::default()
        .process_bytes("BUILD", b"x = \"\xfe\"\n")
        .expect_err("should fail");

    assert!(matches!(
        err,
        BuildfmtError::Parse { ref err, .. } if err.first().and_then(|d| d.code()) == Some(ErrorCode::E007)
    ));
}

#[test]
fn test_processing_is_deterministic_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<File>();
    assert_send_sync::<RewriteConfig>();
    assert_send_sync::<BuildFormatter>();

    let sources = [
        ("a/BUILD", "go_library(name='a', srcs=['z.go', 'y.go'] + [], deps=['//a:b', '//c'])"),
        ("b/BUILD.bazel", "load(':x.bzl', 'b', 'a', 'a')\ncc_library(deps = [':z', ':z', '@r//:r'], name = 'b')"),
        ("c/BUILD", "# header\n\nx = [3, 1, 2]\nexports_files(['LICENSE', 'COPYING'])\n"),
        ("d/BUILD", "py_test(\n    name = \"t\",  # test\n    srcs = glob([\"*.py\"]) + [\"b.py\", \"a.py\"],\n)\n"),
    ];
    let formatter = BuildFormatter::default();

    let sequential: Vec<_> = sources
        .iter()
        .map(|(path, source)| formatter.process(path, source).expect("sequential run"))
        .collect();

    for _ in 0..4 {
        let concurrent: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|&(path, source)| {
                    let formatter = &formatter;
                    scope.spawn(move || formatter.process(path, source))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("worker panicked").expect("concurrent run"))
                .collect()
        });
        assert_eq!(concurrent, sequential);
    }

    let again = formatter.process(sources[0].0, sources[0].1).expect("repeated run");
    assert_eq!(again, sequential[0]);
}

mod proptest_tests {
    use buildfmt::BuildFormatter;
    use proptest::prelude::*;

    fn string_item() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,6}\\.go",
            ":[a-z_]{1,6}",
            "//[a-z]{1,4}(/[a-z]{1,4})?(:[a-z]{1,4})?",
            "@[a-z]{1,4}//[a-z]{0,4}:[a-z]{1,4}",
        ]
        .prop_map(|value| format!("'{value}'"))
    }

    fn attribute() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just("srcs"), Just("deps"), Just("data"), Just("args"), Just("copts")],
            prop::collection::vec(string_item(), 0..5),
            any::<bool>(),
        )
            .prop_map(|(key, items, comment)| {
                let note = if comment { "  # note\n" } else { "\n" };
                format!("{key}=[{}],{note}", items.join(","))
            })
    }

    fn rule_source() -> impl Strategy<Value = String> {
        (
            "[a-z]{2,6}_(library|binary|test)",
            "[a-z]{1,8}",
            prop::collection::vec(attribute(), 0..4),
        )
            .prop_map(|(kind, name, attrs)| format!("{kind}({}name='{name}',\n)\n", attrs.concat()))
    }

    proptest! {
        #[test]
        fn format_is_a_fixed_point(sources in prop::collection::vec(rule_source(), 1..4)) {
            let source = sources.join("\n");
            let formatter = BuildFormatter::default();

            let once = formatter.process("pkg/BUILD", &source).expect("generated source parses");
            let twice = formatter.process("pkg/BUILD", &once.formatted).expect("output parses");

            prop_assert_eq!(&twice.reformatted, &once.formatted);
            prop_assert_eq!(&twice.formatted, &once.formatted);
            prop_assert!(twice.info.is_empty(), "{:?}", twice.info.log());
        }
    }
}
