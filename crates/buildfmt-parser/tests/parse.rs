use buildfmt_core::{ExprKind, Literal, StmtKind, StringKind};
use buildfmt_parser::{ErrorCode, parse, parse_bytes};

#[test]
fn test_simple_rule() {
    let source = r#"
go_library(
    name = "server",
    srcs = ["main.go", "util.go"],
    deps = ["//lib:base"],
)
"#;

    let file = parse("cmd/server/BUILD", source).expect("Failed to parse");

    assert_eq!(file.path(), "cmd/server/BUILD");
    assert_eq!(file.source_len(), source.len());
    assert_eq!(file.stmts.len(), 1);

    let rule = file.rules("go_library").next().expect("rule");
    assert_eq!(rule.kind(), "go_library");
    assert_eq!(rule.name(), "server");
    assert_eq!(rule.attr_keys().collect::<Vec<_>>(), ["name", "srcs", "deps"]);
    assert_eq!(rule.span().start().line(), 2);
    assert_eq!(rule.span().end().line(), 6);

    let ExprKind::List(srcs) = &rule.attr("srcs").expect("srcs").kind else {
        panic!("Expected list");
    };
    let values: Vec<_> = srcs.elements.iter().filter_map(|e| e.as_string()).collect();
    assert_eq!(values, ["main.go", "util.go"]);
}

#[test]
fn test_load_and_rules() {
    let source = r#"load("@rules_go//go:def.bzl", "go_binary", lib = "go_library")

go_library(name = "a")

go_binary(
    name = "b",
    embed = [":a"],
)
"#;

    let file = parse("BUILD", source).expect("Failed to parse");

    assert_eq!(file.stmts.len(), 3);
    assert!(matches!(file.stmts[0].kind, StmtKind::Load(_)));
    assert_eq!(file.stmts[1].trivia.blank_lines_before, 1);
    assert_eq!(file.rules("").map(|r| r.name()).collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(file.rules("go_binary").count(), 1);
}

#[test]
fn test_positional_name_and_other_statements() {
    let source = r#"
package(default_visibility = ["//visibility:public"])

exports_files(["LICENSE"])

COPTS = ["-Wall"] + select({
    "//conditions:default": [],
})

cc_library("positional")
"#;

    let file = parse("BUILD", source).expect("Failed to parse");

    assert_eq!(file.stmts.len(), 4);
    assert_eq!(file.rules("package").next().map(|r| r.name()), Some(""));
    assert_eq!(file.rules("cc_library").next().map(|r| r.name()), Some("positional"));
    assert!(file.stmts[2].expr().and_then(|e| e.as_keyword()).is_some());
}

#[test]
fn test_string_forms_are_preserved() {
    let source = "a = 'single'\nb = r\"raw\\d\"\nc = \"\"\"doc\nstring\"\"\"\n";

    let file = parse("BUILD", source).expect("Failed to parse");

    let literals: Vec<_> = file
        .stmts
        .iter()
        .filter_map(|s| s.expr().and_then(|e| e.as_keyword()))
        .map(|(_, value)| match &value.kind {
            ExprKind::Literal(Literal::String(lit)) => lit.clone(),
            other => panic!("Expected string literal, found {other:?}"),
        })
        .collect();

    assert_eq!(literals[0].value, "single");
    assert_eq!(literals[0].raw, "'single'");
    assert_eq!(literals[0].quote, '\'');
    assert_eq!(literals[1].kind, StringKind::Raw);
    assert_eq!(literals[1].value, "raw\\d");
    assert_eq!(literals[2].kind, StringKind::Triple);
    assert_eq!(literals[2].value, "doc\nstring");
}

#[test]
fn test_comments_survive_parsing() {
    let source = r#"# Copyright header

# Library for the server.
go_library(
    name = "server",  # the name
    srcs = [
        # entry point
        "main.go",
    ],
    # trailing attribute comment
)
"#;

    let file = parse("BUILD", source).expect("Failed to parse");

    let mut comments = Vec::new();
    for stmt in &file.stmts {
        comments.extend(stmt.trivia.before.iter().map(|c| c.text().to_string()));
        comments.extend(stmt.trivia.suffix.iter().map(|c| c.text().to_string()));
    }
    file.walk_exprs(&mut |expr| {
        comments.extend(expr.trivia.before.iter().map(|c| c.text().to_string()));
        comments.extend(expr.trivia.suffix.iter().map(|c| c.text().to_string()));
        if let Some(call) = expr.as_call() {
            comments.extend(call.end_comments.iter().map(|c| c.text().to_string()));
        }
    });

    for expected in [
        "# Copyright header",
        "# Library for the server.",
        "# the name",
        "# entry point",
        "# trailing attribute comment",
    ] {
        assert!(
            comments.iter().any(|c| c == expected),
            "missing {expected:?} in {comments:?}"
        );
    }
}

#[test]
fn test_unterminated_string_error() {
    let err = parse("BUILD", "name = \"abc\nx = 1").expect_err("should fail");
    let diag = err.first().expect("diagnostic");

    assert_eq!(diag.code(), Some(ErrorCode::E001));
    let span = diag.primary_span().expect("span");
    assert_eq!(span.start().offset(), 7);
    assert_eq!(span.start().line(), 1);
    assert_eq!(span.start().column(), 8);
}

#[test]
fn test_truncated_input_error() {
    let err = parse("BUILD", "go_library(name=").expect_err("should fail");
    let diag = err.first().expect("diagnostic");

    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert_eq!(diag.primary_span().map(|s| s.start().offset()), Some(16));
    assert!(diag.labels().iter().any(|l| l.is_secondary()));
    assert!(err.to_string().starts_with("error[E101]"));
}

#[test]
fn test_unexpected_token_error() {
    let err = parse("BUILD", "x = [1, 2,, 3]\n").expect_err("should fail");
    let diag = err.first().expect("diagnostic");

    assert_eq!(diag.code(), Some(ErrorCode::E100));
    assert_eq!(diag.primary_span().map(|s| s.range()), Some(10..11));
}

/// Parse `source` on a thread with the stack size of a rayon worker.
fn parse_on_small_stack(source: String) -> Result<usize, ErrorCode> {
    std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(move || match parse("BUILD", &source) {
            Ok(file) => Ok(file.stmts.len()),
            Err(err) => Err(err.first().and_then(|d| d.code()).expect("error code")),
        })
        .expect("spawn parser thread")
        .join()
        .expect("parser thread panicked")
}

#[test]
fn test_deep_nesting_is_rejected() {
    assert_eq!(parse_on_small_stack("[".repeat(10_000)), Err(ErrorCode::E103));
    assert_eq!(
        parse_on_small_stack(format!("x = {}1\n", "-".repeat(10_000))),
        Err(ErrorCode::E103)
    );
    assert_eq!(
        parse_on_small_stack(format!("x = {}1\n", "1 + ".repeat(10_000))),
        Err(ErrorCode::E103)
    );
}

#[test]
fn test_moderate_nesting_is_accepted() {
    let lists = format!("x = {}1{}\n", "[".repeat(40), "]".repeat(40));
    assert_eq!(parse_on_small_stack(lists), Ok(1));

    let sum = format!("deps = {}[]\n", "[\"//a\"] + ".repeat(200));
    assert_eq!(parse_on_small_stack(sum), Ok(1));
}

#[test]
fn test_unsupported_statement_is_rejected() {
    let err = parse("BUILD", "def f():\n    pass\n").expect_err("should fail");
    assert_eq!(err.first().and_then(|d| d.code()), Some(ErrorCode::E100));
}

#[test]
fn test_invalid_utf8() {
    let err = parse_bytes("BUILD", b"x = \"\xff\"\n").expect_err("should fail");
    let diag = err.first().expect("diagnostic");

    assert_eq!(diag.code(), Some(ErrorCode::E007));
    assert_eq!(diag.primary_span().map(|s| s.range()), Some(5..6));

    let file = parse_bytes("BUILD", "x = \"ü\"\n".as_bytes()).expect("valid UTF-8");
    assert_eq!(file.stmts.len(), 1);
}

#[test]
fn test_empty_input() {
    let file = parse("BUILD", "").expect("Failed to parse");
    assert!(file.stmts.is_empty());

    let file = parse("BUILD", "\n\n   \n").expect("Failed to parse");
    assert!(file.stmts.is_empty());
}

mod proptest_tests {
    use buildfmt_parser::parse;
    use proptest::prelude::*;

    fn label() -> impl Strategy<Value = String> {
        "(//[a-z]{1,6})?:[a-z_]{1,8}"
    }

    fn rule_source() -> impl Strategy<Value = (String, String, Vec<String>)> {
        (
            "[a-z]{1,8}_(library|binary|test)",
            "[a-z][a-z0-9_]{0,10}",
            prop::collection::vec(label(), 0..6),
        )
    }

    proptest! {
        #[test]
        fn parse_never_panics(source in "\\PC{0,64}") {
            let _ = parse("BUILD", &source);
        }

        #[test]
        fn generated_rules_round_trip_their_attributes(
            (kind, name, deps) in rule_source(),
        ) {
            let deps_src = deps
                .iter()
                .map(|d| format!("        \"{d}\",\n"))
                .collect::<String>();
            let source = format!(
                "{kind}(\n    name = \"{name}\",\n    deps = [\n{deps_src}    ],\n)\n"
            );

            let file = parse("BUILD", &source).expect("generated source parses");
            let rule = file.rules(&kind).next().expect("rule");
            prop_assert_eq!(rule.name(), name.as_str());

            let parsed: Vec<_> = match &rule.attr("deps").expect("deps").kind {
                buildfmt_core::ExprKind::List(list) => list
                    .elements
                    .iter()
                    .filter_map(|e| e.as_string().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            prop_assert_eq!(parsed, deps);
        }
    }
}
