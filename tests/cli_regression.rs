// Regression tests for the lbir CLI: exit codes, miette diagnostics,
// and the export/tree output paths.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

const GOOD_PROGRAM: &str = "int64 foo(int64 x) {\n  y <- x + 1\n  return y\n}\n";

#[test]
fn parse_succeeds_on_a_valid_program() {
    let file = "tests/cli_good.lb";
    fs::write(file, GOOD_PROGRAM).unwrap();

    let mut cmd = Command::cargo_bin("lbir").unwrap();
    cmd.arg("parse").arg(file);
    cmd.assert().success().stdout(contains("ok: "));

    let _ = fs::remove_file(file);
}

#[test]
fn parse_reports_miette_diagnostics_on_error() {
    // Missing closing brace.
    let bad_file = "tests/cli_bad.lb";
    fs::write(bad_file, "int64 foo(int64 x) {\n  y <- x + 1\n").unwrap();

    let mut cmd = Command::cargo_bin("lbir").unwrap();
    cmd.arg("parse").arg(bad_file);
    cmd.assert().failure().stderr(contains("lbir::parse"));

    let _ = fs::remove_file(bad_file);
}

#[test]
fn parse_reports_io_errors_for_missing_files() {
    let mut cmd = Command::cargo_bin("lbir").unwrap();
    cmd.arg("parse").arg("tests/does_not_exist.lb");
    cmd.assert().failure().stderr(contains("lbir::io"));
}

#[test]
fn export_dot_writes_a_graphviz_file() {
    let file = "tests/cli_export.lb";
    let dot = "tests/cli_export.dot";
    fs::write(file, GOOD_PROGRAM).unwrap();

    let mut cmd = Command::cargo_bin("lbir").unwrap();
    cmd.arg("parse").arg(file).arg("--export-dot").arg(dot);
    cmd.assert().success();

    let rendered = fs::read_to_string(dot).unwrap();
    assert!(rendered.starts_with("digraph parse_tree"));
    assert!(rendered.contains("program"));
    assert!(rendered.contains("function"));

    let _ = fs::remove_file(file);
    let _ = fs::remove_file(dot);
}

#[test]
fn tree_prints_the_parse_tree_as_json() {
    let file = "tests/cli_tree.lb";
    fs::write(file, GOOD_PROGRAM).unwrap();

    let mut cmd = Command::cargo_bin("lbir").unwrap();
    cmd.arg("tree").arg(file);
    cmd.assert()
        .success()
        .stdout(contains("\"label\": \"program\"").and(contains("\"label\": \"op-assign\"")));

    let _ = fs::remove_file(file);
}

#[test]
fn check_reports_a_well_formed_grammar() {
    let mut cmd = Command::cargo_bin("lbir").unwrap();
    cmd.arg("check");
    cmd.assert().success().stdout(contains("grammar ok"));
}
