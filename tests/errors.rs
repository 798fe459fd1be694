//! Error surface behavior: each failure kind through `-e`, plus batch
//! file mode.

use std::process::Command;
use tempfile::TempDir;

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_excalc"))
        .args(args)
        .output()
        .expect("failed to run excalc")
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8(output.stderr.clone())
        .expect("non-utf8 stderr")
        .trim()
        .to_string()
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8(output.stdout.clone())
        .expect("non-utf8 output")
        .trim()
        .to_string()
}

fn expect_error(expr: &str, fragment: &str) {
    let output = run(&["-e", expr]);
    assert!(
        !output.status.success(),
        "expected failure for {expr:?}, got stdout: {}",
        stdout(&output)
    );
    let err = stderr(&output);
    assert!(
        err.contains(fragment),
        "stderr for {expr:?} was {err:?}, expected to contain {fragment:?}"
    );
}

#[test]
fn unterminated_block_comment() {
    expect_error("1 + /* oops", "Unterminated block comment");
}

#[test]
fn syntax_error_is_distinct() {
    expect_error("1 +", "Syntax error");
    expect_error("(1 + 2", "Syntax error");
    expect_error("1 2", "Syntax error");
}

#[test]
fn recursion_limit_reported_with_hint() {
    let depth = 500;
    let mut expr = String::new();
    for _ in 0..depth {
        expr.push('(');
    }
    expr.push('1');
    for _ in 0..depth {
        expr.push(')');
    }
    let output = run(&["-e", &expr]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Expression nesting too deep"), "stderr: {err}");
    assert!(err.contains("hint"), "stderr: {err}");
}

#[test]
fn undeclared_identifier() {
    expect_error("frobnicate", "Undeclared identifier");
}

#[test]
fn unsupported_operation() {
    expect_error("'a' - 'b'", "Unsupported operation");
    expect_error("5(1)", "Unsupported operation");
}

#[test]
fn division_by_zero_from_backend() {
    expect_error("1/0", "division by zero");
    expect_error("1 /, 0", "division by zero");
}

#[test]
fn invalid_literal_digits() {
    expect_error("09", "Invalid numeric literal");
    expect_error("0b12", "Invalid numeric literal");
    expect_error("01x1f", "Invalid numeric literal");
}

#[test]
fn fractional_exponent_rejected() {
    expect_error("2 ** 0.5", "whole number");
}

#[test]
fn error_messages_carry_location() {
    let output = run(&["-e", "1 + $"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("at line 1, column 5"), "stderr: {err}");
}

#[test]
fn batch_file_mode_evaluates_whole_input() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.calc");
    std::fs::write(&path, "1 +\n2 * /* spread over lines */\n3\n").unwrap();
    let output = run(&[path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "7");
}

#[test]
fn batch_file_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.calc");
    std::fs::write(&path, "nope\n").unwrap();
    let output = run(&[path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Undeclared identifier"));
}

#[test]
fn missing_file_reports_and_exits() {
    let output = run(&["/definitely/not/here.calc"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot read"));
}

#[test]
fn exact_flag_with_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frac.calc");
    std::fs::write(&path, "1/3").unwrap();
    let output = run(&["--exact", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "1/3");
}
