#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn hxwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hxwire"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("hxwire should run")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be utf-8")
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).expect("stderr should be utf-8")
}

#[test]
fn encode_raw_compresses_null_runs() {
    let output = hxwire(&[
        "encode",
        "--json",
        r#"[1, null, null, "a b"]"#,
        "--format",
        "raw",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "ai1u2y5:a%20bh\n");
}

#[test]
fn encode_json_reports_length() {
    let output = hxwire(&["encode", "--json", r#"{"a": 1.5}"#, "--format", "json"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let report: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be JSON");
    assert_eq!(report["wire"], "oy1:ad1.5g");
    assert_eq!(report["length"], 10);
}

#[test]
fn encode_rejects_malformed_json() {
    let output = hxwire(&["encode", "--json", "{nope", "--format", "raw"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("parse JSON input"));
}

#[test]
fn decode_json_lists_every_value() {
    let output = hxwire(&["decode", "ai1nhy2:hiR0", "--format", "json"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let report: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("output should be JSON");
    assert_eq!(report["count"], 3);
    assert_eq!(report["values"][0]["kind"], "array");
    assert_eq!(report["values"][0]["value"], serde_json::json!([1, null]));
    assert_eq!(report["values"][2]["value"], "hi");
}

#[test]
fn decode_unknown_class_needs_dynamic_flag() {
    let output = hxwire(&["decode", "cy5:Pointy1:xi1g", "--format", "raw"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("class not found: Point"));

    let output = hxwire(&[
        "decode",
        "cy5:Pointy1:xi1g",
        "--dynamic-classes",
        "--format",
        "raw",
    ]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "{\"$class\":\"Point\",\"x\":1}\n");
}

#[test]
fn decode_exception_exits_with_failure() {
    let output = hxwire(&["decode", "xy4:boom"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("exception: boom"));
}

#[test]
fn decode_reads_stdin_and_ignores_trailing_newline() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hxwire"))
        .args(["decode", "--format", "raw"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("decode should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"oy1:ki7gd2.5\n")
        .expect("stdin should accept input");

    let output = child.wait_with_output().expect("decode should finish");
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "{\"k\":7}\n2.5\n");
}

#[test]
fn version_reports_package_version() {
    let output = hxwire(&["version"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        format!("hxwire {}\n", env!("CARGO_PKG_VERSION"))
    );
}
