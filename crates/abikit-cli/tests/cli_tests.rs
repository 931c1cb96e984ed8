//! CLI integration tests for abikit-cli
//!
//! Tests command parsing, output formatting, and config handling.

use std::path::Path;
use std::process::Command;

/// Helper to run the CLI with arguments, isolated from the user's config
fn run_abikit_in(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_abikit"))
        .args(args)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn run_abikit(args: &[&str]) -> std::process::Output {
    let home = tempfile::tempdir().unwrap();
    run_abikit_in(home.path(), args)
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn word(value: u64) -> String {
    format!("{:064x}", value)
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help() {
    let output = run_abikit(&["--help"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("abikit"));
    for command in ["selector", "encode", "decode", "call", "config"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn test_cli_version() {
    let output = run_abikit(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("abikit"));
}

// ==================== Selector Tests ====================

#[test]
fn test_selector_function() {
    let output = run_abikit(&["selector", "transfer(address,uint256)"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "0xa9059cbb");
}

#[test]
fn test_selector_event_json() {
    let output = run_abikit(&[
        "--json",
        "selector",
        "event Transfer(address indexed from, address indexed to, uint256 value)",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Invalid JSON");
    assert_eq!(json["kind"], "event");
    assert_eq!(json["signature"], "Transfer(address,address,uint256)");
    assert_eq!(
        json["topic"],
        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
}

#[test]
fn test_selector_constructor_rejected() {
    let output = run_abikit(&["selector", "constructor(uint256)"]);
    assert!(!output.status.success());
}

// ==================== Encode Tests ====================

#[test]
fn test_encode_function_call() {
    let output = run_abikit(&[
        "encode",
        "transfer(address,uint256)",
        "0x0000000000000000000000000000000000000001",
        "1000",
    ]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        format!("0xa9059cbb{}{}", word(1), word(1000))
    );
}

#[test]
fn test_encode_type_list() {
    let output = run_abikit(&["encode", "(uint256,bool)", "1", "true"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), format!("0x{}{}", word(1), word(1)));
}

#[test]
fn test_encode_packed() {
    let output = run_abikit(&["encode", "--packed", "(uint8,string)", "1", "hello"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "0x0168656c6c6f");
}

#[test]
fn test_encode_overflow_fails() {
    let output = run_abikit(&["--json", "encode", "(uint8)", "256"]);
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Invalid JSON");
    assert_eq!(json["success"], false);
}

#[test]
fn test_encode_arity_mismatch() {
    let output = run_abikit(&["encode", "transfer(address,uint256)", "0x01"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected 2 values"));
}

#[test]
fn test_encode_oversized_fixed_array_fails() {
    let output = run_abikit(&["--json", "encode", "(uint256[1125899906842624])", "[1]"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Invalid JSON");
    assert_eq!(json["success"], false);
}

// ==================== Decode Tests ====================

#[test]
fn test_decode_values() {
    let data = format!("0x{}{}{}{}", word(1), word(0x40), word(2), format!("{:0<64}", "6869"));
    let output = run_abikit(&["--json", "decode", "(uint256,string)", &data]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Invalid JSON");
    let values = json["values"].as_array().unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], "1");
    assert!(values[1].as_str().unwrap().contains("hi"));
}

#[test]
fn test_decode_junk_data() {
    let data = format!("0x{}{}", word(7), word(0));

    let strict = run_abikit(&["decode", "uint256", &data]);
    assert!(!strict.status.success());
    let stderr = String::from_utf8_lossy(&strict.stderr);
    assert!(stderr.contains("junk data"));

    let lenient = run_abikit(&["decode", "uint256", &data, "--allow-junk-data"]);
    assert!(lenient.status.success());
    assert_eq!(stdout(&lenient), "7");
}

#[test]
fn test_decode_invalid_hex() {
    let output = run_abikit(&["decode", "uint256", "0xzz"]);
    assert!(!output.status.success());
}

// ==================== Call Tests ====================

#[test]
fn test_call_requires_to() {
    let output = run_abikit(&["call", "totalSupply() returns (uint256)"]);
    assert!(!output.status.success());
}

#[test]
fn test_call_invalid_address() {
    let output = run_abikit(&["call", "--to", "0x1234", "totalSupply() returns (uint256)"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--to"));
}

#[test]
fn test_call_unreachable_node_json() {
    let output = run_abikit(&[
        "--json",
        "--rpc-url",
        "http://127.0.0.1:1",
        "call",
        "--to",
        "0x0000000000000000000000000000000000000001",
        "totalSupply() returns (uint256)",
    ]);
    assert!(!output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Error should be valid JSON");
    assert!(json.get("error").is_some());
    assert_eq!(json.get("success"), Some(&serde_json::Value::Bool(false)));
}

// ==================== Config Tests ====================

#[test]
fn test_config_show() {
    let output = run_abikit(&["config", "--show"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("RPC URL: http://localhost:8545"));
}

#[test]
fn test_config_set_rpc_persists() {
    let home = tempfile::tempdir().unwrap();

    let output = run_abikit_in(home.path(), &["config", "--set-rpc", "http://node.example:8545"]);
    assert!(output.status.success());
    assert!(home.path().join(".abikit").join("config.toml").exists());

    let output = run_abikit_in(home.path(), &["--json", "config", "--show"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Invalid JSON");
    assert_eq!(json["rpc_url"], "http://node.example:8545");
    assert_eq!(json["block"], "latest");
}

#[test]
fn test_global_rpc_url_flag() {
    let output = run_abikit(&["--json", "--rpc-url", "http://other:8545", "config", "--show"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("Invalid JSON");
    assert_eq!(json["rpc_url"], "http://other:8545");
}

// ==================== Error Output Tests ====================

#[test]
fn test_error_output_text() {
    let output = run_abikit(&["selector", "function f(uint7)"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.to_lowercase().contains("error"));
}
