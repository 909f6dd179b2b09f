//! Integration tests for the sidediff CLI tool.
//!
//! These tests verify the complete end-to-end behavior of the CLI,
//! including argument parsing, file processing, and output formatting.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::Builder;

/// Helper to create a Command for the sidediff binary
fn sidediff() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sidediff"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_identical_files_exit_0() {
    sidediff()
        .arg("tests/fixtures/identical_1.json")
        .arg("tests/fixtures/identical_2.json")
        .assert()
        .success()
        .code(0)
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_different_files_exit_1() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("age"));
}

#[test]
fn test_file_not_found_exit_2() {
    sidediff()
        .arg("tests/fixtures/nonexistent.json")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_modified_field_side_by_side() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--format=plain")
        .arg("--width=12")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("~ age: 30      │ age: 31"))
        .stdout(predicate::str::contains("city").not())
        .stdout(predicate::str::contains("Summary: 1 changed"));
}

#[test]
fn test_full_mode_shows_unchanged_fields() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--format=plain")
        .arg("--full")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("city"))
        .stdout(predicate::str::contains("name"));
}

#[test]
fn test_added_fields() {
    sidediff()
        .arg("tests/fixtures/added_old.json")
        .arg("tests/fixtures/added_new.json")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("email"))
        .stdout(predicate::str::contains("+ "))
        .stdout(predicate::str::contains("2 added"));
}

#[test]
fn test_removed_field() {
    sidediff()
        .arg("tests/fixtures/removed_old.json")
        .arg("tests/fixtures/removed_new.json")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("- deprecated: true"))
        .stdout(predicate::str::contains("1 removed"));
}

#[test]
fn test_nested_changes() {
    sidediff()
        .arg("tests/fixtures/nested_old.json")
        .arg("tests/fixtures/nested_new.json")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("\"light\""))
        .stdout(predicate::str::contains("\"dark\""));
}

#[test]
fn test_shape_change_is_removal_plus_addition() {
    sidediff()
        .arg("tests/fixtures/shape_old.json")
        .arg("tests/fixtures/shape_new.json")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("- port: 8080"))
        .stdout(predicate::str::contains("port: { 2 keys }"))
        .stdout(predicate::str::contains("Summary: 1 added, 1 removed"));
}

#[test]
fn test_sequence_changes() {
    sidediff()
        .arg("tests/fixtures/seq_old.yaml")
        .arg("tests/fixtures/seq_new.yaml")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"build\""))
        .stdout(predicate::str::contains("\"deploy\""))
        .stdout(predicate::str::contains("Summary: 1 added, 1 removed"));
}

#[test]
fn test_yaml_tags_are_shown_from_original() {
    sidediff()
        .arg("tests/fixtures/tagged_old.yaml")
        .arg("tests/fixtures/tagged_new.yaml")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("!timestamp 2024-01-01"))
        .stdout(predicate::str::contains("!timestamp 2024-02-01"));
}

#[test]
fn test_toml_documents() {
    sidediff()
        .arg("tests/fixtures/config_old.toml")
        .arg("tests/fixtures/config_new.toml")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("!datetime 2024-01-01T00:00:00Z"))
        .stdout(predicate::str::contains("9090"))
        .stdout(predicate::str::contains("Summary: 2 changed"));
}

#[test]
fn test_json_output_format() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--format=json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"records\""))
        .stdout(predicate::str::contains("\"stats\""))
        .stdout(predicate::str::contains("\"change\": \"changed\""));
}

#[test]
fn test_delta_output_format() {
    sidediff()
        .arg("tests/fixtures/seq_old.yaml")
        .arg("tests/fixtures/seq_new.yaml")
        .arg("--format=delta")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"_t\": \"a\""))
        .stdout(predicate::str::contains("\"_1\""));
}

#[test]
fn test_precomputed_delta() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--delta=tests/fixtures/modified_delta.json")
        .arg("--format=plain")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Summary: 1 changed"));
}

#[test]
fn test_delta_with_unknown_key_exit_2() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--delta=tests/fixtures/bad_delta.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("height"));
}

#[test]
fn test_delta_with_move_exit_2() {
    sidediff()
        .arg("tests/fixtures/seq_old.yaml")
        .arg("tests/fixtures/seq_new.yaml")
        .arg("--delta=tests/fixtures/move_delta.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_non_mapping_document_exit_2() {
    sidediff()
        .arg("tests/fixtures/not_a_document.json")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a mapping"));
}

#[test]
fn test_ignore_pattern() {
    sidediff()
        .arg("tests/fixtures/added_old.json")
        .arg("tests/fixtures/added_new.json")
        .arg("--format=plain")
        .arg("--ignore=email")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("email").not())
        .stdout(predicate::str::contains("1 added"));
}

#[test]
fn test_only_pattern() {
    sidediff()
        .arg("tests/fixtures/added_old.json")
        .arg("tests/fixtures/added_new.json")
        .arg("--format=plain")
        .arg("--only=age")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("age: 30"))
        .stdout(predicate::str::contains("email").not())
        .stdout(predicate::str::contains("Summary: 1 added"));
}

#[test]
fn test_verbose_flag() {
    sidediff()
        .arg("tests/fixtures/identical_1.json")
        .arg("tests/fixtures/identical_2.json")
        .arg("--verbose")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("parsing document"));
}

#[test]
fn test_quiet_flag() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--quiet")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Summary").not());
}

#[test]
fn test_help_flag() {
    sidediff()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Side-by-side structural diff"))
        .stdout(predicate::str::contains("FILE1"))
        .stdout(predicate::str::contains("FILE2"));
}

#[test]
fn test_version_flag() {
    sidediff()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sidediff"));
}

#[test]
fn test_max_value_length() {
    sidediff()
        .arg("tests/fixtures/added_old.json")
        .arg("tests/fixtures/added_new.json")
        .arg("--format=plain")
        .arg("--max-value-length=10")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"alice@..."));
}

#[test]
fn test_mixed_json_yaml() {
    sidediff()
        .arg("tests/fixtures/mixed.json")
        .arg("tests/fixtures/mixed.yaml")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_invalid_json_exit_2() {
    sidediff()
        .arg("tests/fixtures/invalid.json")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_unstructured_file_exit_2() {
    sidediff()
        .arg("tests/fixtures/invalid.txt")
        .arg("tests/fixtures/identical_1.json")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_stdin_document() {
    sidediff()
        .arg("-")
        .arg("tests/fixtures/modified_new.json")
        .arg("--input-format=json")
        .arg("--format=plain")
        .write_stdin(r#"{"name": "Alice", "age": 30, "city": "Paris"}"#)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Summary: 1 changed"));
}

#[test]
fn test_both_stdin_rejected() {
    sidediff()
        .arg("-")
        .arg("-")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("standard input"));
}

#[test]
fn test_temp_files_with_whitespace_option() {
    let mut old = Builder::new().suffix(".json").tempfile().unwrap();
    let mut new = Builder::new().suffix(".json").tempfile().unwrap();
    writeln!(old, r#"{{"motd": "hello   world"}}"#).unwrap();
    writeln!(new, r#"{{"motd": "hello world"}}"#).unwrap();

    sidediff()
        .arg(old.path())
        .arg(new.path())
        .assert()
        .code(1);

    sidediff()
        .arg(old.path())
        .arg(new.path())
        .arg("--ignore-whitespace")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_narrow_width_rejected() {
    sidediff()
        .arg("tests/fixtures/modified_old.json")
        .arg("tests/fixtures/modified_new.json")
        .arg("--width=2")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}
