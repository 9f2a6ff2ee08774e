use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// scenario_cli_convert
///
/// `spx convert` prints the decimal value or fails with the converter message.

fn spx() -> Command {
    Command::cargo_bin("spx").unwrap()
}

#[test]
fn converts_hex_octal_and_negative() {
    spx()
        .args(["convert", "--type", "int", "0x7fffffff"])
        .assert()
        .success()
        .stdout("2147483647\n");

    spx()
        .args(["convert", "--type", "short", "010"])
        .assert()
        .success()
        .stdout("8\n");

    spx()
        .args(["convert", "--type", "byte", "-0x80"])
        .assert()
        .success()
        .stdout("-128\n");
}

#[test]
fn out_of_range_fails() {
    spx()
        .args(["convert", "--type", "byte", "128"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot convert '128' to byte"));
}

#[test]
fn unknown_type_is_a_usage_error() {
    spx()
        .args(["convert", "--type", "long", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown value type 'long'"));
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c.yaml");
    std::fs::write(&path, "realms:\n  - id: core\ncontext_realm: core\n").unwrap();
    let path = path.to_string_lossy().to_string();

    spx()
        .args(["config-hash", &path])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("config_hash="))
        .stdout(predicate::str::contains(
            r#"{"context_realm":"core","realms":[{"id":"core"}]}"#,
        ));
}
