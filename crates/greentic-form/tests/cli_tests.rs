use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

const FIELDS: &str = r#"[
    { "id": "name", "type": "text", "required": true },
    { "id": "country", "type": "select" },
    { "id": "vat", "name": "billing.vat", "type": "text", "omitWhenHidden": true,
      "visibleWhen": [{ "field": "country", "is": ["BE"] }],
      "validWhen": { "matchesRegEx": { "pattern": "^BE[0-9]{10}$", "message": "Invalid VAT number" } } }
]"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn cli() -> Command {
    Command::cargo_bin("greentic-form").expect("binary built")
}

#[test]
fn snapshot_applies_events_in_order() {
    let temp = TempDir::new().expect("tempdir");
    let fields = write(temp.path(), "fields.json", FIELDS);
    let events = write(
        temp.path(),
        "events.json",
        r#"[
            { "event": "change", "id": "name", "value": "Ada" },
            { "event": "change", "id": "country", "value": "BE" },
            { "event": "change", "id": "vat", "value": "BE0123456789" }
        ]"#,
    );

    let output = cli()
        .arg("snapshot")
        .arg("--fields")
        .arg(&fields)
        .arg("--events")
        .arg(&events)
        .output()
        .expect("run snapshot");
    assert!(output.status.success());

    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(snapshot["isValid"], json!(true));
    assert_eq!(
        snapshot["value"],
        json!({ "name": "Ada", "country": "BE", "billing": { "vat": "BE0123456789" } })
    );
}

#[test]
fn snapshot_value_only_uses_external_values_and_options() {
    let temp = TempDir::new().expect("tempdir");
    let fields = write(temp.path(), "fields.json", FIELDS);
    let value = write(temp.path(), "value.json", r#"{ "name": "Grace", "country": "NL" }"#);
    let options = write(
        temp.path(),
        "options.json",
        r#"{ "country": [{ "items": ["BE", "NL"] }] }"#,
    );

    let output = cli()
        .args(["snapshot", "--value-only", "--pretty"])
        .arg("--fields")
        .arg(&fields)
        .arg("--value")
        .arg(&value)
        .arg("--options")
        .arg(&options)
        .output()
        .expect("run snapshot");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value, json!({ "name": "Grace", "country": "NL" }));
}

#[test]
fn validate_reports_errors_and_fails() {
    let temp = TempDir::new().expect("tempdir");
    let fields = write(temp.path(), "fields.json", FIELDS);
    let events = write(
        temp.path(),
        "events.json",
        r#"[
            { "event": "change", "id": "country", "value": "BE" },
            { "event": "change", "id": "vat", "value": "nope" }
        ]"#,
    );

    cli()
        .arg("validate")
        .arg("--fields")
        .arg(&fields)
        .arg("--events")
        .arg(&events)
        .assert()
        .failure()
        .stdout(predicate::str::contains("name: A value must be provided"))
        .stdout(predicate::str::contains("vat: Invalid VAT number"))
        .stderr(predicate::str::contains("form is invalid"));
}

#[test]
fn validate_passes_for_complete_forms() {
    let temp = TempDir::new().expect("tempdir");
    let fields = write(temp.path(), "fields.json", FIELDS);
    let value = write(temp.path(), "value.json", r#"{ "name": "Ada", "country": "NL" }"#);

    cli()
        .arg("validate")
        .arg("--fields")
        .arg(&fields)
        .arg("--value")
        .arg(&value)
        .assert()
        .success()
        .stdout(predicate::str::contains("form is valid"));
}

#[test]
fn config_file_disables_every_field() {
    let temp = TempDir::new().expect("tempdir");
    let fields = write(temp.path(), "fields.json", FIELDS);
    let config = write(temp.path(), "form.toml", "disabled = true\n");

    let output = cli()
        .arg("snapshot")
        .arg("--fields")
        .arg(&fields)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run snapshot");
    assert!(output.status.success());

    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("json output");
    let fields = snapshot["fields"].as_array().expect("fields array");
    assert!(fields.iter().all(|field| field["disabled"] == json!(true)));
}

#[test]
fn schema_command_prints_json_schema() {
    cli()
        .args(["schema", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("validWhen"));
}

#[test]
fn unreadable_inputs_fail_with_context() {
    let temp = TempDir::new().expect("tempdir");
    let fields = write(temp.path(), "fields.json", "{ not json");

    cli()
        .arg("snapshot")
        .arg("--fields")
        .arg(&fields)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid fields document"));
}
