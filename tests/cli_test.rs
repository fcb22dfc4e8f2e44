//! CLI integration tests for schema-deref binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("schema-deref"))
}

// Helper to create a temp file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const PETSTORE: &str = r##"{
    "components": {
        "schemas": {
            "Name": { "type": "string", "minLength": 1 },
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "$ref": "#/components/schemas/Name" },
                    "age": { "type": "integer" }
                }
            },
            "Dog": {
                "allOf": [
                    { "$ref": "#/components/schemas/Pet" },
                    { "type": "object", "properties": { "bark": { "type": "boolean" } } }
                ]
            }
        }
    }
}"##;

const BROKEN: &str = r##"{
    "components": {
        "schemas": {
            "Good": { "type": "boolean" },
            "Broken": {
                "type": "object",
                "properties": {
                    "owner": { "$ref": "#/components/schemas/Owner" }
                }
            }
        }
    }
}"##;

mod deref_command {
    use super::*;

    #[test]
    fn single_component() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);

        cmd()
            .args(["deref", doc.to_str().unwrap(), "--component", "Pet"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""type":"object""#))
            .stdout(predicate::str::contains(r#""name":{"type":"string","minLength":1}"#))
            .stdout(predicate::str::contains("$ref").not());
    }

    #[test]
    fn all_components() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);

        let output = cmd()
            .args(["deref", doc.to_str().unwrap()])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Name", "Pet", "Dog"]);
        assert_eq!(value["Dog"]["type"], "object");
        assert_eq!(value["Dog"]["properties"]["bark"]["type"], "boolean");
        assert_eq!(value["Dog"]["properties"]["name"]["type"], "string");
    }

    #[test]
    fn pretty_output() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);

        cmd()
            .args(["deref", doc.to_str().unwrap(), "-c", "Name", "--pretty"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"type\": \"string\""));
    }

    #[test]
    fn output_to_file() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);
        let out = dir.path().join("out.json");

        cmd()
            .args([
                "deref",
                doc.to_str().unwrap(),
                "-c",
                "Pet",
                "--output",
                out.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["properties"]["age"]["type"], "integer");
    }

    #[test]
    fn unresolvable_component_fails_strict() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BROKEN);

        cmd()
            .args(["deref", doc.to_str().unwrap(), "-c", "Broken"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("'Owner'"))
            .stderr(predicate::str::contains("#/properties/owner"));
    }

    #[test]
    fn best_effort_prints_null() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BROKEN);

        cmd()
            .args(["deref", doc.to_str().unwrap(), "--best-effort"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""Good":{"type":"boolean"}"#))
            .stdout(predicate::str::contains(r#""Broken":null"#));
    }

    #[test]
    fn unknown_component() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);

        cmd()
            .args(["deref", doc.to_str().unwrap(), "-c", "Cat"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("component 'Cat' not found"));
    }

    #[test]
    fn file_not_found() {
        cmd()
            .args(["deref", "/nonexistent/doc.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn invalid_json() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", "{ not json");

        cmd().args(["deref", doc.to_str().unwrap()]).assert().code(2);
    }

    #[test]
    fn external_reference_rejected() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r#"{ "$defs": { "Remote": { "$ref": "https://example.com/pet.json" } } }"#,
        );

        cmd().args(["deref", doc.to_str().unwrap()]).assert().code(2);
    }
}

mod check_command {
    use super::*;

    #[test]
    fn all_resolved() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("3 components checked, all resolved"));
    }

    #[test]
    fn failure_reported() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BROKEN);

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Broken"))
            .stdout(predicate::str::contains("error[missing-reference]"))
            .stdout(predicate::str::contains("1 resolved, 1 failed"));
    }

    #[test]
    fn quiet_hides_passing_components() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BROKEN);

        cmd()
            .args(["check", doc.to_str().unwrap(), "--quiet"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Good").not())
            .stdout(predicate::str::contains("Broken"));
    }

    #[test]
    fn json_format() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BROKEN);

        let output = cmd()
            .args(["check", doc.to_str().unwrap(), "--format", "json"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["components_checked"], 2);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["results"][1]["status"], "error");
        assert_eq!(report["results"][1]["diagnostic"]["path"], "#/properties/owner");
    }

    #[test]
    fn cyclic_component() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r##"{ "$defs": {
                "A": { "$ref": "#/$defs/B" },
                "B": { "$ref": "#/$defs/A" }
            } }"##,
        );

        cmd()
            .args(["check", doc.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("error[cyclic-reference]"));
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_payload() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);
        let payload = write_temp_file(&dir, "payload.json", r#"{"name": "Rex", "bark": true}"#);

        cmd()
            .args([
                "validate",
                doc.to_str().unwrap(),
                payload.to_str().unwrap(),
                "-c",
                "Dog",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_payload() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);
        let payload = write_temp_file(&dir, "payload.json", r#"{"name": ""}"#);

        cmd()
            .args([
                "validate",
                doc.to_str().unwrap(),
                payload.to_str().unwrap(),
                "-c",
                "Pet",
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"))
            .stderr(predicate::str::contains("/name"));
    }

    #[test]
    fn json_output() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);
        let payload = write_temp_file(&dir, "payload.json", r#"{"age": 3}"#);

        let output = cmd()
            .args([
                "validate",
                doc.to_str().unwrap(),
                payload.to_str().unwrap(),
                "-c",
                "Pet",
                "--json",
            ])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(result["valid"], false);
        assert_eq!(result["errors"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn json_output_valid() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);
        let payload = write_temp_file(&dir, "payload.json", r#"{"name": "Tom"}"#);

        cmd()
            .args([
                "validate",
                doc.to_str().unwrap(),
                payload.to_str().unwrap(),
                "-c",
                "Pet",
                "--json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"{"valid":true}"#));
    }

    #[test]
    fn nullable_all_of_accepts_null() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(
            &dir,
            "doc.json",
            r##"{ "components": { "schemas": {
                "Pet": { "type": "object", "properties": { "name": { "type": "string" } } },
                "Holder": { "allOf": [{ "$ref": "#/components/schemas/Pet" }], "nullable": true }
            } } }"##,
        );
        let payload = write_temp_file(&dir, "payload.json", "null");

        cmd()
            .args([
                "validate",
                doc.to_str().unwrap(),
                payload.to_str().unwrap(),
                "-c",
                "Holder",
            ])
            .assert()
            .success();
    }

    #[test]
    fn unresolvable_component() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", BROKEN);
        let payload = write_temp_file(&dir, "payload.json", r#"{}"#);

        cmd()
            .args([
                "validate",
                doc.to_str().unwrap(),
                payload.to_str().unwrap(),
                "-c",
                "Broken",
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("'Owner'"));
    }

    #[test]
    fn payload_not_found() {
        let dir = TempDir::new().unwrap();
        let doc = write_temp_file(&dir, "doc.json", PETSTORE);

        cmd()
            .args(["validate", doc.to_str().unwrap(), "/nonexistent.json", "-c", "Pet"])
            .assert()
            .code(3);
    }
}
