//! Schema Dereferencer CLI
//!
//! Command-line interface for dereferencing and checking component schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use schema_deref::{
    check_components, dereference_in, dereference_with, load_document, load_json,
    to_json_schema, validate, ComponentStatus, Components, Document, JsonSchema, ValidateError,
};

#[derive(Parser)]
#[command(name = "schema-deref")]
#[command(about = "Dereference OpenAPI / JSON Schema component schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print reference-free JSON Schema for one or all components
    Deref {
        /// Document holding components.schemas, $defs or definitions
        document: PathBuf,

        /// Component to dereference (all components if omitted)
        #[arg(long, short)]
        component: Option<String>,

        /// Print null for unresolvable components instead of failing
        #[arg(long)]
        best_effort: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check that every component dereferences
    Check {
        /// Document holding components.schemas, $defs or definitions
        document: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Only show failing components
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate a payload against a dereferenced component
    Validate {
        /// Document holding components.schemas, $defs or definitions
        document: PathBuf,

        /// Payload file to validate
        payload: PathBuf,

        /// Component to validate against
        #[arg(long, short)]
        component: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Deref {
            document,
            component,
            best_effort,
            output,
            pretty,
        } => run_deref(&document, component.as_deref(), best_effort, output, pretty),

        Commands::Check {
            document,
            format,
            quiet,
        } => run_check(&document, &format, quiet),

        Commands::Validate {
            document,
            payload,
            component,
            json,
        } => run_validate(&document, &payload, &component, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load(path: &Path) -> Result<Document, u8> {
    load_document(path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn find_component<'a>(components: &'a Components, name: &str) -> Result<&'a JsonSchema, u8> {
    components.get(name).ok_or_else(|| {
        eprintln!("Error: component '{}' not found in document", name);
        2u8
    })
}

/// Dereference one schema; `None` means best-effort absence.
fn deref_one(
    schema: &JsonSchema,
    components: &Components,
    best_effort: bool,
) -> Result<Option<Value>, u8> {
    if best_effort {
        return Ok(dereference_with(schema, components).map(|resolved| to_json_schema(&resolved)));
    }
    dereference_in(schema, components)
        .map(|resolved| Some(to_json_schema(&resolved)))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
}

fn run_deref(
    document: &Path,
    component: Option<&str>,
    best_effort: bool,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let Document { components } = load(document)?;

    let rendered = match component {
        Some(name) => {
            let schema = find_component(&components, name)?;
            deref_one(schema, &components, best_effort)?.unwrap_or(Value::Null)
        }
        None => {
            let mut all = Map::new();
            for (name, schema) in components.iter() {
                let value = deref_one(schema, &components, best_effort)?.unwrap_or(Value::Null);
                all.insert(name.to_string(), value);
            }
            Value::Object(all)
        }
    };

    let json_output = if pretty {
        serde_json::to_string_pretty(&rendered)
    } else {
        serde_json::to_string(&rendered)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_check(document: &Path, format: &str, quiet: bool) -> Result<(), u8> {
    let Document { components } = load(document)?;
    let report = check_components(&components);

    if format == "json" {
        let json_output = serde_json::to_string_pretty(&report).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", json_output);
    } else {
        if !quiet {
            println!("Checking {} ...\n", document.display());
        }

        for result in &report.results {
            match (&result.status, &result.diagnostic) {
                (ComponentStatus::Ok, _) => {
                    if !quiet {
                        println!("  \x1b[32m✓\x1b[0m {}", result.name);
                    }
                }
                (ComponentStatus::Error, diagnostic) => {
                    println!("  \x1b[31m✗\x1b[0m {}", result.name);
                    if let Some(diag) = diagnostic {
                        println!(
                            "    \x1b[31merror[{}]\x1b[0m: {} - {}",
                            diag.code, diag.path, diag.message
                        );
                    }
                }
            }
        }

        println!();
        if report.is_ok() {
            println!(
                "\x1b[32m✓ {} components checked, all resolved\x1b[0m",
                report.components_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} components checked: {} resolved, {} failed\x1b[0m",
                report.components_checked, report.passed, report.failed
            );
        }
    }

    if report.is_ok() {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_validate(
    document: &Path,
    payload_path: &Path,
    component: &str,
    json_output: bool,
) -> Result<(), u8> {
    let Document { components } = load(document)?;
    let schema = find_component(&components, component)?;

    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    match validate(schema, &components, &payload) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
