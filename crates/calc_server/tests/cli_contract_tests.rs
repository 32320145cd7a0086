//! CLI contract tests: help output, API-key requirement and the one-shot
//! `solve` command.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// The CLI with a clean environment: no config file, no key.
#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("calc_server").unwrap();
    cmd.env("CALC_CONFIG", "/nonexistent/calc_config.toml")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("solve"));
}

#[test]
fn test_solve_help_shows_format() {
    cli()
        .args(["solve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("json"));
}

#[test]
fn test_missing_api_key_is_fatal() {
    cli()
        .args(["solve", "Calcula la derivada de x^2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));

    cli()
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_solve_text() {
    cli()
        .env("GOOGLE_API_KEY", "unused")
        .args(["solve", "Calcula la integral de 2x"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("La integral de 2*x es: x^2\n"))
        .stdout(predicate::str::contains("1. Tipo de operación: integral"));
}

#[test]
fn test_solve_json() {
    let output = cli()
        .env("GOOGLE_API_KEY", "unused")
        .args(["solve", "Calcula la derivada de x^2", "--format", "json"])
        .output()
        .expect("Failed to run CLI");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("Invalid JSON output");
    assert_eq!(json["operation"], "derivative");
    assert_eq!(json["output"], "La derivada de x^2 es: 2*x");
    assert!(json["script"]
        .as_str()
        .unwrap()
        .contains("resultado = diff(expr, x)"));
}

#[test]
fn test_unrecognized_problem_fails() {
    cli()
        .env("GOOGLE_API_KEY", "unused")
        .args(["solve", "Hola"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error al procesar la solicitud: No se reconoció el tipo de operación.",
        ));
}
