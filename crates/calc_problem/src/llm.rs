//! Language-model fallback for problems that state no explicit expression.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::SolveError;
use crate::expression::{clean_expression, format_expression, validate_expression};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("the model returned no text")]
    Empty,
    #[error("configuration error: {0}")]
    Config(String),
}

/// A model that can read a math problem and answer with its expression.
#[async_trait]
pub trait ExpressionModel: Send + Sync {
    /// Send `prompt` and return the raw text of the answer.
    async fn extract_expression(&self, prompt: &str) -> Result<String, LlmError>;

    /// Short identifier for logs.
    fn name(&self) -> &str {
        "model"
    }
}

/// The extraction prompt, with worked examples of the notation expected back.
pub fn build_extraction_prompt(problem: &str) -> String {
    format!(
        r#"
Del siguiente problema matemático:
"{problem}"

Extrae SOLO la expresión matemática usando ** para potencias y * para multiplicaciones explícitas.
Ejemplos:
- x^2 + 2x → x**2 + 2*x
- x^2 sin(x) → x**2*sin(x)
- e^x cos(x) → exp(x)*cos(x)
- ln(x) + x^2 → log(x) + x**2

Respuesta:
"#
    )
}

/// Strip the decoration models like to add around a bare answer: code
/// fences, a `Respuesta:` label, an `f(x) =` prefix.
pub fn sanitize_model_response(response: &str) -> String {
    let line = response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))
        .unwrap_or_default();

    let line = line
        .strip_prefix("Respuesta:")
        .or_else(|| line.strip_prefix("respuesta:"))
        .unwrap_or(line)
        .trim();
    let line = line.trim_matches('`').trim();
    let line = match line.split_once('=') {
        Some((lhs, rhs)) if lhs.trim().ends_with(')') || lhs.trim() == "y" => rhs.trim(),
        _ => line,
    };
    line.to_string()
}

/// Ask `model` for the expression in `problem`, then clean and validate it.
pub async fn extract_with_model(
    model: &dyn ExpressionModel,
    problem: &str,
) -> Result<String, SolveError> {
    let prompt = build_extraction_prompt(problem);
    let response = model.extract_expression(&prompt).await.map_err(|e| {
        warn!(model = model.name(), error = %e, "expression extraction failed");
        SolveError::Modelo(e)
    })?;
    debug!(model = model.name(), response = %response.trim(), "model answered");

    let expr = clean_expression(&format_expression(&sanitize_model_response(&response)));
    if expr.is_empty() {
        return Err(SolveError::Modelo(LlmError::Empty));
    }
    if !validate_expression(&expr) {
        return Err(SolveError::ExpresionInvalida(expr));
    }
    Ok(expr)
}
