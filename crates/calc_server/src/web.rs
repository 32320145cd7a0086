//! HTTP surface: the HTML form page and the JSON solve endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use calc_problem::{SolveError, Solver};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub solver: Solver,
}

impl AppState {
    pub fn new(solver: Solver) -> Self {
        Self { solver }
    }
}

/// Body of both `POST /` (form-encoded) and `POST /api/solve` (JSON).
#[derive(Debug, Deserialize)]
pub struct ProblemForm {
    #[serde(default)]
    pub problema: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(solve_form))
        .route("/api/solve", post(solve_api))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// What the user sees when solving fails. Execution errors already carry
/// their own prefix.
pub fn error_message(error: &SolveError) -> String {
    match error {
        SolveError::Ejecucion(_) => error.to_string(),
        other => format!("Error al procesar la solicitud: {}", other),
    }
}

async fn index() -> Html<String> {
    Html(render_page(&PageView::default()))
}

async fn solve_form(State(state): State<AppState>, Form(form): Form<ProblemForm>) -> Html<String> {
    let mut view = PageView {
        problema: form.problema.clone(),
        ..PageView::default()
    };
    match state.solver.prepare(&form.problema).await {
        Ok(prepared) => {
            // The script and explanation stay on the page when execution fails
            let codigo = prepared.script.to_string();
            let pasos = prepared.explanation.clone();
            match state.solver.execute(prepared) {
                Ok(solution) => {
                    view.resultado = Some(solution.latex);
                    view.codigo = Some(solution.script);
                    view.pasos = Some(solution.explanation);
                }
                Err(e) => {
                    info!(error = %e, "form request failed");
                    view.codigo = Some(codigo);
                    view.pasos = Some(pasos);
                    view.error = Some(error_message(&e));
                }
            }
        }
        Err(e) => {
            info!(error = %e, "form request failed");
            view.error = Some(error_message(&e));
        }
    }
    Html(render_page(&view))
}

/// 422 when the problem itself is at fault, 500 when the model or the
/// engine failed.
pub fn error_status(error: &SolveError) -> StatusCode {
    if error.is_user_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn solve_api(State(state): State<AppState>, Json(form): Json<ProblemForm>) -> Response {
    match state.solver.solve_problem(&form.problema).await {
        Ok(solution) => Json(solution).into_response(),
        Err(e) => (
            error_status(&e),
            Json(ErrorBody {
                error: error_message(&e),
            }),
        )
            .into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Default)]
struct PageView {
    problema: String,
    resultado: Option<String>,
    codigo: Option<String>,
    pasos: Option<String>,
    error: Option<String>,
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>Resolución de problemas de cálculo</title>
<script>
MathJax = { tex: { inlineMath: [['\\(', '\\)']] } };
</script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
textarea { width: 100%; }
pre { background: #f4f4f4; padding: 0.75rem; overflow-x: auto; }
.error { color: #b00020; }
</style>
</head>
<body>
<h1>Resolución de problemas de cálculo</h1>
"#;

fn render_page(view: &PageView) -> String {
    let mut html = String::from(PAGE_HEAD);
    html.push_str(&format!(
        "<form method=\"post\" action=\"/\">\n\
         <label for=\"problema\">Problema:</label>\n\
         <textarea id=\"problema\" name=\"problema\" rows=\"4\" required>{}</textarea>\n\
         <button type=\"submit\">Resolver</button>\n\
         </form>\n",
        escape_html(&view.problema)
    ));

    if let Some(error) = &view.error {
        html.push_str(&format!("<p class=\"error\">{}</p>\n", escape_html(error)));
    }
    if let Some(resultado) = &view.resultado {
        html.push_str(&format!(
            "<h2>Resultado</h2>\n<p class=\"resultado\">{}</p>\n",
            escape_html(resultado)
        ));
    }
    if let Some(codigo) = &view.codigo {
        html.push_str(&format!(
            "<h2>Código generado</h2>\n<pre>{}</pre>\n",
            escape_html(codigo)
        ));
    }
    if let Some(pasos) = &view.pasos {
        html.push_str(&format!(
            "<h2>Pasos</h2>\n<pre>{}</pre>\n",
            escape_html(pasos)
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(escape_html(r"\( x \to 0 \)"), r"\( x \to 0 \)");
    }

    #[test]
    fn test_error_message_prefix() {
        assert_eq!(
            error_message(&SolveError::OperacionNoReconocida),
            "Error al procesar la solicitud: No se reconoció el tipo de operación."
        );
        assert_eq!(
            error_message(&SolveError::Ejecucion("división por cero".into())),
            "Error al ejecutar el código: división por cero"
        );
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            error_status(&SolveError::SinExpresion),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&SolveError::Ejecucion("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_status(&SolveError::Modelo(calc_problem::LlmError::Empty)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_render_empty_page() {
        let html = render_page(&PageView::default());
        assert!(html.contains("name=\"problema\""));
        assert!(html.contains("MathJax-script"));
        assert!(!html.contains("<h2>"));
    }

    #[test]
    fn test_render_escapes_user_input() {
        let view = PageView {
            problema: "<b>x</b>".into(),
            error: Some("Error al procesar la solicitud: <i>".into()),
            ..PageView::default()
        };
        let html = render_page(&view);
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("<p class=\"error\">Error al procesar la solicitud: &lt;i&gt;</p>"));
    }
}
