//! Gemini client against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use calc_llm::GeminiClient;
use calc_problem::{ExpressionModel, LlmError, Solver};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

fn answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [
            { "content": { "role": "model", "parts": [{ "text": text }] }, "finishReason": "STOP" }
        ]
    }))
}

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::builder("test-key")
        .endpoint(&server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn sends_prompt_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "¿derivada?" }] }]
        })))
        .respond_with(answer("x**2\n"))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server).extract_expression("¿derivada?").await.unwrap();
    assert_eq!(text, "x**2");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("x".repeat(400)))
        .mount(&server)
        .await;

    let err = client(&server).extract_expression("p").await.unwrap_err();
    match err {
        LlmError::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body.chars().count(), 323);
            assert!(body.ends_with("..."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_candidates_are_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server).extract_expression("p").await.unwrap_err();
    assert_eq!(err, LlmError::Empty);
}

#[tokio::test]
async fn malformed_body_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).extract_expression("p").await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(answer("x").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = GeminiClient::builder("test-key")
        .endpoint(&server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = client.extract_expression("p").await.unwrap_err();
    assert!(matches!(err, LlmError::Http(_)));
}

#[tokio::test]
async fn solver_falls_back_to_gemini() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(answer("```\nx^2 sin(x)\n```"))
        .expect(1)
        .mount(&server)
        .await;

    let solver = Solver::new().with_model(Arc::new(client(&server)));
    let solution = solver
        .solve_problem("Necesito derivar x al cuadrado multiplicado por el seno de x")
        .await
        .unwrap();
    assert_eq!(solution.expression, "x**2*sin(x)");
    assert_eq!(
        solution.output,
        "La derivada de x^2*sin(x) es: x^2*cos(x) + 2*x*sin(x)"
    );
}

#[tokio::test]
async fn key_stays_out_of_the_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(answer("x"))
        .mount(&server)
        .await;

    client(&server).extract_expression("p").await.unwrap();
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn transport_errors_do_not_reveal_the_key() {
    // Nothing listens on port 1.
    let client = GeminiClient::builder("SECRET-KEY-123")
        .endpoint("http://127.0.0.1:1")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let err = client.extract_expression("p").await.unwrap_err();
    assert!(matches!(err, LlmError::Http(_)));
    assert!(!err.to_string().contains("SECRET-KEY-123"));

    let solver = Solver::new().with_model(Arc::new(client));
    let err = solver
        .solve_problem("Necesito derivar el cubo de x")
        .await
        .unwrap_err();
    assert!(!err.to_string().contains("SECRET-KEY-123"));
}

#[tokio::test]
async fn key_given_in_a_full_url_is_not_reported() {
    let client = GeminiClient::builder("k")
        .endpoint("http://127.0.0.1:1/v1/models/m:generateContent?key=SECRET-KEY-123")
        .build()
        .unwrap();
    let err = client.extract_expression("p").await.unwrap_err();
    assert!(!err.to_string().contains("SECRET-KEY-123"));
}
