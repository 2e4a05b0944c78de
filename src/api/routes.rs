//! HTTP route handlers.

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, ConnectInfo, Query, State},
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use super::error::ApiError;
use super::rate_limit::RateLimiter;
use super::types::{HealthResponse, SolveQuery, SolveResponse};
use super::validate::{extract_credential, validate_request};
use crate::agent::Agent;
use crate::config::Config;
use crate::llm::LlmProvider;

const WELCOME: &str = "Welcome to the Text to Math Problem Solver API.";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub rate_limiter: RateLimiter,
    pub provider: Arc<dyn LlmProvider>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn LlmProvider>) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit.clone());
        Self {
            config,
            rate_limiter,
            provider,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/solve_question", post(solve_question))
        .route("/health", get(health))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span without the query string, which may carry the provider key.
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: WELCOME.to_string(),
    })
}

async fn solve_question(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    query: Result<Query<SolveQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SolveResponse>, ApiError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("solve_question", %request_id, %client);

    async move {
        let Query(query) = query.map_err(|rejection| {
            tracing::info!("Rejected malformed query string");
            ApiError::Validation(format!("Invalid query string: {}", rejection.body_text()))
        })?;
        let credential = extract_credential(&headers, &query);
        let request = validate_request(&body, credential).map_err(|e| {
            tracing::info!(error = %e, "Rejected invalid request");
            e
        })?;

        state
            .rate_limiter
            .check(&client)
            .await
            .map_err(|e| ApiError::RateLimited {
                retry_after_secs: e.retry_after.as_secs().max(1),
            })?;

        tracing::info!(question_chars = request.question.chars().count(), "Solving question");

        let llm = state
            .provider
            .connect(&request.credential)
            .map_err(|e| ApiError::Provider(e.to_string()))?;
        let agent = Agent::with_standard_tools(llm, &state.config)
            .map_err(|e| ApiError::Internal(format!("{:#}", e)))?;

        let run = agent.run(&request.question).await.map_err(|e| {
            tracing::error!(error = %e, "Agent run failed");
            ApiError::Provider(format!("{:#}", e))
        })?;

        tracing::info!(
            iterations = run.iterations,
            tool_calls = run.steps.len(),
            "Question solved"
        );
        Ok::<_, ApiError>(Json(SolveResponse { answer: run.answer }))
    }
    .instrument(span)
    .await
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(detail = %detail, "Handler panicked");
    ApiError::Internal(format!("Internal server error: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::llm::mock::{ScriptedLlm, ScriptedProvider};

    const CLIENT_A: ([u8; 4], u16) = ([10, 0, 0, 1], 40000);
    const CLIENT_B: ([u8; 4], u16) = ([10, 0, 0, 2], 40000);

    fn app_with(llm: ScriptedLlm) -> (Router, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new(llm));
        let state = Arc::new(AppState::new(Config::default(), provider.clone()));
        (router(state), provider)
    }

    fn answers(n: usize) -> ScriptedLlm {
        ScriptedLlm::new((0..n).map(|i| format!("Final Answer: answer {}", i)))
    }

    fn solve(uri: &str, body: &str, client: ([u8; 4], u16)) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .extension(ConnectInfo(SocketAddr::from(client)))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn question(client: ([u8; 4], u16)) -> Request<Body> {
        solve(
            "/solve_question?groq_api_key=gsk_test",
            r#"{"question": "What is the sum of 123 and 456?"}"#,
            client,
        )
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (app, _) = app_with(answers(0));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], WELCOME);
    }

    #[tokio::test]
    async fn solves_question() {
        let llm = ScriptedLlm::new([
            " I should add.\nAction: Calculator\nAction Input: 123 + 456",
            "```text\n123 + 456\n```",
            " I now know the final answer\nFinal Answer: The sum of 123 and 456 is 579.",
        ]);
        let (app, provider) = app_with(llm);
        let (status, body) = send(&app, question(CLIENT_A)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "The sum of 123 and 456 is 579.");
        assert_eq!(provider.connect_count(), 1);
    }

    #[tokio::test]
    async fn accepts_bearer_credential() {
        let (app, _) = app_with(answers(1));
        let mut request = solve(
            "/solve_question",
            r#"{"question": "What is 2 + 2?"}"#,
            CLIENT_A,
        );
        request
            .headers_mut()
            .insert("authorization", "Bearer gsk_test".parse().unwrap());
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "answer 0");
    }

    #[tokio::test]
    async fn out_of_range_questions_never_reach_provider() {
        let (app, provider) = app_with(answers(0));
        let too_long = format!(r#"{{"question": "{}"}}"#, "x".repeat(1001));
        for body in [r#"{"question": "  hi  "}"#.to_string(), too_long] {
            let (status, json) = send(
                &app,
                solve("/solve_question?groq_api_key=gsk_test", &body, CLIENT_A),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "Question must be between 5 and 1000 characters.");
        }
        assert_eq!(provider.connect_count(), 0);
    }

    #[tokio::test]
    async fn missing_credential_is_rejected() {
        let (app, provider) = app_with(answers(0));
        let (status, body) = send(
            &app,
            solve(
                "/solve_question",
                r#"{"question": "What is 2 + 2?"}"#,
                CLIENT_A,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Groq API Key is required.");
        assert_eq!(provider.connect_count(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let (app, _) = app_with(answers(0));
        let (status, body) = send(
            &app,
            solve("/solve_question?groq_api_key=gsk_test", "{\"question\": ", CLIENT_A),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON data"));
    }

    #[tokio::test]
    async fn provider_failure_is_500_with_detail() {
        let (app, _) = app_with(ScriptedLlm::failing("Invalid API Key"));
        let (status, body) = send(&app, question(CLIENT_A)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("Invalid API Key"));
    }

    #[tokio::test]
    async fn eleventh_request_is_rate_limited() {
        let (app, _) = app_with(answers(10));
        for _ in 0..10 {
            let (status, _) = send(&app, question(CLIENT_A)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, body) = send(&app, question(CLIENT_A)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Rate limit exceeded."));
    }

    #[tokio::test]
    async fn second_client_resets_first_clients_quota() {
        let (app, _) = app_with(answers(12));
        for _ in 0..10 {
            send(&app, question(CLIENT_A)).await;
        }
        let (status, _) = send(&app, question(CLIENT_A)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _) = send(&app, question(CLIENT_B)).await;
        assert_eq!(status, StatusCode::OK);

        // The table was cleared, so client A is admitted past its quota.
        let (status, _) = send(&app, question(CLIENT_A)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_query_string_is_json_400() {
        let (app, provider) = app_with(answers(0));
        let (status, body) = send(
            &app,
            solve(
                "/solve_question?groq_api_key=gsk_a&groq_api_key=gsk_b",
                r#"{"question": "What is 2 + 2?"}"#,
                CLIENT_A,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
        assert_eq!(provider.connect_count(), 0);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn request_logs_omit_query_credential() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(
                "math_solver=debug,tower_http=debug",
            ))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (app, _) = app_with(answers(1));
        let (status, _) = send(
            &app,
            solve(
                "/solve_question?groq_api_key=gsk_SUPERSECRET",
                r#"{"question": "What is 2 + 2?"}"#,
                CLIENT_A,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("/solve_question"));
        assert!(!logs.contains("gsk_SUPERSECRET"));
        assert!(!logs.contains("groq_api_key"));
    }

    #[test]
    fn panics_become_json_errors() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
