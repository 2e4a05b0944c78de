//! Input validation for solve requests. Pure; no side effects.

use axum::http::{header, HeaderMap};
use serde_json::Value;

use super::error::ApiError;
use super::types::SolveQuery;
use crate::llm::Credential;

pub const MIN_QUESTION_CHARS: usize = 5;
pub const MAX_QUESTION_CHARS: usize = 1000;

/// A request that passed validation.
#[derive(Debug)]
pub struct ValidatedRequest {
    /// Question with surrounding whitespace removed
    pub question: String,
    pub credential: Credential,
}

/// Take the credential from `Authorization: Bearer` or, failing that, the
/// `groq_api_key` query parameter.
pub fn extract_credential(headers: &HeaderMap, query: &SolveQuery) -> Option<Credential> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(Credential::new)
        .or_else(|| query.groq_api_key.clone().and_then(Credential::new))
}

/// Validate a raw body plus the out-of-band credential.
pub fn validate_request(
    body: &[u8],
    credential: Option<Credential>,
) -> Result<ValidatedRequest, ApiError> {
    let data: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON data: {}", e)))?;

    let Some(fields) = data.as_object() else {
        return Err(ApiError::Validation(
            "Request body must be a JSON object.".to_string(),
        ));
    };

    let question = match fields.get("question") {
        None | Some(Value::Null) => return Err(required("Question")),
        Some(Value::String(q)) if q.is_empty() => return Err(required("Question")),
        Some(Value::String(q)) => q,
        Some(_) => {
            return Err(ApiError::Validation(
                "Question must be a string.".to_string(),
            ))
        }
    };

    let credential = credential.ok_or_else(|| required("Groq API Key"))?;

    let question = validate_question(question)?;

    Ok(ValidatedRequest {
        question,
        credential,
    })
}

/// Trim and length-check a question.
pub fn validate_question(question: &str) -> Result<String, ApiError> {
    let trimmed = question.trim();
    let len = trimmed.chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&len) {
        return Err(ApiError::Validation(format!(
            "Question must be between {} and {} characters.",
            MIN_QUESTION_CHARS, MAX_QUESTION_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

fn required(what: &str) -> ApiError {
    ApiError::Validation(format!("{} is required.", what))
}
