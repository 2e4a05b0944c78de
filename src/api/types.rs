//! API request and response types.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by `POST /solve_question`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolveQuery {
    /// Provider key (legacy transport; prefer the Authorization header)
    pub groq_api_key: Option<String>,
}

/// Successful solve response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResponse {
    pub answer: String,
}

/// Error body for every failure status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    pub message: String,
}
