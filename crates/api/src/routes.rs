//! HTTP route handlers for the API.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query as QueryParams, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use brain_common::{AgentRole, FinalAnswer, Query, Turn};
use brain_coordinator::Workflow;
use brain_memory::MemoryStats;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::AppState;

const SERVICE_NAME: &str = "campaign-brain";
const DEFAULT_USER_ID: &str = "demo_user";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
}

impl ErrorResponse {
    pub fn bad_request(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            code,
        }
    }

    pub fn unauthorized(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: error.into(),
            code,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub agents_used: BTreeSet<AgentRole>,
    /// Seconds.
    pub execution_time: f64,
    pub needs_coordination: bool,
    pub warnings: Vec<String>,
}

/// Answer a question. Failed requests still return 200 with the apology text.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ErrorResponse> {
    if request.query.trim().is_empty() {
        return Err(ErrorResponse::bad_request("Query must not be empty", "EMPTY_QUERY"));
    }
    if request.user_id.trim().is_empty() {
        return Err(ErrorResponse::bad_request("user_id must not be empty", "EMPTY_USER_ID"));
    }

    info!(
        user_id = %request.user_id,
        query_preview = %request.query.chars().take(50).collect::<String>(),
        "Received query"
    );

    let outcome = state
        .orchestrator
        .process(&Query::new(request.query, request.user_id))
        .await;
    if outcome.is_error() {
        warn!(request_id = %outcome.request_id, "Request ended in error state");
    }

    Ok(Json(outcome.answer.into()))
}

impl From<FinalAnswer> for QueryResponse {
    fn from(answer: FinalAnswer) -> Self {
        let needs_coordination = answer.needs_coordination();
        Self {
            answer: answer.text,
            agents_used: answer.agents_used,
            execution_time: answer.execution_time_ms as f64 / 1000.0,
            needs_coordination,
            warnings: answer.warnings,
        }
    }
}

/// `{"workflow": "roi_analysis", "campaign_id": "FB_Q4_2024", "user_id": "..."}`
#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    #[serde(flatten)]
    pub workflow: Workflow,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

/// Run a prebuilt workflow. Unusable arguments are a 400; runtime failures
/// return 200 with the apology text, as for `/query`.
pub async fn run_workflow(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WorkflowRequest>,
) -> Result<Json<QueryResponse>, ErrorResponse> {
    if request.user_id.trim().is_empty() {
        return Err(ErrorResponse::bad_request("user_id must not be empty", "EMPTY_USER_ID"));
    }

    info!(user_id = %request.user_id, workflow = request.workflow.name(), "Received workflow");

    let outcome = state
        .orchestrator
        .run_workflow(&request.workflow, &request.user_id)
        .await
        .map_err(|e| ErrorResponse::bad_request(e.to_string(), "INVALID_WORKFLOW"))?;
    if outcome.is_error() {
        warn!(request_id = %outcome.request_id, "Workflow ended in error state");
    }

    Ok(Json(outcome.answer.into()))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
}

pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<ClearResponse> {
    let cleared = state.orchestrator.memory().clear(&user_id).await;
    Json(ClearResponse {
        status: if cleared {
            "cleared"
        } else {
            "no history to clear"
        },
    })
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Only turns containing this keyword.
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub interactions: Vec<Turn>,
    /// Turns retained for the user.
    pub total: usize,
}

/// Most recent turns, oldest first.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    QueryParams(params): QueryParams<HistoryParams>,
) -> Json<HistoryResponse> {
    let memory = state.orchestrator.memory();
    let interactions = match params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(keyword) => {
            let mut hits = memory.search(&user_id, keyword).await;
            let skip = hits.len().saturating_sub(params.limit);
            hits.drain(..skip);
            hits
        }
        None => memory.recent(&user_id, params.limit).await,
    };
    let total = memory.stats(&user_id).await.total_turns;
    debug!(user_id = %user_id, returned = interactions.len(), total, "History requested");

    Json(HistoryResponse {
        user_id,
        interactions,
        total,
    })
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<MemoryStats> {
    Json(state.orchestrator.memory().stats(&user_id).await)
}
