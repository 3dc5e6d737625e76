//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::protocol::{
    CopilotRequest, CopilotResponse, ErrorResponse, HealthResponse, UpdateContentRequest,
    UpdateContentResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use portfolio_copilot_core::domain::{CommitReceipt, UpdateRequest};
use portfolio_copilot_core::ports::PortError;
use portfolio_copilot_core::DialogueReply;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        copilot_handler,
        agent_handler,
        update_content_handler,
        health_handler,
    ),
    components(
        schemas(
            CopilotRequest,
            CopilotResponse,
            UpdateContentRequest,
            UpdateContentResponse,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "Portfolio Copilot API", description = "Conversational and direct updates to a portfolio website.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Failure Helpers
//=========================================================================================

pub const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

type Failure = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> Failure {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn internal_error() -> Failure {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(GENERIC_FAILURE)),
    )
}

fn publish_failure(e: &PortError) -> Failure {
    let status = match e {
        PortError::Conflict(_) => StatusCode::CONFLICT,
        PortError::SectionNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PortError::NotFound(_) | PortError::Timeout(_) | PortError::Upstream(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, Json(ErrorResponse::with_code(e.to_string(), e.code())))
}

/// Validates a chat payload and resolves the user it belongs to.
fn read_message(
    state: &AppState,
    payload: Result<Json<CopilotRequest>, JsonRejection>,
) -> Result<(String, String), Failure> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat payload: {}", rejection.body_text());
        bad_request("Invalid JSON request")
    })?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(bad_request("No message provided"));
    }
    let user_id = request
        .user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.config.default_user_id.clone());
    Ok((user_id, message.to_string()))
}

fn published_message(receipt: &CommitReceipt) -> String {
    match receipt.commit_url.as_deref() {
        Some(url) => format!(
            "Your {} section has been updated! You can see the change here: {}",
            receipt.section, url
        ),
        None => format!(
            "Your {} section has been updated! (commit {})",
            receipt.section, receipt.commit_sha
        ),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Send one message to the guided question-and-answer copilot.
///
/// A message containing "add project" or "add work experience" starts a
/// workflow; later messages answer its questions one at a time.
#[utoipa::path(
    post,
    path = "/copilot",
    request_body = CopilotRequest,
    responses(
        (status = 200, description = "The next prompt, guidance, or a publish confirmation", body = CopilotResponse),
        (status = 400, description = "Malformed JSON or an empty message", body = ErrorResponse),
        (status = 502, description = "All answers were collected but publishing failed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn copilot_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CopilotRequest>, JsonRejection>,
) -> Result<Json<CopilotResponse>, Failure> {
    let (user_id, message) = read_message(&app_state, payload)?;

    match app_state.dialogue.handle(&user_id, &message).await {
        Ok(DialogueReply::Guidance(text)) | Ok(DialogueReply::Prompt(text)) => {
            Ok(Json(CopilotResponse { response: text }))
        }
        Ok(DialogueReply::Published(receipt)) => Ok(Json(CopilotResponse {
            response: published_message(&receipt),
        })),
        Ok(DialogueReply::PublishFailed(e)) => {
            let (_, body) = publish_failure(&e);
            Err((StatusCode::BAD_GATEWAY, body))
        }
        Err(e) => {
            error!(user_id = %user_id, "Copilot turn failed: {}", e);
            Err(internal_error())
        }
    }
}

/// Send one message to the model-driven agent, which may call the
/// `add_project` or `add_experience` tools on the user's behalf.
#[utoipa::path(
    post,
    path = "/agent",
    request_body = CopilotRequest,
    responses(
        (status = 200, description = "The model's reply", body = CopilotResponse),
        (status = 400, description = "Malformed JSON or an empty message", body = ErrorResponse),
        (status = 500, description = "The turn failed", body = ErrorResponse)
    )
)]
pub async fn agent_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CopilotRequest>, JsonRejection>,
) -> Result<Json<CopilotResponse>, Failure> {
    let (user_id, message) = read_message(&app_state, payload)?;

    match app_state.agent.run_turn(&user_id, &message).await {
        Ok(response) => Ok(Json(CopilotResponse { response })),
        Err(e) => {
            error!(user_id = %user_id, "Agent turn failed: {}", e);
            Err(internal_error())
        }
    }
}

/// Publish a project or work-experience entry directly.
#[utoipa::path(
    post,
    path = "/update_content",
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "The entry was committed", body = UpdateContentResponse),
        (status = 400, description = "Invalid JSON, unknown type, or missing required fields", body = ErrorResponse),
        (status = 409, description = "The page changed while it was being updated", body = ErrorResponse),
        (status = 422, description = "The page has no section for this entry", body = ErrorResponse),
        (status = 502, description = "The repository host failed or timed out", body = ErrorResponse)
    )
)]
pub async fn update_content_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<UpdateContentRequest>, JsonRejection>,
) -> Result<Json<UpdateContentResponse>, Failure> {
    let Json(request) = payload.map_err(|rejection| {
        let detail = rejection.body_text();
        warn!("Rejected update payload: {}", detail);
        match rejection {
            JsonRejection::JsonDataError(_)
                if detail.contains("unknown variant") || detail.contains("missing field `type`") =>
            {
                bad_request("Invalid type. Must be 'project' or 'work'.")
            }
            _ => bad_request("Invalid JSON request"),
        }
    })?;

    let update = UpdateRequest::from(request);
    let blank = update.blank_required_fields();
    if !blank.is_empty() {
        let kind = match update {
            UpdateRequest::Project(_) => "project",
            UpdateRequest::Work(_) => "work experience",
        };
        warn!(fields = ?blank, "Update is missing required fields.");
        return Err(bad_request(format!("Missing required fields for {}", kind)));
    }

    match app_state.publisher.publish(&update).await {
        Ok(receipt) => Ok(Json(UpdateContentResponse {
            status: "success".to_string(),
            section: receipt.section,
            commit_sha: receipt.commit_sha,
            commit_url: receipt.commit_url,
        })),
        Err(e) => {
            error!(section = %update.section(), code = e.code(), "Direct update failed: {}", e);
            Err(publish_failure(&e))
        }
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Serves the OpenAPI document when the Swagger UI is not compiled in.
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
