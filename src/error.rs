use crate::models::UnknownPosition;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures surfaced to API and CLI callers
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),
    #[error("Pick not found: {0}")]
    PickNotFound(i64),
    #[error("Team slot not found: {0}")]
    TeamSlotNotFound(u32),
    #[error("Overall pick {0} has already been made")]
    DuplicateOverallPick(u32),
    #[error("Player {0} has already been picked")]
    PlayerAlreadyPicked(String),
    #[error("Invalid pick: {0}")]
    InvalidPick(String),
    #[error("Unknown position: {0}")]
    InvalidPosition(String),
    #[error("A refresh is already running")]
    RefreshInProgress,
    #[error("Upstream source failed: {0:#}")]
    Upstream(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DraftError {
    pub fn status(&self) -> StatusCode {
        match self {
            DraftError::PlayerNotFound(_)
            | DraftError::PickNotFound(_)
            | DraftError::TeamSlotNotFound(_) => StatusCode::NOT_FOUND,
            DraftError::DuplicateOverallPick(_)
            | DraftError::PlayerAlreadyPicked(_)
            | DraftError::RefreshInProgress => StatusCode::CONFLICT,
            DraftError::InvalidPick(_) | DraftError::InvalidPosition(_) => StatusCode::BAD_REQUEST,
            DraftError::Upstream(_) => StatusCode::BAD_GATEWAY,
            DraftError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UnknownPosition> for DraftError {
    fn from(err: UnknownPosition) -> Self {
        DraftError::InvalidPosition(err.0)
    }
}

impl IntoResponse for DraftError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{:#}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
