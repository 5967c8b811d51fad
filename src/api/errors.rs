use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::ChessError;
use crate::service::ServiceError;
use crate::store::StoreError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    GameNotFound(u32),
    InvalidMove(ChessError),
    InvalidRequest(String),
    Unauthorized,
    AlreadyTaken,
    Forbidden(String),
    GameOver,
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::GameNotFound(id) => (
                StatusCode::NOT_FOUND,
                "GAME_NOT_FOUND",
                format!("Game not found: {id}"),
            ),
            ApiError::InvalidMove(err) => {
                (StatusCode::BAD_REQUEST, "INVALID_MOVE", err.to_string())
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing or unknown auth token".to_string(),
            ),
            ApiError::AlreadyTaken => (
                StatusCode::FORBIDDEN,
                "ALREADY_TAKEN",
                "Already taken".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::GameOver => (
                StatusCode::BAD_REQUEST,
                "GAME_OVER",
                "Game is already over".to_string(),
            ),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChessError> for ApiError {
    fn from(err: ChessError) -> Self {
        match &err {
            ChessError::InvalidMove { .. } => ApiError::InvalidMove(err),
            ChessError::InvalidSquare(_) | ChessError::InvalidPromotion(_) => {
                ApiError::InvalidRequest(err.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::BadRequest(msg) => ApiError::InvalidRequest(msg),
            ServiceError::Unauthorized => ApiError::Unauthorized,
            ServiceError::AlreadyTaken | ServiceError::Store(StoreError::UserExists(_)) => {
                ApiError::AlreadyTaken
            }
            ServiceError::GameNotFound(id) | ServiceError::Store(StoreError::GameNotFound(id)) => {
                ApiError::GameNotFound(id)
            }
            ServiceError::NotAPlayer | ServiceError::NotYourTurn => {
                ApiError::Forbidden(err.to_string())
            }
            ServiceError::GameOver => ApiError::GameOver,
            ServiceError::InvalidMove(chess) => chess.into(),
            ServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}
