//! Error handling

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use tracing::{error, info};

use crate::inference::InferenceError;

/// Errors that end a request in the web desk.
#[derive(Debug)]
pub enum DeskError {
    /// When you didn't do the right thing
    BadRequest(String),
    /// Missing or invalid session / CSRF token
    Unauthorized,
    /// A model call failed; the request produced nothing
    Collaborator(InferenceError),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl From<InferenceError> for DeskError {
    fn from(err: InferenceError) -> Self {
        DeskError::Collaborator(err)
    }
}

impl From<tower_sessions::session::Error> for DeskError {
    fn from(err: tower_sessions::session::Error) -> Self {
        DeskError::InternalServerError(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for DeskError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        DeskError::BadRequest(err.body_text())
    }
}

impl From<tokio::task::JoinError> for DeskError {
    fn from(err: tokio::task::JoinError) -> Self {
        DeskError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for DeskError {
    fn from(err: axum::http::Error) -> Self {
        DeskError::InternalServerError(err.to_string())
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    title: &'a str,
    detail: &'a str,
}

fn error_page(status: StatusCode, title: &str, detail: &str) -> axum::response::Response {
    let body = ErrorTemplate { title, detail }
        .render()
        .unwrap_or_else(|_| format!("{title}: {detail}"));
    (status, Html(body)).into_response()
}

impl IntoResponse for DeskError {
    fn into_response(self) -> axum::response::Response {
        match self {
            DeskError::BadRequest(reason) => {
                info!("Bad request received: {}", reason);
                error_page(StatusCode::BAD_REQUEST, "Permintaan tidak valid", &reason)
            }
            DeskError::Unauthorized => {
                info!("Unauthorized request received");
                error_page(
                    StatusCode::UNAUTHORIZED,
                    "Sesi tidak valid",
                    "Sesi kedaluwarsa atau token formulir salah. Muat ulang halaman lalu coba lagi.",
                )
            }
            DeskError::Collaborator(err) => {
                error!("Model call failed: {}", err);
                error_page(
                    StatusCode::BAD_GATEWAY,
                    "Model gagal merespons",
                    &err.to_string(),
                )
            }
            DeskError::InternalServerError(message) => {
                error!("Internal server error: {}", message);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Kesalahan server",
                    "Terjadi kesalahan internal.",
                )
            }
        }
    }
}
