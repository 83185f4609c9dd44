pub(crate) use super::AppState;
pub(crate) use super::csrf::{csrf_token, validate_csrf};
pub(crate) use super::desk::DeskSession;
pub(crate) use super::flash::{self, Notice};
pub(crate) use crate::error::DeskError;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Multipart, State};
pub(crate) use axum::response::Redirect;
pub(crate) use serde::Deserialize;
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::{debug, info};
