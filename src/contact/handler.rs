use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

use super::mailer::{ContactMailer, ContactMessage};

const MAX_NAME_BYTES: usize = 200;
const MAX_EMAIL_BYTES: usize = 320;
const MAX_SUBJECT_BYTES: usize = 200;
const MAX_MESSAGE_BYTES: usize = 8 * 1024;

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// Validate a submission against presence and size limits.
fn validate_payload(payload: &ContactPayload) -> AppResult<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if payload.name.len() > MAX_NAME_BYTES {
        return Err(AppError::Validation(format!(
            "name exceeds {MAX_NAME_BYTES} bytes"
        )));
    }
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_BYTES {
        return Err(AppError::Validation(format!(
            "email exceeds {MAX_EMAIL_BYTES} bytes"
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(AppError::Validation("email is invalid".to_string())),
    }
    if let Some(subject) = &payload.subject {
        if subject.len() > MAX_SUBJECT_BYTES {
            return Err(AppError::Validation(format!(
                "subject exceeds {MAX_SUBJECT_BYTES} bytes"
            )));
        }
    }
    if payload.message.trim().is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }
    if payload.message.len() > MAX_MESSAGE_BYTES {
        return Err(AppError::Validation(format!(
            "message exceeds {MAX_MESSAGE_BYTES} bytes"
        )));
    }
    Ok(())
}

/// POST /v1/contact - Relay a contact form submission.
pub async fn submit(
    State(mailer): State<Arc<ContactMailer>>,
    Json(payload): Json<ContactPayload>,
) -> AppResult<Json<serde_json::Value>> {
    validate_payload(&payload)?;
    if !mailer.is_configured() {
        return Err(AppError::Unconfigured("contact delivery"));
    }

    let msg = ContactMessage {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        reply_to: payload.email.trim().to_string(),
        subject: payload
            .subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        body: payload.message.trim().to_string(),
    };

    mailer.deliver(&msg).await?;
    tracing::info!(id = %msg.id, "contact submission accepted");
    Ok(Json(serde_json::json!({ "status": "sent", "id": msg.id })))
}
