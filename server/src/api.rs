//! Request/response bodies and handlers for the key endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use chrono::SecondsFormat;
use keyledger_license::{DurationDays, KeyRegistry, Redemption};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;

pub const KEY_GENERATED: &str = "Key generated successfully!";
pub const KEY_REDEEMED: &str = "Key verified and used successfully.";

/// Body of `POST /api/generate-key`.
///
/// `duration` is left untyped so that numeric strings are accepted and every
/// other shape is rejected by the same rule the core applies. `prefix` may be
/// any JSON scalar; numbers and booleans are used as their JSON text.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateKeyRequest {
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub prefix: Option<Value>,
}

impl GenerateKeyRequest {
    /// Returns the prefix as text, or `None` when absent or null.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidPrefix`] for arrays and objects.
    pub fn prefix_text(&self) -> Result<Option<String>, ApiError> {
        match &self.prefix {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(scalar.to_string())),
            Some(_) => Err(ApiError::InvalidPrefix),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerateKeyResponse {
    pub message: String,
    pub key: String,
    pub duration: u32,
    #[serde(rename = "expiryDate")]
    pub expiry_date: String,
}

/// Body of `POST /api/use-key`.
#[derive(Debug, Default, Deserialize)]
pub struct UseKeyRequest {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UseKeyResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl UseKeyResponse {
    pub(crate) fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            duration: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub keys: usize,
}

/// An unreadable body (wrong content type, empty, bad JSON, wrong field
/// types) counts as an empty request, so each endpoint answers with its own
/// missing-field outcome.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(%rejection, "unreadable request body, treating as empty");
            T::default()
        }
    }
}

pub(crate) async fn generate_key(
    State(registry): State<Arc<KeyRegistry>>,
    payload: Result<Json<GenerateKeyRequest>, JsonRejection>,
) -> Result<Json<GenerateKeyResponse>, ApiError> {
    debug!("API call received to /api/generate-key");
    let request = body_or_default(payload);

    let duration = DurationDays::from_json(request.duration.as_ref())?;
    let prefix = request.prefix_text()?;
    let key = registry.issue(duration, prefix.as_deref())?;

    Ok(Json(GenerateKeyResponse {
        message: KEY_GENERATED.to_string(),
        key: key.token().to_string(),
        duration: key.duration_days().get(),
        expiry_date: key.expires_at().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

pub(crate) async fn use_key(
    State(registry): State<Arc<KeyRegistry>>,
    payload: Result<Json<UseKeyRequest>, JsonRejection>,
) -> Result<Json<UseKeyResponse>, ApiError> {
    debug!("API call received to /api/use-key");
    let request = body_or_default(payload);
    let token = request.key.ok_or(ApiError::KeyNotFound)?;

    match registry.redeem(&token)? {
        Redemption::Success { duration_days } => Ok(Json(UseKeyResponse {
            success: true,
            message: KEY_REDEEMED.to_string(),
            duration: Some(duration_days.get()),
        })),
        Redemption::AlreadyUsed => Err(ApiError::AlreadyUsed),
        Redemption::Expired => Err(ApiError::Expired),
    }
}

pub(crate) async fn health(State(registry): State<Arc<KeyRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        keys: registry.len(),
    })
}
