//! Editor form endpoints for the expiration field.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;

use crate::common::PostId;
use crate::domains::expiration::{ExpirationError, ExpirationField, ExpirationForm};
use crate::server::app::AppState;

#[derive(Debug, Serialize)]
pub struct SavedExpiration {
    pub post_id: PostId,
    pub expires_at: Option<i64>,
}

/// HTTP mapping for expiration errors
pub struct ApiError(ExpirationError);

impl From<ExpirationError> for ApiError {
    fn from(error: ExpirationError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ExpirationError::PostNotFound(_) => StatusCode::NOT_FOUND,
            ExpirationError::NotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ExpirationError::InvalidNonce => StatusCode::FORBIDDEN,
            _ => {
                tracing::error!(error = %self.0, "Expiration request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// GET /posts/:id/expiration
pub async fn get_expiration_handler(
    Extension(state): Extension<AppState>,
    Path(post_id): Path<PostId>,
) -> Result<Json<ExpirationField>, ApiError> {
    Ok(Json(state.forms.field(post_id).await?))
}

/// POST /posts/:id/expiration
pub async fn save_expiration_handler(
    Extension(state): Extension<AppState>,
    Path(post_id): Path<PostId>,
    Form(form): Form<ExpirationForm>,
) -> Result<Json<SavedExpiration>, ApiError> {
    let outcome = state.forms.on_save(post_id, &form).await?;
    Ok(Json(SavedExpiration {
        post_id,
        expires_at: outcome.expires_at(),
    }))
}
