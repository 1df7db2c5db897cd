use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{success: true, message, data?}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    pub fn accepted(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::ACCEPTED, message, Some(data))
    }

    pub fn with_status(status_code: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            message: message.into(),
            data,
            status_code,
        }
    }
}

impl ApiResponse<()> {
    /// Envelope without a `data` member
    pub fn message_only(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self::with_status(status_code, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = json!({
            "success": true,
            "message": self.message,
        });

        if let Some(data) = &self.data {
            match serde_json::to_value(data) {
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return crate::error::ApiError::internal_server_error(
                        "Failed to serialize response data",
                    )
                    .into_response();
                }
            }
        }

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
