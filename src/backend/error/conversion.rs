/**
 * Error Conversion
 *
 * Conversion of `MessagingError` into HTTP responses, so REST handlers
 * can return it directly with `?`.
 *
 * # Response Format
 *
 * Error responses are returned as JSON:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::MessagingError;

impl IntoResponse for MessagingError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors keep their details in the log, not the response
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("[Api] Internal error: {:?}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
