/// Error handling for the API server
///
/// A single `ApiError` type maps the error taxonomy to HTTP responses.
/// Handlers return `ApiResult<T>`; the `From` impls below keep `?` working
/// across the store, token, password, and policy layers.
///
/// # Response shapes
///
/// Validation and conflict errors answer with a field-keyed body, matching
/// what the frontend renders next to its inputs:
///
/// ```json
/// { "email": "Email already exists" }
/// ```
///
/// Everything else answers with a single `error` key. Internal errors are
/// logged with their detail and answer with a generic message — no
/// internals leak to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use taskdeck_shared::auth::{jwt::JwtError, password::PasswordError, policy::PolicyError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    BadRequest(String),

    /// Missing/invalid credentials (401)
    Unauthorized(String),

    /// Policy check failed (403)
    Forbidden(String),

    /// Missing user/project/task/token subject (404)
    NotFound(String),

    /// Duplicate unique value (400, field-keyed body)
    Conflict {
        /// Request field the duplicate belongs to
        field: &'static str,
        message: String,
    },

    /// One or more fields failed validation (400, field-keyed body)
    Validation(Vec<FieldError>),

    /// Unexpected store or dependency failure (500)
    Internal(String),
}

/// A single failed-field entry in a validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Shorthand for a one-field validation failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { field, message } => {
                write!(f, "Conflict on {}: {}", field, message)
            }
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                let mut body = serde_json::Map::new();
                for e in errors {
                    body.insert(e.field, serde_json::Value::String(e.message));
                }
                (StatusCode::BAD_REQUEST, Json(serde_json::Value::Object(body))).into_response()
            }
            ApiError::Conflict { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field.to_string(), serde_json::Value::String(message));
                (StatusCode::BAD_REQUEST, Json(serde_json::Value::Object(body))).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal error occurred" })),
                )
                    .into_response()
            }
        }
    }
}

/// Store errors: unique-constraint violations become the same field-keyed
/// 400 the pre-checks produce, so the schema backstop is indistinguishable
/// from the fast path.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("username") {
                        return ApiError::Conflict {
                            field: "username",
                            message: "Username already exists".to_string(),
                        };
                    }
                    if constraint.contains("email") {
                        return ApiError::Conflict {
                            field: "email",
                            message: "Email already exists".to_string(),
                        };
                    }
                    if constraint.contains("title") {
                        return ApiError::Conflict {
                            field: "title",
                            message: "A task with this title already exists in this project"
                                .to_string(),
                        };
                    }
                    if constraint.contains("name") {
                        return ApiError::Conflict {
                            field: "name",
                            message: "Project name already exists".to_string(),
                        };
                    }
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Converts `validator` derive output into the field-keyed shape
pub fn validation_failed(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::Validation(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_is_field_keyed_400() {
        let (status, body) = body_json(ApiError::Conflict {
            field: "email",
            message: "Email already exists".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "email": "Email already exists" }));
    }

    #[tokio::test]
    async fn test_validation_merges_fields() {
        let (status, body) = body_json(ApiError::Validation(vec![
            FieldError {
                field: "password".to_string(),
                message: "Password must be between 8 and 20 characters".to_string(),
            },
            FieldError {
                field: "confirmPassword".to_string(),
                message: "Passwords do not match".to_string(),
            },
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["password"],
            "Password must be between 8 and 20 characters"
        );
        assert_eq!(body["confirmPassword"], "Passwords do not match");
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_403() {
        let (status, body) = body_json(ApiError::Forbidden("Unauthorized".to_string())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_internal_hides_detail() {
        let (status, body) =
            body_json(ApiError::Internal("connection refused at 10.0.0.3".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "An internal error occurred" }));
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, _) = body_json(ApiError::NotFound("Task not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_policy_error_converts_to_forbidden() {
        use taskdeck_shared::auth::policy::PolicyError;

        let err: ApiError = PolicyError::PrivilegedOnly("archive tasks").into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::Conflict {
            field: "username",
            message: "Username already exists".to_string(),
        };
        assert!(err.to_string().contains("username"));
    }
}
