use crate::db::models::api::{ApiResponse, ErrorDetail};
use axum::{Json, http::StatusCode, response::IntoResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static EXPOSE_STACK: AtomicBool = AtomicBool::new(false);

/// Enables the `stack` field on error envelopes. Set once at startup for development mode.
pub fn expose_error_stack(enabled: bool) {
    EXPOSE_STACK.store(enabled, Ordering::Relaxed);
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Validation failed")]
    ValidationFailed(Vec<ErrorDetail>),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        field: Option<String>,
        code: Option<String>,
    },

    #[error("Not acceptable: {message}")]
    NotAcceptable { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Media storage error: {0}")]
    Storage(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth { .. } | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::TokenExpired => StatusCode::GONE,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Validation { .. } | AppError::ValidationFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            AppError::Storage(_) | AppError::Mail(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Redis(_)
            | AppError::Config(_)
            | AppError::Bcrypt(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_api_response(&self) -> ApiResponse<()> {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ApiResponse::internal_error("Database error")
            }
            AppError::Pool(e) => {
                tracing::error!("Connection pool error: {}", e);
                ApiResponse::internal_error("Connection error")
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                ApiResponse::internal_error("Cache error")
            }
            AppError::Auth { message } => ApiResponse::unauthorized(message),
            AppError::TokenExpired => ApiResponse::gone("Need to refresh token"),
            AppError::Forbidden { message } => ApiResponse::forbidden(message),
            AppError::Validation { message } => ApiResponse::unprocessable(message),
            AppError::ValidationFailed(details) => ApiResponse::validation_error(details.clone()),
            AppError::NotFound { resource } => {
                ApiResponse::not_found(&format!("{} not found", resource))
            }
            AppError::Conflict {
                message,
                field,
                code,
            } => ApiResponse::conflict(message, field.clone(), code.as_deref().unwrap_or("CONFLICT")),
            AppError::NotAcceptable { message } => ApiResponse::not_acceptable(message),
            AppError::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                ApiResponse::internal_error("Configuration error")
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {}", e);
                ApiResponse::unauthorized("Invalid token")
            }
            AppError::Bcrypt(e) => {
                tracing::error!("Bcrypt error: {}", e);
                ApiResponse::internal_error("Password processing error")
            }
            AppError::Storage(message) => {
                tracing::error!("Media storage error: {}", message);
                ApiResponse::bad_gateway(message)
            }
            AppError::Mail(message) => {
                tracing::error!("Mail error: {}", message);
                ApiResponse::bad_gateway(message)
            }
            AppError::Internal(message) => {
                tracing::error!("Internal error: {}", message);
                ApiResponse::internal_error(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let stack = EXPOSE_STACK
            .load(Ordering::Relaxed)
            .then(|| format!("{:?}", self));
        let response = self.to_api_response().with_stack(stack);

        (status, Json(response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// 便捷的错误创建函数
impl AppError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::NotAcceptable {
            message: message.into(),
        }
    }

    pub fn conflict_with_code(
        message: impl Into<String>,
        field: Option<String>,
        code: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            message: message.into(),
            field,
            code: Some(code.into()),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
