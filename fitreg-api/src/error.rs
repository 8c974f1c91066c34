use actix_multipart::MultipartError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use fitreg_model::{biometrics::BiometricError, photo::UnsupportedPhotoType};
use log::error;
use serde_json::json;

use crate::{auth::AuthError, export::ExportError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    UnsupportedCategory(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedCategory(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(cause) = self {
            error!("Request failed: {}", cause);
        }
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}

impl From<BiometricError> for ApiError {
    fn from(e: BiometricError) -> Self {
        match e {
            BiometricError::InvalidInput { .. } => ApiError::InvalidInput(e.to_string()),
            BiometricError::UnsupportedCategory(_) => ApiError::UnsupportedCategory(e.to_string()),
        }
    }
}

impl From<fitreg_db::Error> for ApiError {
    fn from(e: fitreg_db::Error) -> Self {
        match e {
            fitreg_db::Error::Conflict(what) => {
                ApiError::Conflict(format!("{} already registered", what))
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<UnsupportedPhotoType> for ApiError {
    fn from(e: UnsupportedPhotoType) -> Self {
        ApiError::UnsupportedMediaType(e.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidInput(format!("malformed form: {}", e))
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken(_) | AuthError::MissingToken => {
                ApiError::Unauthorized(e.to_string())
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}
