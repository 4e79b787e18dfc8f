use actix_web::error::JsonPayloadError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use thiserror::Error;
use tracing::debug;

use crate::analyzer::AnalyzerError;
use crate::canvas::DecodeError;

mod protocol;
pub mod routes;

/// Errors surfaced to API callers. The `Display` text is exactly what lands
/// in the response envelope's `message`, so underlying causes stay out of it
/// and only reach the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid image data URL")]
    MalformedInput,

    #[error("Failed to decode base64 image")]
    Base64Decode(#[source] base64::DecodeError),

    #[error("Invalid image format")]
    UnsupportedImage(#[source] image::ImageError),

    #[error("Image payload too large")]
    PayloadTooLarge,

    #[error("Server error: {0}")]
    External(#[from] AnalyzerError),
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> ApiError {
        match err {
            DecodeError::MalformedInput => ApiError::MalformedInput,
            DecodeError::Base64(err) => ApiError::Base64Decode(err),
            DecodeError::UnsupportedFormat(err) => ApiError::UnsupportedImage(err),
            DecodeError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge,
        }
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(protocol::ErrorEnvelope::new(self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedInput
            | ApiError::Base64Decode(_)
            | ApiError::UnsupportedImage(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::External(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Handler for JSON bodies the extractor cannot turn into a request struct,
/// e.g. a missing `image` field. Answers 422 with the extractor's own text
/// under `details`.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("rejecting request body: {err}");
    let response = HttpResponse::UnprocessableEntity()
        .insert_header(ContentType::json())
        .json(protocol::ValidationEnvelope::new(err.to_string()));
    actix_web::error::InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::ResponseError;

    #[test]
    fn decode_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(DecodeError::MalformedInput).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DecodeError::PayloadTooLarge {
                encoded: 64,
                limit: 8
            })
            .status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn analyzer_errors_stay_generic() {
        let err = ApiError::from(AnalyzerError::Disabled);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Server error"));
    }
}
