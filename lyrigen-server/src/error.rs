use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use lyrigen_core::LyrigenError;

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
	/// Failure reported by the model library.
	Model(LyrigenError),
	/// Invalid request parameter.
	BadRequest(String),
	/// Anything else (blocking pool failures).
	Internal(String),
}

impl std::fmt::Display for ApiError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ApiError::Model(err) => write!(f, "{err}"),
			ApiError::BadRequest(message) | ApiError::Internal(message) => f.write_str(message),
		}
	}
}

impl From<LyrigenError> for ApiError {
	fn from(err: LyrigenError) -> Self {
		ApiError::Model(err)
	}
}

impl From<actix_web::error::BlockingError> for ApiError {
	fn from(err: actix_web::error::BlockingError) -> Self {
		ApiError::Internal(err.to_string())
	}
}

impl ResponseError for ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
			ApiError::Model(err) => match err {
				LyrigenError::InputNotFound { .. } => StatusCode::NOT_FOUND,
				LyrigenError::EmptyVocabulary => StatusCode::CONFLICT,
				LyrigenError::EmptyCorpus { .. }
				| LyrigenError::MalformedModelLine { .. }
				| LyrigenError::DuplicateEntry { .. }
				| LyrigenError::InvalidOrder(_)
				| LyrigenError::InvalidLength(_) => StatusCode::BAD_REQUEST,
				LyrigenError::Io { .. } | LyrigenError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
			},
		}
	}

	fn error_response(&self) -> HttpResponse {
		HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
	}
}
