//! API Error Handling
//!
//! Every failure of a function is answered with HTTP 400 and the
//! `{error, details}` envelope the orchestrator reads back.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reportflow_core::dto::args::ValidationError;
use reportflow_core::dto::function::FunctionFailure;
use serde_json::{Map, Value as JsonValue};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// The request body did not pass validation
    Validation {
        error: ValidationError,
        details: Map<String, JsonValue>,
    },
    /// A call the function made on the caller's behalf failed
    Failed {
        message: String,
        details: Map<String, JsonValue>,
    },
}

impl ApiError {
    /// Validation failure, tagged with the request-checking phase
    pub fn validation(error: ValidationError, mut details: Map<String, JsonValue>) -> Self {
        details.insert("job_phase".to_string(), JsonValue::from("check_request_args"));
        details.insert(
            "job_phase_detail".to_string(),
            JsonValue::from(error.phase_detail()),
        );
        if let Some(field) = error.field() {
            details.insert("arg_name".to_string(), JsonValue::from(field));
        }
        ApiError::Validation { error, details }
    }

    pub fn failed(message: impl Into<String>, details: Map<String, JsonValue>) -> Self {
        ApiError::Failed {
            message: message.into(),
            details,
        }
    }

    /// The envelope this error is answered with
    pub fn to_failure(&self) -> FunctionFailure {
        match self {
            ApiError::Validation { error, details } => FunctionFailure {
                error: error.to_string(),
                details: details.clone(),
            },
            ApiError::Failed { message, details } => FunctionFailure {
                error: message.clone(),
                details: details.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = self.to_failure();
        match &self {
            ApiError::Validation { .. } => tracing::warn!("Invalid request: {}", failure.error),
            ApiError::Failed { .. } => tracing::error!("{}", failure.error),
        }

        (StatusCode::BAD_REQUEST, Json(failure)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err, Map::new())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_details_name_the_field() {
        let err = ApiError::from(ValidationError::MissingField("client_name".to_string()));
        let failure = err.to_failure();
        assert!(failure.error.contains("'client_name'"));
        assert_eq!(failure.details["job_phase"], "check_request_args");
        assert_eq!(failure.details["job_phase_detail"], "required_args");
        assert_eq!(failure.details["arg_name"], "client_name");
    }

    #[test]
    fn test_failures_are_bad_requests() {
        let response = ApiError::failed("boom", Map::new()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
