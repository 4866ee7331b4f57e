//! Request argument checks
//!
//! Every function receives a flat JSON object. Arguments are read through
//! [`RequestArgs`], which turns a missing, `null` or mistyped value into a
//! [`ValidationError`] naming the offending field.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::domain::context::ExecutionId;

/// A request body failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The body of the request is missing. Please enter a JSON object body.")]
    MissingBody,

    #[error("The body of the request is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("The required '{0}' wasn't provided or the value is None. Please enter a value for '{0}'.")]
    MissingField(String),

    #[error("The '{name}' has an invalid value: {reason}.")]
    InvalidField { name: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field, if the error concerns one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField(name) => Some(name),
            ValidationError::InvalidField { name, .. } => Some(name),
            ValidationError::MissingBody | ValidationError::MalformedBody(_) => None,
        }
    }

    /// Value for the `job_phase_detail` field of the error response
    pub fn phase_detail(&self) -> &'static str {
        match self {
            ValidationError::MissingBody | ValidationError::MalformedBody(_) => "request_body",
            ValidationError::MissingField(_) => "required_args",
            ValidationError::InvalidField { .. } => "invalid_args",
        }
    }

    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Arguments of one function request
#[derive(Debug, Clone)]
pub struct RequestArgs {
    body: Map<String, JsonValue>,
}

impl RequestArgs {
    /// Parses a raw request body
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ValidationError::MissingBody);
        }
        let value: JsonValue = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, ValidationError> {
        match value {
            JsonValue::Object(body) if !body.is_empty() => Ok(Self { body }),
            _ => Err(ValidationError::MissingBody),
        }
    }

    pub fn from_map(body: Map<String, JsonValue>) -> Self {
        Self { body }
    }

    fn present(&self, name: &str) -> Option<&JsonValue> {
        self.body.get(name).filter(|value| !value.is_null())
    }

    pub fn required(&self, name: &str) -> Result<&JsonValue, ValidationError> {
        self.present(name)
            .ok_or_else(|| ValidationError::MissingField(name.to_string()))
    }

    /// A non-empty string; numbers are accepted and rendered as text
    pub fn required_str(&self, name: &str) -> Result<String, ValidationError> {
        match self.optional_str(name)? {
            Some(value) => Ok(value),
            None => Err(ValidationError::MissingField(name.to_string())),
        }
    }

    pub fn optional_str(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.present(name) {
            None => Ok(None),
            Some(JsonValue::String(text)) if text.trim().is_empty() => Ok(None),
            Some(JsonValue::String(text)) => Ok(Some(text.clone())),
            Some(JsonValue::Number(number)) => Ok(Some(number.to_string())),
            Some(_) => Err(ValidationError::invalid(name, "expected a string")),
        }
    }

    /// A non-negative integer, given either as a number or a numeric string
    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>, ValidationError> {
        match self.present(name) {
            None => Ok(None),
            Some(JsonValue::Number(number)) => number
                .as_u64()
                .or_else(|| {
                    number
                        .as_f64()
                        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                        .map(|f| f as u64)
                })
                .map(Some)
                .ok_or_else(|| ValidationError::invalid(name, "expected a non-negative integer")),
            Some(JsonValue::String(text)) => text
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ValidationError::invalid(name, "expected a non-negative integer")),
            Some(_) => Err(ValidationError::invalid(
                name,
                "expected a non-negative integer",
            )),
        }
    }

    pub fn required_object(&self, name: &str) -> Result<&Map<String, JsonValue>, ValidationError> {
        match self.required(name)? {
            JsonValue::Object(object) => Ok(object),
            _ => Err(ValidationError::invalid(name, "expected an object")),
        }
    }

    pub fn required_array(&self, name: &str) -> Result<&Vec<JsonValue>, ValidationError> {
        match self.required(name)? {
            JsonValue::Array(items) => Ok(items),
            _ => Err(ValidationError::invalid(name, "expected an array")),
        }
    }

    pub fn required_execution_id(&self, name: &str) -> Result<ExecutionId, ValidationError> {
        let invalid = || ValidationError::invalid(name, "expected an integer execution id");
        match self.required(name)? {
            JsonValue::Number(number) => number.as_i64().map(ExecutionId::new).ok_or_else(invalid),
            JsonValue::String(text) => text
                .trim()
                .parse::<i64>()
                .map(ExecutionId::new)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}
