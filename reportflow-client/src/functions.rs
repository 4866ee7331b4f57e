//! Calls to sibling functions

use reqwest::{Client, StatusCode};
use reportflow_core::dto::function::{FunctionFailure, FunctionResponse, FunctionSuccess};
use serde::Serialize;
use serde_json::Map;

use crate::error::{ClientError, Result};

/// HTTP client for invoking other functions of the pipeline
#[derive(Debug, Clone, Default)]
pub struct FunctionClient {
    client: Client,
}

impl FunctionClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// POST a JSON body to a function and read its envelope
    ///
    /// Any HTTP 2xx is a success; a body that is not a success envelope
    /// becomes the message of one with no details. HTTP 400 must carry a
    /// failure envelope. Anything else is an [`ClientError::ApiError`].
    pub async fn invoke<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<FunctionResponse> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            let success = serde_json::from_str::<FunctionSuccess>(&text).unwrap_or_else(|_| {
                tracing::debug!("{} answered without a success envelope", url);
                FunctionSuccess {
                    message: text,
                    details: Map::new(),
                }
            });
            return Ok(FunctionResponse::Success(success));
        }

        if status == StatusCode::BAD_REQUEST {
            let failure: FunctionFailure = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse failure envelope: {}", e))
            })?;
            return Ok(FunctionResponse::Failure(failure));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::api_error(status.as_u16(), error_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve;
    use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
    use serde_json::{Value as JsonValue, json};

    async fn functions() -> String {
        let router = Router::new()
            .route(
                "/envelope",
                post(|Json(body): Json<JsonValue>| async move {
                    Json(json!({
                        "message": "Stage finished",
                        "details": { "client_name": body["client_name"] },
                    }))
                }),
            )
            .route(
                "/text",
                post(|| async { "Function finished for 'acme'." }),
            )
            .route(
                "/failure",
                post(|| async {
                    (
                        AxumStatus::BAD_REQUEST,
                        Json(json!({
                            "error": "Job failed",
                            "details": { "job_phase": "check_job_status" },
                        })),
                    )
                }),
            )
            .route(
                "/broken",
                post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
            );
        serve(router).await
    }

    #[tokio::test]
    async fn test_success_envelope_is_read() {
        let base = functions().await;

        let response = FunctionClient::default()
            .invoke(&format!("{}/envelope", base), &json!({ "client_name": "acme" }))
            .await
            .unwrap();

        let FunctionResponse::Success(success) = response else {
            panic!("expected a success");
        };
        assert_eq!(success.message, "Stage finished");
        assert_eq!(success.details["client_name"], "acme");
    }

    #[tokio::test]
    async fn test_plain_text_success_is_still_a_success() {
        let base = functions().await;

        let response = FunctionClient::default()
            .invoke(&format!("{}/text", base), &json!({}))
            .await
            .unwrap();

        assert_eq!(
            response,
            FunctionResponse::Success(FunctionSuccess {
                message: "Function finished for 'acme'.".to_string(),
                details: Map::new(),
            })
        );
    }

    #[tokio::test]
    async fn test_bad_request_is_a_failure_envelope() {
        let base = functions().await;

        let response = FunctionClient::default()
            .invoke(&format!("{}/failure", base), &json!({}))
            .await
            .unwrap();

        let FunctionResponse::Failure(failure) = response else {
            panic!("expected a failure");
        };
        assert_eq!(failure.error, "Job failed");
        assert_eq!(failure.job_phase(), Some("check_job_status"));
    }

    #[tokio::test]
    async fn test_other_status_is_an_api_error() {
        let base = functions().await;

        let err = FunctionClient::default()
            .invoke(&format!("{}/broken", base), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 500, ref message } if message == "boom"));
    }
}
