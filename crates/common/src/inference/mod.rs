//! Question answering gateway
//!
//! Sends a question together with an organization's extracted content to a
//! remote inference endpoint and pulls the `answer` field out of the reply.
//! A reply without an answer is a normal outcome and yields
//! [`SENTINEL_ANSWER`].

use crate::config::InferenceConfig;
use crate::errors::{AppError, Result};
use crate::types::ExtractionResult;
use crate::SENTINEL_ANSWER;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for question answering providers
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Answer `question` using `context` as the only source
    async fn ask(&self, question: &str, context: &ExtractionResult) -> Result<String>;

    /// Provider name used in logs and metrics
    fn name(&self) -> &str;
}

/// HTTP inference client
pub struct InferenceClient {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: InferenceInputs<'a>,
}

#[derive(Serialize)]
struct InferenceInputs<'a> {
    question: &'a str,
    context: String,
}

impl InferenceClient {
    /// Create a new inference client
    pub fn new(endpoint: String, api_token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e)
            })?;

        Ok(Self {
            client,
            endpoint,
            api_token,
            timeout_secs,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::GatewayTimeout { timeout_secs: self.timeout_secs }
        } else {
            AppError::GatewayTransport {
                message: format!("Request failed: {}", err),
            }
        }
    }

    async fn make_request(&self, question: &str, context: &ExtractionResult) -> Result<Value> {
        let request = InferenceRequest {
            inputs: InferenceInputs {
                question,
                context: context.to_context(),
            },
        };

        let mut builder = self.client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GatewayTransport {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                AppError::GatewayTransport {
                    message: format!("Failed to parse response: {}", e),
                }
            }
        })
    }
}

/// Pull the answer out of a response body.
///
/// Accepts `{"answer": ...}` and the list form `[{"answer": ...}]`.
pub fn answer_from_response(body: &Value) -> Option<String> {
    let candidate = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };

    candidate.get("answer")?.as_str().map(str::to_string)
}

#[async_trait]
impl QuestionAnswerer for InferenceClient {
    async fn ask(&self, question: &str, context: &ExtractionResult) -> Result<String> {
        let start = Instant::now();
        let result = self.make_request(question, context).await;
        crate::metrics::record_inference(start.elapsed().as_secs_f64(), self.name(), result.is_ok());

        let body = result?;
        match answer_from_response(&body) {
            Some(answer) => Ok(answer),
            None => {
                tracing::info!("Inference response carried no answer, using sentinel");
                Ok(SENTINEL_ANSWER.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Fixed-answer provider for testing and local development
pub struct StaticAnswerer {
    answer: Option<String>,
}

impl StaticAnswerer {
    /// Always answer with `answer`
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: Some(answer.into()) }
    }

    /// Behave like an endpoint whose responses never carry an answer
    pub fn without_answer() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl QuestionAnswerer for StaticAnswerer {
    async fn ask(&self, _question: &str, _context: &ExtractionResult) -> Result<String> {
        Ok(self
            .answer
            .clone()
            .unwrap_or_else(|| SENTINEL_ANSWER.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Create a question answerer based on configuration
pub fn create_answerer(config: &InferenceConfig) -> Result<Arc<dyn QuestionAnswerer>> {
    match config.provider.as_str() {
        "http" => {
            let endpoint = config.endpoint.clone().ok_or_else(|| AppError::Configuration {
                message: "inference.endpoint is required for the http provider".to_string(),
            })?;
            Ok(Arc::new(InferenceClient::new(
                endpoint,
                config.api_token.clone(),
                config.timeout_secs,
            )?))
        }
        "mock" => Ok(Arc::new(StaticAnswerer::new(config.mock_answer.clone()))),
        other => Err(AppError::Configuration {
            message: format!("Unknown inference provider: {}", other),
        }),
    }
}
