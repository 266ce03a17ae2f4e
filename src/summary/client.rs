//! Outbound chat-completion request for student summaries.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::InferenceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::store::student::Student;
use crate::summary::prompt::build_prompt;
use crate::summary::stream::{assemble, decode_chunks};

/// Chat request body (Ollama `/api/chat`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Sends summary prompts to the configured chat endpoint.
pub struct SummaryGenerator {
    client: reqwest::Client,
    config: InferenceConfig,
}

impl SummaryGenerator {
    /// Build a generator whose HTTP client enforces the configured timeout.
    pub fn new(config: InferenceConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Generate a summary for `student`.
    ///
    /// Reads the streamed reply only up to the first completion marker; the
    /// response is dropped at that point, closing the connection.
    pub async fn summarize(&self, student: &Student) -> ServiceResult<String> {
        let request_id = Uuid::new_v4().to_string();
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(student),
            }],
            stream: true,
        };

        info!(
            request_id = request_id,
            student_id = student.id,
            model = self.config.model,
            endpoint = self.config.endpoint,
            "Sending summary request"
        );
        debug!(request_id = request_id, prompt = request.messages[0].content, "Summary prompt");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(request_id = request_id, error = %e, "Error connecting to Ollama API");
                ServiceError::UpstreamUnavailable(e.to_string())
            })?;

        let status = response.status();
        info!(request_id = request_id, status = %status, "Ollama API response status");
        let response = response.error_for_status().map_err(|e| {
            error!(request_id = request_id, status = %status, "Ollama API returned an error status");
            ServiceError::UpstreamUnavailable(e.to_string())
        })?;

        let summary = assemble(decode_chunks(Box::pin(response.bytes_stream()))).await?;
        info!(
            request_id = request_id,
            chars = summary.len(),
            "Summary generation completed"
        );
        Ok(summary)
    }
}
