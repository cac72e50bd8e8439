//! Upstream connector implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::connector::{
    ChatConnector, ConnectorError, ConnectorOutput, ConnectorReply, StreamingReply, Turn,
};
use crate::models::MessageRole;

use super::sse::parse_sse_stream;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};

/// Connector backed by an OpenAI-compatible chat completions endpoint
pub struct UpstreamConnector {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl UpstreamConnector {
    /// Create a new upstream connector
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
    ) -> Result<Self, ConnectorError> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| ConnectorError::Http {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
            model,
        })
    }

    fn endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, turns: Vec<Turn>, stream: bool) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: turns.into_iter().map(to_wire_message).collect(),
            stream,
        }
    }

    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::Response, ConnectorError> {
        let mut builder = self
            .http_client
            .post(self.endpoint_url())
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn to_wire_message(turn: Turn) -> WireMessage {
    let role = match turn.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    };
    WireMessage {
        role: role.to_string(),
        content: turn.content,
    }
}

#[async_trait]
impl ChatConnector for UpstreamConnector {
    async fn generate(
        &self,
        turns: Vec<Turn>,
        stream: bool,
    ) -> Result<ConnectorOutput, ConnectorError> {
        let request = self.build_request(turns, stream);

        if !stream {
            let response = self.send(&request).await?;
            let completion: ChatCompletionResponse = response.json().await?;
            let reply = completion
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| ConnectorError::InvalidReply("no choices in response".to_string()))?;
            return Ok(ConnectorOutput::Complete(ConnectorReply {
                reply,
                // The completions API carries no source references
                citations: Vec::new(),
            }));
        }

        let response = self.send(&request).await?;
        let byte_stream = Box::pin(response.bytes_stream());
        let fragments = parse_sse_stream(byte_stream).filter_map(|item| async move {
            match item {
                Ok(chunk) => chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .filter(|text| !text.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(ConnectorOutput::Stream(StreamingReply {
            fragments: Box::pin(fragments),
            citations: Vec::new(),
        }))
    }
}
