//! Connector abstractions for reply generation
//!
//! A connector turns a conversation history into an assistant reply,
//! either all at once or as an incremental sequence of text fragments.
//! The store and handlers never know which implementation is behind the
//! trait; swapping the mock for a real model is a config change.

pub mod mock;
pub mod upstream;

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ConnectorSettings;
use crate::models::{ChatMessage, MessageRole, MetaBag, SourceType};

/// One role/content turn of conversation history handed to a connector
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for Turn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// A citation proposed by the connector, not yet bound to a message id
#[derive(Debug, Clone, PartialEq)]
pub struct CitationDraft {
    pub source_type: SourceType,
    pub source_id: String,
    pub title: String,
    pub snippet: String,
    pub metadata: MetaBag,
}

/// A complete (non-streaming) connector result
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorReply {
    pub reply: String,
    pub citations: Vec<CitationDraft>,
}

/// Stream of incremental reply fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ConnectorError>> + Send>>;

/// A streaming connector result. Citations are known up front (or empty)
/// and attached once the fragment stream is exhausted.
pub struct StreamingReply {
    pub fragments: FragmentStream,
    pub citations: Vec<CitationDraft>,
}

/// What a connector hands back, depending on the requested mode
pub enum ConnectorOutput {
    Complete(ConnectorReply),
    Stream(StreamingReply),
}

/// Errors that can occur while generating a reply
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// HTTP request failures against the upstream model API
    #[error("HTTP error (status {status}): {body}")]
    Http { status: u16, body: String },

    /// SSE stream parsing failures
    #[error("Stream error: {0}")]
    Stream(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The upstream answered but the payload was unusable
    #[error("Invalid reply: {0}")]
    InvalidReply(String),
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ConnectorError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ConnectorError::Http {
                status: 0,
                body: err.to_string(),
            }
        }
    }
}

/// Main interface all connector implementations must satisfy
///
/// The contract: `stream = false` yields `ConnectorOutput::Complete`,
/// `stream = true` yields `ConnectorOutput::Stream`. A mismatch is
/// treated as an upstream failure at the dispatch site.
#[async_trait]
pub trait ChatConnector: Send + Sync {
    /// Produce a reply for the given conversation history
    async fn generate(
        &self,
        turns: Vec<Turn>,
        stream: bool,
    ) -> Result<ConnectorOutput, ConnectorError>;
}

/// Create a connector from settings
///
/// The mock connector is the default and needs nothing; the upstream
/// connector builds an HTTP client for an OpenAI-compatible endpoint.
pub fn create_connector(
    settings: &ConnectorSettings,
) -> Result<Arc<dyn ChatConnector>, ConnectorError> {
    match settings {
        ConnectorSettings::Mock => Ok(Arc::new(mock::MockConnector::new())),
        ConnectorSettings::Upstream {
            base_url,
            api_key,
            model,
        } => {
            let client = upstream::UpstreamConnector::new(
                base_url.clone(),
                api_key.clone(),
                model.clone(),
            )?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_from_message() {
        let message = ChatMessage {
            id: uuid::Uuid::new_v4(),
            session_id: uuid::Uuid::new_v4(),
            role: MessageRole::Assistant,
            content: "An answer".to_string(),
            meta: MetaBag::new(),
            created_at: chrono::Utc::now(),
        };
        let turn = Turn::from(&message);
        assert_eq!(turn.role, MessageRole::Assistant);
        assert_eq!(turn.content, "An answer");
    }

    #[test]
    fn test_connector_error_display() {
        let err = ConnectorError::Http {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));

        let err = ConnectorError::InvalidReply("no choices".to_string());
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ConnectorError = json_err.into();
        assert!(matches!(err, ConnectorError::Serialization(_)));
    }

    #[test]
    fn test_create_mock_connector() {
        let connector = create_connector(&ConnectorSettings::Mock);
        assert!(connector.is_ok());
    }
}
