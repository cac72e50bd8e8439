//! Mock connector
//!
//! Deterministic stand-in for the tutoring model: it composes a canned
//! reply around the caller's last user turn and, in streaming mode,
//! relays it word by word with a small delay so the dashboard's
//! incremental rendering has something realistic to chew on.

use async_stream::stream;
use async_trait::async_trait;
use std::time::Duration;

use super::{
    ChatConnector, CitationDraft, ConnectorError, ConnectorOutput, ConnectorReply, StreamingReply,
    Turn,
};
use crate::models::{MessageRole, MetaBag, SourceType};

/// Pause between streamed fragments, for a typing effect
const FRAGMENT_DELAY: Duration = Duration::from_millis(120);

pub struct MockConnector {
    fragment_delay: Duration,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            fragment_delay: FRAGMENT_DELAY,
        }
    }

    /// Override the inter-fragment delay (tests use zero)
    pub fn with_delay(fragment_delay: Duration) -> Self {
        Self { fragment_delay }
    }

    fn compose_reply(turns: &[Turn]) -> String {
        let prompt = turns
            .iter()
            .rev()
            .find(|t| t.role == MessageRole::User)
            .map(|t| t.content.as_str())
            .unwrap_or("your message");
        format!(
            "Thanks for asking about \"{}\". This is a demo reply from the mock tutoring \
             connector: in production the configured model answers here, with citations \
             drawn from the course knowledge base.",
            prompt
        )
    }

    fn demo_citations() -> Vec<CitationDraft> {
        vec![
            CitationDraft {
                source_type: SourceType::Kb,
                source_id: "kb-ml-001".to_string(),
                title: "Machine Learning Basics, Lecture 1".to_string(),
                snippet: "An introduction to supervised learning and model evaluation."
                    .to_string(),
                metadata: MetaBag::new(),
            },
            CitationDraft {
                source_type: SourceType::Web,
                source_id: "https://example.com/tutoring-guide".to_string(),
                title: "Tutoring study guide".to_string(),
                snippet: "General study techniques referenced by the demo tutor.".to_string(),
                metadata: MetaBag::new(),
            },
        ]
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatConnector for MockConnector {
    async fn generate(
        &self,
        turns: Vec<Turn>,
        stream: bool,
    ) -> Result<ConnectorOutput, ConnectorError> {
        let reply = Self::compose_reply(&turns);

        if !stream {
            return Ok(ConnectorOutput::Complete(ConnectorReply {
                reply,
                citations: Self::demo_citations(),
            }));
        }

        let delay = self.fragment_delay;
        // split_inclusive keeps the separators, so the concatenated
        // fragments reproduce the reply exactly
        let fragments: Vec<String> = reply.split_inclusive(' ').map(str::to_string).collect();
        let fragment_stream = stream! {
            for fragment in fragments {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok::<String, ConnectorError>(fragment);
            }
        };

        Ok(ConnectorOutput::Stream(StreamingReply {
            fragments: Box::pin(fragment_stream),
            citations: Self::demo_citations(),
        }))
    }
}
