//! SSE events for the streaming reply relay
//!
//! The client contract is line-delimited `data:` payloads carrying a
//! `type` discriminator: any number of `delta` events, then exactly one
//! `final` (or `error`) before the response ends. Events carry no
//! `event:` field; the type lives inside the JSON payload.

use std::convert::Infallible;

use uuid::Uuid;
use warp::sse::Event;

use crate::models::MessageCitation;

/// Create a delta SSE event carrying one reply fragment
pub fn create_delta_event(text: &str) -> Result<Event, Infallible> {
    let payload = serde_json::json!({
        "type": "delta",
        "text": text
    });

    Ok(Event::default().data(payload.to_string()))
}

/// Create the terminal final SSE event with the persisted message id and
/// its citations
pub fn create_final_event(
    message_id: Uuid,
    citations: &[MessageCitation],
) -> Result<Event, Infallible> {
    let payload = serde_json::json!({
        "type": "final",
        "messageId": message_id,
        "citations": citations
    });

    Ok(Event::default().data(payload.to_string()))
}

/// Create an error SSE event; the stream ends right after
pub fn create_error_event(message: &str) -> Result<Event, Infallible> {
    let payload = serde_json::json!({
        "type": "error",
        "error": message
    });

    Ok(Event::default().data(payload.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_delta_event() {
        let result = create_delta_event("Hello ");
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_final_event() {
        let result = create_final_event(Uuid::new_v4(), &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_create_error_event() {
        let result = create_error_event("upstream failure");
        assert!(result.is_ok());
    }

    #[test]
    fn test_delta_payload_format() {
        let payload = serde_json::json!({
            "type": "delta",
            "text": "Hello "
        });
        assert_eq!(payload["type"], "delta");
        assert_eq!(payload["text"], "Hello ");
    }

    #[test]
    fn test_final_payload_format() {
        let message_id = Uuid::new_v4();
        let payload = serde_json::json!({
            "type": "final",
            "messageId": message_id,
            "citations": []
        });
        assert_eq!(payload["type"], "final");
        assert_eq!(payload["messageId"], message_id.to_string());
        assert!(payload["citations"].as_array().unwrap().is_empty());
    }
}
