// Message listing and the reply dispatcher

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use uuid::Uuid;

use crate::connector::{
    ChatConnector, CitationDraft, ConnectorOutput, StreamingReply, Turn,
};
use crate::error::{reject, ApiError};
use crate::models::{
    MessageCitation, MessageRole, MetaBag, PageQuery, ReplyResponse, SendMessageRequest, User,
};
use crate::sse::{create_delta_event, create_error_event, create_final_event};
use crate::store::ChatStore;

/// GET /api/sessions/:id/messages
pub async fn list_messages_handler(
    session_id: Uuid,
    user: User,
    query: PageQuery,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let messages = store
        .list_messages(user.id, session_id, query.limit, query.cursor, query.direction)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&messages))
}

/// POST /api/sessions/:id/messages
///
/// Persists the user message first, dispatches the full turn history to
/// the connector, then replies either with a single JSON payload or with
/// an event stream of `delta` fragments ending in one `final` (or
/// `error`) event. The user message survives connector failure; the
/// assistant message is written at most once, after the reply is known
/// in full.
pub async fn send_message_handler(
    session_id: Uuid,
    user: User,
    request: SendMessageRequest,
    store: Arc<ChatStore>,
    connector: Arc<dyn ChatConnector>,
) -> Result<Box<dyn warp::Reply>, warp::Rejection> {
    store
        .get_session(user.id, session_id)
        .await
        .map_err(reject)?;

    store
        .append_message(session_id, MessageRole::User, request.content, MetaBag::new())
        .await
        .map_err(reject)?;

    let turns: Vec<Turn> = store
        .history(session_id)
        .await
        .iter()
        .map(Turn::from)
        .collect();
    tracing::info!(session_id = %session_id, turns = turns.len(), stream = request.stream, "dispatching to connector");

    if !request.stream {
        let reply = match connector.generate(turns, false).await {
            Ok(ConnectorOutput::Complete(reply)) => reply,
            Ok(ConnectorOutput::Stream(_)) => {
                return Err(reject(ApiError::UpstreamFailure(
                    "connector returned a stream for a non-streaming request".to_string(),
                )))
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "connector failed");
                return Err(reject(e));
            }
        };

        let message = store
            .append_message(
                session_id,
                MessageRole::Assistant,
                reply.reply.clone(),
                tokens_meta(&reply.reply),
            )
            .await
            .map_err(reject)?;
        let citations = bind_citations(message.id, reply.citations);
        store.insert_citations(citations.clone()).await;

        return Ok(Box::new(warp::reply::json(&ReplyResponse {
            reply: reply.reply,
            message_id: message.id,
            citations,
        })));
    }

    // Streaming: failures from here on are reported in-band, as error
    // events on an already-open response
    let event_stream: Pin<
        Box<dyn Stream<Item = Result<warp::sse::Event, Infallible>> + Send>,
    > = match connector.generate(turns, true).await {
        Ok(ConnectorOutput::Stream(streaming)) => {
            Box::pin(relay_stream(store, session_id, streaming))
        }
        Ok(ConnectorOutput::Complete(_)) => Box::pin(futures_util::stream::iter(vec![
            create_error_event("connector returned a complete reply for a streaming request"),
        ])),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "connector failed");
            Box::pin(futures_util::stream::iter(vec![create_error_event(
                &e.to_string(),
            )]))
        }
    };

    Ok(Box::new(warp::sse::reply(
        warp::sse::keep_alive().stream(event_stream),
    )))
}

/// Relay connector fragments to the client in arrival order, then persist
/// the accumulated assistant message and close with a `final` event. A
/// fragment error emits an `error` event and ends the stream without
/// persisting the partial reply.
fn relay_stream(
    store: Arc<ChatStore>,
    session_id: Uuid,
    streaming: StreamingReply,
) -> impl Stream<Item = Result<warp::sse::Event, Infallible>> {
    stream! {
        let StreamingReply { mut fragments, citations } = streaming;
        let mut content = String::new();

        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) => {
                    content.push_str(&text);
                    yield create_delta_event(&text);
                }
                Err(e) => {
                    tracing::error!(session_id = %session_id, error = %e, "stream failed mid-reply");
                    yield create_error_event(&e.to_string());
                    return;
                }
            }
        }

        let meta = tokens_meta(&content);
        match store
            .append_message(session_id, MessageRole::Assistant, content, meta)
            .await
        {
            Ok(message) => {
                let citations = bind_citations(message.id, citations);
                store.insert_citations(citations.clone()).await;
                yield create_final_event(message.id, &citations);
            }
            // The session vanished while streaming (e.g. deleted)
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "could not persist streamed reply");
                yield create_error_event(&e.to_string());
            }
        }
    }
}

/// Approximate token count as a whitespace word count, recorded in the
/// assistant message's meta bag
fn tokens_meta(content: &str) -> MetaBag {
    let mut meta = MetaBag::new();
    meta.insert(
        "tokens".to_string(),
        serde_json::json!(content.split_whitespace().count()),
    );
    meta
}

/// Bind connector citation drafts to a persisted message id
fn bind_citations(message_id: Uuid, drafts: Vec<CitationDraft>) -> Vec<MessageCitation> {
    drafts
        .into_iter()
        .map(|draft| MessageCitation {
            id: Uuid::new_v4(),
            message_id,
            source_type: draft.source_type,
            source_id: draft.source_id,
            title: draft.title,
            snippet: draft.snippet,
            metadata: draft.metadata,
        })
        .collect()
}
