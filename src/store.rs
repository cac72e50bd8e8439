//! In-memory chat store
//!
//! One `ChatStore` owns every record for the life of the process: users,
//! auth sessions, chat sessions, messages, feedback, and citations.
//! Relations are resolved by linear scans over a foreign-key field. The
//! maps sit behind a single async mutex that is never held across an
//! await point, so each store operation is atomic with respect to other
//! handlers.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    ChatMessage, ChatSession, Direction, MessageCitation, MessageFeedback, MessageRole, MetaBag,
    MessageWithCitations, Role, SessionDetail, SessionStatus, SessionSummary,
    UpdateSessionRequest, User,
};

/// Max characters of message content shown in a session-list preview
pub const PREVIEW_LEN: usize = 100;

/// Max characters of the first user message used as an auto-derived title
pub const TITLE_LEN: usize = 50;

/// Default page size for `GET /sessions`
pub const DEFAULT_SESSION_LIMIT: usize = 20;

/// Default page size for `GET /sessions/:id/messages`
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record absent, or owned by someone else (existence is not disclosed
    /// to non-owners)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller identified, but not allowed to touch the record
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    /// Auth-session id (the `sid` cookie) to user id
    auth_sessions: HashMap<Uuid, Uuid>,
    sessions: HashMap<Uuid, ChatSession>,
    messages: HashMap<Uuid, ChatMessage>,
    feedback: HashMap<Uuid, MessageFeedback>,
    citations: HashMap<Uuid, MessageCitation>,
}

/// The in-memory store shared by all request handlers
#[derive(Default)]
pub struct ChatStore {
    inner: Mutex<StoreInner>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- users & auth sessions ----

    /// Find a user by email, creating the record on first sight
    pub async fn upsert_user(&self, email: &str, role: Role) -> User {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner.users.values().find(|u| u.email == email) {
            return user.clone();
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        user
    }

    /// Mint a new auth session for the user, returning the `sid` value
    pub async fn create_auth_session(&self, user_id: Uuid) -> Uuid {
        let sid = Uuid::new_v4();
        self.inner.lock().await.auth_sessions.insert(sid, user_id);
        sid
    }

    /// Resolve a `sid` cookie to its user, if the mapping exists
    pub async fn resolve_auth_session(&self, sid: Uuid) -> Option<User> {
        let inner = self.inner.lock().await;
        let user_id = inner.auth_sessions.get(&sid)?;
        inner.users.get(user_id).cloned()
    }

    /// Drop an auth session; returns whether a mapping existed
    pub async fn remove_auth_session(&self, sid: Uuid) -> bool {
        self.inner.lock().await.auth_sessions.remove(&sid).is_some()
    }

    // ---- chat sessions ----

    pub async fn create_session(&self, user_id: Uuid, title: Option<String>) -> ChatSession {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id,
            title,
            status: SessionStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        session
    }

    /// List the caller's sessions, most recently updated first, annotated
    /// with a preview of the latest message. Cursor is the last-seen
    /// session id; no snapshot isolation across pages.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
        cursor: Option<Uuid>,
    ) -> Vec<SessionSummary> {
        let inner = self.inner.lock().await;
        let mut owned: Vec<&ChatSession> = inner
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

        let start = match cursor {
            Some(cursor_id) => match owned.iter().position(|s| s.id == cursor_id) {
                Some(pos) => pos + 1,
                // Unknown cursor (e.g. the session was deleted): start over
                None => 0,
            },
            None => 0,
        };
        let limit = limit.unwrap_or(DEFAULT_SESSION_LIMIT);

        owned
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|session| {
                let latest = inner
                    .messages
                    .values()
                    .filter(|m| m.session_id == session.id)
                    .max_by_key(|m| m.created_at);
                SessionSummary {
                    session: session.clone(),
                    preview: latest.map(|m| truncate_chars(&m.content, PREVIEW_LEN)),
                    message_count: count_messages(&inner, session.id),
                }
            })
            .collect()
    }

    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> Result<SessionDetail> {
        let inner = self.inner.lock().await;
        let session = owned_session(&inner, user_id, session_id)?.clone();
        let message_count = count_messages(&inner, session_id);
        Ok(SessionDetail {
            session,
            message_count,
        })
    }

    /// Partial update of title/status; bumps `updatedAt`
    pub async fn update_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        patch: UpdateSessionRequest,
    ) -> Result<ChatSession> {
        let mut inner = self.inner.lock().await;
        owned_session(&inner, user_id, session_id)?;
        let session = inner
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::NotFound("session"))?;
        if let Some(title) = patch.title {
            session.title = Some(title);
        }
        if let Some(status) = patch.status {
            session.status = status;
        }
        session.updated_at = advance(session.updated_at);
        Ok(session.clone())
    }

    /// Delete a session and cascade to its messages, their feedback, and
    /// their citations
    pub async fn delete_session(&self, user_id: Uuid, session_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        owned_session(&inner, user_id, session_id)?;
        inner.sessions.remove(&session_id);

        let message_ids: Vec<Uuid> = inner
            .messages
            .values()
            .filter(|m| m.session_id == session_id)
            .map(|m| m.id)
            .collect();
        inner.messages.retain(|_, m| m.session_id != session_id);
        inner
            .feedback
            .retain(|_, f| !message_ids.contains(&f.message_id));
        inner
            .citations
            .retain(|_, c| !message_ids.contains(&c.message_id));
        Ok(())
    }

    // ---- messages ----

    /// Append a message to a session. Bumps the session's `updatedAt`, and
    /// on the session's first user message derives the title from the
    /// content. Message `createdAt` is kept strictly increasing per
    /// session so insertion order is recoverable from timestamps alone.
    pub async fn append_message(
        &self,
        session_id: Uuid,
        role: MessageRole,
        content: String,
        meta: MetaBag,
    ) -> Result<ChatMessage> {
        let mut inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&session_id) {
            return Err(StoreError::NotFound("session"));
        }

        let mut created_at = Utc::now();
        if let Some(last) = inner
            .messages
            .values()
            .filter(|m| m.session_id == session_id)
            .map(|m| m.created_at)
            .max()
        {
            if created_at <= last {
                created_at = last + Duration::milliseconds(1);
            }
        }

        let first_user_message = role == MessageRole::User
            && !inner
                .messages
                .values()
                .any(|m| m.session_id == session_id && m.role == MessageRole::User);

        let message = ChatMessage {
            id: Uuid::new_v4(),
            session_id,
            role,
            content,
            meta,
            created_at,
        };
        inner.messages.insert(message.id, message.clone());

        if let Some(session) = inner.sessions.get_mut(&session_id) {
            if first_user_message && session.title.is_none() {
                session.title = Some(truncate_chars(&message.content, TITLE_LEN));
            }
            session.updated_at = advance(session.updated_at);
        }
        Ok(message)
    }

    /// Full conversation history for a session, oldest first
    pub async fn history(&self, session_id: Uuid) -> Vec<ChatMessage> {
        let inner = self.inner.lock().await;
        let mut history: Vec<ChatMessage> = inner
            .messages
            .values()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        history.sort_by_key(|m| m.created_at);
        history
    }

    /// List a session's messages in `createdAt` order, with citations
    /// attached to assistant messages. Cursor is the last-seen message id.
    pub async fn list_messages(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        limit: Option<usize>,
        cursor: Option<Uuid>,
        direction: Option<Direction>,
    ) -> Result<Vec<MessageWithCitations>> {
        let inner = self.inner.lock().await;
        owned_session(&inner, user_id, session_id)?;

        let mut messages: Vec<&ChatMessage> = inner
            .messages
            .values()
            .filter(|m| m.session_id == session_id)
            .collect();
        messages.sort_by_key(|m| m.created_at);
        if direction == Some(Direction::Desc) {
            messages.reverse();
        }

        let start = match cursor {
            Some(cursor_id) => match messages.iter().position(|m| m.id == cursor_id) {
                Some(pos) => pos + 1,
                None => 0,
            },
            None => 0,
        };
        let limit = limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);

        Ok(messages
            .into_iter()
            .skip(start)
            .take(limit)
            .map(|message| {
                let citations = if message.role == MessageRole::Assistant {
                    inner
                        .citations
                        .values()
                        .filter(|c| c.message_id == message.id)
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                MessageWithCitations {
                    message: message.clone(),
                    citations,
                }
            })
            .collect())
    }

    // ---- citations ----

    pub async fn insert_citations(&self, citations: Vec<MessageCitation>) {
        let mut inner = self.inner.lock().await;
        for citation in citations {
            inner.citations.insert(citation.id, citation);
        }
    }

    pub async fn citations_for(&self, message_id: Uuid) -> Vec<MessageCitation> {
        self.inner
            .lock()
            .await
            .citations
            .values()
            .filter(|c| c.message_id == message_id)
            .cloned()
            .collect()
    }

    // ---- feedback ----

    /// Record a rating against a message. Ownership is validated through
    /// the message's parent session: absent message is 404, foreign owner
    /// is 403. Repeated calls append new rows (multiple reviews allowed).
    pub async fn add_feedback(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        rating: i8,
        note: Option<String>,
    ) -> Result<MessageFeedback> {
        let mut inner = self.inner.lock().await;
        let session_id = inner
            .messages
            .get(&message_id)
            .map(|m| m.session_id)
            .ok_or(StoreError::NotFound("message"))?;
        let session = inner
            .sessions
            .get(&session_id)
            .ok_or(StoreError::NotFound("session"))?;
        if session.user_id != user_id {
            return Err(StoreError::Forbidden("not the session owner"));
        }

        let feedback = MessageFeedback {
            id: Uuid::new_v4(),
            message_id,
            user_id,
            rating,
            note,
            created_at: Utc::now(),
        };
        inner.feedback.insert(feedback.id, feedback.clone());
        Ok(feedback)
    }

    /// Number of feedback rows for a message (test/inspection helper)
    pub async fn feedback_count(&self, message_id: Uuid) -> usize {
        self.inner
            .lock()
            .await
            .feedback
            .values()
            .filter(|f| f.message_id == message_id)
            .count()
    }
}

/// Ownership check precedes existence disclosure: a foreign session reads
/// as absent, never as forbidden
fn owned_session<'a>(
    inner: &'a StoreInner,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<&'a ChatSession> {
    inner
        .sessions
        .get(&session_id)
        .filter(|s| s.user_id == user_id)
        .ok_or(StoreError::NotFound("session"))
}

fn count_messages(inner: &StoreInner, session_id: Uuid) -> usize {
    inner
        .messages
        .values()
        .filter(|m| m.session_id == session_id)
        .count()
}

/// Bump a timestamp to now, nudging forward on clock ties so `updatedAt`
/// always advances
fn advance(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
/// Operates on chars, not bytes, so multibyte content stays valid.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> (ChatStore, User) {
        let store = ChatStore::new();
        let user = store.upsert_user("demo@tecace.com", Role::User).await;
        (store, user)
    }

    #[tokio::test]
    async fn test_upsert_user_is_keyed_by_email() {
        let store = ChatStore::new();
        let first = store.upsert_user("demo@tecace.com", Role::User).await;
        let second = store.upsert_user("demo@tecace.com", Role::User).await;
        assert_eq!(first.id, second.id);

        let other = store.upsert_user("admin@tecace.com", Role::Admin).await;
        assert_ne!(first.id, other.id);
        assert_eq!(other.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_auth_session_lifecycle() {
        let (store, user) = store_with_user().await;
        let sid = store.create_auth_session(user.id).await;

        let resolved = store.resolve_auth_session(sid).await;
        assert_eq!(resolved.map(|u| u.id), Some(user.id));

        assert!(store.remove_auth_session(sid).await);
        assert!(store.resolve_auth_session(sid).await.is_none());
        assert!(!store.remove_auth_session(sid).await);
    }

    #[tokio::test]
    async fn test_new_session_is_open_and_untitled() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;

        let detail = store.get_session(user.id, session.id).await.unwrap();
        assert_eq!(detail.session.status, SessionStatus::Open);
        assert!(detail.session.title.is_none());
        assert_eq!(detail.message_count, 0);
    }

    #[tokio::test]
    async fn test_get_session_hides_foreign_sessions() {
        let (store, owner) = store_with_user().await;
        let stranger = store.upsert_user("admin@tecace.com", Role::Admin).await;
        let session = store.create_session(owner.id, None).await;

        // Not-owned reads as absent, not forbidden
        let err = store.get_session(stranger.id, session.id).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("session"));
    }

    #[tokio::test]
    async fn test_first_user_message_derives_title() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;

        store
            .append_message(
                session.id,
                MessageRole::User,
                "What is a derivative?".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap();

        let detail = store.get_session(user.id, session.id).await.unwrap();
        assert_eq!(detail.session.title.as_deref(), Some("What is a derivative?"));
    }

    #[tokio::test]
    async fn test_long_first_message_title_is_truncated() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;
        let content = "x".repeat(80);

        store
            .append_message(session.id, MessageRole::User, content, MetaBag::new())
            .await
            .unwrap();

        let detail = store.get_session(user.id, session.id).await.unwrap();
        let title = detail.session.title.unwrap();
        assert_eq!(title.chars().count(), TITLE_LEN + 3);
        assert!(title.ends_with("..."));
    }

    #[tokio::test]
    async fn test_explicit_title_is_not_overwritten() {
        let (store, user) = store_with_user().await;
        let session = store
            .create_session(user.id, Some("Physics office hours".to_string()))
            .await;

        store
            .append_message(session.id, MessageRole::User, "Hi".to_string(), MetaBag::new())
            .await
            .unwrap();

        let detail = store.get_session(user.id, session.id).await.unwrap();
        assert_eq!(detail.session.title.as_deref(), Some("Physics office hours"));
    }

    #[tokio::test]
    async fn test_message_timestamps_strictly_increase_per_session() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;

        for i in 0..5 {
            store
                .append_message(
                    session.id,
                    MessageRole::User,
                    format!("message {}", i),
                    MetaBag::new(),
                )
                .await
                .unwrap();
        }

        let history = store.history(session.id).await;
        assert_eq!(history.len(), 5);
        for pair in history.windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
        }
        assert_eq!(history[0].content, "message 0");
        assert_eq!(history[4].content, "message 4");
    }

    #[tokio::test]
    async fn test_append_to_missing_session_fails() {
        let (store, _user) = store_with_user().await;
        let err = store
            .append_message(
                Uuid::new_v4(),
                MessageRole::User,
                "hello".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("session"));
    }

    #[tokio::test]
    async fn test_list_sessions_orders_by_updated_at_and_previews() {
        let (store, user) = store_with_user().await;
        let older = store.create_session(user.id, None).await;
        let newer = store.create_session(user.id, None).await;

        // Touching the older session moves it to the front
        store
            .append_message(
                older.id,
                MessageRole::User,
                "Tell me about photosynthesis".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap();

        let listed = store.list_sessions(user.id, None, None).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].session.id, older.id);
        assert_eq!(listed[1].session.id, newer.id);
        assert_eq!(
            listed[0].preview.as_deref(),
            Some("Tell me about photosynthesis")
        );
        assert!(listed[1].preview.is_none());
        assert_eq!(listed[0].message_count, 1);
    }

    #[tokio::test]
    async fn test_list_sessions_preview_is_truncated() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;
        store
            .append_message(
                session.id,
                MessageRole::User,
                "y".repeat(150),
                MetaBag::new(),
            )
            .await
            .unwrap();

        let listed = store.list_sessions(user.id, None, None).await;
        let preview = listed[0].preview.clone().unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_LEN + 3);
        assert!(preview.ends_with("..."));
    }

    #[tokio::test]
    async fn test_list_sessions_cursor_pagination() {
        let (store, user) = store_with_user().await;
        for _ in 0..5 {
            store.create_session(user.id, None).await;
        }

        let first_page = store.list_sessions(user.id, Some(2), None).await;
        assert_eq!(first_page.len(), 2);

        let cursor = first_page[1].session.id;
        let second_page = store.list_sessions(user.id, Some(2), Some(cursor)).await;
        assert_eq!(second_page.len(), 2);

        let cursor = second_page[1].session.id;
        let last_page = store.list_sessions(user.id, Some(2), Some(cursor)).await;
        assert_eq!(last_page.len(), 1);

        // All five sessions seen exactly once
        let mut seen: Vec<Uuid> = first_page
            .iter()
            .chain(&second_page)
            .chain(&last_page)
            .map(|s| s.session.id)
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_update_session_bumps_updated_at() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;

        let updated = store
            .update_session(
                user.id,
                session.id,
                UpdateSessionRequest {
                    title: Some("Renamed".to_string()),
                    status: Some(SessionStatus::Closed),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title.as_deref(), Some("Renamed"));
        assert_eq!(updated.status, SessionStatus::Closed);
        assert!(updated.updated_at > session.updated_at);
    }

    #[tokio::test]
    async fn test_delete_session_cascades() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;
        let message = store
            .append_message(
                session.id,
                MessageRole::Assistant,
                "Here is an answer".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap();
        store
            .insert_citations(vec![MessageCitation {
                id: Uuid::new_v4(),
                message_id: message.id,
                source_type: crate::models::SourceType::Web,
                source_id: "https://example.com".to_string(),
                title: "Example".to_string(),
                snippet: "snippet".to_string(),
                metadata: MetaBag::new(),
            }])
            .await;
        store
            .add_feedback(user.id, message.id, 1, None)
            .await
            .unwrap();

        store.delete_session(user.id, session.id).await.unwrap();

        let err = store.get_session(user.id, session.id).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("session"));
        assert!(store.history(session.id).await.is_empty());
        assert!(store.citations_for(message.id).await.is_empty());
        assert_eq!(store.feedback_count(message.id).await, 0);
    }

    #[tokio::test]
    async fn test_list_messages_attaches_assistant_citations() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;
        store
            .append_message(session.id, MessageRole::User, "Q".to_string(), MetaBag::new())
            .await
            .unwrap();
        let answer = store
            .append_message(
                session.id,
                MessageRole::Assistant,
                "A".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap();
        store
            .insert_citations(vec![MessageCitation {
                id: Uuid::new_v4(),
                message_id: answer.id,
                source_type: crate::models::SourceType::Kb,
                source_id: "kb-1".to_string(),
                title: "KB article".to_string(),
                snippet: "...".to_string(),
                metadata: MetaBag::new(),
            }])
            .await;

        let listed = store
            .list_messages(user.id, session.id, None, None, None)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].citations.is_empty());
        assert_eq!(listed[1].citations.len(), 1);
        assert_eq!(listed[1].citations[0].source_id, "kb-1");
    }

    #[tokio::test]
    async fn test_list_messages_desc_and_cursor() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;
        for i in 0..4 {
            store
                .append_message(
                    session.id,
                    MessageRole::User,
                    format!("m{}", i),
                    MetaBag::new(),
                )
                .await
                .unwrap();
        }

        let newest_first = store
            .list_messages(user.id, session.id, Some(2), None, Some(Direction::Desc))
            .await
            .unwrap();
        assert_eq!(newest_first[0].message.content, "m3");
        assert_eq!(newest_first[1].message.content, "m2");

        let cursor = newest_first[1].message.id;
        let next = store
            .list_messages(user.id, session.id, Some(2), Some(cursor), Some(Direction::Desc))
            .await
            .unwrap();
        assert_eq!(next[0].message.content, "m1");
        assert_eq!(next[1].message.content, "m0");
    }

    #[tokio::test]
    async fn test_feedback_requires_ownership() {
        let (store, owner) = store_with_user().await;
        let stranger = store.upsert_user("admin@tecace.com", Role::Admin).await;
        let session = store.create_session(owner.id, None).await;
        let message = store
            .append_message(
                session.id,
                MessageRole::Assistant,
                "answer".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap();

        let err = store
            .add_feedback(stranger.id, message.id, -1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        // No row was created
        assert_eq!(store.feedback_count(message.id).await, 0);

        let err = store
            .add_feedback(owner.id, Uuid::new_v4(), 1, None)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("message"));
    }

    #[tokio::test]
    async fn test_feedback_is_not_idempotent() {
        let (store, user) = store_with_user().await;
        let session = store.create_session(user.id, None).await;
        let message = store
            .append_message(
                session.id,
                MessageRole::Assistant,
                "answer".to_string(),
                MetaBag::new(),
            )
            .await
            .unwrap();

        store.add_feedback(user.id, message.id, 1, None).await.unwrap();
        store
            .add_feedback(user.id, message.id, 1, Some("still good".to_string()))
            .await
            .unwrap();
        assert_eq!(store.feedback_count(message.id).await, 2);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        // Multibyte content is cut on char boundaries, not bytes
        assert_eq!(truncate_chars("안녕하세요", 3), "안녕하...");
    }
}
