// Session CRUD handlers

use std::convert::Infallible;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::reject;
use crate::models::{CreateSessionRequest, PageQuery, UpdateSessionRequest, User};
use crate::store::ChatStore;

/// GET /api/sessions
pub async fn list_sessions_handler(
    user: User,
    query: PageQuery,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, Infallible> {
    let sessions = store
        .list_sessions(user.id, query.limit, query.cursor)
        .await;
    Ok(warp::reply::json(&sessions))
}

/// POST /api/sessions
pub async fn create_session_handler(
    user: User,
    request: CreateSessionRequest,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, Infallible> {
    let session = store.create_session(user.id, request.title).await;
    tracing::info!(session_id = %session.id, user = %user.email, "session created");
    Ok(warp::reply::json(&serde_json::json!({"id": session.id})))
}

/// GET /api/sessions/:id
pub async fn get_session_handler(
    session_id: Uuid,
    user: User,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let detail = store
        .get_session(user.id, session_id)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&detail))
}

/// PATCH /api/sessions/:id
pub async fn update_session_handler(
    session_id: Uuid,
    user: User,
    request: UpdateSessionRequest,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session = store
        .update_session(user.id, session_id, request)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&session))
}

/// DELETE /api/sessions/:id
pub async fn delete_session_handler(
    session_id: Uuid,
    user: User,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    store
        .delete_session(user.id, session_id)
        .await
        .map_err(reject)?;
    tracing::info!(session_id = %session_id, user = %user.email, "session deleted");
    Ok(warp::reply::json(&serde_json::json!({"success": true})))
}
