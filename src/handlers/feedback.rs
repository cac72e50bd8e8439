// Feedback submission handler

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{reject, ApiError};
use crate::models::{FeedbackRequest, User};
use crate::store::ChatStore;

/// POST /api/messages/:id/feedback
pub async fn submit_feedback_handler(
    message_id: Uuid,
    user: User,
    request: FeedbackRequest,
    store: Arc<ChatStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if request.rating != 1 && request.rating != -1 {
        return Err(reject(ApiError::BadRequest(
            "rating must be +1 or -1".to_string(),
        )));
    }

    store
        .add_feedback(user.id, message_id, request.rating, request.note)
        .await
        .map_err(reject)?;
    tracing::info!(message_id = %message_id, user = %user.email, rating = request.rating, "feedback recorded");
    Ok(warp::reply::json(&serde_json::json!({"success": true})))
}
