//! HTTP error taxonomy and rejection handling
//!
//! Every failure a handler can produce funnels through `ApiError`, which
//! carries its HTTP status; the `recover` filter at the end of the route
//! chain renders it as an `{"error": ...}` JSON body. Streaming replies
//! are the one exception: once the response has started, connector
//! failures are reported as in-band `error` events instead.

use serde::Serialize;
use warp::http::StatusCode;

use crate::connector::ConnectorError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or unknown session cookie
    #[error("unauthorized")]
    Unauthorized,

    /// Record absent or not owned by the caller
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Ownership mismatch (feedback against a foreign session)
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Invalid credentials or request payload
    #[error("{0}")]
    BadRequest(String),

    /// The connector failed while generating a reply
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl warp::reject::Reject for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Forbidden(why) => ApiError::Forbidden(why),
        }
    }
}

impl From<ConnectorError> for ApiError {
    fn from(err: ConnectorError) -> Self {
        ApiError::UpstreamFailure(err.to_string())
    }
}

/// Wrap an error in a warp rejection
pub fn reject(err: impl Into<ApiError>) -> warp::Rejection {
    warp::reject::custom(err.into())
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Map rejections to JSON error responses
pub async fn handle_rejection(
    err: warp::Rejection,
) -> Result<impl warp::Reply, std::convert::Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(api_err) = err.find::<ApiError>() {
        if api_err.status().is_server_error() {
            tracing::error!(error = %api_err, "request failed");
        }
        (api_err.status(), api_err.to_string())
    } else if let Some(body_err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, body_err.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        tracing::error!(?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
