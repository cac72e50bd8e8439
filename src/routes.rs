// Route definitions and wiring

use std::convert::Infallible;
use std::sync::Arc;

use uuid::Uuid;
use warp::Filter;

use crate::auth::{self, with_auth, SESSION_COOKIE};
use crate::connector::ChatConnector;
use crate::handlers;
use crate::models::PageQuery;
use crate::store::ChatStore;

fn with_store(
    store: Arc<ChatStore>,
) -> impl Filter<Extract = (Arc<ChatStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn with_connector(
    connector: Arc<dyn ChatConnector>,
) -> impl Filter<Extract = (Arc<dyn ChatConnector>,), Error = Infallible> + Clone {
    warp::any().map(move || connector.clone())
}

pub fn configure_routes(
    store: Arc<ChatStore>,
    connector: Arc<dyn ChatConnector>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = warp::path("api");

    // GET /api/health
    let health = api
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "ok"})));

    // POST /api/auth/demo-login
    let login = api
        .and(warp::path("auth"))
        .and(warp::path("demo-login"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(auth::login_handler);

    // GET /api/auth/me
    let me = api
        .and(warp::path("auth"))
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_auth(store.clone()))
        .and_then(auth::me_handler);

    // POST /api/auth/logout
    let logout = api
        .and(warp::path("auth"))
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_auth(store.clone()))
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and(with_store(store.clone()))
        .and_then(auth::logout_handler);

    // GET /api/sessions
    let list_sessions = api
        .and(warp::path("sessions"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_auth(store.clone()))
        .and(warp::query::<PageQuery>())
        .and(with_store(store.clone()))
        .and_then(handlers::list_sessions_handler);

    // POST /api/sessions
    let create_session = api
        .and(warp::path("sessions"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_auth(store.clone()))
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(handlers::create_session_handler);

    // GET /api/sessions/{sessionId}
    let get_session = api
        .and(warp::path("sessions"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_auth(store.clone()))
        .and(with_store(store.clone()))
        .and_then(handlers::get_session_handler);

    // PATCH /api/sessions/{sessionId}
    let update_session = api
        .and(warp::path("sessions"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path::end())
        .and(warp::patch())
        .and(with_auth(store.clone()))
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(handlers::update_session_handler);

    // DELETE /api/sessions/{sessionId}
    let delete_session = api
        .and(warp::path("sessions"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_auth(store.clone()))
        .and(with_store(store.clone()))
        .and_then(handlers::delete_session_handler);

    // GET /api/sessions/{sessionId}/messages
    let list_messages = api
        .and(warp::path("sessions"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path("messages"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_auth(store.clone()))
        .and(warp::query::<PageQuery>())
        .and(with_store(store.clone()))
        .and_then(handlers::list_messages_handler);

    // POST /api/sessions/{sessionId}/messages
    let send_message = api
        .and(warp::path("sessions"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path("messages"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_auth(store.clone()))
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and(with_connector(connector))
        .and_then(handlers::send_message_handler);

    // POST /api/messages/{messageId}/feedback
    let submit_feedback = api
        .and(warp::path("messages"))
        .and(warp::path::param::<Uuid>())
        .and(warp::path("feedback"))
        .and(warp::path::end())
        .and(warp::post())
        .and(with_auth(store.clone()))
        .and(warp::body::json())
        .and(with_store(store))
        .and_then(handlers::submit_feedback_handler);

    // Combine routes
    health
        .or(login)
        .or(me)
        .or(logout)
        .or(list_sessions)
        .or(create_session)
        .or(get_session)
        .or(update_session)
        .or(delete_session)
        .or(list_messages)
        .or(send_message)
        .or(submit_feedback)
}
