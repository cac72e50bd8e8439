// Handlers module

pub mod feedback;
pub mod messages;
pub mod sessions;

pub use feedback::submit_feedback_handler;
pub use messages::{list_messages_handler, send_message_handler};
pub use sessions::{
    create_session_handler, delete_session_handler, get_session_handler, list_sessions_handler,
    update_session_handler,
};
