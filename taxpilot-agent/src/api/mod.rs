//! HTTP API handlers for taxpilot-agent

pub mod chat;
pub mod health;
pub mod session;
pub mod upload;

pub use chat::post_chat;
pub use health::health_routes;
pub use session::{get_session, get_tax_return};
pub use upload::post_upload;
