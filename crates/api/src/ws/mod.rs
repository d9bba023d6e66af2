//! WebSocket change feed.
//!
//! Clients connect to `/api/v1/ws?token=<access token>` and receive JSON
//! messages whenever their notifications or the shared template lists
//! change. A periodic ping keeps idle connections alive.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{FeedMessage, WsManager};
