//! Event-to-client routing.
//!
//! The [`NotificationRouter`] subscribes to the event bus, persists the
//! notifications that status changes imply, and pushes change-feed messages
//! to WebSocket clients.

pub mod router;

pub use router::NotificationRouter;
