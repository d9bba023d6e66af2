use std::sync::Arc;

use docflow_db::Stores;
use docflow_events::{EmailDelivery, EventBus};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Injected storage (PostgreSQL or in-memory).
    pub stores: Stores,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<EventBus>,
    /// `None` when SMTP is not configured; reset emails are then only logged.
    pub mailer: Option<Arc<EmailDelivery>>,
}
