//! Event routing engine.
//!
//! [`NotificationRouter`] consumes [`PlatformEvent`]s and:
//!
//! - turns `sales_request.status_changed` into a persisted notification for
//!   the request's owner, typed by the new status;
//! - forwards `notification.*` events to the owner's connections;
//! - broadcasts `templates.changed` for every `template.*` event so other
//!   sessions refetch their lists.

use std::sync::Arc;

use docflow_core::contract::ContractStatus;
use docflow_core::notification::{kind_for_status, status_change_text};
use docflow_core::types::DbId;
use docflow_db::models::notification::CreateNotification;
use docflow_db::store::NotificationStore;
use docflow_db::StoreError;
use docflow_events::{event_types, PlatformEvent};
use tokio::sync::broadcast;

use crate::ws::{FeedMessage, WsManager};

/// Feed message type broadcast when any template list changes.
pub const TEMPLATES_CHANGED: &str = "templates.changed";

/// Feed message type broadcast when branding settings change.
pub const CUSTOMIZATIONS_CHANGED: &str = "customizations.changed";

pub struct NotificationRouter {
    notifications: Arc<dyn NotificationStore>,
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(notifications: Arc<dyn NotificationStore>, ws_manager: Arc<WsManager>) -> Self {
        Self {
            notifications,
            ws_manager,
        }
    }

    /// Run the routing loop until the [`EventBus`](docflow_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event.
    pub async fn route_event(&self, event: &PlatformEvent) -> Result<(), StoreError> {
        match event.event_type.as_str() {
            event_types::SALES_REQUEST_STATUS_CHANGED => self.notify_status_change(event).await,

            event_types::NOTIFICATION_CREATED
            | event_types::NOTIFICATION_READ
            | event_types::NOTIFICATION_READ_ALL
            | event_types::NOTIFICATION_DELETED => {
                if let Some(user_id) = event.payload_id("user_id") {
                    self.push_to_user(user_id, &event.event_type, event.payload.clone())
                        .await;
                }
                Ok(())
            }

            t if event_types::is_template_event(t) => {
                let data = serde_json::json!({
                    "event": t,
                    "entity": event.source_entity_type,
                    "id": event.source_entity_id,
                });
                self.broadcast(TEMPLATES_CHANGED, data).await;
                Ok(())
            }

            event_types::CUSTOMIZATION_CHANGED => {
                self.broadcast(CUSTOMIZATIONS_CHANGED, event.payload.clone())
                    .await;
                Ok(())
            }

            _ => Ok(()),
        }
    }

    /// Create the owner's notification for a status change and push it.
    async fn notify_status_change(&self, event: &PlatformEvent) -> Result<(), StoreError> {
        let Some(owner_id) = event.payload_id("owner_id") else {
            tracing::warn!("Status change event without owner_id, skipping");
            return Ok(());
        };
        let Some(status) = event
            .payload_str("status")
            .and_then(|s| s.parse::<ContractStatus>().ok())
        else {
            tracing::warn!("Status change event without a valid status, skipping");
            return Ok(());
        };
        let client_name = event.payload_str("client_name").unwrap_or_default();

        let (title, message) = status_change_text(client_name, status);
        let notification = self
            .notifications
            .create(&CreateNotification {
                user_id: owner_id,
                title,
                message,
                kind: kind_for_status(status),
            })
            .await?;

        tracing::debug!(
            user_id = owner_id,
            notification_id = notification.id,
            status = %status,
            "Status change notification created"
        );

        let data = serde_json::json!({
            "user_id": owner_id,
            "notification": notification,
        });
        self.push_to_user(owner_id, event_types::NOTIFICATION_CREATED, data)
            .await;
        Ok(())
    }

    async fn push_to_user(&self, user_id: DbId, kind: &str, data: serde_json::Value) {
        let msg = FeedMessage::new(kind, data).to_ws_message();
        let delivered = self.ws_manager.send_to_user(user_id, msg).await;
        tracing::trace!(user_id, kind, delivered, "Pushed feed message");
    }

    async fn broadcast(&self, kind: &str, data: serde_json::Value) {
        let msg = FeedMessage::new(kind, data).to_ws_message();
        self.ws_manager.broadcast(msg).await;
    }
}
