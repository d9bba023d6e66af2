//! Docflow event bus and outbound delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope, with the event names in
//!   [`event_types`].
//! - [`delivery`]: outbound channels (SMTP email).

pub mod bus;
pub mod delivery;

pub use bus::{event_types, EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
