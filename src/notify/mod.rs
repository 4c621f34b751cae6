//! Notification: one rendered report per cycle, handed to a delivery sink

pub mod delivery;
mod render;

pub use delivery::{Delivery, LogDelivery, OutboxDelivery};
pub use render::{Rendered, Renderer};
