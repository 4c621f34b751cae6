//! Notification configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a rendered report leaves the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    /// Print the plain-text report and log a summary
    Log,
    /// Write text and HTML bodies into `outbox_dir`
    Outbox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub delivery: DeliveryKind,
    /// Target directory for outbox delivery
    pub outbox_dir: PathBuf,
    /// Report title
    pub subject: String,
    /// Skip delivery when no site produced items or messages
    pub skip_empty: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryKind::Log,
            outbox_dir: PathBuf::from(".linkwatch/outbox"),
            subject: "New links".to_string(),
            skip_empty: true,
        }
    }
}
