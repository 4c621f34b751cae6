//! Delivery of rendered notifications

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

use super::render::Rendered;
use crate::config::{DeliveryKind, NotifyConfig};

/// Sink for one rendered notification per cycle
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, message: &Rendered) -> Result<()>;
}

/// Prints the plain-text body to stdout
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, message: &Rendered) -> Result<()> {
        info!("Delivering notification: {}", message.subject);
        println!("{}", message.text);
        Ok(())
    }
}

/// Writes `<timestamp>.txt` and `<timestamp>.html` into a directory for a
/// mail relay to pick up
pub struct OutboxDelivery {
    dir: PathBuf,
}

impl OutboxDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl Delivery for OutboxDelivery {
    async fn deliver(&self, message: &Rendered) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create outbox directory {:?}", self.dir))?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let text_path = self.dir.join(format!("{}.txt", stamp));
        let html_path = self.dir.join(format!("{}.html", stamp));

        let text = format!("Subject: {}\n\n{}", message.subject, message.text);
        tokio::fs::write(&text_path, text)
            .await
            .with_context(|| format!("Failed to write {:?}", text_path))?;
        tokio::fs::write(&html_path, &message.html)
            .await
            .with_context(|| format!("Failed to write {:?}", html_path))?;

        info!("Wrote notification to {:?}", text_path);
        Ok(())
    }
}

/// Build the delivery configured in `[notify]`
pub fn from_config(config: &NotifyConfig) -> Box<dyn Delivery> {
    match config.delivery {
        DeliveryKind::Log => Box::new(LogDelivery),
        DeliveryKind::Outbox => Box::new(OutboxDelivery::new(&config.outbox_dir)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rendered() -> Rendered {
        Rendered {
            subject: "New links (1)".to_string(),
            text: "New links (1)\n".to_string(),
            html: "<html></html>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_outbox_writes_both_bodies() {
        let temp_dir = TempDir::new().unwrap();
        let outbox = OutboxDelivery::new(temp_dir.path().join("outbox"));
        outbox.deliver(&rendered()).await.unwrap();

        let mut names: Vec<String> = std::fs::read_dir(outbox.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with(".html"));
        assert!(names[1].ends_with(".txt"));

        let text = std::fs::read_to_string(outbox.dir().join(&names[1])).unwrap();
        assert!(text.starts_with("Subject: New links (1)\n\n"));
    }

    #[tokio::test]
    async fn test_log_delivery_succeeds() {
        assert!(LogDelivery.deliver(&rendered()).await.is_ok());
    }

    #[test]
    fn test_from_config_picks_outbox() {
        let config = NotifyConfig {
            delivery: DeliveryKind::Outbox,
            ..NotifyConfig::default()
        };
        // Only checks construction; nothing is written
        let _delivery = from_config(&config);
    }
}
