//! Configuration for linkwatch

mod ledger;
mod logging;
mod notify;
mod scraping;
mod site;

pub use ledger::LedgerConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use notify::{DeliveryKind, NotifyConfig};
pub use scraping::ScrapingConfig;
pub use site::{SiteConfig, DEFAULT_MIN_CAPTION_WORDS};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::scraping::extractor::SelectorConfig;

/// Default user agent for all HTTP requests
pub const DEFAULT_USER_AGENT: &str = "linkwatch/0.1 (+https://github.com/linkwatch/linkwatch)";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch and scheduling configuration
    #[serde(default)]
    pub scraping: ScrapingConfig,
    /// Dedup ledger configuration
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Watched sites
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors = self.scalar_errors();
        if let Err(site_errors) = self.compile_sites() {
            errors.extend(site_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }

    /// Compiled selector configuration for every site
    pub fn selector_configs(&self) -> Result<Vec<SelectorConfig>> {
        self.compile_sites().map_err(|errors| {
            anyhow::anyhow!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        })
    }

    fn scalar_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.scraping.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be positive".to_string());
        }
        if self.scraping.site_timeout_secs == 0 {
            errors.push("site_timeout_secs must be positive".to_string());
        }
        if self.scraping.interval_secs == 0 {
            errors.push("interval_secs must be positive".to_string());
        }
        if self.scraping.user_agent.trim().is_empty() {
            errors.push("user_agent must not be empty".to_string());
        }
        if self.ledger.ttl_hours == 0 {
            errors.push("ledger ttl_hours must be positive".to_string());
        }
        if self.ledger.path.as_os_str().is_empty() {
            errors.push("ledger path must not be empty".to_string());
        }
        if self.notify.delivery == DeliveryKind::Outbox && self.notify.outbox_dir.as_os_str().is_empty() {
            errors.push("outbox_dir must be set for outbox delivery".to_string());
        }

        errors
    }

    fn compile_sites(&self) -> std::result::Result<Vec<SelectorConfig>, Vec<String>> {
        let mut errors = Vec::new();
        let mut compiled = Vec::with_capacity(self.sites.len());

        if self.sites.is_empty() {
            errors.push("no sites configured".to_string());
        }

        let mut names = HashSet::new();
        for site in &self.sites {
            if !names.insert(site.name.as_str()) {
                errors.push(format!("duplicate site name '{}'", site.name));
            }
            match site.to_selector_config() {
                Ok(config) => compiled.push(config),
                Err(site_errors) => errors.extend(site_errors),
            }
        }

        if errors.is_empty() {
            Ok(compiled)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            sites: vec![
                SiteConfig::automatic("front", "https://example.com", "h2 a"),
                SiteConfig::manual("most-read", "https://example.org/popular", "li", ".title", "a"),
            ],
            ..Config::default()
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
        assert_eq!(valid_config().selector_configs().unwrap().len(), 2);
    }

    #[test]
    fn validate_rejects_missing_sites() {
        let cfg = Config::default();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("no sites configured"), "{}", err);
    }

    #[test]
    fn validate_rejects_duplicate_site_names() {
        let mut cfg = valid_config();
        cfg.sites.push(SiteConfig::automatic("front", "https://example.net", "a"));
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate site name 'front'"), "{}", err);
    }

    #[test]
    fn validate_collects_all_errors() {
        let mut cfg = valid_config();
        cfg.scraping.site_timeout_secs = 0;
        cfg.ledger.ttl_hours = 0;
        cfg.sites[0].link_selector = "a[".to_string();

        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("site_timeout_secs must be positive"), "{}", msg);
        assert!(msg.contains("ttl_hours must be positive"), "{}", msg);
        assert!(msg.contains("invalid link_selector"), "{}", msg);
    }

    #[test]
    fn load_parses_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("linkwatch.toml");
        std::fs::write(
            &path,
            r#"
[scraping]
interval_secs = 600

[ledger]
path = "/tmp/ledger"
ttl_hours = 24

[notify]
delivery = "outbox"
outbox_dir = "/tmp/outbox"

[logging]
format = "json"
level = "debug"

[[sites]]
name = "front"
url = "https://example.com"
link_selector = "h2 a"
max_items = 5
"#,
        )
        .unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.scraping.interval_secs, 600);
        assert_eq!(cfg.scraping.site_timeout_secs, 60);
        assert_eq!(cfg.ledger.path, PathBuf::from("/tmp/ledger"));
        assert_eq!(cfg.notify.delivery, DeliveryKind::Outbox);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.level, LogLevel::Debug);
        assert_eq!(cfg.sites[0].max_items, 5);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/linkwatch.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
