use anyhow::{Context, Result};
use linkwatch::config::Config;
use std::path::PathBuf;

/// Commented example configuration with the current defaults filled in
pub fn example_config() -> String {
    let config = Config::default();

    format!(
        r#"# linkwatch configuration

[scraping]
user_agent = "{}"
request_timeout_secs = {}
site_timeout_secs = {}
interval_secs = {}
# Longer captions are cut and end in "..." (0 keeps them whole)
caption_max_words = {}

[ledger]
path = "{}"
# Items are reported again once their entry is older than this
ttl_hours = {}

[notify]
# "log" prints the report, "outbox" writes .txt/.html files to outbox_dir
delivery = "log"
outbox_dir = "{}"
subject = "{}"
skip_empty = {}

[logging]
format = "text"
level = "info"

# Automatic detection: only the link selector is needed
[[sites]]
name = "example-news"
url = "https://news.example.com/latest"
link_selector = "article h2 a"
min_caption_words = 4
max_items = 20

# Manual extraction: item and caption selectors are given together
# [[sites]]
# name = "example-blog"
# url = "https://blog.example.com/"
# item_selector = "ul.posts li"
# caption_selector = ".title"
# link_selector = "a.permalink"
"#,
        config.scraping.user_agent,
        config.scraping.request_timeout_secs,
        config.scraping.site_timeout_secs,
        config.scraping.interval_secs,
        config.scraping.caption_max_words,
        config.ledger.path.display(),
        config.ledger.ttl_hours,
        config.notify.outbox_dir.display(),
        config.notify.subject,
        config.notify.skip_empty,
    )
}

pub async fn init_config(path: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;

    let config_path = path.join("linkwatch.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists, not overwriting", config_path.display());
    }

    std::fs::write(&config_path, example_config())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}
