use anyhow::Result;
use linkwatch::config::Config;

/// Print what a loaded (and therefore validated) configuration will watch
pub fn check_config(config: &Config) -> Result<()> {
    println!("Configuration OK: {} site(s)", config.sites.len());
    println!();

    for site in &config.sites {
        let mode = if site.item_selector.is_some() { "manual" } else { "automatic" };
        let cap = match site.max_items {
            0 => "unbounded".to_string(),
            n => n.to_string(),
        };
        println!("  {} [{}]", site.name, mode);
        println!("    url:       {}", site.url);
        println!("    links:     {}", site.link_selector);
        if let (Some(item), Some(caption)) = (&site.item_selector, &site.caption_selector) {
            println!("    items:     {}", item);
            println!("    captions:  {}", caption);
        } else {
            println!("    min words: {}", site.min_caption_words);
        }
        println!("    max items: {}", cap);
    }

    println!();
    println!("Ledger:   {} (ttl {}h)", config.ledger.path.display(), config.ledger.ttl_hours);
    println!("Interval: {}s", config.scraping.interval_secs);
    Ok(())
}
