//! Rendering one cycle's sets into a plain-text and an HTML body

use std::fmt::Write;

use crate::types::{LinkItem, LinkSet};

/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders link sets for delivery
#[derive(Debug, Clone)]
pub struct Renderer {
    subject: String,
}

impl Renderer {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Render all sets. Sets appear in name order and items in caption
    /// order; sets with neither items nor messages are left out.
    pub fn render(&self, sets: &[LinkSet]) -> Rendered {
        let mut sorted: Vec<&LinkSet> = sets.iter().filter(|s| s.has_content()).collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let item_count: usize = sorted.iter().map(|s| s.len()).sum();
        let subject = format!("{} ({})", self.subject, item_count);

        Rendered {
            text: render_text(&subject, &sorted),
            html: render_html(&subject, &sorted),
            subject,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new("New links")
    }
}

fn label(item: &LinkItem) -> &str {
    if item.caption.trim().is_empty() {
        &item.link_url
    } else {
        &item.caption
    }
}

fn render_text(subject: &str, sets: &[&LinkSet]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", subject);

    for set in sets {
        let _ = writeln!(out);
        let _ = writeln!(out, "== {} ==", set.name);
        for message in &set.messages {
            let _ = writeln!(out, "! {}", message);
        }
        for item in set.sorted_items() {
            let _ = writeln!(out, "- {}", label(item));
            let _ = writeln!(out, "  {}", item.link_url);
        }
    }
    out
}

fn render_html(subject: &str, sets: &[&LinkSet]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\">");
    let _ = write!(out, "<title>{}</title>", html_escape(subject));
    out.push_str("</head>\n<body>\n");

    for set in sets {
        let _ = writeln!(out, "<h2>{}</h2>", html_escape(&set.name));
        for message in &set.messages {
            let _ = writeln!(out, "<p class=\"message\">{}</p>", html_escape(message));
        }
        if !set.is_empty() {
            out.push_str("<ul>\n");
            for item in set.sorted_items() {
                let _ = writeln!(
                    out,
                    "<li><a href=\"{}\">{}</a></li>",
                    html_escape(&item.link_url),
                    html_escape(label(item))
                );
            }
            out.push_str("</ul>\n");
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
