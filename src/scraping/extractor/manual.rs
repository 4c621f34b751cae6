//! Manual extraction: item, caption, and link selectors given explicitly

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{ExtractError, RawLink, AMBIGUOUS_CAPTION_PLACEHOLDER};
use crate::scraping::resolve_link;

/// Extract one link per item wrapper.
///
/// A missing, ambiguous, or non-anchor link match in any item aborts the
/// whole site: a selector that fails on one item fails on all of them.
pub(super) fn extract_manual(
    document: &Html,
    item: &Selector,
    caption: &Selector,
    link: &Selector,
    origin: &Url,
) -> Result<Vec<RawLink>, ExtractError> {
    let mut links = Vec::new();
    let mut wrappers = 0usize;

    for wrapper in document.select(item) {
        wrappers += 1;

        let mut matches = wrapper.select(link);
        let anchor = matches.next().ok_or(ExtractError::NoLinkInItem)?;
        if matches.next().is_some() {
            return Err(ExtractError::AmbiguousLinkSelector);
        }
        let tag = anchor.value().name();
        if tag != "a" {
            return Err(ExtractError::NotALink(tag.to_string()));
        }

        let Some(href) = anchor.value().attr("href") else {
            debug!("Skipping anchor without href in item {}", wrappers);
            continue;
        };
        let Some(url) = resolve_link(origin, href) else {
            debug!("Skipping unresolvable link '{}'", href);
            continue;
        };

        let (caption_text, keep_empty_caption) = caption_of(&wrapper, caption);
        links.push(RawLink {
            url: url.to_string(),
            caption: caption_text,
            keep_empty_caption,
        });
    }

    if wrappers == 0 {
        return Err(ExtractError::NoItems);
    }
    Ok(links)
}

/// Caption for one item, and whether a blank caption is expected
fn caption_of(wrapper: &ElementRef<'_>, caption: &Selector) -> (String, bool) {
    let mut matches = wrapper.select(caption);
    let Some(first) = matches.next() else {
        return (String::new(), true);
    };
    if matches.next().is_some() {
        return (AMBIGUOUS_CAPTION_PLACEHOLDER.to_string(), false);
    }
    (first_text(&first), false)
}

/// Literal text of the first text-bearing child, falling back to the first
/// text-bearing descendant
fn first_text(element: &ElementRef<'_>) -> String {
    let direct = element
        .children()
        .filter_map(|child| child.value().as_text())
        .find(|text| !text.trim().is_empty());
    let text = direct.or_else(|| {
        element
            .descendants()
            .filter_map(|node| node.value().as_text())
            .find(|text| !text.trim().is_empty())
    });
    text.map(|t| t.to_string()).unwrap_or_default()
}
