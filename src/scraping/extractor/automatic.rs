//! Automatic detection: infer item wrappers and captions from DOM shape
//!
//! Template-rendered lists wrap every entry in structurally identical
//! elements. Starting at the matched anchors, we climb one level at a time
//! while the ancestors of all anchors share a tag and are distinct nodes.
//! The highest such level is the item wrapper; the caption is the best
//! scoring text block inside it.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use super::caption::CaptionScorer;
use super::{ExtractError, RawLink};
use crate::scraping::resolve_link;

/// A matched anchor and the repeating wrapper around it
#[derive(Debug, Clone, Copy)]
pub struct LinkContainer<'a> {
    pub anchor: ElementRef<'a>,
    pub container: ElementRef<'a>,
}

pub(super) fn extract_automatic(
    document: &Html,
    link: &Selector,
    min_caption_words: usize,
    origin: &Url,
) -> Result<Vec<RawLink>, ExtractError> {
    let anchors: Vec<ElementRef<'_>> = document.select(link).collect();
    if anchors.is_empty() {
        return Err(ExtractError::NoLinks);
    }
    if let Some(other) = anchors.iter().find(|a| a.value().name() != "a") {
        return Err(ExtractError::NotALink(other.value().name().to_string()));
    }

    let containers = find_containers(&anchors)?;
    let mut scorer = CaptionScorer::new(min_caption_words);
    let mut links = Vec::with_capacity(containers.len());

    for pair in containers {
        let Some(href) = pair.anchor.value().attr("href") else {
            debug!("Skipping anchor without href");
            continue;
        };
        let Some(url) = resolve_link(origin, href) else {
            debug!("Skipping unresolvable link '{}'", href);
            continue;
        };
        let caption = scorer
            .best_caption(pair.container)
            .map(|candidate| candidate.text)
            .unwrap_or_default();
        links.push(RawLink::new(url.to_string(), caption));
    }

    Ok(links)
}

/// Pair every anchor with its item wrapper.
///
/// A single anchor has no siblings to compare against; its parent element
/// is used as the wrapper.
pub fn find_containers<'a>(anchors: &[ElementRef<'a>]) -> Result<Vec<LinkContainer<'a>>, ExtractError> {
    if anchors.len() == 1 {
        let anchor = anchors[0];
        let container = anchor
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or(ExtractError::NoStructure)?;
        return Ok(vec![LinkContainer { anchor, container }]);
    }

    let depths: Vec<usize> = anchors.iter().map(|a| depth(**a)).collect();
    let Some(&min_depth) = depths.iter().min() else {
        return Err(ExtractError::NoLinks);
    };

    // Bring every anchor up to the shallowest anchor's depth
    let mut level: Vec<NodeRef<'a, Node>> = anchors
        .iter()
        .zip(&depths)
        .map(|(anchor, &d)| ancestor(**anchor, d - min_depth))
        .collect::<Option<_>>()
        .ok_or_else(|| ExtractError::Inconsistent("anchor ancestor missing".to_string()))?;
    let mut level_depth = min_depth;
    let mut chosen: Option<Vec<NodeRef<'a, Node>>> = None;

    while level_depth > 0 && is_repeating(&level) {
        chosen = Some(level.clone());
        level = level
            .iter()
            .map(|node| node.parent())
            .collect::<Option<_>>()
            .ok_or_else(|| ExtractError::Inconsistent("container parent missing".to_string()))?;
        level_depth -= 1;
    }

    let chosen = chosen.ok_or(ExtractError::NoStructure)?;
    debug!(
        "Repeating container <{}> at depth {}",
        chosen
            .first()
            .and_then(|n| n.value().as_element())
            .map(|e| e.name())
            .unwrap_or("?"),
        level_depth + 1
    );

    anchors
        .iter()
        .zip(chosen)
        .map(|(anchor, node)| {
            if node.id() == anchor.id() {
                // The anchors repeat but nothing around them does
                return Err(ExtractError::NoStructure);
            }
            let container = ElementRef::wrap(node)
                .ok_or_else(|| ExtractError::Inconsistent("container is not an element".to_string()))?;
            Ok(LinkContainer {
                anchor: *anchor,
                container,
            })
        })
        .collect()
}

/// All nodes are elements with the same tag, and no node appears twice
fn is_repeating(level: &[NodeRef<'_, Node>]) -> bool {
    let Some(tag) = level.first().and_then(|n| n.value().as_element()).map(|e| e.name()) else {
        return false;
    };
    let same_tag = level
        .iter()
        .all(|n| n.value().as_element().is_some_and(|e| e.name() == tag));
    if !same_tag {
        return false;
    }
    let distinct: HashSet<NodeId> = level.iter().map(|n| n.id()).collect();
    distinct.len() == level.len()
}

/// Number of edges to the document root
fn depth(node: NodeRef<'_, Node>) -> usize {
    node.ancestors().count()
}

fn ancestor(node: NodeRef<'_, Node>, steps: usize) -> Option<NodeRef<'_, Node>> {
    let mut current = node;
    for _ in 0..steps {
        current = current.parent()?;
    }
    Some(current)
}
