//! Text normalization and tag classification

use scraper::ElementRef;
use unicode_segmentation::UnicodeSegmentation;

/// Inline text-level tags. Text inside them belongs to the surrounding
/// passage rather than standing on its own.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "kbd",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
    "wbr",
];

/// Tags whose text never shows up as page content
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

pub(super) fn is_inline(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}

pub(super) fn is_hidden(tag: &str) -> bool {
    HIDDEN_TAGS.contains(&tag)
}

/// Collapse whitespace runs to single spaces, trim, and drop control and
/// other non-printable characters.
pub fn normalize_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| !c.is_control() && !is_invisible(*c))
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Zero-width and formatting characters that survive `is_control`
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{2028}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}' | '\u{FFFD}'
    )
}

/// Number of words, using Unicode word boundaries
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Whether the element has non-whitespace text as a direct child
pub(super) fn has_direct_text(element: &ElementRef<'_>) -> bool {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| !t.trim().is_empty()))
        .any(|non_blank| non_blank)
}

/// All visible text below an element, normalized
pub(super) fn visible_text(element: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|parent| is_hidden(parent.value().name()));
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }
    normalize_text(&raw)
}
