//! Caption candidate scoring for automatic detection
//!
//! A candidate's score is its word count divided by the number of distinct
//! block-level elements its text comes from. Long text concentrated in one
//! element (a headline, a teaser) beats text of similar length spread over
//! many small elements (bylines, timestamps, tag lists).
//!
//! Every element of a container is a candidate. Word and contributor totals
//! are gathered bottom-up in one pass over the container, and only the
//! winning candidate's text is assembled. Nothing here recurses, so deeply
//! nested markup costs time linear in its size.

use ego_tree::NodeId;
use scraper::ElementRef;
use std::collections::HashMap;
use std::ops::AddAssign;

use super::text::{has_direct_text, is_hidden, is_inline, normalize_text, visible_text, word_count};

/// A scored caption extraction
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCandidate {
    /// Normalized caption text
    pub text: String,
    /// Distinct non-inline elements contributing text (at least 1)
    pub node_count: usize,
    /// Words per contributing element
    pub score: f64,
}

/// Picks the best caption inside an item container
pub struct CaptionScorer {
    min_words: usize,
    /// Gate decisions for elements outside the container being scored
    gate_cache: HashMap<NodeId, bool>,
}

/// Caption totals over an element's visible subtree
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    /// Words from text that passes the gate
    words: usize,
    /// Passing text nodes that are not blank once normalized
    texts: usize,
    /// Non-inline elements with passing direct text
    contributors: usize,
}

impl Tally {
    fn node_count(&self) -> usize {
        self.contributors.max(1)
    }

    fn score(&self) -> f64 {
        self.words as f64 / self.node_count() as f64
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.words += other.words;
        self.texts += other.texts;
        self.contributors += other.contributors;
    }
}

/// Where the gate of an element's direct text lives
#[derive(Clone, Copy)]
enum Gate<'a> {
    Inside(usize),
    Outside(ElementRef<'a>),
}

/// Visible elements below a root, in pre-order, with their totals
struct Subtree<'a> {
    elements: Vec<ElementRef<'a>>,
    parents: Vec<Option<usize>>,
    index: HashMap<NodeId, usize>,
    tallies: Vec<Tally>,
    /// Whether the element's direct text contributes to captions
    passing: Vec<bool>,
}

impl<'a> Subtree<'a> {
    /// Pre-order walk that leaves out hidden subtrees
    fn collect(root: ElementRef<'a>) -> Self {
        let mut elements = Vec::new();
        let mut parents = Vec::new();
        let mut index = HashMap::new();
        let mut stack = vec![(root, None)];

        while let Some((element, parent)) = stack.pop() {
            let position = elements.len();
            index.insert(element.id(), position);
            elements.push(element);
            parents.push(parent);

            let children: Vec<ElementRef<'a>> = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| !is_hidden(child.value().name()))
                .collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(position))));
        }

        let len = elements.len();
        Self {
            elements,
            parents,
            index,
            tallies: vec![Tally::default(); len],
            passing: vec![false; len],
        }
    }

    /// Fold every element's value into its ancestors'. Reverse pre-order
    /// sees every child before its parent.
    fn roll_up<T: Copy + AddAssign>(&self, values: &mut [T]) {
        for position in (1..values.len()).rev() {
            if let Some(parent) = self.parents[position] {
                let value = values[position];
                values[parent] += value;
            }
        }
    }

    fn candidate(&self, position: usize) -> CaptionCandidate {
        let tally = self.tallies[position];
        CaptionCandidate {
            text: self.caption_text(position),
            node_count: tally.node_count(),
            score: tally.score(),
        }
    }

    /// Passing text below an element, in document order
    fn caption_text(&self, position: usize) -> String {
        let mut raw = String::new();
        for node in self.elements[position].descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let passing = node
                .parent()
                .and_then(|parent| self.index.get(&parent.id()))
                .is_some_and(|&parent| self.passing[parent]);
            if passing && !text.trim().is_empty() {
                raw.push_str(text);
                raw.push(' ');
            }
        }
        normalize_text(&raw)
    }
}

/// Non-blank text nodes directly inside an element
fn direct_texts<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .filter(|text| !text.trim().is_empty())
}

impl CaptionScorer {
    pub fn new(min_words: usize) -> Self {
        Self {
            min_words,
            gate_cache: HashMap::new(),
        }
    }

    /// Best-scoring candidate among the container and all its descendants.
    ///
    /// Candidates are compared container first, then in document order; on
    /// equal scores the earlier (shallower) candidate stays.
    pub fn best_caption(&mut self, container: ElementRef<'_>) -> Option<CaptionCandidate> {
        let subtree = self.tally(container);

        let mut best: Option<(usize, f64)> = None;
        for (position, tally) in subtree.tallies.iter().enumerate() {
            if tally.texts == 0 {
                continue;
            }
            let score = tally.score();
            if best.map_or(true, |(_, current)| score > current) {
                best = Some((position, score));
            }
        }

        best.map(|(position, _)| subtree.candidate(position))
    }

    /// Score a single element as a caption candidate
    pub fn score(&mut self, element: ElementRef<'_>) -> CaptionCandidate {
        self.tally(element).candidate(0)
    }

    fn tally<'a>(&mut self, root: ElementRef<'a>) -> Subtree<'a> {
        let mut subtree = Subtree::collect(root);

        let mut visible_words: Vec<usize> = subtree
            .elements
            .iter()
            .map(|element| direct_texts(*element).map(|text| word_count(&normalize_text(text))).sum())
            .collect();
        subtree.roll_up(&mut visible_words);

        let gates = Self::gates(&subtree);
        for (position, element) in subtree.elements.iter().enumerate() {
            if direct_texts(*element).next().is_none() {
                continue;
            }
            subtree.passing[position] = match gates[position] {
                Gate::Inside(gate) => visible_words[gate] >= self.min_words,
                Gate::Outside(gate) => self.outside_gate_passes(gate),
            };
        }

        let mut tallies: Vec<Tally> = subtree
            .elements
            .iter()
            .zip(&subtree.passing)
            .map(|(element, &passing)| {
                let mut tally = Tally::default();
                if !passing {
                    return tally;
                }
                for text in direct_texts(*element) {
                    let normalized = normalize_text(text);
                    tally.words += word_count(&normalized);
                    if !normalized.is_empty() {
                        tally.texts += 1;
                    }
                }
                if !is_inline(element.value().name()) {
                    tally.contributors = 1;
                }
                tally
            })
            .collect();
        subtree.roll_up(&mut tallies);
        subtree.tallies = tallies;
        subtree
    }

    /// Text directly inside an element contributes only when the element it
    /// belongs to has at least `min_words` words. Inline elements embedded in
    /// running text belong to the enclosing passage; standalone inline
    /// elements (a lone link, a byline span) are judged on their own.
    ///
    /// Parents come before children in pre-order, so each gate extends its
    /// parent's.
    fn gates<'a>(subtree: &Subtree<'a>) -> Vec<Gate<'a>> {
        let mut gates: Vec<Gate<'a>> = Vec::with_capacity(subtree.elements.len());
        for (position, element) in subtree.elements.iter().enumerate() {
            let gate = if !is_inline(element.value().name()) {
                Gate::Inside(position)
            } else {
                match subtree.parents[position] {
                    Some(parent) if has_direct_text(&subtree.elements[parent]) => gates[parent],
                    Some(_) => Gate::Inside(position),
                    None => match Self::gate_element(*element) {
                        gate if gate.id() == element.id() => Gate::Inside(position),
                        gate => Gate::Outside(gate),
                    },
                }
            };
            gates.push(gate);
        }
        gates
    }

    fn outside_gate_passes(&mut self, gate: ElementRef<'_>) -> bool {
        if let Some(&eligible) = self.gate_cache.get(&gate.id()) {
            return eligible;
        }
        let eligible = word_count(&visible_text(&gate)) >= self.min_words;
        self.gate_cache.insert(gate.id(), eligible);
        eligible
    }

    fn gate_element(element: ElementRef<'_>) -> ElementRef<'_> {
        let mut gate = element;
        while is_inline(gate.value().name()) {
            match gate.parent().and_then(ElementRef::wrap) {
                Some(enclosing) if has_direct_text(&enclosing) => gate = enclosing,
                _ => break,
            }
        }
        gate
    }
}
