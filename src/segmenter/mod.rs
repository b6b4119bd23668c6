//! Keyword-driven splitting of clinical notes into sections.
//!
//! A note is cut at bullet markers, each chunk is labelled by counting keyword rule hits,
//! and adjacent confidently-labelled chunks with the same label are merged.

pub mod rules;


use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use crate::constants::{
    KEYWORD_CONFIDENCE, MERGE_CONFIDENCE_THRESHOLD, SPLIT_SUMMARY_PREVIEW_CHARS, UNKNOWN_SECTION,
    preview,
};

use rules::{BULLET_MARKER, RULES};

/// One rule hit inside a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMatch {
    /// Matched text as written in the note.
    pub keyword: String,
    pub label: String,
}

/// A contiguous, labelled part of a note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSection {
    pub label: String,
    /// Chunk text without surrounding whitespace.
    pub content: String,
    /// Byte offset of the chunk start in the source note.
    pub start: usize,
    /// Byte offset one past the chunk end in the source note.
    pub end: usize,
    pub confidence: f32,
    pub keywords: Vec<KeywordMatch>,
}

impl NoteSection {
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_SECTION
    }

    fn can_merge_with(&self, next: &NoteSection) -> bool {
        self.label == next.label
            && !self.is_unknown()
            && self.confidence > MERGE_CONFIDENCE_THRESHOLD
            && next.confidence > MERGE_CONFIDENCE_THRESHOLD
    }

    fn absorb(&mut self, next: NoteSection) {
        self.content.push('\n');
        self.content.push_str(&next.content);
        self.end = next.end;
        self.confidence = self.confidence.min(next.confidence);
        for keyword in next.keywords {
            if !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
    }
}

/// Overview of a split, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSummary {
    pub total_sections: usize,
    pub sections: Vec<SectionOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionOverview {
    #[serde(rename = "type")]
    pub label: String,
    /// Content length in characters.
    pub length: usize,
    pub confidence: f32,
    pub preview: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SectionSplitter;

impl SectionSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Splits `note` into ordered sections. Blank input yields no sections.
    pub fn split(&self, note: &str) -> Vec<NoteSection> {
        if note.trim().is_empty() {
            return Vec::new();
        }

        let mut merged: Vec<NoteSection> = Vec::new();
        for span in chunk_spans(note) {
            let section = label_chunk(&note[span.clone()], span);
            match merged.last_mut() {
                Some(current) if current.can_merge_with(&section) => current.absorb(section),
                _ => merged.push(section),
            }
        }

        debug!(
            sections = merged.len(),
            labels = ?merged.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
            "Note split"
        );
        merged
    }

    pub fn summary(&self, sections: &[NoteSection]) -> SplitSummary {
        SplitSummary {
            total_sections: sections.len(),
            sections: sections
                .iter()
                .map(|s| SectionOverview {
                    label: s.label.clone(),
                    length: s.content.chars().count(),
                    confidence: s.confidence,
                    preview: preview(&s.content, SPLIT_SUMMARY_PREVIEW_CHARS),
                })
                .collect(),
        }
    }
}

/// Byte ranges of the non-blank chunks between bullet markers.
///
/// Without any non-blank chunk between markers, the whole note is one chunk.
fn chunk_spans(note: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut last_end = 0;

    for marker in BULLET_MARKER.find_iter(note) {
        if last_end < marker.start() && !note[last_end..marker.start()].trim().is_empty() {
            spans.push(last_end..marker.start());
        }
        last_end = marker.end();
    }

    if last_end < note.len() && !note[last_end..].trim().is_empty() {
        spans.push(last_end..note.len());
    }

    if spans.is_empty() {
        spans.push(0..note.len());
    }
    spans
}

/// Labels one chunk with the most frequent rule label (ties go to the earliest rule).
fn label_chunk(chunk: &str, span: Range<usize>) -> NoteSection {
    let mut keywords = Vec::new();
    let mut counts: Vec<(&'static str, usize)> = Vec::new();

    for rule in RULES.iter() {
        let Some(hit) = rule.pattern.find(chunk) else {
            continue;
        };
        keywords.push(KeywordMatch {
            keyword: hit.as_str().trim().to_string(),
            label: rule.label.to_string(),
        });
        match counts.iter_mut().find(|(label, _)| *label == rule.label) {
            Some((_, n)) => *n += 1,
            None => counts.push((rule.label, 1)),
        }
    }

    // max_by_key returns the last maximum; fold keeps the first.
    let best = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, &(label, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((label, n)),
        });

    let (label, confidence) = match best {
        Some((label, _)) => (label.to_string(), KEYWORD_CONFIDENCE),
        None => (UNKNOWN_SECTION.to_string(), 0.0),
    };

    NoteSection {
        label,
        content: chunk.trim().to_string(),
        start: span.start,
        end: span.end,
        confidence,
        keywords,
    }
}
