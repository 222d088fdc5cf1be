// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram fence detection over raw markdown.
//!
//! Detection runs on every content change (including per-token streaming updates), so it is a
//! single forward pass over line boundaries with no allocation beyond the descriptors it returns.

use memchr::memchr_iter;

use crate::model::{DiagramDescriptor, DiagramKind, SourceSpan};

const MAX_FENCE_INDENT: usize = 3;
const MIN_FENCE_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagramCounts {
    pub mermaid: usize,
    pub vega_lite: usize,
}

impl DiagramCounts {
    pub fn get(&self, kind: DiagramKind) -> usize {
        match kind {
            DiagramKind::Mermaid => self.mermaid,
            DiagramKind::VegaLite => self.vega_lite,
        }
    }

    pub fn total(&self) -> usize {
        self.mermaid + self.vega_lite
    }

    fn bump(&mut self, kind: DiagramKind) {
        match kind {
            DiagramKind::Mermaid => self.mermaid += 1,
            DiagramKind::VegaLite => self.vega_lite += 1,
        }
    }
}

/// Result of one detection pass, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionReport {
    descriptors: Vec<DiagramDescriptor>,
    counts: DiagramCounts,
}

impl DetectionReport {
    pub fn descriptors(&self) -> &[DiagramDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<DiagramDescriptor> {
        self.descriptors
    }

    pub fn counts(&self) -> DiagramCounts {
        self.counts
    }

    pub fn has_diagrams(&self) -> bool {
        !self.descriptors.is_empty()
    }

    pub fn has_kind(&self, kind: DiagramKind) -> bool {
        self.counts.get(kind) > 0
    }
}

/// Finds every closed `mermaid` / `vega-lite` fenced block in `text`.
///
/// Fenced blocks of any other language are skipped as a whole, so diagram fences quoted inside
/// them are not reported. A diagram fence that has not been closed yet is not reported either.
pub fn detect_diagrams(text: &str) -> DetectionReport {
    let mut report = DetectionReport::default();
    let mut open: Option<OpenFence> = None;

    for line in lines(text) {
        match open {
            None => {
                if let Some(fence) = parse_opening_fence(line.text) {
                    open = Some(OpenFence {
                        fence_char: fence.fence_char,
                        fence_len: fence.fence_len,
                        kind: fence.kind,
                        start: line.start,
                        content_start: line.next,
                    });
                }
            }
            Some(fence) => {
                if !is_closing_fence(line.text, fence.fence_char, fence.fence_len) {
                    continue;
                }

                if let Some(kind) = fence.kind {
                    let raw = text.get(fence.content_start..line.start).unwrap_or("");
                    let content = strip_line_ending(raw);
                    report.descriptors.push(DiagramDescriptor::new(
                        kind,
                        content,
                        SourceSpan::new(fence.start, line.start + line.text.len()),
                    ));
                    report.counts.bump(kind);
                }
                open = None;
            }
        }
    }

    report
}

#[derive(Debug, Clone, Copy)]
struct OpenFence {
    fence_char: u8,
    fence_len: usize,
    kind: Option<DiagramKind>,
    start: usize,
    content_start: usize,
}

#[derive(Debug, Clone, Copy)]
struct FenceOpening {
    fence_char: u8,
    fence_len: usize,
    kind: Option<DiagramKind>,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    // Start of the following line (or `text.len()` for the last line).
    next: usize,
    // Line contents without the trailing `\n` / `\r\n`.
    text: &'a str,
}

fn lines(text: &str) -> impl Iterator<Item = Line<'_>> + '_ {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    let mut breaks = memchr_iter(b'\n', bytes);
    let mut done = false;

    std::iter::from_fn(move || {
        if done {
            return None;
        }

        let (end, next) = match breaks.next() {
            Some(idx) => (idx, idx + 1),
            None => {
                done = true;
                if start >= bytes.len() {
                    return None;
                }
                (bytes.len(), bytes.len())
            }
        };

        let raw = &text[start..end];
        let line = Line {
            start,
            next,
            text: raw.strip_suffix('\r').unwrap_or(raw),
        };
        start = next;
        Some(line)
    })
}

fn fence_indent(line: &str) -> Option<usize> {
    let indent = line.bytes().take_while(|b| *b == b' ').count();
    (indent <= MAX_FENCE_INDENT).then_some(indent)
}

fn parse_opening_fence(line: &str) -> Option<FenceOpening> {
    let indent = fence_indent(line)?;
    let rest = &line[indent..];
    let fence_char = *rest.as_bytes().first()?;
    if fence_char != b'`' && fence_char != b'~' {
        return None;
    }

    let fence_len = rest.bytes().take_while(|b| *b == fence_char).count();
    if fence_len < MIN_FENCE_LEN {
        return None;
    }

    let info = rest[fence_len..].trim();
    // Backtick fences may not carry backticks in their info string (that is inline code).
    if fence_char == b'`' && info.contains('`') {
        return None;
    }

    let tag = info.split_whitespace().next().unwrap_or("");
    Some(FenceOpening {
        fence_char,
        fence_len,
        kind: DiagramKind::from_fence_tag(tag),
    })
}

fn is_closing_fence(line: &str, fence_char: u8, fence_len: usize) -> bool {
    let Some(indent) = fence_indent(line) else {
        return false;
    };
    let rest = &line[indent..];
    let run = rest.bytes().take_while(|b| *b == fence_char).count();
    run >= fence_len && rest[run..].trim().is_empty()
}

fn strip_line_ending(raw: &str) -> &str {
    let raw = raw.strip_suffix('\n').unwrap_or(raw);
    raw.strip_suffix('\r').unwrap_or(raw)
}
