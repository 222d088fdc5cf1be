// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

/// The diagram formats the renderer stack understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagramKind {
    Mermaid,
    VegaLite,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 2] = [DiagramKind::Mermaid, DiagramKind::VegaLite];

    /// Resolves a fenced code block info string (first word only) to a diagram kind.
    pub fn from_fence_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("mermaid") {
            return Some(Self::Mermaid);
        }
        if tag.eq_ignore_ascii_case("vega-lite") || tag.eq_ignore_ascii_case("vegalite") {
            return Some(Self::VegaLite);
        }
        None
    }

    pub fn fence_tag(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::VegaLite => "vega-lite",
        }
    }

    /// Noun used in author-facing error headers.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Mermaid => "Diagram",
            Self::VegaLite => "Chart",
        }
    }

    /// Product name of the engine, used in load and timeout messages.
    pub fn engine_name(self) -> &'static str {
        match self {
            Self::Mermaid => "Mermaid",
            Self::VegaLite => "Vega-Lite",
        }
    }

    pub fn default_alt(self) -> &'static str {
        match self {
            Self::Mermaid => "Mermaid diagram",
            Self::VegaLite => "Vega-Lite chart",
        }
    }

    pub fn raw_disclosure_label(self) -> &'static str {
        match self {
            Self::Mermaid => "Show raw content",
            Self::VegaLite => "Show raw JSON",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fence_tag())
    }
}

/// Byte range into the source text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the spanned slice, or `None` if the span does not fit `text`.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

/// A diagram block found in markdown source.
///
/// Produced fresh on every detection pass; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagramDescriptor {
    kind: DiagramKind,
    content: String,
    span: SourceSpan,
}

impl DiagramDescriptor {
    pub fn new(kind: DiagramKind, content: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            kind,
            content: content.into(),
            span,
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn span(&self) -> SourceSpan {
        self.span
    }
}
