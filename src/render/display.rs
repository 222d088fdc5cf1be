// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! What a mounted renderer shows for each phase, as accessible HTML.

use std::sync::Arc;

use htmlize::{escape_attribute, escape_text};

use super::Artifact;
use crate::model::{DeviceClass, DiagramKind};

/// Loading indicator size; mobile gets the larger spinner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorSize {
    Medium,
    Large,
}

impl IndicatorSize {
    pub fn for_device(device: DeviceClass) -> Self {
        if device.is_mobile() {
            Self::Large
        } else {
            Self::Medium
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// Error shown in place of a diagram, with the raw input behind a disclosure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBlock {
    kind: DiagramKind,
    message: String,
    raw: String,
}

impl ErrorBlock {
    pub fn new(kind: DiagramKind, message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn header(&self) -> String {
        format!("{} Error:", self.kind.display_name())
    }

    pub fn to_text(&self) -> String {
        format!("{} {}", self.header(), self.message)
    }

    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<div class="vizport-error" role="alert">"#,
                "<p><strong>{header}</strong> {message}</p>",
                "<details><summary>{disclosure}</summary>",
                "<pre><code>{raw}</code></pre>",
                "</details></div>"
            ),
            header = escape_text(self.header()),
            message = escape_text(self.message.as_str()),
            disclosure = self.kind.raw_disclosure_label(),
            raw = escape_text(self.raw.as_str()),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Empty,
    Loading { size: IndicatorSize },
    Error(ErrorBlock),
    Ready {
        artifact: Arc<Artifact>,
        class_name: Option<String>,
    },
}

impl DisplayState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn to_html(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Loading { size } => format!(
                r#"<div class="vizport-loading vizport-loading-{size}" role="status" aria-live="polite" aria-label="{label}"><span class="vizport-spinner" aria-hidden="true"></span><span>{label}</span></div>"#,
                size = size.as_str(),
                label = escape_attribute("Rendering diagram"),
            ),
            Self::Error(block) => block.to_html(),
            Self::Ready {
                artifact,
                class_name,
            } => artifact.to_html(class_name.as_deref()),
        }
    }
}
