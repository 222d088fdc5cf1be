// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Process-wide engine registry.
//!
//! Each engine kind has exactly one [`EngineSlot`]; every mounted renderer of that kind shares it,
//! so one load serves all diagrams on the page. Consumers observe state through `watch`
//! receivers and never mutate it.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

use crate::engine::{EngineLoader, MermaidEngine, VegaLiteEngine};
use crate::model::DiagramKind;

mod slot;

pub use slot::EngineSlot;

/// Load state of one engine.
///
/// `Idle -> Loading -> Loaded` or `Idle -> Loading -> Error`; `Error -> Loading` is a retry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LibraryState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

impl LibraryState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for LibraryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Loading => f.write_str("loading"),
            Self::Loaded => f.write_str("loaded"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    kind: DiagramKind,
    message: String,
}

impl LoadError {
    pub(crate) fn new(kind: DiagramKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {} library: {}", self.kind, self.message)
    }
}

impl Error for LoadError {}

/// One slot per engine kind.
pub struct LibraryRegistry {
    mermaid: Arc<EngineSlot<dyn MermaidEngine>>,
    vega_lite: Arc<EngineSlot<dyn VegaLiteEngine>>,
}

impl fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryRegistry")
            .field("mermaid", &self.mermaid.state())
            .field("vega_lite", &self.vega_lite.state())
            .finish()
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: OnceLock<Arc<LibraryRegistry>> = OnceLock::new();

impl LibraryRegistry {
    /// A registry with no loaders installed. Loading fails until loaders are set.
    pub fn new() -> Self {
        Self {
            mermaid: Arc::new(EngineSlot::new(DiagramKind::Mermaid)),
            vega_lite: Arc::new(EngineSlot::new(DiagramKind::VegaLite)),
        }
    }

    pub fn with_loaders(
        mermaid: Arc<dyn EngineLoader<dyn MermaidEngine>>,
        vega_lite: Arc<dyn EngineLoader<dyn VegaLiteEngine>>,
    ) -> Self {
        let registry = Self::new();
        registry.mermaid.set_loader(mermaid);
        registry.vega_lite.set_loader(vega_lite);
        registry
    }

    /// The page-wide registry, created on first use.
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY.get_or_init(|| Arc::new(Self::new())).clone()
    }

    pub fn mermaid(&self) -> &Arc<EngineSlot<dyn MermaidEngine>> {
        &self.mermaid
    }

    pub fn vega_lite(&self) -> &Arc<EngineSlot<dyn VegaLiteEngine>> {
        &self.vega_lite
    }

    /// Starts loading `kind` unless it is already loading or loaded.
    pub fn load_engine(&self, kind: DiagramKind) {
        match kind {
            DiagramKind::Mermaid => self.mermaid.load_engine(),
            DiagramKind::VegaLite => self.vega_lite.load_engine(),
        }
    }

    pub fn state(&self, kind: DiagramKind) -> LibraryState {
        match kind {
            DiagramKind::Mermaid => self.mermaid.state(),
            DiagramKind::VegaLite => self.vega_lite.state(),
        }
    }

    pub fn subscribe(&self, kind: DiagramKind) -> watch::Receiver<LibraryState> {
        match kind {
            DiagramKind::Mermaid => self.mermaid.subscribe(),
            DiagramKind::VegaLite => self.vega_lite.subscribe(),
        }
    }

    /// Number of loads started for `kind` (retries included).
    pub fn load_count(&self, kind: DiagramKind) -> usize {
        match kind {
            DiagramKind::Mermaid => self.mermaid.load_count(),
            DiagramKind::VegaLite => self.vega_lite.load_count(),
        }
    }
}
