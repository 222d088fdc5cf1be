// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Interfaces to the external rendering engines.
//!
//! Engines are heavyweight and loaded lazily through [`EngineLoader`]s owned by the
//! [`LibraryRegistry`](crate::registry::LibraryRegistry). Everything they return is untrusted until
//! it has been post-processed by the renderers.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::render::mermaid::MermaidConfig;

/// Failure reported by an engine or its loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for EngineError {}

/// Mermaid-style engine: graph description in, SVG markup out.
pub trait MermaidEngine: Send + Sync {
    fn render(
        &self,
        element_id: &str,
        source: &str,
        config: &MermaidConfig,
    ) -> BoxFuture<'static, Result<String, EngineError>>;
}

/// Vega-Lite-style engine: sanitized JSON specification in, mounted chart out.
pub trait VegaLiteEngine: Send + Sync {
    fn embed(
        &self,
        spec: &Value,
        options: &EmbedOptions,
    ) -> BoxFuture<'static, Result<ChartView, EngineError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSurface {
    Svg,
    Canvas,
}

/// Output of a chart embed: the mounted markup and the surface it was drawn on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartView {
    pub markup: String,
    pub surface: ChartSurface,
}

impl ChartView {
    pub fn svg(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            surface: ChartSurface::Svg,
        }
    }
}

/// Options forwarded to the chart engine's embed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedOptions {
    pub actions: bool,
    pub tooltip: bool,
    pub hover: bool,
    pub renderer: ChartSurface,
}

/// Asynchronously produces an engine instance. Called at most once per in-flight load.
pub trait EngineLoader<E: ?Sized>: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<Arc<E>, EngineError>>;
}

struct FnLoader<F>(F);

impl<E, F> EngineLoader<E> for FnLoader<F>
where
    E: ?Sized,
    F: Fn() -> BoxFuture<'static, Result<Arc<E>, EngineError>> + Send + Sync,
{
    fn load(&self) -> BoxFuture<'static, Result<Arc<E>, EngineError>> {
        (self.0)()
    }
}

/// Adapts a closure into an [`EngineLoader`].
pub fn loader_fn<E, F>(f: F) -> Arc<dyn EngineLoader<E>>
where
    E: ?Sized + 'static,
    F: Fn() -> BoxFuture<'static, Result<Arc<E>, EngineError>> + Send + Sync + 'static,
{
    Arc::new(FnLoader(f))
}
