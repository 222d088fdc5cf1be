// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram renderers.
//!
//! A [`Renderer`] owns one mounted diagram. Each input change starts a new generation-tagged
//! attempt: acquire the engine, validate and prepare the input, invoke the engine under a
//! timeout, and post-process the output into an [`Artifact`]. Results of superseded attempts are
//! discarded.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use futures::future::BoxFuture;
use serde_json::Value;
use smol_str::{format_smolstr, SmolStr};
use tokio::task::JoinHandle;

use crate::config::RenderSettings;
use crate::engine::ChartSurface;
use crate::model::{ColorSchemeProbe, DeviceClass, DiagramKind, FixedColorScheme, ResolvedTheme, Theme};
use crate::registry::{EngineSlot, LibraryRegistry, LibraryState};

pub(crate) mod attempt;
pub mod display;
pub mod mermaid;
pub mod svg;
pub mod vega_lite;

#[cfg(test)]
mod tests;

use attempt::AttemptTracker;

pub use display::{DisplayState, ErrorBlock, IndicatorSize};
pub use mermaid::{mermaid_config, MermaidConfig, MermaidPipeline};
pub use svg::{finalize_svg, FinalizedSvg, SvgAccessibility, SvgError};
pub use vega_lite::{
    merge_theme_config, prepare_chart_spec, sanitize_chart_spec, validate_chart_spec,
    ChartOptions, ChartSpecError, VegaLitePipeline,
};

pub type MermaidRenderer = Renderer<MermaidPipeline>;
pub type VegaLiteRenderer = Renderer<VegaLitePipeline>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    LibraryLoad { kind: DiagramKind, message: String },
    Validation { kind: DiagramKind, message: String },
    Engine { kind: DiagramKind, message: String },
    Timeout { kind: DiagramKind },
}

impl RenderError {
    pub fn validation(kind: DiagramKind, message: impl fmt::Display) -> Self {
        Self::Validation {
            kind,
            message: message.to_string(),
        }
    }

    pub fn engine(kind: DiagramKind, message: impl fmt::Display) -> Self {
        Self::Engine {
            kind,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> DiagramKind {
        match self {
            Self::LibraryLoad { kind, .. }
            | Self::Validation { kind, .. }
            | Self::Engine { kind, .. }
            | Self::Timeout { kind } => *kind,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LibraryLoad { kind, message } => {
                write!(f, "Failed to load {} library: {message}", kind.engine_name())
            }
            Self::Validation { message, .. } => f.write_str(message),
            Self::Engine { kind, message } => {
                write!(f, "{} rendering failed: {message}", kind.engine_name())
            }
            Self::Timeout { kind } => write!(f, "{} rendering timeout", kind.engine_name()),
        }
    }
}

impl Error for RenderError {}

/// Where a renderer's current attempt stands.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPhase {
    Empty,
    Loading,
    Rendering,
    Success(Arc<Artifact>),
    Failed(RenderError),
}

impl RenderPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }

    pub fn artifact(&self) -> Option<&Arc<Artifact>> {
        match self {
            Self::Success(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RenderError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// The attempt failed because its engine library could not be loaded.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::Failed(RenderError::LibraryLoad { .. }))
    }
}

/// Finalized output of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub(crate) kind: DiagramKind,
    pub(crate) element_id: SmolStr,
    pub(crate) markup: String,
    pub(crate) surface: ChartSurface,
    pub(crate) label: String,
    pub(crate) title_id: Option<SmolStr>,
    pub(crate) desc_id: Option<SmolStr>,
    pub(crate) spec: Option<Value>,
}

impl Artifact {
    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn surface(&self) -> ChartSurface {
        self.surface
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn title_id(&self) -> Option<&str> {
        self.title_id.as_deref()
    }

    pub fn desc_id(&self) -> Option<&str> {
        self.desc_id.as_deref()
    }

    /// The sanitized, themed chart specification handed to the engine (charts only).
    pub fn spec(&self) -> Option<&Value> {
        self.spec.as_ref()
    }

    /// `data:image/svg+xml` URI of the markup, for export. `None` for canvas surfaces.
    pub fn data_uri(&self) -> Option<String> {
        match self.surface {
            ChartSurface::Svg => Some(format!(
                "data:image/svg+xml;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(self.markup.as_bytes())
            )),
            ChartSurface::Canvas => None,
        }
    }

    pub fn to_html(&self, class_name: Option<&str>) -> String {
        let mut class = format!("vizport-{}", self.kind.fence_tag());
        if let Some(extra) = class_name.filter(|extra| !extra.trim().is_empty()) {
            class.push(' ');
            class.push_str(extra.trim());
        }
        format!(
            r#"<div class="{}" data-element-id="{}">{}</div>"#,
            htmlize::escape_attribute(class.as_str()),
            htmlize::escape_attribute(self.element_id.as_str()),
            self.markup
        )
    }
}

type SuccessCallback = Arc<dyn Fn(&Artifact) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Success/error hooks fired at most once per attempt.
#[derive(Clone, Default)]
pub struct RenderCallbacks {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl fmt::Debug for RenderCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl RenderCallbacks {
    pub fn with_success(mut self, f: impl Fn(&Artifact) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn with_error(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn success(&self, artifact: &Artifact) {
        if let Some(f) = &self.on_success {
            f(artifact);
        }
    }

    pub(crate) fn error(&self, message: &str) {
        if let Some(f) = &self.on_error {
            f(message);
        }
    }
}

/// Everything a pipeline needs to prepare one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub content: String,
    pub theme: ResolvedTheme,
    pub device: DeviceClass,
    pub element_id: SmolStr,
    pub label: String,
    pub max_inline_records: usize,
}

/// Per-kind rendering steps plugged into [`Renderer`].
pub trait RenderPipeline: Send + Sync + 'static {
    type Engine: ?Sized + Send + Sync + 'static;
    type Prepared: Send + 'static;

    const KIND: DiagramKind;

    fn slot(registry: &LibraryRegistry) -> &Arc<EngineSlot<Self::Engine>>;

    /// Parses, validates, and themes the request. Runs after the engine is available.
    fn prepare(&self, request: &RenderRequest) -> Result<Self::Prepared, RenderError>;

    fn invoke(
        engine: Arc<Self::Engine>,
        prepared: Self::Prepared,
    ) -> BoxFuture<'static, Result<Artifact, RenderError>>;
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// One mounted diagram instance.
pub struct Renderer<P: RenderPipeline> {
    pipeline: Arc<P>,
    registry: Arc<LibraryRegistry>,
    tracker: Arc<AttemptTracker>,
    callbacks: RenderCallbacks,
    settings: RenderSettings,
    probe: Arc<dyn ColorSchemeProbe>,
    alt: Option<String>,
    class_name: Option<String>,
    device: DeviceClass,
    instance: u64,
    input: Option<(String, Theme)>,
    task: Option<JoinHandle<()>>,
}

impl<P: RenderPipeline> fmt::Debug for Renderer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("kind", &P::KIND)
            .field("instance", &self.instance)
            .field("device", &self.device)
            .field("phase", &self.tracker.phase())
            .finish_non_exhaustive()
    }
}

impl<P: RenderPipeline> Renderer<P> {
    pub fn new(pipeline: P, registry: Arc<LibraryRegistry>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            registry,
            tracker: Arc::new(AttemptTracker::default()),
            callbacks: RenderCallbacks::default(),
            settings: RenderSettings::default(),
            probe: Arc::new(FixedColorScheme(false)),
            alt: None,
            class_name: None,
            device: DeviceClass::default(),
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            input: None,
            task: None,
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// System color-scheme probe consulted for [`Theme::Auto`].
    pub fn with_probe(mut self, probe: Arc<dyn ColorSchemeProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        let alt = alt.into();
        self.alt = (!alt.trim().is_empty()).then_some(alt);
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_device(mut self, device: DeviceClass) -> Self {
        self.device = device;
        self
    }

    pub fn on_render_success(mut self, f: impl Fn(&Artifact) + Send + Sync + 'static) -> Self {
        self.callbacks = std::mem::take(&mut self.callbacks).with_success(f);
        self
    }

    pub fn on_render_error(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.callbacks = std::mem::take(&mut self.callbacks).with_error(f);
        self
    }

    pub fn kind(&self) -> DiagramKind {
        P::KIND
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn content(&self) -> Option<&str> {
        self.input.as_ref().map(|(content, _)| content.as_str())
    }

    /// Accessible label used for the artifact: the caller's `alt` or the per-kind default.
    pub fn label(&self) -> &str {
        self.alt.as_deref().unwrap_or(P::KIND.default_alt())
    }

    /// Feeds new input. Identical consecutive input keeps the current attempt unless that attempt
    /// failed to load its engine, in which case it is retried.
    pub fn update(&mut self, content: &str, theme: Theme) -> RenderPhase {
        let unchanged = self
            .input
            .as_ref()
            .is_some_and(|(current, current_theme)| current == content && *current_theme == theme);
        if !unchanged {
            self.input = Some((content.to_owned(), theme));
            self.restart();
        } else if self.phase().is_load_failure() {
            self.restart();
        }
        self.phase()
    }

    /// Re-runs a failed attempt with the current input. Any other phase is left alone.
    pub fn retry(&mut self) -> RenderPhase {
        if matches!(self.phase(), RenderPhase::Failed(_)) {
            self.restart();
        }
        self.phase()
    }

    /// Switching device class changes the engine configuration, so it re-renders.
    pub fn set_device_class(&mut self, device: DeviceClass) {
        if self.device != device {
            self.device = device;
            self.restart();
        }
    }

    pub fn phase(&self) -> RenderPhase {
        self.tracker.phase()
    }

    pub fn display(&self) -> DisplayState {
        let raw = self.content().unwrap_or_default();
        match self.phase() {
            RenderPhase::Empty => DisplayState::Empty,
            RenderPhase::Loading | RenderPhase::Rendering => DisplayState::Loading {
                size: IndicatorSize::for_device(self.device),
            },
            RenderPhase::Success(artifact) => DisplayState::Ready {
                artifact,
                class_name: self.class_name.clone(),
            },
            RenderPhase::Failed(err) => DisplayState::Error(ErrorBlock::new(
                P::KIND,
                err.to_string(),
                raw.to_owned(),
            )),
        }
    }

    /// Drops any in-flight attempt; no callback fires afterwards.
    pub fn unmount(&mut self) {
        self.tracker.unmount();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn restart(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let Some((content, theme)) = self.input.clone() else {
            return;
        };

        if content.trim().is_empty() {
            self.tracker.begin(RenderPhase::Empty);
            return;
        }

        let generation = self.tracker.begin(RenderPhase::Loading);
        let request = RenderRequest {
            content,
            theme: theme.resolve(self.probe.as_ref()),
            device: self.device,
            element_id: format_smolstr!("{}-{}-{}", P::KIND.fence_tag(), self.instance, generation),
            label: self.label().to_owned(),
            max_inline_records: self.settings.max_inline_records,
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            let err = RenderError::LibraryLoad {
                kind: P::KIND,
                message: "no async runtime available".to_owned(),
            };
            tracing::warn!(kind = %P::KIND, error = %err, "render skipped");
            self.tracker.finish(generation, Err(err), &self.callbacks);
            return;
        };

        tracing::debug!(kind = %P::KIND, element_id = %request.element_id, "render started");
        self.task = Some(handle.spawn(drive(
            Arc::clone(&self.pipeline),
            Arc::clone(P::slot(&self.registry)),
            Arc::clone(&self.tracker),
            self.callbacks.clone(),
            request,
            generation,
            self.settings.render_timeout,
        )));
    }
}

impl<P: RenderPipeline> Drop for Renderer<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn drive<P: RenderPipeline>(
    pipeline: Arc<P>,
    slot: Arc<EngineSlot<P::Engine>>,
    tracker: Arc<AttemptTracker>,
    callbacks: RenderCallbacks,
    request: RenderRequest,
    generation: u64,
    timeout: Duration,
) {
    let element_id = request.element_id.clone();
    loop {
        let Some(outcome) =
            attempt(&*pipeline, &slot, &tracker, &request, generation, timeout).await
        else {
            tracing::debug!(kind = %P::KIND, %element_id, "render superseded");
            return;
        };

        let load_failed = matches!(outcome, Err(RenderError::LibraryLoad { .. }));
        if let Err(err) = &outcome {
            tracing::warn!(kind = %P::KIND, %element_id, error = %err, "render failed");
        }
        if !tracker.finish(generation, outcome, &callbacks) {
            tracing::debug!(kind = %P::KIND, %element_id, "stale render result dropped");
            return;
        }
        tracing::debug!(kind = %P::KIND, %element_id, "render resolved");
        if !load_failed {
            return;
        }

        // A later successful load by any consumer of the slot revives this attempt.
        let mut states = slot.subscribe();
        let loaded = states.wait_for(LibraryState::is_loaded).await.is_ok();
        if !loaded || !tracker.reopen(generation) {
            return;
        }
        tracing::debug!(kind = %P::KIND, %element_id, "engine loaded, retrying render");
    }
}

/// Runs one attempt. `None` means the attempt was superseded before it reached the engine.
async fn attempt<P: RenderPipeline>(
    pipeline: &P,
    slot: &Arc<EngineSlot<P::Engine>>,
    tracker: &AttemptTracker,
    request: &RenderRequest,
    generation: u64,
    timeout: Duration,
) -> Option<Result<Artifact, RenderError>> {
    let engine = match slot.acquire().await {
        Ok(engine) => engine,
        Err(err) => {
            return Some(Err(RenderError::LibraryLoad {
                kind: P::KIND,
                message: err.message().to_owned(),
            }))
        }
    };

    if !tracker.is_current(generation) {
        return None;
    }

    let prepared = match pipeline.prepare(request) {
        Ok(prepared) => prepared,
        Err(err) => return Some(Err(err)),
    };

    if !tracker.advance(generation, RenderPhase::Rendering) {
        return None;
    }

    // The engine call runs on its own task: a timeout stops waiting but never cancels it.
    let call = tokio::spawn(P::invoke(engine, prepared));
    let outcome = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(RenderError::engine(P::KIND, "engine panicked"))
        }
        Ok(Err(_)) => Err(RenderError::engine(P::KIND, "engine call was cancelled")),
        Err(_) => Err(RenderError::Timeout { kind: P::KIND }),
    };
    Some(outcome)
}
