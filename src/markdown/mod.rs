// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Markdown integration: splits a message into prose and diagrams and keeps one mounted
//! renderer/viewport pair per diagram across streaming updates.

use std::sync::Arc;

use crate::config::RenderSettings;
use crate::detect::{detect_diagrams, DetectionReport};
use crate::model::{
    ColorSchemeProbe, DeviceClass, DiagramDescriptor, DiagramKind, EnvColorScheme, Theme,
};
use crate::registry::LibraryRegistry;
use crate::render::{
    Artifact, ChartOptions, DisplayState, MermaidPipeline, MermaidRenderer, RenderPhase,
    VegaLitePipeline, VegaLiteRenderer,
};
use crate::viewport::{Viewport, ViewportConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Markdown(&'a str),
    Diagram(&'a DiagramDescriptor),
}

/// Interleaves prose and diagrams in source order. Whitespace-only prose is dropped.
pub fn split_segments<'a>(text: &'a str, report: &'a DetectionReport) -> Vec<Segment<'a>> {
    let mut segments = Vec::with_capacity(report.descriptors().len() * 2 + 1);
    let mut cursor = 0;

    for descriptor in report.descriptors() {
        let span = descriptor.span();
        if span.start < cursor {
            continue;
        }
        if let Some(prose) = text.get(cursor..span.start) {
            push_prose(&mut segments, prose);
        }
        segments.push(Segment::Diagram(descriptor));
        cursor = span.end;
    }
    if let Some(rest) = text.get(cursor..) {
        push_prose(&mut segments, rest);
    }
    segments
}

fn push_prose<'a>(segments: &mut Vec<Segment<'a>>, prose: &'a str) {
    if !prose.trim().is_empty() {
        segments.push(Segment::Markdown(prose));
    }
}

/// Formats non-diagram markdown. Supplied by the host.
pub trait TextFormatter {
    fn format(&self, markdown: &str) -> String;
}

/// Passes markdown through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFormatter;

impl TextFormatter for IdentityFormatter {
    fn format(&self, markdown: &str) -> String {
        markdown.to_owned()
    }
}

#[derive(Debug)]
pub enum DiagramRenderer {
    Mermaid(MermaidRenderer),
    VegaLite(VegaLiteRenderer),
}

impl DiagramRenderer {
    pub fn kind(&self) -> DiagramKind {
        match self {
            Self::Mermaid(renderer) => renderer.kind(),
            Self::VegaLite(renderer) => renderer.kind(),
        }
    }

    pub fn update(&mut self, content: &str, theme: Theme) -> RenderPhase {
        match self {
            Self::Mermaid(renderer) => renderer.update(content, theme),
            Self::VegaLite(renderer) => renderer.update(content, theme),
        }
    }

    pub fn retry(&mut self) -> RenderPhase {
        match self {
            Self::Mermaid(renderer) => renderer.retry(),
            Self::VegaLite(renderer) => renderer.retry(),
        }
    }

    pub fn set_device_class(&mut self, device: DeviceClass) {
        match self {
            Self::Mermaid(renderer) => renderer.set_device_class(device),
            Self::VegaLite(renderer) => renderer.set_device_class(device),
        }
    }

    pub fn phase(&self) -> RenderPhase {
        match self {
            Self::Mermaid(renderer) => renderer.phase(),
            Self::VegaLite(renderer) => renderer.phase(),
        }
    }

    pub fn display(&self) -> DisplayState {
        match self {
            Self::Mermaid(renderer) => renderer.display(),
            Self::VegaLite(renderer) => renderer.display(),
        }
    }

    pub fn unmount(&mut self) {
        match self {
            Self::Mermaid(renderer) => renderer.unmount(),
            Self::VegaLite(renderer) => renderer.unmount(),
        }
    }
}

/// One mounted diagram: its renderer and the viewport hosting the artifact.
#[derive(Debug)]
pub struct DiagramUnit {
    pub renderer: DiagramRenderer,
    pub viewport: Viewport,
}

impl DiagramUnit {
    pub fn artifact(&self) -> Option<Arc<Artifact>> {
        self.renderer.phase().artifact().cloned()
    }

    pub fn to_html(&self) -> String {
        let display = self.renderer.display();
        if !display.is_ready() {
            return display.to_html();
        }

        let controls = self
            .viewport
            .controls()
            .map(|controls| controls.to_html())
            .unwrap_or_default();
        format!(
            r#"<div class="vizport-viewport" style="{}">{}<div style="transform: {}; transform-origin: 0 0;">{}</div></div>"#,
            self.viewport.container_style(),
            controls,
            self.viewport.transform_css(),
            display.to_html()
        )
    }
}

/// A rendered assistant message.
pub struct MessageView {
    registry: Arc<LibraryRegistry>,
    settings: RenderSettings,
    chart_options: ChartOptions,
    probe: Arc<dyn ColorSchemeProbe>,
    theme: Theme,
    device: DeviceClass,
    content: String,
    report: DetectionReport,
    units: Vec<DiagramUnit>,
}

impl std::fmt::Debug for MessageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageView")
            .field("theme", &self.theme)
            .field("device", &self.device)
            .field("report", &self.report)
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

impl MessageView {
    pub fn new(registry: Arc<LibraryRegistry>) -> Self {
        Self {
            registry,
            settings: RenderSettings::default(),
            chart_options: ChartOptions::default(),
            probe: Arc::new(EnvColorScheme),
            theme: Theme::default(),
            device: DeviceClass::default(),
            content: String::new(),
            report: DetectionReport::default(),
            units: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_chart_options(mut self, options: ChartOptions) -> Self {
        self.chart_options = options;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn ColorSchemeProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_device(mut self, device: DeviceClass) -> Self {
        self.device = device;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn report(&self) -> &DetectionReport {
        &self.report
    }

    pub fn units(&self) -> &[DiagramUnit] {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut [DiagramUnit] {
        &mut self.units
    }

    /// Re-detects diagrams and reconciles mounted units by position.
    ///
    /// A unit whose kind still matches is fed the new content (a no-op when unchanged); the rest
    /// are remounted or dropped.
    pub fn update(&mut self, content: &str) -> &DetectionReport {
        if content == self.content {
            return &self.report;
        }
        self.content = content.to_owned();
        self.report = detect_diagrams(content);

        let descriptors = self.report.descriptors();
        self.units.truncate(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            match self.units.get_mut(index) {
                Some(unit) if unit.renderer.kind() == descriptor.kind() => {
                    unit.renderer.update(descriptor.content(), self.theme);
                }
                Some(unit) => {
                    tracing::debug!(index, kind = %descriptor.kind(), "remounting diagram unit");
                    *unit = mount(
                        descriptor,
                        &self.registry,
                        &self.settings,
                        self.chart_options,
                        &self.probe,
                        self.theme,
                        self.device,
                    );
                }
                None => {
                    let unit = mount(
                        descriptor,
                        &self.registry,
                        &self.settings,
                        self.chart_options,
                        &self.probe,
                        self.theme,
                        self.device,
                    );
                    self.units.push(unit);
                }
            }
        }
        &self.report
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme == theme {
            return;
        }
        self.theme = theme;
        for (unit, descriptor) in self.units.iter_mut().zip(self.report.descriptors()) {
            unit.renderer.update(descriptor.content(), theme);
        }
    }

    /// Device class changes re-render each diagram and rebuild its viewport bounds.
    pub fn set_device_class(&mut self, device: DeviceClass) {
        if self.device == device {
            return;
        }
        self.device = device;
        for unit in &mut self.units {
            unit.renderer.set_device_class(device);
            unit.viewport = Viewport::with_settings(
                ViewportConfig::with_settings(device, &self.settings),
                &self.settings,
            );
        }
    }

    /// Re-runs every diagram whose last attempt failed.
    pub fn retry(&mut self) {
        for unit in &mut self.units {
            unit.renderer.retry();
        }
    }

    pub fn to_html(&self, formatter: &dyn TextFormatter) -> String {
        let mut html = String::new();
        let mut units = self.units.iter();
        for segment in split_segments(&self.content, &self.report) {
            match segment {
                Segment::Markdown(prose) => html.push_str(&formatter.format(prose)),
                Segment::Diagram(_) => {
                    if let Some(unit) = units.next() {
                        html.push_str(&unit.to_html());
                    }
                }
            }
        }
        html
    }

    pub fn unmount(&mut self) {
        for unit in &mut self.units {
            unit.renderer.unmount();
        }
        self.units.clear();
    }
}

fn mount(
    descriptor: &DiagramDescriptor,
    registry: &Arc<LibraryRegistry>,
    settings: &RenderSettings,
    chart_options: ChartOptions,
    probe: &Arc<dyn ColorSchemeProbe>,
    theme: Theme,
    device: DeviceClass,
) -> DiagramUnit {
    let mut renderer = match descriptor.kind() {
        DiagramKind::Mermaid => DiagramRenderer::Mermaid(
            MermaidRenderer::new(MermaidPipeline, Arc::clone(registry))
                .with_settings(settings.clone())
                .with_probe(Arc::clone(probe))
                .with_device(device),
        ),
        DiagramKind::VegaLite => DiagramRenderer::VegaLite(
            VegaLiteRenderer::new(VegaLitePipeline::new(chart_options), Arc::clone(registry))
                .with_settings(settings.clone())
                .with_probe(Arc::clone(probe))
                .with_device(device),
        ),
    };
    renderer.update(descriptor.content(), theme);

    DiagramUnit {
        renderer,
        viewport: Viewport::with_settings(ViewportConfig::with_settings(device, settings), settings),
    }
}
