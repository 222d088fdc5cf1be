// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid rendering: sandboxed engine configuration and the render pipeline.
//!
//! Content is handed to the engine verbatim. Security is enforced through configuration
//! (`securityLevel: strict`, no HTML labels, bounded text size) rather than by inspecting the
//! graph description.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use smol_str::SmolStr;

use super::svg::{finalize_svg, SvgAccessibility};
use super::{Artifact, RenderError, RenderPipeline, RenderRequest};
use crate::engine::{ChartSurface, MermaidEngine};
use crate::model::{DeviceClass, DiagramKind, ResolvedTheme};
use crate::registry::{EngineSlot, LibraryRegistry};

pub const MAX_TEXT_SIZE: usize = 50_000;
const FONT_FAMILY: &str =
    "ui-sans-serif, system-ui, -apple-system, \"Segoe UI\", Roboto, \"Helvetica Neue\", Arial, sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Strict,
}

/// Configuration object handed to the Mermaid engine, serialized with Mermaid's key names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MermaidConfig {
    pub start_on_load: bool,
    pub theme: &'static str,
    pub dark_mode: bool,
    pub security_level: SecurityLevel,
    pub html_labels: bool,
    pub max_text_size: usize,
    pub font_family: &'static str,
    pub font_size: u32,
    pub theme_variables: ThemeVariables,
    pub flowchart: FlowchartLayout,
    pub sequence: SequenceLayout,
    pub gantt: GanttLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeVariables {
    pub background: &'static str,
    pub primary_color: &'static str,
    pub primary_text_color: &'static str,
    pub primary_border_color: &'static str,
    pub secondary_color: &'static str,
    pub tertiary_color: &'static str,
    pub line_color: &'static str,
    pub text_color: &'static str,
    pub main_bkg: &'static str,
    pub font_family: &'static str,
    pub font_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartLayout {
    pub html_labels: bool,
    pub use_max_width: bool,
    pub curve: &'static str,
    pub padding: u32,
    pub node_spacing: u32,
    pub rank_spacing: u32,
    pub diagram_padding: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceLayout {
    pub use_max_width: bool,
    pub diagram_margin_x: u32,
    pub diagram_margin_y: u32,
    pub actor_margin: u32,
    pub box_margin: u32,
    pub message_margin: u32,
    pub note_margin: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttLayout {
    pub use_max_width: bool,
    pub left_padding: u32,
    pub grid_line_start_padding: u32,
    pub top_padding: u32,
    pub bar_height: u32,
    pub bar_gap: u32,
    pub font_size: u32,
}

fn flowchart_layout(device: DeviceClass) -> FlowchartLayout {
    match device {
        DeviceClass::Desktop => FlowchartLayout {
            html_labels: false,
            use_max_width: true,
            curve: "basis",
            padding: 15,
            node_spacing: 50,
            rank_spacing: 50,
            diagram_padding: 8,
        },
        DeviceClass::Mobile => FlowchartLayout {
            html_labels: false,
            use_max_width: true,
            curve: "basis",
            padding: 8,
            node_spacing: 30,
            rank_spacing: 35,
            diagram_padding: 4,
        },
    }
}

fn sequence_layout(device: DeviceClass) -> SequenceLayout {
    match device {
        DeviceClass::Desktop => SequenceLayout {
            use_max_width: true,
            diagram_margin_x: 50,
            diagram_margin_y: 10,
            actor_margin: 50,
            box_margin: 10,
            message_margin: 35,
            note_margin: 10,
        },
        DeviceClass::Mobile => SequenceLayout {
            use_max_width: true,
            diagram_margin_x: 20,
            diagram_margin_y: 8,
            actor_margin: 25,
            box_margin: 6,
            message_margin: 25,
            note_margin: 6,
        },
    }
}

fn gantt_layout(device: DeviceClass) -> GanttLayout {
    match device {
        DeviceClass::Desktop => GanttLayout {
            use_max_width: true,
            left_padding: 75,
            grid_line_start_padding: 35,
            top_padding: 50,
            bar_height: 20,
            bar_gap: 4,
            font_size: 11,
        },
        DeviceClass::Mobile => GanttLayout {
            use_max_width: true,
            left_padding: 40,
            grid_line_start_padding: 20,
            top_padding: 30,
            bar_height: 16,
            bar_gap: 3,
            font_size: 10,
        },
    }
}

/// Builds the full engine configuration for one `(theme, device)` pair.
pub fn mermaid_config(theme: ResolvedTheme, device: DeviceClass) -> MermaidConfig {
    let palette = theme.palette();
    let font_size = match device {
        DeviceClass::Desktop => 16,
        DeviceClass::Mobile => 14,
    };

    MermaidConfig {
        start_on_load: false,
        theme: "base",
        dark_mode: matches!(theme, ResolvedTheme::Dark),
        security_level: SecurityLevel::Strict,
        html_labels: false,
        max_text_size: MAX_TEXT_SIZE,
        font_family: FONT_FAMILY,
        font_size,
        theme_variables: ThemeVariables {
            background: palette.background,
            primary_color: palette.primary,
            primary_text_color: palette.primary_text,
            primary_border_color: palette.primary_border,
            secondary_color: palette.secondary,
            tertiary_color: palette.tertiary,
            line_color: palette.line,
            text_color: palette.text,
            main_bkg: palette.primary,
            font_family: FONT_FAMILY,
            font_size: format!("{font_size}px"),
        },
        flowchart: flowchart_layout(device),
        sequence: sequence_layout(device),
        gantt: gantt_layout(device),
    }
}

/// Short description of the diagram derived from its header keyword.
pub fn describe_mermaid_source(source: &str) -> &'static str {
    let keyword = source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))
        .and_then(|line| line.split_whitespace().next())
        .unwrap_or("");

    match keyword {
        "graph" | "flowchart" | "flowchart-elk" => "Flowchart diagram",
        "sequenceDiagram" => "Sequence diagram",
        "classDiagram" | "classDiagram-v2" => "Class diagram",
        "stateDiagram" | "stateDiagram-v2" => "State diagram",
        "erDiagram" => "Entity relationship diagram",
        "gantt" => "Gantt chart",
        "pie" => "Pie chart",
        "journey" => "User journey diagram",
        "gitGraph" => "Git graph",
        "mindmap" => "Mind map",
        "timeline" => "Timeline",
        _ => "Mermaid diagram",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidPipeline;

#[derive(Debug, Clone)]
pub struct PreparedMermaid {
    element_id: SmolStr,
    source: String,
    config: MermaidConfig,
    label: String,
    description: &'static str,
}

impl PreparedMermaid {
    pub fn config(&self) -> &MermaidConfig {
        &self.config
    }
}

impl RenderPipeline for MermaidPipeline {
    type Engine = dyn MermaidEngine;
    type Prepared = PreparedMermaid;

    const KIND: DiagramKind = DiagramKind::Mermaid;

    fn slot(registry: &LibraryRegistry) -> &Arc<EngineSlot<Self::Engine>> {
        registry.mermaid()
    }

    fn prepare(&self, request: &RenderRequest) -> Result<Self::Prepared, RenderError> {
        Ok(PreparedMermaid {
            element_id: request.element_id.clone(),
            source: request.content.clone(),
            config: mermaid_config(request.theme, request.device),
            label: request.label.clone(),
            description: describe_mermaid_source(&request.content),
        })
    }

    fn invoke(
        engine: Arc<Self::Engine>,
        prepared: Self::Prepared,
    ) -> BoxFuture<'static, Result<Artifact, RenderError>> {
        async move {
            let svg = engine
                .render(&prepared.element_id, &prepared.source, &prepared.config)
                .await
                .map_err(|err| RenderError::engine(Self::KIND, err))?;

            let finalized = finalize_svg(
                &svg,
                SvgAccessibility {
                    id_prefix: &prepared.element_id,
                    label: &prepared.label,
                    description: prepared.description,
                },
            )
            .map_err(|err| RenderError::engine(Self::KIND, err))?;

            Ok(Artifact {
                kind: Self::KIND,
                element_id: prepared.element_id,
                markup: finalized.markup,
                surface: ChartSurface::Svg,
                label: prepared.label,
                title_id: Some(finalized.title_id),
                desc_id: Some(finalized.desc_id),
                spec: None,
            })
        }
        .boxed()
    }
}
