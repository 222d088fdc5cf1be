// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Vega-Lite rendering: specification validation, sanitization, theme merge, and the pipeline.
//!
//! Checks run in a fixed order (parse, mark/composition, inline dataset size) and a spec that
//! fails any of them is rejected outright; there is no partial render.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use smol_str::SmolStr;

use super::svg::{finalize_svg, SvgAccessibility};
use super::{Artifact, RenderError, RenderPipeline, RenderRequest};
use crate::engine::{ChartSurface, ChartView, EmbedOptions, VegaLiteEngine};
use crate::model::{DiagramKind, ResolvedTheme};
use crate::registry::{EngineSlot, LibraryRegistry};

/// Composition operators whose value is an array of sub-specifications.
const ARRAY_COMPOSITIONS: [&str; 4] = ["layer", "concat", "hconcat", "vconcat"];
/// Composition operators that wrap a single sub-specification under `spec`.
const WRAPPING_COMPOSITIONS: [&str; 2] = ["facet", "repeat"];

/// Top-level properties that can pull in or evaluate outside resources.
pub const DENIED_PROPERTIES: [&str; 3] = ["datasets", "usermeta", "signals"];
/// `data` properties that reference outside resources.
const DENIED_DATA_PROPERTIES: [&str; 1] = ["url"];

/// Transform parameter that references a secondary data source.
const SECONDARY_DATA_KEY: &str = "from";

/// Every transform operator Vega-Lite knows about.
const TRANSFORM_OPERATORS: [&str; 19] = [
    "aggregate",
    "bin",
    "calculate",
    "density",
    "extent",
    "filter",
    "flatten",
    "fold",
    "impute",
    "joinaggregate",
    "loess",
    "lookup",
    "pivot",
    "quantile",
    "regression",
    "sample",
    "stack",
    "timeUnit",
    "window",
];

/// Transform operators retained after sanitization.
pub const ALLOWED_TRANSFORMS: [&str; 16] = [
    "aggregate",
    "bin",
    "calculate",
    "density",
    "filter",
    "flatten",
    "fold",
    "joinaggregate",
    "loess",
    "pivot",
    "quantile",
    "regression",
    "sample",
    "stack",
    "timeUnit",
    "window",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSpecError {
    Parse(String),
    NotAnObject,
    MissingMark,
    DatasetTooLarge { records: usize, max: usize },
}

impl fmt::Display for ChartSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "Invalid JSON: {message}"),
            Self::NotAnObject => {
                f.write_str("Invalid chart specification: expected a JSON object")
            }
            Self::MissingMark => f.write_str(
                "Invalid chart specification: missing required mark or composition property",
            ),
            Self::DatasetTooLarge { records, max } => write!(
                f,
                "Invalid chart specification: dataset too large ({records} records, maximum {max})"
            ),
        }
    }
}

impl std::error::Error for ChartSpecError {}

/// Interactive feature flags for chart renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartOptions {
    pub enable_tooltips: bool,
    pub enable_hover: bool,
    pub show_actions: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            enable_tooltips: true,
            enable_hover: true,
            show_actions: false,
        }
    }
}

impl ChartOptions {
    pub fn embed_options(&self) -> EmbedOptions {
        EmbedOptions {
            actions: self.show_actions,
            tooltip: self.enable_tooltips,
            hover: self.enable_hover,
            renderer: ChartSurface::Svg,
        }
    }
}

/// Parses and validates `content`, then sanitizes and themes it for the engine.
pub fn prepare_chart_spec(
    content: &str,
    theme: ResolvedTheme,
    max_inline_records: usize,
) -> Result<Value, ChartSpecError> {
    let mut spec: Value =
        serde_json::from_str(content).map_err(|err| ChartSpecError::Parse(err.to_string()))?;
    validate_chart_spec(&spec, max_inline_records)?;
    sanitize_chart_spec(&mut spec);
    merge_theme_config(&mut spec, theme);
    Ok(spec)
}

pub fn validate_chart_spec(spec: &Value, max_inline_records: usize) -> Result<(), ChartSpecError> {
    let object = spec.as_object().ok_or(ChartSpecError::NotAnObject)?;
    if !has_mark_or_composition(object) {
        return Err(ChartSpecError::MissingMark);
    }
    check_inline_records(object, max_inline_records)
}

fn has_mark_or_composition(spec: &Map<String, Value>) -> bool {
    if spec.contains_key("mark") {
        return true;
    }
    if ARRAY_COMPOSITIONS
        .iter()
        .any(|key| spec.get(*key).is_some_and(Value::is_array))
    {
        return true;
    }
    WRAPPING_COMPOSITIONS
        .iter()
        .any(|key| spec.contains_key(*key))
        && spec.get("spec").is_some_and(Value::is_object)
}

fn check_inline_records(spec: &Map<String, Value>, max: usize) -> Result<(), ChartSpecError> {
    let inline = spec
        .get("data")
        .and_then(|data| data.get("values"))
        .and_then(Value::as_array);
    let named = spec
        .get("datasets")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|datasets| datasets.values())
        .filter_map(Value::as_array);
    for values in inline.into_iter().chain(named) {
        if values.len() > max {
            return Err(ChartSpecError::DatasetTooLarge {
                records: values.len(),
                max,
            });
        }
    }

    for child in sub_specs(spec) {
        if let Some(child) = child.as_object() {
            check_inline_records(child, max)?;
        }
    }
    Ok(())
}

fn sub_specs(spec: &Map<String, Value>) -> impl Iterator<Item = &Value> + '_ {
    let arrays = ARRAY_COMPOSITIONS
        .iter()
        .filter_map(|key| spec.get(*key).and_then(Value::as_array))
        .flatten();
    arrays.chain(spec.get("spec"))
}

/// Removes denied properties and disallowed transforms, recursively through compositions.
pub fn sanitize_chart_spec(spec: &mut Value) {
    let Some(object) = spec.as_object_mut() else {
        return;
    };

    for key in DENIED_PROPERTIES {
        object.remove(key);
    }

    if let Some(data) = object.get_mut("data").and_then(Value::as_object_mut) {
        for key in DENIED_DATA_PROPERTIES {
            data.remove(key);
        }
    }

    if let Some(transforms) = object.get_mut("transform").and_then(Value::as_array_mut) {
        transforms.retain(|transform| {
            transform_operator(transform).is_some_and(|op| ALLOWED_TRANSFORMS.contains(&op))
        });
    }

    for key in ARRAY_COMPOSITIONS {
        if let Some(children) = object.get_mut(key).and_then(Value::as_array_mut) {
            children.iter_mut().for_each(sanitize_chart_spec);
        }
    }
    if let Some(child) = object.get_mut("spec") {
        sanitize_chart_spec(child);
    }
}

/// The single operator a transform applies. Transforms naming several operators, or pulling
/// in a secondary data source, have none.
fn transform_operator(transform: &Value) -> Option<&'static str> {
    let object = transform.as_object()?;
    if object.contains_key(SECONDARY_DATA_KEY) {
        return None;
    }
    let mut operators = TRANSFORM_OPERATORS
        .iter()
        .copied()
        .filter(|op| object.contains_key(*op));
    match (operators.next(), operators.next()) {
        (Some(op), None) => Some(op),
        _ => None,
    }
}

/// Fills missing color roles and autosize policy without touching author-supplied values.
///
/// Applying the merge twice yields the same specification.
pub fn merge_theme_config(spec: &mut Value, theme: ResolvedTheme) {
    let Some(object) = spec.as_object_mut() else {
        return;
    };
    let palette = theme.palette();

    let config = object
        .entry("config")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(config) = config.as_object_mut() {
        fill(config, &["background"], palette.background);
        fill(config, &["title", "color"], palette.text);
        fill(config, &["axis", "labelColor"], palette.muted_text);
        fill(config, &["axis", "titleColor"], palette.text);
        fill(config, &["axis", "gridColor"], palette.grid);
        fill(config, &["axis", "domainColor"], palette.line);
        fill(config, &["axis", "tickColor"], palette.line);
        fill(config, &["legend", "labelColor"], palette.muted_text);
        fill(config, &["legend", "titleColor"], palette.text);
        fill(config, &["header", "labelColor"], palette.muted_text);
        fill(config, &["header", "titleColor"], palette.text);
        fill(config, &["view", "stroke"], palette.grid);
    }

    object.entry("autosize").or_insert_with(|| {
        json!({
            "type": "fit",
            "contains": "padding",
            "resize": true,
        })
    });
}

fn fill(config: &mut Map<String, Value>, path: &[&str], value: &str) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    let mut cursor = config;
    for key in parents {
        let next = cursor
            .entry((*key).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        // An author-supplied non-object value wins; leave it alone.
        let Some(next) = next.as_object_mut() else {
            return;
        };
        cursor = next;
    }

    cursor
        .entry((*leaf).to_owned())
        .or_insert_with(|| Value::String(value.to_owned()));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VegaLitePipeline {
    options: ChartOptions,
}

impl VegaLitePipeline {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ChartOptions {
        self.options
    }
}

#[derive(Debug, Clone)]
pub struct PreparedChart {
    element_id: SmolStr,
    spec: Value,
    embed: EmbedOptions,
    label: String,
}

impl RenderPipeline for VegaLitePipeline {
    type Engine = dyn VegaLiteEngine;
    type Prepared = PreparedChart;

    const KIND: DiagramKind = DiagramKind::VegaLite;

    fn slot(registry: &LibraryRegistry) -> &Arc<EngineSlot<Self::Engine>> {
        registry.vega_lite()
    }

    fn prepare(&self, request: &RenderRequest) -> Result<Self::Prepared, RenderError> {
        let spec = prepare_chart_spec(&request.content, request.theme, request.max_inline_records)
            .map_err(|err| RenderError::validation(Self::KIND, err))?;

        Ok(PreparedChart {
            element_id: request.element_id.clone(),
            spec,
            embed: self.options.embed_options(),
            label: request.label.clone(),
        })
    }

    fn invoke(
        engine: Arc<Self::Engine>,
        prepared: Self::Prepared,
    ) -> BoxFuture<'static, Result<Artifact, RenderError>> {
        async move {
            let view = engine
                .embed(&prepared.spec, &prepared.embed)
                .await
                .map_err(|err| RenderError::engine(Self::KIND, err))?;

            let (markup, title_id, desc_id) = finalize_chart_view(&view, &prepared)?;

            Ok(Artifact {
                kind: Self::KIND,
                element_id: prepared.element_id,
                markup,
                surface: view.surface,
                label: prepared.label,
                title_id,
                desc_id,
                spec: Some(prepared.spec),
            })
        }
        .boxed()
    }
}

fn chart_description(spec: &Value) -> String {
    let mark = spec
        .get("mark")
        .and_then(|mark| mark.as_str().or_else(|| mark.get("type").and_then(Value::as_str)));
    match (mark, spec.get("description").and_then(Value::as_str)) {
        (_, Some(description)) => description.to_owned(),
        (Some(mark), None) => format!("Vega-Lite {mark} chart"),
        (None, None) => "Composed Vega-Lite chart".to_owned(),
    }
}

type FinalizedChart = (String, Option<SmolStr>, Option<SmolStr>);

fn finalize_chart_view(
    view: &ChartView,
    prepared: &PreparedChart,
) -> Result<FinalizedChart, RenderError> {
    match view.surface {
        ChartSurface::Svg => {
            let description = chart_description(&prepared.spec);
            let finalized = finalize_svg(
                &view.markup,
                SvgAccessibility {
                    id_prefix: &prepared.element_id,
                    label: &prepared.label,
                    description: &description,
                },
            )
            .map_err(|err| RenderError::engine(DiagramKind::VegaLite, err))?;
            Ok((finalized.markup, Some(finalized.title_id), Some(finalized.desc_id)))
        }
        // Canvas output cannot carry a title/description pair; label the wrapper instead.
        ChartSurface::Canvas => Ok((
            format!(
                r#"<div role="img" aria-label="{}" style="width: 100%;">{}</div>"#,
                htmlize::escape_attribute(prepared.label.as_str()),
                view.markup
            ),
            None,
            None,
        )),
    }
}
