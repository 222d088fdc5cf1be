// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use super::{DisplayState, MermaidRenderer, RenderError, RenderPhase, VegaLiteRenderer};
use crate::engine::{ChartSurface, ChartView, EngineError, MermaidEngine, VegaLiteEngine};
use crate::model::{DiagramKind, FixedColorScheme, Theme, DARK_PALETTE};
use crate::registry::LibraryRegistry;
use crate::render::{ChartOptions, MermaidPipeline, VegaLitePipeline};
use crate::test_utils::{settle, svg_for, GatedLoader, Script, ScriptedMermaid, ScriptedVegaLite};

const FLOWCHART: &str = "graph TD\n  A[Start] --> B[End]";

#[derive(Default)]
struct Events {
    successes: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl Events {
    fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

struct Harness {
    mermaid: Arc<ScriptedMermaid>,
    vega_lite: Arc<ScriptedVegaLite>,
    registry: Arc<LibraryRegistry>,
    events: Arc<Events>,
}

impl Harness {
    fn new() -> Self {
        let mermaid = Arc::new(ScriptedMermaid::default());
        let vega_lite = Arc::new(ScriptedVegaLite::default());
        let mermaid_engine: Arc<dyn MermaidEngine> = mermaid.clone();
        let vega_lite_engine: Arc<dyn VegaLiteEngine> = vega_lite.clone();
        let registry = Arc::new(LibraryRegistry::with_loaders(
            GatedLoader::immediate(mermaid_engine),
            GatedLoader::immediate(vega_lite_engine),
        ));
        Self::with_registry(mermaid, vega_lite, registry)
    }

    fn with_registry(
        mermaid: Arc<ScriptedMermaid>,
        vega_lite: Arc<ScriptedVegaLite>,
        registry: Arc<LibraryRegistry>,
    ) -> Self {
        Self {
            mermaid,
            vega_lite,
            registry,
            events: Arc::new(Events::default()),
        }
    }

    fn mermaid_renderer(&self) -> MermaidRenderer {
        let successes = Arc::clone(&self.events);
        let errors = Arc::clone(&self.events);
        MermaidRenderer::new(MermaidPipeline, Arc::clone(&self.registry))
            .on_render_success(move |_| {
                successes.successes.fetch_add(1, Ordering::SeqCst);
            })
            .on_render_error(move |message| {
                errors.errors.lock().unwrap().push(message.to_owned());
            })
    }

    fn chart_renderer(&self) -> VegaLiteRenderer {
        let successes = Arc::clone(&self.events);
        let errors = Arc::clone(&self.events);
        VegaLiteRenderer::new(
            VegaLitePipeline::new(ChartOptions::default()),
            Arc::clone(&self.registry),
        )
        .on_render_success(move |_| {
            successes.successes.fetch_add(1, Ordering::SeqCst);
        })
        .on_render_error(move |message| {
            errors.errors.lock().unwrap().push(message.to_owned());
        })
    }
}

fn chart(values: Value) -> String {
    json!({
        "mark": "bar",
        "data": { "values": values },
        "encoding": {
            "x": { "field": "x", "type": "ordinal" },
            "y": { "field": "y", "type": "quantitative" }
        }
    })
    .to_string()
}

#[tokio::test]
async fn whitespace_content_stays_empty_without_loading() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer();

    assert_eq!(renderer.update("  \n\t", Theme::Light), RenderPhase::Empty);
    settle().await;

    assert_eq!(renderer.phase(), RenderPhase::Empty);
    assert_eq!(renderer.display(), DisplayState::Empty);
    assert_eq!(harness.registry.load_count(DiagramKind::Mermaid), 0);
    assert_eq!(harness.events.successes(), 0);
    assert!(harness.events.errors().is_empty());
}

#[tokio::test]
async fn successful_render_produces_accessible_artifact() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer();

    assert_eq!(renderer.update(FLOWCHART, Theme::Light), RenderPhase::Loading);
    settle().await;

    let phase = renderer.phase();
    let artifact = phase.artifact().expect("rendered");
    assert!(artifact.element_id().starts_with("mermaid-"));
    assert_eq!(artifact.label(), "Mermaid diagram");
    assert!(artifact.markup().contains(r#"role="img""#));
    assert!(!artifact.markup().contains(r#"width="320""#));
    let title_id = artifact.title_id().expect("title id");
    assert!(artifact
        .markup()
        .contains(&format!(r#"<title id="{title_id}">Mermaid diagram</title>"#)));
    assert!(artifact
        .data_uri()
        .expect("svg export")
        .starts_with("data:image/svg+xml;base64,"));

    assert!(renderer.display().is_ready());
    assert_eq!(harness.events.successes(), 1);
    assert!(harness.events.errors().is_empty());
    assert_eq!(harness.mermaid.calls().len(), 1);
}

#[tokio::test]
async fn identical_update_does_not_rerender() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer().with_alt("Login flow");

    renderer.update(FLOWCHART, Theme::Light);
    settle().await;
    renderer.update(FLOWCHART, Theme::Light);
    settle().await;

    assert_eq!(harness.mermaid.calls().len(), 1);
    assert_eq!(harness.events.successes(), 1);
    assert_eq!(
        renderer.phase().artifact().map(|artifact| artifact.label().to_owned()),
        Some("Login flow".to_owned())
    );

    renderer.update(FLOWCHART, Theme::Dark);
    settle().await;
    assert_eq!(harness.mermaid.calls().len(), 2);
}

#[tokio::test]
async fn superseded_attempt_never_overwrites_newer_result() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer();

    let release_first = harness.mermaid.push_gated();
    renderer.update("graph TD\n  A-->B", Theme::Light);
    settle().await;
    assert_eq!(renderer.phase(), RenderPhase::Rendering);

    renderer.update("graph TD\n  A-->B-->C", Theme::Light);
    settle().await;
    let second = renderer.phase().artifact().cloned().expect("second render");

    let _ = release_first.send(Ok(svg_for("stale")));
    settle().await;

    assert_eq!(renderer.phase().artifact(), Some(&second));
    assert_eq!(harness.events.successes(), 1);
    assert!(harness.events.errors().is_empty());

    let calls = harness.mermaid.calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].0, calls[1].0, "each attempt gets a fresh element id");
}

#[tokio::test(start_paused = true)]
async fn slow_engine_times_out_and_late_success_is_dropped() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer();

    let release = harness.mermaid.push_gated();
    renderer.update(FLOWCHART, Theme::Light);
    settle().await;
    assert_eq!(renderer.phase(), RenderPhase::Rendering);

    tokio::time::sleep(Duration::from_millis(9_900)).await;
    assert_eq!(renderer.phase(), RenderPhase::Rendering);

    tokio::time::sleep(Duration::from_millis(200)).await;
    settle().await;
    assert_eq!(
        renderer.phase(),
        RenderPhase::Failed(RenderError::Timeout {
            kind: DiagramKind::Mermaid
        })
    );
    assert_eq!(harness.events.errors(), vec!["Mermaid rendering timeout".to_owned()]);

    let _ = release.send(Ok(svg_for("late")));
    settle().await;

    assert!(renderer.phase().error().is_some_and(RenderError::is_timeout));
    assert_eq!(harness.events.successes(), 0);
    assert_eq!(harness.events.errors().len(), 1);
}

#[tokio::test]
async fn unmount_silences_in_flight_attempt() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer();

    let release = harness.mermaid.push_gated();
    renderer.update(FLOWCHART, Theme::Light);
    settle().await;
    renderer.unmount();

    let _ = release.send(Ok(svg_for("after unmount")));
    settle().await;

    assert_eq!(harness.events.successes(), 0);
    assert!(harness.events.errors().is_empty());
}

#[tokio::test]
async fn dropped_renderer_fires_nothing() {
    let harness = Harness::new();
    let release = harness.mermaid.push_gated();
    {
        let mut renderer = harness.mermaid_renderer();
        renderer.update(FLOWCHART, Theme::Light);
        settle().await;
    }

    let _ = release.send(Ok(svg_for("after drop")));
    settle().await;

    assert_eq!(harness.events.successes(), 0);
    assert!(harness.events.errors().is_empty());
}

#[tokio::test]
async fn engine_failure_surfaces_through_error_channel() {
    let harness = Harness::new();
    harness.mermaid.push(Script::Ready(Err(EngineError::new(
        "Parse error on line 2: unexpected token",
    ))));
    let mut renderer = harness.mermaid_renderer();

    renderer.update("graph TD\n  A--", Theme::Light);
    settle().await;

    assert_eq!(
        harness.events.errors(),
        vec!["Mermaid rendering failed: Parse error on line 2: unexpected token".to_owned()]
    );
    match renderer.display() {
        DisplayState::Error(block) => {
            assert_eq!(block.header(), "Diagram Error:");
            assert_eq!(block.raw(), "graph TD\n  A--");
        }
        other => panic!("expected error display, got {other:?}"),
    }
}

#[tokio::test]
async fn library_load_failure_is_reported_and_retried_on_next_input() {
    let mermaid = Arc::new(ScriptedMermaid::default());
    let vega_lite = Arc::new(ScriptedVegaLite::default());
    let mermaid_engine: Arc<dyn MermaidEngine> = mermaid.clone();
    let vega_lite_engine: Arc<dyn VegaLiteEngine> = vega_lite.clone();
    let registry = Arc::new(LibraryRegistry::with_loaders(
        GatedLoader::failing(mermaid_engine, 1),
        GatedLoader::immediate(vega_lite_engine),
    ));
    let harness = Harness::with_registry(mermaid, vega_lite, registry);
    let mut renderer = harness.mermaid_renderer();

    renderer.update(FLOWCHART, Theme::Light);
    settle().await;
    assert_eq!(
        harness.events.errors(),
        vec!["Failed to load Mermaid library: network unreachable".to_owned()]
    );
    assert!(harness.mermaid.calls().is_empty());

    renderer.update("graph LR\n  X-->Y", Theme::Light);
    settle().await;
    assert!(renderer.phase().artifact().is_some());
    assert_eq!(harness.registry.load_count(DiagramKind::Mermaid), 2);
}

fn harness_with_failing_mermaid_load() -> Harness {
    let mermaid = Arc::new(ScriptedMermaid::default());
    let vega_lite = Arc::new(ScriptedVegaLite::default());
    let mermaid_engine: Arc<dyn MermaidEngine> = mermaid.clone();
    let vega_lite_engine: Arc<dyn VegaLiteEngine> = vega_lite.clone();
    let registry = Arc::new(LibraryRegistry::with_loaders(
        GatedLoader::failing(mermaid_engine, 1),
        GatedLoader::immediate(vega_lite_engine),
    ));
    Harness::with_registry(mermaid, vega_lite, registry)
}

#[tokio::test]
async fn failed_renderer_recovers_when_another_consumer_loads_the_engine() {
    let harness = harness_with_failing_mermaid_load();
    let mut failed = harness.mermaid_renderer();
    failed.update(FLOWCHART, Theme::Light);
    settle().await;
    assert!(failed.phase().is_load_failure());

    let mut later = harness.mermaid_renderer();
    later.update("graph LR\n  X-->Y", Theme::Light);
    settle().await;
    settle().await;

    assert!(later.phase().artifact().is_some());
    assert!(failed.phase().artifact().is_some());
    assert_eq!(harness.registry.load_count(DiagramKind::Mermaid), 2);
    assert_eq!(harness.events.successes(), 2);
    assert_eq!(harness.events.errors().len(), 1);
}

#[tokio::test]
async fn identical_input_retries_after_load_failure() {
    let harness = harness_with_failing_mermaid_load();
    let mut renderer = harness.mermaid_renderer();
    renderer.update(FLOWCHART, Theme::Light);
    settle().await;
    assert!(renderer.phase().is_load_failure());

    renderer.update(FLOWCHART, Theme::Light);
    settle().await;

    assert!(renderer.phase().artifact().is_some());
    assert_eq!(harness.registry.load_count(DiagramKind::Mermaid), 2);
}

#[tokio::test]
async fn retry_reruns_only_failed_attempts() {
    let harness = harness_with_failing_mermaid_load();
    let mut renderer = harness.mermaid_renderer();
    renderer.update(FLOWCHART, Theme::Light);
    settle().await;

    renderer.retry();
    settle().await;
    assert!(renderer.phase().artifact().is_some());

    renderer.retry();
    settle().await;
    assert_eq!(harness.mermaid.calls().len(), 1);
    assert_eq!(harness.events.successes(), 1);
}

#[test]
fn update_without_runtime_fails_instead_of_panicking() {
    let harness = Harness::new();
    let mut renderer = harness.mermaid_renderer();

    let phase = renderer.update(FLOWCHART, Theme::Light);

    assert!(matches!(
        phase,
        RenderPhase::Failed(RenderError::LibraryLoad { .. })
    ));
    assert_eq!(harness.events.errors().len(), 1);
}

#[tokio::test]
async fn chart_without_mark_is_rejected_before_embedding() {
    let harness = Harness::new();
    let mut renderer = harness.chart_renderer();

    renderer.update(r#"{"data":{"values":[{"x":1}]}}"#, Theme::Light);
    settle().await;

    let errors = harness.events.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("missing required mark or composition property"));
    assert!(harness.vega_lite.calls().is_empty());
    match renderer.display() {
        DisplayState::Error(block) => assert!(block.to_html().contains("Show raw JSON")),
        other => panic!("expected error display, got {other:?}"),
    }
}

#[tokio::test]
async fn chart_with_oversized_dataset_is_rejected() {
    let harness = Harness::new();
    let mut renderer = harness.chart_renderer();
    let rows: Vec<Value> = (0..5_001).map(|i| json!({ "x": i, "y": i })).collect();

    renderer.update(&chart(Value::Array(rows)), Theme::Light);
    settle().await;

    let errors = harness.events.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("too large"));
    assert!(harness.vega_lite.calls().is_empty());
}

#[tokio::test]
async fn chart_is_sanitized_and_themed_before_embedding() {
    let harness = Harness::new();
    let mut renderer = harness
        .chart_renderer()
        .with_probe(Arc::new(FixedColorScheme(true)));
    let content = json!({
        "mark": "line",
        "data": { "url": "https://example.com/secret.json", "values": [{ "x": 1, "y": 2 }] },
        "usermeta": { "embedOptions": {} }
    })
    .to_string();

    renderer.update(&content, Theme::Auto);
    settle().await;

    let calls = harness.vega_lite.calls();
    assert_eq!(calls.len(), 1);
    let (spec, options) = &calls[0];
    assert!(spec["data"].get("url").is_none());
    assert!(spec.get("usermeta").is_none());
    assert_eq!(spec["config"]["background"], DARK_PALETTE.background);
    assert_eq!(spec["autosize"]["type"], "fit");
    assert!(options.tooltip);
    assert!(!options.actions);

    let phase = renderer.phase();
    let artifact = phase.artifact().expect("chart rendered");
    assert_eq!(artifact.label(), "Vega-Lite chart");
    assert_eq!(artifact.spec(), Some(spec));
    assert!(artifact.markup().contains("aria-labelledby"));
    assert_eq!(harness.events.successes(), 1);
}

#[tokio::test]
async fn canvas_chart_is_wrapped_with_accessible_label() {
    let harness = Harness::new();
    harness.vega_lite.push(Script::Ready(Ok(ChartView {
        markup: "<canvas></canvas>".to_owned(),
        surface: ChartSurface::Canvas,
    })));
    let mut renderer = harness.chart_renderer().with_alt("Weekly \"volume\"");

    renderer.update(&chart(json!([{ "x": "a", "y": 1 }])), Theme::Light);
    settle().await;

    let phase = renderer.phase();
    let artifact = phase.artifact().expect("chart rendered");
    assert_eq!(artifact.surface(), ChartSurface::Canvas);
    assert!(artifact
        .markup()
        .starts_with(r#"<div role="img" aria-label="Weekly &quot;volume&quot;""#));
    assert_eq!(artifact.title_id(), None);
    assert_eq!(artifact.data_uri(), None);
}

#[tokio::test(start_paused = true)]
async fn chart_engine_that_never_resolves_times_out() {
    let harness = Harness::new();
    harness.vega_lite.push(Script::Never);
    let mut renderer = harness.chart_renderer();

    renderer.update(&chart(json!([])), Theme::Light);
    tokio::time::sleep(Duration::from_secs(11)).await;
    settle().await;

    assert_eq!(harness.events.errors(), vec!["Vega-Lite rendering timeout".to_owned()]);
    match renderer.display() {
        DisplayState::Error(block) => assert_eq!(block.header(), "Chart Error:"),
        other => panic!("expected error display, got {other:?}"),
    }
}

#[tokio::test]
async fn simultaneously_mounted_diagrams_share_one_engine_load() {
    let mermaid = Arc::new(ScriptedMermaid::default());
    let mermaid_engine: Arc<dyn MermaidEngine> = mermaid.clone();
    let vega_lite_engine: Arc<dyn VegaLiteEngine> = Arc::new(ScriptedVegaLite::default());
    let loader = GatedLoader::gated(mermaid_engine);
    let registry = Arc::new(LibraryRegistry::with_loaders(
        loader.clone(),
        GatedLoader::immediate(vega_lite_engine),
    ));
    let harness = Harness::with_registry(mermaid, Arc::new(ScriptedVegaLite::default()), registry);
    let mut states = harness.registry.subscribe(DiagramKind::Mermaid);

    let mut first = harness.mermaid_renderer();
    let mut second = harness.mermaid_renderer();
    first.update("graph TD\n  A-->B", Theme::Light);
    second.update("graph LR\n  C-->D", Theme::Light);
    settle().await;

    assert_eq!(*states.borrow_and_update(), crate::registry::LibraryState::Loading);
    assert!(matches!(first.display(), DisplayState::Loading { .. }));

    loader.open();
    settle().await;

    assert_eq!(loader.calls(), 1);
    assert_eq!(harness.registry.load_count(DiagramKind::Mermaid), 1);
    assert!(first.phase().artifact().is_some());
    assert!(second.phase().artifact().is_some());
    assert_eq!(harness.events.successes(), 2);
}
