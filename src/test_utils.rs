// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Scripted engines and loaders for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{oneshot, Semaphore};

use crate::engine::{ChartView, EmbedOptions, EngineError, EngineLoader, MermaidEngine, VegaLiteEngine};
use crate::render::mermaid::MermaidConfig;

pub(crate) enum Script<T> {
    Ready(Result<T, EngineError>),
    Gated(oneshot::Receiver<Result<T, EngineError>>),
    Never,
}

fn play<T: Send + 'static>(script: Script<T>) -> BoxFuture<'static, Result<T, EngineError>> {
    match script {
        Script::Ready(result) => futures::future::ready(result).boxed(),
        Script::Gated(rx) => async move {
            rx.await
                .unwrap_or_else(|_| Err(EngineError::new("gate dropped")))
        }
        .boxed(),
        Script::Never => futures::future::pending().boxed(),
    }
}

pub(crate) fn svg_for(source: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="320" height="180" style="max-width: 320px;" viewBox="0 0 320 180"><g>{}</g></svg>"#,
        source.len()
    )
}

#[derive(Default)]
pub(crate) struct ScriptedMermaid {
    scripts: Mutex<VecDeque<Script<String>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedMermaid {
    pub(crate) fn push(&self, script: Script<String>) {
        self.scripts.lock().unwrap().push_back(script);
    }

    /// Queues a render that resolves only when the returned sender fires.
    pub(crate) fn push_gated(&self) -> oneshot::Sender<Result<String, EngineError>> {
        let (tx, rx) = oneshot::channel();
        self.push(Script::Gated(rx));
        tx
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl MermaidEngine for ScriptedMermaid {
    fn render(
        &self,
        element_id: &str,
        source: &str,
        _config: &MermaidConfig,
    ) -> BoxFuture<'static, Result<String, EngineError>> {
        self.calls
            .lock()
            .unwrap()
            .push((element_id.to_owned(), source.to_owned()));
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Ready(Ok(svg_for(source))));
        play(script)
    }
}

#[derive(Default)]
pub(crate) struct ScriptedVegaLite {
    scripts: Mutex<VecDeque<Script<ChartView>>>,
    calls: Mutex<Vec<(Value, EmbedOptions)>>,
}

impl ScriptedVegaLite {
    pub(crate) fn push(&self, script: Script<ChartView>) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub(crate) fn calls(&self) -> Vec<(Value, EmbedOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

impl VegaLiteEngine for ScriptedVegaLite {
    fn embed(
        &self,
        spec: &Value,
        options: &EmbedOptions,
    ) -> BoxFuture<'static, Result<ChartView, EngineError>> {
        self.calls
            .lock()
            .unwrap()
            .push((spec.clone(), options.clone()));
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Ready(Ok(ChartView::svg(svg_for("chart")))));
        play(script)
    }
}

/// Loader that counts calls, optionally fails the first `failures` loads, and waits for
/// [`GatedLoader::open`] before resolving when gated.
pub(crate) struct GatedLoader<E: ?Sized> {
    engine: Arc<E>,
    gate: Option<Arc<Semaphore>>,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl<E: ?Sized + Send + Sync + 'static> GatedLoader<E> {
    pub(crate) fn immediate(engine: Arc<E>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            gate: None,
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn gated(engine: Arc<E>) -> Arc<Self> {
        Arc::new(Self {
            engine,
            gate: Some(Arc::new(Semaphore::new(0))),
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn failing(engine: Arc<E>, failures: usize) -> Arc<Self> {
        let loader = Self::immediate(engine);
        loader.failures.store(failures, Ordering::SeqCst);
        loader
    }

    pub(crate) fn open(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: ?Sized + Send + Sync + 'static> EngineLoader<E> for GatedLoader<E> {
    fn load(&self) -> BoxFuture<'static, Result<Arc<E>, EngineError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.clone();
        let engine = Arc::clone(&self.engine);
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        async move {
            if let Some(gate) = gate {
                let _permit = gate.acquire().await;
            }
            if fail {
                Err(EngineError::new("network unreachable"))
            } else {
                Ok(engine)
            }
        }
        .boxed()
    }
}

/// Lets spawned tasks on the current-thread runtime run to their next suspension point.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
