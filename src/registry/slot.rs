// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::watch;

use super::{LibraryState, LoadError};
use crate::engine::{EngineError, EngineLoader};
use crate::model::DiagramKind;

struct SlotInner<E: ?Sized> {
    loader: Option<Arc<dyn EngineLoader<E>>>,
    engine: Option<Arc<E>>,
}

/// Shared load state for a single engine kind.
///
/// State transitions happen under `inner`, so at most one load is in flight no matter how many
/// consumers call [`EngineSlot::load_engine`] concurrently.
pub struct EngineSlot<E: ?Sized> {
    kind: DiagramKind,
    inner: Mutex<SlotInner<E>>,
    state_tx: watch::Sender<LibraryState>,
    load_count: AtomicUsize,
}

impl<E: ?Sized + Send + Sync + 'static> fmt::Debug for EngineSlot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSlot")
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("load_count", &self.load_count())
            .finish()
    }
}

impl<E: ?Sized + Send + Sync + 'static> EngineSlot<E> {
    pub(crate) fn new(kind: DiagramKind) -> Self {
        let (state_tx, _) = watch::channel(LibraryState::Idle);
        Self {
            kind,
            inner: Mutex::new(SlotInner {
                loader: None,
                engine: None,
            }),
            state_tx,
            load_count: AtomicUsize::new(0),
        }
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn state(&self) -> LibraryState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LibraryState> {
        self.state_tx.subscribe()
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::Relaxed)
    }

    pub fn set_loader(&self, loader: Arc<dyn EngineLoader<E>>) {
        self.lock().loader = Some(loader);
    }

    /// The loaded engine, if any.
    pub fn engine(&self) -> Option<Arc<E>> {
        self.lock().engine.clone()
    }

    /// Starts a load unless one is in flight or already succeeded.
    ///
    /// The load runs on its own task, so it completes even if every caller goes away.
    pub fn load_engine(self: &Arc<Self>) {
        let inner = self.lock();
        let current = self.state();
        if current.is_loading() || current.is_loaded() {
            return;
        }

        let Some(loader) = inner.loader.clone() else {
            let message = format!("no loader installed for the {} engine", self.kind);
            tracing::warn!(kind = %self.kind, "{message}");
            self.state_tx.send_replace(LibraryState::Error(message));
            return;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            let message = "no async runtime available to load the engine".to_owned();
            tracing::warn!(kind = %self.kind, "{message}");
            self.state_tx.send_replace(LibraryState::Error(message));
            return;
        };

        let attempt = self.load_count.fetch_add(1, Ordering::Relaxed) + 1;
        if current.error().is_some() {
            tracing::debug!(kind = %self.kind, attempt, "retrying engine load");
        } else {
            tracing::debug!(kind = %self.kind, attempt, "loading engine");
        }
        self.state_tx.send_replace(LibraryState::Loading);
        drop(inner);

        let slot = Arc::clone(self);
        handle.spawn(async move {
            let result = match AssertUnwindSafe(loader.load()).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(EngineError::new("engine loader panicked")),
            };
            slot.finish_load(result);
        });
    }

    /// Waits for the engine, starting (or retrying) a load if needed.
    pub async fn acquire(self: &Arc<Self>) -> Result<Arc<E>, LoadError> {
        let mut state_rx = self.subscribe();
        self.load_engine();

        loop {
            let state = state_rx.borrow_and_update().clone();
            match state {
                LibraryState::Loaded => {
                    return self.engine().ok_or_else(|| {
                        LoadError::new(self.kind, "engine reported loaded but is missing")
                    });
                }
                LibraryState::Error(message) => return Err(LoadError::new(self.kind, message)),
                LibraryState::Idle | LibraryState::Loading => {}
            }

            if state_rx.changed().await.is_err() {
                return Err(LoadError::new(self.kind, "engine registry was dropped"));
            }
        }
    }

    fn finish_load(&self, result: Result<Arc<E>, EngineError>) {
        let mut inner = self.lock();
        match result {
            Ok(engine) => {
                inner.engine = Some(engine);
                tracing::debug!(kind = %self.kind, "engine loaded");
                self.state_tx.send_replace(LibraryState::Loaded);
            }
            Err(err) => {
                inner.engine = None;
                tracing::warn!(kind = %self.kind, error = %err, "engine load failed");
                self.state_tx.send_replace(LibraryState::Error(err.to_string()));
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
