// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Artifact, RenderCallbacks, RenderError, RenderPhase};

/// Generation-tagged render state for one renderer instance.
///
/// Every new attempt bumps the generation; results carrying an older generation are dropped.
/// A generation reaches a terminal phase at most once.
#[derive(Debug)]
pub(crate) struct AttemptTracker {
    state: Mutex<AttemptState>,
}

#[derive(Debug)]
struct AttemptState {
    generation: u64,
    phase: RenderPhase,
    mounted: bool,
}

impl Default for AttemptTracker {
    fn default() -> Self {
        Self {
            state: Mutex::new(AttemptState {
                generation: 0,
                phase: RenderPhase::Empty,
                mounted: true,
            }),
        }
    }
}

impl AttemptTracker {
    /// Supersedes whatever attempt is in flight and returns the new generation.
    pub(crate) fn begin(&self, phase: RenderPhase) -> u64 {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.phase = phase;
        state.generation
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let state = self.lock();
        state.mounted && state.generation == generation
    }

    /// Moves a live attempt to a non-terminal phase. Returns `false` if the attempt is stale.
    pub(crate) fn advance(&self, generation: u64, phase: RenderPhase) -> bool {
        debug_assert!(!phase.is_terminal());
        let mut state = self.lock();
        if !state.mounted || state.generation != generation || state.phase.is_terminal() {
            return false;
        }
        state.phase = phase;
        true
    }

    /// Records the outcome of `generation` and fires the matching callback.
    ///
    /// Returns `false` (and fires nothing) when the attempt was superseded, unmounted, or has
    /// already resolved.
    pub(crate) fn finish(
        &self,
        generation: u64,
        outcome: Result<Artifact, RenderError>,
        callbacks: &RenderCallbacks,
    ) -> bool {
        let resolved = {
            let mut state = self.lock();
            if !state.mounted || state.generation != generation || state.phase.is_terminal() {
                return false;
            }
            state.phase = match outcome {
                Ok(artifact) => RenderPhase::Success(Arc::new(artifact)),
                Err(err) => RenderPhase::Failed(err),
            };
            state.phase.clone()
        };

        match &resolved {
            RenderPhase::Success(artifact) => callbacks.success(artifact),
            RenderPhase::Failed(err) => callbacks.error(&err.to_string()),
            _ => {}
        }
        true
    }

    /// Puts a generation that failed to load its engine back into `Loading`.
    ///
    /// Returns `false` when the generation is stale, unmounted, or did not fail on load.
    pub(crate) fn reopen(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if !state.mounted || state.generation != generation || !state.phase.is_load_failure() {
            return false;
        }
        state.phase = RenderPhase::Loading;
        true
    }

    pub(crate) fn phase(&self) -> RenderPhase {
        self.lock().phase.clone()
    }

    pub(crate) fn unmount(&self) {
        let mut state = self.lock();
        state.mounted = false;
        state.generation = state.generation.wrapping_add(1);
    }

    fn lock(&self) -> MutexGuard<'_, AttemptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
