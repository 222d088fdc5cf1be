// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Translation of raw pointer and touch streams into [`TransformDelta`]s.
//!
//! Every move event is measured against the anchor captured when the gesture started, so a
//! burst of events never accumulates per-event error.

use smallvec::SmallVec;

use super::{TransformDelta, ViewportState};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub const fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

type Touches = SmallVec<[TouchPoint; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Drag {
        origin: Point,
        pan_at_start: Point,
    },
    Pinch {
        initial_distance: f64,
        zoom_at_start: f64,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GestureTracker {
    gesture: Gesture,
    touches: Touches,
}

impl GestureTracker {
    pub(crate) fn is_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    pub(crate) fn mouse_down(&mut self, position: Point, state: ViewportState) {
        self.gesture = drag_from(position, state);
    }

    pub(crate) fn mouse_move(&mut self, position: Point, state: ViewportState) -> Option<TransformDelta> {
        match self.gesture {
            Gesture::Drag {
                origin,
                pan_at_start,
            } => Some(drag_delta(origin, pan_at_start, position, state)),
            _ => None,
        }
    }

    pub(crate) fn mouse_up(&mut self) {
        self.cancel();
    }

    /// `touches` is the full set of active touches after the event.
    pub(crate) fn touch_start(&mut self, touches: &[TouchPoint], state: ViewportState) {
        self.anchor(touches, state);
    }

    pub(crate) fn touch_move(
        &mut self,
        touches: &[TouchPoint],
        state: ViewportState,
    ) -> Option<TransformDelta> {
        if touches.len() != self.touches.len() {
            self.anchor(touches, state);
            return None;
        }
        self.touches = touches.iter().copied().collect();

        match (self.gesture, touches) {
            (
                Gesture::Drag {
                    origin,
                    pan_at_start,
                },
                [touch],
            ) => Some(drag_delta(origin, pan_at_start, touch.position, state)),
            (
                Gesture::Pinch {
                    initial_distance,
                    zoom_at_start,
                },
                [first, second, ..],
            ) => {
                let distance = first.position.distance_to(second.position);
                if initial_distance <= f64::EPSILON {
                    self.anchor(touches, state);
                    return None;
                }
                Some(TransformDelta::zoom_to(zoom_at_start * distance / initial_distance))
            }
            _ => None,
        }
    }

    /// `remaining` is the set of touches still down after the event.
    pub(crate) fn touch_end(&mut self, remaining: &[TouchPoint], state: ViewportState) {
        self.anchor(remaining, state);
    }

    pub(crate) fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
        self.touches.clear();
    }

    fn anchor(&mut self, touches: &[TouchPoint], state: ViewportState) {
        self.touches = touches.iter().copied().collect();
        self.gesture = match touches {
            [] => Gesture::Idle,
            [touch] => drag_from(touch.position, state),
            [first, second, ..] => Gesture::Pinch {
                initial_distance: first.position.distance_to(second.position),
                zoom_at_start: state.zoom,
            },
        };
    }
}

fn drag_from(position: Point, state: ViewportState) -> Gesture {
    Gesture::Drag {
        origin: position,
        pan_at_start: Point::new(state.pan_x, state.pan_y),
    }
}

fn drag_delta(origin: Point, pan_at_start: Point, position: Point, state: ViewportState) -> TransformDelta {
    let target_x = pan_at_start.x + (position.x - origin.x);
    let target_y = pan_at_start.y + (position.y - origin.y);
    TransformDelta::pan(target_x - state.pan_x, target_y - state.pan_y)
}
