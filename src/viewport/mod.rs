// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Pan/zoom viewport hosting a rendered artifact.
//!
//! Wheel, mouse, touch, and the explicit controls all reduce to a [`TransformDelta`]; only
//! [`Viewport::apply`] mutates [`ViewportState`], and it clamps zoom as it does so.

use std::fmt;

use crate::config::{RenderSettings, DEFAULT_MIN_ZOOM};
use crate::model::DeviceClass;

pub mod gesture;
pub mod profile;


use gesture::GestureTracker;

pub use gesture::{Point, Size, TouchPoint};
pub use profile::{
    ContainerHeight, ControlAction, ControlButton, ControlSurface, DeviceProfile, GESTURE_HINT,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomChange {
    Keep,
    /// Multiply the current zoom.
    By(f64),
    /// Set zoom to an absolute value.
    To(f64),
}

/// Normalized input for [`Viewport::apply`].
///
/// With an `anchor`, the content point under it stays put while zooming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformDelta {
    pub zoom: ZoomChange,
    pub pan_x: f64,
    pub pan_y: f64,
    pub anchor: Option<Point>,
}

impl TransformDelta {
    pub fn pan(dx: f64, dy: f64) -> Self {
        Self {
            zoom: ZoomChange::Keep,
            pan_x: dx,
            pan_y: dy,
            anchor: None,
        }
    }

    pub fn scale_by(factor: f64) -> Self {
        Self {
            zoom: ZoomChange::By(factor),
            ..Self::pan(0.0, 0.0)
        }
    }

    pub fn zoom_to(zoom: f64) -> Self {
        Self {
            zoom: ZoomChange::To(zoom),
            ..Self::pan(0.0, 0.0)
        }
    }

    pub fn with_pan(mut self, dx: f64, dy: f64) -> Self {
        self.pan_x = dx;
        self.pan_y = dy;
        self
    }

    pub fn anchored_at(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// Construction-time props of a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub enable_zoom_pan: bool,
    pub enable_touch_gestures: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub initial_zoom: f64,
    pub device: DeviceClass,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::for_device(DeviceClass::Desktop)
    }
}

impl ViewportConfig {
    pub fn for_device(device: DeviceClass) -> Self {
        Self::with_settings(device, &RenderSettings::default())
    }

    pub fn with_settings(device: DeviceClass, settings: &RenderSettings) -> Self {
        Self {
            enable_zoom_pan: true,
            enable_touch_gestures: true,
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom_for(device),
            initial_zoom: 1.0,
            device,
        }
    }

    /// Bounds made usable: positive finite minimum, `max >= min`, initial zoom inside them.
    fn normalized(mut self) -> Self {
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            self.min_zoom = DEFAULT_MIN_ZOOM;
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            self.max_zoom = self.min_zoom.max(self.max_zoom_fallback());
        }
        if !self.initial_zoom.is_finite() {
            self.initial_zoom = 1.0;
        }
        self.initial_zoom = self.initial_zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }

    fn max_zoom_fallback(&self) -> f64 {
        DeviceProfile::for_class(self.device).max_zoom
    }
}

type ZoomCallback = Box<dyn FnMut(f64) + Send>;

pub struct Viewport {
    config: ViewportConfig,
    profile: DeviceProfile,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
    state: ViewportState,
    gestures: GestureTracker,
    measured: Option<(Size, Size)>,
    on_zoom_change: Option<ZoomCallback>,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("measured", &self.measured)
            .finish_non_exhaustive()
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self::with_settings(config, &RenderSettings::default())
    }

    pub fn with_settings(config: ViewportConfig, settings: &RenderSettings) -> Self {
        let config = config.normalized();
        Self {
            profile: DeviceProfile::with_settings(config.device, settings),
            zoom_in_factor: settings.zoom_in_factor,
            zoom_out_factor: settings.zoom_out_factor,
            state: ViewportState {
                zoom: config.initial_zoom,
                ..ViewportState::default()
            },
            gestures: GestureTracker::default(),
            measured: None,
            on_zoom_change: None,
            config,
        }
    }

    pub fn on_zoom_change(mut self, f: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_zoom_change = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// CSS transform for the content layer; pair with `transform-origin: 0 0`.
    pub fn transform_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.state.pan_x, self.state.pan_y, self.state.zoom
        )
    }

    pub fn zoom_percent(&self) -> String {
        format!("{}%", (self.state.zoom * 100.0).round())
    }

    /// The single mutation point. Returns whether the state changed.
    pub fn apply(&mut self, delta: TransformDelta) -> bool {
        let previous = self.state;
        let target = match delta.zoom {
            ZoomChange::Keep => previous.zoom,
            ZoomChange::By(factor) => previous.zoom * factor,
            ZoomChange::To(zoom) => zoom,
        };
        if !(target.is_finite() && delta.pan_x.is_finite() && delta.pan_y.is_finite()) {
            return false;
        }

        let zoom = target.clamp(self.config.min_zoom, self.config.max_zoom);
        let mut pan_x = previous.pan_x + delta.pan_x;
        let mut pan_y = previous.pan_y + delta.pan_y;
        if let Some(anchor) = delta.anchor {
            let ratio = zoom / previous.zoom;
            pan_x = anchor.x - (anchor.x - pan_x) * ratio;
            pan_y = anchor.y - (anchor.y - pan_y) * ratio;
        }

        self.state = ViewportState { zoom, pan_x, pan_y };
        if zoom != previous.zoom {
            if let Some(callback) = self.on_zoom_change.as_mut() {
                callback(zoom);
            }
        }
        self.state != previous
    }

    /// Wheel tick: negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        if !self.config.enable_zoom_pan || delta_y == 0.0 || !delta_y.is_finite() {
            return false;
        }
        let factor = if delta_y < 0.0 {
            self.zoom_in_factor
        } else {
            self.zoom_out_factor
        };
        self.apply(TransformDelta::scale_by(factor))
    }

    pub fn mouse_down(&mut self, position: Point) {
        if self.config.enable_zoom_pan {
            self.gestures.mouse_down(position, self.state);
        }
    }

    pub fn mouse_move(&mut self, position: Point) -> bool {
        if !self.config.enable_zoom_pan {
            return false;
        }
        match self.gestures.mouse_move(position, self.state) {
            Some(delta) => self.apply(delta),
            None => false,
        }
    }

    pub fn mouse_up(&mut self) {
        self.gestures.mouse_up();
    }

    /// `touches` is every touch currently down, as reported by the event.
    pub fn touch_start(&mut self, touches: &[TouchPoint]) {
        if self.config.enable_touch_gestures {
            self.gestures.touch_start(touches, self.state);
        }
    }

    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> bool {
        if !self.config.enable_touch_gestures {
            return false;
        }
        match self.gestures.touch_move(touches, self.state) {
            Some(delta) => self.apply(delta),
            None => false,
        }
    }

    pub fn touch_end(&mut self, remaining: &[TouchPoint]) {
        if self.config.enable_touch_gestures {
            self.gestures.touch_end(remaining, self.state);
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gestures.is_active()
    }

    pub fn zoom_in(&mut self) -> bool {
        self.perform(ControlAction::ZoomIn)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.perform(ControlAction::ZoomOut)
    }

    /// Records the container and artifact sizes used by fit-to-container.
    pub fn measure(&mut self, container: Size, content: Size) {
        self.measured = Some((container, content));
    }

    /// Fits `content` (its natural size at zoom 1) inside `container` and centers it.
    pub fn fit_to_container(&mut self, container: Size, content: Size) -> bool {
        self.measure(container, content);
        self.perform(ControlAction::FitToContainer)
    }

    pub fn reset(&mut self) -> bool {
        self.perform(ControlAction::Reset)
    }

    pub fn perform(&mut self, action: ControlAction) -> bool {
        if !self.config.enable_zoom_pan {
            return false;
        }
        self.gestures.cancel();
        match action {
            ControlAction::ZoomIn => self.apply(TransformDelta::scale_by(self.zoom_in_factor)),
            ControlAction::ZoomOut => self.apply(TransformDelta::scale_by(self.zoom_out_factor)),
            ControlAction::FitToContainer => {
                let Some((container, content)) = self.measured else {
                    return false;
                };
                if container.is_empty() || content.is_empty() {
                    return false;
                }
                let zoom = (container.width / content.width)
                    .min(container.height / content.height)
                    .clamp(self.config.min_zoom, self.config.max_zoom);
                let pan_x = (container.width - content.width * zoom) / 2.0;
                let pan_y = (container.height - content.height * zoom) / 2.0;
                self.apply(
                    TransformDelta::zoom_to(zoom)
                        .with_pan(pan_x - self.state.pan_x, pan_y - self.state.pan_y),
                )
            }
            ControlAction::Reset => self.apply(
                TransformDelta::zoom_to(self.config.initial_zoom)
                    .with_pan(-self.state.pan_x, -self.state.pan_y),
            ),
        }
    }

    /// The control strip, or `None` when zoom/pan is disabled.
    pub fn controls(&self) -> Option<ControlSurface> {
        if !self.config.enable_zoom_pan {
            return None;
        }
        let size_px = self.profile.button_size_px;
        Some(ControlSurface {
            buttons: ControlAction::ALL.map(|action| ControlButton {
                action,
                label: action.label(),
                size_px,
            }),
            zoom_readout: self.zoom_percent(),
            hint: self.instruction_hint(),
        })
    }

    /// Gesture instructions, shown on mobile when touch gestures are enabled.
    pub fn instruction_hint(&self) -> Option<&'static str> {
        (self.profile.show_hint && self.config.enable_touch_gestures).then_some(GESTURE_HINT)
    }

    pub fn container_style(&self) -> String {
        format!(
            "position: relative; overflow: hidden; height: {}; touch-action: {};",
            self.profile.container_height,
            if self.config.enable_touch_gestures {
                "none"
            } else {
                "auto"
            }
        )
    }
}
