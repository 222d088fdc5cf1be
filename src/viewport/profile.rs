// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Device-dependent presentation of the viewport.

use std::fmt;

use crate::config::RenderSettings;
use crate::model::DeviceClass;

pub const DESKTOP_CONTAINER_HEIGHT_PX: u32 = 500;
pub const MOBILE_CONTAINER_HEIGHT_VH: u32 = 70;
pub const DESKTOP_BUTTON_SIZE_PX: u32 = 32;
pub const MOBILE_BUTTON_SIZE_PX: u32 = 44;

pub const GESTURE_HINT: &str = "Pinch to zoom, drag to pan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerHeight {
    Px(u32),
    /// Percentage of the visual viewport height.
    Vh(u32),
}

impl fmt::Display for ContainerHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Vh(vh) => write!(f, "{vh}vh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub device: DeviceClass,
    pub container_height: ContainerHeight,
    pub button_size_px: u32,
    pub show_hint: bool,
    pub max_zoom: f64,
}

impl DeviceProfile {
    pub fn for_class(device: DeviceClass) -> Self {
        Self::with_settings(device, &RenderSettings::default())
    }

    pub fn with_settings(device: DeviceClass, settings: &RenderSettings) -> Self {
        match device {
            DeviceClass::Desktop => Self {
                device,
                container_height: ContainerHeight::Px(DESKTOP_CONTAINER_HEIGHT_PX),
                button_size_px: DESKTOP_BUTTON_SIZE_PX,
                show_hint: false,
                max_zoom: settings.max_zoom_for(device),
            },
            DeviceClass::Mobile => Self {
                device,
                container_height: ContainerHeight::Vh(MOBILE_CONTAINER_HEIGHT_VH),
                button_size_px: MOBILE_BUTTON_SIZE_PX,
                show_hint: true,
                max_zoom: settings.max_zoom_for(device),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    ZoomIn,
    ZoomOut,
    FitToContainer,
    Reset,
}

impl ControlAction {
    pub const ALL: [Self; 4] = [Self::ZoomIn, Self::ZoomOut, Self::FitToContainer, Self::Reset];

    pub fn label(self) -> &'static str {
        match self {
            Self::ZoomIn => "Zoom in",
            Self::ZoomOut => "Zoom out",
            Self::FitToContainer => "Fit to container",
            Self::Reset => "Reset zoom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlButton {
    pub action: ControlAction,
    pub label: &'static str,
    pub size_px: u32,
}

/// The rendered control strip: four buttons, the zoom readout, and the optional hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSurface {
    pub buttons: [ControlButton; 4],
    pub zoom_readout: String,
    pub hint: Option<&'static str>,
}

impl ControlSurface {
    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="vizport-controls" role="toolbar" aria-label="Zoom controls">"#);
        for button in &self.buttons {
            html.push_str(&format!(
                r#"<button type="button" aria-label="{label}" title="{label}" style="width: {size}px; height: {size}px;">{label}</button>"#,
                label = button.label,
                size = button.size_px,
            ));
        }
        html.push_str(&format!(
            r#"<span class="vizport-zoom" aria-live="polite">{}</span>"#,
            self.zoom_readout
        ));
        if let Some(hint) = self.hint {
            html.push_str(&format!(r#"<p class="vizport-hint">{hint}</p>"#));
        }
        html.push_str("</div>");
        html
    }
}
