// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tunable defaults for rendering and the viewport.
//!
//! The numbers here are observed behavior rather than hard constraints, so hosts may override the
//! render timeout and inline dataset bound through the environment.

use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::model::DeviceClass;

pub const RENDER_TIMEOUT_ENV: &str = "VIZPORT_RENDER_TIMEOUT_MS";
pub const MAX_INLINE_RECORDS_ENV: &str = "VIZPORT_MAX_INLINE_RECORDS";

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_INLINE_RECORDS: usize = 5_000;
pub const DEFAULT_ZOOM_IN_FACTOR: f64 = 1.1;
pub const DEFAULT_ZOOM_OUT_FACTOR: f64 = 0.9;
pub const DEFAULT_MIN_ZOOM: f64 = 0.5;
pub const DEFAULT_DESKTOP_MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_MOBILE_MAX_ZOOM: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub render_timeout: Duration,
    pub max_inline_records: usize,
    pub zoom_in_factor: f64,
    pub zoom_out_factor: f64,
    pub min_zoom: f64,
    pub desktop_max_zoom: f64,
    pub mobile_max_zoom: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            max_inline_records: DEFAULT_MAX_INLINE_RECORDS,
            zoom_in_factor: DEFAULT_ZOOM_IN_FACTOR,
            zoom_out_factor: DEFAULT_ZOOM_OUT_FACTOR,
            min_zoom: DEFAULT_MIN_ZOOM,
            desktop_max_zoom: DEFAULT_DESKTOP_MAX_ZOOM,
            mobile_max_zoom: DEFAULT_MOBILE_MAX_ZOOM,
        }
    }
}

impl RenderSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
                name: name.to_owned(),
                value: "<non-unicode>".to_owned(),
            }),
        })
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Result<Option<String>, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(millis) = parse_positive(RENDER_TIMEOUT_ENV, lookup(RENDER_TIMEOUT_ENV)?)? {
            settings.render_timeout = Duration::from_millis(millis as u64);
        }
        if let Some(records) =
            parse_positive(MAX_INLINE_RECORDS_ENV, lookup(MAX_INLINE_RECORDS_ENV)?)?
        {
            settings.max_inline_records = records;
        }

        Ok(settings)
    }

    pub fn max_zoom_for(&self, device: DeviceClass) -> f64 {
        match device {
            DeviceClass::Desktop => self.desktop_max_zoom,
            DeviceClass::Mobile => self.mobile_max_zoom,
        }
    }
}

fn parse_positive(name: &str, raw: Option<String>) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<usize>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_owned(),
            value: format!("{trimmed} (expected a positive integer)"),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidEnv { name: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnv { name, value } => write!(f, "invalid env {name}={value}"),
        }
    }
}

impl Error for ConfigError {}
