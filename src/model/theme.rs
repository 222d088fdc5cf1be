// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Theme requested by the host. `Auto` defers to the system color-scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }

    pub fn resolve(self, probe: &dyn ColorSchemeProbe) -> ResolvedTheme {
        match self {
            Self::Light => ResolvedTheme::Light,
            Self::Dark => ResolvedTheme::Dark,
            Self::Auto => {
                if probe.prefers_dark() {
                    ResolvedTheme::Dark
                } else {
                    ResolvedTheme::Light
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseThemeError {
    value: String,
}

impl fmt::Display for ParseThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown theme {:?} (expected light, dark, or auto)", self.value)
    }
}

impl std::error::Error for ParseThemeError {}

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("light") {
            Ok(Self::Light)
        } else if trimmed.eq_ignore_ascii_case("dark") {
            Ok(Self::Dark)
        } else if trimmed.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Err(ParseThemeError {
                value: s.to_owned(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn palette(self) -> &'static Palette {
        match self {
            Self::Light => &LIGHT_PALETTE,
            Self::Dark => &DARK_PALETTE,
        }
    }
}

/// System color-scheme preference, consulted only for [`Theme::Auto`].
pub trait ColorSchemeProbe: Send + Sync {
    fn prefers_dark(&self) -> bool;
}

/// Fixed answer, mostly useful for hosts that already know the preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedColorScheme(pub bool);

impl ColorSchemeProbe for FixedColorScheme {
    fn prefers_dark(&self) -> bool {
        self.0
    }
}

/// Reads `VIZPORT_COLOR_SCHEME` (`dark` / `light`); anything else means light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvColorScheme;

pub const COLOR_SCHEME_ENV: &str = "VIZPORT_COLOR_SCHEME";

impl ColorSchemeProbe for EnvColorScheme {
    fn prefers_dark(&self) -> bool {
        env::var(COLOR_SCHEME_ENV)
            .map(|value| value.trim().eq_ignore_ascii_case("dark"))
            .unwrap_or(false)
    }
}

/// Device class of the hosting viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    pub const MOBILE_BREAKPOINT_PX: u32 = 768;

    pub fn from_viewport_width(width_px: u32) -> Self {
        if width_px < Self::MOBILE_BREAKPOINT_PX {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// Color roles shared by both renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub primary: &'static str,
    pub primary_text: &'static str,
    pub primary_border: &'static str,
    pub secondary: &'static str,
    pub tertiary: &'static str,
    pub line: &'static str,
    pub text: &'static str,
    pub muted_text: &'static str,
    pub grid: &'static str,
}

pub const LIGHT_PALETTE: Palette = Palette {
    background: "#ffffff",
    primary: "#e0e7ff",
    primary_text: "#1e1b4b",
    primary_border: "#6366f1",
    secondary: "#f1f5f9",
    tertiary: "#fef3c7",
    line: "#475569",
    text: "#0f172a",
    muted_text: "#475569",
    grid: "#e2e8f0",
};

pub const DARK_PALETTE: Palette = Palette {
    background: "#0f172a",
    primary: "#312e81",
    primary_text: "#e0e7ff",
    primary_border: "#818cf8",
    secondary: "#1e293b",
    tertiary: "#422006",
    line: "#94a3b8",
    text: "#f1f5f9",
    muted_text: "#cbd5e1",
    grid: "#334155",
};

#[cfg(test)]
mod tests {
    use super::{DeviceClass, FixedColorScheme, ResolvedTheme, Theme};

    #[test]
    fn auto_theme_follows_probe() {
        assert_eq!(Theme::Auto.resolve(&FixedColorScheme(true)), ResolvedTheme::Dark);
        assert_eq!(Theme::Auto.resolve(&FixedColorScheme(false)), ResolvedTheme::Light);
        assert_eq!(Theme::Light.resolve(&FixedColorScheme(true)), ResolvedTheme::Light);
        assert_eq!(Theme::Dark.resolve(&FixedColorScheme(false)), ResolvedTheme::Dark);
    }

    #[test]
    fn theme_parses_known_names() {
        assert_eq!(" Dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("auto".parse::<Theme>(), Ok(Theme::Auto));
        let err = "sepia".parse::<Theme>().unwrap_err();
        assert!(err.to_string().contains("sepia"));
    }

    #[test]
    fn device_class_uses_breakpoint() {
        assert_eq!(DeviceClass::from_viewport_width(375), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_viewport_width(767), DeviceClass::Mobile);
        assert_eq!(DeviceClass::from_viewport_width(768), DeviceClass::Desktop);
    }

    #[test]
    fn palettes_differ_per_theme() {
        assert_ne!(
            ResolvedTheme::Light.palette().background,
            ResolvedTheme::Dark.palette().background
        );
    }
}
