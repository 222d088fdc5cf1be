// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data types shared by detection, rendering, and the viewport.

pub mod diagram;
pub mod theme;

pub use diagram::{DiagramDescriptor, DiagramKind, SourceSpan};
pub use theme::{
    ColorSchemeProbe, DeviceClass, EnvColorScheme, FixedColorScheme, Palette, ParseThemeError,
    ResolvedTheme, Theme, COLOR_SCHEME_ENV, DARK_PALETTE, LIGHT_PALETTE,
};
