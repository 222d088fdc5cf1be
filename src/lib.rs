// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Vizport: diagram detection, lazily loaded Mermaid/Vega-Lite rendering, and pan/zoom
//! viewports for streamed chat messages.
//!
//! The pipeline runs left to right through the modules:
//! [`detect`] finds fenced diagram blocks, [`registry`] loads each engine once per process,
//! [`render`] validates and renders each block under a timeout, [`viewport`] hosts the result,
//! and [`markdown`] ties them together for a whole message.

pub mod config;
pub mod detect;
pub mod engine;
pub mod markdown;
pub mod model;
pub mod registry;
pub mod render;
pub mod viewport;

#[cfg(test)]
mod test_utils;
