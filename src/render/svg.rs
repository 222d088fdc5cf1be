// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Post-processing of engine SVG output for fluid, accessible embedding.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use smol_str::{format_smolstr, SmolStr};

const RESPONSIVE_STYLE: &str = "max-width: 100%; height: auto; display: block;";
const SIZING_PROPERTIES: [&str; 4] = ["width", "height", "max-width", "max-height"];

fn svg_open_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<svg\b([^>]*)>").expect("valid svg open tag regex"))
}

fn managed_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)\s(width|height|style|role|aria-label|aria-labelledby|aria-describedby)\s*=\s*("[^"]*"|'[^']*')"#,
        )
        .expect("valid svg attribute regex")
    })
}

fn view_box_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\sviewBox\s*=").expect("valid viewBox regex"))
}

/// Labels injected into the root `<svg>` element.
#[derive(Debug, Clone, Copy)]
pub struct SvgAccessibility<'a> {
    /// Prefix for the generated `<title>` / `<desc>` ids; must be unique per page.
    pub id_prefix: &'a str,
    pub label: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedSvg {
    pub markup: String,
    pub title_id: SmolStr,
    pub desc_id: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgError {
    MissingRoot,
}

impl fmt::Display for SvgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => f.write_str("engine output contains no <svg> element"),
        }
    }
}

impl std::error::Error for SvgError {}

/// Strips fixed pixel sizing from the root element and links a title/description pair to it.
///
/// When the engine only supplied `width`/`height`, they are preserved as a `viewBox` so the
/// artifact still scales proportionally.
pub fn finalize_svg(svg: &str, a11y: SvgAccessibility<'_>) -> Result<FinalizedSvg, SvgError> {
    let captures = svg_open_tag().captures(svg).ok_or(SvgError::MissingRoot)?;
    let whole = captures.get(0).ok_or(SvgError::MissingRoot)?;
    let raw_attrs = captures.get(1).map(|m| m.as_str()).unwrap_or("");

    let (raw_attrs, self_closing) = match raw_attrs.trim_end().strip_suffix('/') {
        Some(attrs) => (attrs, true),
        None => (raw_attrs, false),
    };

    let mut width = None;
    let mut height = None;
    let mut kept_style = Vec::<String>::new();
    for attr in managed_attr().captures_iter(raw_attrs) {
        let name = attr[1].to_ascii_lowercase();
        let value = attr[2].trim_matches(|c| c == '"' || c == '\'');
        match name.as_str() {
            "width" => width = parse_pixels(value),
            "height" => height = parse_pixels(value),
            "style" => kept_style.extend(non_sizing_declarations(value)),
            _ => {}
        }
    }

    let mut attrs = managed_attr().replace_all(raw_attrs, "").trim_end().to_owned();
    if !view_box_attr().is_match(&attrs) {
        if let (Some(w), Some(h)) = (width, height) {
            attrs.push_str(&format!(r#" viewBox="0 0 {w} {h}""#));
        }
    }

    let title_id = format_smolstr!("{}-title", a11y.id_prefix);
    let desc_id = format_smolstr!("{}-desc", a11y.id_prefix);

    kept_style.push(RESPONSIVE_STYLE.to_owned());
    let style = kept_style.join("; ");

    let mut out = String::with_capacity(svg.len() + 256);
    out.push_str(&svg[..whole.start()]);
    out.push_str("<svg");
    out.push_str(&attrs);
    out.push_str(&format!(
        r#" role="img" aria-labelledby="{} {}" style="{}">"#,
        htmlize::escape_attribute(title_id.as_str()),
        htmlize::escape_attribute(desc_id.as_str()),
        htmlize::escape_attribute(style.as_str()),
    ));
    out.push_str(&format!(
        r#"<title id="{}">{}</title><desc id="{}">{}</desc>"#,
        htmlize::escape_attribute(title_id.as_str()),
        htmlize::escape_text(a11y.label),
        htmlize::escape_attribute(desc_id.as_str()),
        htmlize::escape_text(a11y.description),
    ));
    if self_closing {
        out.push_str("</svg>");
    }
    out.push_str(&svg[whole.end()..]);

    Ok(FinalizedSvg {
        markup: out,
        title_id,
        desc_id,
    })
}

fn parse_pixels(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
    number.trim().parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
}

fn non_sizing_declarations(style: &str) -> impl Iterator<Item = String> + '_ {
    style
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let property = decl.split(':').next().unwrap_or("").trim().to_ascii_lowercase();
            !SIZING_PROPERTIES.contains(&property.as_str())
        })
        .map(str::to_owned)
}
