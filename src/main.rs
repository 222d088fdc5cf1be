// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Vizport CLI entrypoint.
//!
//! Reads a markdown message from a file (or stdin), detects the diagrams in it, and prints one
//! JSON line per diagram with its span and either the engine input it would be rendered with or
//! the error block a viewer would see.

use std::error::Error;
use std::io::Read;

use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vizport::config::RenderSettings;
use vizport::detect::detect_diagrams;
use vizport::model::{DeviceClass, DiagramDescriptor, DiagramKind, EnvColorScheme, ResolvedTheme, Theme};
use vizport::render::{mermaid_config, prepare_chart_spec, ErrorBlock, RenderError};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<file>] [--theme <light|dark|auto>] [--mobile]\n\nReads markdown from <file>, or stdin when omitted, and prints one JSON line per diagram.\n--theme auto follows VIZPORT_COLOR_SCHEME. RUST_LOG controls diagnostics on stderr."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    file: Option<String>,
    theme: Option<Theme>,
    mobile: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--theme" => {
                if options.theme.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let theme: Theme = raw.parse().map_err(|_| ())?;
                options.theme = Some(theme);
            }
            "--mobile" => {
                if options.mobile {
                    return Err(());
                }
                options.mobile = true;
            }
            "-" if options.file.is_none() => {}
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.file.is_some() {
                    return Err(());
                }
                options.file = Some(arg);
            }
        }
    }

    Ok(options)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn describe(
    index: usize,
    descriptor: &DiagramDescriptor,
    theme: ResolvedTheme,
    device: DeviceClass,
    settings: &RenderSettings,
) -> Result<Value, serde_json::Error> {
    let span = descriptor.span();
    let mut line = json!({
        "index": index,
        "kind": descriptor.kind().fence_tag(),
        "span": { "start": span.start, "end": span.end },
        "theme": theme.as_str(),
    });

    let outcome = match descriptor.kind() {
        DiagramKind::Mermaid => serde_json::to_value(mermaid_config(theme, device)).map(Ok)?,
        DiagramKind::VegaLite => {
            prepare_chart_spec(descriptor.content(), theme, settings.max_inline_records)
                .map_err(|err| RenderError::validation(DiagramKind::VegaLite, err))
        }
    };

    match outcome {
        Ok(input) => line["input"] = input,
        Err(err) => {
            tracing::warn!(index, kind = %descriptor.kind(), error = %err, "diagram rejected");
            line["error"] = Value::String(
                ErrorBlock::new(descriptor.kind(), err.to_string(), descriptor.content()).to_text(),
            );
        }
    }
    Ok(line)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "vizport".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();
        let settings = RenderSettings::from_env()?;

        let text = match &options.file {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                text
            }
        };

        let theme = options.theme.unwrap_or_default().resolve(&EnvColorScheme);
        let device = if options.mobile {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        };

        let report = detect_diagrams(&text);
        tracing::debug!(
            mermaid = report.counts().mermaid,
            vega_lite = report.counts().vega_lite,
            "diagrams detected"
        );
        for (index, descriptor) in report.descriptors().iter().enumerate() {
            let line = describe(index, descriptor, theme, device, &settings)?;
            println!("{line}");
        }

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("vizport: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{describe, parse_options, CliOptions};
    use vizport::config::RenderSettings;
    use vizport::model::{DeviceClass, DiagramDescriptor, DiagramKind, ResolvedTheme, SourceSpan, Theme};

    #[test]
    fn parses_empty_args() {
        let options = parse_options(std::iter::empty()).expect("parse options");
        assert_eq!(options, CliOptions::default());
    }

    #[test]
    fn parses_file_theme_and_mobile() {
        let options = parse_options(
            ["notes.md".to_owned(), "--theme".to_owned(), "Dark".to_owned(), "--mobile".to_owned()]
                .into_iter(),
        )
        .expect("parse options");
        assert_eq!(options.file.as_deref(), Some("notes.md"));
        assert_eq!(options.theme, Some(Theme::Dark));
        assert!(options.mobile);
    }

    #[test]
    fn dash_reads_stdin() {
        let options = parse_options(["-".to_owned()].into_iter()).expect("parse options");
        assert_eq!(options.file, None);
    }

    #[test]
    fn rejects_unknown_theme() {
        parse_options(["--theme".to_owned(), "sepia".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_missing_theme_value() {
        parse_options(["--theme".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn rejects_duplicates_and_unknown_flags() {
        parse_options(["--mobile".to_owned(), "--mobile".to_owned()].into_iter()).unwrap_err();
        parse_options(["a.md".to_owned(), "b.md".to_owned()].into_iter()).unwrap_err();
        parse_options(["--nope".to_owned()].into_iter()).unwrap_err();
    }

    #[test]
    fn describes_mermaid_with_engine_config() {
        let descriptor =
            DiagramDescriptor::new(DiagramKind::Mermaid, "graph TD\n  A-->B", SourceSpan::new(0, 30));
        let line = describe(
            0,
            &descriptor,
            ResolvedTheme::Dark,
            DeviceClass::Mobile,
            &RenderSettings::default(),
        )
        .expect("describe");

        assert_eq!(line["kind"], "mermaid");
        assert_eq!(line["span"]["end"], 30);
        assert_eq!(line["input"]["securityLevel"], "strict");
        assert!(line.get("error").is_none());
    }

    #[test]
    fn describes_invalid_chart_with_error_block() {
        let descriptor =
            DiagramDescriptor::new(DiagramKind::VegaLite, "{\"data\":{}}", SourceSpan::new(4, 40));
        let line = describe(
            1,
            &descriptor,
            ResolvedTheme::Light,
            DeviceClass::Desktop,
            &RenderSettings::default(),
        )
        .expect("describe");

        let error = line["error"].as_str().expect("error text");
        assert!(error.starts_with("Chart Error:"));
        assert!(error.contains("missing required mark or composition property"));
        assert!(line.get("input").is_none());
    }
}
