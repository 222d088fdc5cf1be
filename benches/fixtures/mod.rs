// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vizport-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vizport and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

#[derive(Debug, Clone, Copy)]
pub enum Case {
    ProseOnly,
    Mixed,
    ManyDiagrams,
    NestedFences,
}

const PARAGRAPH: &str = "The service receives a request, validates the payload, and forwards it to the worker queue. \
Retries back off exponentially and give up after five attempts.\n\n";

const FLOWCHART: &str = "```mermaid\ngraph TD\n  A[Client] --> B{Valid?}\n  B -->|yes| C[Queue]\n  B -->|no| D[Reject]\n```\n\n";

const CHART: &str = "```vega-lite\n{\"mark\":\"bar\",\"data\":{\"values\":[{\"a\":\"x\",\"b\":1},{\"a\":\"y\",\"b\":2}]},\"encoding\":{\"x\":{\"field\":\"a\"},\"y\":{\"field\":\"b\",\"type\":\"quantitative\"}}}\n```\n\n";

const RUST_BLOCK: &str = "```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n\n";

const NESTED: &str = "````markdown\nExample:\n```mermaid\ngraph LR\n  X-->Y\n```\n````\n\n";

pub fn message(case: Case) -> String {
    let mut text = String::new();
    match case {
        Case::ProseOnly => {
            for _ in 0..200 {
                text.push_str(PARAGRAPH);
            }
        }
        Case::Mixed => {
            for i in 0..40 {
                text.push_str(PARAGRAPH);
                match i % 4 {
                    0 => text.push_str(FLOWCHART),
                    1 => text.push_str(RUST_BLOCK),
                    2 => text.push_str(CHART),
                    _ => {}
                }
            }
        }
        Case::ManyDiagrams => {
            for i in 0..200 {
                text.push_str(if i % 2 == 0 { FLOWCHART } else { CHART });
            }
        }
        Case::NestedFences => {
            for _ in 0..100 {
                text.push_str(NESTED);
                text.push_str(FLOWCHART);
            }
        }
    }
    text
}
