// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MermaidIdentError {
    #[error("must not be empty")]
    Empty,
    #[error("must not start with a digit")]
    LeadingDigit,
    #[error("is a reserved word")]
    Reserved,
    #[error("contains invalid character: '{ch}'")]
    InvalidChar { ch: char },
}

const RESERVED: &[&str] = &[
    "end", "graph", "flowchart", "subgraph", "class", "classdef", "style", "linkstyle", "click",
    "default", "direction", "call", "href", "namespace",
];

pub(super) fn validate_mermaid_ident(ident: &str) -> Result<(), MermaidIdentError> {
    let Some(first) = ident.chars().next() else {
        return Err(MermaidIdentError::Empty);
    };
    if first.is_ascii_digit() {
        return Err(MermaidIdentError::LeadingDigit);
    }
    if let Some(ch) = ident.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(MermaidIdentError::InvalidChar { ch });
    }
    if RESERVED.contains(&ident.to_ascii_lowercase().as_str()) {
        return Err(MermaidIdentError::Reserved);
    }
    Ok(())
}

/// Hands out unique, renderer-safe identifiers for arbitrary entity ids.
///
/// `dtmi:com:example:Pump;1` becomes `dtmi_com_example_Pump_1`; collisions get a numeric suffix.
#[derive(Debug, Default)]
pub(super) struct IdentAllocator {
    used: BTreeSet<String>,
}

impl IdentAllocator {
    pub(super) fn allocate(&mut self, raw: &str) -> String {
        let mut base = raw
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
            .collect::<String>();
        if matches!(
            validate_mermaid_ident(&base),
            Err(MermaidIdentError::Empty | MermaidIdentError::LeadingDigit | MermaidIdentError::Reserved)
        ) {
            base.insert_str(0, "n_");
        }

        let mut candidate = base.clone();
        let mut suffix = 2usize;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        debug_assert!(validate_mermaid_ident(&candidate).is_ok());
        candidate
    }
}

/// Escapes text for a quoted Mermaid label so it cannot terminate the label or inject markup.
pub(super) fn escape_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("#quot;"),
            '<' => out.push_str("#lt;"),
            '>' => out.push_str("#gt;"),
            '&' => out.push_str("#amp;"),
            '#' => out.push_str("#35;"),
            '\n' | '\r' | '\t' => out.push(' '),
            ch if ch.is_control() => {}
            ch => out.push(ch),
        }
    }
    out
}
