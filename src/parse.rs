// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! DTDL parser boundary.
//!
//! Parsing and resolving DTDL text happens outside this crate. A [`DtdlParser`] turns uploaded
//! sources into a [`ParsedModel`] or fails with a [`ParseError`] whose detail is passed through
//! to the caller untouched.

use std::fmt;

use serde::Serialize;

use crate::model::{EntityModel, ErrorCounts, ModelError, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseErrorKind {
    /// The sources are not well-formed.
    Parsing,
    /// The sources are well-formed but reference things that do not resolve.
    Resolution,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing => f.write_str("parsing"),
            Self::Resolution => f.write_str("resolution"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind} error: {detail}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub detail: serde_json::Value,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, detail: serde_json::Value) -> Self {
        Self { kind, detail }
    }
}

/// What a parser hands back: the model, the sources the navigation tree mirrors and the
/// diagnostics reported against each of them.
#[derive(Debug, Clone, Default)]
pub struct ParsedModel {
    pub model: EntityModel,
    pub sources: Vec<SourceFile>,
    pub error_counts: ErrorCounts,
}

impl ParsedModel {
    pub fn new(model: EntityModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceFile>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_error_counts(mut self, error_counts: ErrorCounts) -> Self {
        self.error_counts = error_counts;
        self
    }
}

pub trait DtdlParser: Send + Sync {
    fn parse(&self, files: &[SourceFile]) -> Result<ParsedModel, ParseError>;
}

/// Reads the object model JSON the DTDL parser emits (already resolved).
///
/// The upload holds exactly one object model file, optionally next to the DTDL sources it was
/// resolved from. Those sources become the navigation tree; a source declaring an `@id` the
/// model does not contain gets one diagnostic per such id. Without sources the object model
/// file itself is mirrored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectModelParser;

impl DtdlParser for ObjectModelParser {
    fn parse(&self, files: &[SourceFile]) -> Result<ParsedModel, ParseError> {
        let (object_models, sources): (Vec<_>, Vec<_>) = if files.len() == 1 {
            (files.iter().collect(), Vec::new())
        } else {
            files.iter().partition(|file| file.is_object_model())
        };
        let [file] = object_models.as_slice() else {
            return Err(ParseError::new(
                ParseErrorKind::Parsing,
                serde_json::json!({
                    "message": "expected exactly one object model file",
                    "files": files.len(),
                    "objectModels": object_models.len(),
                }),
            ));
        };

        let model = EntityModel::from_object_model_json(&file.contents).map_err(|err| {
            let kind = match err {
                ModelError::Json(_) => ParseErrorKind::Parsing,
                ModelError::KeyMismatch { .. } | ModelError::Entity(_) => {
                    ParseErrorKind::Resolution
                }
            };
            tracing::debug!(path = %file.path, %kind, error = %err, "object model rejected");
            ParseError::new(
                kind,
                serde_json::json!({ "file": file.path, "message": err.to_string() }),
            )
        })?;

        if sources.is_empty() {
            return Ok(ParsedModel::new(model).with_sources(vec![(*file).clone()]));
        }

        let mut error_counts = ErrorCounts::new();
        for source in &sources {
            let unresolved = source
                .declared_ids()
                .unwrap_or_default()
                .iter()
                .filter(|id| !model.contains(id.as_str()))
                .count();
            if unresolved > 0 {
                tracing::debug!(path = %source.path, unresolved, "source declares unknown ids");
                error_counts.insert(source.path.clone(), unresolved);
            }
        }

        Ok(ParsedModel::new(model)
            .with_sources(sources.into_iter().cloned().collect())
            .with_error_counts(error_counts))
    }
}
