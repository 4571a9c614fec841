// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Rendering boundary and rendered artifacts.
//!
//! The diagramming engine itself lives outside this crate behind [`DiagramRenderer`]. What comes
//! back is either plain text or a vector document that [`svg::VectorDiagram`] validates and
//! decomposes for client-side interaction.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::model::{Layout, OutputFormat};

pub mod svg;

pub use svg::{StructuralError, SvgElement, SvgNode, VectorDiagram};

/// Raw output of a renderer, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutput {
    Vector(Vec<u8>),
    Text(String),
}

/// Opaque renderer failure. Its message is passed on, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RendererError {
    message: String,
}

impl RendererError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait DiagramRenderer: Send + Sync {
    fn render<'a>(
        &'a self,
        description: &'a str,
        layout: Layout,
        format: OutputFormat,
    ) -> BoxFuture<'a, Result<RenderOutput, RendererError>>;
}

/// Plain-text fallback: hands back the graph description itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl DiagramRenderer for TextRenderer {
    fn render<'a>(
        &'a self,
        description: &'a str,
        _layout: Layout,
        _format: OutputFormat,
    ) -> BoxFuture<'a, Result<RenderOutput, RendererError>> {
        Box::pin(async move { Ok(RenderOutput::Text(description.to_owned())) })
    }
}

/// Failure of one pass through the render pipeline. Cloned to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("renderer failed: {0}")]
    Renderer(#[from] RendererError),
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error("render task failed: {0}")]
    Internal(String),
}

/// A finished, cacheable diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedDiagram {
    Text(String),
    Vector(VectorDiagram),
}

impl RenderedDiagram {
    pub fn kind(&self) -> RenderedKind {
        match self {
            Self::Text(_) => RenderedKind::Text,
            Self::Vector(_) => RenderedKind::Vector,
        }
    }

    pub fn content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Vector(diagram) => diagram.to_svg_string(),
        }
    }

    pub fn as_vector(&self) -> Option<&VectorDiagram> {
        match self {
            Self::Vector(diagram) => Some(diagram),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Vector(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderedKind {
    Text,
    Vector,
}

#[derive(Serialize)]
struct WireOut<'a> {
    #[serde(rename = "type")]
    kind: RenderedKind,
    content: &'a str,
}

#[derive(Deserialize)]
struct WireIn {
    #[serde(rename = "type")]
    kind: RenderedKind,
    content: String,
}

impl Serialize for RenderedDiagram {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let content = self.content();
        WireOut {
            kind: self.kind(),
            content: &content,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RenderedDiagram {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = WireIn::deserialize(deserializer)?;
        match wire.kind {
            RenderedKind::Text => Ok(Self::Text(wire.content)),
            RenderedKind::Vector => VectorDiagram::ingest(wire.content.as_bytes())
                .map(Self::Vector)
                .map_err(serde::de::Error::custom),
        }
    }
}
