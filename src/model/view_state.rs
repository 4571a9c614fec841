// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! User-controlled view parameters and their validation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::entity_model::EntityModel;
use super::ids::EntityId;

pub const MAX_SEARCH_LEN: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "dagre-d3")]
    DagreD3,
    #[serde(rename = "elk")]
    Elk,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DagreD3 => "dagre-d3",
            Self::Elk => "elk",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dagre-d3" | "dagre" => Ok(Self::DagreD3),
            "elk" => Ok(Self::Elk),
            other => Err(ValidationError::UnknownValue {
                field: "layout",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramType {
    #[default]
    #[serde(rename = "flowchart")]
    Flowchart,
    #[serde(rename = "classDiagram")]
    ClassDiagram,
}

impl DiagramType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::ClassDiagram => "classDiagram",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flowchart" => Ok(Self::Flowchart),
            "classDiagram" | "class" => Ok(Self::ClassDiagram),
            other => Err(ValidationError::UnknownValue {
                field: "diagramType",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Svg => f.write_str("svg"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Pan/zoom of the diagram canvas. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationTab {
    #[default]
    Details,
    Tree,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPanel {
    pub open: bool,
    pub tab: NavigationTab,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },
    #[error("{field} is too long ({len} > {max} characters)")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{field} contains a disallowed character {ch:?}")]
    DisallowedChar { field: &'static str, ch: char },
    #[error("return url must be a site-relative path: {0}")]
    InvalidReturnUrl(String),
    #[error("viewport zoom must be a positive finite number")]
    InvalidZoom,
}

/// The parameters that decide what subset of a model is rendered, and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub layout: Layout,
    pub diagram_type: DiagramType,
    pub search: Option<String>,
    #[serde(deserialize_with = "deserialize_id_permissive")]
    pub highlight_node_id: Option<EntityId>,
    /// Duplicates are permitted; order carries no meaning. Invalid ids are dropped on read.
    #[serde(deserialize_with = "deserialize_ids_permissive")]
    pub expanded_ids: Vec<EntityId>,
    pub return_url: Option<String>,
    pub edit_mode: bool,
    pub viewport: Viewport,
    pub navigation: NavigationPanel,
}

impl ViewState {
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded_ids.iter().any(|expanded| expanded.as_str() == id)
    }

    pub fn expanded_set(&self) -> BTreeSet<&EntityId> {
        self.expanded_ids.iter().collect()
    }

    pub fn expand(&mut self, id: EntityId) {
        if !self.is_expanded(id.as_str()) {
            self.expanded_ids.push(id);
        }
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded_ids.retain(|expanded| expanded.as_str() != id);
    }

    pub fn toggle(&mut self, id: EntityId) {
        if self.is_expanded(id.as_str()) {
            self.collapse(id.as_str());
        } else {
            self.expanded_ids.push(id);
        }
    }

    /// Trimmed, non-empty search term.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|term| !term.is_empty())
    }

    /// Unions the owner chain of `id` into the expanded ids so that `id` becomes visible.
    pub fn reveal(&mut self, model: &EntityModel, id: &str) {
        for owner in model.owner_chain(id) {
            self.expand(owner);
        }
    }

    /// Expands matched interfaces and the owners of matched content.
    pub fn expand_to_matches<'a>(
        &mut self,
        model: &EntityModel,
        matches: impl IntoIterator<Item = &'a EntityId>,
    ) {
        for id in matches {
            if model.is_interface(id.as_str()) {
                self.expand(id.clone());
            } else {
                self.reveal(model, id.as_str());
            }
        }
    }

    /// Applies a validated fragment. Nothing is changed when validation fails.
    pub fn apply(&mut self, update: ViewStateUpdate) -> Result<(), ValidationError> {
        update.validate()?;

        if let Some(layout) = update.layout {
            self.layout = layout;
        }
        if let Some(diagram_type) = update.diagram_type {
            self.diagram_type = diagram_type;
        }
        if let Some(search) = update.search {
            let trimmed = search.trim();
            self.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        }
        if let Some(highlight) = update.highlight_node_id {
            self.highlight_node_id = EntityId::new(highlight).ok();
        }
        if let Some(expanded_ids) = update.expanded_ids {
            self.expanded_ids = parse_ids_permissive(expanded_ids);
        }
        for id in parse_ids_permissive(update.expand) {
            self.expand(id);
        }
        for id in update.collapse {
            self.collapse(&id);
        }
        if let Some(return_url) = update.return_url {
            self.return_url = (!return_url.is_empty()).then_some(return_url);
        }
        if let Some(edit_mode) = update.edit_mode {
            self.edit_mode = edit_mode;
        }
        if let Some(viewport) = update.viewport {
            self.viewport = viewport;
        }
        if let Some(navigation) = update.navigation {
            self.navigation = navigation;
        }

        Ok(())
    }
}

/// A fragment of [`ViewState`] as sent by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewStateUpdate {
    pub layout: Option<Layout>,
    pub diagram_type: Option<DiagramType>,
    /// An empty string clears the search.
    pub search: Option<String>,
    pub highlight_node_id: Option<String>,
    /// Replaces the expanded ids. Invalid ids are dropped.
    pub expanded_ids: Option<Vec<String>>,
    pub expand: Vec<String>,
    pub collapse: Vec<String>,
    /// An empty string clears the return url.
    pub return_url: Option<String>,
    pub edit_mode: Option<bool>,
    pub viewport: Option<Viewport>,
    pub navigation: Option<NavigationPanel>,
}

impl ViewStateUpdate {
    /// Strict checks for user-supplied text that is echoed into markup; id lists are not checked
    /// here because invalid ids are ignored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(search) = &self.search {
            validate_search(search)?;
        }
        if let Some(return_url) = &self.return_url {
            if !return_url.is_empty() {
                validate_return_url(return_url)?;
            }
        }
        if let Some(viewport) = &self.viewport {
            if !viewport.zoom.is_finite() || viewport.zoom <= 0.0 {
                return Err(ValidationError::InvalidZoom);
            }
        }
        Ok(())
    }
}

fn parse_ids_permissive(raw: Vec<String>) -> Vec<EntityId> {
    raw.into_iter()
        .filter_map(|value| EntityId::new(value.trim().to_owned()).ok())
        .collect()
}

fn deserialize_ids_permissive<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<EntityId>, D::Error> {
    Vec::<String>::deserialize(deserializer).map(parse_ids_permissive)
}

fn deserialize_id_permissive<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EntityId>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| EntityId::new(value.trim().to_owned()).ok()))
}

fn is_markup_char(ch: char) -> bool {
    matches!(ch, '<' | '>') || ch.is_control()
}

pub fn validate_search(search: &str) -> Result<(), ValidationError> {
    let len = search.chars().count();
    if len > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search",
            len,
            max: MAX_SEARCH_LEN,
        });
    }
    if let Some(ch) = search.chars().find(|ch| is_markup_char(*ch)) {
        return Err(ValidationError::DisallowedChar {
            field: "search",
            ch,
        });
    }
    Ok(())
}

pub fn validate_return_url(url: &str) -> Result<(), ValidationError> {
    if !url.starts_with('/') || url.starts_with("//") || url.starts_with("/\\") {
        return Err(ValidationError::InvalidReturnUrl(url.to_owned()));
    }
    if url.chars().any(|ch| is_markup_char(ch) || matches!(ch, '"' | '\'' | ' ')) {
        return Err(ValidationError::InvalidReturnUrl(url.to_owned()));
    }
    Ok(())
}
