// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A parsed DTDL model is an immutable [`EntityModel`]; what a user sees of it is decided by a
//! [`ViewState`]. The [`file_tree`] mirrors the uploaded sources for navigation.

pub mod entity;
pub mod entity_model;
pub mod file_tree;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod view_state;

pub use entity::{
    ContentInfo, Entity, EntityError, EntityKind, EntityKindTag, InterfaceInfo, RelationshipInfo,
};
pub use entity_model::{EntityModel, ModelError, ModelVersion};
pub use file_tree::{build_file_tree, has_file_tree_errors, DtdlPath, ErrorCounts, SourceFile};
pub use ids::{EntityId, Id, IdError, ModelId, SessionId, ViewId};
pub use view_state::{
    DiagramType, Layout, NavigationPanel, NavigationTab, OutputFormat, ValidationError, ViewState,
    ViewStateUpdate, Viewport,
};
