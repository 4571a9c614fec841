// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid-ish graph descriptions of a visible graph.
//!
//! The text is what the renderer boundary consumes. Alongside it we keep the mapping from entity
//! ids to the identifiers used in the text and the order in which edges were emitted, so that
//! rendered node and edge groups can be traced back to entities.

pub mod class_diagram;
pub mod flowchart;
mod ident;

use std::collections::BTreeMap;

use serde::Serialize;

pub use class_diagram::describe_class_diagram;
pub use flowchart::describe_flowchart;
pub use ident::MermaidIdentError;

use crate::model::{DiagramType, EntityId, EntityKind, EntityModel};
use crate::query::VisibleGraph;

use ident::IdentAllocator;

/// What a single emitted edge stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DescribedEdge {
    Relationship { id: EntityId },
    Extends { child: EntityId, parent: EntityId },
    Content { owner: EntityId, content: EntityId },
}

impl DescribedEdge {
    /// The entity an interaction on this edge refers to.
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::Relationship { id } => id,
            Self::Extends { child, .. } => child,
            Self::Content { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDescription {
    pub diagram_type: DiagramType,
    pub text: String,
    /// Entity id → identifier used in `text`.
    pub node_ids: BTreeMap<EntityId, String>,
    /// One entry per edge in `text`, in emission order.
    pub edges: Vec<DescribedEdge>,
    pub search_hits: Vec<String>,
    pub highlighted: Option<String>,
}

impl GraphDescription {
    pub fn entity_for_ident(&self, ident: &str) -> Option<&EntityId> {
        self.node_ids
            .iter()
            .find_map(|(entity_id, candidate)| (candidate == ident).then_some(entity_id))
    }
}

pub fn describe(model: &EntityModel, graph: &VisibleGraph) -> GraphDescription {
    match graph.diagram_type {
        DiagramType::Flowchart => describe_flowchart(model, graph),
        DiagramType::ClassDiagram => describe_class_diagram(model, graph),
    }
}

/// Shared bookkeeping of both writers.
#[derive(Debug, Default)]
struct DescriptionBuilder {
    idents: IdentAllocator,
    node_ids: BTreeMap<EntityId, String>,
    placeholders: BTreeMap<String, String>,
    edges: Vec<DescribedEdge>,
    out: String,
}

impl DescriptionBuilder {
    fn ident(&mut self, entity_id: &EntityId) -> String {
        if let Some(ident) = self.node_ids.get(entity_id) {
            return ident.clone();
        }
        let ident = self.idents.allocate(entity_id.as_str());
        self.node_ids.insert(entity_id.clone(), ident.clone());
        ident
    }

    /// Identifier of the terminal node standing in for an unresolved relationship target.
    ///
    /// Returns `(ident, is_new)`.
    fn placeholder(&mut self, target: &str) -> (String, bool) {
        if let Some(ident) = self.placeholders.get(target) {
            return (ident.clone(), false);
        }
        let ident = self.idents.allocate(&format!("unresolved_{target}"));
        self.placeholders.insert(target.to_owned(), ident.clone());
        (ident, true)
    }

    fn line(&mut self, line: &str) {
        self.out.push_str("  ");
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn finish(self, graph: &VisibleGraph) -> GraphDescription {
        let search_hits = graph
            .search_hits
            .iter()
            .filter_map(|id| self.node_ids.get(id).cloned())
            .collect();
        let highlighted = graph
            .highlighted
            .as_ref()
            .and_then(|id| self.node_ids.get(id).cloned());
        GraphDescription {
            diagram_type: graph.diagram_type,
            text: self.out,
            node_ids: self.node_ids,
            edges: self.edges,
            search_hits,
            highlighted,
        }
    }
}

/// Visible relationships ordered by source, target, then id.
fn ordered_relationships<'m>(
    model: &'m EntityModel,
    graph: &VisibleGraph,
) -> Vec<(&'m EntityId, &'m crate::model::RelationshipInfo, String)> {
    let mut out = graph
        .edges
        .iter()
        .filter_map(|id| {
            let entity = model.get(id.as_str())?;
            let EntityKind::Relationship(info) = entity.kind() else {
                return None;
            };
            let label = entity.display_name().unwrap_or(&info.name).to_owned();
            Some((entity.id(), info, label))
        })
        .collect::<Vec<_>>();
    out.sort_by(|(id_a, info_a, _), (id_b, info_b, _)| {
        info_a
            .child_of
            .cmp(&info_b.child_of)
            .then_with(|| info_a.target.cmp(&info_b.target))
            .then_with(|| id_a.cmp(id_b))
    });
    out
}

/// `extends` pairs between visible interfaces, ordered by child then parent.
fn visible_extends(model: &EntityModel, graph: &VisibleGraph) -> Vec<(EntityId, EntityId)> {
    let mut out = Vec::new();
    for entity in model.interfaces() {
        if !graph.nodes.contains(entity.id()) {
            continue;
        }
        let EntityKind::Interface(info) = entity.kind() else {
            continue;
        };
        for parent in &info.extends {
            if parent != entity.id() && graph.nodes.contains(parent) {
                out.push((entity.id().clone(), parent.clone()));
            }
        }
    }
    out
}
