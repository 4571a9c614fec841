// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Visible subgraph of a model for a given view state.
//!
//! Pure and synchronous: the same model, index and state always produce the same graph.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::search::SearchIndex;
use crate::model::{
    DiagramType, DtdlPath, EntityId, EntityKind, EntityModel, ViewState,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleGraph {
    pub diagram_type: DiagramType,
    /// Interfaces, plus (flowchart only) the content of expanded interfaces.
    pub nodes: BTreeSet<EntityId>,
    /// Visible relationship ids, dangling ones included.
    pub edges: BTreeSet<EntityId>,
    /// Relationships whose target is missing or does not resolve.
    pub dangling_edges: BTreeSet<EntityId>,
    /// Expanded interface → flattened non-relationship content, own content first.
    pub contents: BTreeMap<EntityId, Vec<EntityId>>,
    /// Search matches that are visible nodes or edges.
    pub search_hits: BTreeSet<EntityId>,
    /// The highlighted node, only when it is visible.
    pub highlighted: Option<EntityId>,
}

impl VisibleGraph {
    pub fn is_dangling(&self, relationship_id: &str) -> bool {
        self.dangling_edges.contains(relationship_id)
    }

    pub fn is_search_hit(&self, id: &str) -> bool {
        self.search_hits.contains(id)
    }
}

/// What the presentation layer receives for one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView<'a> {
    #[serde(flatten)]
    pub graph: VisibleGraph,
    pub file_tree: Cow<'a, [DtdlPath]>,
}

impl GraphView<'_> {
    pub fn into_owned(self) -> GraphView<'static> {
        GraphView {
            graph: self.graph,
            file_tree: Cow::Owned(self.file_tree.into_owned()),
        }
    }
}

pub fn compute_visible_graph(
    model: &EntityModel,
    index: &SearchIndex,
    state: &ViewState,
) -> VisibleGraph {
    let mut graph = VisibleGraph {
        diagram_type: state.diagram_type,
        ..VisibleGraph::default()
    };

    graph.nodes = model.interfaces().map(|entity| entity.id().clone()).collect();

    for expanded in state.expanded_set() {
        if !model.is_interface(expanded.as_str()) {
            continue;
        }

        let content = model
            .flattened_content(expanded)
            .into_iter()
            .filter(|entity| !matches!(entity.kind(), EntityKind::Relationship(_)))
            .map(|entity| entity.id().clone())
            .collect::<Vec<_>>();

        if state.diagram_type == DiagramType::Flowchart {
            graph.nodes.extend(content.iter().cloned());
        }
        graph.contents.insert(expanded.clone(), content);
    }

    for relationship in model.relationships() {
        let EntityKind::Relationship(info) = relationship.kind() else {
            continue;
        };
        if !graph.nodes.contains(&info.child_of) {
            continue;
        }

        match &info.target {
            Some(target) if model.contains(target.as_str()) => {
                if graph.nodes.contains(target) {
                    graph.edges.insert(relationship.id().clone());
                }
            }
            _ => {
                graph.edges.insert(relationship.id().clone());
                graph.dangling_edges.insert(relationship.id().clone());
            }
        }
    }

    if let Some(term) = state.search_term() {
        graph.search_hits = index
            .filter(term)
            .into_iter()
            .filter(|id| graph.nodes.contains(id) || graph.edges.contains(id))
            .collect();
    }

    if let Some(highlight) = &state.highlight_node_id {
        if graph.nodes.contains(highlight) {
            graph.highlighted = Some(highlight.clone());
        } else {
            tracing::debug!(node = %highlight, "highlighted node is not visible");
        }
    }

    graph
}

pub fn compute_graph_view<'a>(
    model: &EntityModel,
    index: &SearchIndex,
    file_tree: &'a [DtdlPath],
    state: &ViewState,
) -> GraphView<'a> {
    GraphView {
        graph: compute_visible_graph(model, index, state),
        file_tree: Cow::Borrowed(file_tree),
    }
}
