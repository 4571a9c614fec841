// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::ident::escape_label;
use super::{
    ordered_relationships, visible_extends, DescribedEdge, DescriptionBuilder, GraphDescription,
};
use crate::model::{EntityKind, EntityModel};
use crate::query::VisibleGraph;

pub const SEARCH_HIT_CLASS: &str = "search";
pub const HIGHLIGHT_CLASS: &str = "highlight";
pub const UNRESOLVED_CLASS: &str = "unresolved";

/// Writes a `flowchart` description.
///
/// Interfaces are rectangles, content nodes are stadiums hanging off their owner, unresolved
/// relationship targets are hexagons. Edges are emitted as relationships, then `extends`, then
/// content links; [`GraphDescription::edges`] follows the same order.
pub fn describe_flowchart(model: &EntityModel, graph: &VisibleGraph) -> GraphDescription {
    let mut builder = DescriptionBuilder::default();
    builder.out.push_str("flowchart TD\n");

    for node_id in &graph.nodes {
        let Some(entity) = model.get(node_id.as_str()) else {
            continue;
        };
        let ident = builder.ident(node_id);
        let label = escape_label(entity.label());
        let line = match entity.kind() {
            EntityKind::Interface(_) => format!("{ident}[\"{label}\"]"),
            _ => format!("{ident}([\"{label}\"])"),
        };
        builder.line(&line);
    }

    let mut unresolved = Vec::new();
    for (relationship_id, info, label) in ordered_relationships(model, graph) {
        let from = builder.ident(&info.child_of);
        let to = match &info.target {
            Some(target) if !graph.is_dangling(relationship_id.as_str()) => builder.ident(target),
            target => {
                let missing = target
                    .as_ref()
                    .map_or_else(|| relationship_id.to_string(), ToString::to_string);
                let (ident, is_new) = builder.placeholder(&missing);
                if is_new {
                    let shown = if target.is_some() { missing.as_str() } else { "?" };
                    builder.line(&format!("{ident}{{{{\"{}\"}}}}", escape_label(shown)));
                    unresolved.push(ident.clone());
                }
                ident
            }
        };
        builder.line(&format!("{from} -- \"{}\" --> {to}", escape_label(&label)));
        builder.edges.push(DescribedEdge::Relationship {
            id: relationship_id.clone(),
        });
    }

    for (child, parent) in visible_extends(model, graph) {
        let from = builder.ident(&child);
        let to = builder.ident(&parent);
        builder.line(&format!("{from} -. \"extends\" .-> {to}"));
        builder.edges.push(DescribedEdge::Extends { child, parent });
    }

    for (owner, content) in &graph.contents {
        if !graph.nodes.contains(owner) {
            continue;
        }
        for content_id in content {
            if !graph.nodes.contains(content_id) {
                continue;
            }
            let from = builder.ident(owner);
            let to = builder.ident(content_id);
            builder.line(&format!("{from} --- {to}"));
            builder.edges.push(DescribedEdge::Content {
                owner: owner.clone(),
                content: content_id.clone(),
            });
        }
    }

    let hits = graph
        .search_hits
        .iter()
        .filter(|id| graph.nodes.contains(*id))
        .filter_map(|id| builder.node_ids.get(id).cloned())
        .collect::<Vec<_>>();
    if !hits.is_empty() {
        builder.line(&format!("class {} {SEARCH_HIT_CLASS}", hits.join(",")));
    }
    if let Some(ident) = graph.highlighted.as_ref().and_then(|id| builder.node_ids.get(id)) {
        let ident = ident.clone();
        builder.line(&format!("class {ident} {HIGHLIGHT_CLASS}"));
    }
    if !unresolved.is_empty() {
        builder.line(&format!("class {} {UNRESOLVED_CLASS}", unresolved.join(",")));
    }

    builder.finish(graph)
}
