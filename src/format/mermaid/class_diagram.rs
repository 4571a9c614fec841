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
use crate::model::{Entity, EntityKind, EntityModel};
use crate::query::VisibleGraph;

/// Member line of a class body; names are reduced to label-safe characters.
fn member_line(entity: &Entity) -> Option<String> {
    let name = entity
        .name()?
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect::<String>();
    let line = match entity.kind() {
        EntityKind::Property(info) => match &info.schema {
            Some(schema) => format!("+{name} : {}", schema.local_name()),
            None => format!("+{name}"),
        },
        EntityKind::Telemetry(_) => format!("+{name} : telemetry"),
        EntityKind::Command(_) => format!("+{name}()"),
        EntityKind::Component(info) => match &info.schema {
            Some(schema) => format!("+{name} : {}", schema.local_name()),
            None => format!("+{name} : component"),
        },
        EntityKind::Interface(_) | EntityKind::Relationship(_) | EntityKind::Schema { .. } => {
            return None
        }
    };
    Some(line)
}

/// Writes a `classDiagram` description: one class per interface, content as members.
///
/// Edge order: relationships (`-->`), then inheritance (`<|--`).
pub fn describe_class_diagram(model: &EntityModel, graph: &VisibleGraph) -> GraphDescription {
    let mut builder = DescriptionBuilder::default();
    builder.out.push_str("classDiagram\n");

    for node_id in &graph.nodes {
        let Some(entity) = model.get(node_id.as_str()) else {
            continue;
        };
        let ident = builder.ident(node_id);
        let label = escape_label(entity.label());

        let members = graph
            .contents
            .get(node_id)
            .into_iter()
            .flatten()
            .filter_map(|content_id| model.get(content_id.as_str()))
            .filter_map(member_line)
            .collect::<Vec<_>>();

        if members.is_empty() {
            builder.line(&format!("class {ident}[\"{label}\"]"));
        } else {
            builder.line(&format!("class {ident}[\"{label}\"] {{"));
            for member in members {
                builder.line(&format!("  {member}"));
            }
            builder.line("}");
        }
    }

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
                    builder.line(&format!("class {ident}[\"{}\"]", escape_label(shown)));
                    builder.line(&format!("<<unresolved>> {ident}"));
                }
                ident
            }
        };
        let label = label
            .chars()
            .filter(|ch| !matches!(ch, ':' | '"' | '<' | '>' | '\n' | '\r'))
            .collect::<String>();
        builder.line(&format!("{from} --> {to} : {label}"));
        builder.edges.push(DescribedEdge::Relationship {
            id: relationship_id.clone(),
        });
    }

    for (child, parent) in visible_extends(model, graph) {
        let from = builder.ident(&parent);
        let to = builder.ident(&child);
        builder.line(&format!("{from} <|-- {to}"));
        builder.edges.push(DescribedEdge::Extends { child, parent });
    }

    let hits = graph
        .search_hits
        .iter()
        .filter_map(|id| builder.node_ids.get(id).cloned())
        .collect::<Vec<_>>();
    if !hits.is_empty() {
        builder.line(&format!("cssClass \"{}\" search", hits.join(",")));
    }
    if let Some(ident) = graph.highlighted.as_ref().and_then(|id| builder.node_ids.get(id)) {
        let ident = ident.clone();
        builder.line(&format!("cssClass \"{ident}\" highlight"));
    }

    builder.finish(graph)
}

#[cfg(test)]
mod tests {
    use super::describe_class_diagram;
    use crate::format::mermaid::DescribedEdge;
    use crate::model::fixtures::{content_model, dangling_model, eid, inheritance_model};
    use crate::model::{DiagramType, EntityModel, ViewState};
    use crate::query::{compute_visible_graph, SearchIndex, VisibleGraph, DEFAULT_THRESHOLD};

    fn class_graph(model: &EntityModel, expanded: &[&str]) -> VisibleGraph {
        let state = ViewState {
            diagram_type: DiagramType::ClassDiagram,
            expanded_ids: expanded.iter().map(|value| eid(value)).collect(),
            ..ViewState::default()
        };
        compute_visible_graph(model, &SearchIndex::build(model, DEFAULT_THRESHOLD), &state)
    }

    #[test]
    fn expanded_interfaces_list_members() {
        let model = content_model();
        let description = describe_class_diagram(&model, &class_graph(&model, &["pump"]));

        assert!(description.text.starts_with("classDiagram\n"));
        assert!(description.text.contains("  class pump[\"Pump\"] {\n    +flow : telemetry\n    +speed\n    +stop()\n  }\n"));
        assert!(description.text.contains("  class tank[\"Tank\"]\n"));
        assert!(description.text.contains("  pump --> tank : feeds\n"));
        assert_eq!(description.edges, vec![DescribedEdge::Relationship { id: eid("pump_feeds") }]);
    }

    #[test]
    fn inheritance_uses_class_arrows() {
        let model = inheritance_model();
        let description = describe_class_diagram(&model, &class_graph(&model, &[]));

        assert!(description.text.contains("  parent <|-- child\n"));
        assert!(description.text.contains("  grandparent <|-- parent\n"));
        assert_eq!(description.edges.len(), 3);
    }

    #[test]
    fn dangling_targets_get_placeholder_classes() {
        let model = dangling_model();
        let description = describe_class_diagram(&model, &class_graph(&model, &[]));

        assert!(description.text.contains("  class unresolved_invalid[\"invalid\"]\n"));
        assert!(description.text.contains("  first --> unresolved_invalid : broken\n"));
    }
}
