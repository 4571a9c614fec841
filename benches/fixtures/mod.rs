// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

// Deterministic synthetic ontologies (no RNG).

use twinview::model::{
    ContentInfo, Entity, EntityId, EntityKind, EntityModel, InterfaceInfo, ViewState,
};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    LargeDeepExtends,
}

#[derive(Debug, Clone, Copy)]
pub struct OntologyParams {
    pub interfaces: usize,
    pub properties_per_interface: usize,
    pub relationships_per_interface: usize,
    /// Every interface extends the one `extends_stride` before it (0 = no inheritance).
    pub extends_stride: usize,
}

fn id(value: String) -> EntityId {
    EntityId::new(value).expect("bench entity id")
}

fn interface_id(idx: usize) -> EntityId {
    id(format!("dtmi:bench:Iface{idx:04};1"))
}

pub fn ontology(params: OntologyParams) -> EntityModel {
    let mut entities = Vec::new();

    for idx in 0..params.interfaces {
        let owner = interface_id(idx);
        let extends = if params.extends_stride > 0 && idx >= params.extends_stride {
            vec![interface_id(idx - params.extends_stride)]
        } else {
            Vec::new()
        };
        entities.push(
            Entity::new(
                owner.clone(),
                EntityKind::Interface(InterfaceInfo {
                    extends,
                    ..InterfaceInfo::default()
                }),
            )
            .with_display_name("en", format!("Equipment Container {idx}")),
        );

        for prop in 0..params.properties_per_interface {
            entities.push(
                Entity::new(
                    id(format!("dtmi:bench:Iface{idx:04}:prop{prop};1")),
                    EntityKind::Property(ContentInfo {
                        name: format!("measurement{prop}"),
                        child_of: owner.clone(),
                        schema: None,
                        writable: prop % 2 == 0,
                    }),
                )
                .with_defined_in(owner.clone()),
            );
        }

        for rel in 0..params.relationships_per_interface {
            let target = (idx + rel + 1) % params.interfaces;
            entities.push(Entity::relationship(
                id(format!("dtmi:bench:Iface{idx:04}:rel{rel};1")),
                format!("feeds{rel}"),
                owner.clone(),
                Some(interface_id(target)),
            ));
        }
    }

    EntityModel::new(entities)
}

pub fn fixture(case: Case) -> EntityModel {
    ontology(match case {
        Case::Small => OntologyParams {
            interfaces: 20,
            properties_per_interface: 4,
            relationships_per_interface: 1,
            extends_stride: 0,
        },
        Case::Medium => OntologyParams {
            interfaces: 200,
            properties_per_interface: 8,
            relationships_per_interface: 2,
            extends_stride: 10,
        },
        Case::LargeDeepExtends => OntologyParams {
            interfaces: 1000,
            properties_per_interface: 6,
            relationships_per_interface: 3,
            extends_stride: 1,
        },
    })
}

/// Every tenth interface expanded, optionally with a search term.
pub fn view_state(model: &EntityModel, search: Option<&str>) -> ViewState {
    ViewState {
        expanded_ids: model
            .interfaces()
            .step_by(10)
            .map(|entity| entity.id().clone())
            .collect(),
        search: search.map(str::to_owned),
        ..ViewState::default()
    }
}
