// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::entity::{ContentInfo, Entity, EntityKind, InterfaceInfo};
use super::entity_model::EntityModel;
use super::ids::EntityId;

pub(crate) fn eid(value: &str) -> EntityId {
    EntityId::new(value).expect("entity id")
}

fn content(name: &str, owner: &str) -> ContentInfo {
    ContentInfo {
        name: name.to_owned(),
        child_of: eid(owner),
        schema: None,
        writable: false,
    }
}

pub(crate) fn property(id: &str, name: &str, owner: &str) -> Entity {
    Entity::new(eid(id), EntityKind::Property(content(name, owner))).with_defined_in(eid(owner))
}

pub(crate) fn telemetry(id: &str, name: &str, owner: &str) -> Entity {
    Entity::new(eid(id), EntityKind::Telemetry(content(name, owner))).with_defined_in(eid(owner))
}

pub(crate) fn command(id: &str, name: &str, owner: &str) -> Entity {
    Entity::new(eid(id), EntityKind::Command(content(name, owner))).with_defined_in(eid(owner))
}

pub(crate) fn relationship(id: &str, name: &str, owner: &str, target: Option<&str>) -> Entity {
    Entity::relationship(eid(id), name, eid(owner), target.map(eid))
}

pub(crate) fn interface_extending(id: &str, extends: &[&str]) -> Entity {
    Entity::new(
        eid(id),
        EntityKind::Interface(InterfaceInfo {
            extends: extends.iter().map(|value| eid(value)).collect(),
            ..InterfaceInfo::default()
        }),
    )
}

/// `first`, `second`, `third` with `relFirstSecond` (ChildOf=second, target=first).
pub(crate) fn three_interfaces_model() -> EntityModel {
    EntityModel::new([
        Entity::interface(eid("first")),
        Entity::interface(eid("second")),
        Entity::interface(eid("third")),
        relationship("relFirstSecond", "relFirstSecond", "second", Some("first")),
    ])
}

pub(crate) fn dangling_model() -> EntityModel {
    EntityModel::new([
        Entity::interface(eid("first")),
        Entity::interface(eid("second")),
        relationship("relDangling", "broken", "first", Some("invalid")),
        relationship("relUntargeted", "anything", "second", None),
    ])
}

pub(crate) fn cyclic_extends_model() -> EntityModel {
    EntityModel::new([interface_extending("a", &["b"]), interface_extending("b", &["a"])])
}

/// `child` extends `parent` extends `grandparent`, each with one piece of content.
pub(crate) fn inheritance_model() -> EntityModel {
    EntityModel::new([
        interface_extending("child", &["parent"]),
        interface_extending("parent", &["grandparent"]),
        Entity::interface(eid("grandparent")),
        Entity::interface(eid("other")),
        property("child_prop", "level", "child"),
        property("parent_prop", "serial", "parent"),
        relationship("grandparent_rel", "locatedIn", "grandparent", Some("other")),
    ])
}

/// An interface with one of each content kind plus a plain neighbour.
pub(crate) fn content_model() -> EntityModel {
    EntityModel::new([
        Entity::interface(eid("pump")).with_display_name("en", "Pump"),
        Entity::interface(eid("tank")).with_display_name("en", "Tank"),
        property("pump_speed", "speed", "pump"),
        telemetry("pump_flow", "flow", "pump"),
        command("pump_stop", "stop", "pump"),
        relationship("pump_feeds", "feeds", "pump", Some("tank")),
        property("tank_level", "level", "tank"),
    ])
}

pub(crate) fn search_model() -> EntityModel {
    EntityModel::new([
        Entity::interface(eid("dtmi:cim:ConnectivityNodeContainer;1"))
            .with_display_name("en", "ConnectivityNodeContainer"),
        Entity::interface(eid("dtmi:cim:Equipment;1")).with_display_name("en", "Equipment"),
        Entity::interface(eid("dtmi:cim:Substation;1")).with_display_name("en", "Substation"),
        relationship(
            "dtmi:cim:Equipment:EquipmentContainer;1",
            "EquipmentContainer",
            "dtmi:cim:Equipment;1",
            Some("dtmi:cim:ConnectivityNodeContainer;1"),
        ),
    ])
}
