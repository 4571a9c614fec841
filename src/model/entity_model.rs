// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use super::entity::{Entity, EntityError, EntityKind, RawEntity};
use super::ids::{EntityId, ModelId};

/// Identifies one immutable version of a model: edits produce a new revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelVersion {
    pub model_id: ModelId,
    pub revision: u64,
}

impl ModelVersion {
    pub fn new(model_id: ModelId, revision: u64) -> Self {
        Self { model_id, revision }
    }

    pub fn next(&self) -> Self {
        Self {
            model_id: self.model_id.clone(),
            revision: self.revision.wrapping_add(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid object model json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("object model key '{key}' does not match entity id '{id}'")]
    KeyMismatch { key: String, id: String },
    #[error(transparent)]
    Entity(#[from] EntityError),
}

/// The parsed entity graph of one model version.
///
/// Read-only after construction. Ownership (content → interface) is indexed once from both the
/// interfaces' content maps and the content entities' `ChildOf`, so either side alone is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityModel {
    entities: BTreeMap<EntityId, Entity>,
    owned: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl EntityModel {
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Self {
        let entities = entities
            .into_iter()
            .map(|entity| (entity.id().clone(), entity))
            .collect::<BTreeMap<_, _>>();

        let mut owned: BTreeMap<EntityId, BTreeSet<EntityId>> = BTreeMap::new();
        for entity in entities.values() {
            match entity.kind() {
                EntityKind::Interface(info) => {
                    let slot = owned.entry(entity.id().clone()).or_default();
                    for content_id in info.contents.values() {
                        if entities.get(content_id).is_some_and(|c| c.tag().is_content()) {
                            slot.insert(content_id.clone());
                        }
                    }
                }
                EntityKind::Schema { .. } => {}
                _ => {
                    if let Some(owner) = entity.owner() {
                        owned.entry(owner.clone()).or_default().insert(entity.id().clone());
                    }
                }
            }
        }

        Self { entities, owned }
    }

    /// Builds a model from the DTDL parser's object model JSON (`{ "<id>": { "EntityKind": .. } }`).
    pub fn from_object_model_json(json: &str) -> Result<Self, ModelError> {
        let raw: BTreeMap<String, RawEntity> = serde_json::from_str(json)?;
        let mut entities = Vec::with_capacity(raw.len());
        for (key, mut entry) in raw {
            if entry.id.is_empty() {
                entry.id = key.clone();
            } else if entry.id != key {
                return Err(ModelError::KeyMismatch { key, id: entry.id });
            }
            entities.push(Entity::try_from(entry)?);
        }
        Ok(Self::new(entities))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn is_interface(&self, id: &str) -> bool {
        matches!(self.get(id).map(Entity::kind), Some(EntityKind::Interface(_)))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(|entity| matches!(entity.kind(), EntityKind::Interface(_)))
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(|entity| matches!(entity.kind(), EntityKind::Relationship(_)))
    }

    /// Content declared directly on `interface_id` (no inheritance).
    pub fn own_content(&self, interface_id: &str) -> impl Iterator<Item = &Entity> {
        self.owned
            .get(interface_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }

    /// Names of the relationships whose `ChildOf` is `interface_id`.
    pub fn outgoing_relationship_names(&self, interface_id: &str) -> Vec<&str> {
        self.own_content(interface_id)
            .filter_map(|entity| match entity.kind() {
                EntityKind::Relationship(info) => Some(info.name.as_str()),
                _ => None,
            })
            .collect()
    }

    fn extends_of(&self, interface_id: &EntityId) -> &[EntityId] {
        match self.get(interface_id.as_str()).map(Entity::kind) {
            Some(EntityKind::Interface(info)) => &info.extends,
            _ => &[],
        }
    }

    /// All interfaces reachable through `extends`, nearest first, without `interface_id` itself.
    ///
    /// Cycles terminate: an id already visited is never walked again.
    pub fn ancestors(&self, interface_id: &EntityId) -> Vec<EntityId> {
        let mut visited: BTreeSet<EntityId> = BTreeSet::new();
        let mut ordered = Vec::new();
        let mut queue: VecDeque<EntityId> = VecDeque::new();

        visited.insert(interface_id.clone());
        queue.push_back(interface_id.clone());

        while let Some(current) = queue.pop_front() {
            for parent in self.extends_of(&current) {
                if !self.is_interface(parent.as_str()) {
                    continue;
                }
                if visited.insert(parent.clone()) {
                    ordered.push(parent.clone());
                    queue.push_back(parent.clone());
                }
            }
        }

        ordered
    }

    /// Own content plus the content of every ancestor, deduplicated, own content first.
    pub fn flattened_content(&self, interface_id: &EntityId) -> Vec<&Entity> {
        let mut seen: BTreeSet<&EntityId> = BTreeSet::new();
        let mut out = Vec::new();

        let chain = std::iter::once(interface_id.clone()).chain(self.ancestors(interface_id));
        for owner in chain {
            for entity in self.own_content(owner.as_str()) {
                if seen.insert(entity.id()) {
                    out.push(entity);
                }
            }
        }

        out
    }

    /// The owning interface chain of `id`, innermost first; empty for interfaces and unknown ids.
    pub fn owner_chain(&self, id: &str) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut visited: BTreeSet<EntityId> = BTreeSet::new();
        let mut current = self.get(id);

        while let Some(entity) = current {
            let Some(owner) = entity.owner() else {
                break;
            };
            if !visited.insert(owner.clone()) {
                break;
            }
            chain.push(owner.clone());
            current = self.get(owner.as_str());
        }

        chain
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityModel, ModelError};
    use crate::model::fixtures::{cyclic_extends_model, eid, inheritance_model};

    #[test]
    fn ancestors_walk_to_fixed_point_in_order() {
        let model = inheritance_model();
        let ancestors = model.ancestors(&eid("child"));
        assert_eq!(ancestors, vec![eid("parent"), eid("grandparent")]);
    }

    #[test]
    fn ancestors_terminate_on_cycles() {
        let model = cyclic_extends_model();
        assert_eq!(model.ancestors(&eid("a")), vec![eid("b")]);
        assert_eq!(model.ancestors(&eid("b")), vec![eid("a")]);
    }

    #[test]
    fn flattened_content_includes_inherited_content_once() {
        let model = inheritance_model();
        let ids = model
            .flattened_content(&eid("child"))
            .into_iter()
            .map(|entity| entity.id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["child_prop", "parent_prop", "grandparent_rel"]);
    }

    #[test]
    fn owner_chain_of_content_is_its_interface() {
        let model = inheritance_model();
        assert_eq!(model.owner_chain("parent_prop"), vec![eid("parent")]);
        assert!(model.owner_chain("parent").is_empty());
        assert!(model.owner_chain("missing").is_empty());
    }

    #[test]
    fn object_model_json_builds_ownership_from_either_side() {
        let model = EntityModel::from_object_model_json(
            r#"{
                "dtmi:ex:A;1": {
                    "EntityKind": "Interface",
                    "Id": "dtmi:ex:A;1",
                    "relationships": { "toB": "dtmi:ex:A:toB;1" }
                },
                "dtmi:ex:A:toB;1": {
                    "EntityKind": "Relationship",
                    "Id": "dtmi:ex:A:toB;1",
                    "ChildOf": "dtmi:ex:A;1",
                    "DefinedIn": "dtmi:ex:A;1",
                    "name": "toB",
                    "target": "dtmi:ex:B;1"
                },
                "dtmi:ex:B;1": { "EntityKind": "Interface", "Id": "dtmi:ex:B;1" }
            }"#,
        )
        .expect("model");

        assert_eq!(model.len(), 3);
        assert_eq!(model.interfaces().count(), 2);
        assert_eq!(model.outgoing_relationship_names("dtmi:ex:A;1"), vec!["toB"]);
    }

    #[test]
    fn object_model_json_rejects_key_mismatch() {
        let err = EntityModel::from_object_model_json(
            r#"{ "a": { "EntityKind": "Interface", "Id": "b" } }"#,
        )
        .expect_err("mismatch");
        assert!(matches!(err, ModelError::KeyMismatch { .. }));
    }
}
