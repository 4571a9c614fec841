// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{EntityId, IdError};

/// Language used when picking a display name out of a localized map.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The DTDL entity kind without kind-specific payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKindTag {
    Interface,
    Relationship,
    Property,
    Telemetry,
    Command,
    Component,
    Schema,
}

impl EntityKindTag {
    pub fn is_content(self) -> bool {
        matches!(
            self,
            Self::Relationship | Self::Property | Self::Telemetry | Self::Command | Self::Component
        )
    }
}

impl fmt::Display for EntityKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interface => "Interface",
            Self::Relationship => "Relationship",
            Self::Property => "Property",
            Self::Telemetry => "Telemetry",
            Self::Command => "Command",
            Self::Component => "Component",
            Self::Schema => "Schema",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub extends: Vec<EntityId>,
    pub extended_by: Vec<EntityId>,
    /// Content name → content id, merged over `contents`, `properties`, `relationships`,
    /// `telemetries`, `commands` and `components`.
    pub contents: BTreeMap<String, EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipInfo {
    pub name: String,
    pub child_of: EntityId,
    pub target: Option<EntityId>,
    pub min_multiplicity: Option<u64>,
    pub max_multiplicity: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    pub name: String,
    pub child_of: EntityId,
    pub schema: Option<EntityId>,
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Interface(InterfaceInfo),
    Relationship(RelationshipInfo),
    Property(ContentInfo),
    Telemetry(ContentInfo),
    Command(ContentInfo),
    /// `schema` of the content info points at the component's interface.
    Component(ContentInfo),
    /// Object/Enum/Map/Array and primitive schemas; the parser's kind string is kept verbatim.
    Schema { kind: String },
}

impl EntityKind {
    pub fn tag(&self) -> EntityKindTag {
        match self {
            Self::Interface(_) => EntityKindTag::Interface,
            Self::Relationship(_) => EntityKindTag::Relationship,
            Self::Property(_) => EntityKindTag::Property,
            Self::Telemetry(_) => EntityKindTag::Telemetry,
            Self::Command(_) => EntityKindTag::Command,
            Self::Component(_) => EntityKindTag::Component,
            Self::Schema { .. } => EntityKindTag::Schema,
        }
    }
}

/// One entity of a parsed DTDL model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    display_name: BTreeMap<String, String>,
    description: BTreeMap<String, String>,
    comment: Option<String>,
    defined_in: Option<EntityId>,
    kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            display_name: BTreeMap::new(),
            description: BTreeMap::new(),
            comment: None,
            defined_in: None,
            kind,
        }
    }

    pub fn interface(id: EntityId) -> Self {
        Self::new(id, EntityKind::Interface(InterfaceInfo::default()))
    }

    pub fn relationship(
        id: EntityId,
        name: impl Into<String>,
        child_of: EntityId,
        target: Option<EntityId>,
    ) -> Self {
        let defined_in = child_of.clone();
        Self::new(
            id,
            EntityKind::Relationship(RelationshipInfo {
                name: name.into(),
                child_of,
                target,
                min_multiplicity: None,
                max_multiplicity: None,
            }),
        )
        .with_defined_in(defined_in)
    }

    pub fn with_display_name(mut self, language: &str, name: impl Into<String>) -> Self {
        self.display_name.insert(language.to_owned(), name.into());
        self
    }

    pub fn with_description(mut self, language: &str, text: impl Into<String>) -> Self {
        self.description.insert(language.to_owned(), text.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_defined_in(mut self, defined_in: EntityId) -> Self {
        self.defined_in = Some(defined_in);
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EntityKind {
        &mut self.kind
    }

    pub fn tag(&self) -> EntityKindTag {
        self.kind.tag()
    }

    pub fn display_names(&self) -> &BTreeMap<String, String> {
        &self.display_name
    }

    /// English display name, falling back to any other language.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name
            .get(DEFAULT_LANGUAGE)
            .or_else(|| self.display_name.values().next())
            .map(String::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.description
            .get(DEFAULT_LANGUAGE)
            .or_else(|| self.description.values().next())
            .map(String::as_str)
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn defined_in(&self) -> Option<&EntityId> {
        self.defined_in.as_ref()
    }

    /// Content name for relationships, properties, telemetries, commands and components.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Relationship(info) => Some(&info.name),
            EntityKind::Property(info)
            | EntityKind::Telemetry(info)
            | EntityKind::Command(info)
            | EntityKind::Component(info) => Some(&info.name),
            EntityKind::Interface(_) | EntityKind::Schema { .. } => None,
        }
    }

    /// Owning interface of a content entity (`ChildOf`, falling back to `DefinedIn`).
    pub fn owner(&self) -> Option<&EntityId> {
        match &self.kind {
            EntityKind::Relationship(info) => Some(&info.child_of),
            EntityKind::Property(info)
            | EntityKind::Telemetry(info)
            | EntityKind::Command(info)
            | EntityKind::Component(info) => Some(&info.child_of),
            EntityKind::Interface(_) => None,
            EntityKind::Schema { .. } => self.defined_in.as_ref(),
        }
    }

    /// Label used for nodes and file entries: display name, then content name, then the id's
    /// local name.
    pub fn label(&self) -> &str {
        self.display_name()
            .or_else(|| self.name())
            .unwrap_or_else(|| self.id.local_name())
    }
}

/// Error converting one entry of the parser's object model into an [`Entity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error("invalid {field} '{value}': {source}")]
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
    #[error("entity '{id}' of kind {kind} is missing '{field}'")]
    MissingField {
        id: String,
        kind: &'static str,
        field: &'static str,
    },
}

/// Wire shape of a single entity in the DTDL parser's object model output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawEntity {
    #[serde(rename = "EntityKind")]
    pub entity_kind: String,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "DefinedIn")]
    pub defined_in: Option<String>,
    #[serde(rename = "ChildOf")]
    pub child_of: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: BTreeMap<String, String>,
    pub description: BTreeMap<String, String>,
    pub comment: Option<String>,
    pub name: Option<String>,
    pub target: Option<String>,
    pub schema: Option<String>,
    pub writable: Option<bool>,
    #[serde(rename = "minMultiplicity")]
    pub min_multiplicity: Option<u64>,
    #[serde(rename = "maxMultiplicity")]
    pub max_multiplicity: Option<u64>,
    pub extends: Vec<String>,
    #[serde(rename = "extendedBy")]
    pub extended_by: Vec<String>,
    pub contents: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
    pub relationships: BTreeMap<String, String>,
    pub telemetries: BTreeMap<String, String>,
    pub commands: BTreeMap<String, String>,
    pub components: BTreeMap<String, String>,
}

fn entity_id(field: &'static str, value: String) -> Result<EntityId, EntityError> {
    EntityId::new(value.clone()).map_err(|source| EntityError::InvalidId {
        field,
        value,
        source,
    })
}

fn optional_entity_id(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<EntityId>, EntityError> {
    match value {
        Some(value) if !value.trim().is_empty() => entity_id(field, value).map(Some),
        _ => Ok(None),
    }
}

/// A target that is not a usable id leaves the relationship untargeted, so it renders as
/// dangling instead of rejecting the model.
fn relationship_target(relationship: &EntityId, value: Option<String>) -> Option<EntityId> {
    let value = value.filter(|value| !value.trim().is_empty())?;
    match EntityId::new(value.clone()) {
        Ok(target) => Some(target),
        Err(err) => {
            tracing::warn!(%relationship, target = %value, %err, "unusable relationship target");
            None
        }
    }
}

impl TryFrom<RawEntity> for Entity {
    type Error = EntityError;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        let id = entity_id("Id", raw.id)?;
        let defined_in = optional_entity_id("DefinedIn", raw.defined_in)?;
        let child_of = optional_entity_id("ChildOf", raw.child_of)?;

        let content = |kind: &'static str,
                       child_of: Option<EntityId>,
                       defined_in: Option<&EntityId>|
         -> Result<ContentInfo, EntityError> {
            let child_of = child_of.or_else(|| defined_in.cloned()).ok_or_else(|| {
                EntityError::MissingField {
                    id: id.to_string(),
                    kind,
                    field: "ChildOf",
                }
            })?;
            Ok(ContentInfo {
                name: raw.name.clone().unwrap_or_else(|| id.local_name().to_owned()),
                child_of,
                schema: optional_entity_id("schema", raw.schema.clone())?,
                writable: raw.writable.unwrap_or(false),
            })
        };

        let kind = match raw.entity_kind.as_str() {
            "Interface" => {
                let mut contents = BTreeMap::new();
                for map in [
                    raw.contents,
                    raw.properties,
                    raw.relationships,
                    raw.telemetries,
                    raw.commands,
                    raw.components,
                ] {
                    for (name, value) in map {
                        contents.insert(name, entity_id("contents", value)?);
                    }
                }
                EntityKind::Interface(InterfaceInfo {
                    extends: raw
                        .extends
                        .into_iter()
                        .map(|value| entity_id("extends", value))
                        .collect::<Result<_, _>>()?,
                    extended_by: raw
                        .extended_by
                        .into_iter()
                        .map(|value| entity_id("extendedBy", value))
                        .collect::<Result<_, _>>()?,
                    contents,
                })
            }
            "Relationship" => {
                let child_of = child_of.or_else(|| defined_in.clone()).ok_or_else(|| {
                    EntityError::MissingField {
                        id: id.to_string(),
                        kind: "Relationship",
                        field: "ChildOf",
                    }
                })?;
                EntityKind::Relationship(RelationshipInfo {
                    name: raw.name.clone().unwrap_or_else(|| id.local_name().to_owned()),
                    child_of,
                    target: relationship_target(&id, raw.target),
                    min_multiplicity: raw.min_multiplicity,
                    max_multiplicity: raw.max_multiplicity,
                })
            }
            "Property" => EntityKind::Property(content("Property", child_of, defined_in.as_ref())?),
            "Telemetry" => {
                EntityKind::Telemetry(content("Telemetry", child_of, defined_in.as_ref())?)
            }
            "Command" => EntityKind::Command(content("Command", child_of, defined_in.as_ref())?),
            "Component" => {
                EntityKind::Component(content("Component", child_of, defined_in.as_ref())?)
            }
            other => EntityKind::Schema {
                kind: other.to_owned(),
            },
        };

        Ok(Self {
            id,
            display_name: raw.display_name,
            description: raw.description,
            comment: raw.comment,
            defined_in,
            kind,
        })
    }
}
