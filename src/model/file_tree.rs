// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Navigation tree mirroring the uploaded source files.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::entity::EntityKindTag;
use super::entity_model::EntityModel;
use super::ids::EntityId;

/// One uploaded DTDL source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Top-level entities declared by the file.
    ///
    /// DTDL sources declare them through `@id` (a single object or an array of objects). An
    /// object model file (`{ "<id>": { "EntityKind": .. } }`) declares its interfaces. Returns
    /// `None` when the contents are not JSON.
    pub fn declared_ids(&self) -> Option<Vec<EntityId>> {
        let value: serde_json::Value = serde_json::from_str(&self.contents).ok()?;
        if let Some(entries) = object_model_entries(&value) {
            return Some(
                entries
                    .filter(|(_, entry)| entry["EntityKind"] == "Interface")
                    .filter_map(|(key, _)| EntityId::new(key.as_str()).ok())
                    .collect(),
            );
        }
        let objects = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        Some(
            objects
                .iter()
                .filter_map(|object| object.get("@id")?.as_str())
                .filter_map(|id| EntityId::new(id).ok())
                .collect(),
        )
    }

    /// True if the contents are an object model rather than DTDL source.
    pub fn is_object_model(&self) -> bool {
        serde_json::from_str::<serde_json::Value>(&self.contents)
            .is_ok_and(|value| object_model_entries(&value).is_some())
    }

    fn segments(&self) -> Vec<&str> {
        self.path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect()
    }
}

/// Source path → number of diagnostics reported against that file.
pub type ErrorCounts = BTreeMap<String, usize>;

fn object_model_entries(
    value: &serde_json::Value,
) -> Option<impl Iterator<Item = (&String, &serde_json::Value)>> {
    let map = value.as_object()?;
    let shaped = !map.is_empty()
        && !map.contains_key("@id")
        && map.values().all(|entry| entry.get("EntityKind").is_some());
    shaped.then(|| map.iter())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DtdlPath {
    Directory {
        name: String,
        entries: Vec<DtdlPath>,
    },
    File {
        name: String,
        path: String,
        kinds: BTreeSet<EntityKindTag>,
        #[serde(rename = "errorCount")]
        error_count: usize,
        entries: Vec<DtdlPath>,
    },
    FileEntry {
        id: EntityId,
        name: String,
        kind: EntityKindTag,
        entries: Vec<DtdlPath>,
    },
    FileEntryContent {
        id: EntityId,
        name: String,
        kind: EntityKindTag,
    },
}

impl DtdlPath {
    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. }
            | Self::File { name, .. }
            | Self::FileEntry { name, .. }
            | Self::FileEntryContent { name, .. } => name,
        }
    }

    pub fn entries(&self) -> &[DtdlPath] {
        match self {
            Self::Directory { entries, .. }
            | Self::File { entries, .. }
            | Self::FileEntry { entries, .. } => entries,
            Self::FileEntryContent { .. } => &[],
        }
    }

    /// True if this node or any descendant file carries errors.
    pub fn has_errors(&self) -> bool {
        match self {
            Self::File { error_count, .. } => *error_count > 0,
            Self::Directory { entries, .. } => has_file_tree_errors(entries),
            Self::FileEntry { .. } | Self::FileEntryContent { .. } => false,
        }
    }
}

pub fn has_file_tree_errors(paths: &[DtdlPath]) -> bool {
    paths.iter().any(DtdlPath::has_errors)
}

#[derive(Debug, Default)]
struct DirBuilder {
    dirs: BTreeMap<String, DirBuilder>,
    files: BTreeMap<String, DtdlPath>,
}

impl DirBuilder {
    fn finish(self) -> Vec<DtdlPath> {
        let mut out = self
            .dirs
            .into_iter()
            .map(|(name, dir)| DtdlPath::Directory {
                name,
                entries: dir.finish(),
            })
            .collect::<Vec<_>>();
        out.extend(self.files.into_values());
        out
    }
}

fn file_entry(model: &EntityModel, id: &EntityId) -> Option<DtdlPath> {
    let entity = model.get(id.as_str())?;
    let entries = model
        .own_content(id.as_str())
        .map(|content| DtdlPath::FileEntryContent {
            id: content.id().clone(),
            name: content.label().to_owned(),
            kind: content.tag(),
        })
        .collect();
    Some(DtdlPath::FileEntry {
        id: id.clone(),
        name: entity.label().to_owned(),
        kind: entity.tag(),
        entries,
    })
}

/// Builds the navigation tree for `files`.
///
/// Independent of expansion state. Directories are listed before files, both by name. A file
/// whose contents are not JSON counts one error on top of `error_counts[path]`.
pub fn build_file_tree(
    model: &EntityModel,
    files: &[SourceFile],
    error_counts: &ErrorCounts,
) -> Vec<DtdlPath> {
    let mut root = DirBuilder::default();

    for file in files {
        let segments = file.segments();
        let Some((file_name, dirs)) = segments.split_last() else {
            continue;
        };

        let declared = file.declared_ids();
        let mut error_count = error_counts.get(&file.path).copied().unwrap_or(0);
        if declared.is_none() {
            error_count = error_count.saturating_add(1);
        }

        let mut kinds = BTreeSet::new();
        let mut entries = Vec::new();
        for id in declared.into_iter().flatten() {
            if let Some(entry) = file_entry(model, &id) {
                if let DtdlPath::FileEntry { kind, .. } = &entry {
                    kinds.insert(*kind);
                }
                entries.push(entry);
            }
        }

        let mut dir = &mut root;
        for segment in dirs {
            dir = dir.dirs.entry((*segment).to_owned()).or_default();
        }
        dir.files.insert(
            (*file_name).to_owned(),
            DtdlPath::File {
                name: (*file_name).to_owned(),
                path: file.path.clone(),
                kinds,
                error_count,
                entries,
            },
        );
    }

    root.finish()
}
