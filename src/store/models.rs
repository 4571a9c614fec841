// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::model::{ModelId, SourceFile};

/// One stored upload: the raw DTDL sources of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRow {
    pub id: u64,
    pub model_id: ModelId,
    pub contents: Vec<SourceFile>,
}

/// Persistence boundary for uploaded sources.
pub trait ModelRepository: Send + Sync {
    /// Stores a new upload. A later upload under the same `model_id` supersedes earlier ones.
    fn insert(&self, model_id: ModelId, contents: Vec<SourceFile>) -> ModelRow;

    /// The latest upload for `model_id`.
    fn get(&self, model_id: &ModelId) -> Result<ModelRow, StoreError>;

    /// Replaces the sources of the latest upload in place (an edit, not a new upload).
    fn update_contents(
        &self,
        model_id: &ModelId,
        contents: Vec<SourceFile>,
    ) -> Result<ModelRow, StoreError>;
}

#[derive(Debug, Default)]
struct Rows {
    by_id: BTreeMap<u64, ModelRow>,
    latest: BTreeMap<ModelId, u64>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryModelRepository {
    rows: RwLock<Rows>,
}

impl InMemoryModelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelRepository for InMemoryModelRepository {
    fn insert(&self, model_id: ModelId, contents: Vec<SourceFile>) -> ModelRow {
        let mut rows = self.rows.write();
        rows.next_id += 1;
        let row = ModelRow {
            id: rows.next_id,
            model_id: model_id.clone(),
            contents,
        };
        rows.by_id.insert(row.id, row.clone());
        rows.latest.insert(model_id, row.id);
        row
    }

    fn get(&self, model_id: &ModelId) -> Result<ModelRow, StoreError> {
        let rows = self.rows.read();
        rows.latest
            .get(model_id)
            .and_then(|id| rows.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::ModelNotFound(model_id.clone()))
    }

    fn update_contents(
        &self,
        model_id: &ModelId,
        contents: Vec<SourceFile>,
    ) -> Result<ModelRow, StoreError> {
        let mut rows = self.rows.write();
        let id = rows
            .latest
            .get(model_id)
            .copied()
            .ok_or_else(|| StoreError::ModelNotFound(model_id.clone()))?;
        let row = rows
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::ModelNotFound(model_id.clone()))?;
        row.contents = contents;
        Ok(row.clone())
    }
}
