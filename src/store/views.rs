// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use super::StoreError;
use crate::model::{ModelId, SessionId, ViewId, ViewState};

/// Either a shareable view or a single browser session derived from one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "scope", content = "id", rename_all = "camelCase")]
pub enum ViewKey {
    View(ViewId),
    Session(SessionId),
}

impl ViewKey {
    fn not_found(&self) -> StoreError {
        match self {
            Self::View(id) => StoreError::ViewNotFound(id.clone()),
            Self::Session(id) => StoreError::SessionNotFound(id.clone()),
        }
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View(id) => write!(f, "view:{id}"),
            Self::Session(id) => write!(f, "session:{id}"),
        }
    }
}

impl From<ViewId> for ViewKey {
    fn from(id: ViewId) -> Self {
        Self::View(id)
    }
}

impl From<SessionId> for ViewKey {
    fn from(id: SessionId) -> Self {
        Self::Session(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecord {
    pub model_id: ModelId,
    pub state: ViewState,
    /// The view a session was opened from.
    pub opened_from: Option<ViewId>,
}

#[derive(Debug, Default)]
struct ViewTable {
    records: HashMap<ViewKey, ViewRecord>,
    next_view: u64,
    next_session: u64,
}

/// In-memory view and session states.
///
/// Every access takes the lock for a single lookup or mutation; nothing holds it across `.await`.
#[derive(Debug, Default)]
pub struct ViewStore {
    table: Mutex<ViewTable>,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_view(&self, model_id: ModelId, state: ViewState) -> ViewId {
        let mut table = self.table.lock();
        table.next_view += 1;
        let id = ViewId::sequential("view", table.next_view);
        table.records.insert(
            ViewKey::View(id.clone()),
            ViewRecord {
                model_id,
                state,
                opened_from: None,
            },
        );
        id
    }

    /// Starts a session with a copy of the view's current state.
    pub fn create_session(&self, view_id: &ViewId) -> Result<SessionId, StoreError> {
        let mut table = self.table.lock();
        let key = ViewKey::View(view_id.clone());
        let view = table.records.get(&key).ok_or_else(|| key.not_found())?;
        let record = ViewRecord {
            model_id: view.model_id.clone(),
            state: view.state.clone(),
            opened_from: Some(view_id.clone()),
        };
        table.next_session += 1;
        let id = SessionId::sequential("session", table.next_session);
        table.records.insert(ViewKey::Session(id.clone()), record);
        Ok(id)
    }

    pub fn get(&self, key: &ViewKey) -> Result<ViewRecord, StoreError> {
        self.table
            .lock()
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| key.not_found())
    }

    pub fn state(&self, key: &ViewKey) -> Result<ViewState, StoreError> {
        self.get(key).map(|record| record.state)
    }

    /// Stores `record` under `key`, replacing any previous record.
    pub fn insert(&self, key: ViewKey, record: ViewRecord) -> Option<ViewRecord> {
        self.table.lock().records.insert(key, record)
    }

    /// Runs `update` on the stored state. A missing key yields [`StoreError`] converted into `E`.
    pub fn update<R, E>(
        &self,
        key: &ViewKey,
        update: impl FnOnce(&mut ViewState) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut table = self.table.lock();
        let record = table.records.get_mut(key).ok_or_else(|| key.not_found())?;
        update(&mut record.state)
    }

    pub fn contains(&self, key: &ViewKey) -> bool {
        self.table.lock().records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewKey, ViewStore};
    use crate::model::fixtures::eid;
    use crate::model::{ModelId, SessionId, ValidationError, ViewId, ViewState};
    use crate::store::StoreError;

    fn model_id() -> ModelId {
        ModelId::new("plant").unwrap()
    }

    #[test]
    fn missing_keys_are_distinguished() {
        let store = ViewStore::new();
        let view = ViewKey::View(ViewId::new("nope").unwrap());
        let session = ViewKey::Session(SessionId::new("nope").unwrap());

        assert_eq!(
            store.get(&view),
            Err(StoreError::ViewNotFound(ViewId::new("nope").unwrap()))
        );
        assert_eq!(
            store.get(&session),
            Err(StoreError::SessionNotFound(SessionId::new("nope").unwrap()))
        );
    }

    #[test]
    fn sessions_start_from_the_view_and_then_diverge() {
        let store = ViewStore::new();
        let mut state = ViewState::default();
        state.expand(eid("pump"));
        let view = store.create_view(model_id(), state);

        let a = ViewKey::Session(store.create_session(&view).unwrap());
        let b = ViewKey::Session(store.create_session(&view).unwrap());
        assert_ne!(a, b);

        store
            .update::<_, StoreError>(&a, |state| {
                state.collapse("pump");
                Ok(())
            })
            .unwrap();

        assert!(store.state(&a).unwrap().expanded_ids.is_empty());
        assert_eq!(store.state(&b).unwrap().expanded_ids, vec![eid("pump")]);
        assert_eq!(store.state(&view.clone().into()).unwrap().expanded_ids, vec![eid("pump")]);
        assert_eq!(store.get(&a).unwrap().opened_from, Some(view));
    }

    #[test]
    fn session_for_unknown_view_fails() {
        let store = ViewStore::new();
        let missing = ViewId::new("view-9").unwrap();
        assert_eq!(
            store.create_session(&missing),
            Err(StoreError::ViewNotFound(missing))
        );
        assert!(store.is_empty());
    }

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum TestError {
        #[error(transparent)]
        Store(#[from] StoreError),
        #[error(transparent)]
        Validation(#[from] ValidationError),
    }

    #[test]
    fn update_propagates_both_lookup_and_closure_errors() {
        let store = ViewStore::new();
        let view: ViewKey = store.create_view(model_id(), ViewState::default()).into();

        let err = store
            .update::<(), TestError>(&view, |_| Err(ValidationError::InvalidZoom.into()))
            .unwrap_err();
        assert_eq!(err, TestError::Validation(ValidationError::InvalidZoom));

        let missing = ViewKey::View(ViewId::new("missing").unwrap());
        let err = store
            .update::<(), TestError>(&missing, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, TestError::Store(StoreError::ViewNotFound(_))));
    }
}
