// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Keyed storage.
//!
//! View and session states live in [`ViewStore`]; uploaded sources sit behind the
//! [`ModelRepository`] boundary.

pub mod models;
pub mod views;

pub use models::{InMemoryModelRepository, ModelRepository, ModelRow};
pub use views::{ViewKey, ViewRecord, ViewStore};

use crate::model::{ModelId, SessionId, ViewId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("model '{0}' not found")]
    ModelNotFound(ModelId),
    #[error("view '{0}' not found")]
    ViewNotFound(ViewId),
    #[error("session '{0}' not found")]
    SessionNotFound(SessionId),
}
