// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use crate::model::{IdError, ModelError, ValidationError};
use crate::parse::ParseError;
use crate::render::{RenderError, StructuralError};
use crate::store::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("rendered diagram is malformed: {0}")]
    Structural(#[from] StructuralError),
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    NotFound(#[from] StoreError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("internal render failure: {0}")]
    Renderer(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Id(#[from] IdError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Structural(err) => Self::Structural(err),
            RenderError::Timeout(after) => Self::Timeout(after),
            RenderError::Renderer(err) => Self::Renderer(err.to_string()),
            RenderError::Internal(message) => Self::Renderer(message),
        }
    }
}
