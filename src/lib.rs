// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Twinview: progressive-disclosure graph views over DTDL ontologies.
//!
//! A parsed model ([`model::EntityModel`]) is filtered by a per-view [`model::ViewState`] into a
//! visible subgraph, described for an external renderer, and the rendered result is validated,
//! annotated and cached. [`service::ViewService`] ties these together.

pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod parse;
pub mod query;
pub mod render;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use service::ViewService;
