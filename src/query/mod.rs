// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over a model: fuzzy search and the visible subgraph of a view.

pub mod search;
pub mod visible;

pub use search::{MatchSpan, SearchField, SearchIndex, SearchMatch, DEFAULT_THRESHOLD};
pub use visible::{compute_graph_view, compute_visible_graph, GraphView, VisibleGraph};
