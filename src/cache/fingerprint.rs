// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::Serialize;

use crate::model::{EntityId, ModelVersion, OutputFormat, ViewState};

/// Cache key over every render-relevant input.
///
/// Canonical JSON of the model version, layout, diagram type, trimmed search term, the sorted
/// and de-duplicated expanded ids, and the output format. Highlight, viewport, navigation,
/// return url and edit mode do not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(version: &ModelVersion, state: &ViewState, format: OutputFormat) -> Self {
        let expanded = state
            .expanded_set()
            .into_iter()
            .map(EntityId::as_str)
            .collect::<Vec<_>>();
        let key = serde_json::json!({
            "diagramType": state.diagram_type.as_str(),
            "expandedIds": expanded,
            "format": format.to_string(),
            "layout": state.layout.as_str(),
            "model": version.model_id.as_str(),
            "revision": version.revision,
            "search": state.search_term(),
        });
        Self(key.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Fingerprint;
    use crate::model::fixtures::eid;
    use crate::model::{
        DiagramType, Layout, ModelId, ModelVersion, OutputFormat, ViewState, Viewport,
    };

    fn version(revision: u64) -> ModelVersion {
        ModelVersion::new(ModelId::new("plant").unwrap(), revision)
    }

    fn state(expanded: &[&str], search: Option<&str>) -> ViewState {
        ViewState {
            expanded_ids: expanded.iter().map(|value| eid(value)).collect(),
            search: search.map(str::to_owned),
            ..ViewState::default()
        }
    }

    #[test]
    fn equal_semantics_collide() {
        let a = Fingerprint::new(&version(1), &state(&["b", "a", "a"], Some(" pump ")), OutputFormat::Svg);
        let mut other = state(&["a", "b"], Some("pump"));
        other.highlight_node_id = Some(eid("a"));
        other.viewport = Viewport { x: 4.0, y: 2.0, zoom: 3.0 };
        other.edit_mode = true;
        other.return_url = Some("/models".to_owned());
        let b = Fingerprint::new(&version(1), &other, OutputFormat::Svg);
        assert_eq!(a, b);
    }

    #[test]
    fn blank_search_equals_no_search() {
        let a = Fingerprint::new(&version(1), &state(&[], Some("   ")), OutputFormat::Svg);
        let b = Fingerprint::new(&version(1), &state(&[], None), OutputFormat::Svg);
        assert_eq!(a, b);
    }

    #[rstest]
    #[case::revision(version(2), state(&["a"], None), OutputFormat::Svg)]
    #[case::expanded(version(1), state(&["a", "b"], None), OutputFormat::Svg)]
    #[case::search(version(1), state(&["a"], Some("tank")), OutputFormat::Svg)]
    #[case::format(version(1), state(&["a"], None), OutputFormat::Text)]
    #[case::layout(version(1), ViewState { layout: Layout::Elk, ..state(&["a"], None) }, OutputFormat::Svg)]
    #[case::diagram(version(1), ViewState { diagram_type: DiagramType::ClassDiagram, ..state(&["a"], None) }, OutputFormat::Svg)]
    fn any_render_relevant_difference_does_not_collide(
        #[case] changed_version: ModelVersion,
        #[case] changed_state: ViewState,
        #[case] format: OutputFormat,
    ) {
        let base = Fingerprint::new(&version(1), &state(&["a"], None), OutputFormat::Svg);
        assert_ne!(base, Fingerprint::new(&changed_version, &changed_state, format));
    }

    #[test]
    fn ids_cannot_smuggle_separators() {
        let a = Fingerprint::new(&version(1), &state(&["a\",\"b"], None), OutputFormat::Svg);
        let b = Fingerprint::new(&version(1), &state(&["a", "b"], None), OutputFormat::Svg);
        assert_ne!(a, b);
    }
}
