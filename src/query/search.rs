// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fuzzy search over interfaces and relationships.
//!
//! Every interface and relationship becomes one document with up to three kinds of fields:
//! the identifier, the display name and, for interfaces, the names of their outgoing
//! relationships. The index is rebuilt wholesale on [`SearchIndex::reindex`]; there is no
//! incremental patching.

use serde::Serialize;

use crate::model::{EntityId, EntityKind, EntityModel};

pub const DEFAULT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    DisplayName,
    Id,
    RelationshipName,
}

impl SearchField {
    fn weight(self) -> i64 {
        match self {
            Self::DisplayName => 150,
            Self::Id => 100,
            Self::RelationshipName => 0,
        }
    }
}

/// A char-index range `start..end` into `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub field: SearchField,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub entity_id: EntityId,
    pub score: i64,
    pub spans: Vec<MatchSpan>,
}

#[derive(Debug, Clone)]
struct SearchText {
    field: SearchField,
    text: String,
    /// Lowercased char-by-char so char indices line up with `text`.
    folded: String,
    tokens: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
struct SearchDocument {
    entity_id: EntityId,
    texts: Vec<SearchText>,
}

#[derive(Debug, Clone, Copy)]
struct FieldHit {
    score: i64,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone)]
pub struct SearchIndex {
    documents: Vec<SearchDocument>,
    threshold: f64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl SearchIndex {
    /// An empty index. `threshold` is the minimum similarity in `0.0..=1.0` for a field to match.
    pub fn new(threshold: f64) -> Self {
        Self {
            documents: Vec::new(),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn build(model: &EntityModel, threshold: f64) -> Self {
        let mut index = Self::new(threshold);
        index.reindex(model);
        index
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Replaces every document with the interfaces and relationships of `model`.
    pub fn reindex(&mut self, model: &EntityModel) {
        let mut documents = Vec::new();

        for entity in model.entities() {
            let mut texts = vec![search_text(SearchField::Id, entity.id().as_str())];
            if let Some(display_name) = entity.display_name() {
                texts.push(search_text(SearchField::DisplayName, display_name));
            }

            match entity.kind() {
                EntityKind::Interface(_) => {
                    for name in model.outgoing_relationship_names(entity.id().as_str()) {
                        texts.push(search_text(SearchField::RelationshipName, name));
                    }
                }
                EntityKind::Relationship(info) => {
                    texts.push(search_text(SearchField::RelationshipName, &info.name));
                }
                _ => continue,
            }

            documents.push(SearchDocument {
                entity_id: entity.id().clone(),
                texts,
            });
        }

        self.documents = documents;
    }

    /// Ranked entity ids, best first. An empty or blank term matches nothing.
    pub fn filter(&self, term: &str) -> Vec<EntityId> {
        self.filter_with_matches(term)
            .into_iter()
            .map(|found| found.entity_id)
            .collect()
    }

    /// Ranked matches with spans for every matching field, best first. Ties keep index order.
    pub fn filter_with_matches(&self, term: &str) -> Vec<SearchMatch> {
        let needle = fold(term.trim());
        if needle.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(i64, usize, Vec<MatchSpan>)> = Vec::new();
        for (idx, document) in self.documents.iter().enumerate() {
            let mut best: Option<i64> = None;
            let mut spans = Vec::new();

            for text in &document.texts {
                let Some(hit) = self.score_text(&needle, text) else {
                    continue;
                };
                best = Some(best.map_or(hit.score, |score| score.max(hit.score)));
                spans.push(MatchSpan {
                    field: text.field,
                    text: text.text.clone(),
                    start: hit.start,
                    end: hit.end,
                });
            }

            if let Some(score) = best {
                ranked.push((score, idx, spans));
            }
        }

        ranked.sort_by(|(score_a, idx_a, _), (score_b, idx_b, _)| {
            score_b.cmp(score_a).then_with(|| idx_a.cmp(idx_b))
        });

        ranked
            .into_iter()
            .map(|(score, idx, spans)| SearchMatch {
                entity_id: self.documents[idx].entity_id.clone(),
                score,
                spans,
            })
            .collect()
    }

    fn score_text(&self, needle: &str, text: &SearchText) -> Option<FieldHit> {
        let haystack = &text.folded;
        let needle_len = needle.chars().count();

        let (quality, start, end) = if let Some(byte_idx) = haystack.find(needle) {
            let start = haystack[..byte_idx].chars().count();
            (1.0, start, start + needle_len)
        } else {
            let whole = rapidfuzz::fuzz::ratio(needle.chars(), haystack.chars());
            let mut best = (whole, 0, haystack.chars().count());
            for &(start, end) in &text.tokens {
                let token = haystack
                    .chars()
                    .skip(start)
                    .take(end - start)
                    .collect::<Vec<_>>();
                let ratio = rapidfuzz::fuzz::ratio(needle.chars(), token.iter().copied());
                if ratio > best.0 {
                    best = (ratio, start, end);
                }
            }
            best
        };

        if quality < self.threshold {
            return None;
        }

        let mut score = (quality * 1000.0).round() as i64;
        score += text.field.weight();
        score -= (start as i64) / 4;
        if start == 0 {
            score += 300;
        }
        if text.tokens.iter().any(|&(token_start, _)| token_start == start) {
            score += 200;
        }
        if haystack == needle {
            score += 1000;
        }

        Some(FieldHit { score, start, end })
    }
}

fn fold(value: &str) -> String {
    value
        .chars()
        .map(|ch| ch.to_lowercase().next().unwrap_or(ch))
        .collect()
}

fn search_text(field: SearchField, text: &str) -> SearchText {
    SearchText {
        field,
        text: text.to_owned(),
        folded: fold(text),
        tokens: tokenize(text),
    }
}

fn is_separator(ch: char) -> bool {
    matches!(ch, ':' | ';' | '_' | '-' | '.' | '/') || ch.is_whitespace()
}

/// Char ranges of the words in `text`, split on separators and camelCase boundaries.
fn tokenize(text: &str) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut prev: Option<char> = None;

    for (idx, ch) in text.chars().enumerate() {
        if is_separator(ch) {
            if let Some(token_start) = start.take() {
                tokens.push((token_start, idx));
            }
        } else {
            let camel_break = ch.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            match start {
                Some(token_start) if camel_break => {
                    tokens.push((token_start, idx));
                    start = Some(idx);
                }
                Some(_) => {}
                None => start = Some(idx),
            }
        }
        prev = Some(ch);
    }

    if let Some(token_start) = start {
        tokens.push((token_start, text.chars().count()));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::{tokenize, SearchField, SearchIndex, DEFAULT_THRESHOLD};
    use crate::model::fixtures::{eid, relationship, search_model};
    use crate::model::{Entity, EntityModel};

    #[fixture]
    fn index() -> SearchIndex {
        SearchIndex::build(&search_model(), DEFAULT_THRESHOLD)
    }

    #[test]
    fn tokenize_splits_separators_and_camel_case() {
        let text = "dtmi:cim:ConnectivityNode;1";
        let words = tokenize(text)
            .into_iter()
            .map(|(start, end)| text.chars().skip(start).take(end - start).collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(words, vec!["dtmi", "cim", "Connectivity", "Node", "1"]);
    }

    #[rstest]
    fn container_ranks_first_with_display_name_span(index: SearchIndex) {
        let results = index.filter("container");
        assert_eq!(results.first(), Some(&eid("dtmi:cim:ConnectivityNodeContainer;1")));
        assert!(!results.contains(&eid("dtmi:cim:Substation;1")));

        let matches = index.filter_with_matches("container");
        let top = &matches[0];
        let span = top
            .spans
            .iter()
            .find(|span| span.field == SearchField::DisplayName)
            .expect("display name span");
        assert_eq!(span.text, "ConnectivityNodeContainer");
        let matched = span.text.chars().skip(span.start).take(span.end - span.start);
        assert_eq!(matched.collect::<String>(), "Container");
    }

    #[rstest]
    fn interfaces_match_on_outgoing_relationship_names(index: SearchIndex) {
        let matches = index.filter_with_matches("EquipmentContainer");
        let equipment = matches
            .iter()
            .find(|found| found.entity_id == eid("dtmi:cim:Equipment;1"))
            .expect("equipment matched");
        assert!(equipment
            .spans
            .iter()
            .any(|span| span.field == SearchField::RelationshipName));
    }

    #[rstest]
    fn typos_still_match(index: SearchIndex) {
        let results = index.filter("substaton");
        assert_eq!(results.first(), Some(&eid("dtmi:cim:Substation;1")));
    }

    #[rstest]
    fn typo_span_covers_the_closest_token(index: SearchIndex) {
        let matches = index.filter_with_matches("substaton");
        let span = matches[0]
            .spans
            .iter()
            .find(|span| span.field == SearchField::Id)
            .expect("id span");
        let matched = span.text.chars().skip(span.start).take(span.end - span.start);
        assert_eq!(matched.collect::<String>(), "Substation");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_term_matches_nothing(index: SearchIndex, #[case] term: &str) {
        assert!(index.filter(term).is_empty());
        assert!(index.filter_with_matches(term).is_empty());
    }

    #[rstest]
    fn unrelated_term_matches_nothing(index: SearchIndex) {
        assert!(index.filter("zzzzqqq").is_empty());
    }

    #[test]
    fn equal_scores_keep_index_order() {
        let model = EntityModel::new([
            Entity::interface(eid("b_pump")),
            Entity::interface(eid("a_pump")),
        ]);
        let index = SearchIndex::build(&model, DEFAULT_THRESHOLD);
        assert_eq!(index.filter("pump"), vec![eid("a_pump"), eid("b_pump")]);
    }

    #[rstest]
    fn reindex_replaces_removed_entities(mut index: SearchIndex) {
        assert!(!index.filter("substation").is_empty());

        let model = EntityModel::new([
            Entity::interface(eid("dtmi:cim:Equipment;1")),
            relationship("rel", "feeds", "dtmi:cim:Equipment;1", None),
        ]);
        index.reindex(&model);

        assert!(index.filter("substation").is_empty());
        assert_eq!(index.len(), 2);
        assert_eq!(index.filter("feeds").len(), 2);
    }
}
