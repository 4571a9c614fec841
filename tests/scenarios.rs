// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use twinview::model::{
    has_file_tree_errors, DiagramType, DtdlPath, EntityId, ModelId, OutputFormat, SourceFile,
    ViewStateUpdate,
};
use twinview::query::SearchField;
use twinview::render::TextRenderer;
use twinview::store::ViewKey;
use twinview::{EngineConfig, ViewService};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("object_models")
}

fn read_fixture(name: &str) -> SourceFile {
    let path = fixtures_dir().join(name);
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path:?}: {err}"));
    SourceFile::new(name, contents)
}

fn ids(values: &[&str]) -> BTreeSet<EntityId> {
    values
        .iter()
        .map(|value| EntityId::new(*value).expect("entity id"))
        .collect()
}

async fn open(fixture: &str) -> (ViewService, ModelId, ViewKey) {
    let service = ViewService::new(EngineConfig::default(), Arc::new(TextRenderer));
    let model_id = ModelId::new("scenario").expect("model id");
    service
        .upload_model(model_id.clone(), vec![read_fixture(fixture)])
        .await
        .unwrap_or_else(|err| panic!("{fixture} failed to load: {err}"));
    let view = service.open_view(&model_id).await.expect("open view");
    (service, model_id, ViewKey::View(view))
}

#[tokio::test]
async fn unexpanded_view_shows_interfaces_and_their_relationships() {
    let (service, _, key) = open("three_interfaces.json").await;

    let view = service.graph_view(&key).await.expect("graph view");

    assert_eq!(view.graph.nodes, ids(&["first", "second", "third"]));
    assert_eq!(view.graph.edges, ids(&["relFirstSecond"]));
    assert!(view.graph.dangling_edges.is_empty());

    let again = service.graph_view(&key).await.expect("graph view");
    assert_eq!(view, again);
}

#[tokio::test]
async fn container_search_ranks_the_container_first() {
    let (service, model_id, _) = open("cim_search.json").await;

    let matches = service
        .search(&model_id, "container")
        .await
        .expect("search");

    let top = matches.first().expect("at least one match");
    assert_eq!(top.entity_id.as_str(), "dtmi:cim:ConnectivityNodeContainer;1");
    let span = top
        .spans
        .iter()
        .find(|span| span.field == SearchField::DisplayName)
        .expect("display name span");
    assert!(span.start < span.end);
    assert!(span.end <= span.text.chars().count());
}

#[tokio::test]
async fn search_hits_are_marked_but_not_expanded() {
    let (service, _, key) = open("cim_search.json").await;
    let update = ViewStateUpdate {
        search: Some("container".to_owned()),
        ..ViewStateUpdate::default()
    };
    let state = service.update_view(&key, update).expect("update");
    assert!(state.expanded_ids.is_empty());

    let view = service.graph_view(&key).await.expect("graph view");
    assert!(view
        .graph
        .is_search_hit("dtmi:cim:ConnectivityNodeContainer;1"));
    assert!(!view.graph.is_search_hit("dtmi:cim:Substation;1"));
}

#[tokio::test]
async fn dangling_relationships_are_kept_as_edges() {
    let (service, _, key) = open("dangling.json").await;

    let view = service.graph_view(&key).await.expect("graph view");
    assert!(view.graph.edges.contains("relDangling"));
    assert!(view.graph.is_dangling("relDangling"));

    let description = service.describe(&key).await.expect("describe");
    assert!(description.text.contains("invalid"), "{}", description.text);
}

#[tokio::test]
async fn cyclic_extends_terminates_with_each_interface_once() {
    let (service, _, key) = open("cyclic_extends.json").await;
    let update = ViewStateUpdate {
        expand: vec!["a".to_owned()],
        ..ViewStateUpdate::default()
    };
    service.update_view(&key, update).expect("update");

    let view = service.graph_view(&key).await.expect("graph view");
    assert_eq!(view.graph.nodes, ids(&["a", "a_level", "b"]));
    assert_eq!(
        view.graph.contents.get("a").map(Vec::len),
        Some(1),
        "{:?}",
        view.graph.contents
    );

    let update = ViewStateUpdate {
        diagram_type: Some(DiagramType::ClassDiagram),
        ..ViewStateUpdate::default()
    };
    service.update_view(&key, update).expect("update");
    let description = service.describe(&key).await.expect("describe");
    assert!(description.text.starts_with("classDiagram\n"));
    assert!(description.text.contains("+level"), "{}", description.text);
}

#[tokio::test]
async fn editing_a_model_invalidates_renders() {
    let (service, model_id, key) = open("three_interfaces.json").await;

    let before = service.render(&key, OutputFormat::Text).await.expect("render");
    assert!(before.as_text().is_some_and(|text| text.contains("third")));

    service
        .edit_model(&model_id, vec![read_fixture("dangling.json")])
        .await
        .expect("edit");
    assert!(service.cache().is_empty());

    let after = service.render(&key, OutputFormat::Text).await.expect("render");
    let text = after.as_text().expect("text output");
    assert!(!text.contains("third"), "{text}");
    assert!(text.contains("invalid"), "{text}");
}

#[tokio::test]
async fn file_tree_mirrors_sources_and_surfaces_errors() {
    let service = ViewService::new(EngineConfig::default(), Arc::new(TextRenderer));
    let model_id = ModelId::new("tree").expect("model id");
    let files = vec![
        read_fixture("three_interfaces.json"),
        SourceFile::new(
            "models/core.json",
            r#"[{ "@id": "first" }, { "@id": "second" }, { "@id": "fourth" }]"#,
        ),
        SourceFile::new("models/broken.json", "{ not json"),
        SourceFile::new("third.json", r#"{ "@id": "third" }"#),
    ];
    service
        .upload_model(model_id.clone(), files)
        .await
        .expect("upload");
    let key = ViewKey::View(service.open_view(&model_id).await.expect("open view"));

    let tree = service.graph_view(&key).await.expect("graph view").file_tree;

    assert!(has_file_tree_errors(&tree));
    let names = tree.iter().map(DtdlPath::name).collect::<Vec<_>>();
    assert_eq!(names, vec!["models", "third.json"]);
    assert!(tree[0].has_errors());
    assert!(!tree[1].has_errors());

    let file = |name: &str| {
        tree[0]
            .entries()
            .iter()
            .find(|entry| entry.name() == name)
            .cloned()
            .unwrap_or_else(|| panic!("{name} missing from {tree:?}"))
    };
    let DtdlPath::File {
        error_count,
        entries,
        ..
    } = file("core.json")
    else {
        panic!("core.json is not a file");
    };
    assert_eq!(error_count, 1);
    assert_eq!(entries.len(), 2);
    assert!(file("broken.json").has_errors());
}

#[tokio::test]
async fn sessions_do_not_leak_into_their_view() {
    let (service, _, key) = open("three_interfaces.json").await;
    let ViewKey::View(view_id) = &key else {
        unreachable!()
    };
    let session = ViewKey::Session(service.open_session(view_id).expect("open session"));

    let update = ViewStateUpdate {
        expand: vec!["first".to_owned()],
        ..ViewStateUpdate::default()
    };
    service.update_view(&session, update).expect("update");

    assert!(service.view_state(&session).expect("state").is_expanded("first"));
    assert!(service.view_state(&key).expect("state").expanded_ids.is_empty());
}
