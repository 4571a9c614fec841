// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Orchestration of models, views and renders.
//!
//! [`ViewService`] owns the model registry (one [`ModelEntry`] per model id), the view/session
//! store, the render cache and the collaborators at the crate boundary (parser, renderer,
//! repository). Registering a model swaps its entry and clears the render cache under the same
//! write lock, so no request can pair a new search index with an old render.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::{Fingerprint, RenderCache};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::format::mermaid::{describe, GraphDescription};
use crate::model::{
    build_file_tree, DtdlPath, EntityId, EntityModel, ErrorCounts, ModelId, ModelVersion,
    OutputFormat, SessionId, SourceFile, ViewId, ViewState, ViewStateUpdate,
};
use crate::parse::{DtdlParser, ObjectModelParser, ParsedModel};
use crate::query::{compute_graph_view, compute_visible_graph, GraphView, SearchIndex, SearchMatch};
use crate::render::{DiagramRenderer, RenderError, RenderOutput, RenderedDiagram, VectorDiagram};
use crate::store::{InMemoryModelRepository, ModelRepository, StoreError, ViewKey, ViewStore};

/// Everything derived from one model version.
#[derive(Debug)]
pub struct ModelEntry {
    pub version: ModelVersion,
    pub model: Arc<EntityModel>,
    pub index: SearchIndex,
    pub file_tree: Vec<DtdlPath>,
}

pub struct ViewService {
    config: EngineConfig,
    models: RwLock<HashMap<ModelId, Arc<ModelEntry>>>,
    views: ViewStore,
    cache: RenderCache,
    renderer: Arc<dyn DiagramRenderer>,
    parser: Arc<dyn DtdlParser>,
    repository: Arc<dyn ModelRepository>,
}

impl std::fmt::Debug for ViewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewService")
            .field("config", &self.config)
            .field("views", &self.views)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ViewService {
    pub fn new(config: EngineConfig, renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            config,
            models: RwLock::new(HashMap::new()),
            views: ViewStore::new(),
            cache: RenderCache::from_config(&config),
            renderer,
            parser: Arc::new(ObjectModelParser),
            repository: Arc::new(InMemoryModelRepository::new()),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DtdlParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn ModelRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Installs `model` as the newest version of `model_id`.
    ///
    /// `sources` and their `error_counts` become the navigation tree. Replacing an existing
    /// model bumps the revision and clears the render cache before the new entry becomes
    /// visible.
    pub async fn register_model(
        &self,
        model_id: ModelId,
        model: EntityModel,
        sources: &[SourceFile],
        error_counts: &ErrorCounts,
    ) -> ModelVersion {
        let file_tree = build_file_tree(&model, sources, error_counts);
        let mut index = SearchIndex::new(self.config.search_threshold);
        index.reindex(&model);

        let mut models = self.models.write().await;
        let version = match models.get(&model_id) {
            Some(previous) => previous.version.next(),
            None => ModelVersion::new(model_id.clone(), 1),
        };
        let replaced = models.contains_key(&model_id);
        tracing::info!(
            model = %model_id,
            revision = version.revision,
            entities = model.len(),
            replaced,
            "registering model"
        );

        models.insert(
            model_id,
            Arc::new(ModelEntry {
                version: version.clone(),
                model: Arc::new(model),
                index,
                file_tree,
            }),
        );
        if replaced {
            self.cache.clear();
        }
        version
    }

    /// Parses and stores a new upload, then registers it.
    pub async fn upload_model(
        &self,
        model_id: ModelId,
        files: Vec<SourceFile>,
    ) -> Result<ModelVersion> {
        let parsed = self.parser.parse(&files)?;
        self.repository.insert(model_id.clone(), files);
        Ok(self.register_parsed(model_id, parsed).await)
    }

    /// Replaces the sources of a stored model and registers the result as a new revision.
    pub async fn edit_model(&self, model_id: &ModelId, files: Vec<SourceFile>) -> Result<ModelVersion> {
        let parsed = self.parser.parse(&files)?;
        self.repository.update_contents(model_id, files)?;
        Ok(self.register_parsed(model_id.clone(), parsed).await)
    }

    /// Re-registers a model from its stored sources.
    pub async fn load_model(&self, model_id: &ModelId) -> Result<ModelVersion> {
        let row = self.repository.get(model_id)?;
        let parsed = self.parser.parse(&row.contents)?;
        Ok(self.register_parsed(row.model_id, parsed).await)
    }

    async fn register_parsed(&self, model_id: ModelId, parsed: ParsedModel) -> ModelVersion {
        let ParsedModel {
            model,
            sources,
            error_counts,
        } = parsed;
        self.register_model(model_id, model, &sources, &error_counts).await
    }

    pub async fn model(&self, model_id: &ModelId) -> Result<Arc<ModelEntry>> {
        self.models
            .read()
            .await
            .get(model_id)
            .cloned()
            .ok_or_else(|| StoreError::ModelNotFound(model_id.clone()).into())
    }

    pub async fn open_view(&self, model_id: &ModelId) -> Result<ViewId> {
        self.model(model_id).await?;
        let id = self.views.create_view(model_id.clone(), ViewState::default());
        tracing::debug!(model = %model_id, view = %id, "opened view");
        Ok(id)
    }

    /// A session starts as a copy of the view's state and evolves independently.
    pub fn open_session(&self, view_id: &ViewId) -> Result<SessionId> {
        let id = self.views.create_session(view_id)?;
        tracing::debug!(view = %view_id, session = %id, "opened session");
        Ok(id)
    }

    pub fn view_state(&self, key: &ViewKey) -> Result<ViewState> {
        Ok(self.views.state(key)?)
    }

    /// Validates `update` and applies it; on error the stored state is unchanged.
    pub fn update_view(&self, key: &ViewKey, update: ViewStateUpdate) -> Result<ViewState> {
        self.views.update(key, |state| {
            state.apply(update)?;
            Ok(state.clone())
        })
    }

    /// Expands the owners of `id` and highlights it.
    pub async fn reveal(&self, key: &ViewKey, id: &EntityId) -> Result<ViewState> {
        let entry = self.entry_for(key).await?;
        self.views.update(key, |state| {
            state.reveal(&entry.model, id.as_str());
            state.highlight_node_id = Some(id.clone());
            Ok(state.clone())
        })
    }

    /// Expands every interface matched by the current search, and the owners of matched content.
    pub async fn expand_to_matches(&self, key: &ViewKey) -> Result<ViewState> {
        let entry = self.entry_for(key).await?;
        self.views.update(key, |state| {
            let matches = state
                .search_term()
                .map(|term| entry.index.filter(term))
                .unwrap_or_default();
            state.expand_to_matches(&entry.model, &matches);
            Ok(state.clone())
        })
    }

    pub async fn search(&self, model_id: &ModelId, term: &str) -> Result<Vec<SearchMatch>> {
        Ok(self.model(model_id).await?.index.filter_with_matches(term))
    }

    pub async fn graph_view(&self, key: &ViewKey) -> Result<GraphView<'static>> {
        let state = self.views.state(key)?;
        let entry = self.entry_for(key).await?;
        Ok(compute_graph_view(&entry.model, &entry.index, &entry.file_tree, &state).into_owned())
    }

    pub async fn describe(&self, key: &ViewKey) -> Result<GraphDescription> {
        let state = self.views.state(key)?;
        let entry = self.entry_for(key).await?;
        let graph = compute_visible_graph(&entry.model, &entry.index, &state);
        Ok(describe(&entry.model, &graph))
    }

    /// Filter, describe, render and post-process the view, through the render cache.
    pub async fn render(&self, key: &ViewKey, format: OutputFormat) -> Result<Arc<RenderedDiagram>> {
        let mut state = self.views.state(key)?;
        let entry = self.entry_for(key).await?;
        // Highlight is applied client-side through the stamped entity ids.
        state.highlight_node_id = None;

        let fingerprint = Fingerprint::new(&entry.version, &state, format);
        let renderer = Arc::clone(&self.renderer);
        let diagram = self
            .cache
            .get_or_render(fingerprint, move || {
                render_pipeline(renderer, entry, state, format)
            })
            .await?;
        Ok(diagram)
    }

    async fn entry_for(&self, key: &ViewKey) -> Result<Arc<ModelEntry>> {
        let record = self.views.get(key)?;
        self.model(&record.model_id).await
    }
}

async fn render_pipeline(
    renderer: Arc<dyn DiagramRenderer>,
    entry: Arc<ModelEntry>,
    state: ViewState,
    format: OutputFormat,
) -> std::result::Result<RenderedDiagram, RenderError> {
    let graph = compute_visible_graph(&entry.model, &entry.index, &state);
    let description = describe(&entry.model, &graph);

    match renderer.render(&description.text, state.layout, format).await? {
        RenderOutput::Text(text) => Ok(RenderedDiagram::Text(text)),
        RenderOutput::Vector(bytes) => {
            let mut diagram = VectorDiagram::ingest(&bytes)?;
            diagram.annotate(&description);
            Ok(RenderedDiagram::Vector(diagram))
        }
    }
}
