// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Twinview CLI entrypoint.
//!
//! Loads a resolved object model and prints what a view of it would show: the visible graph,
//! the graph description handed to a renderer, or the navigation tree of the source files.
//!
//! Logging goes to stderr and is controlled by `TWINVIEW_LOG` (default `warn`).

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use twinview::model::{DiagramType, Layout, ModelId, SourceFile, ViewStateUpdate};
use twinview::render::TextRenderer;
use twinview::store::ViewKey;
use twinview::{EngineConfig, ViewService};

const LOG_ENV: &str = "TWINVIEW_LOG";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <object-model.json> [--sources <dir>] [--expand <id>]... [--search <term>]\n      [--diagram flowchart|classDiagram] [--layout dagre-d3|elk] [--output graph|description|tree]\n\n--sources reads every *.json DTDL source below <dir> for the file tree (default: the object model file).\n--expand may be repeated. --output defaults to `graph`."
    );
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    #[default]
    Graph,
    Description,
    Tree,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    model_path: Option<String>,
    sources_dir: Option<String>,
    expand: Vec<String>,
    search: Option<String>,
    diagram: Option<String>,
    layout: Option<String>,
    output: OutputKind,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();
    let mut output_seen = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sources" => {
                if options.sources_dir.is_some() {
                    return Err(());
                }
                options.sources_dir = Some(args.next().ok_or(())?);
            }
            "--expand" => options.expand.push(args.next().ok_or(())?),
            "--search" => {
                if options.search.is_some() {
                    return Err(());
                }
                options.search = Some(args.next().ok_or(())?);
            }
            "--diagram" => {
                if options.diagram.is_some() {
                    return Err(());
                }
                options.diagram = Some(args.next().ok_or(())?);
            }
            "--layout" => {
                if options.layout.is_some() {
                    return Err(());
                }
                options.layout = Some(args.next().ok_or(())?);
            }
            "--output" => {
                if output_seen {
                    return Err(());
                }
                output_seen = true;
                options.output = match args.next().ok_or(())?.as_str() {
                    "graph" => OutputKind::Graph,
                    "description" => OutputKind::Description,
                    "tree" => OutputKind::Tree,
                    _ => return Err(()),
                };
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.model_path.is_some() {
                    return Err(());
                }
                options.model_path = Some(arg);
            }
        }
    }

    if options.model_path.is_none() {
        return Err(());
    }

    Ok(options)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Every `*.json` below `root`, with `/`-separated paths relative to it.
fn read_sources(root: &Path) -> std::io::Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let display = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(SourceFile::new(display, std::fs::read_to_string(&path)?));
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

async fn run(options: CliOptions) -> Result<String, Box<dyn Error>> {
    let model_path = options.model_path.unwrap_or_default();
    let model_file = SourceFile::new(model_path.clone(), std::fs::read_to_string(&model_path)?);
    let mut files = match &options.sources_dir {
        Some(dir) => read_sources(Path::new(dir))?,
        None => Vec::new(),
    };
    files.retain(|file| !file.is_object_model());
    files.push(model_file);

    let service = ViewService::new(EngineConfig::from_env(), Arc::new(TextRenderer));
    let model_id = ModelId::new("cli")?;
    service.upload_model(model_id.clone(), files).await?;
    let key = ViewKey::View(service.open_view(&model_id).await?);

    let update = ViewStateUpdate {
        layout: options.layout.as_deref().map(str::parse::<Layout>).transpose()?,
        diagram_type: options.diagram.as_deref().map(str::parse::<DiagramType>).transpose()?,
        search: options.search,
        expand: options.expand,
        ..ViewStateUpdate::default()
    };
    service.update_view(&key, update)?;

    let out = match options.output {
        OutputKind::Graph => serde_json::to_string_pretty(&service.graph_view(&key).await?)?,
        OutputKind::Description => service.describe(&key).await?.text,
        OutputKind::Tree => {
            serde_json::to_string_pretty(&service.graph_view(&key).await?.file_tree)?
        }
    };
    Ok(out)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "twinview".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let out = runtime.block_on(run(options))?;
        println!("{out}");
        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("twinview: {err}");
        std::process::exit(1);
    }
}
