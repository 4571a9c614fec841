// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Twinview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Twinview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural validation and decomposition of rendered vector diagrams.
//!
//! A diagram is parsed twice into owned element trees: the primary copy is wired up for
//! interaction (attributes, classes) while the minimap copy stays exactly as rendered.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::format::mermaid::GraphDescription;

pub const NODE_GROUP_CLASS: &str = "nodes";
pub const EDGE_GROUP_CLASS: &str = "edges";
pub const LEGACY_EDGE_GROUP_CLASS: &str = "edgePaths";
pub const EDGE_LABEL_GROUP_CLASS: &str = "edgeLabels";

pub const ENTITY_ID_ATTR: &str = "data-entity-id";
pub const EDGE_INDEX_ATTR: &str = "data-edge-index";
pub const SEARCH_HIT_CLASS: &str = "search-hit";
pub const HIGHLIGHTED_CLASS: &str = "highlighted";

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("invalid svg document: {0}")]
    Xml(String),
    #[error("root element must be <svg>, found <{found}>")]
    NotSvg { found: String },
    #[error("missing <g class=\"{group}\"> group")]
    MissingGroup { group: &'static str },
    #[error("edge/label count mismatch: {edges} edges vs {labels} labels")]
    EdgeLabelMismatch { edges: usize, labels: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
}

/// Owned element with attributes in document order.
///
/// Attribute and element names keep their namespace prefix (`xlink:href`); namespace
/// declarations are kept as plain `xmlns`/`xmlns:*` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<SvgNode>,
}

impl SvgElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find_map(|(name, value)| (name == key).then_some(value.as_str()))
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((key.to_owned(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(name, _)| name == key)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|candidate| candidate == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attr("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let kept = self
            .classes()
            .filter(|candidate| *candidate != class)
            .collect::<Vec<_>>()
            .join(" ");
        if kept.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", kept);
        }
    }

    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    pub fn children(&self) -> &[SvgNode] {
        &self.children
    }

    pub fn push_child(&mut self, child: SvgNode) {
        self.children.push(child);
    }

    pub fn element_children(&self) -> impl Iterator<Item = &SvgElement> {
        self.children.iter().filter_map(|child| match child {
            SvgNode::Element(element) => Some(element),
            SvgNode::Text(_) => None,
        })
    }

    pub fn element_children_mut(&mut self) -> impl Iterator<Item = &mut SvgElement> {
        self.children.iter_mut().filter_map(|child| match child {
            SvgNode::Element(element) => Some(element),
            SvgNode::Text(_) => None,
        })
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                SvgNode::Element(element) => element.collect_text(out),
                SvgNode::Text(text) => out.push_str(text),
            }
        }
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let _ = write!(out, " {key}=\"{}\"", escape_xml(value, true));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                SvgNode::Element(element) => element.write_to(out),
                SvgNode::Text(text) => out.push_str(&escape_xml(text, false)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Child indices (into `children`) leading to the first `g` carrying `class`, depth-first.
    fn find_group(&self, class: &str) -> Option<Vec<usize>> {
        for (idx, child) in self.children.iter().enumerate() {
            let SvgNode::Element(element) = child else {
                continue;
            };
            if element.name == "g" && element.has_class(class) {
                return Some(vec![idx]);
            }
            if let Some(mut path) = element.find_group(class) {
                path.insert(0, idx);
                return Some(path);
            }
        }
        None
    }

    fn at_path(&self, path: &[usize]) -> Option<&SvgElement> {
        let mut current = self;
        for idx in path {
            current = match current.children.get(*idx)? {
                SvgNode::Element(element) => element,
                SvgNode::Text(_) => return None,
            };
        }
        Some(current)
    }

    fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut SvgElement> {
        let mut current = self;
        for idx in path {
            current = match current.children.get_mut(*idx)? {
                SvgNode::Element(element) => element,
                SvgNode::Text(_) => return None,
            };
        }
        Some(current)
    }
}

fn escape_xml(text: &str, attr: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            ch => out.push(ch),
        }
    }
    out
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NS) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri).filter(|prefix| !prefix.is_empty()),
        None => None,
    };
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_owned(),
    }
}

fn build_element(node: roxmltree::Node<'_, '_>) -> SvgElement {
    let tag = node.tag_name();
    let mut element = SvgElement::new(qualified_name(node, tag.namespace(), tag.name()));

    let parent = node.parent_element();
    for ns in node.namespaces() {
        if ns.name() == Some("xml") {
            continue;
        }
        let inherited = parent.is_some_and(|parent| {
            parent
                .namespaces()
                .any(|other| other.name() == ns.name() && other.uri() == ns.uri())
        });
        if inherited {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_owned(),
        };
        element.attrs.push((key, ns.uri().to_owned()));
    }

    for attr in node.attributes() {
        let key = qualified_name(node, attr.namespace(), attr.name());
        element.attrs.push((key, attr.value().to_owned()));
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(SvgNode::Element(build_element(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(SvgNode::Text(text.to_owned()));
            }
        }
    }
    element
}

fn parse_tree(text: &str) -> Result<SvgElement, StructuralError> {
    let doc = roxmltree::Document::parse(text).map_err(|err| StructuralError::Xml(err.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(StructuralError::NotSvg {
            found: root.tag_name().name().to_owned(),
        });
    }
    Ok(build_element(root))
}

fn viewbox_separator() -> Option<&'static Regex> {
    static ONCE: OnceLock<Option<Regex>> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"[\s,]+").ok()).as_ref()
}

/// `(width, height)` from a `viewBox` value of exactly four numbers.
pub fn parse_viewbox(value: &str) -> Option<(f64, f64)> {
    let parts = viewbox_separator()?
        .split(value.trim())
        .map(|part| part.parse::<f64>().ok().filter(|number| number.is_finite()))
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [_, _, width, height] => Some((*width, *height)),
        _ => None,
    }
}

/// A validated vector diagram with addressable node, edge and edge-label groups.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDiagram {
    root: SvgElement,
    minimap: SvgElement,
    raw_size: Option<(f64, f64)>,
    node_group: Vec<usize>,
    edge_group: Vec<usize>,
    edge_label_group: Vec<usize>,
}

impl VectorDiagram {
    pub fn ingest(bytes: &[u8]) -> Result<Self, StructuralError> {
        let text = std::str::from_utf8(bytes).map_err(|err| StructuralError::Xml(err.to_string()))?;
        let root = parse_tree(text)?;

        let node_group = root
            .find_group(NODE_GROUP_CLASS)
            .ok_or(StructuralError::MissingGroup {
                group: NODE_GROUP_CLASS,
            })?;
        let edge_group = root
            .find_group(EDGE_GROUP_CLASS)
            .or_else(|| root.find_group(LEGACY_EDGE_GROUP_CLASS))
            .ok_or(StructuralError::MissingGroup {
                group: EDGE_GROUP_CLASS,
            })?;
        let edge_label_group =
            root.find_group(EDGE_LABEL_GROUP_CLASS)
                .ok_or(StructuralError::MissingGroup {
                    group: EDGE_LABEL_GROUP_CLASS,
                })?;

        let count = |path: &[usize]| {
            root.at_path(path)
                .map_or(0, |group| group.element_children().count())
        };
        let (edges, labels) = (count(&edge_group), count(&edge_label_group));
        if edges != labels {
            tracing::warn!(edges, labels, "rendered diagram has unpaired edge labels");
            return Err(StructuralError::EdgeLabelMismatch { edges, labels });
        }

        let raw_size = root.attr("viewBox").and_then(parse_viewbox);
        let minimap = parse_tree(text)?;

        Ok(Self {
            root,
            minimap,
            raw_size,
            node_group,
            edge_group,
            edge_label_group,
        })
    }

    pub fn raw_size(&self) -> Option<(f64, f64)> {
        self.raw_size
    }

    pub fn raw_width(&self) -> Option<f64> {
        self.raw_size.map(|(width, _)| width)
    }

    pub fn raw_height(&self) -> Option<f64> {
        self.raw_size.map(|(_, height)| height)
    }

    pub fn root(&self) -> &SvgElement {
        &self.root
    }

    pub fn minimap(&self) -> &SvgElement {
        &self.minimap
    }

    fn group(&self, path: &[usize]) -> impl Iterator<Item = &SvgElement> {
        self.root
            .at_path(path)
            .into_iter()
            .flat_map(SvgElement::element_children)
    }

    fn group_item_mut(&mut self, path: &[usize], index: usize) -> Option<&mut SvgElement> {
        self.root
            .at_path_mut(path)?
            .element_children_mut()
            .nth(index)
    }

    pub fn node_count(&self) -> usize {
        self.group(&self.node_group).count()
    }

    pub fn edge_count(&self) -> usize {
        self.group(&self.edge_group).count()
    }

    /// Node elements in document order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &SvgElement)> {
        self.group(&self.node_group).enumerate()
    }

    /// `(index, edge, label)` triples; the Nth edge pairs with the Nth label.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &SvgElement, &SvgElement)> {
        self.group(&self.edge_group)
            .zip(self.group(&self.edge_label_group))
            .enumerate()
            .map(|(index, (edge, label))| (index, edge, label))
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut SvgElement> {
        let path = self.node_group.clone();
        self.group_item_mut(&path, index)
    }

    pub fn edge_mut(&mut self, index: usize) -> Option<&mut SvgElement> {
        let path = self.edge_group.clone();
        self.group_item_mut(&path, index)
    }

    pub fn edge_label_mut(&mut self, index: usize) -> Option<&mut SvgElement> {
        let path = self.edge_label_group.clone();
        self.group_item_mut(&path, index)
    }

    pub fn to_svg_string(&self) -> String {
        self.root.to_svg_string()
    }

    pub fn minimap_svg_string(&self) -> String {
        self.minimap.to_svg_string()
    }

    /// Stamps entity ids, edge indices and search/highlight classes on the primary copy.
    ///
    /// Returns the number of node elements that could be traced back to an entity.
    pub fn annotate(&mut self, description: &GraphDescription) -> usize {
        let by_ident = description
            .node_ids
            .iter()
            .map(|(entity_id, ident)| (ident.as_str(), entity_id.as_str().to_owned()))
            .collect::<HashMap<_, _>>();

        let mut matched = 0;
        for index in 0..self.node_count() {
            let Some(node) = self.node_mut(index) else {
                continue;
            };
            let Some(ident) = node.attr("id").and_then(|id| resolve_ident(id, &by_ident)) else {
                continue;
            };
            if let Some(entity_id) = by_ident.get(ident.as_str()) {
                node.set_attr(ENTITY_ID_ATTR, entity_id.as_str());
                matched += 1;
            }
            node.toggle_class(SEARCH_HIT_CLASS, description.search_hits.contains(&ident));
            node.toggle_class(
                HIGHLIGHTED_CLASS,
                description.highlighted.as_deref() == Some(ident.as_str()),
            );
        }

        for (index, described) in description.edges.iter().enumerate() {
            let entity_id = described.entity_id().as_str();
            if let Some(edge) = self.edge_mut(index) {
                stamp_edge(edge, index, entity_id);
            }
            if let Some(label) = self.edge_label_mut(index) {
                stamp_edge(label, index, entity_id);
            }
        }

        tracing::debug!(
            matched,
            nodes = self.node_count(),
            edges = description.edges.len(),
            "annotated rendered diagram"
        );
        matched
    }
}

fn stamp_edge(element: &mut SvgElement, index: usize, entity_id: &str) {
    element.set_attr(EDGE_INDEX_ATTR, index.to_string());
    element.set_attr(ENTITY_ID_ATTR, entity_id);
}

/// Maps a rendered element id (`flowchart-<ident>-<n>`, `classId-<ident>-<n>` or the bare
/// identifier) back to the identifier used in the description.
fn resolve_ident(element_id: &str, known: &HashMap<&str, String>) -> Option<String> {
    if known.contains_key(element_id) {
        return Some(element_id.to_owned());
    }
    let stripped = element_id
        .strip_prefix("flowchart-")
        .or_else(|| element_id.strip_prefix("classId-"))?;
    let ident = match stripped.rsplit_once('-') {
        Some((ident, counter)) if counter.chars().all(|ch| ch.is_ascii_digit()) => ident,
        _ => stripped,
    };
    Some(ident.to_owned())
}
