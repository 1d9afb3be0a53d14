//! GraphML witness graphs.
//!
//! A [`WitnessGraph`] is the attributed directed graph exactly as written by
//! the producer. [`WitnessGraph::into_linear`] checks that it describes one
//! execution (one entry node, one violation node, one simple path between
//! them) and returns a [`LinearWitness`], the only type assumptions can be
//! read from.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use polywit_lang::SourceLanguage;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{StructureError, WitnessError};
use crate::model::{file_identifier, Position};

/// Attribute names used by SV-COMP witnesses.
pub mod keys {
    pub const ENTRY: &str = "isEntryNode";
    pub const VIOLATION: &str = "isViolationNode";
    pub const ASSUMPTION: &str = "assumption";
    pub const ASSUMPTION_SCOPE: &str = "assumption.scope";
    pub const ORIGIN_FILE: &str = "originFileName";
    pub const START_LINE: &str = "startline";
    pub const PRODUCER: &str = "producer";
    pub const WITNESS_TYPE: &str = "witness-type";
    pub const SOURCE_LANGUAGE: &str = "sourcecodelang";

    pub const VIOLATION_WITNESS: &str = "violation_witness";
}

/// Producers write assumptions such as `s.equals("<a>")` without escaping.
const UNESCAPED_ANGLES: &str = r#"\("(.*)<(.*)>(.*)"\)"#;
const ESCAPED_ANGLES: &str = r#"("${1}&lt;${2}&gt;${3}")"#;

/// Escapes `<`/`>` inside `("...")` so the document parses as XML.
pub fn sanitize(text: &str) -> Result<Cow<'_, str>, WitnessError> {
    let pattern = Regex::new(UNESCAPED_ANGLES).map_err(|source| WitnessError::Pattern {
        name: "unescaped-angles",
        source,
    })?;
    Ok(pattern.replace_all(text, ESCAPED_ANGLES))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessNode {
    pub id: String,
    pub data: IndexMap<String, String>,
}

impl WitnessNode {
    pub fn flag(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(|v| parse_bool(v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessEdge {
    pub source: usize,
    pub target: usize,
    pub data: IndexMap<String, String>,
}

impl WitnessEdge {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

#[derive(Debug)]
struct KeyDecl {
    name: String,
    domain: String,
    default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WitnessGraph {
    origin: String,
    attributes: IndexMap<String, String>,
    nodes: Vec<WitnessNode>,
    edges: Vec<WitnessEdge>,
    outgoing: Vec<Vec<usize>>,
}

impl WitnessGraph {
    /// Reads, sanitizes and parses a GraphML witness file.
    pub fn load(path: &Path) -> Result<Self, WitnessError> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| WitnessError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::from_graphml(&text, &origin)
    }

    pub fn from_graphml(text: &str, origin: &str) -> Result<Self, WitnessError> {
        let sanitized = sanitize(text)?;
        let doc = roxmltree::Document::parse(&sanitized).map_err(|source| WitnessError::Xml {
            origin: origin.to_owned(),
            source,
        })?;
        let root = doc.root_element();
        if root.tag_name().name() != "graphml" {
            return Err(WitnessError::format(
                origin,
                format!("expected <graphml> root element, found <{}>", root.tag_name().name()),
            ));
        }

        let mut keys = IndexMap::new();
        for key in root.children().filter(|n| is_element(n, "key")) {
            let id = key
                .attribute("id")
                .ok_or_else(|| WitnessError::format(origin, "<key> element without id"))?;
            let default = key
                .children()
                .find(|n| is_element(n, "default"))
                .map(|n| n.text().unwrap_or_default().trim().to_owned());
            keys.insert(
                id.to_owned(),
                KeyDecl {
                    name: key.attribute("attr.name").unwrap_or(id).to_owned(),
                    domain: key.attribute("for").unwrap_or("all").to_owned(),
                    default,
                },
            );
        }

        let graph = root
            .children()
            .find(|n| is_element(n, "graph"))
            .ok_or_else(|| WitnessError::format(origin, "no <graph> element"))?;

        let mut witness = WitnessGraph {
            origin: origin.to_owned(),
            attributes: collect_data(graph, "graph", &keys),
            nodes: Vec::new(),
            edges: Vec::new(),
            outgoing: Vec::new(),
        };
        let mut index: IndexMap<String, usize> = IndexMap::new();

        for node in graph.children().filter(|n| is_element(n, "node")) {
            let id = node
                .attribute("id")
                .ok_or_else(|| WitnessError::format(origin, "<node> element without id"))?;
            if index.contains_key(id) {
                return Err(WitnessError::format(origin, format!("duplicate node id '{id}'")));
            }
            index.insert(id.to_owned(), witness.nodes.len());
            witness.nodes.push(WitnessNode {
                id: id.to_owned(),
                data: collect_data(node, "node", &keys),
            });
        }

        for edge in graph.children().filter(|n| is_element(n, "edge")) {
            let (Some(source), Some(target)) = (edge.attribute("source"), edge.attribute("target"))
            else {
                return Err(WitnessError::format(
                    origin,
                    "<edge> element without source or target",
                ));
            };
            let source = witness.node_index(&mut index, source, &keys);
            let target = witness.node_index(&mut index, target, &keys);
            witness.edges.push(WitnessEdge {
                source,
                target,
                data: collect_data(edge, "edge", &keys),
            });
        }

        witness.outgoing = vec![Vec::new(); witness.nodes.len()];
        for (i, edge) in witness.edges.iter().enumerate() {
            witness.outgoing[edge.source].push(i);
        }
        debug!(
            witness = %witness.origin,
            nodes = witness.nodes.len(),
            edges = witness.edges.len(),
            "loaded witness graph"
        );
        Ok(witness)
    }

    /// Edges may name nodes that were never declared; those are added with
    /// default data only.
    fn node_index(
        &mut self,
        index: &mut IndexMap<String, usize>,
        id: &str,
        keys: &IndexMap<String, KeyDecl>,
    ) -> usize {
        if let Some(&i) = index.get(id) {
            return i;
        }
        let mut data = IndexMap::new();
        apply_defaults(&mut data, "node", keys);
        let i = self.nodes.len();
        self.nodes.push(WitnessNode {
            id: id.to_owned(),
            data,
        });
        index.insert(id.to_owned(), i);
        i
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn producer(&self) -> Option<&str> {
        self.attribute(keys::PRODUCER)
    }

    pub fn witness_type(&self) -> Option<&str> {
        self.attribute(keys::WITNESS_TYPE)
    }

    pub fn source_language(&self) -> Option<&str> {
        self.attribute(keys::SOURCE_LANGUAGE)
    }

    pub fn nodes(&self) -> &[WitnessNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WitnessEdge] {
        &self.edges
    }

    fn structure(&self, err: StructureError) -> WitnessError {
        WitnessError::structure(self.origin.clone(), err)
    }

    /// Checks `witness-type` and `sourcecodelang`. Missing attributes only
    /// produce warnings.
    pub fn check_attributes(&self, expected: SourceLanguage) -> Result<(), WitnessError> {
        match self.witness_type() {
            None => warn!(witness = %self.origin, "witness type is not specified"),
            Some(kind) if kind.trim() == keys::VIOLATION_WITNESS => {}
            Some(kind) => {
                return Err(self.structure(StructureError::UnsupportedWitnessType(kind.to_owned())))
            }
        }
        match self.source_language() {
            None => warn!(witness = %self.origin, "witness source code language is not specified"),
            Some(tag) if expected.matches_witness_tag(tag) => {}
            Some(tag) if SourceLanguage::ALL.iter().any(|l| l.matches_witness_tag(tag)) => warn!(
                witness = %self.origin,
                declared = tag,
                selected = %expected,
                "witness source language differs from the selected frontend"
            ),
            Some(tag) => {
                return Err(self.structure(StructureError::UnsupportedLanguage(tag.to_owned())))
            }
        }
        Ok(())
    }

    fn flagged(&self, key: &str) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.flag(key))
            .map(|(i, _)| i)
            .collect()
    }

    /// Checks the linearity invariant and returns the edge indices of the
    /// unique entry-to-violation path.
    pub fn validate_linear(&self) -> Result<Vec<usize>, WitnessError> {
        let entries = self.flagged(keys::ENTRY);
        if entries.len() != 1 {
            return Err(self.structure(StructureError::EntryNodeCount(entries.len())));
        }
        let violations = self.flagged(keys::VIOLATION);
        match violations.len() {
            0 => return Err(self.structure(StructureError::NoViolationNode)),
            1 => {}
            n => return Err(self.structure(StructureError::ViolationNodeCount(n))),
        }
        let (count, path) = self.simple_paths(entries[0], violations[0]);
        match count {
            0 => Err(self.structure(StructureError::Unreachable)),
            1 => Ok(path),
            _ => Err(self.structure(StructureError::MultiplePaths)),
        }
    }

    pub fn into_linear(self) -> Result<LinearWitness, WitnessError> {
        let path = self.validate_linear()?;
        Ok(LinearWitness { graph: self, path })
    }

    /// Counts simple paths from `from` to `to`, stopping at two, and returns
    /// the edges of the first one found.
    fn simple_paths(&self, from: usize, to: usize) -> (usize, Vec<usize>) {
        if from == to {
            return (1, Vec::new());
        }
        let mut on_path = vec![false; self.nodes.len()];
        on_path[from] = true;
        let mut frames: Vec<(usize, usize)> = vec![(from, 0)];
        let mut edge_stack: Vec<usize> = Vec::new();
        let mut found = 0;
        let mut first: Option<Vec<usize>> = None;

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;
            let Some(&edge) = self.outgoing[node].get(frame.1) else {
                on_path[node] = false;
                frames.pop();
                edge_stack.pop();
                continue;
            };
            frame.1 += 1;
            let next = self.edges[edge].target;
            if next == to {
                found += 1;
                if first.is_none() {
                    let mut path = edge_stack.clone();
                    path.push(edge);
                    first = Some(path);
                }
                if found > 1 {
                    break;
                }
            } else if !on_path[next] {
                on_path[next] = true;
                edge_stack.push(edge);
                frames.push((next, 0));
            }
        }
        (found, first.unwrap_or_default())
    }
}

fn is_element(node: &roxmltree::Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn collect_data(
    element: roxmltree::Node<'_, '_>,
    domain: &str,
    keys: &IndexMap<String, KeyDecl>,
) -> IndexMap<String, String> {
    let mut data = IndexMap::new();
    for child in element.children().filter(|n| is_element(n, "data")) {
        let Some(key) = child.attribute("key") else {
            continue;
        };
        let name = keys.get(key).map_or(key, |decl| decl.name.as_str());
        let value: String = child
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        data.insert(name.to_owned(), value);
    }
    apply_defaults(&mut data, domain, keys);
    data
}

fn apply_defaults(data: &mut IndexMap<String, String>, domain: &str, keys: &IndexMap<String, KeyDecl>) {
    for decl in keys.values() {
        if decl.domain != domain && decl.domain != "all" {
            continue;
        }
        if let Some(default) = &decl.default {
            data.entry(decl.name.clone()).or_insert_with(|| default.clone());
        }
    }
}

/// Which assumption edges count as program inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeFilter {
    /// Keep every assumption edge that carries `assumption.scope`.
    Lenient,
    /// Also require the originating file to be named in `assumption.scope`.
    Strict,
}

impl ScopeFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeFilter::Lenient => "lenient",
            ScopeFilter::Strict => "strict",
        }
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(ScopeFilter::Lenient),
            "strict" => Ok(ScopeFilter::Strict),
            other => Err(format!(
                "unknown scope filter '{other}' (expected lenient or strict)"
            )),
        }
    }
}

/// An assumption edge before value extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAssumption {
    pub position: Position,
    pub text: String,
    pub scope: Option<String>,
}

/// A witness that passed the linearity check.
#[derive(Debug, Clone)]
pub struct LinearWitness {
    graph: WitnessGraph,
    path: Vec<usize>,
}

impl LinearWitness {
    pub fn graph(&self) -> &WitnessGraph {
        &self.graph
    }

    pub fn producer(&self) -> Option<&str> {
        self.graph.producer()
    }

    /// Edges of the entry-to-violation path, in traversal order.
    pub fn path_edges(&self) -> impl Iterator<Item = &WitnessEdge> {
        self.path.iter().map(|&i| &self.graph.edges[i])
    }

    /// Assumption edges on the path, in traversal order.
    pub fn assumptions_in_path_order(
        &self,
        filter: ScopeFilter,
    ) -> Result<Vec<RawAssumption>, WitnessError> {
        let mut out = Vec::new();
        for edge in self.path_edges() {
            let Some(text) = edge.get(keys::ASSUMPTION) else {
                continue;
            };
            let scope = edge.get(keys::ASSUMPTION_SCOPE);
            if scope.is_none() {
                debug!(assumption = text, "skipping assumption without scope");
                continue;
            }
            let position = self.edge_position(edge)?;
            if filter == ScopeFilter::Strict
                && !scope.is_some_and(|s| s.contains(position.file.as_str()))
            {
                debug!(assumption = text, %position, "skipping assumption scoped to another file");
                continue;
            }
            out.push(RawAssumption {
                position,
                text: text.to_owned(),
                scope: scope.map(str::to_owned),
            });
        }
        Ok(out)
    }

    fn edge_position(&self, edge: &WitnessEdge) -> Result<Position, WitnessError> {
        let missing = |key| {
            self.graph.structure(StructureError::MissingEdgeKey {
                source_node: self.graph.nodes[edge.source].id.clone(),
                target_node: self.graph.nodes[edge.target].id.clone(),
                key,
            })
        };
        let file = edge
            .get(keys::ORIGIN_FILE)
            .ok_or_else(|| missing(keys::ORIGIN_FILE))?;
        let line_text = edge
            .get(keys::START_LINE)
            .ok_or_else(|| missing(keys::START_LINE))?;
        let line = line_text.trim().parse::<u32>().map_err(|_| {
            self.graph.structure(StructureError::InvalidLine {
                source_node: self.graph.nodes[edge.source].id.clone(),
                target_node: self.graph.nodes[edge.target].id.clone(),
                value: line_text.to_owned(),
            })
        })?;
        Ok(Position::new(file_identifier(file.trim()), line))
    }
}
