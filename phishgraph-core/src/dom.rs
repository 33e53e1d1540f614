use crate::html::check_html;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use scraper::{ElementRef, Html};
use std::collections::VecDeque;
use tracing::debug;

/// Known tag names. A tag's index is its position here plus one; unknown
/// tags get index 0.
pub const KNOWN_TAGS: [&str; 60] = [
    "html", "head", "title", "body", "article", "section", "nav", "aside", "header", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "blockquote", "ol", "ul",
    "li", "figure", "figcaption", "main", "div", "span", "a", "img", "button", "form",
    "input", "textarea", "select", "option", "table", "tr", "th", "td", "video", "audio",
    "source", "canvas", "svg", "iframe", "script", "link", "meta", "style", "noscript", "object",
    "embed", "base", "fieldset", "legend", "label", "strong", "em", "b", "i", "address",
];

pub fn tag_index(name: &str) -> u8 {
    KNOWN_TAGS
        .iter()
        .position(|&known| known == name)
        .map(|position| position as u8 + 1)
        .unwrap_or(0)
}

/// One element of the parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    pub tag: String,
    pub tag_index: u8,
    /// `[tag_index / 60, has href, has src]`
    pub features: [f32; 3],
}

impl DomNode {
    pub fn new(tag: &str, has_href: bool, has_src: bool) -> Self {
        let tag_index = tag_index(tag);
        let features = [
            f32::from(tag_index) / KNOWN_TAGS.len() as f32,
            if has_href { 1.0 } else { 0.0 },
            if has_src { 1.0 } else { 0.0 },
        ];
        Self {
            tag: tag.to_string(),
            tag_index,
            features,
        }
    }

    fn from_element(element: &ElementRef<'_>) -> Self {
        let value = element.value();
        Self::new(
            value.name(),
            value.attr("href").is_some(),
            value.attr("src").is_some(),
        )
    }
}

/// Directed parent→child graph of a document's elements.
///
/// Node indices are assigned in breadth-first discovery order starting at 0,
/// so index order decides which nodes survive truncation.
#[derive(Debug, Clone, Default)]
pub struct DomGraph {
    graph: DiGraph<DomNode, ()>,
}

impl DomGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: DomNode) -> usize {
        self.graph.add_node(node).index()
    }

    /// Both endpoints must already exist.
    pub fn add_edge(&mut self, parent: usize, child: usize) {
        self.graph
            .add_edge(NodeIndex::new(parent), NodeIndex::new(child), ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, index: usize) -> Option<&DomNode> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DomNode> {
        self.graph.node_weights()
    }

    /// `(parent, child)` index pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source().index(), edge.target().index()))
    }

    pub fn has_edge(&self, parent: usize, child: usize) -> bool {
        self.graph
            .find_edge(NodeIndex::new(parent), NodeIndex::new(child))
            .is_some()
    }

    /// Graphviz rendering, nodes labelled `index:tag`.
    pub fn to_dot(&self) -> String {
        let dot = Dot::with_attr_getters(
            &self.graph,
            &[Config::EdgeNoLabel, Config::NodeNoLabel],
            &|_, _| String::new(),
            &|_, (index, node)| format!("label = \"{}:{}\"", index.index(), node.tag),
        );
        format!("{:?}", dot)
    }
}

/// Parse `html` and walk it breadth-first into a [`DomGraph`].
///
/// Degenerate documents (see [`check_html`]) yield an empty graph. Parsing
/// itself never fails: the html5ever tree builder repairs whatever it is
/// given.
pub fn build_graph(html: &str) -> DomGraph {
    let verdict = check_html(html);
    if !verdict.is_usable() {
        debug!("Skipping graph construction: {}", verdict);
        return DomGraph::new();
    }
    parse_graph(html)
}

/// [`build_graph`] for a document already known to be usable.
pub(crate) fn parse_graph(html: &str) -> DomGraph {
    let document = Html::parse_document(html);
    let mut graph = DomGraph::new();
    let mut queue: VecDeque<(ElementRef<'_>, usize)> = VecDeque::new();

    // The document node, doctype and top-level comments are not graph nodes
    for root in document.tree.root().children().filter_map(ElementRef::wrap) {
        let index = graph.add_node(DomNode::from_element(&root));
        queue.push_back((root, index));
    }

    while let Some((element, parent)) = queue.pop_front() {
        for child in element.children().filter_map(ElementRef::wrap) {
            let index = graph.add_node(DomNode::from_element(&child));
            graph.add_edge(parent, index);
            queue.push_back((child, index));
        }
    }

    debug!(
        "Built DOM graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}
