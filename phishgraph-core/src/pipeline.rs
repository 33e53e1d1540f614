use crate::config::PipelineConfig;
use crate::dictionary::Dictionary;
use crate::dom::parse_graph;
use crate::error::{FeatureError, Result};
use crate::html::{HtmlVerdict, check_html};
use crate::matrix::{GraphMatrices, materialize};
use crate::page::PageSnapshot;
use crate::vectorizer::vectorize;
use ndarray::{Array1, Array2, Array3, Axis};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Turns page snapshots into model inputs.
///
/// Holds a validated configuration and a shared read-only dictionary; it has
/// no other state, so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    dictionary: Arc<Dictionary>,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig, dictionary: Arc<Dictionary>) -> Result<Self> {
        config.validate()?;
        if dictionary.vocab_size() != config.vocab_size {
            return Err(FeatureError::ConfigError(format!(
                "dictionary was built with vocab_size {} but the pipeline expects {}",
                dictionary.vocab_size(),
                config.vocab_size
            )));
        }
        Ok(Self { config, dictionary })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn encode_url(&self, url: &str) -> Array1<i64> {
        vectorize(url, &self.dictionary, self.config.max_words)
    }

    /// Graph encoding of an optional document, with the verdict that decided
    /// whether it was parsed.
    pub fn encode_html(&self, html: Option<&str>) -> (GraphMatrices, HtmlVerdict) {
        let Some(html) = html else {
            return (GraphMatrices::zeros(self.config.max_nodes), HtmlVerdict::Absent);
        };

        let verdict = check_html(html);
        if !verdict.is_usable() {
            return (GraphMatrices::zeros(self.config.max_nodes), verdict);
        }

        let graph = parse_graph(html);
        (materialize(&graph, self.config.max_nodes), verdict)
    }

    pub fn encode(&self, page: &PageSnapshot) -> PageFeatures {
        let url_vector = self.encode_url(&page.url);
        let (matrices, verdict) = self.encode_html(page.html.as_deref());

        debug!(
            "Encoded {}: verdict {}, {}/{} nodes retained",
            page.url, verdict, matrices.retained_nodes, matrices.graph_nodes
        );

        PageFeatures {
            url_vector,
            adjacency: matrices.adjacency,
            features: matrices.features,
            verdict,
            graph_nodes: matrices.graph_nodes,
            retained_nodes: matrices.retained_nodes,
        }
    }
}

/// Unbatched encoding of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFeatures {
    pub url_vector: Array1<i64>,
    pub adjacency: Array2<f32>,
    pub features: Array2<f32>,
    pub verdict: HtmlVerdict,
    pub graph_nodes: usize,
    pub retained_nodes: usize,
}

impl PageFeatures {
    /// True when the graph inputs carry no information (absent, degenerate
    /// or element-free HTML). The model still runs, with less to go on.
    pub fn is_low_confidence(&self) -> bool {
        !self.verdict.is_usable() || self.retained_nodes == 0
    }

    /// Add the leading batch axis expected by a single-document model call.
    pub fn into_model_input(self) -> ModelInput {
        ModelInput {
            url_vector: self.url_vector.insert_axis(Axis(0)),
            adjacency: self.adjacency.insert_axis(Axis(0)),
            features: self.features.insert_axis(Axis(0)),
        }
    }
}

/// The model's three inputs, batch size 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub url_vector: Array2<i64>,
    pub adjacency: Array3<f32>,
    pub features: Array3<f32>,
}

/// Serializable form of [`PageFeatures`] for JSON output and datasets.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRecord {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
    pub html: HtmlVerdict,
    pub low_confidence: bool,
    pub graph_nodes: usize,
    pub retained_nodes: usize,
    pub url_vector: Vec<i64>,
    pub adjacency: Vec<Vec<f32>>,
    pub features: Vec<Vec<f32>>,
}

impl FeatureRecord {
    pub fn from_features(url: &str, label: Option<u8>, features: &PageFeatures) -> Self {
        Self {
            url: url.to_string(),
            label,
            html: features.verdict,
            low_confidence: features.is_low_confidence(),
            graph_nodes: features.graph_nodes,
            retained_nodes: features.retained_nodes,
            url_vector: features.url_vector.to_vec(),
            adjacency: rows(&features.adjacency),
            features: rows(&features.features),
        }
    }
}

fn rows(matrix: &Array2<f32>) -> Vec<Vec<f32>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::DegenerateReason;

    fn pipeline(max_words: usize, max_nodes: usize) -> FeaturePipeline {
        let dictionary = Dictionary::from_urls(["https://example.com/login"], 100).unwrap();
        let config = PipelineConfig::default()
            .with_max_words(max_words)
            .with_max_nodes(max_nodes)
            .with_vocab_size(100);
        FeaturePipeline::new(config, Arc::new(dictionary)).unwrap()
    }

    #[test]
    fn test_rejects_vocab_mismatch() {
        let dictionary = Dictionary::build(["a"], 50).unwrap();
        let err = FeaturePipeline::new(PipelineConfig::default(), Arc::new(dictionary)).unwrap_err();
        assert!(matches!(err, FeatureError::ConfigError(_)));
    }

    #[test]
    fn test_absent_html_short_circuits() {
        let pipeline = pipeline(8, 4);
        let features = pipeline.encode(&PageSnapshot::url_only("https://example.com".into()));
        assert_eq!(features.verdict, HtmlVerdict::Absent);
        assert!(features.is_low_confidence());
        assert!(features.adjacency.iter().all(|&v| v == 0.0));
        assert!(features.url_vector.iter().any(|&id| id > 0));
    }

    #[test]
    fn test_degenerate_html_reported() {
        let pipeline = pipeline(8, 4);
        let (matrices, verdict) = pipeline.encode_html(Some("   "));
        assert_eq!(verdict, HtmlVerdict::Degenerate(DegenerateReason::Empty));
        assert_eq!(matrices.adjacency.dim(), (4, 4));
    }

    #[test]
    fn test_plain_text_body_is_low_confidence() {
        let pipeline = pipeline(8, 4);
        let page = PageSnapshot::new(
            "https://example.com/login".into(),
            Some("Service temporarily unavailable, please retry later".into()),
        );
        let features = pipeline.encode(&page);
        assert_eq!(
            features.verdict,
            HtmlVerdict::Degenerate(DegenerateReason::NoElements)
        );
        assert_eq!(features.retained_nodes, 0);
        assert!(features.is_low_confidence());
        assert!(features.features.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_usable_page_parsed_once_into_graph() {
        let pipeline = pipeline(8, 4);
        let html = "<html><body><a href='/x'>x</a></body></html>";
        let (matrices, verdict) = pipeline.encode_html(Some(html));
        assert!(verdict.is_usable());
        assert_eq!(matrices, materialize(&crate::dom::build_graph(html), 4));
    }

    #[test]
    fn test_model_input_shapes() {
        let pipeline = pipeline(8, 4);
        let page = PageSnapshot::new(
            "https://example.com/login".into(),
            Some("<html><body><a href='/x'>x</a></body></html>".into()),
        );
        let features = pipeline.encode(&page);
        assert!(!features.is_low_confidence());
        let input = features.into_model_input();
        assert_eq!(input.url_vector.dim(), (1, 8));
        assert_eq!(input.adjacency.dim(), (1, 4, 4));
        assert_eq!(input.features.dim(), (1, 4, 3));
    }
}
