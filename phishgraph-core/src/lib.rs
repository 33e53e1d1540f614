pub mod config;
pub mod dictionary;
pub mod dom;
pub mod error;
pub mod html;
pub mod matrix;
pub mod page;
pub mod pipeline;
pub mod tokenizer;
pub mod vectorizer;

pub use config::PipelineConfig;
pub use dictionary::Dictionary;
pub use dom::{DomGraph, DomNode, build_graph};
pub use error::FeatureError;
pub use html::{DegenerateReason, HtmlVerdict, check_html};
pub use matrix::{FEATURE_DIM, GraphMatrices, materialize};
pub use page::PageSnapshot;
pub use pipeline::{FeaturePipeline, FeatureRecord, ModelInput, PageFeatures};
pub use tokenizer::tokenize;
pub use vectorizer::vectorize;
