//! # tom-lib
//!
//! A library for topic modeling and browsing.
//!
//! Builds a vectorized corpus from a document collection, fits a topic
//! model (LDA via collapsed Gibbs sampling, or NMF via multiplicative
//! updates), helps choose the number of topics with stability metrics,
//! and exports a static, browsable description of the fitted model.
//!
//! ## Modules
//!
//! - `corpus` - documents, vectorized corpus, co-authorship network
//! - `preprocessing` - tokenization and vectorization
//! - `models` - topic models (LDA, NMF) behind a common trait
//! - `stability` - metrics for choosing the number of topics
//! - `browser` - static browser data export
//! - `utils` - evaluation metrics and dataset I/O

pub mod browser;
pub mod corpus;
pub mod models;
pub mod preprocessing;
pub mod stability;
pub mod utils;

pub use corpus::{Corpus, CorpusConfig, Document, Vectorization};
pub use models::{LatentDirichletAllocation, NonNegativeMatrixFactorization, TopicModel};
pub use preprocessing::tokenizer::Tokenizer;
