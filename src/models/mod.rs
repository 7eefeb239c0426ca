//! Topic models
//!
//! This module provides implementations of:
//! - LDA (Latent Dirichlet Allocation) via collapsed Gibbs sampling
//! - NMF (Non-negative Matrix Factorization) via multiplicative updates
//!
//! Both models expose the same read surface through the [`TopicModel`]
//! trait: row-stochastic topic-word and document-topic matrices plus
//! derived per-topic and per-document queries.

pub mod lda;
pub mod nmf;

pub use lda::{LatentDirichletAllocation, LdaConfig};
pub use nmf::{NmfConfig, NonNegativeMatrixFactorization};

use ndarray::{Array1, Array2};
use std::collections::HashMap;
use thiserror::Error;

use crate::corpus::Corpus;

/// Errors that can occur while fitting or querying a topic model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("Model not fitted yet")]
    NotFitted,

    #[error("Corpus has no documents or no vocabulary")]
    EmptyCorpus,

    #[error("Topic index out of range: {0}")]
    TopicOutOfRange(usize),

    #[error("Document id out of range: {0}")]
    DocumentOutOfRange(usize),
}

/// Topic description with its top words and corpus-wide frequency
#[derive(Debug, Clone)]
pub struct Topic {
    /// Topic index
    pub index: usize,
    /// Top words with their probabilities
    pub top_words: Vec<(String, f64)>,
    /// Share of documents for which this is the most likely topic
    pub frequency: f64,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Topic {}: ({:.1}% of corpus) [",
            self.index,
            self.frequency * 100.0
        )?;
        for (i, (word, prob)) in self.top_words.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.3}", word, prob)?;
        }
        write!(f, "]")
    }
}

/// Common read surface over a fitted topic model.
pub trait TopicModel {
    /// Number of topics
    fn num_topics(&self) -> usize;

    /// Topic-word probabilities (topics x terms, rows sum to 1)
    fn topic_word_matrix(&self) -> Result<&Array2<f64>, ModelError>;

    /// Document-topic probabilities (documents x topics, rows sum to 1)
    fn document_topic_matrix(&self) -> Result<&Array2<f64>, ModelError>;

    /// Terms ordered by vocabulary id
    fn terms(&self) -> Result<&[String], ModelError>;

    /// Fold a new document (term-space vector) into topic space.
    fn infer_distribution(&self, document_vector: &Array1<f64>) -> Result<Array1<f64>, ModelError>;

    /// Top words of a topic, most probable first.
    fn top_words(&self, topic: usize, n: usize) -> Result<Vec<(String, f64)>, ModelError> {
        if topic >= self.num_topics() {
            return Err(ModelError::TopicOutOfRange(topic));
        }
        let topic_word = self.topic_word_matrix()?;
        let terms = self.terms()?;

        let mut weighted: Vec<(usize, f64)> = topic_word
            .row(topic)
            .iter()
            .enumerate()
            .map(|(id, &weight)| (id, weight))
            .collect();
        weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        weighted.truncate(n);

        Ok(weighted
            .into_iter()
            .filter_map(|(id, weight)| terms.get(id).map(|term| (term.clone(), weight)))
            .collect())
    }

    /// Topic distribution of a training document.
    fn topic_distribution_for_document(&self, doc_id: usize) -> Result<Vec<f64>, ModelError> {
        let doc_topic = self.document_topic_matrix()?;
        if doc_id >= doc_topic.nrows() {
            return Err(ModelError::DocumentOutOfRange(doc_id));
        }
        Ok(doc_topic.row(doc_id).to_vec())
    }

    /// Most likely topic of a training document.
    fn most_likely_topic_for_document(&self, doc_id: usize) -> Result<usize, ModelError> {
        let distribution = self.topic_distribution_for_document(doc_id)?;
        let mut best = 0;
        let mut best_prob = f64::MIN;
        for (topic, &prob) in distribution.iter().enumerate() {
            if prob > best_prob {
                best_prob = prob;
                best = topic;
            }
        }
        Ok(best)
    }

    /// Share of documents for which the topic is the most likely one.
    fn topic_frequency(&self, topic: usize) -> Result<f64, ModelError> {
        if topic >= self.num_topics() {
            return Err(ModelError::TopicOutOfRange(topic));
        }
        let doc_topic = self.document_topic_matrix()?;
        let n_docs = doc_topic.nrows();
        if n_docs == 0 {
            return Ok(0.0);
        }
        let count = (0..n_docs)
            .filter(|&doc| {
                self.most_likely_topic_for_document(doc)
                    .map(|t| t == topic)
                    .unwrap_or(false)
            })
            .count();
        Ok(count as f64 / n_docs as f64)
    }

    /// `topic_frequency` for every topic at once.
    fn topics_frequency(&self) -> Result<Vec<f64>, ModelError> {
        let doc_topic = self.document_topic_matrix()?;
        let n_docs = doc_topic.nrows();
        let mut counts = vec![0usize; self.num_topics()];
        for doc in 0..n_docs {
            counts[self.most_likely_topic_for_document(doc)?] += 1;
        }
        Ok(counts
            .into_iter()
            .map(|c| if n_docs == 0 { 0.0 } else { c as f64 / n_docs as f64 })
            .collect())
    }

    /// Ids of documents whose most likely topic is the given one,
    /// ordered by decreasing weight.
    fn documents_for_topic(&self, topic: usize) -> Result<Vec<usize>, ModelError> {
        if topic >= self.num_topics() {
            return Err(ModelError::TopicOutOfRange(topic));
        }
        let doc_topic = self.document_topic_matrix()?;
        let mut docs: Vec<(usize, f64)> = (0..doc_topic.nrows())
            .filter(|&doc| {
                self.most_likely_topic_for_document(doc)
                    .map(|t| t == topic)
                    .unwrap_or(false)
            })
            .map(|doc| (doc, doc_topic[[doc, topic]]))
            .collect();
        docs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(docs.into_iter().map(|(doc, _)| doc).collect())
    }

    /// Affiliation counts over the documents attached to a topic.
    fn affiliation_repartition(
        &self,
        corpus: &Corpus,
        topic: usize,
    ) -> Result<Vec<(String, usize)>, ModelError> {
        let docs = self.documents_for_topic(topic)?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for doc_id in docs {
            if let Ok(document) = corpus.document(doc_id) {
                for affiliation in &document.affiliations {
                    *counts.entry(affiliation.clone()).or_insert(0) += 1;
                }
            }
        }
        let mut repartition: Vec<(String, usize)> = counts.into_iter().collect();
        repartition.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(repartition)
    }

    /// Describe every topic with its top words and corpus frequency.
    fn describe(&self, num_words: usize) -> Result<Vec<Topic>, ModelError> {
        let frequencies = self.topics_frequency()?;
        (0..self.num_topics())
            .map(|topic| {
                Ok(Topic {
                    index: topic,
                    top_words: self.top_words(topic, num_words)?,
                    frequency: frequencies[topic],
                })
            })
            .collect()
    }
}
