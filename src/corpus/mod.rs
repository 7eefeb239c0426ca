//! Documents and the vectorized corpus.
//!
//! A [`Corpus`] owns a document collection together with the fitted
//! vocabulary and the document-term matrix produced by the configured
//! vectorization. Document ids are dense indices aligned with matrix
//! rows; term ids are dense indices aligned with matrix columns.

pub mod document;

pub use document::Document;

use log::info;
use ndarray::{Array1, Array2};
use petgraph::graph::{NodeIndex, UnGraph};
use rand::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::preprocessing::tokenizer::{Language, Tokenizer};
use crate::preprocessing::vectorizer::{CountVectorizer, TfIdfVectorizer};

/// Errors raised while building or querying a corpus
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Corpus contains no documents")]
    EmptyCorpus,

    #[error("Frequency filters removed every term from the vocabulary")]
    EmptyVocabulary,

    #[error("Document id out of range: {0}")]
    DocumentOutOfRange(usize),
}

/// Term weighting applied to the document-term matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vectorization {
    /// Raw term counts (required by Gibbs-sampling LDA)
    Tf,
    /// TF-IDF weights
    TfIdf,
}

/// Corpus construction parameters
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    /// Stop word language; `None` keeps every token
    pub language: Option<Language>,
    /// Term weighting for the document-term matrix
    pub vectorization: Vectorization,
    /// Drop terms appearing in more than this share of documents
    pub max_relative_frequency: f64,
    /// Drop terms appearing in fewer than this many documents
    pub min_absolute_frequency: usize,
    /// N-gram order; 1 keeps plain tokens only
    pub ngram: usize,
    /// Cap on vocabulary size, keeping the most frequent terms
    pub max_features: Option<usize>,
    /// Optional fraction of documents to keep (deterministic subsample)
    pub sample: Option<f64>,
    /// Seed for subsampling
    pub seed: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            language: Some(Language::English),
            vectorization: Vectorization::TfIdf,
            max_relative_frequency: 0.8,
            min_absolute_frequency: 4,
            ngram: 1,
            max_features: None,
            sample: None,
            seed: 0,
        }
    }
}

impl CorpusConfig {
    /// Set the stop word language
    pub fn language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    /// Set the term weighting
    pub fn vectorization(mut self, vectorization: Vectorization) -> Self {
        self.vectorization = vectorization;
        self
    }

    /// Set the maximum relative document frequency
    pub fn max_relative_frequency(mut self, ratio: f64) -> Self {
        self.max_relative_frequency = ratio;
        self
    }

    /// Set the minimum absolute document frequency
    pub fn min_absolute_frequency(mut self, count: usize) -> Self {
        self.min_absolute_frequency = count;
        self
    }

    /// Set the n-gram order
    pub fn ngram(mut self, order: usize) -> Self {
        self.ngram = order;
        self
    }

    /// Cap the vocabulary size
    pub fn max_features(mut self, max: usize) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Keep a deterministic random fraction of the documents
    pub fn sample(mut self, fraction: f64) -> Self {
        self.sample = Some(fraction);
        self
    }

    /// Set the subsampling seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug)]
enum FittedVectorizer {
    Tf(CountVectorizer),
    TfIdf(TfIdfVectorizer),
}

impl FittedVectorizer {
    fn transform(&self, tokenized: &[Vec<String>]) -> Array2<f64> {
        match self {
            FittedVectorizer::Tf(v) => v.transform(tokenized),
            FittedVectorizer::TfIdf(v) => v.transform(tokenized),
        }
    }

    fn terms(&self) -> &[String] {
        match self {
            FittedVectorizer::Tf(v) => v.terms(),
            FittedVectorizer::TfIdf(v) => v.terms(),
        }
    }

    fn document_frequencies(&self) -> &[usize] {
        match self {
            FittedVectorizer::Tf(v) => v.document_frequencies(),
            FittedVectorizer::TfIdf(v) => v.document_frequencies(),
        }
    }
}

/// A vectorized document collection.
#[derive(Debug)]
pub struct Corpus {
    documents: Vec<Document>,
    config: CorpusConfig,
    tokenizer: Tokenizer,
    vectorizer: FittedVectorizer,
    matrix: Array2<f64>,
    term_ids: HashMap<String, usize>,
    doc_lengths: Vec<usize>,
}

impl Corpus {
    /// Build a corpus from an in-memory document collection.
    pub fn from_documents(
        documents: Vec<Document>,
        config: CorpusConfig,
    ) -> Result<Self, CorpusError> {
        if documents.is_empty() {
            return Err(CorpusError::EmptyCorpus);
        }

        let documents = subsample(documents, &config);

        let tokenizer = match config.language {
            Some(language) => Tokenizer::for_language(language),
            None => Tokenizer::without_stop_words(),
        };

        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenizer.tokenize_with_ngrams(&doc.text, config.ngram))
            .collect();
        let doc_lengths: Vec<usize> = tokenized.iter().map(|tokens| tokens.len()).collect();

        let vectorizer = match config.vectorization {
            Vectorization::Tf => {
                let mut v = CountVectorizer::new()
                    .min_df(config.min_absolute_frequency)
                    .max_df_ratio(config.max_relative_frequency);
                if let Some(max) = config.max_features {
                    v = v.max_features(max);
                }
                v.fit(&tokenized);
                FittedVectorizer::Tf(v)
            }
            Vectorization::TfIdf => {
                let mut v = TfIdfVectorizer::new()
                    .min_df(config.min_absolute_frequency)
                    .max_df_ratio(config.max_relative_frequency);
                if let Some(max) = config.max_features {
                    v = v.max_features(max);
                }
                v.fit(&tokenized);
                FittedVectorizer::TfIdf(v)
            }
        };

        if vectorizer.terms().is_empty() {
            return Err(CorpusError::EmptyVocabulary);
        }

        let matrix = vectorizer.transform(&tokenized);
        let term_ids: HashMap<String, usize> = vectorizer
            .terms()
            .iter()
            .enumerate()
            .map(|(id, term)| (term.clone(), id))
            .collect();

        info!(
            "corpus ready: {} documents, {} terms",
            documents.len(),
            term_ids.len()
        );

        Ok(Self {
            documents,
            config,
            tokenizer,
            vectorizer,
            matrix,
            term_ids,
            doc_lengths,
        })
    }

    /// Build a corpus from a tab-separated dataset file.
    pub fn from_tsv<P: AsRef<Path>>(path: P, config: CorpusConfig) -> Result<Self, CorpusError> {
        let documents = document::load_tsv(path)?;
        Self::from_documents(documents, config)
    }

    /// Build a corpus from a JSON dataset file.
    pub fn from_json<P: AsRef<Path>>(path: P, config: CorpusConfig) -> Result<Self, CorpusError> {
        let documents = document::load_json(path)?;
        Self::from_documents(documents, config)
    }

    /// Number of documents
    pub fn size(&self) -> usize {
        self.documents.len()
    }

    /// Number of terms in the fitted vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.term_ids.len()
    }

    /// Construction parameters
    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Document-term matrix (documents x terms)
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Terms ordered by id
    pub fn terms(&self) -> &[String] {
        self.vectorizer.terms()
    }

    /// Document frequency per term, aligned with `terms`
    pub fn document_frequencies(&self) -> &[usize] {
        self.vectorizer.document_frequencies()
    }

    /// Term for a vocabulary id
    pub fn word_for_id(&self, term_id: usize) -> Option<&str> {
        self.terms().get(term_id).map(|s| s.as_str())
    }

    /// Vocabulary id for a term
    pub fn id_for_word(&self, word: &str) -> Option<usize> {
        self.term_ids.get(word).copied()
    }

    /// All documents
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Document by id
    pub fn document(&self, doc_id: usize) -> Result<&Document, CorpusError> {
        self.documents
            .get(doc_id)
            .ok_or(CorpusError::DocumentOutOfRange(doc_id))
    }

    /// Term-space vector of a document (matrix row)
    pub fn vector_for_document(&self, doc_id: usize) -> Result<Array1<f64>, CorpusError> {
        if doc_id >= self.size() {
            return Err(CorpusError::DocumentOutOfRange(doc_id));
        }
        Ok(self.matrix.row(doc_id).to_owned())
    }

    /// Per-document weights of one term (matrix column)
    pub fn word_vector(&self, term_id: usize) -> Option<Array1<f64>> {
        if term_id < self.vocabulary_size() {
            Some(self.matrix.column(term_id).to_owned())
        } else {
            None
        }
    }

    /// Token count per document, after cleaning and stop word removal
    pub fn document_lengths(&self) -> &[usize] {
        &self.doc_lengths
    }

    /// Whether the matrix holds raw counts (as opposed to TF-IDF weights)
    pub fn is_count_based(&self) -> bool {
        self.config.vectorization == Vectorization::Tf
    }

    /// Vectorize new raw texts with the fitted tokenizer and vocabulary.
    pub fn vectorize(&self, texts: &[String]) -> Array2<f64> {
        let tokenized: Vec<Vec<String>> = texts
            .iter()
            .map(|text| self.tokenizer.tokenize_with_ngrams(text, self.config.ngram))
            .collect();
        self.vectorizer.transform(&tokenized)
    }

    /// Most similar documents by cosine similarity in term space.
    pub fn similar_documents(
        &self,
        doc_id: usize,
        n: usize,
    ) -> Result<Vec<(usize, f64)>, CorpusError> {
        if doc_id >= self.size() {
            return Err(CorpusError::DocumentOutOfRange(doc_id));
        }

        let reference = self.matrix.row(doc_id);
        let mut similarities: Vec<(usize, f64)> = (0..self.size())
            .filter(|&other| other != doc_id)
            .map(|other| (other, cosine_similarity(&reference, &self.matrix.row(other))))
            .collect();

        similarities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        similarities.truncate(n);
        Ok(similarities)
    }

    /// Ids of documents with the given author
    pub fn documents_by_author(&self, author: &str) -> Vec<usize> {
        self.documents
            .iter()
            .filter(|doc| doc.authors.iter().any(|a| a == author))
            .map(|doc| doc.id)
            .collect()
    }

    /// All distinct authors, sorted
    pub fn all_authors(&self) -> Vec<String> {
        let mut authors: Vec<String> = self
            .documents
            .iter()
            .flat_map(|doc| doc.authors.iter().cloned())
            .collect();
        authors.sort();
        authors.dedup();
        authors
    }

    /// Co-authorship graph: authors as nodes, edge weight = number of
    /// co-authored documents.
    pub fn collaboration_network(&self) -> CollaborationNetwork {
        let mut network = CollaborationNetwork::new();
        for doc in &self.documents {
            for author in &doc.authors {
                network.add_author(author);
            }
            for (i, a) in doc.authors.iter().enumerate() {
                for b in doc.authors.iter().skip(i + 1) {
                    network.add_collaboration(a, b);
                }
            }
        }
        network
    }
}

fn subsample(documents: Vec<Document>, config: &CorpusConfig) -> Vec<Document> {
    let Some(fraction) = config.sample else {
        return documents;
    };
    if fraction >= 1.0 {
        return documents;
    }

    let keep = ((documents.len() as f64 * fraction).ceil() as usize).max(1);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..documents.len()).collect();
    indices.shuffle(&mut rng);
    indices.truncate(keep);
    indices.sort_unstable();

    let mut kept = Vec::with_capacity(keep);
    for (new_id, &index) in indices.iter().enumerate() {
        let mut doc = documents[index].clone();
        doc.id = new_id;
        kept.push(doc);
    }
    kept
}

fn cosine_similarity(a: &ndarray::ArrayView1<f64>, b: &ndarray::ArrayView1<f64>) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a < 1e-10 || norm_b < 1e-10 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Co-authorship graph with a node-link JSON export.
pub struct CollaborationNetwork {
    graph: UnGraph<String, usize>,
    author_nodes: HashMap<String, NodeIndex>,
}

impl CollaborationNetwork {
    fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            author_nodes: HashMap::new(),
        }
    }

    fn add_author(&mut self, author: &str) -> NodeIndex {
        if let Some(&index) = self.author_nodes.get(author) {
            return index;
        }
        let index = self.graph.add_node(author.to_string());
        self.author_nodes.insert(author.to_string(), index);
        index
    }

    fn add_collaboration(&mut self, a: &str, b: &str) {
        let a_index = self.add_author(a);
        let b_index = self.add_author(b);
        if let Some(edge) = self.graph.find_edge(a_index, b_index) {
            self.graph[edge] += 1;
        } else {
            self.graph.add_edge(a_index, b_index, 1);
        }
    }

    /// Number of authors
    pub fn author_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of collaboration pairs
    pub fn collaboration_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Co-authors of an author
    pub fn coauthors(&self, author: &str) -> Vec<String> {
        match self.author_nodes.get(author) {
            Some(&index) => self
                .graph
                .neighbors(index)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of documents co-authored by two authors
    pub fn collaboration_weight(&self, a: &str, b: &str) -> usize {
        let (Some(&a_index), Some(&b_index)) =
            (self.author_nodes.get(a), self.author_nodes.get(b))
        else {
            return 0;
        };
        self.graph
            .find_edge(a_index, b_index)
            .map(|edge| self.graph[edge])
            .unwrap_or(0)
    }

    /// Node-link JSON representation (`nodes` with `id`, `links` with
    /// `source`/`target`/`weight`), suitable for force-directed layouts.
    pub fn to_node_link_json(&self) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self
            .graph
            .node_indices()
            .map(|index| json!({ "id": self.graph[index] }))
            .collect();

        let links: Vec<serde_json::Value> = self
            .graph
            .edge_indices()
            .filter_map(|edge| {
                let (a, b) = self.graph.edge_endpoints(edge)?;
                Some(json!({
                    "source": self.graph[a],
                    "target": self.graph[b],
                    "weight": self.graph[edge],
                }))
            })
            .collect();

        json!({ "nodes": nodes, "links": links })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_documents() -> Vec<Document> {
        vec![
            Document::new(0, "Topic models", "latent topic structure topic inference models")
                .with_authors(&["Guille A.", "Soriano E."])
                .with_affiliations(&["ERIC Lab"]),
            Document::new(1, "Browsing", "topic browsing interface latent structure corpus")
                .with_authors(&["Guille A."])
                .with_affiliations(&["ERIC Lab"]),
            Document::new(2, "Networks", "information diffusion network community detection")
                .with_authors(&["Favre C.", "Soriano E."]),
            Document::new(3, "Diffusion", "network diffusion cascade community models")
                .with_authors(&["Favre C."]),
        ]
    }

    fn test_config() -> CorpusConfig {
        CorpusConfig::default()
            .vectorization(Vectorization::Tf)
            .min_absolute_frequency(1)
            .max_relative_frequency(1.0)
    }

    #[test]
    fn test_corpus_build() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();

        assert_eq!(corpus.size(), 4);
        assert!(corpus.vocabulary_size() > 0);
        assert_eq!(corpus.matrix().nrows(), 4);
        assert_eq!(corpus.matrix().ncols(), corpus.vocabulary_size());
    }

    #[test]
    fn test_word_id_round_trip() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();

        let id = corpus.id_for_word("topic").unwrap();
        assert_eq!(corpus.word_for_id(id), Some("topic"));
        assert!(corpus.id_for_word("missing").is_none());
    }

    #[test]
    fn test_empty_corpus() {
        let err = Corpus::from_documents(vec![], test_config()).unwrap_err();
        assert!(matches!(err, CorpusError::EmptyCorpus));
    }

    #[test]
    fn test_empty_vocabulary() {
        let config = test_config().min_absolute_frequency(100);
        let err = Corpus::from_documents(test_documents(), config).unwrap_err();
        assert!(matches!(err, CorpusError::EmptyVocabulary));
    }

    #[test]
    fn test_similar_documents() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();

        // Documents 2 and 3 share the network/diffusion vocabulary
        let similar = corpus.similar_documents(2, 1).unwrap();
        assert_eq!(similar[0].0, 3);
        assert!(similar[0].1 > 0.0);
    }

    #[test]
    fn test_out_of_range() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();
        assert!(matches!(
            corpus.similar_documents(99, 2),
            Err(CorpusError::DocumentOutOfRange(99))
        ));
    }

    #[test]
    fn test_documents_by_author() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();
        assert_eq!(corpus.documents_by_author("Guille A."), vec![0, 1]);
        assert_eq!(corpus.documents_by_author("Favre C."), vec![2, 3]);
    }

    #[test]
    fn test_collaboration_network() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();
        let network = corpus.collaboration_network();

        assert_eq!(network.author_count(), 3);
        assert_eq!(network.collaboration_weight("Guille A.", "Soriano E."), 1);
        assert_eq!(network.collaboration_weight("Guille A.", "Favre C."), 0);
        assert!(network
            .coauthors("Soriano E.")
            .contains(&"Guille A.".to_string()));

        let node_link = network.to_node_link_json();
        assert_eq!(node_link["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(node_link["links"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let config = test_config().sample(0.5).seed(42);
        let a = Corpus::from_documents(test_documents(), config.clone()).unwrap();
        let b = Corpus::from_documents(test_documents(), config).unwrap();

        assert_eq!(a.size(), 2);
        assert_eq!(
            a.documents().iter().map(|d| &d.title).collect::<Vec<_>>(),
            b.documents().iter().map(|d| &d.title).collect::<Vec<_>>()
        );
        // Ids stay dense after subsampling
        assert_eq!(a.documents()[0].id, 0);
        assert_eq!(a.documents()[1].id, 1);
    }

    #[test]
    fn test_vectorize_new_text() {
        let corpus = Corpus::from_documents(test_documents(), test_config()).unwrap();
        let matrix = corpus.vectorize(&["topic structure of a corpus".to_string()]);

        assert_eq!(matrix.nrows(), 1);
        let topic_id = corpus.id_for_word("topic").unwrap();
        assert!(matrix[[0, topic_id]] > 0.0);
    }
}
