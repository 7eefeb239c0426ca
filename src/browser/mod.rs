//! Static topic-model browser export
//!
//! Writes a browsable description of a fitted model and its corpus to
//! an output directory: a topic cloud, one file per topic, one file
//! per document, one file per frequent vocabulary term, and the
//! co-authorship network. The files are plain JSON so any front end
//! (or a notebook) can render them.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::corpus::{Corpus, CorpusError, Vectorization};
use crate::models::{ModelError, TopicModel};

/// Rounding precision for exported weights
const EXPORT_PRECISION: f64 = 1e6;

fn round(value: f64) -> f64 {
    (value * EXPORT_PRECISION).round() / EXPORT_PRECISION
}

/// Errors raised while exporting browser data
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Export sizes
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Words per topic page
    pub words_per_topic: usize,
    /// Similar documents per document page
    pub similar_documents: usize,
    /// Top terms per document page
    pub terms_per_document: usize,
    /// Number of vocabulary terms that get a word page,
    /// picked by document frequency
    pub word_pages: usize,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            words_per_topic: 20,
            similar_documents: 5,
            terms_per_document: 10,
            word_pages: 100,
        }
    }
}

#[derive(Serialize)]
struct IndexPage<'a> {
    document_count: usize,
    vocabulary_size: usize,
    vectorization: &'a str,
    num_topics: usize,
}

#[derive(Serialize)]
struct TopicCloudEntry {
    topic: usize,
    label: String,
    frequency: f64,
}

#[derive(Serialize)]
struct WeightedWord {
    word: String,
    weight: f64,
}

#[derive(Serialize)]
struct TopicDocument {
    id: usize,
    title: String,
    date: Option<NaiveDate>,
    weight: f64,
}

#[derive(Serialize)]
struct AffiliationCount {
    affiliation: String,
    count: usize,
}

#[derive(Serialize)]
struct TopicPage {
    topic: usize,
    label: String,
    frequency: f64,
    word_distribution: Vec<WeightedWord>,
    documents: Vec<TopicDocument>,
    affiliations: Vec<AffiliationCount>,
}

#[derive(Serialize)]
struct TopicWeight {
    topic: usize,
    weight: f64,
}

#[derive(Serialize)]
struct SimilarDocument {
    id: usize,
    title: String,
    similarity: f64,
}

#[derive(Serialize)]
struct DocumentPage {
    id: usize,
    title: String,
    date: Option<NaiveDate>,
    authors: Vec<String>,
    affiliations: Vec<String>,
    topic_distribution: Vec<TopicWeight>,
    similar_documents: Vec<SimilarDocument>,
    top_terms: Vec<WeightedWord>,
}

#[derive(Serialize)]
struct WordPage {
    id: usize,
    word: String,
    document_frequency: usize,
    documents: Vec<usize>,
}

/// Exports a fitted topic model and its corpus as static JSON data.
pub struct BrowserExporter<'a> {
    corpus: &'a Corpus,
    model: &'a dyn TopicModel,
    options: BrowserOptions,
}

impl<'a> BrowserExporter<'a> {
    /// Create an exporter with default sizes.
    pub fn new(corpus: &'a Corpus, model: &'a dyn TopicModel) -> Self {
        Self {
            corpus,
            model,
            options: BrowserOptions::default(),
        }
    }

    /// Create an exporter with custom sizes.
    pub fn with_options(
        corpus: &'a Corpus,
        model: &'a dyn TopicModel,
        options: BrowserOptions,
    ) -> Self {
        Self {
            corpus,
            model,
            options,
        }
    }

    /// Write the whole browser data set below `output_dir`.
    pub fn export<P: AsRef<Path>>(&self, output_dir: P) -> Result<(), BrowserError> {
        let root = output_dir.as_ref();
        std::fs::create_dir_all(root.join("topics"))?;
        std::fs::create_dir_all(root.join("docs"))?;
        std::fs::create_dir_all(root.join("words"))?;

        self.export_index(root)?;
        self.export_topic_cloud(root)?;
        self.export_topics(root)?;
        self.export_documents(root)?;
        self.export_words(root)?;
        self.export_collaboration_network(root)?;

        Ok(())
    }

    fn export_index(&self, root: &Path) -> Result<(), BrowserError> {
        let page = IndexPage {
            document_count: self.corpus.size(),
            vocabulary_size: self.corpus.vocabulary_size(),
            vectorization: match self.corpus.config().vectorization {
                Vectorization::Tf => "tf",
                Vectorization::TfIdf => "tfidf",
            },
            num_topics: self.model.num_topics(),
        };
        write_json(&root.join("index.json"), &page)
    }

    fn topic_label(&self, topic: usize) -> Result<String, ModelError> {
        let words: Vec<String> = self
            .model
            .top_words(topic, 3)?
            .into_iter()
            .map(|(word, _)| word)
            .collect();
        Ok(words.join(", "))
    }

    fn export_topic_cloud(&self, root: &Path) -> Result<(), BrowserError> {
        let frequencies = self.model.topics_frequency()?;
        let mut cloud = Vec::with_capacity(self.model.num_topics());
        for topic in 0..self.model.num_topics() {
            cloud.push(TopicCloudEntry {
                topic,
                label: self.topic_label(topic)?,
                frequency: round(frequencies[topic]),
            });
        }
        write_json(&root.join("topic_cloud.json"), &cloud)
    }

    fn export_topics(&self, root: &Path) -> Result<(), BrowserError> {
        let frequencies = self.model.topics_frequency()?;
        let doc_topic = self.model.document_topic_matrix()?;

        for topic in 0..self.model.num_topics() {
            let word_distribution = self
                .model
                .top_words(topic, self.options.words_per_topic)?
                .into_iter()
                .map(|(word, weight)| WeightedWord {
                    word,
                    weight: round(weight),
                })
                .collect();

            let documents = self
                .model
                .documents_for_topic(topic)?
                .into_iter()
                .map(|doc_id| {
                    let document = self.corpus.document(doc_id)?;
                    Ok(TopicDocument {
                        id: doc_id,
                        title: document.title.clone(),
                        date: document.date,
                        weight: round(doc_topic[[doc_id, topic]]),
                    })
                })
                .collect::<Result<Vec<_>, BrowserError>>()?;

            let affiliations = self
                .model
                .affiliation_repartition(self.corpus, topic)?
                .into_iter()
                .map(|(affiliation, count)| AffiliationCount { affiliation, count })
                .collect();

            let page = TopicPage {
                topic,
                label: self.topic_label(topic)?,
                frequency: round(frequencies[topic]),
                word_distribution,
                documents,
                affiliations,
            };
            write_json(&root.join(format!("topics/topic_{}.json", topic)), &page)?;
        }

        Ok(())
    }

    fn export_documents(&self, root: &Path) -> Result<(), BrowserError> {
        for doc_id in 0..self.corpus.size() {
            let document = self.corpus.document(doc_id)?;

            let topic_distribution = self
                .model
                .topic_distribution_for_document(doc_id)?
                .into_iter()
                .enumerate()
                .map(|(topic, weight)| TopicWeight {
                    topic,
                    weight: round(weight),
                })
                .collect();

            let similar_documents = self
                .corpus
                .similar_documents(doc_id, self.options.similar_documents)?
                .into_iter()
                .map(|(id, similarity)| {
                    let similar = self.corpus.document(id)?;
                    Ok(SimilarDocument {
                        id,
                        title: similar.title.clone(),
                        similarity: round(similarity),
                    })
                })
                .collect::<Result<Vec<_>, BrowserError>>()?;

            let vector = self.corpus.vector_for_document(doc_id)?;
            let mut weighted_terms: Vec<(usize, f64)> = vector
                .iter()
                .enumerate()
                .filter(|(_, &weight)| weight > 0.0)
                .map(|(term, &weight)| (term, weight))
                .collect();
            weighted_terms
                .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            weighted_terms.truncate(self.options.terms_per_document);

            let top_terms = weighted_terms
                .into_iter()
                .filter_map(|(term, weight)| {
                    self.corpus.word_for_id(term).map(|word| WeightedWord {
                        word: word.to_string(),
                        weight: round(weight),
                    })
                })
                .collect();

            let page = DocumentPage {
                id: doc_id,
                title: document.title.clone(),
                date: document.date,
                authors: document.authors.clone(),
                affiliations: document.affiliations.clone(),
                topic_distribution,
                similar_documents,
                top_terms,
            };
            write_json(&root.join(format!("docs/doc_{}.json", doc_id)), &page)?;
        }

        Ok(())
    }

    fn export_words(&self, root: &Path) -> Result<(), BrowserError> {
        let frequencies = self.corpus.document_frequencies();
        let mut by_frequency: Vec<(usize, usize)> = frequencies
            .iter()
            .enumerate()
            .map(|(term, &df)| (term, df))
            .collect();
        by_frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_frequency.truncate(self.options.word_pages);

        let matrix = self.corpus.matrix();
        for (term, df) in by_frequency {
            let Some(word) = self.corpus.word_for_id(term) else {
                continue;
            };
            let documents: Vec<usize> = (0..self.corpus.size())
                .filter(|&doc| matrix[[doc, term]] > 0.0)
                .collect();

            let page = WordPage {
                id: term,
                word: word.to_string(),
                document_frequency: df,
                documents,
            };
            write_json(&root.join(format!("words/word_{}.json", term)), &page)?;
        }

        Ok(())
    }

    fn export_collaboration_network(&self, root: &Path) -> Result<(), BrowserError> {
        let network = self.corpus.collaboration_network();
        let json = network.to_node_link_json();
        let file = std::fs::File::create(root.join("collaboration_network.json"))?;
        serde_json::to_writer_pretty(file, &json)?;
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), BrowserError> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusConfig, Document};
    use crate::models::{NmfConfig, NonNegativeMatrixFactorization};
    use tempfile::tempdir;

    fn fitted() -> (Corpus, NonNegativeMatrixFactorization) {
        let documents = vec![
            Document::new(0, "Wavelets I", "wavelet wavelet transform signal transform")
                .with_authors(&["Daubechies I."])
                .with_affiliations(&["Princeton"]),
            Document::new(1, "Wavelets II", "signal wavelet transform transform signal")
                .with_authors(&["Daubechies I.", "Mallat S."])
                .with_affiliations(&["Princeton", "ENS"]),
            Document::new(2, "Genomes I", "genome protein sequence protein genome")
                .with_authors(&["Venter C."]),
            Document::new(3, "Genomes II", "protein sequence genome sequence protein")
                .with_authors(&["Venter C."]),
        ];
        let config = CorpusConfig::default()
            .language(None)
            .min_absolute_frequency(1)
            .max_relative_frequency(1.0);
        let corpus = Corpus::from_documents(documents, config).unwrap();

        let mut model =
            NonNegativeMatrixFactorization::new(NmfConfig::new(2).max_iterations(150).seed(3))
                .unwrap();
        model.fit(&corpus).unwrap();
        (corpus, model)
    }

    #[test]
    fn test_export_layout() {
        let (corpus, model) = fitted();
        let dir = tempdir().unwrap();

        BrowserExporter::new(&corpus, &model)
            .export(dir.path())
            .unwrap();

        assert!(dir.path().join("index.json").exists());
        assert!(dir.path().join("topic_cloud.json").exists());
        assert!(dir.path().join("topics/topic_0.json").exists());
        assert!(dir.path().join("topics/topic_1.json").exists());
        assert!(dir.path().join("docs/doc_0.json").exists());
        assert!(dir.path().join("docs/doc_3.json").exists());
        assert!(dir.path().join("collaboration_network.json").exists());
    }

    #[test]
    fn test_index_content() {
        let (corpus, model) = fitted();
        let dir = tempdir().unwrap();

        BrowserExporter::new(&corpus, &model)
            .export(dir.path())
            .unwrap();

        let index: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("index.json")).unwrap())
                .unwrap();
        assert_eq!(index["document_count"], 4);
        assert_eq!(index["num_topics"], 2);
        assert_eq!(index["vectorization"], "tfidf");
    }

    #[test]
    fn test_topic_cloud_frequencies_sum_to_one() {
        let (corpus, model) = fitted();
        let dir = tempdir().unwrap();

        BrowserExporter::new(&corpus, &model)
            .export(dir.path())
            .unwrap();

        let cloud: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("topic_cloud.json")).unwrap(),
        )
        .unwrap();
        let entries = cloud.as_array().unwrap();
        assert_eq!(entries.len(), 2);

        let total: f64 = entries
            .iter()
            .map(|e| e["frequency"].as_f64().unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_document_page_content() {
        let (corpus, model) = fitted();
        let dir = tempdir().unwrap();

        BrowserExporter::new(&corpus, &model)
            .export(dir.path())
            .unwrap();

        let page: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("docs/doc_1.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(page["title"], "Wavelets II");
        assert_eq!(page["authors"].as_array().unwrap().len(), 2);
        assert_eq!(page["topic_distribution"].as_array().unwrap().len(), 2);
        // Most similar document is the other wavelet paper
        assert_eq!(page["similar_documents"][0]["id"], 0);
    }

    #[test]
    fn test_collaboration_network_export() {
        let (corpus, model) = fitted();
        let dir = tempdir().unwrap();

        BrowserExporter::new(&corpus, &model)
            .export(dir.path())
            .unwrap();

        let network: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("collaboration_network.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(network["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(network["links"].as_array().unwrap().len(), 1);
    }
}
