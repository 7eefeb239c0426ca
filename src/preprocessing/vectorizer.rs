//! Text vectorization for topic modeling
//!
//! Provides count and TF-IDF vectorization for converting tokenized
//! documents into dense document-term matrices.

use hashbrown::HashMap;
use ndarray::Array2;
use std::collections::HashSet;

/// Term frequency weighting schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermWeighting {
    /// Raw term count
    Raw,
    /// Boolean: 1 if term present, 0 otherwise
    Binary,
    /// Log-normalized: 1 + log(tf)
    LogNorm,
    /// Double normalization: 0.5 + 0.5 * (tf / max_tf)
    DoubleNorm,
}

/// Inverse document frequency weighting schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdfWeighting {
    /// Standard IDF: log(N / df)
    Standard,
    /// Smooth IDF: log(N / (1 + df)) + 1
    Smooth,
    /// Probabilistic IDF: log((N - df) / df), clamped at zero
    Probabilistic,
}

/// Shared vocabulary fitting: document-frequency filtering and the
/// term -> index mapping, ordered alphabetically for stable ids.
#[derive(Debug, Clone, Default)]
struct FittedVocabulary {
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    document_frequencies: Vec<usize>,
}

fn fit_vocabulary(
    tokenized_docs: &[Vec<String>],
    min_df: usize,
    max_df_ratio: f64,
    max_features: Option<usize>,
) -> FittedVocabulary {
    let n_docs = tokenized_docs.len();

    let mut term_doc_freq: HashMap<String, usize> = HashMap::new();
    for doc in tokenized_docs {
        let unique_terms: HashSet<&String> = doc.iter().collect();
        for term in unique_terms {
            *term_doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
    }

    let max_df = (n_docs as f64 * max_df_ratio).floor() as usize;
    let mut filtered: Vec<(String, usize)> = term_doc_freq
        .into_iter()
        .filter(|(_, df)| *df >= min_df && *df <= max_df)
        .collect();

    // Keep the most frequent terms when capped, then order alphabetically
    // so term ids are stable across runs.
    if let Some(max) = max_features {
        filtered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        filtered.truncate(max);
    }
    filtered.sort_by(|a, b| a.0.cmp(&b.0));

    let mut fitted = FittedVocabulary::default();
    for (idx, (term, df)) in filtered.into_iter().enumerate() {
        fitted.vocabulary.insert(term.clone(), idx);
        fitted.terms.push(term);
        fitted.document_frequencies.push(df);
    }
    fitted
}

/// Count vectorizer (bag of words).
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    fitted: FittedVocabulary,
    min_df: usize,
    max_df_ratio: f64,
    max_features: Option<usize>,
    is_fitted: bool,
}

impl CountVectorizer {
    /// Create a new count vectorizer
    pub fn new() -> Self {
        Self {
            fitted: FittedVocabulary::default(),
            min_df: 1,
            max_df_ratio: 1.0,
            max_features: None,
            is_fitted: false,
        }
    }

    /// Set minimum document frequency (absolute count)
    pub fn min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Set maximum document frequency as a ratio of the corpus size
    pub fn max_df_ratio(mut self, ratio: f64) -> Self {
        self.max_df_ratio = ratio;
        self
    }

    /// Set maximum vocabulary size
    pub fn max_features(mut self, max: usize) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Fit the vocabulary on tokenized documents
    pub fn fit(&mut self, tokenized_docs: &[Vec<String>]) {
        self.fitted = fit_vocabulary(
            tokenized_docs,
            self.min_df,
            self.max_df_ratio,
            self.max_features,
        );
        self.is_fitted = true;
    }

    /// Transform tokenized documents into a count matrix.
    /// Out-of-vocabulary tokens are ignored.
    pub fn transform(&self, tokenized_docs: &[Vec<String>]) -> Array2<f64> {
        assert!(self.is_fitted, "Vectorizer must be fitted before transform");

        let n_docs = tokenized_docs.len();
        let n_features = self.fitted.terms.len();
        let mut matrix = Array2::zeros((n_docs, n_features));

        for (doc_idx, doc) in tokenized_docs.iter().enumerate() {
            for term in doc {
                if let Some(&term_idx) = self.fitted.vocabulary.get(term) {
                    matrix[[doc_idx, term_idx]] += 1.0;
                }
            }
        }

        matrix
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, tokenized_docs: &[Vec<String>]) -> Array2<f64> {
        self.fit(tokenized_docs);
        self.transform(tokenized_docs)
    }

    /// Get the vocabulary mapping
    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.fitted.vocabulary
    }

    /// Terms ordered by index
    pub fn terms(&self) -> &[String] {
        &self.fitted.terms
    }

    /// Document frequency for each term, aligned with `terms`
    pub fn document_frequencies(&self) -> &[usize] {
        &self.fitted.document_frequencies
    }

    /// Get vocabulary size
    pub fn vocabulary_size(&self) -> usize {
        self.fitted.terms.len()
    }
}

impl Default for CountVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// TF-IDF vectorizer.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    fitted: FittedVocabulary,
    n_documents: usize,
    tf_weighting: TermWeighting,
    idf_weighting: IdfWeighting,
    min_df: usize,
    max_df_ratio: f64,
    max_features: Option<usize>,
    idf_values: Vec<f64>,
    is_fitted: bool,
}

impl TfIdfVectorizer {
    /// Create a new TF-IDF vectorizer with default weighting
    /// (raw TF, smoothed IDF).
    pub fn new() -> Self {
        Self {
            fitted: FittedVocabulary::default(),
            n_documents: 0,
            tf_weighting: TermWeighting::Raw,
            idf_weighting: IdfWeighting::Smooth,
            min_df: 1,
            max_df_ratio: 1.0,
            max_features: None,
            idf_values: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set TF weighting scheme
    pub fn tf_weighting(mut self, weighting: TermWeighting) -> Self {
        self.tf_weighting = weighting;
        self
    }

    /// Set IDF weighting scheme
    pub fn idf_weighting(mut self, weighting: IdfWeighting) -> Self {
        self.idf_weighting = weighting;
        self
    }

    /// Set minimum document frequency (absolute count)
    pub fn min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    /// Set maximum document frequency as a ratio of the corpus size
    pub fn max_df_ratio(mut self, ratio: f64) -> Self {
        self.max_df_ratio = ratio;
        self
    }

    /// Set maximum vocabulary size
    pub fn max_features(mut self, max: usize) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Fit the vocabulary and IDF values on tokenized documents
    pub fn fit(&mut self, tokenized_docs: &[Vec<String>]) {
        self.n_documents = tokenized_docs.len();
        self.fitted = fit_vocabulary(
            tokenized_docs,
            self.min_df,
            self.max_df_ratio,
            self.max_features,
        );
        self.idf_values = self
            .fitted
            .document_frequencies
            .iter()
            .map(|&df| self.idf(df))
            .collect();
        self.is_fitted = true;
    }

    fn idf(&self, df: usize) -> f64 {
        let n = self.n_documents as f64;
        let df = df as f64;

        match self.idf_weighting {
            IdfWeighting::Standard => (n / df).ln(),
            IdfWeighting::Smooth => (n / (1.0 + df)).ln() + 1.0,
            IdfWeighting::Probabilistic => ((n - df) / df).ln().max(0.0),
        }
    }

    fn tf(&self, count: usize, max_count: usize) -> f64 {
        let count = count as f64;

        match self.tf_weighting {
            TermWeighting::Raw => count,
            TermWeighting::Binary => {
                if count > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            TermWeighting::LogNorm => {
                if count > 0.0 {
                    1.0 + count.ln()
                } else {
                    0.0
                }
            }
            TermWeighting::DoubleNorm => {
                let max = max_count as f64;
                if max > 0.0 {
                    0.5 + 0.5 * (count / max)
                } else {
                    0.0
                }
            }
        }
    }

    /// Transform tokenized documents into a TF-IDF matrix.
    /// Out-of-vocabulary tokens are ignored.
    pub fn transform(&self, tokenized_docs: &[Vec<String>]) -> Array2<f64> {
        assert!(self.is_fitted, "Vectorizer must be fitted before transform");

        let n_docs = tokenized_docs.len();
        let n_features = self.fitted.terms.len();
        let mut matrix = Array2::zeros((n_docs, n_features));

        for (doc_idx, doc) in tokenized_docs.iter().enumerate() {
            let mut term_counts: HashMap<&String, usize> = HashMap::new();
            for term in doc {
                *term_counts.entry(term).or_insert(0) += 1;
            }

            let max_count = term_counts.values().copied().max().unwrap_or(1);

            for (term, &count) in &term_counts {
                if let Some(&term_idx) = self.fitted.vocabulary.get(*term) {
                    let tf = self.tf(count, max_count);
                    let idf = self.idf_values[term_idx];
                    matrix[[doc_idx, term_idx]] = tf * idf;
                }
            }
        }

        matrix
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, tokenized_docs: &[Vec<String>]) -> Array2<f64> {
        self.fit(tokenized_docs);
        self.transform(tokenized_docs)
    }

    /// Get the vocabulary mapping
    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.fitted.vocabulary
    }

    /// Terms ordered by index
    pub fn terms(&self) -> &[String] {
        &self.fitted.terms
    }

    /// Document frequency for each term, aligned with `terms`
    pub fn document_frequencies(&self) -> &[usize] {
        &self.fitted.document_frequencies
    }

    /// Get vocabulary size
    pub fn vocabulary_size(&self) -> usize {
        self.fitted.terms.len()
    }

    /// Get top terms by IDF (most discriminative)
    pub fn top_terms_by_idf(&self, n: usize) -> Vec<(String, f64)> {
        let mut terms_idf: Vec<(String, f64)> = self
            .fitted
            .terms
            .iter()
            .zip(self.idf_values.iter())
            .map(|(t, &idf)| (t.clone(), idf))
            .collect();

        terms_idf.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        terms_idf.truncate(n);
        terms_idf
    }
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Vec<String>> {
        let raw = [
            vec!["topic", "model", "inference"],
            vec!["latent", "topic", "structure"],
            vec!["document", "browsing", "interface"],
        ];
        raw.iter()
            .map(|d| d.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_count_vectorizer() {
        let mut vectorizer = CountVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs());

        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), vectorizer.vocabulary_size());

        let topic_id = vectorizer.vocabulary()["topic"];
        assert_eq!(matrix[[0, topic_id]], 1.0);
        assert_eq!(matrix[[2, topic_id]], 0.0);
    }

    #[test]
    fn test_tfidf_vectorizer() {
        let mut vectorizer = TfIdfVectorizer::new();
        let matrix = vectorizer.fit_transform(&docs());

        assert_eq!(matrix.nrows(), 3);
        assert!(vectorizer.vocabulary_size() > 0);

        // A term unique to one document weighs more there than a shared one
        let browsing = vectorizer.vocabulary()["browsing"];
        let topic = vectorizer.vocabulary()["topic"];
        assert!(matrix[[2, browsing]] > matrix[[0, topic]]);
    }

    #[test]
    fn test_min_df_filter() {
        let mut vectorizer = CountVectorizer::new().min_df(2);
        vectorizer.fit(&docs());

        // Only "topic" appears in two documents
        assert_eq!(vectorizer.vocabulary_size(), 1);
        assert_eq!(vectorizer.terms(), &["topic".to_string()]);
    }

    #[test]
    fn test_max_features() {
        let mut vectorizer = CountVectorizer::new().max_features(3);
        vectorizer.fit(&docs());
        assert_eq!(vectorizer.vocabulary_size(), 3);
        // "topic" has the highest document frequency and must survive the cap
        assert!(vectorizer.vocabulary().contains_key("topic"));
    }

    #[test]
    fn test_top_terms_by_idf() {
        let mut vectorizer = TfIdfVectorizer::new();
        vectorizer.fit(&docs());

        let top = vectorizer.top_terms_by_idf(3);
        assert_eq!(top.len(), 3);
        // "topic" appears in two documents, so it is the least discriminative
        assert!(top.iter().all(|(term, _)| term != "topic"));
    }

    #[test]
    fn test_terms_alphabetical() {
        let mut vectorizer = CountVectorizer::new();
        vectorizer.fit(&docs());
        let mut sorted = vectorizer.terms().to_vec();
        sorted.sort();
        assert_eq!(vectorizer.terms(), sorted.as_slice());
    }

    #[test]
    fn test_fit_transform_matches_fit_then_transform() {
        let d = docs();
        let mut v1 = TfIdfVectorizer::new();
        let m1 = v1.fit_transform(&d);

        let mut v2 = TfIdfVectorizer::new();
        v2.fit(&d);
        let m2 = v2.transform(&d);

        assert_eq!(m1, m2);
    }
}
