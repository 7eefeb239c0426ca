//! Non-negative Matrix Factorization (NMF)
//!
//! Factorizes the document-term matrix V into non-negative factors
//! W (documents x topics) and H (topics x terms) by minimizing the
//! Frobenius reconstruction error with multiplicative updates.

use log::debug;
use ndarray::{Array1, Array2};
use rand::prelude::*;

use super::{ModelError, TopicModel};
use crate::corpus::Corpus;

/// Guard against division by zero in multiplicative updates
const EPSILON: f64 = 1e-12;

/// NMF hyperparameters
#[derive(Debug, Clone)]
pub struct NmfConfig {
    /// Number of topics
    pub num_topics: usize,
    /// Maximum number of multiplicative update iterations
    pub max_iterations: usize,
    /// Stop when the relative reconstruction-error improvement over a
    /// check interval drops below this value
    pub tolerance: f64,
    /// Seed for the random initialization
    pub seed: u64,
}

impl Default for NmfConfig {
    fn default() -> Self {
        Self {
            num_topics: 10,
            max_iterations: 200,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl NmfConfig {
    /// Create a configuration with the given number of topics
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            ..Default::default()
        }
    }

    /// Set the iteration cap
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the initialization seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

struct FittedNmf {
    /// Row-normalized W
    doc_topic: Array2<f64>,
    /// Row-normalized H
    topic_word: Array2<f64>,
    /// Raw H factor, kept for folding in new documents
    basis: Array2<f64>,
    terms: Vec<String>,
    reconstruction_error: f64,
    iterations_run: usize,
}

/// Non-negative Matrix Factorization topic model.
pub struct NonNegativeMatrixFactorization {
    config: NmfConfig,
    fitted: Option<FittedNmf>,
}

impl NonNegativeMatrixFactorization {
    /// Create an NMF model from a configuration.
    pub fn new(config: NmfConfig) -> Result<Self, ModelError> {
        if config.num_topics == 0 {
            return Err(ModelError::InvalidTopicCount);
        }
        if config.tolerance <= 0.0 {
            return Err(ModelError::InvalidParameter(
                "tolerance must be positive".into(),
            ));
        }

        Ok(Self {
            config,
            fitted: None,
        })
    }

    /// Create an NMF model with default settings.
    pub fn with_topics(num_topics: usize) -> Result<Self, ModelError> {
        Self::new(NmfConfig::new(num_topics))
    }

    /// Model configuration
    pub fn config(&self) -> &NmfConfig {
        &self.config
    }

    /// Final Frobenius reconstruction error
    pub fn reconstruction_error(&self) -> Result<f64, ModelError> {
        self.fitted
            .as_ref()
            .map(|f| f.reconstruction_error)
            .ok_or(ModelError::NotFitted)
    }

    /// Number of update iterations actually run
    pub fn iterations_run(&self) -> Result<usize, ModelError> {
        self.fitted
            .as_ref()
            .map(|f| f.iterations_run)
            .ok_or(ModelError::NotFitted)
    }

    /// Fit the model on the corpus matrix.
    pub fn fit(&mut self, corpus: &Corpus) -> Result<(), ModelError> {
        let v = corpus.matrix();
        let (n_docs, n_terms) = (v.nrows(), v.ncols());
        if n_docs == 0 || n_terms == 0 {
            return Err(ModelError::EmptyCorpus);
        }

        let k = self.config.num_topics;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        // Scaled uniform init keeps WH at the magnitude of V
        let mean = v.sum() / (n_docs * n_terms) as f64;
        let scale = (mean.max(EPSILON) / k as f64).sqrt();
        let mut w = Array2::from_shape_fn((n_docs, k), |_| rng.gen::<f64>() * scale + EPSILON);
        let mut h = Array2::from_shape_fn((k, n_terms), |_| rng.gen::<f64>() * scale + EPSILON);

        let mut previous_error = frobenius_error(v, &w, &h);
        let mut iterations_run = 0;

        for iteration in 0..self.config.max_iterations {
            // H <- H * (W^T V) / (W^T W H)
            let wt = w.t();
            let numerator = wt.dot(v);
            let denominator = wt.dot(&w).dot(&h);
            for ((i, j), value) in h.indexed_iter_mut() {
                *value *= numerator[[i, j]] / (denominator[[i, j]] + EPSILON);
            }

            // W <- W * (V H^T) / (W H H^T)
            let ht = h.t();
            let numerator = v.dot(&ht);
            let denominator = w.dot(&h).dot(&ht);
            for ((i, j), value) in w.indexed_iter_mut() {
                *value *= numerator[[i, j]] / (denominator[[i, j]] + EPSILON);
            }

            iterations_run = iteration + 1;

            if iterations_run % 10 == 0 {
                let error = frobenius_error(v, &w, &h);
                let improvement = (previous_error - error) / previous_error.max(EPSILON);
                debug!(
                    "nmf: iteration {}, error {:.6}, improvement {:.2e}",
                    iterations_run, error, improvement
                );
                if improvement >= 0.0 && improvement < self.config.tolerance {
                    previous_error = error;
                    break;
                }
                previous_error = error;
            }
        }

        let reconstruction_error = frobenius_error(v, &w, &h);
        debug!(
            "nmf converged after {} iterations, error {:.6}",
            iterations_run, reconstruction_error
        );

        self.fitted = Some(FittedNmf {
            doc_topic: normalize_rows(&w),
            topic_word: normalize_rows(&h),
            basis: h,
            terms: corpus.terms().to_vec(),
            reconstruction_error,
            iterations_run,
        });

        Ok(())
    }
}

fn frobenius_error(v: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let reconstruction = w.dot(h);
    let mut sum = 0.0;
    for (value, approx) in v.iter().zip(reconstruction.iter()) {
        let diff = value - approx;
        sum += diff * diff;
    }
    sum.sqrt()
}

/// Normalize rows to sum to 1; an all-zero row becomes uniform.
fn normalize_rows(matrix: &Array2<f64>) -> Array2<f64> {
    let mut normalized = matrix.clone();
    let cols = matrix.ncols() as f64;
    for mut row in normalized.rows_mut() {
        let sum: f64 = row.iter().sum();
        if sum > EPSILON {
            row.mapv_inplace(|x| x / sum);
        } else {
            row.fill(1.0 / cols);
        }
    }
    normalized
}

impl TopicModel for NonNegativeMatrixFactorization {
    fn num_topics(&self) -> usize {
        self.config.num_topics
    }

    fn topic_word_matrix(&self) -> Result<&Array2<f64>, ModelError> {
        self.fitted
            .as_ref()
            .map(|f| &f.topic_word)
            .ok_or(ModelError::NotFitted)
    }

    fn document_topic_matrix(&self) -> Result<&Array2<f64>, ModelError> {
        self.fitted
            .as_ref()
            .map(|f| &f.doc_topic)
            .ok_or(ModelError::NotFitted)
    }

    fn terms(&self) -> Result<&[String], ModelError> {
        self.fitted
            .as_ref()
            .map(|f| f.terms.as_slice())
            .ok_or(ModelError::NotFitted)
    }

    /// Fold a new document in by running multiplicative updates on its
    /// topic weights with the fitted basis held fixed.
    fn infer_distribution(&self, document_vector: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let h = &fitted.basis;
        let k = self.config.num_topics;
        let n_terms = h.ncols();

        if document_vector.len() != n_terms {
            return Err(ModelError::InvalidParameter(format!(
                "document vector has {} terms, vocabulary has {}",
                document_vector.len(),
                n_terms
            )));
        }

        let v = document_vector
            .clone()
            .into_shape_with_order((1, n_terms))
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        let mut w = Array2::from_elem((1, k), 1.0 / k as f64);

        let ht = h.t();
        for _ in 0..50 {
            let numerator = v.dot(&ht);
            let denominator = w.dot(h).dot(&ht);
            for ((i, j), value) in w.indexed_iter_mut() {
                *value *= numerator[[i, j]] / (denominator[[i, j]] + EPSILON);
            }
        }

        let normalized = normalize_rows(&w);
        Ok(normalized.row(0).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, CorpusConfig, Document, Vectorization};

    fn two_topic_corpus() -> Corpus {
        let documents = vec![
            Document::new(0, "", "wavelet wavelet transform signal transform"),
            Document::new(1, "", "signal wavelet transform transform signal"),
            Document::new(2, "", "wavelet signal signal transform wavelet"),
            Document::new(3, "", "genome protein sequence protein genome"),
            Document::new(4, "", "protein sequence genome sequence protein"),
            Document::new(5, "", "sequence genome protein genome sequence"),
        ];
        let config = CorpusConfig::default()
            .language(None)
            .vectorization(Vectorization::TfIdf)
            .min_absolute_frequency(1)
            .max_relative_frequency(1.0);
        Corpus::from_documents(documents, config).unwrap()
    }

    fn fitted_nmf(corpus: &Corpus) -> NonNegativeMatrixFactorization {
        let config = NmfConfig::new(2).max_iterations(300).seed(7);
        let mut nmf = NonNegativeMatrixFactorization::new(config).unwrap();
        nmf.fit(corpus).unwrap();
        nmf
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            NonNegativeMatrixFactorization::with_topics(0),
            Err(ModelError::InvalidTopicCount)
        ));
        assert!(NonNegativeMatrixFactorization::new(NmfConfig::new(2).tolerance(0.0)).is_err());
    }

    #[test]
    fn test_not_fitted() {
        let nmf = NonNegativeMatrixFactorization::with_topics(2).unwrap();
        assert!(matches!(nmf.reconstruction_error(), Err(ModelError::NotFitted)));
    }

    #[test]
    fn test_distributions_are_stochastic() {
        let corpus = two_topic_corpus();
        let nmf = fitted_nmf(&corpus);

        let topic_word = nmf.topic_word_matrix().unwrap();
        for topic in 0..2 {
            assert!((topic_word.row(topic).sum() - 1.0).abs() < 1e-9);
        }
        let doc_topic = nmf.document_topic_matrix().unwrap();
        for doc in 0..corpus.size() {
            assert!((doc_topic.row(doc).sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_separates_topics() {
        let corpus = two_topic_corpus();
        let nmf = fitted_nmf(&corpus);

        let first = nmf.most_likely_topic_for_document(0).unwrap();
        assert_eq!(nmf.most_likely_topic_for_document(1).unwrap(), first);
        assert_eq!(nmf.most_likely_topic_for_document(2).unwrap(), first);

        let second = nmf.most_likely_topic_for_document(3).unwrap();
        assert_eq!(nmf.most_likely_topic_for_document(5).unwrap(), second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_seeded_runs_agree() {
        let corpus = two_topic_corpus();
        let a = fitted_nmf(&corpus);
        let b = fitted_nmf(&corpus);
        assert_eq!(
            a.topic_word_matrix().unwrap(),
            b.topic_word_matrix().unwrap()
        );
        assert_eq!(
            a.reconstruction_error().unwrap(),
            b.reconstruction_error().unwrap()
        );
    }

    #[test]
    fn test_error_decreases() {
        let corpus = two_topic_corpus();

        let mut short = NonNegativeMatrixFactorization::new(
            NmfConfig::new(2).max_iterations(5).tolerance(1e-12).seed(7),
        )
        .unwrap();
        short.fit(&corpus).unwrap();

        let mut long = NonNegativeMatrixFactorization::new(
            NmfConfig::new(2).max_iterations(300).tolerance(1e-12).seed(7),
        )
        .unwrap();
        long.fit(&corpus).unwrap();

        assert!(long.reconstruction_error().unwrap() <= short.reconstruction_error().unwrap());
    }

    #[test]
    fn test_infer_distribution() {
        let corpus = two_topic_corpus();
        let nmf = fitted_nmf(&corpus);

        let vector = corpus.vectorize(&["wavelet transform signal".to_string()]);
        let distribution = nmf.infer_distribution(&vector.row(0).to_owned()).unwrap();

        assert!((distribution.sum() - 1.0).abs() < 1e-9);
        let wavelet_topic = nmf.most_likely_topic_for_document(0).unwrap();
        let inferred: usize = distribution
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(inferred, wavelet_topic);
    }
}
