//! Latent Dirichlet Allocation (LDA)
//!
//! Generative probabilistic topic model, fitted with collapsed Gibbs
//! sampling over the corpus term counts.

use log::{debug, warn};
use ndarray::{Array1, Array2};
use rand::prelude::*;

use super::{ModelError, TopicModel};
use crate::corpus::Corpus;

/// LDA hyperparameters
#[derive(Debug, Clone)]
pub struct LdaConfig {
    /// Number of topics
    pub num_topics: usize,
    /// Document-topic prior
    pub alpha: f64,
    /// Topic-word prior
    pub beta: f64,
    /// Number of Gibbs sampling iterations
    pub iterations: usize,
    /// Iterations discarded before recording the log-likelihood
    pub burn_in: usize,
    /// Random seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            num_topics: 10,
            alpha: 0.1,
            beta: 0.01,
            iterations: 1000,
            burn_in: 100,
            seed: None,
        }
    }
}

impl LdaConfig {
    /// Create a configuration with the given number of topics
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            ..Default::default()
        }
    }

    /// Set the document-topic prior
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the topic-word prior
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the number of sampling iterations
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the burn-in period
    pub fn burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

struct FittedLda {
    /// Topic-word probabilities (topics x terms, rows sum to 1)
    topic_word: Array2<f64>,
    /// Document-topic probabilities (documents x topics, rows sum to 1)
    doc_topic: Array2<f64>,
    /// Raw topic-word counts, kept for folding in new documents
    topic_word_counts: Array2<f64>,
    /// Word count per topic
    topic_counts: Array1<f64>,
    terms: Vec<String>,
    log_likelihood_history: Vec<f64>,
}

/// Latent Dirichlet Allocation via collapsed Gibbs sampling.
pub struct LatentDirichletAllocation {
    config: LdaConfig,
    fitted: Option<FittedLda>,
}

impl LatentDirichletAllocation {
    /// Create an LDA model from a configuration.
    pub fn new(config: LdaConfig) -> Result<Self, ModelError> {
        if config.num_topics == 0 {
            return Err(ModelError::InvalidTopicCount);
        }
        if config.alpha <= 0.0 {
            return Err(ModelError::InvalidParameter("alpha must be positive".into()));
        }
        if config.beta <= 0.0 {
            return Err(ModelError::InvalidParameter("beta must be positive".into()));
        }

        Ok(Self {
            config,
            fitted: None,
        })
    }

    /// Create an LDA model with default priors.
    pub fn with_topics(num_topics: usize) -> Result<Self, ModelError> {
        Self::new(LdaConfig::new(num_topics))
    }

    /// Model configuration
    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    /// Log-likelihood recorded after each post-burn-in iteration
    pub fn log_likelihood_history(&self) -> &[f64] {
        self.fitted
            .as_ref()
            .map(|f| f.log_likelihood_history.as_slice())
            .unwrap_or(&[])
    }

    /// Fit the model on the corpus term counts.
    pub fn fit(&mut self, corpus: &Corpus) -> Result<(), ModelError> {
        let n_docs = corpus.size();
        let n_terms = corpus.vocabulary_size();
        if n_docs == 0 || n_terms == 0 {
            return Err(ModelError::EmptyCorpus);
        }
        if !corpus.is_count_based() {
            // Gibbs sampling needs integer counts; TF-IDF weights are floored
            warn!("LDA expects a count-based corpus; TF-IDF weights will be truncated");
        }

        let n_topics = self.config.num_topics;
        let alpha = self.config.alpha;
        let beta = self.config.beta;
        let beta_sum = beta * n_terms as f64;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // Expand the count matrix into per-document word occurrence lists
        let matrix = corpus.matrix();
        let mut doc_words: Vec<Vec<usize>> = Vec::with_capacity(n_docs);
        for doc in 0..n_docs {
            let mut words = Vec::new();
            for term in 0..n_terms {
                let count = matrix[[doc, term]] as usize;
                for _ in 0..count {
                    words.push(term);
                }
            }
            doc_words.push(words);
        }

        // Random initial topic assignment per word occurrence
        let mut topic_word_counts = Array2::<f64>::zeros((n_topics, n_terms));
        let mut doc_topic_counts = Array2::<f64>::zeros((n_docs, n_topics));
        let mut topic_counts = Array1::<f64>::zeros(n_topics);
        let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(n_docs);

        for (doc, words) in doc_words.iter().enumerate() {
            let mut doc_assignments = Vec::with_capacity(words.len());
            for &term in words {
                let topic = rng.gen_range(0..n_topics);
                doc_assignments.push(topic);
                topic_word_counts[[topic, term]] += 1.0;
                doc_topic_counts[[doc, topic]] += 1.0;
                topic_counts[topic] += 1.0;
            }
            assignments.push(doc_assignments);
        }

        let mut log_likelihood_history = Vec::new();
        let mut probs = vec![0.0; n_topics];

        for iteration in 0..self.config.iterations {
            for (doc, words) in doc_words.iter().enumerate() {
                let doc_total = words.len() as f64;
                for (position, &term) in words.iter().enumerate() {
                    let old_topic = assignments[doc][position];

                    topic_word_counts[[old_topic, term]] -= 1.0;
                    doc_topic_counts[[doc, old_topic]] -= 1.0;
                    topic_counts[old_topic] -= 1.0;

                    // Full conditional: P(z|rest) ∝ (n_dk + α)(n_kw + β)/(n_k + βV)
                    let mut total = 0.0;
                    for topic in 0..n_topics {
                        let doc_part = (doc_topic_counts[[doc, topic]] + alpha)
                            / (doc_total - 1.0 + n_topics as f64 * alpha);
                        let word_part = (topic_word_counts[[topic, term]] + beta)
                            / (topic_counts[topic] + beta_sum);
                        let p = doc_part * word_part;
                        total += p;
                        probs[topic] = p;
                    }

                    let threshold = rng.gen::<f64>() * total;
                    let mut cumulative = 0.0;
                    let mut new_topic = n_topics - 1;
                    for (topic, &p) in probs.iter().enumerate() {
                        cumulative += p;
                        if cumulative >= threshold {
                            new_topic = topic;
                            break;
                        }
                    }

                    topic_word_counts[[new_topic, term]] += 1.0;
                    doc_topic_counts[[doc, new_topic]] += 1.0;
                    topic_counts[new_topic] += 1.0;
                    assignments[doc][position] = new_topic;
                }
            }

            if iteration >= self.config.burn_in {
                let ll = log_likelihood(
                    &topic_word_counts,
                    &doc_topic_counts,
                    &topic_counts,
                    alpha,
                    beta,
                    beta_sum,
                );
                log_likelihood_history.push(ll);
            }

            if (iteration + 1) % 100 == 0 {
                debug!(
                    "gibbs sampling: iteration {}/{}",
                    iteration + 1,
                    self.config.iterations
                );
            }
        }

        // Posterior point estimates with prior smoothing
        let mut topic_word = Array2::<f64>::zeros((n_topics, n_terms));
        for topic in 0..n_topics {
            let denominator = topic_counts[topic] + beta_sum;
            for term in 0..n_terms {
                topic_word[[topic, term]] = (topic_word_counts[[topic, term]] + beta) / denominator;
            }
        }

        let mut doc_topic = Array2::<f64>::zeros((n_docs, n_topics));
        for doc in 0..n_docs {
            let denominator = doc_words[doc].len() as f64 + n_topics as f64 * alpha;
            for topic in 0..n_topics {
                doc_topic[[doc, topic]] = (doc_topic_counts[[doc, topic]] + alpha) / denominator;
            }
        }

        self.fitted = Some(FittedLda {
            topic_word,
            doc_topic,
            topic_word_counts,
            topic_counts,
            terms: corpus.terms().to_vec(),
            log_likelihood_history,
        });

        Ok(())
    }

    /// Perplexity of the model on a corpus; lower is better.
    pub fn perplexity(&self, corpus: &Corpus) -> Result<f64, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let matrix = corpus.matrix();
        let n_terms = fitted.topic_word.ncols().min(matrix.ncols());

        let mut log_likelihood = 0.0;
        let mut total_words = 0.0;

        for doc in 0..matrix.nrows() {
            let doc_topic = if doc < fitted.doc_topic.nrows() {
                fitted.doc_topic.row(doc).to_owned()
            } else {
                self.infer_distribution(&matrix.row(doc).to_owned())?
            };

            for term in 0..n_terms {
                let count = matrix[[doc, term]];
                if count > 0.0 {
                    let mut prob = 0.0;
                    for topic in 0..self.config.num_topics {
                        prob += fitted.topic_word[[topic, term]] * doc_topic[topic];
                    }
                    log_likelihood += count * prob.ln();
                    total_words += count;
                }
            }
        }

        if total_words == 0.0 {
            return Err(ModelError::EmptyCorpus);
        }
        Ok((-log_likelihood / total_words).exp())
    }
}

fn log_likelihood(
    topic_word_counts: &Array2<f64>,
    doc_topic_counts: &Array2<f64>,
    topic_counts: &Array1<f64>,
    alpha: f64,
    beta: f64,
    beta_sum: f64,
) -> f64 {
    let n_topics = topic_word_counts.nrows();
    let n_terms = topic_word_counts.ncols();
    let mut ll = 0.0;

    for topic in 0..n_topics {
        for term in 0..n_terms {
            let count = topic_word_counts[[topic, term]];
            if count > 0.0 {
                let prob = (count + beta) / (topic_counts[topic] + beta_sum);
                ll += count * prob.ln();
            }
        }
    }

    for doc in 0..doc_topic_counts.nrows() {
        let doc_total = doc_topic_counts.row(doc).sum();
        for topic in 0..n_topics {
            let count = doc_topic_counts[[doc, topic]];
            if count > 0.0 {
                let prob = (count + alpha) / (doc_total + n_topics as f64 * alpha);
                ll += count * prob.ln();
            }
        }
    }

    ll
}

impl TopicModel for LatentDirichletAllocation {
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

    /// Fold a new document in by assigning each word occurrence to its
    /// most probable topic, then smoothing with the document prior.
    fn infer_distribution(&self, document_vector: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        let n_topics = self.config.num_topics;
        let n_terms = fitted.topic_word_counts.ncols();
        let alpha = self.config.alpha;
        let beta = self.config.beta;
        let beta_sum = beta * n_terms as f64;

        let mut topic_counts = Array1::<f64>::zeros(n_topics);
        let mut total_words = 0.0;

        for term in 0..document_vector.len().min(n_terms) {
            let count = document_vector[term] as usize;
            if count == 0 {
                continue;
            }

            let mut best_topic = 0;
            let mut best_prob = f64::MIN;
            for topic in 0..n_topics {
                let prob = (fitted.topic_word_counts[[topic, term]] + beta)
                    / (fitted.topic_counts[topic] + beta_sum);
                if prob > best_prob {
                    best_prob = prob;
                    best_topic = topic;
                }
            }
            topic_counts[best_topic] += count as f64;
            total_words += count as f64;
        }

        let denominator = total_words + n_topics as f64 * alpha;
        let mut distribution = Array1::<f64>::zeros(n_topics);
        for topic in 0..n_topics {
            distribution[topic] = (topic_counts[topic] + alpha) / denominator;
        }
        Ok(distribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, CorpusConfig, Document, Vectorization};

    fn two_topic_corpus() -> Corpus {
        // Two clearly separated vocabularies
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
            .vectorization(Vectorization::Tf)
            .min_absolute_frequency(1)
            .max_relative_frequency(1.0);
        Corpus::from_documents(documents, config).unwrap()
    }

    fn fitted_lda(corpus: &Corpus) -> LatentDirichletAllocation {
        let config = LdaConfig::new(2)
            .iterations(150)
            .burn_in(20)
            .seed(42);
        let mut lda = LatentDirichletAllocation::new(config).unwrap();
        lda.fit(corpus).unwrap();
        lda
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            LatentDirichletAllocation::with_topics(0),
            Err(ModelError::InvalidTopicCount)
        ));
        assert!(LatentDirichletAllocation::new(LdaConfig::new(2).alpha(0.0)).is_err());
    }

    #[test]
    fn test_not_fitted() {
        let lda = LatentDirichletAllocation::with_topics(2).unwrap();
        assert!(matches!(
            lda.topic_word_matrix(),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn test_distributions_are_stochastic() {
        let corpus = two_topic_corpus();
        let lda = fitted_lda(&corpus);

        let topic_word = lda.topic_word_matrix().unwrap();
        for topic in 0..2 {
            let row_sum: f64 = topic_word.row(topic).sum();
            assert!((row_sum - 1.0).abs() < 1e-9);
        }

        let doc_topic = lda.document_topic_matrix().unwrap();
        for doc in 0..corpus.size() {
            let row_sum: f64 = doc_topic.row(doc).sum();
            assert!((row_sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_separates_topics() {
        let corpus = two_topic_corpus();
        let lda = fitted_lda(&corpus);

        let first = lda.most_likely_topic_for_document(0).unwrap();
        assert_eq!(lda.most_likely_topic_for_document(1).unwrap(), first);
        assert_eq!(lda.most_likely_topic_for_document(2).unwrap(), first);

        let second = lda.most_likely_topic_for_document(3).unwrap();
        assert_eq!(lda.most_likely_topic_for_document(4).unwrap(), second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_seeded_runs_agree() {
        let corpus = two_topic_corpus();
        let a = fitted_lda(&corpus);
        let b = fitted_lda(&corpus);
        assert_eq!(a.topic_word_matrix().unwrap(), b.topic_word_matrix().unwrap());
    }

    #[test]
    fn test_perplexity() {
        let corpus = two_topic_corpus();
        let lda = fitted_lda(&corpus);
        let perplexity = lda.perplexity(&corpus).unwrap();
        assert!(perplexity.is_finite());
        assert!(perplexity > 0.0);
    }

    #[test]
    fn test_infer_distribution() {
        let corpus = two_topic_corpus();
        let lda = fitted_lda(&corpus);

        let vector = corpus.vectorize(&["wavelet transform signal".to_string()]);
        let distribution = lda.infer_distribution(&vector.row(0).to_owned()).unwrap();

        assert!((distribution.sum() - 1.0).abs() < 1e-9);
        let wavelet_topic = lda.most_likely_topic_for_document(0).unwrap();
        let inferred: usize = distribution
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(inferred, wavelet_topic);
    }

    #[test]
    fn test_log_likelihood_history() {
        let corpus = two_topic_corpus();
        let lda = fitted_lda(&corpus);
        assert_eq!(lda.log_likelihood_history().len(), 150 - 20);
    }
}
