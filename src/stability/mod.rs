//! Metrics for choosing the number of topics
//!
//! Fits models over a range of topic counts and scores each candidate:
//! - Greene: agreement of top-term rankings across subsample runs
//! - Arun: symmetric KL between singular values of the topic-word
//!   matrix and the length-weighted document-topic distribution
//! - Brunet: consensus of document co-clustering across random restarts
//! - Perplexity: held-in perplexity curve (LDA only)

use log::info;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use thiserror::Error;

use crate::corpus::{Corpus, CorpusError};
use crate::models::{
    LatentDirichletAllocation, LdaConfig, ModelError, NmfConfig, NonNegativeMatrixFactorization,
    TopicModel,
};
use crate::utils::evaluation::symmetric_kl;

/// Errors raised while computing stability metrics
#[derive(Error, Debug)]
pub enum StabilityError {
    #[error("Invalid topic count range: {min}..={max}")]
    InvalidRange { min: usize, max: usize },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// Which model family to evaluate, with its base hyperparameters.
/// The topic count and seed are overridden for each candidate run.
#[derive(Debug, Clone)]
pub enum ModelKind {
    Lda(LdaConfig),
    Nmf(NmfConfig),
}

impl ModelKind {
    /// LDA with a sampling budget suited to repeated metric runs.
    pub fn default_lda() -> Self {
        ModelKind::Lda(LdaConfig::new(0).iterations(200).burn_in(20))
    }

    /// NMF with default settings.
    pub fn default_nmf() -> Self {
        ModelKind::Nmf(NmfConfig::new(0))
    }

    fn fit(
        &self,
        corpus: &Corpus,
        num_topics: usize,
        seed: u64,
    ) -> Result<Box<dyn TopicModel>, ModelError> {
        match self {
            ModelKind::Lda(base) => {
                let config = LdaConfig {
                    num_topics,
                    seed: Some(seed),
                    ..base.clone()
                };
                let mut model = LatentDirichletAllocation::new(config)?;
                model.fit(corpus)?;
                Ok(Box::new(model))
            }
            ModelKind::Nmf(base) => {
                let config = NmfConfig {
                    num_topics,
                    seed,
                    ..base.clone()
                };
                let mut model = NonNegativeMatrixFactorization::new(config)?;
                model.fit(corpus)?;
                Ok(Box::new(model))
            }
        }
    }
}

/// Options for the Greene metric
#[derive(Debug, Clone)]
pub struct GreeneOptions {
    /// Ranking depth compared between runs
    pub top_n_words: usize,
    /// Number of subsample runs per candidate
    pub tau: usize,
    /// Share of documents kept in each subsample
    pub sample_ratio: f64,
    /// Step between candidate topic counts
    pub step: usize,
    pub seed: u64,
}

impl Default for GreeneOptions {
    fn default() -> Self {
        Self {
            top_n_words: 10,
            tau: 10,
            sample_ratio: 0.8,
            step: 1,
            seed: 1,
        }
    }
}

/// Options for the Brunet metric
#[derive(Debug, Clone)]
pub struct BrunetOptions {
    /// Number of random restarts per candidate
    pub runs: usize,
    pub seed: u64,
}

impl Default for BrunetOptions {
    fn default() -> Self {
        Self { runs: 10, seed: 1 }
    }
}

fn check_range(min_k: usize, max_k: usize) -> Result<(), StabilityError> {
    if min_k == 0 || max_k < min_k {
        return Err(StabilityError::InvalidRange {
            min: min_k,
            max: max_k,
        });
    }
    Ok(())
}

/// Greene metric: mean agreement between the reference model's
/// top-term rankings and rankings from models fitted on subsamples.
/// Higher is better; stable topic counts score close to 1.
pub fn greene_metric(
    corpus: &Corpus,
    kind: &ModelKind,
    min_k: usize,
    max_k: usize,
    options: &GreeneOptions,
) -> Result<Vec<(usize, f64)>, StabilityError> {
    check_range(min_k, max_k)?;

    let mut scores = Vec::new();
    let mut k = min_k;
    while k <= max_k {
        let reference = kind.fit(corpus, k, options.seed)?;
        let reference_topics = ranked_terms(reference.as_ref(), options.top_n_words)?;

        let mut agreements = Vec::with_capacity(options.tau);
        for run in 0..options.tau {
            let run_seed = options.seed + 1 + run as u64;
            let sample = subsample_corpus(corpus, options.sample_ratio, run_seed)?;
            let model = kind.fit(&sample, k, run_seed)?;
            let sample_topics = ranked_terms(model.as_ref(), options.top_n_words)?;
            agreements.push(ranking_agreement(&reference_topics, &sample_topics));
        }

        let score = agreements.iter().sum::<f64>() / agreements.len().max(1) as f64;
        info!("greene metric: k={}, agreement={:.4}", k, score);
        scores.push((k, score));
        k += options.step.max(1);
    }

    Ok(scores)
}

/// Arun metric: symmetric KL divergence between the singular-value
/// distribution of the topic-word matrix and the length-weighted
/// document-topic distribution. Lower is better.
pub fn arun_metric(
    corpus: &Corpus,
    kind: &ModelKind,
    min_k: usize,
    max_k: usize,
    seed: u64,
) -> Result<Vec<(usize, f64)>, StabilityError> {
    check_range(min_k, max_k)?;

    let lengths: Vec<f64> = corpus
        .document_lengths()
        .iter()
        .map(|&l| l as f64)
        .collect();

    let mut scores = Vec::new();
    for k in min_k..=max_k {
        let model = kind.fit(corpus, k, seed)?;

        let mut singular = singular_values(model.topic_word_matrix()?, k);
        singular.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let doc_topic = model.document_topic_matrix()?;
        let mut weighted = vec![0.0; k];
        for (doc, &length) in lengths.iter().enumerate() {
            for topic in 0..k {
                weighted[topic] += length * doc_topic[[doc, topic]];
            }
        }
        weighted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        // Power iteration yields at most min(k, vocabulary) values
        weighted.truncate(singular.len());

        let score = symmetric_kl(&singular, &weighted);
        info!("arun metric: k={}, divergence={:.4}", k, score);
        scores.push((k, score));
    }

    Ok(scores)
}

/// Brunet-style consensus metric: dispersion of the consensus matrix of
/// document co-clustering across random restarts. Scores lie in
/// [0, 1]; 1 means every restart clusters documents identically.
pub fn brunet_metric(
    corpus: &Corpus,
    kind: &ModelKind,
    min_k: usize,
    max_k: usize,
    options: &BrunetOptions,
) -> Result<Vec<(usize, f64)>, StabilityError> {
    check_range(min_k, max_k)?;

    let n_docs = corpus.size();
    let mut scores = Vec::new();

    for k in min_k..=max_k {
        let mut consensus = Array2::<f64>::zeros((n_docs, n_docs));

        for run in 0..options.runs {
            let model = kind.fit(corpus, k, options.seed + run as u64)?;
            let mut dominant = Vec::with_capacity(n_docs);
            for doc in 0..n_docs {
                dominant.push(model.most_likely_topic_for_document(doc)?);
            }
            for i in 0..n_docs {
                for j in 0..n_docs {
                    if dominant[i] == dominant[j] {
                        consensus[[i, j]] += 1.0;
                    }
                }
            }
        }

        consensus.mapv_inplace(|x| x / options.runs.max(1) as f64);

        // Dispersion: 1 when every entry is 0 or 1, lower when runs disagree
        let mut dispersion = 0.0;
        for &value in consensus.iter() {
            dispersion += 4.0 * (value - 0.5) * (value - 0.5);
        }
        let score = dispersion / (n_docs * n_docs) as f64;
        info!("brunet metric: k={}, dispersion={:.4}", k, score);
        scores.push((k, score));
    }

    Ok(scores)
}

/// Perplexity curve for LDA over a topic count range. Lower is better.
pub fn perplexity_metric(
    corpus: &Corpus,
    base: &LdaConfig,
    min_k: usize,
    max_k: usize,
    seed: u64,
) -> Result<Vec<(usize, f64)>, StabilityError> {
    check_range(min_k, max_k)?;

    let mut scores = Vec::new();
    for k in min_k..=max_k {
        let config = LdaConfig {
            num_topics: k,
            seed: Some(seed),
            ..base.clone()
        };
        let mut model = LatentDirichletAllocation::new(config)?;
        model.fit(corpus)?;
        let perplexity = model.perplexity(corpus)?;
        info!("perplexity metric: k={}, perplexity={:.2}", k, perplexity);
        scores.push((k, perplexity));
    }

    Ok(scores)
}

/// Top-term rankings of every topic of a model.
fn ranked_terms(model: &dyn TopicModel, n: usize) -> Result<Vec<Vec<String>>, ModelError> {
    (0..model.num_topics())
        .map(|topic| {
            Ok(model
                .top_words(topic, n)?
                .into_iter()
                .map(|(word, _)| word)
                .collect())
        })
        .collect()
}

/// Rebuild a corpus from a random document subset, keeping the
/// construction parameters of the original.
fn subsample_corpus(corpus: &Corpus, ratio: f64, seed: u64) -> Result<Corpus, CorpusError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..corpus.size()).collect();
    indices.shuffle(&mut rng);
    let keep = ((corpus.size() as f64 * ratio).ceil() as usize).max(1);
    indices.truncate(keep);
    indices.sort_unstable();

    let mut documents = Vec::with_capacity(keep);
    for (new_id, &index) in indices.iter().enumerate() {
        let mut doc = corpus.documents()[index].clone();
        doc.id = new_id;
        documents.push(doc);
    }

    Corpus::from_documents(documents, corpus.config().clone())
}

/// Mean agreement between two sets of top-term rankings.
///
/// Topics are matched greedily on average Jaccard similarity over
/// ranking prefixes; the agreement is the mean similarity of the
/// matched pairs.
fn ranking_agreement(reference: &[Vec<String>], sample: &[Vec<String>]) -> f64 {
    if reference.is_empty() || sample.is_empty() {
        return 0.0;
    }

    let mut similarities = Array2::<f64>::zeros((reference.len(), sample.len()));
    for (i, ref_topic) in reference.iter().enumerate() {
        for (j, sample_topic) in sample.iter().enumerate() {
            similarities[[i, j]] = average_jaccard(ref_topic, sample_topic);
        }
    }

    let pairs = reference.len().min(sample.len());
    let mut used_rows = vec![false; reference.len()];
    let mut used_cols = vec![false; sample.len()];
    let mut total = 0.0;

    for _ in 0..pairs {
        let mut best = 0.0;
        let mut best_pair = None;
        for i in 0..reference.len() {
            if used_rows[i] {
                continue;
            }
            for j in 0..sample.len() {
                if used_cols[j] {
                    continue;
                }
                if similarities[[i, j]] >= best {
                    best = similarities[[i, j]];
                    best_pair = Some((i, j));
                }
            }
        }
        if let Some((i, j)) = best_pair {
            used_rows[i] = true;
            used_cols[j] = true;
            total += best;
        }
    }

    total / pairs as f64
}

/// Average Jaccard similarity over the ranking prefixes of two
/// ranked term lists.
fn average_jaccard(a: &[String], b: &[String]) -> f64 {
    let depth = a.len().min(b.len());
    if depth == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for d in 1..=depth {
        let prefix_a: std::collections::HashSet<&str> =
            a[..d].iter().map(|s| s.as_str()).collect();
        let prefix_b: std::collections::HashSet<&str> =
            b[..d].iter().map(|s| s.as_str()).collect();
        let intersection = prefix_a.intersection(&prefix_b).count() as f64;
        let union = prefix_a.union(&prefix_b).count() as f64;
        total += intersection / union;
    }
    total / depth as f64
}

/// Singular values of a matrix via power iteration with deflation.
fn singular_values(matrix: &Array2<f64>, k: usize) -> Vec<f64> {
    let k = k.min(matrix.nrows()).min(matrix.ncols());
    let mut work = matrix.to_owned();
    let mut values = Vec::with_capacity(k);

    for _ in 0..k {
        let (sigma, left, right) = power_iteration(&work, 100);
        values.push(sigma);

        // Deflate the found component
        for row in 0..work.nrows() {
            for col in 0..work.ncols() {
                work[[row, col]] -= sigma * left[row] * right[col];
            }
        }
    }

    values
}

/// Largest singular triplet of a matrix.
fn power_iteration(matrix: &Array2<f64>, max_iter: usize) -> (f64, Array1<f64>, Array1<f64>) {
    let (m, n) = (matrix.nrows(), matrix.ncols());

    // Deterministic pseudo-random start vector
    let mut v: Array1<f64> = Array1::from_iter((0..n).map(|i| ((i + 1) as f64).sin()));
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    v /= norm.max(1e-12);

    let mut sigma = 0.0;

    for _ in 0..max_iter {
        let u = matrix.dot(&v);
        let norm_u = u.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm_u < 1e-10 {
            break;
        }
        let u = u / norm_u;

        let v_new = matrix.t().dot(&u);
        sigma = v_new.iter().map(|x| x * x).sum::<f64>().sqrt();
        if sigma < 1e-10 {
            break;
        }
        v = v_new / sigma;
    }

    let mut u = matrix.dot(&v);
    let norm_u = u.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_u > 1e-10 {
        u /= norm_u;
    }

    (sigma, u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{CorpusConfig, Document, Vectorization};

    fn metric_corpus() -> Corpus {
        let documents = vec![
            Document::new(0, "", "wavelet wavelet transform signal transform signal"),
            Document::new(1, "", "signal wavelet transform transform signal wavelet"),
            Document::new(2, "", "wavelet signal signal transform wavelet transform"),
            Document::new(3, "", "transform wavelet signal wavelet transform signal"),
            Document::new(4, "", "genome protein sequence protein genome sequence"),
            Document::new(5, "", "protein sequence genome sequence protein genome"),
            Document::new(6, "", "sequence genome protein genome sequence protein"),
            Document::new(7, "", "protein genome sequence protein sequence genome"),
        ];
        let config = CorpusConfig::default()
            .language(None)
            .vectorization(Vectorization::Tf)
            .min_absolute_frequency(1)
            .max_relative_frequency(1.0);
        Corpus::from_documents(documents, config).unwrap()
    }

    fn fast_nmf() -> ModelKind {
        ModelKind::Nmf(NmfConfig::new(0).max_iterations(100))
    }

    #[test]
    fn test_invalid_range() {
        let corpus = metric_corpus();
        assert!(matches!(
            arun_metric(&corpus, &fast_nmf(), 3, 2, 1),
            Err(StabilityError::InvalidRange { min: 3, max: 2 })
        ));
        assert!(matches!(
            arun_metric(&corpus, &fast_nmf(), 0, 2, 1),
            Err(StabilityError::InvalidRange { min: 0, max: 2 })
        ));
    }

    #[test]
    fn test_arun_metric_range() {
        let corpus = metric_corpus();
        let scores = arun_metric(&corpus, &fast_nmf(), 2, 4, 1).unwrap();

        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].0, 2);
        assert_eq!(scores[2].0, 4);
        for (_, score) in &scores {
            assert!(score.is_finite());
            assert!(*score >= 0.0);
        }
    }

    #[test]
    fn test_greene_metric() {
        let corpus = metric_corpus();
        let options = GreeneOptions {
            top_n_words: 3,
            tau: 3,
            ..Default::default()
        };
        let scores = greene_metric(&corpus, &fast_nmf(), 2, 3, &options).unwrap();

        assert_eq!(scores.len(), 2);
        for (_, score) in &scores {
            assert!(*score >= 0.0 && *score <= 1.0);
        }
        // The corpus has two clearly separated vocabularies
        assert!(scores[0].1 > 0.5);
    }

    #[test]
    fn test_greene_step() {
        let corpus = metric_corpus();
        let options = GreeneOptions {
            top_n_words: 3,
            tau: 2,
            step: 2,
            ..Default::default()
        };
        let scores = greene_metric(&corpus, &fast_nmf(), 2, 4, &options).unwrap();
        let ks: Vec<usize> = scores.iter().map(|(k, _)| *k).collect();
        assert_eq!(ks, vec![2, 4]);
    }

    #[test]
    fn test_brunet_metric() {
        let corpus = metric_corpus();
        let options = BrunetOptions {
            runs: 3,
            ..Default::default()
        };
        let scores = brunet_metric(&corpus, &fast_nmf(), 2, 3, &options).unwrap();

        assert_eq!(scores.len(), 2);
        for (_, score) in &scores {
            assert!(*score >= 0.0 && *score <= 1.0);
        }
        // NMF with a fixed corpus structure clusters k=2 consistently
        assert!(scores[0].1 > 0.8);
    }

    #[test]
    fn test_perplexity_metric() {
        let corpus = metric_corpus();
        let base = LdaConfig::new(0).iterations(50).burn_in(10);
        let scores = perplexity_metric(&corpus, &base, 2, 3, 1).unwrap();

        assert_eq!(scores.len(), 2);
        for (_, score) in &scores {
            assert!(score.is_finite());
            assert!(*score > 0.0);
        }
    }

    #[test]
    fn test_average_jaccard() {
        let a = vec!["x".to_string(), "y".to_string()];
        assert!((average_jaccard(&a, &a) - 1.0).abs() < 1e-12);

        let b = vec!["p".to_string(), "q".to_string()];
        assert_eq!(average_jaccard(&a, &b), 0.0);
    }

    #[test]
    fn test_singular_values_match_known_matrix() {
        // Diagonal matrix: singular values are the absolute diagonal
        let matrix = ndarray::arr2(&[[3.0, 0.0], [0.0, 2.0]]);
        let mut values = singular_values(&matrix, 2);
        values.sort_by(|a, b| b.partial_cmp(a).unwrap());

        assert!((values[0] - 3.0).abs() < 1e-6);
        assert!((values[1] - 2.0).abs() < 1e-6);
    }
}
