//! Evaluation metrics for topic models

use ndarray::Array2;
use std::collections::HashSet;

use crate::corpus::Corpus;
use crate::models::{ModelError, TopicModel};

/// Coherence and diversity metrics computed against a corpus.
pub struct Evaluator<'a> {
    corpus: &'a Corpus,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over the corpus the model was fitted on.
    pub fn new(corpus: &'a Corpus) -> Self {
        Self { corpus }
    }

    /// UMass coherence of a topic given its top words.
    ///
    /// Uses document co-occurrence; higher (less negative) values
    /// indicate more coherent topics. Returns `None` when fewer than
    /// two of the words are in the vocabulary.
    pub fn umass_coherence(&self, top_words: &[String]) -> Option<f64> {
        let matrix = self.corpus.matrix();

        let word_ids: Vec<usize> = top_words
            .iter()
            .filter_map(|w| self.corpus.id_for_word(w))
            .collect();
        if word_ids.len() < 2 {
            return None;
        }

        let epsilon = 1.0; // Smoothing
        let mut coherence = 0.0;
        let mut pair_count = 0;

        for (i, &w1) in word_ids.iter().enumerate() {
            for &w2 in word_ids.iter().skip(i + 1) {
                let docs_with_w2 = matrix
                    .column(w2)
                    .iter()
                    .filter(|&&x| x > 0.0)
                    .count() as f64;
                if docs_with_w2 == 0.0 {
                    continue;
                }

                let docs_with_both = (0..matrix.nrows())
                    .filter(|&doc| matrix[[doc, w1]] > 0.0 && matrix[[doc, w2]] > 0.0)
                    .count() as f64;

                coherence += ((docs_with_both + epsilon) / docs_with_w2).ln();
                pair_count += 1;
            }
        }

        if pair_count > 0 {
            Some(coherence / pair_count as f64)
        } else {
            None
        }
    }

}

/// Topic diversity: share of unique words among the pooled top words.
/// 1.0 means no topic shares a top word with another.
pub fn topic_diversity(topics: &[Vec<String>]) -> f64 {
    let all_words: Vec<&str> = topics.iter().flatten().map(|s| s.as_str()).collect();
    if all_words.is_empty() {
        return 0.0;
    }
    let unique_words: HashSet<&str> = all_words.iter().copied().collect();
    unique_words.len() as f64 / all_words.len() as f64
}

/// Jaccard similarity between the word sets of two topics.
pub fn topic_overlap(topic1: &[String], topic2: &[String]) -> f64 {
    let set1: HashSet<&str> = topic1.iter().map(|s| s.as_str()).collect();
    let set2: HashSet<&str> = topic2.iter().map(|s| s.as_str()).collect();

    let intersection = set1.intersection(&set2).count();
    let union = set1.union(&set2).count();

    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Pairwise topic overlap matrix.
pub fn topic_overlap_matrix(topics: &[Vec<String>]) -> Array2<f64> {
    let n = topics.len();
    let mut matrix = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            matrix[[i, j]] = topic_overlap(&topics[i], &topics[j]);
        }
    }
    matrix
}

/// Symmetric Kullback-Leibler divergence between two distributions.
///
/// Inputs need not be normalized; zero entries are smoothed.
pub fn symmetric_kl(p: &[f64], q: &[f64]) -> f64 {
    const SMOOTHING: f64 = 1e-12;
    debug_assert_eq!(p.len(), q.len());

    let p_sum: f64 = p.iter().sum::<f64>() + SMOOTHING * p.len() as f64;
    let q_sum: f64 = q.iter().sum::<f64>() + SMOOTHING * q.len() as f64;

    let mut divergence = 0.0;
    for (&pi, &qi) in p.iter().zip(q.iter()) {
        let pi = (pi + SMOOTHING) / p_sum;
        let qi = (qi + SMOOTHING) / q_sum;
        divergence += pi * (pi / qi).ln() + qi * (qi / pi).ln();
    }
    divergence
}

/// Summary statistics for a fitted topic model
#[derive(Debug, Clone)]
pub struct ModelSummary {
    /// Number of topics
    pub num_topics: usize,
    /// Average coherence score
    pub avg_coherence: Option<f64>,
    /// Topic diversity
    pub diversity: f64,
    /// Per-topic coherence scores
    pub topic_coherences: Vec<Option<f64>>,
    /// Perplexity (LDA only)
    pub perplexity: Option<f64>,
}

impl ModelSummary {
    /// Summarize a fitted model against its corpus.
    pub fn from_model(
        model: &dyn TopicModel,
        corpus: &Corpus,
        num_words: usize,
        perplexity: Option<f64>,
    ) -> Result<Self, ModelError> {
        let evaluator = Evaluator::new(corpus);

        let mut topics = Vec::with_capacity(model.num_topics());
        for topic in 0..model.num_topics() {
            let words: Vec<String> = model
                .top_words(topic, num_words)?
                .into_iter()
                .map(|(word, _)| word)
                .collect();
            topics.push(words);
        }

        let topic_coherences: Vec<Option<f64>> = topics
            .iter()
            .map(|words| evaluator.umass_coherence(words))
            .collect();

        let scores: Vec<f64> = topic_coherences.iter().filter_map(|&c| c).collect();
        let avg_coherence = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        Ok(Self {
            num_topics: model.num_topics(),
            avg_coherence,
            diversity: topic_diversity(&topics),
            topic_coherences,
            perplexity,
        })
    }

    /// Print summary to console
    pub fn print(&self) {
        println!("=== Topic Model Summary ===");
        println!("Number of topics: {}", self.num_topics);

        if let Some(coherence) = self.avg_coherence {
            println!("Average coherence: {:.4}", coherence);
        }

        println!("Topic diversity: {:.4}", self.diversity);

        if let Some(perplexity) = self.perplexity {
            println!("Perplexity: {:.2}", perplexity);
        }

        println!("\nPer-topic coherence:");
        for (i, coherence) in self.topic_coherences.iter().enumerate() {
            match coherence {
                Some(c) => println!("  Topic {}: {:.4}", i, c),
                None => println!("  Topic {}: N/A", i),
            }
        }
    }
}
