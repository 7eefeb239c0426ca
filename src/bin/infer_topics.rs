//! Topic inference example
//!
//! This example demonstrates how to:
//! - Load documents from a dataset (or fall back to a built-in sample)
//! - Build a vectorized corpus
//! - Fit LDA and NMF topic models
//! - Evaluate model quality with coherence and perplexity

use anyhow::Result;
use std::path::PathBuf;
use tom_lib::corpus::{Corpus, CorpusConfig, Document, Vectorization};
use tom_lib::models::{
    LatentDirichletAllocation, LdaConfig, NmfConfig, NonNegativeMatrixFactorization, TopicModel,
};
use tom_lib::utils::evaluation::ModelSummary;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Topic Inference Example ===\n");

    let documents = load_documents()?;
    println!("Loaded {} documents\n", documents.len());

    let num_topics = 4;

    // Step 1: Count-based corpus for LDA
    println!("Step 1: Building count-based corpus...");
    let lda_corpus = Corpus::from_documents(
        documents.clone(),
        CorpusConfig::default()
            .vectorization(Vectorization::Tf)
            .min_absolute_frequency(2)
            .max_relative_frequency(0.9),
    )?;
    println!(
        "  {} documents x {} terms",
        lda_corpus.size(),
        lda_corpus.vocabulary_size()
    );

    // Step 2: Fit LDA
    println!("\nStep 2: Fitting LDA with {} topics...", num_topics);
    let lda_config = LdaConfig::new(num_topics)
        .alpha(0.1)
        .beta(0.01)
        .iterations(500)
        .burn_in(50)
        .seed(42);
    let mut lda = LatentDirichletAllocation::new(lda_config)?;
    lda.fit(&lda_corpus)?;

    println!("\n--- LDA topics ---\n");
    for topic in lda.describe(8)? {
        println!("{}\n", topic);
    }

    let perplexity = lda.perplexity(&lda_corpus)?;
    let summary = ModelSummary::from_model(&lda, &lda_corpus, 10, Some(perplexity))?;
    summary.print();

    // Step 3: Fit NMF on a TF-IDF corpus
    println!("\nStep 3: Fitting NMF with {} topics...", num_topics);
    let nmf_corpus = Corpus::from_documents(
        documents.clone(),
        CorpusConfig::default()
            .min_absolute_frequency(2)
            .max_relative_frequency(0.9),
    )?;
    let mut nmf =
        NonNegativeMatrixFactorization::new(NmfConfig::new(num_topics).seed(42))?;
    nmf.fit(&nmf_corpus)?;

    println!(
        "  Converged after {} iterations, reconstruction error {:.4}\n",
        nmf.iterations_run()?,
        nmf.reconstruction_error()?
    );

    println!("--- NMF topics ---\n");
    for topic in nmf.describe(8)? {
        println!("{}\n", topic);
    }

    // Step 4: Document analysis
    println!("=== Document-Topic Analysis ===\n");
    for doc_id in 0..lda_corpus.size().min(8) {
        let document = lda_corpus.document(doc_id)?;
        let topic = lda.most_likely_topic_for_document(doc_id)?;
        let weight = lda.topic_distribution_for_document(doc_id)?[topic];
        println!(
            "  Doc {:2}: Topic {} ({:.1}%) - {}",
            doc_id,
            topic,
            weight * 100.0,
            document.title
        );
    }

    // Step 5: Fold in a new document
    println!("\n=== Folding In a New Document ===\n");
    let new_text = "Spectral analysis of noisy signals with wavelet decompositions".to_string();
    println!("New document: {}\n", new_text);

    let vector = lda_corpus.vectorize(&[new_text]);
    let distribution = lda.infer_distribution(&vector.row(0).to_owned())?;

    let mut weights: Vec<(usize, f64)> = distribution.iter().cloned().enumerate().collect();
    weights.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    for (topic, weight) in weights {
        println!("  Topic {}: {:.1}%", topic, weight * 100.0);
    }

    println!("\n=== Done ===");
    Ok(())
}

/// Load the dataset given on the command line, or fall back to a
/// built-in sample of paper abstracts.
fn load_documents() -> Result<Vec<Document>> {
    if let Some(path) = std::env::args().nth(1) {
        let path = PathBuf::from(path);
        println!("Loading dataset from {:?}", path);
        return Ok(tom_lib::corpus::document::load_tsv(&path)?);
    }

    println!("No dataset given, using built-in sample documents");
    Ok(sample_documents())
}

fn sample_documents() -> Vec<Document> {
    let raw: Vec<(&str, &str, Vec<&str>, &str)> = vec![
        // Signal processing
        ("Wavelet decompositions of stationary signals",
         "We study wavelet transform methods for the analysis of stationary signals and compare decomposition bases for denoising applications with signal reconstruction error bounds.",
         vec!["Mallat S."], "2013-02-11"),
        ("Adaptive filtering for noisy signal reconstruction",
         "An adaptive filter bank is proposed for signal reconstruction under heavy noise, with wavelet shrinkage and spectral thresholding of the transform coefficients.",
         vec!["Mallat S.", "Donoho D."], "2013-09-30"),
        ("Spectral estimation with orthogonal transforms",
         "Orthogonal transform methods for spectral estimation of sampled signals are reviewed, including wavelet packets and windowed Fourier analysis of noisy signals.",
         vec!["Donoho D."], "2014-01-20"),
        ("Sparse signal recovery with wavelet dictionaries",
         "Sparse recovery of signals from incomplete measurements is analyzed using overcomplete wavelet dictionaries and greedy pursuit of transform coefficients.",
         vec!["Candes E.", "Donoho D."], "2014-07-02"),
        // Genomics
        ("Assembly of short read genome sequences",
         "We present an assembler for short read sequence data that reconstructs genome fragments with a de Bruijn graph over sequence reads and protein coding regions.",
         vec!["Myers G."], "2013-03-18"),
        ("Protein coding region annotation in draft genomes",
         "A pipeline for the annotation of protein coding regions in draft genome assemblies, combining sequence homology with statistical models of coding potential.",
         vec!["Myers G.", "Birney E."], "2013-11-05"),
        ("Comparative analysis of bacterial genome sequences",
         "Comparative sequence analysis across bacterial genomes reveals conserved protein families and genome rearrangements shaped by horizontal transfer.",
         vec!["Birney E."], "2014-04-22"),
        ("Sequence alignment heuristics for large genomes",
         "Heuristic seed and extend strategies for aligning protein and genome sequences at scale, with sensitivity close to exact sequence alignment.",
         vec!["Myers G."], "2014-10-09"),
        // Social networks
        ("Community detection in social interaction networks",
         "We evaluate modularity based community detection on large social networks and measure the stability of detected communities under graph perturbations.",
         vec!["Guille A.", "Favre C."], "2013-05-27"),
        ("Information diffusion in online networks",
         "A model of information diffusion over social networks is fitted to cascades of shared content, capturing community structure and temporal dynamics of the network.",
         vec!["Guille A."], "2013-12-16"),
        ("Influence maximization under cascade models",
         "Seed selection algorithms for influence maximization in diffusion cascades over social networks, with approximation guarantees on community coverage.",
         vec!["Favre C."], "2014-03-03"),
        ("Temporal evolution of collaboration networks",
         "The temporal evolution of co-authorship networks is analyzed, relating network densification to emerging communities and diffusion of research topics.",
         vec!["Guille A.", "Favre C."], "2014-09-15"),
        // Machine translation
        ("Phrase based statistical machine translation",
         "A phrase based statistical translation system is trained on parallel corpora, with alignment models and language model rescoring of candidate translations.",
         vec!["Koehn P."], "2013-06-24"),
        ("Word alignment models for parallel corpora",
         "Generative word alignment models for parallel corpora are compared, measuring alignment quality and downstream translation accuracy.",
         vec!["Koehn P.", "Och F."], "2013-10-21"),
        ("Language model smoothing for translation systems",
         "Smoothing techniques for n-gram language models are evaluated within a statistical translation pipeline on multiple language pairs and corpora.",
         vec!["Och F."], "2014-02-17"),
        ("Domain adaptation of translation models",
         "Methods for adapting statistical translation models to new domains using monolingual corpora selection and translation model interpolation.",
         vec!["Koehn P."], "2014-08-11"),
    ];

    raw.into_iter()
        .enumerate()
        .map(|(id, (title, text, authors, date))| {
            let mut doc = Document::new(id, title, text).with_authors(&authors);
            doc.date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
            doc
        })
        .collect()
}
