//! Estimate a suitable number of topics for a dataset
//!
//! Runs the Greene, Arun and Brunet stability metrics (and the LDA
//! perplexity curve) over a range of topic counts and writes one CSV
//! per metric.
//!
//! Usage: estimate_topics <dataset.tsv> <min_topics> <max_topics> [output_dir]

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tom_lib::corpus::{Corpus, CorpusConfig, Vectorization};
use tom_lib::models::LdaConfig;
use tom_lib::stability::{
    arun_metric, brunet_metric, greene_metric, perplexity_metric, BrunetOptions, GreeneOptions,
    ModelKind,
};
use tom_lib::utils::io::{ensure_directory, save_metric_csv};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!("usage: estimate_topics <dataset.tsv> <min_topics> <max_topics> [output_dir]");
    }

    let dataset = PathBuf::from(&args[1]);
    let min_k: usize = args[2].parse().context("min_topics must be an integer")?;
    let max_k: usize = args[3].parse().context("max_topics must be an integer")?;
    let output_dir = PathBuf::from(args.get(4).map(String::as_str).unwrap_or("metrics"));

    println!("=== Topic Count Estimation ===\n");
    println!("Dataset: {:?}", dataset);
    println!("Candidate topic counts: {}..={}\n", min_k, max_k);

    // NMF-based metrics run on a TF-IDF corpus
    let corpus = Corpus::from_tsv(&dataset, CorpusConfig::default())?;
    println!(
        "Corpus: {} documents x {} terms\n",
        corpus.size(),
        corpus.vocabulary_size()
    );

    ensure_directory(&output_dir)?;
    let kind = ModelKind::default_nmf();

    println!("Running Greene metric (higher is better)...");
    let greene = greene_metric(&corpus, &kind, min_k, max_k, &GreeneOptions::default())?;
    report(&greene, "agreement");
    save_metric_csv(&greene, "agreement", output_dir.join("greene.csv"))?;

    println!("\nRunning Arun metric (lower is better)...");
    let arun = arun_metric(&corpus, &kind, min_k, max_k, 1)?;
    report(&arun, "divergence");
    save_metric_csv(&arun, "divergence", output_dir.join("arun.csv"))?;

    println!("\nRunning Brunet metric (higher is better)...");
    let brunet = brunet_metric(&corpus, &kind, min_k, max_k, &BrunetOptions::default())?;
    report(&brunet, "dispersion");
    save_metric_csv(&brunet, "dispersion", output_dir.join("brunet.csv"))?;

    // Perplexity needs counts, so rebuild the corpus with TF weights
    println!("\nRunning LDA perplexity curve (lower is better)...");
    let tf_corpus = Corpus::from_tsv(
        &dataset,
        CorpusConfig::default().vectorization(Vectorization::Tf),
    )?;
    let base = LdaConfig::new(0).iterations(200).burn_in(20);
    let perplexity = perplexity_metric(&tf_corpus, &base, min_k, max_k, 1)?;
    report(&perplexity, "perplexity");
    save_metric_csv(&perplexity, "perplexity", output_dir.join("perplexity.csv"))?;

    println!("\n=== Suggestions ===\n");
    suggest(&greene, "Greene", true);
    suggest(&arun, "Arun", false);
    suggest(&brunet, "Brunet", true);
    suggest(&perplexity, "Perplexity", false);

    println!("\nMetric curves written to {:?}", output_dir);
    Ok(())
}

fn report(scores: &[(usize, f64)], name: &str) {
    for (k, score) in scores {
        println!("  k={:3}  {}={:.4}", k, name, score);
    }
}

fn suggest(scores: &[(usize, f64)], name: &str, higher_is_better: bool) {
    let best = if higher_is_better {
        scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    } else {
        scores
            .iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    };
    if let Some((k, score)) = best {
        println!("  {} suggests k={} (score {:.4})", name, k, score);
    }
}
