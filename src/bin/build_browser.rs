//! Build static browser data for a dataset
//!
//! Loads a dataset, fits a topic model and writes the browsable JSON
//! artifacts (topic cloud, topic/document/word pages, co-authorship
//! network) to an output directory.
//!
//! Usage: build_browser <dataset.tsv> <num_topics> [output_dir] [lda|nmf]

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tom_lib::browser::BrowserExporter;
use tom_lib::corpus::{Corpus, CorpusConfig, Vectorization};
use tom_lib::models::{
    LatentDirichletAllocation, LdaConfig, NmfConfig, NonNegativeMatrixFactorization, TopicModel,
};
use tom_lib::utils::evaluation::ModelSummary;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("usage: build_browser <dataset.tsv> <num_topics> [output_dir] [lda|nmf]");
    }

    let dataset = PathBuf::from(&args[1]);
    let num_topics: usize = args[2].parse().context("num_topics must be an integer")?;
    let output_dir = PathBuf::from(args.get(3).map(String::as_str).unwrap_or("browser"));
    let model_name = args.get(4).map(String::as_str).unwrap_or("nmf");

    println!("=== Topic Model Browser Builder ===\n");
    println!("Dataset: {:?}", dataset);
    println!("Topics: {}", num_topics);
    println!("Model: {}\n", model_name);

    let (corpus, model): (Corpus, Box<dyn TopicModel>) = match model_name {
        "lda" => {
            // Gibbs sampling needs raw counts
            let corpus = Corpus::from_tsv(
                &dataset,
                CorpusConfig::default().vectorization(Vectorization::Tf),
            )?;
            let config = LdaConfig::new(num_topics).seed(42);
            let mut lda = LatentDirichletAllocation::new(config)?;
            println!("Fitting LDA (collapsed Gibbs sampling)...");
            lda.fit(&corpus)?;
            (corpus, Box::new(lda))
        }
        "nmf" => {
            let corpus = Corpus::from_tsv(&dataset, CorpusConfig::default())?;
            let config = NmfConfig::new(num_topics).seed(42);
            let mut nmf = NonNegativeMatrixFactorization::new(config)?;
            println!("Fitting NMF (multiplicative updates)...");
            nmf.fit(&corpus)?;
            println!(
                "  Converged after {} iterations, reconstruction error {:.4}",
                nmf.iterations_run()?,
                nmf.reconstruction_error()?
            );
            (corpus, Box::new(nmf))
        }
        other => bail!("unknown model '{}', expected 'lda' or 'nmf'", other),
    };

    println!(
        "\nCorpus: {} documents x {} terms\n",
        corpus.size(),
        corpus.vocabulary_size()
    );

    println!("--- Topics ---\n");
    for topic in model.describe(8)? {
        println!("{}", topic);
    }

    let summary = ModelSummary::from_model(model.as_ref(), &corpus, 10, None)?;
    println!();
    summary.print();

    println!("\nExporting browser data to {:?}...", output_dir);
    BrowserExporter::new(&corpus, model.as_ref()).export(&output_dir)?;

    println!("Done. Entry point: {:?}", output_dir.join("index.json"));
    Ok(())
}
