use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use lexi_core::persist::{load_index, save_index};
use lexi_core::{build_index, build_index_parallel, Bm25Params, Corpus, Pipeline, StopWords, Strategy};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a positional inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a newline-delimited corpus file
    Build {
        /// Corpus file, one document per non-blank line
        #[arg(long, default_value = "docs/docs.txt")]
        corpus: PathBuf,
        /// Stopword file, one term per line
        #[arg(long, default_value = "stopwords/stopwords.txt")]
        stopwords: PathBuf,
        /// Output snapshot (.json, or .bin for bincode)
        #[arg(long, default_value = "index/positional_inverted_index.json")]
        output: PathBuf,
        /// Shard documents across threads while indexing
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Rank documents in a saved index against a query
    Query {
        #[arg(long, default_value = "index/positional_inverted_index.json")]
        index: PathBuf,
        #[arg(long, default_value = "stopwords/stopwords.txt")]
        stopwords: PathBuf,
        /// Raw query text
        #[arg(long)]
        q: String,
        /// tf, idf or bm25
        #[arg(long, default_value = "bm25")]
        strategy: String,
        #[arg(long, default_value_t = 1.2)]
        k1: f64,
        #[arg(long, default_value_t = 0.75)]
        b: f64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, stopwords, output, parallel } => {
            build(&corpus, &stopwords, &output, parallel)
        }
        Commands::Query { index, stopwords, q, strategy, k1, b } => {
            let strategy = match strategy.parse::<Strategy>().map_err(|e| anyhow!(e))? {
                Strategy::Bm25(_) => Strategy::Bm25(Bm25Params { k1, b }),
                other => other,
            };
            query(&index, &stopwords, &q, strategy)
        }
    }
}

fn build(corpus_path: &Path, stopwords: &Path, output: &Path, parallel: bool) -> Result<()> {
    let start = Instant::now();
    let corpus = Corpus::read(corpus_path)
        .with_context(|| format!("reading corpus {}", corpus_path.display()))?;
    let stop = StopWords::load(stopwords)
        .with_context(|| format!("reading stopwords {}", stopwords.display()))?;
    let pipeline = Pipeline::new(stop);
    tracing::info!(docs = corpus.len(), stopwords = pipeline.stopwords().len(), "read corpus");

    let index = if parallel {
        build_index_parallel(&corpus, &pipeline)
    } else {
        build_index(&corpus, &pipeline)
    };
    save_index(output, &index).with_context(|| format!("writing index {}", output.display()))?;

    tracing::info!(
        docs = index.doc_count(),
        terms = index.term_count(),
        avgdl = index.avg_doc_length(),
        took_s = start.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(())
}

fn query(index_path: &Path, stopwords: &Path, q: &str, strategy: Strategy) -> Result<()> {
    let index = load_index(index_path).with_context(|| format!("loading index {}", index_path.display()))?;
    let stop = StopWords::load(stopwords)
        .with_context(|| format!("reading stopwords {}", stopwords.display()))?;
    let pipeline = Pipeline::new(stop);
    let terms = pipeline.process(q);
    tracing::debug!(?terms, %strategy, "processed query");

    let ranked = strategy.rank(&terms, &index);
    println!("{}", format_ranking(&terms, strategy, &ranked));
    Ok(())
}

fn format_ranking(terms: &[String], strategy: Strategy, ranked: &[(u32, f64)]) -> String {
    let hits: Vec<String> = ranked.iter().map(|(doc, score)| format!("({doc}, {score:.4})")).collect();
    format!("processed query: {terms:?}\nranked ({strategy}): [{}]", hits.join(", "))
}
