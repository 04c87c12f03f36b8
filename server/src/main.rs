use anyhow::Result;
use axum::Router;
use clap::Parser;
use lexi_core::Bm25Params;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index snapshot path (.json or .bin)
    #[arg(long, default_value = "./index/positional_inverted_index.json")]
    index: PathBuf,
    /// Stopword file, one term per line
    #[arg(long, default_value = "./stopwords/stopwords.txt")]
    stopwords: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Default BM25 k1 when a request does not set one
    #[arg(long, default_value_t = 1.2)]
    k1: f64,
    /// Default BM25 b when a request does not set one
    #[arg(long, default_value_t = 0.75)]
    b: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        index_path: args.index,
        stopwords_path: args.stopwords,
        bm25: Bm25Params { k1: args.k1, b: args.b },
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
