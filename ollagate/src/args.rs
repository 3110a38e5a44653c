use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// OpenAI-compatible gateway for Ollama
#[derive(Debug, Parser)]
#[command(name = "ollagate", about = "OpenAI-compatible API gateway in front of an Ollama server")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ollagate.toml", env = "OLLAGATE_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "OLLAGATE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the configured log filter
    #[arg(long, env = "OLLAGATE_LOG")]
    pub log_filter: Option<String>,
}
