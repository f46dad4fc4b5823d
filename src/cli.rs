use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "shortsmith",
    about = "HTTP service turning YouTube transcripts into short-form video scripts",
    version
)]
pub struct Cli {
    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Preferred transcript language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// LLM model used for script generation
    #[arg(short, long)]
    pub model: Option<String>,

    /// Config file path (defaults to ~/.config/shortsmith/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
