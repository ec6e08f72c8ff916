use std::path::PathBuf;

use clap::Parser;
use thea_core::View;

/// Recognise assistant intents from the terminal.
///
/// With `--text` a single utterance is recognised and printed as JSON.
/// Without it, utterances are read line by line; lines starting with `:`
/// are commands (`:help` lists them).
#[derive(Parser, Debug)]
#[command(name = "thea", about = "Intent recognition for the Thea assistant")]
pub struct CliArgs {
    /// Recognise this utterance and exit
    #[arg(long)]
    pub text: Option<String>,

    /// Current application view
    #[arg(long, default_value = "landing", value_parser = parse_view)]
    pub view: View,

    /// Selected patient id
    #[arg(long)]
    pub patient: Option<String>,

    /// Open medical record id
    #[arg(long)]
    pub record: Option<String>,

    /// Log every embedding batch (needs RUST_LOG=debug to show)
    #[arg(long)]
    pub debug: bool,

    /// Pretend the network is unavailable
    #[arg(long)]
    pub offline: bool,

    /// Intent catalogue YAML file (default: bundled catalogue)
    #[arg(long)]
    pub catalogue: Option<PathBuf>,

    /// Configuration profile (overrides THEA_PROFILE)
    #[arg(long)]
    pub profile: Option<String>,
}

fn parse_view(s: &str) -> Result<View, String> {
    s.parse::<View>().map_err(|e| e.to_string())
}
