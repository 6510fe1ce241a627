pub mod analyze;
pub mod detect;
pub mod parse;
pub mod prompt;
pub mod schema;

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Exit status when a response could not be interpreted by any parser
pub const EXIT_UNPARSEABLE: i32 = 2;

#[derive(Parser)]
#[command(name = "reqsift")]
#[command(
    author,
    version,
    about = "Normalize LLM requirement-analysis responses into typed records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(short, long, global = true, default_value = "reqsift.yaml", env = "REQSIFT_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a saved model response into an analysis record
    Parse(ParseArgs),

    /// Show which parser would handle a response
    Detect(DetectArgs),

    /// Analyze a requirement with the configured model command
    Analyze(AnalyzeArgs),

    /// Print the analysis prompt for a requirement
    Prompt(PromptArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct ParseArgs {
    /// Response file (stdin when omitted or `-`)
    pub file: Option<PathBuf>,

    /// Requirement id used in logs and output (random when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct DetectArgs {
    /// Response file (stdin when omitted or `-`)
    pub file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct AnalyzeArgs {
    /// Requirement text
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the requirement text from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Requirement id used in logs and output (random when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the provider timeout
    #[arg(long)]
    pub timeout_sec: Option<u64>,
}

#[derive(Parser, Clone)]
pub struct PromptArgs {
    /// Requirement text
    pub text: String,

    /// Leave out the worked example
    #[arg(long)]
    pub no_examples: bool,
}

/// Read a file, or stdin for `None` and `-`
pub(crate) fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e)),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

pub(crate) fn requirement_id(id: Option<String>) -> String {
    id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
