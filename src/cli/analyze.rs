use crate::cli::{requirement_id, AnalyzeArgs, EXIT_UNPARSEABLE};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::output::{render, write_report};
use crate::provider::create_client;
use crate::runner::Analyzer;
use std::path::Path;
use tracing::{error, info};

pub async fn execute(args: AnalyzeArgs, config_path: &Path) -> anyhow::Result<()> {
    info!("Loading config from {:?}", config_path);
    let mut config = Config::load_or_default(config_path)?;

    if let Some(timeout_sec) = args.timeout_sec {
        config.provider.timeout_sec = timeout_sec;
    }

    let text = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?,
        (None, None) => anyhow::bail!("No requirement text given"),
    };

    let id = requirement_id(args.id);
    let client = create_client(&config.provider);
    let analyzer = Analyzer::from_config(client, &config);

    let analysis = match analyzer.analyze(&id, &text).await {
        Ok(analysis) => analysis,
        Err(e @ AnalysisError::Unparseable { .. }) => {
            error!("{}", e);
            std::process::exit(EXIT_UNPARSEABLE);
        }
        Err(e) => return Err(e.into()),
    };

    let rendered = render(&analysis, &id, args.format)?;
    match args.output {
        Some(path) => {
            write_report(&path, &rendered)?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
