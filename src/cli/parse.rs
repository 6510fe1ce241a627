use crate::cli::{read_input, requirement_id, ParseArgs, EXIT_UNPARSEABLE};
use crate::config::Config;
use crate::output::{render, write_report};
use crate::parser::ParserManager;
use std::path::Path;
use tracing::{error, info};

pub fn execute(args: ParseArgs, config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path)?;
    let manager = ParserManager::from_config(&config);

    let id = requirement_id(args.id);
    let response = read_input(args.file.as_deref())?;

    let Some(analysis) = manager.parse_response(&response, &id) else {
        error!(
            requirement_id = %id,
            selected = manager.selected_parser_name(&response),
            "Response could not be interpreted"
        );
        std::process::exit(EXIT_UNPARSEABLE);
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
