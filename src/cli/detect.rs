use crate::cli::{read_input, DetectArgs};
use crate::config::Config;
use crate::parser::ParserManager;
use std::path::Path;

pub fn execute(args: DetectArgs, config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load_or_default(config_path)?;
    let manager = ParserManager::from_config(&config);

    let response = read_input(args.file.as_deref())?;
    println!("{}", manager.selected_parser_name(&response));
    Ok(())
}
