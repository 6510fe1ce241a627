use crate::cli::PromptArgs;
use crate::config::Config;
use crate::prompt::build_analysis_prompt;
use std::path::Path;

pub fn execute(args: PromptArgs, config_path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(config_path)?;
    if args.no_examples {
        config.prompt.include_examples = false;
    }

    print!("{}", build_analysis_prompt(&args.text, &config.prompt));
    Ok(())
}
