use crate::config::Config;
use schemars::schema_for;

pub fn execute() -> anyhow::Result<()> {
    let mut schema = schema_for!(Config);
    schema.schema.metadata().title = Some("reqsift configuration".to_string());
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
