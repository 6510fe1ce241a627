use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Parser chain is empty")]
    EmptyParserChain,

    #[error("Parser '{0}' appears more than once in the chain")]
    DuplicateParser(String),

    #[error("Provider command is not configured")]
    MissingProviderCommand,
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Response matched the {parser} format but carried no usable sections")]
    MissingSection { parser: &'static str },

    #[error("Response is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Response for requirement '{requirement_id}' could not be interpreted")]
    Unparseable { requirement_id: String },

    #[error("Requirement text is empty")]
    EmptyRequirement,
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
