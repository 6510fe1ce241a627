use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    /// Parser chain, tried in order; the first whose format sniff matches wins
    #[serde(default = "default_parsers")]
    pub parsers: Vec<ParserKind>,

    /// How much of an unrecognized response to echo into the warning log
    #[serde(default = "default_preview_chars")]
    pub diagnostic_preview_chars: usize,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Json,
    Delimited,
    NaturalLanguage,
}

impl ParserKind {
    pub fn default_chain() -> Vec<ParserKind> {
        vec![
            ParserKind::Json,
            ParserKind::Delimited,
            ParserKind::NaturalLanguage,
        ]
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserKind::Json => write!(f, "json"),
            ParserKind::Delimited => write!(f, "delimited"),
            ParserKind::NaturalLanguage => write!(f, "natural_language"),
        }
    }
}

/// Local command that receives the prompt on stdin and answers on stdout
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_command")]
    pub command: String,

    #[serde(default = "default_provider_args")]
    pub args: Vec<String>,

    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            command: default_provider_command(),
            args: default_provider_args(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PromptConfig {
    /// Include a worked example of the answer format in the prompt
    #[serde(default = "default_true")]
    pub include_examples: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_examples: default_true(),
        }
    }
}
