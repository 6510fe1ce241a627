//! Turns free-form LLM requirement-analysis responses into typed records.
//!
//! A response is handed to [`parser::ParserManager`], which picks the first
//! parser in its chain whose format sniff matches (JSON, sentinel-delimited
//! or prose) and returns a validated [`parser::RequirementAnalysis`], or
//! `None` when nothing could be interpreted.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod runner;

pub use config::{Config, ParserKind};
pub use parser::{ParserManager, RequirementAnalysis, ResponseParser};
