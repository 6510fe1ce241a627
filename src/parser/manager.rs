use super::{create_parser, RequirementAnalysis, ResponseParser};
use crate::config::{Config, ParserKind};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Reported by [`ParserManager::selected_parser_name`] for blank input
pub const NO_PARSER_EMPTY: &str = "None (empty response)";
/// Reported by [`ParserManager::selected_parser_name`] when nothing matches
pub const NO_PARSER_MATCHED: &str = "None (no compatible parser)";

const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Chain-of-responsibility dispatcher over an ordered, fixed parser list.
///
/// The first parser whose `can_parse` accepts the text wins; there is no
/// scoring between several matching parsers.
pub struct ParserManager {
    parsers: Vec<Box<dyn ResponseParser>>,
    preview_chars: usize,
}

impl ParserManager {
    pub fn new(parsers: Vec<Box<dyn ResponseParser>>) -> Self {
        Self {
            parsers,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Build the chain in the order given by the config
    pub fn from_config(config: &Config) -> Self {
        Self {
            parsers: config.parsers.iter().copied().map(create_parser).collect(),
            preview_chars: config.diagnostic_preview_chars,
        }
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn parser_names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    /// Name of the parser that would handle `text`
    pub fn selected_parser_name(&self, text: &str) -> &'static str {
        if text.trim().is_empty() {
            return NO_PARSER_EMPTY;
        }
        self.select(text)
            .map(|p| p.name())
            .unwrap_or(NO_PARSER_MATCHED)
    }

    /// Interpret a raw model response.
    ///
    /// Returns `None` when the response is blank, matches no parser, or the
    /// selected parser could not produce a record. Never panics: a panic inside
    /// a parser is caught and logged.
    pub fn parse_response(&self, text: &str, requirement_id: &str) -> Option<RequirementAnalysis> {
        if text.trim().is_empty() {
            warn!(requirement_id, "Empty response, nothing to parse");
            return None;
        }

        let parser = match self.select(text) {
            Some(parser) => parser,
            None => {
                warn!(
                    requirement_id,
                    "No compatible parser for response: {}...",
                    preview(text, self.preview_chars)
                );
                return None;
            }
        };

        info!(requirement_id, parser = parser.name(), "Selected response parser");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            parser.parse_response(text, requirement_id)
        }));

        match outcome {
            Ok(Some(analysis)) => {
                info!(
                    requirement_id,
                    parser = parser.name(),
                    score = analysis.original_quality_score,
                    issues = analysis.issues.len(),
                    "Parsed analysis"
                );
                Some(analysis)
            }
            Ok(None) => {
                warn!(
                    requirement_id,
                    parser = parser.name(),
                    "Parser matched the format but produced no analysis"
                );
                None
            }
            Err(payload) => {
                error!(
                    requirement_id,
                    parser = parser.name(),
                    "Parser panicked: {}",
                    panic_message(payload.as_ref())
                );
                None
            }
        }
    }

    fn select(&self, text: &str) -> Option<&dyn ResponseParser> {
        let selected = self
            .parsers
            .iter()
            .find(|p| p.can_parse(text))
            .map(|p| p.as_ref());
        debug!(
            selected = selected.map(|p| p.name()).unwrap_or("none"),
            "Parser selection"
        );
        selected
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new(ParserKind::default_chain().into_iter().map(create_parser).collect())
    }
}

/// First `max_chars` characters, on char boundaries
fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
