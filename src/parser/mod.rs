mod analysis;
mod delimited;
mod issue;
mod json;
mod manager;
mod natural;
mod validate;

pub use analysis::{
    AnalysisDraft, AnalysisIssue, AnalysisRecommendation, HallucinationCheck, IssueCategory,
    IssueDraft, RecommendationDraft, RequirementAnalysis, Severity, MAX_QUALITY_SCORE,
    MAX_RECOMMENDATIONS, MIN_QUALITY_SCORE, NO_IMPROVED_REQUIREMENT_NOTE,
};
pub use delimited::{DelimitedParser, Sentinel};
pub use issue::{parse_issue_item, strip_bullet};
pub use json::JsonParser;
pub use manager::{ParserManager, NO_PARSER_EMPTY, NO_PARSER_MATCHED};
pub use natural::NaturalLanguageParser;
pub use validate::{clamp_score, strip_template_marker};

use crate::config::ParserKind;
use crate::error::ParserError;
use tracing::{debug, error};

/// One LLM output convention.
///
/// Implementations are stateless after construction so a single instance can
/// serve concurrent callers.
pub trait ResponseParser: Send + Sync {
    /// Stable identifier used in logs and selection diagnostics
    fn name(&self) -> &'static str;

    /// Cheap format sniff. Must not panic on arbitrary input.
    fn can_parse(&self, text: &str) -> bool;

    /// Full parse into an unvalidated draft
    fn try_parse(&self, text: &str, requirement_id: &str) -> Result<AnalysisDraft, ParserError>;

    /// Whether a missing quality score should be estimated from the issue count
    fn estimates_missing_score(&self) -> bool {
        true
    }

    /// Parse and validate. Failures are logged against `requirement_id` and
    /// reported as `None`.
    fn parse_response(&self, text: &str, requirement_id: &str) -> Option<RequirementAnalysis> {
        match self.try_parse(text, requirement_id) {
            Ok(draft) => {
                let analysis =
                    validate::finalize(draft, self.name(), self.estimates_missing_score());
                debug!(
                    parser = self.name(),
                    requirement_id,
                    issues = analysis.issues.len(),
                    recommendations = analysis.recommendations.len(),
                    "Draft validated"
                );
                Some(analysis)
            }
            Err(e) => {
                error!(
                    parser = self.name(),
                    requirement_id,
                    "Failed to parse response: {}",
                    e
                );
                None
            }
        }
    }
}

/// Build the parser for a configured chain entry
pub fn create_parser(kind: ParserKind) -> Box<dyn ResponseParser> {
    match kind {
        ParserKind::Json => Box::new(JsonParser),
        ParserKind::Delimited => Box::new(DelimitedParser),
        ParserKind::NaturalLanguage => Box::new(NaturalLanguageParser),
    }
}
