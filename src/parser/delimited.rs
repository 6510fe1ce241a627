//! Parser for the sentinel-delimited format requested by the analysis prompt
//!
//! ```text
//! === QUALITY_SCORE ===
//! 6
//! === ISSUES ===
//! - Clarity (High): "fast" is undefined | Fix: give a latency bound
//! === IMPROVED_REQUIREMENT ===
//! The system shall return search results within 2 seconds.
//! === RECOMMENDATIONS ===
//! - Testability: add a bound | Edit: ...within 2 seconds at p95.
//! === HALLUCINATION_CHECK ===
//! <NO_FABRICATION>
//! === END ===
//! ```

use super::analysis::{AnalysisDraft, HallucinationCheck, IssueDraft};
use super::issue::{parse_issue_item, parse_recommendation_item, strip_bullet};
use super::validate::first_integer;
use super::ResponseParser;
use crate::error::ParserError;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    QualityScore,
    Issues,
    ImprovedRequirement,
    ImprovedQualityScore,
    Recommendations,
    HallucinationCheck,
    Feedback,
    End,
}

impl Sentinel {
    pub const ALL: [Sentinel; 8] = [
        Sentinel::QualityScore,
        Sentinel::Issues,
        Sentinel::ImprovedRequirement,
        Sentinel::ImprovedQualityScore,
        Sentinel::Recommendations,
        Sentinel::HallucinationCheck,
        Sentinel::Feedback,
        Sentinel::End,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Sentinel::QualityScore => "QUALITY_SCORE",
            Sentinel::Issues => "ISSUES",
            Sentinel::ImprovedRequirement => "IMPROVED_REQUIREMENT",
            Sentinel::ImprovedQualityScore => "IMPROVED_QUALITY_SCORE",
            Sentinel::Recommendations => "RECOMMENDATIONS",
            Sentinel::HallucinationCheck => "HALLUCINATION_CHECK",
            Sentinel::Feedback => "FEEDBACK",
            Sentinel::End => "END",
        }
    }

    /// The line that opens this section, e.g. `=== ISSUES ===`
    pub fn marker(&self) -> String {
        format!("=== {} ===", self.name())
    }

    /// Recognize a sentinel line. Case, spacing and fence length are lenient.
    pub fn from_line(line: &str) -> Option<Self> {
        static SENTINEL: OnceLock<Regex> = OnceLock::new();
        let re = SENTINEL.get_or_init(|| {
            Regex::new(r"^\s*={3,}\s*([A-Za-z][A-Za-z _]*?)\s*={3,}\s*$")
                .expect("sentinel regex is valid")
        });

        let name = re.captures(line)?.get(1)?.as_str();
        let normalized = name.trim().to_uppercase().replace(' ', "_");
        Self::ALL.into_iter().find(|s| s.name() == normalized)
    }
}

/// Parses the sentinel-delimited analysis format
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedParser;

impl ResponseParser for DelimitedParser {
    fn name(&self) -> &'static str {
        "Delimited"
    }

    fn can_parse(&self, text: &str) -> bool {
        text.lines().any(|line| Sentinel::from_line(line).is_some())
    }

    fn try_parse(&self, text: &str, requirement_id: &str) -> Result<AnalysisDraft, ParserError> {
        let mut draft = AnalysisDraft::default();
        let mut issues: Vec<IssueDraft> = Vec::new();
        let mut recommendations = Vec::new();
        let mut improved: Vec<&str> = Vec::new();
        let mut feedback: Vec<&str> = Vec::new();
        let mut section: Option<Sentinel> = None;

        for raw_line in text.lines() {
            if let Some(sentinel) = Sentinel::from_line(raw_line) {
                if sentinel == Sentinel::End {
                    break;
                }
                section = Some(sentinel);
                continue;
            }

            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            match section {
                None => {}
                Some(Sentinel::QualityScore) => {
                    if draft.quality_score.is_none() {
                        draft.quality_score = first_integer(line);
                    }
                }
                Some(Sentinel::ImprovedQualityScore) => {
                    if draft.improved_quality_score.is_none() {
                        draft.improved_quality_score = first_integer(line);
                    }
                }
                Some(Sentinel::Issues) => {
                    let item = strip_bullet(line).unwrap_or(line);
                    if !is_placeholder(item) {
                        issues.push(parse_issue_item(item).into());
                    }
                }
                Some(Sentinel::Recommendations) => {
                    let item = strip_bullet(line).unwrap_or(line);
                    if !is_placeholder(item) {
                        recommendations.push(parse_recommendation_item(item));
                    }
                }
                Some(Sentinel::ImprovedRequirement) => improved.push(line),
                Some(Sentinel::Feedback) => feedback.push(line),
                Some(Sentinel::HallucinationCheck) => {
                    if let Some(verdict) = HallucinationCheck::detect(line) {
                        draft.hallucination_check = Some(verdict);
                    }
                }
                Some(Sentinel::End) => break,
            }
        }

        if !improved.is_empty() {
            draft.improved_requirement = Some(improved.join(" "));
        }
        if !feedback.is_empty() {
            draft.freeform_feedback = Some(feedback.join("\n"));
        }

        let carries_content = draft.quality_score.is_some()
            || draft.improved_quality_score.is_some()
            || draft.improved_requirement.is_some()
            || draft.freeform_feedback.is_some()
            || draft.hallucination_check.is_some()
            || !issues.is_empty()
            || !recommendations.is_empty();
        if !carries_content {
            return Err(ParserError::MissingSection {
                parser: self.name(),
            });
        }

        debug!(
            requirement_id,
            issues = issues.len(),
            recommendations = recommendations.len(),
            "Collected delimited sections"
        );

        draft.issues = Some(issues);
        draft.recommendations = Some(recommendations);
        Ok(draft)
    }
}

/// Lines models write in place of an empty list
fn is_placeholder(item: &str) -> bool {
    matches!(
        item.trim().to_lowercase().as_str(),
        "" | "none" | "n/a" | "none found" | "no issues" | "no recommendations"
    )
}
