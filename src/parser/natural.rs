//! Parser for loosely structured prose answers
//!
//! Models that ignore the requested format still tend to write headings such
//! as "QUALITY SCORE", "ISSUES FOUND" and "IMPROVED REQUIREMENT". This parser
//! walks the response line by line and switches section on those headings.

use super::analysis::{AnalysisDraft, HallucinationCheck, IssueDraft, RecommendationDraft};
use super::issue::{parse_issue_item, parse_recommendation_item, strip_bullet};
use super::validate::first_integer;
use super::ResponseParser;
use crate::error::ParserError;
use tracing::debug;

const SCORE_LABEL: &str = "QUALITY SCORE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Idle,
    CollectingIssues,
    CollectingImproved,
    CollectingRecommendations,
}

/// A heading whose value may follow on the next line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Nothing,
    Score { improved: bool },
    Verdict,
}

/// Parses free-form prose responses keyed on heading keywords
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalLanguageParser;

impl ResponseParser for NaturalLanguageParser {
    fn name(&self) -> &'static str {
        "NaturalLanguage"
    }

    fn can_parse(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        upper.contains(SCORE_LABEL)
            || upper.contains("ISSUES FOUND")
            || upper.contains("IMPROVED REQUIREMENT")
            || (upper.contains("CLARITY") && upper.contains("ISSUE"))
    }

    fn try_parse(&self, text: &str, requirement_id: &str) -> Result<AnalysisDraft, ParserError> {
        let mut scan = Scan::default();
        for line in text.lines() {
            scan.feed(line);
        }

        debug!(
            requirement_id,
            issues = scan.issues.len(),
            recommendations = scan.recommendations.len(),
            score_found = scan.quality_score.is_some(),
            "Scanned natural-language response"
        );
        Ok(scan.into_draft())
    }
}

struct Scan {
    section: Section,
    pending: Pending,
    quality_score: Option<i64>,
    improved_quality_score: Option<i64>,
    issues: Vec<IssueDraft>,
    recommendations: Vec<RecommendationDraft>,
    improved: Vec<String>,
    hallucination_check: Option<HallucinationCheck>,
}

impl Default for Scan {
    fn default() -> Self {
        Self {
            section: Section::Idle,
            pending: Pending::Nothing,
            quality_score: None,
            improved_quality_score: None,
            issues: Vec::new(),
            recommendations: Vec::new(),
            improved: Vec::new(),
            hallucination_check: None,
        }
    }
}

impl Scan {
    fn feed(&mut self, raw_line: &str) {
        let line = raw_line.trim();
        if line.is_empty() {
            return;
        }
        let upper = line.to_uppercase();

        if let Some((improved, rest)) = score_heading(&upper) {
            match score_after_label(rest) {
                Some(score) => self.record_score(score, improved),
                None => self.pending = Pending::Score { improved },
            }
            self.section = Section::Idle;
            return;
        }

        if upper.contains("ISSUE") && upper.contains("FOUND") {
            self.enter(Section::CollectingIssues);
            return;
        }

        if upper.contains("IMPROVED REQUIREMENT") || upper.contains("REWRITTEN REQUIREMENT") {
            self.enter(Section::CollectingImproved);
            if let Some((_, inline)) = line.split_once(':') {
                let inline = clean_inline(inline);
                if !inline.is_empty() {
                    self.improved.push(inline.to_string());
                }
            }
            return;
        }

        if upper.contains("RECOMMENDATION") {
            self.enter(Section::CollectingRecommendations);
            return;
        }

        if upper.contains("FABRICAT") || upper.contains("HALLUCINATION") {
            self.enter(Section::Idle);
            match HallucinationCheck::detect(line) {
                Some(verdict) => self.hallucination_check = Some(verdict),
                None => self.pending = Pending::Verdict,
            }
            return;
        }

        match std::mem::replace(&mut self.pending, Pending::Nothing) {
            Pending::Score { improved } => {
                if let Some(score) = first_integer(line) {
                    self.record_score(score, improved);
                    return;
                }
            }
            Pending::Verdict => {
                if let Some(verdict) = HallucinationCheck::detect(line) {
                    self.hallucination_check = Some(verdict);
                    return;
                }
            }
            Pending::Nothing => {}
        }

        if is_boilerplate(line) {
            return;
        }

        match self.section {
            Section::Idle => {}
            Section::CollectingIssues => {
                if let Some(item) = strip_bullet(line) {
                    self.issues.push(parse_issue_item(item).into());
                }
            }
            Section::CollectingRecommendations => {
                if let Some(item) = strip_bullet(line) {
                    self.recommendations.push(parse_recommendation_item(item));
                }
            }
            Section::CollectingImproved => {
                if strip_bullet(line).is_none() {
                    self.improved.push(clean_inline(line).to_string());
                }
            }
        }
    }

    fn enter(&mut self, section: Section) {
        self.section = section;
        self.pending = Pending::Nothing;
    }

    fn record_score(&mut self, score: i64, improved: bool) {
        let slot = if improved {
            &mut self.improved_quality_score
        } else {
            &mut self.quality_score
        };
        if slot.is_none() {
            *slot = Some(score);
        }
    }

    fn into_draft(self) -> AnalysisDraft {
        let improved_requirement = if self.improved.is_empty() {
            None
        } else {
            Some(self.improved.join(" "))
        };

        AnalysisDraft {
            quality_score: self.quality_score,
            improved_quality_score: self.improved_quality_score,
            issues: Some(self.issues),
            recommendations: Some(self.recommendations),
            improved_requirement,
            freeform_feedback: None,
            hallucination_check: self.hallucination_check,
        }
    }
}

/// A line that opens with the score label, after markdown heading and bold
/// markers, optionally qualified as the improved or original score. Returns
/// whether it is the improved score and the text after the label.
fn score_heading(upper: &str) -> Option<(bool, &str)> {
    let heading = upper.trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
    let label_at = heading.find(SCORE_LABEL)?;
    let qualifier = heading[..label_at].trim_matches(|c: char| c == '*' || c.is_whitespace());
    let improved = match qualifier {
        "" | "ORIGINAL" | "OVERALL" => false,
        "IMPROVED" => true,
        _ => return None,
    };
    Some((improved, &heading[label_at + SCORE_LABEL.len()..]))
}

/// First integer after the label, preferring the text after a colon so that
/// `QUALITY SCORE (1-10): 7` reads as 7
fn score_after_label(rest: &str) -> Option<i64> {
    match rest.split_once(':') {
        Some((_, value)) => first_integer(value),
        None => first_integer(rest),
    }
}

fn clean_inline(text: &str) -> &str {
    text.trim()
        .trim_matches(|c| c == '*' || c == '"' || c == '`')
        .trim()
}

/// Separators, fences and placeholder lines that carry no content
fn is_boilerplate(line: &str) -> bool {
    if line.starts_with("```") {
        return true;
    }
    if line
        .chars()
        .all(|c| matches!(c, '-' | '=' | '*' | '_' | '#' | '~') || c.is_whitespace())
    {
        return true;
    }
    matches!(line.to_lowercase().as_str(), "n/a" | "none" | "none.")
}
