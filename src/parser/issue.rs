//! Normalizes single bullets of issue and recommendation text
//!
//! Expected shapes (every part optional):
//! `Clarity Issue (High): the term "fast" is vague | Fix: state a latency bound`
//! `Testability: add a measurable bound | Edit: The system shall respond within 2 s.`

use super::analysis::{AnalysisIssue, IssueCategory, RecommendationDraft, Severity};

const FIX_PREFIX: &str = "fix:";
const EDIT_PREFIXES: [&str; 3] = ["suggested edit:", "suggestededit:", "edit:"];

/// Parse one issue line whose bullet glyph has already been removed.
///
/// Never fails; malformed text degrades to a partial record.
pub fn parse_issue_item(line: &str) -> AnalysisIssue {
    let cleaned = line.replace("**", "");

    let mut segments = cleaned.split('|');
    let main_part = segments.next().unwrap_or("").trim();
    let fix = segments
        .map(str::trim)
        .find_map(strip_fix_prefix)
        .unwrap_or_default();

    let description = match main_part.split_once(':') {
        Some((_, rest)) => rest,
        None => main_part,
    };

    AnalysisIssue {
        category: IssueCategory::infer(main_part),
        severity: Severity::infer(main_part),
        description: trim_brackets(description).to_string(),
        fix,
    }
}

/// Parse one recommendation line whose bullet glyph has already been removed.
///
/// The suggested edit is left empty when no `Edit:` segment is present, so
/// validation drops the entry.
pub fn parse_recommendation_item(line: &str) -> RecommendationDraft {
    let cleaned = line.replace("**", "");

    let mut segments = cleaned.split('|');
    let main_part = segments.next().unwrap_or("").trim();
    let suggested_edit = segments.map(str::trim).find_map(strip_edit_prefix);

    let (category, description) = match main_part.split_once(':') {
        Some((head, rest)) => (Some(trim_brackets(head).to_string()), rest),
        None => (None, main_part),
    };

    RecommendationDraft {
        category,
        description: Some(trim_brackets(description).to_string()),
        suggested_edit,
    }
}

/// Strip a leading bullet glyph (`-`, `•`, `*`) if present.
///
/// A leading `**` is markdown bold, not a bullet.
pub fn strip_bullet(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('-') {
        return Some(rest.trim_start());
    }
    if let Some(rest) = trimmed.strip_prefix('•') {
        return Some(rest.trim_start());
    }
    if let Some(rest) = trimmed.strip_prefix('*') {
        if !rest.starts_with('*') {
            return Some(rest.trim_start());
        }
    }
    None
}

fn strip_fix_prefix(segment: &str) -> Option<String> {
    let head = segment.get(..FIX_PREFIX.len())?;
    if head.eq_ignore_ascii_case(FIX_PREFIX) {
        Some(segment[FIX_PREFIX.len()..].trim().to_string())
    } else {
        None
    }
}

fn strip_edit_prefix(segment: &str) -> Option<String> {
    EDIT_PREFIXES.iter().find_map(|prefix| {
        let head = segment.get(..prefix.len())?;
        if head.eq_ignore_ascii_case(prefix) {
            Some(segment[prefix.len()..].trim().to_string())
        } else {
            None
        }
    })
}

fn trim_brackets(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '[' || c == ']').trim()
}
