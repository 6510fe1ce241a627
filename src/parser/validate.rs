//! Turns a parser's [`AnalysisDraft`] into a finished [`RequirementAnalysis`]
//!
//! Every record leaving the parsing layer passes through [`finalize`], which is
//! what guarantees the score range, non-null collections, the recommendation
//! cap and the default hallucination marker.

use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;

use super::analysis::{
    AnalysisDraft, AnalysisIssue, AnalysisRecommendation, IssueCategory, IssueDraft,
    RecommendationDraft, RequirementAnalysis, Severity, MAX_QUALITY_SCORE, MAX_RECOMMENDATIONS,
    MIN_QUALITY_SCORE, NO_IMPROVED_REQUIREMENT_NOTE,
};

/// Score used when a response carries none and lists more than three issues
pub const FALLBACK_SCORE_MANY_ISSUES: u8 = 4;
/// Score used when a response carries none and lists three issues or fewer
pub const FALLBACK_SCORE_FEW_ISSUES: u8 = 6;

/// First integer in `text`, saturating when the digits overflow
pub(crate) fn first_integer(text: &str) -> Option<i64> {
    static INTEGER: OnceLock<Regex> = OnceLock::new();
    let re = INTEGER.get_or_init(|| Regex::new(r"-?\d+").expect("integer regex is valid"));

    let digits = re.find(text)?.as_str();
    Some(digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

pub fn clamp_score(score: i64) -> u8 {
    score.clamp(MIN_QUALITY_SCORE as i64, MAX_QUALITY_SCORE as i64) as u8
}

/// Score to assume when the model did not give one, based on issue count
pub fn fallback_score(issue_count: usize) -> u8 {
    if issue_count > 3 {
        FALLBACK_SCORE_MANY_ISSUES
    } else {
        FALLBACK_SCORE_FEW_ISSUES
    }
}

/// Estimate the score of a rewritten requirement: each issue it addresses is
/// worth a point, up to three, on top of a base point.
pub fn estimate_improved_score(original: u8, issue_count: usize) -> u8 {
    let gain = 1 + issue_count.min(3) as i64;
    clamp_score(original as i64 + gain)
}

/// Strip an unfilled template placeholder such as `<Clarity|Testability>`,
/// keeping the first option.
pub fn strip_template_marker(value: &str) -> String {
    let trimmed = value.trim();
    let inner = match trimmed
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(inner) => inner,
        None => return trimmed.to_string(),
    };

    inner.split('|').next().unwrap_or("").trim().to_string()
}

/// Apply the post-processing policy and stamp the record.
///
/// `use_fallback_score` selects the issue-count heuristic for a missing score;
/// otherwise a missing score is clamped up to the minimum.
pub fn finalize(
    draft: AnalysisDraft,
    parser: &'static str,
    use_fallback_score: bool,
) -> RequirementAnalysis {
    let issues: Vec<AnalysisIssue> = draft
        .issues
        .unwrap_or_default()
        .into_iter()
        .map(finalize_issue)
        .collect();

    let original_quality_score = match draft.quality_score {
        Some(score) => clamp_score(score),
        None if use_fallback_score => fallback_score(issues.len()),
        None => MIN_QUALITY_SCORE,
    };

    let improved_requirement = draft
        .improved_requirement
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let improved_quality_score = match (draft.improved_quality_score, &improved_requirement) {
        (Some(score), _) => Some(clamp_score(score)),
        (None, Some(_)) => Some(estimate_improved_score(original_quality_score, issues.len())),
        (None, None) => None,
    };

    let mut freeform_feedback = draft
        .freeform_feedback
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if improved_requirement.is_none() {
        freeform_feedback = Some(match freeform_feedback {
            Some(existing) => format!("{}\n\n{}", existing, NO_IMPROVED_REQUIREMENT_NOTE),
            None => NO_IMPROVED_REQUIREMENT_NOTE.to_string(),
        });
    }

    RequirementAnalysis {
        original_quality_score,
        improved_quality_score,
        issues,
        recommendations: finalize_recommendations(draft.recommendations.unwrap_or_default()),
        improved_requirement,
        freeform_feedback,
        hallucination_check: draft.hallucination_check.unwrap_or_default(),
        is_analyzed: true,
        error_message: None,
        timestamp: Utc::now(),
        parser: parser.to_string(),
    }
}

fn finalize_issue(draft: IssueDraft) -> AnalysisIssue {
    let category = draft
        .category
        .as_deref()
        .map(strip_template_marker)
        .map(|c| IssueCategory::infer(&c))
        .unwrap_or_default();
    let severity = draft
        .severity
        .as_deref()
        .map(strip_template_marker)
        .map(|s| Severity::infer(&s))
        .unwrap_or_default();

    AnalysisIssue {
        category,
        severity,
        description: draft.description.unwrap_or_default().trim().to_string(),
        fix: draft.fix.unwrap_or_default().trim().to_string(),
    }
}

/// Cap first, then drop entries without a suggested edit. A response whose
/// first two recommendations are incomplete therefore ends with none, even if
/// later ones were complete.
fn finalize_recommendations(drafts: Vec<RecommendationDraft>) -> Vec<AnalysisRecommendation> {
    drafts
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .filter_map(|draft| {
            let suggested_edit = draft.suggested_edit?.trim().to_string();
            if suggested_edit.is_empty() {
                return None;
            }
            Some(AnalysisRecommendation {
                category: draft
                    .category
                    .as_deref()
                    .map(strip_template_marker)
                    .unwrap_or_default(),
                description: draft.description.unwrap_or_default().trim().to_string(),
                suggested_edit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(category: &str, edit: Option<&str>) -> RecommendationDraft {
        RecommendationDraft {
            category: Some(category.to_string()),
            description: Some(format!("{} recommendation", category)),
            suggested_edit: edit.map(String::from),
        }
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(15), 10);
        assert_eq!(clamp_score(0), 1);
        assert_eq!(clamp_score(-40), 1);
        assert_eq!(clamp_score(7), 7);
        assert_eq!(clamp_score(i64::MAX), 10);
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("**QUALITY SCORE: **55**"), Some(55));
        assert_eq!(first_integer("7/10"), Some(7));
        assert_eq!(first_integer("score -2"), Some(-2));
        assert_eq!(first_integer("99999999999999999999999"), Some(i64::MAX));
        assert_eq!(first_integer("none"), None);
    }

    #[test]
    fn test_strip_template_marker() {
        assert_eq!(strip_template_marker("<Clarity|Testability>"), "Clarity");
        assert_eq!(strip_template_marker("<Clarity>"), "Clarity");
        assert_eq!(strip_template_marker("  Testability "), "Testability");
        assert_eq!(strip_template_marker("<|>"), "");
        assert_eq!(strip_template_marker("<unterminated"), "<unterminated");
    }

    #[test]
    fn test_missing_everything_is_structurally_complete() {
        let analysis = finalize(AnalysisDraft::default(), "test", false);
        assert_eq!(analysis.original_quality_score, MIN_QUALITY_SCORE);
        assert!(analysis.issues.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert!(analysis.is_analyzed);
        assert_eq!(
            analysis.freeform_feedback.as_deref(),
            Some(NO_IMPROVED_REQUIREMENT_NOTE)
        );
    }

    #[test]
    fn test_fallback_score_by_issue_count() {
        let issue = || IssueDraft {
            description: Some("x".into()),
            ..Default::default()
        };
        let few = AnalysisDraft {
            issues: Some(vec![issue(), issue(), issue()]),
            ..Default::default()
        };
        let many = AnalysisDraft {
            issues: Some(vec![issue(), issue(), issue(), issue()]),
            ..Default::default()
        };
        assert_eq!(finalize(few, "t", true).original_quality_score, 6);
        assert_eq!(finalize(many, "t", true).original_quality_score, 4);
    }

    #[test]
    fn test_improved_score_estimated_when_rewrite_present() {
        let draft = AnalysisDraft {
            quality_score: Some(5),
            improved_requirement: Some("The system shall respond within 200 ms.".into()),
            issues: Some(vec![IssueDraft::default(), IssueDraft::default()]),
            ..Default::default()
        };
        let analysis = finalize(draft, "t", false);
        assert_eq!(analysis.improved_quality_score, Some(8));
        assert!(analysis.freeform_feedback.is_none());
    }

    #[test]
    fn test_note_appended_to_existing_feedback() {
        let draft = AnalysisDraft {
            freeform_feedback: Some("Mostly fine.".into()),
            ..Default::default()
        };
        let feedback = finalize(draft, "t", false).freeform_feedback.unwrap();
        assert!(feedback.starts_with("Mostly fine."));
        assert!(feedback.ends_with(NO_IMPROVED_REQUIREMENT_NOTE));
    }

    #[test]
    fn test_recommendations_capped_then_filtered() {
        // Known quirk: the cap runs before the completeness filter, so the
        // complete third entry never gets a chance to replace the second.
        let draft = AnalysisDraft {
            recommendations: Some(vec![
                rec("Clarity", Some("Use 200 ms")),
                rec("Testability", None),
                rec("Completeness", Some("Name the actor")),
            ]),
            ..Default::default()
        };
        let analysis = finalize(draft, "t", false);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.recommendations[0].category, "Clarity");
    }

    #[test]
    fn test_blank_suggested_edit_dropped() {
        let draft = AnalysisDraft {
            recommendations: Some(vec![
                rec("Clarity", Some("   ")),
                rec("<Feasibility|Clarity>", Some("Split it")),
            ]),
            ..Default::default()
        };
        let analysis = finalize(draft, "t", false);
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(analysis.recommendations[0].category, "Feasibility");
    }

    #[test]
    fn test_issue_category_marker_stripped() {
        let draft = AnalysisDraft {
            issues: Some(vec![IssueDraft {
                category: Some("<Clarity|Testability>".into()),
                severity: Some("<High|Low>".into()),
                description: Some("vague".into()),
                fix: None,
            }]),
            ..Default::default()
        };
        let analysis = finalize(draft, "t", false);
        assert_eq!(analysis.issues[0].category, IssueCategory::Clarity);
        assert_eq!(analysis.issues[0].severity, Severity::High);
    }
}
