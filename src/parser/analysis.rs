use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_QUALITY_SCORE: u8 = 1;
pub const MAX_QUALITY_SCORE: u8 = 10;

/// Most recommendations a finished analysis may carry
pub const MAX_RECOMMENDATIONS: usize = 2;

/// Appended to the feedback when the response carried no rewritten requirement
pub const NO_IMPROVED_REQUIREMENT_NOTE: &str =
    "Note: no improved requirement could be extracted from the model response.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum IssueCategory {
    Clarity,
    Completeness,
    Testability,
    Consistency,
    Feasibility,
    #[default]
    Quality,
}

impl IssueCategory {
    /// Keyword order used when inferring a category from free text; first hit wins
    pub const PRIORITY: [IssueCategory; 5] = [
        IssueCategory::Clarity,
        IssueCategory::Completeness,
        IssueCategory::Testability,
        IssueCategory::Consistency,
        IssueCategory::Feasibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Clarity => "Clarity",
            IssueCategory::Completeness => "Completeness",
            IssueCategory::Testability => "Testability",
            IssueCategory::Consistency => "Consistency",
            IssueCategory::Feasibility => "Feasibility",
            IssueCategory::Quality => "Quality",
        }
    }

    /// Infer a category from any text mentioning one of the known names
    pub fn infer(text: &str) -> Self {
        let upper = text.to_uppercase();
        Self::PRIORITY
            .into_iter()
            .find(|c| upper.contains(&c.as_str().to_uppercase()))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    /// Infer a severity from free text. Parenthesised markers such as `(High)`
    /// take precedence over bare words.
    pub fn infer(text: &str) -> Self {
        let upper = text.to_uppercase();
        const ORDER: [(Severity, &str); 3] = [
            (Severity::High, "HIGH"),
            (Severity::Low, "LOW"),
            (Severity::Medium, "MEDIUM"),
        ];

        ORDER
            .iter()
            .find(|(_, word)| upper.contains(&format!("({})", word)))
            .or_else(|| ORDER.iter().find(|(_, word)| upper.contains(word)))
            .map(|(severity, _)| *severity)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum HallucinationCheck {
    #[default]
    #[serde(rename = "<NO_FABRICATION>")]
    NoFabrication,
    #[serde(rename = "FABRICATED_DETAILS")]
    FabricatedDetails,
}

impl HallucinationCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            HallucinationCheck::NoFabrication => "<NO_FABRICATION>",
            HallucinationCheck::FabricatedDetails => "FABRICATED_DETAILS",
        }
    }

    /// Read an explicit verdict out of a line of text, if it carries one.
    ///
    /// A fabrication mention counts as `NoFabrication` when it is negated,
    /// either just before ("No fabricated details", "did not fabricate") or as
    /// its value ("FABRICATION: none detected"). A hallucination mention only
    /// carries a verdict when negated the same way.
    pub fn detect(text: &str) -> Option<Self> {
        let upper = text.to_uppercase();
        let words: Vec<&str> = upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if let Some(at) = words.iter().position(|w| w.starts_with("FABRICAT")) {
            return Some(if is_negated(&words, at) {
                HallucinationCheck::NoFabrication
            } else {
                HallucinationCheck::FabricatedDetails
            });
        }

        let at = words.iter().position(|w| w.starts_with("HALLUCINAT"))?;
        is_negated(&words, at).then_some(HallucinationCheck::NoFabrication)
    }
}

const NEGATIONS_BEFORE: &[&str] = &[
    "NO", "NOT", "NONE", "WITHOUT", "NEVER", "ZERO", "DIDN", "DOESN", "WASN", "WEREN", "ISN",
    "AREN",
];
const NEGATIONS_AFTER: &[&str] = &["NO", "NONE", "NOT", "FALSE", "NIL", "ZERO"];
/// Words between a fabrication mention and its value
const FILLER_AFTER: &[&str] = &[
    "DETAILS", "DETAIL", "CHECK", "DETECTED", "FOUND", "IS", "ARE", "WAS", "WERE",
];

/// Whether the keyword at `at` is negated by up to three preceding words or
/// by the first meaningful word after it
fn is_negated(words: &[&str], at: usize) -> bool {
    let before = &words[at.saturating_sub(3)..at];
    if before.iter().any(|w| NEGATIONS_BEFORE.contains(w)) {
        return true;
    }

    words[at + 1..]
        .iter()
        .find(|w| !FILLER_AFTER.contains(*w))
        .is_some_and(|w| NEGATIONS_AFTER.contains(w))
}

impl std::fmt::Display for HallucinationCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisIssue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub fix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisRecommendation {
    pub category: String,
    pub description: String,
    pub suggested_edit: String,
}

/// Finished, validated analysis of one requirement
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequirementAnalysis {
    pub original_quality_score: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improved_quality_score: Option<u8>,

    #[serde(default)]
    pub issues: Vec<AnalysisIssue>,

    #[serde(default)]
    pub recommendations: Vec<AnalysisRecommendation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improved_requirement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform_feedback: Option<String>,

    #[serde(default)]
    pub hallucination_check: HallucinationCheck,

    pub is_analyzed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub timestamp: DateTime<Utc>,

    /// Name of the parser that produced this record
    #[serde(default)]
    pub parser: String,
}

impl RequirementAnalysis {
    /// Placeholder record for a caller that wants to attach a failure marker
    /// rather than no analysis at all
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            original_quality_score: MIN_QUALITY_SCORE,
            improved_quality_score: None,
            issues: Vec::new(),
            recommendations: Vec::new(),
            improved_requirement: None,
            freeform_feedback: None,
            hallucination_check: HallucinationCheck::default(),
            is_analyzed: false,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
            parser: String::new(),
        }
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Loosely typed result of a single parser, before validation.
///
/// Category strings are kept raw here so template markers can be stripped
/// before they are mapped onto [`IssueCategory`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisDraft {
    pub quality_score: Option<i64>,
    pub improved_quality_score: Option<i64>,
    pub issues: Option<Vec<IssueDraft>>,
    pub recommendations: Option<Vec<RecommendationDraft>>,
    pub improved_requirement: Option<String>,
    pub freeform_feedback: Option<String>,
    pub hallucination_check: Option<HallucinationCheck>,
}

#[derive(Debug, Clone, Default)]
pub struct IssueDraft {
    pub category: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub fix: Option<String>,
}

impl From<AnalysisIssue> for IssueDraft {
    fn from(issue: AnalysisIssue) -> Self {
        Self {
            category: Some(issue.category.as_str().to_string()),
            severity: Some(issue.severity.to_string()),
            description: Some(issue.description),
            fix: Some(issue.fix).filter(|f| !f.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationDraft {
    pub category: Option<String>,
    pub description: Option<String>,
    pub suggested_edit: Option<String>,
}
