use crate::error::OutputError;
use crate::parser::{RequirementAnalysis, Severity};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct AnalysisReport<'a> {
    requirement_id: &'a str,
    #[serde(flatten)]
    analysis: &'a RequirementAnalysis,
}

pub fn render_json(
    analysis: &RequirementAnalysis,
    requirement_id: &str,
) -> Result<String, OutputError> {
    let report = AnalysisReport {
        requirement_id,
        analysis,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn render_markdown(analysis: &RequirementAnalysis, requirement_id: &str) -> String {
    let mut content = String::new();

    content.push_str(&format!("# Requirement {}\n\n", requirement_id));

    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!(
        "| Quality Score | {}/10 |\n",
        analysis.original_quality_score
    ));
    if let Some(improved) = analysis.improved_quality_score {
        content.push_str(&format!("| Improved Score | {}/10 |\n", improved));
    }
    content.push_str(&format!(
        "| High | {} |\n",
        analysis.count_by_severity(Severity::High)
    ));
    content.push_str(&format!(
        "| Medium | {} |\n",
        analysis.count_by_severity(Severity::Medium)
    ));
    content.push_str(&format!(
        "| Low | {} |\n",
        analysis.count_by_severity(Severity::Low)
    ));
    content.push_str(&format!(
        "| Hallucination Check | `{}` |\n",
        analysis.hallucination_check
    ));
    content.push_str(&format!("| Parser | {} |\n", analysis.parser));
    content.push_str("\n---\n\n");

    if let Some(error) = &analysis.error_message {
        content.push_str(&format!("**Analysis failed:** {}\n\n", error));
    }

    if analysis.issues.is_empty() {
        content.push_str("*No issues*\n\n");
    } else {
        content.push_str("## Issues\n\n");
        for issue in &analysis.issues {
            content.push_str(&format!(
                "- **{}** ({}): {}\n",
                issue.category, issue.severity, issue.description
            ));
            if !issue.fix.is_empty() {
                content.push_str(&format!("  - Fix: {}\n", issue.fix));
            }
        }
        content.push('\n');
    }

    if let Some(improved) = &analysis.improved_requirement {
        content.push_str("## Improved Requirement\n\n");
        content.push_str(&format!("> {}\n\n", improved));
    }

    if !analysis.recommendations.is_empty() {
        content.push_str("## Recommendations\n\n");
        for rec in &analysis.recommendations {
            if rec.category.is_empty() {
                content.push_str(&format!("- {}\n", rec.description));
            } else {
                content.push_str(&format!("- **{}**: {}\n", rec.category, rec.description));
            }
            content.push_str(&format!("  - Suggested edit: {}\n", rec.suggested_edit));
        }
        content.push('\n');
    }

    if let Some(feedback) = &analysis.freeform_feedback {
        content.push_str("## Feedback\n\n");
        content.push_str(&format!("{}\n", feedback));
    }

    content
}

/// Write a rendered report, creating the parent directory if needed
pub fn write_report(path: &Path, contents: &str) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(OutputError::CreateDir)?;
    }
    fs::write(path, contents).map_err(OutputError::WriteReport)
}
