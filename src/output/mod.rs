mod report;

pub use report::write_report;

use crate::error::OutputError;
use crate::parser::RequirementAnalysis;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

/// Render an analysis for display or storage
pub fn render(
    analysis: &RequirementAnalysis,
    requirement_id: &str,
    format: OutputFormat,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => report::render_json(analysis, requirement_id),
        OutputFormat::Markdown => Ok(report::render_markdown(analysis, requirement_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserManager;

    const RESPONSE: &str = "\
=== QUALITY_SCORE ===
5
=== ISSUES ===
- Clarity (High): \"fast\" is vague | Fix: give a bound
- Testability (Low): no criteria
=== IMPROVED_REQUIREMENT ===
The system shall respond within 2 seconds.
=== RECOMMENDATIONS ===
- Clarity: quantify | Edit: within 2 seconds
=== END ===";

    fn analysis() -> RequirementAnalysis {
        ParserManager::default()
            .parse_response(RESPONSE, "REQ-42")
            .unwrap()
    }

    #[test]
    fn test_render_json() {
        let json = render(&analysis(), "REQ-42", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["requirement_id"], "REQ-42");
        assert_eq!(value["original_quality_score"], 5);
        assert_eq!(value["issues"][0]["category"], "Clarity");
        assert_eq!(value["hallucination_check"], "<NO_FABRICATION>");
        assert_eq!(value["is_analyzed"], true);
    }

    #[test]
    fn test_render_markdown() {
        let md = render(&analysis(), "REQ-42", OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Requirement REQ-42"));
        assert!(md.contains("| Quality Score | 5/10 |"));
        assert!(md.contains("| High | 1 |"));
        assert!(md.contains("- **Clarity** (High): \"fast\" is vague"));
        assert!(md.contains("  - Fix: give a bound"));
        assert!(md.contains("> The system shall respond within 2 seconds."));
        assert!(md.contains("Suggested edit: within 2 seconds"));
    }

    #[test]
    fn test_render_failed_record() {
        let failed = RequirementAnalysis::failed("provider timed out");
        let md = render(&failed, "REQ-43", OutputFormat::Markdown).unwrap();
        assert!(md.contains("**Analysis failed:** provider timed out"));
        assert!(md.contains("*No issues*"));
    }

    #[test]
    fn test_write_report_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/report.md");
        write_report(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
