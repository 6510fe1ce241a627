//! Builds the instruction text sent to the model.
//!
//! The answer format requested here is the one [`DelimitedParser`] reads, so
//! the sentinel names come from the same [`Sentinel`] table.
//!
//! [`DelimitedParser`]: crate::parser::DelimitedParser

use crate::config::PromptConfig;
use crate::parser::{HallucinationCheck, IssueCategory, Sentinel, MAX_RECOMMENDATIONS};

const ANALYSIS_PROMPT: &str = "\
You are reviewing a single software requirement for quality.

Rate it from 1 (unusable) to 10 (excellent), list its issues, and propose an
improved wording that fixes them. Do not invent facts, numbers or actors that
are not implied by the original text; if you had to, say so in the
hallucination check.

Issue categories: {{CATEGORIES}}
Severities: High, Medium, Low
Give at most {{MAX_RECOMMENDATIONS}} recommendations, each with a concrete edit.

Answer using exactly these sections, in this order, and nothing else:

{{FORMAT}}
{{EXAMPLE}}
## Requirement

{{REQUIREMENT}}
";

const EXAMPLE: &str = "\
## Example answer

{{QUALITY_SCORE}}
5
{{ISSUES}}
- Clarity (High): \"fast\" is not measurable | Fix: state a response-time bound
- Testability (Medium): no acceptance criterion | Fix: name the load condition
{{IMPROVED_REQUIREMENT}}
The system shall return search results within 2 seconds for 95% of queries.
{{IMPROVED_QUALITY_SCORE}}
8
{{RECOMMENDATIONS}}
- Clarity: quantify speed | Edit: within 2 seconds for 95% of queries
{{HALLUCINATION_CHECK}}
<FABRICATED_DETAILS>
{{FEEDBACK}}
The 2 second bound is an assumption; confirm it with the product owner.
{{END}}
";

/// Build the analysis prompt for one requirement
pub fn build_analysis_prompt(requirement_text: &str, config: &PromptConfig) -> String {
    let categories = IssueCategory::PRIORITY
        .iter()
        .chain(std::iter::once(&IssueCategory::Quality))
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let example = if config.include_examples {
        fill_sentinels(EXAMPLE)
    } else {
        String::new()
    };

    ANALYSIS_PROMPT
        .replace("{{CATEGORIES}}", &categories)
        .replace("{{MAX_RECOMMENDATIONS}}", &MAX_RECOMMENDATIONS.to_string())
        .replace("{{FORMAT}}", &format_skeleton())
        .replace("{{EXAMPLE}}", &example)
        .replace("{{REQUIREMENT}}", requirement_text.trim())
}

fn format_skeleton() -> String {
    let line = |s: Sentinel, hint: &str| format!("{}\n{}\n", s.marker(), hint);
    let mut out = String::new();
    out.push_str(&line(Sentinel::QualityScore, "<integer 1-10>"));
    out.push_str(&line(
        Sentinel::Issues,
        "- <Category> (<Severity>): <description> | Fix: <how to fix>",
    ));
    out.push_str(&line(Sentinel::ImprovedRequirement, "<rewritten requirement>"));
    out.push_str(&line(Sentinel::ImprovedQualityScore, "<integer 1-10>"));
    out.push_str(&line(
        Sentinel::Recommendations,
        "- <Category>: <description> | Edit: <suggested wording>",
    ));
    out.push_str(&line(
        Sentinel::HallucinationCheck,
        &format!(
            "{} or {}",
            marker(HallucinationCheck::NoFabrication),
            marker(HallucinationCheck::FabricatedDetails)
        ),
    ));
    out.push_str(&line(Sentinel::Feedback, "<optional free-form notes>"));
    out.push_str(&Sentinel::End.marker());
    out.push('\n');
    out
}

fn marker(check: HallucinationCheck) -> String {
    let name = check.as_str();
    if name.starts_with('<') {
        name.to_string()
    } else {
        format!("<{}>", name)
    }
}

fn fill_sentinels(template: &str) -> String {
    Sentinel::ALL.iter().fold(template.to_string(), |acc, s| {
        acc.replace(&format!("{{{{{}}}}}", s.name()), &s.marker())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DelimitedParser, ResponseParser};

    #[test]
    fn test_prompt_contains_requirement_and_sentinels() {
        let prompt = build_analysis_prompt(
            "  The system shall be fast.  ",
            &PromptConfig::default(),
        );
        assert!(prompt.contains("The system shall be fast."));
        for sentinel in Sentinel::ALL {
            assert!(prompt.contains(&sentinel.marker()), "missing {:?}", sentinel);
        }
        assert!(prompt.contains("Clarity, Completeness, Testability, Consistency, Feasibility, Quality"));
        assert!(prompt.contains("<NO_FABRICATION>"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_example_section_is_optional() {
        let with = build_analysis_prompt("R", &PromptConfig::default());
        let without = build_analysis_prompt(
            "R",
            &PromptConfig {
                include_examples: false,
            },
        );
        assert!(with.contains("## Example answer"));
        assert!(!without.contains("## Example answer"));
    }

    #[test]
    fn test_example_answer_is_readable_by_delimited_parser() {
        let example = fill_sentinels(EXAMPLE);
        let body = example.trim_start_matches("## Example answer").trim();
        let analysis = DelimitedParser.parse_response(body, "example").unwrap();
        assert_eq!(analysis.original_quality_score, 5);
        assert_eq!(analysis.issues.len(), 2);
        assert_eq!(analysis.improved_quality_score, Some(8));
        assert_eq!(analysis.recommendations.len(), 1);
        assert_eq!(
            analysis.hallucination_check,
            HallucinationCheck::FabricatedDetails
        );
    }
}
