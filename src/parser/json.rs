use super::analysis::{AnalysisDraft, HallucinationCheck, IssueDraft, RecommendationDraft};
use super::issue::{parse_issue_item, parse_recommendation_item};
use super::validate::first_integer;
use super::ResponseParser;
use crate::error::ParserError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

const SCORE_KEYS: &[&str] = &["qualityscore", "originalqualityscore", "score"];
const IMPROVED_SCORE_KEYS: &[&str] = &["improvedqualityscore", "improvedscore"];
const ISSUE_KEYS: &[&str] = &["issues", "issuesfound"];
const RECOMMENDATION_KEYS: &[&str] = &["recommendations"];
const IMPROVED_REQUIREMENT_KEYS: &[&str] = &["improvedrequirement", "rewrittenrequirement"];
const FEEDBACK_KEYS: &[&str] = &["freeformfeedback", "feedback"];
const HALLUCINATION_KEYS: &[&str] = &["hallucinationcheck", "hallucination"];

/// Parses responses that answer with a JSON object (optionally fenced)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl ResponseParser for JsonParser {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn can_parse(&self, text: &str) -> bool {
        let candidate = strip_code_fences(text);
        (candidate.starts_with('{') && candidate.ends_with('}'))
            || (candidate.starts_with('[') && candidate.ends_with(']'))
    }

    fn try_parse(&self, text: &str, requirement_id: &str) -> Result<AnalysisDraft, ParserError> {
        let candidate = strip_code_fences(text);
        if candidate.is_empty() {
            return Err(ParserError::Empty);
        }

        let cleaned = remove_trailing_commas(candidate);
        let value: Value = serde_json::from_str(&cleaned)?;
        let object = unwrap_analysis_object(value)?;

        debug!(
            requirement_id,
            keys = object.len(),
            "Mapping JSON analysis object"
        );
        Ok(draft_from_object(&object))
    }

    fn estimates_missing_score(&self) -> bool {
        false
    }
}

/// Remove a markdown fence that wraps the whole response
fn strip_code_fences(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let re = FENCE.get_or_init(|| {
        Regex::new(r"(?s)\A\s*```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\s*```\s*\z")
            .expect("fence regex is valid")
    });

    match re.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Drop commas that directly precede a closing bracket, outside string
/// literals, so `{"a": 1,}` parses.
fn remove_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_comma: Option<String> = None;

    for c in s.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if let Some(buffer) = pending_comma.as_mut() {
            if c.is_whitespace() {
                buffer.push(c);
                continue;
            }
            let buffer = pending_comma.take().unwrap_or_default();
            if c == '}' || c == ']' {
                // keep the whitespace, lose the comma
                out.push_str(&buffer[1..]);
            } else {
                out.push_str(&buffer);
            }
        }

        match c {
            ',' => pending_comma = Some(String::from(",")),
            '"' => {
                in_string = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if let Some(buffer) = pending_comma {
        out.push_str(&buffer);
    }
    out
}

/// Find the object that carries the analysis fields.
///
/// Accepts the object itself, the first object of a top-level array, a
/// `{"result": "<json>"}` wrapper, or a single-key wrapper such as
/// `{"analysis": {...}}`.
fn unwrap_analysis_object(value: Value) -> Result<Map<String, Value>, ParserError> {
    match value {
        Value::Object(map) => {
            let keys = fold_keys(&map);
            if has_any_field(&keys) {
                return Ok(map);
            }

            if let Some(Value::String(inner)) = keys.get("result") {
                if let Ok(inner_value) =
                    serde_json::from_str::<Value>(&remove_trailing_commas(strip_code_fences(inner)))
                {
                    if let Value::Object(inner_map) = inner_value {
                        return Ok(inner_map);
                    }
                }
            }

            if map.len() == 1 {
                if let Some(Value::Object(inner)) = map.values().next() {
                    return Ok(inner.clone());
                }
            }

            Ok(map)
        }
        Value::Array(items) => items
            .into_iter()
            .find_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .ok_or(ParserError::NotAnObject("an array without objects")),
        Value::String(_) => Err(ParserError::NotAnObject("a string")),
        Value::Number(_) => Err(ParserError::NotAnObject("a number")),
        Value::Bool(_) => Err(ParserError::NotAnObject("a boolean")),
        Value::Null => Err(ParserError::NotAnObject("null")),
    }
}

fn has_any_field(keys: &HashMap<String, &Value>) -> bool {
    [
        SCORE_KEYS,
        IMPROVED_SCORE_KEYS,
        ISSUE_KEYS,
        RECOMMENDATION_KEYS,
        IMPROVED_REQUIREMENT_KEYS,
        FEEDBACK_KEYS,
        HALLUCINATION_KEYS,
    ]
    .iter()
    .any(|aliases| aliases.iter().any(|k| keys.contains_key(*k)))
}

/// Case- and separator-insensitive key: `Quality_Score` -> `qualityscore`
fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_keys(map: &Map<String, Value>) -> HashMap<String, &Value> {
    map.iter().map(|(k, v)| (fold_key(k), v)).collect()
}

fn field<'a>(keys: &HashMap<String, &'a Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| keys.get(*alias).copied())
        .filter(|v| !v.is_null())
}

fn draft_from_object(map: &Map<String, Value>) -> AnalysisDraft {
    let keys = fold_keys(map);

    AnalysisDraft {
        quality_score: field(&keys, SCORE_KEYS).and_then(value_as_score),
        improved_quality_score: field(&keys, IMPROVED_SCORE_KEYS).and_then(value_as_score),
        issues: field(&keys, ISSUE_KEYS).map(|v| list_items(v).map(issue_from_value).collect()),
        recommendations: field(&keys, RECOMMENDATION_KEYS)
            .map(|v| list_items(v).map(recommendation_from_value).collect()),
        improved_requirement: field(&keys, IMPROVED_REQUIREMENT_KEYS).and_then(value_as_text),
        freeform_feedback: field(&keys, FEEDBACK_KEYS).and_then(value_as_text),
        hallucination_check: field(&keys, HALLUCINATION_KEYS)
            .and_then(value_as_text)
            .and_then(|s| HallucinationCheck::detect(&s)),
    }
}

/// Iterate a JSON list; a lone non-array value is treated as a list of one
fn list_items(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

fn issue_from_value(value: &Value) -> IssueDraft {
    match value {
        Value::Object(map) => {
            let keys = fold_keys(map);
            IssueDraft {
                category: field(&keys, &["category", "type"]).and_then(value_as_text),
                severity: field(&keys, &["severity", "priority"]).and_then(value_as_text),
                description: field(&keys, &["description", "issue", "text"])
                    .and_then(value_as_text),
                fix: field(&keys, &["fix", "suggestion", "suggestedfix"]).and_then(value_as_text),
            }
        }
        other => value_as_text(other)
            .map(|line| IssueDraft::from(parse_issue_item(&line)))
            .unwrap_or_default(),
    }
}

fn recommendation_from_value(value: &Value) -> RecommendationDraft {
    match value {
        Value::Object(map) => {
            let keys = fold_keys(map);
            RecommendationDraft {
                category: field(&keys, &["category", "type"]).and_then(value_as_text),
                description: field(&keys, &["description", "recommendation", "text"])
                    .and_then(value_as_text),
                suggested_edit: field(&keys, &["suggestededit", "edit", "rewrite"])
                    .and_then(value_as_text),
            }
        }
        other => value_as_text(other)
            .map(|line| parse_recommendation_item(&line))
            .unwrap_or_default(),
    }
}

fn value_as_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => first_integer(s),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_as_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("\n"))
            }
        }
        Value::Object(_) | Value::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{IssueCategory, Severity};

    fn parse(text: &str) -> crate::parser::RequirementAnalysis {
        JsonParser.parse_response(text, "REQ-1").unwrap()
    }

    #[test]
    fn test_can_parse_plain_and_fenced() {
        assert!(JsonParser.can_parse(r#"{"QualityScore": 5}"#));
        assert!(JsonParser.can_parse("```json\n{\"QualityScore\": 5}\n```"));
        assert!(JsonParser.can_parse("```\n[{\"QualityScore\": 5}]\n```"));
        assert!(!JsonParser.can_parse("QUALITY SCORE: 5"));
        assert!(!JsonParser.can_parse(""));
        assert!(!JsonParser.can_parse("{ unterminated"));
    }

    #[test]
    fn test_score_clamped_down() {
        let analysis = parse(r#"{"QualityScore": 15, "Issues": [], "Recommendations": []}"#);
        assert_eq!(analysis.original_quality_score, 10);
        assert!(analysis.issues.is_empty());
        assert_eq!(analysis.parser, "JSON");
    }

    #[test]
    fn test_case_insensitive_keys_and_trailing_commas() {
        let analysis = parse(
            r#"{
                "quality_score": 6,
                "issues": [
                    {"CATEGORY": "Clarity", "severity": "high", "description": "vague", "fix": "quantify",},
                ],
                "hallucinationCheck": "FABRICATED_DETAILS",
            }"#,
        );
        assert_eq!(analysis.original_quality_score, 6);
        assert_eq!(analysis.issues.len(), 1);
        assert_eq!(analysis.issues[0].category, IssueCategory::Clarity);
        assert_eq!(analysis.issues[0].severity, Severity::High);
        assert_eq!(analysis.issues[0].fix, "quantify");
        assert_eq!(
            analysis.hallucination_check,
            HallucinationCheck::FabricatedDetails
        );
    }

    #[test]
    fn test_trailing_comma_inside_string_preserved() {
        let cleaned = remove_trailing_commas(r#"{"a": "x,}", "b": [1, 2,],}"#);
        assert_eq!(cleaned, r#"{"a": "x,}", "b": [1, 2]}"#);
    }

    #[test]
    fn test_recommendation_cap_and_filter() {
        let analysis = parse(
            r#"{"QualityScore": 5, "Recommendations": [
                {"Category": "Clarity", "Description": "a", "SuggestedEdit": "edit a"},
                {"Category": "Clarity", "Description": "b", "SuggestedEdit": "edit b"},
                {"Category": "Clarity", "Description": "c"},
                {"Category": "Clarity", "Description": "d"},
                {"Category": "Clarity", "Description": "e", "SuggestedEdit": ""}
            ]}"#,
        );
        assert_eq!(analysis.recommendations.len(), 2);
        assert!(analysis
            .recommendations
            .iter()
            .all(|r| !r.suggested_edit.is_empty()));
    }

    #[test]
    fn test_template_marker_category() {
        let analysis = parse(
            r#"{"QualityScore": 5,
                "Issues": [{"Category": "<Clarity|Testability>", "Description": "x"}],
                "Recommendations": [{"Category": "<Clarity|Testability>", "Description": "x", "SuggestedEdit": "y"}]}"#,
        );
        assert_eq!(analysis.issues[0].category, IssueCategory::Clarity);
        assert_eq!(analysis.recommendations[0].category, "Clarity");
    }

    #[test]
    fn test_missing_collections_become_empty() {
        let analysis = parse(r#"{"QualityScore": "7/10"}"#);
        assert_eq!(analysis.original_quality_score, 7);
        assert!(analysis.issues.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.hallucination_check, HallucinationCheck::NoFabrication);
    }

    #[test]
    fn test_missing_score_clamped_to_minimum() {
        let analysis = parse(r#"{"Issues": []}"#);
        assert_eq!(analysis.original_quality_score, 1);
    }

    #[test]
    fn test_array_and_wrappers() {
        assert_eq!(parse(r#"[{"QualityScore": 3}]"#).original_quality_score, 3);
        assert_eq!(
            parse(r#"{"analysis": {"QualityScore": 8}}"#).original_quality_score,
            8
        );
        assert_eq!(
            parse(r#"{"result": "{\"QualityScore\": 9}", "session_id": "abc"}"#)
                .original_quality_score,
            9
        );
    }

    #[test]
    fn test_string_issue_items_use_normalizer() {
        let analysis = parse(
            r#"{"QualityScore": 5, "Issues": ["Testability (Low): no criteria | Fix: add one"]}"#,
        );
        assert_eq!(analysis.issues[0].category, IssueCategory::Testability);
        assert_eq!(analysis.issues[0].severity, Severity::Low);
        assert_eq!(analysis.issues[0].fix, "add one");
    }

    #[test]
    fn test_float_score_rounded() {
        assert_eq!(parse(r#"{"QualityScore": 6.6}"#).original_quality_score, 7);
    }

    #[test]
    fn test_hallucination_verdict_wording() {
        for (verdict, expected) in [
            ("No fabricated details", HallucinationCheck::NoFabrication),
            ("FABRICATION: none detected", HallucinationCheck::NoFabrication),
            ("<NO_FABRICATION>", HallucinationCheck::NoFabrication),
            ("FABRICATED_DETAILS", HallucinationCheck::FabricatedDetails),
        ] {
            let text = format!(r#"{{"QualityScore": 6, "HallucinationCheck": "{}"}}"#, verdict);
            assert_eq!(parse(&text).hallucination_check, expected, "{}", verdict);
        }
    }

    #[test]
    fn test_malformed_json_returns_none() {
        assert!(JsonParser
            .parse_response(r#"{"QualityScore": 5, "Issues": [}"#, "REQ-2")
            .is_none());
        assert!(JsonParser.parse_response("[1, 2, 3]", "REQ-3").is_none());
    }
}
