//! Model output validation
//!
//! Turns the raw chat completions envelope into an [`AnalysisResult`]:
//! 1. extract the message text from `choices[0].message.content`
//! 2. strip a surrounding code fence (optionally tagged `json`) and whitespace
//! 3. parse JSON (failure is a parse error)
//! 4. check the result contract field by field (failure is a schema error naming
//!    the field)
//!
//! There is no best-effort mode: any failure means no result at all.

use deeptrust_common::{AnalysisResult, ForensicMetadata, IssueRecord, Severity, Verdict};
use serde_json::{Map, Value};

use super::inference_client::RawModelResponse;
use crate::error::AnalysisError;

const FENCE: &str = "```";

/// Validate a raw model response end to end
pub fn validate(raw: &RawModelResponse) -> Result<AnalysisResult, AnalysisError> {
    let content = extract_content(&raw.body)?;
    validate_content(&content)
}

/// Validate the model's message text (steps 2-4)
pub fn validate_content(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let stripped = strip_code_fence(content);
    if stripped.is_empty() {
        return Err(AnalysisError::Parse("model returned empty content".to_string()));
    }

    let value: Value =
        serde_json::from_str(stripped).map_err(|e| AnalysisError::Parse(e.to_string()))?;

    validate_value(&value)
}

/// Text of the first choice; array-of-parts content is joined
pub fn extract_content(envelope: &Value) -> Result<String, AnalysisError> {
    let content = envelope
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"));

    match content {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Array(parts)) => Ok(parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")),
        _ => Err(AnalysisError::Parse(
            "response envelope has no choices[0].message.content".to_string(),
        )),
    }
}

/// Remove a leading fence (with optional `json` tag) and a trailing fence
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        body = rest;
        if body.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            body = &body[4..];
        }
    }
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

fn validate_value(value: &Value) -> Result<AnalysisResult, AnalysisError> {
    let root = value
        .as_object()
        .ok_or_else(|| AnalysisError::schema("$", format!("expected an object, got {}", type_name(value))))?;

    let verdict = validate_verdict(root)?;
    let confidence = validate_confidence(root)?;
    let summary = require_string(root, "summary", "summary")?.to_string();
    let issues = validate_issues(root)?;
    let clear = validate_clear(root)?;
    let metadata = validate_metadata(root)?;

    Ok(AnalysisResult {
        verdict,
        confidence,
        summary,
        issues,
        clear,
        metadata,
    })
}

fn validate_verdict(root: &Map<String, Value>) -> Result<Verdict, AnalysisError> {
    let literal = require_string(root, "verdict", "verdict")?;
    Verdict::from_literal(literal).ok_or_else(|| {
        AnalysisError::schema(
            "verdict",
            format!("'{literal}' is not one of {}", literals(Verdict::ALL.iter().map(Verdict::as_str))),
        )
    })
}

fn validate_confidence(root: &Map<String, Value>) -> Result<u8, AnalysisError> {
    let value = root
        .get("confidence")
        .ok_or_else(|| AnalysisError::schema("confidence", "missing"))?;

    let out_of_range = || {
        AnalysisError::schema(
            "confidence",
            format!(
                "must be an integer in [{}, {}], got {value}",
                AnalysisResult::MIN_CONFIDENCE,
                AnalysisResult::MAX_CONFIDENCE
            ),
        )
    };

    let n = value.as_i64().ok_or_else(out_of_range)?;
    if !(AnalysisResult::MIN_CONFIDENCE..=AnalysisResult::MAX_CONFIDENCE).contains(&n) {
        return Err(out_of_range());
    }
    u8::try_from(n).map_err(|_| out_of_range())
}

fn validate_issues(root: &Map<String, Value>) -> Result<Vec<IssueRecord>, AnalysisError> {
    let entries = require_array(root, "issues")?;

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let path = format!("issues[{idx}]");
            let obj = entry.as_object().ok_or_else(|| {
                AnalysisError::schema(&path, format!("expected an object, got {}", type_name(entry)))
            })?;

            let name = require_non_empty(obj, "name", &format!("{path}.name"))?;
            let description = require_non_empty(obj, "description", &format!("{path}.description"))?;
            let severity_path = format!("{path}.severity");
            let literal = require_string(obj, "severity", &severity_path)?;
            let severity = Severity::from_literal(literal).ok_or_else(|| {
                AnalysisError::schema(
                    &severity_path,
                    format!("'{literal}' is not one of {}", literals(Severity::ALL.iter().map(Severity::as_str))),
                )
            })?;

            Ok(IssueRecord {
                name: name.to_string(),
                description: description.to_string(),
                severity,
            })
        })
        .collect()
}

fn validate_clear(root: &Map<String, Value>) -> Result<Vec<String>, AnalysisError> {
    require_array(root, "clear")?
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            entry.as_str().map(str::to_string).ok_or_else(|| {
                AnalysisError::schema(
                    format!("clear[{idx}]"),
                    format!("expected a string, got {}", type_name(entry)),
                )
            })
        })
        .collect()
}

/// Optional block; missing sub-fields default, wrongly typed ones are rejected
fn validate_metadata(root: &Map<String, Value>) -> Result<Option<ForensicMetadata>, AnalysisError> {
    let obj = match root.get("metadata") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            return Err(AnalysisError::schema(
                "metadata",
                format!("expected an object, got {}", type_name(other)),
            ))
        }
    };

    let text = |key: &str| -> Result<String, AnalysisError> {
        match obj.get(key) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(AnalysisError::schema(
                format!("metadata.{key}"),
                format!("expected a string, got {}", type_name(other)),
            )),
        }
    };

    let exif_present = match obj.get("exif_present") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(AnalysisError::schema(
                "metadata.exif_present",
                format!("expected a boolean, got {}", type_name(other)),
            ))
        }
    };

    Ok(Some(ForensicMetadata {
        exif_present,
        software_fingerprint: text("software_fingerprint")?,
        compression_analysis: text("compression_analysis")?,
        provenance_signals: text("provenance_signals")?,
        tampering_indicators: text("tampering_indicators")?,
        metadata_verdict: text("metadata_verdict")?,
    }))
}

fn require_string<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, AnalysisError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(AnalysisError::schema(
            path,
            format!("expected a string, got {}", type_name(other)),
        )),
        None => Err(AnalysisError::schema(path, "missing")),
    }
}

fn require_non_empty<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, AnalysisError> {
    let s = require_string(obj, key, path)?;
    if s.trim().is_empty() {
        return Err(AnalysisError::schema(path, "must not be empty"));
    }
    Ok(s)
}

fn require_array<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>, AnalysisError> {
    match obj.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(AnalysisError::schema(
            key,
            format!("expected a list, got {}", type_name(other)),
        )),
        None => Err(AnalysisError::schema(key, "missing")),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn literals<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.map(|v| format!("\"{v}\"")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "verdict": "Likely AI Generated",
            "confidence": 77,
            "summary": "Skin is unnaturally smooth and the left hand has six fingers.",
            "issues": [
                { "name": "Anatomy", "description": "Six fingers on left hand", "severity": "HIGH" },
                { "name": "Texture", "description": "Waxy skin", "severity": "MEDIUM" }
            ],
            "clear": ["Lighting Consistency"]
        })
    }

    fn envelope(content: &str) -> RawModelResponse {
        RawModelResponse {
            body: json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }),
        }
    }

    fn with(field: &str, value: Value) -> String {
        let mut v = sample();
        v[field] = value;
        v.to_string()
    }

    fn schema_field(err: AnalysisError) -> String {
        match err {
            AnalysisError::Schema { field, .. } => field,
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_response_builds_result() {
        let result = validate(&envelope(&sample().to_string())).unwrap();
        assert_eq!(result.verdict, Verdict::LikelyAiGenerated);
        assert_eq!(result.confidence, 77);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].severity, Severity::High);
        assert_eq!(result.clear, vec!["Lighting Consistency".to_string()]);
        assert!(result.metadata.is_none());
    }

    #[test]
    fn test_every_confidence_in_range_accepted() {
        for confidence in 1..=100 {
            let result = validate_content(&with("confidence", json!(confidence))).unwrap();
            assert_eq!(i64::from(result.confidence), confidence);
        }
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        for bad in [json!(0), json!(101), json!(-5), json!(82.5), json!(50.0), json!("80"), json!(null)] {
            let err = validate_content(&with("confidence", bad.clone())).unwrap_err();
            assert_eq!(schema_field(err), "confidence", "value {bad} should be rejected");
        }
    }

    #[test]
    fn test_every_verdict_literal_accepted() {
        for verdict in Verdict::ALL {
            let result = validate_content(&with("verdict", json!(verdict.as_str()))).unwrap();
            assert_eq!(result.verdict, verdict);
        }
    }

    #[test]
    fn test_unknown_verdict_rejected() {
        for bad in ["Fake", "real", "AI-Generated", ""] {
            let err = validate_content(&with("verdict", json!(bad))).unwrap_err();
            assert_eq!(schema_field(err), "verdict");
        }
    }

    #[test]
    fn test_fenced_and_plain_agree() {
        let plain = sample().to_string();
        let expected = validate_content(&plain).unwrap();

        for wrapped in [
            format!("```json\n{plain}\n```"),
            format!("```JSON\n{plain}\n```\n"),
            format!("```\n{plain}\n```"),
            format!("  \n```json{plain}```  "),
        ] {
            assert_eq!(validate_content(&wrapped).unwrap(), expected, "input: {wrapped}");
        }
    }

    #[test]
    fn test_not_json_is_parse_error() {
        let err = validate(&envelope("not json at all")).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
    }

    #[test]
    fn test_prose_around_json_is_parse_error() {
        let text = format!("Here is my analysis: {}", sample());
        assert!(matches!(validate_content(&text), Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn test_missing_content_is_parse_error() {
        let raw = RawModelResponse { body: json!({ "choices": [] }) };
        assert!(matches!(validate(&raw), Err(AnalysisError::Parse(_))));

        let raw = RawModelResponse { body: json!({ "choices": [{ "message": { "content": null } }] }) };
        assert!(matches!(validate(&raw), Err(AnalysisError::Parse(_))));
    }

    #[test]
    fn test_array_content_parts_joined() {
        let text = sample().to_string();
        let (head, tail) = text.split_at(10);
        let raw = RawModelResponse {
            body: json!({ "choices": [{ "message": { "content": [
                { "type": "text", "text": head },
                { "type": "text", "text": tail }
            ] } }] }),
        };
        assert_eq!(validate(&raw).unwrap().confidence, 77);
    }

    #[test]
    fn test_non_object_root_rejected() {
        let err = validate_content("[1, 2, 3]").unwrap_err();
        assert_eq!(schema_field(err), "$");
    }

    #[test]
    fn test_issue_fields_checked() {
        let err = validate_content(&with(
            "issues",
            json!([{ "name": "", "description": "d", "severity": "LOW" }]),
        ))
        .unwrap_err();
        assert_eq!(schema_field(err), "issues[0].name");

        let err = validate_content(&with(
            "issues",
            json!([
                { "name": "a", "description": "d", "severity": "LOW" },
                { "name": "b", "description": "d", "severity": "CRITICAL" }
            ]),
        ))
        .unwrap_err();
        assert_eq!(schema_field(err), "issues[1].severity");

        let err = validate_content(&with("issues", json!([{ "name": "a", "severity": "LOW" }]))).unwrap_err();
        assert_eq!(schema_field(err), "issues[0].description");
    }

    #[test]
    fn test_clear_must_be_list_of_strings() {
        assert!(validate_content(&with("clear", json!([]))).unwrap().clear.is_empty());

        let err = validate_content(&with("clear", json!("Lighting"))).unwrap_err();
        assert_eq!(schema_field(err), "clear");

        let err = validate_content(&with("clear", json!(["ok", 3]))).unwrap_err();
        assert_eq!(schema_field(err), "clear[1]");
    }

    #[test]
    fn test_required_fields() {
        for field in ["verdict", "confidence", "summary", "issues", "clear"] {
            let mut v = sample();
            v.as_object_mut().unwrap().remove(field);
            let err = validate_content(&v.to_string()).unwrap_err();
            assert_eq!(schema_field(err), field);
        }
    }

    #[test]
    fn test_partial_metadata_gets_defaults() {
        let result = validate_content(&with(
            "metadata",
            json!({ "software_fingerprint": "Adobe Firefly", "exif_present": false }),
        ))
        .unwrap();
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.software_fingerprint, "Adobe Firefly");
        assert!(metadata.compression_analysis.is_empty());
        assert!(metadata.metadata_verdict.is_empty());
    }

    #[test]
    fn test_metadata_wrong_types_rejected() {
        let err = validate_content(&with("metadata", json!("none"))).unwrap_err();
        assert_eq!(schema_field(err), "metadata");

        let err = validate_content(&with("metadata", json!({ "exif_present": "yes" }))).unwrap_err();
        assert_eq!(schema_field(err), "metadata.exif_present");
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
    }
}
