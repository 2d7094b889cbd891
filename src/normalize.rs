//! Normalization of model replies.
//!
//! A model is asked to return a JSON document with the corrected text and its
//! own readability metrics. Models regularly leave the metrics out, so the
//! reply is decoded here and, when either metric is missing, both are filled
//! in from [`crate::metrics`]. Anything that cannot be decoded is handed back
//! untouched.

use serde_json::{Map, Value};
use tracing::debug;

use crate::metrics;

/// Marker in front of the source text inside a prompt.
pub const PROMPT_TEXT_MARKER: &str = "Text:";

pub const RESPONSE_KEY: &str = "response";
pub const CORRECTED_TEXT_KEY: &str = "corrected_text";
pub const READABILITY_SCORE_KEY: &str = "readability_score";
pub const GRADE_LEVEL_KEY: &str = "grade_level";

/// Source text embedded in `prompt`: everything after the last `Text:`
/// marker, trimmed. Empty when the marker is absent.
pub fn extract_text_from_prompt(prompt: &str) -> &str {
    match prompt.rfind(PROMPT_TEXT_MARKER) {
        Some(idx) => prompt[idx + PROMPT_TEXT_MARKER.len()..].trim(),
        None => "",
    }
}

/// Adds `readability_score` and `grade_level` to the reply document unless
/// both are already there.
///
/// Metrics are computed from `corrected_text` when it is a non-empty string,
/// otherwise from the text embedded in `original_prompt`. When neither yields
/// any text the metric keys stay absent. Model-supplied metrics are kept as
/// they are. Input that is not a JSON object is returned unchanged.
pub fn process_model_response(response_text: &str, original_prompt: &str) -> String {
    let mut doc = match serde_json::from_str::<Value>(response_text) {
        Ok(Value::Object(doc)) => doc,
        Ok(_) => {
            debug!("model reply is not a JSON object, passing through");
            return response_text.to_string();
        }
        Err(err) => {
            debug!(error = %err, "model reply is not valid JSON, passing through");
            return response_text.to_string();
        }
    };

    if has_metric(&doc, READABILITY_SCORE_KEY) && has_metric(&doc, GRADE_LEVEL_KEY) {
        return Value::Object(doc).to_string();
    }

    let analysis = {
        let text = corrected_text(&doc).unwrap_or_else(|| extract_text_from_prompt(original_prompt));
        if text.is_empty() {
            None
        } else {
            Some(metrics::analyze(text))
        }
    };

    match analysis {
        Some(result) => {
            debug!(
                readability_score = result.readability_score,
                grade_level = result.grade_level,
                "filled in missing readability metrics"
            );
            doc.insert(
                READABILITY_SCORE_KEY.to_string(),
                Value::from(result.readability_score),
            );
            doc.insert(GRADE_LEVEL_KEY.to_string(), Value::from(result.grade_level));
        }
        None => debug!("no text to analyze, leaving metrics absent"),
    }

    Value::Object(doc).to_string()
}

/// Post-processes an upstream envelope `{"response": "<json>", ...}`.
///
/// Only a 200 envelope whose `response` field is a string holding valid JSON
/// is rewritten; every other payload comes back byte-for-byte.
pub fn normalize_envelope(status: u16, body: &str, prompt: &str) -> String {
    if status != 200 {
        return body.to_string();
    }
    let mut envelope = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(envelope)) => envelope,
        _ => return body.to_string(),
    };

    let processed = match envelope.get(RESPONSE_KEY).and_then(Value::as_str) {
        Some(inner) if serde_json::from_str::<Value>(inner).is_ok() => {
            process_model_response(inner, prompt)
        }
        _ => {
            debug!("envelope has no decodable response field, passing through");
            return body.to_string();
        }
    };

    envelope.insert(RESPONSE_KEY.to_string(), Value::String(processed));
    Value::Object(envelope).to_string()
}

/// A `null` metric counts as missing.
fn has_metric(doc: &Map<String, Value>, key: &str) -> bool {
    doc.get(key).is_some_and(|v| !v.is_null())
}

fn corrected_text(doc: &Map<String, Value>) -> Option<&str> {
    doc.get(CORRECTED_TEXT_KEY)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
