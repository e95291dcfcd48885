//! Pulls the JSON object out of a free-text model reply.
//!
//! Models usually answer with a bare object, sometimes wrapped in a
//! ```json fence, sometimes with prose around it. Extraction order:
//! fenced block, then the whole text, then a plain-text fallback.

use serde_json::{Map, Value};

/// Key used when the reply could not be parsed as a JSON object.
pub const FALLBACK_TEXT_KEY: &str = "analysis_text";

/// Attempt to parse a JSON object from the reply. Returns `None` when
/// neither a fenced block nor the full text parses as an object; arrays
/// and scalars do not count as an analysis.
pub fn try_extract_json(response: &str) -> Option<Map<String, Value>> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + "```json".len();
        if let Some(end_offset) = response[start..].find("```") {
            let fenced = response[start..start + end_offset].trim();
            if let Some(map) = parse_object(fenced) {
                return Some(map);
            }
        }
    }

    parse_object(response.trim())
}

/// Extract the analysis object, degrading to `{analysis_text: <reply>}`
/// when nothing parses. Never fails.
pub fn extract_analysis(response: &str) -> Map<String, Value> {
    match try_extract_json(response) {
        Some(map) => map,
        None => {
            log::warn!("⚠️ Model reply was not valid JSON, wrapping as text");
            let mut map = Map::new();
            map.insert(
                FALLBACK_TEXT_KEY.to_string(),
                Value::String(response.to_string()),
            );
            map
        }
    }
}

/// Stamp the classifier verdict onto a successfully parsed menu analysis.
/// When the model returned an empty recommendation list even though a menu
/// was detected, add a note explaining the empty result. Must not be called
/// on the fallback wrapper.
pub fn annotate_menu_analysis(analysis: &mut Map<String, Value>, menu_detected: bool) {
    analysis.insert("menu_detected".to_string(), Value::Bool(menu_detected));

    if menu_detected {
        let empty_recommendations = matches!(
            analysis.get("recommendations"),
            Some(Value::Array(items)) if items.is_empty()
        );
        if empty_recommendations {
            analysis.insert(
                "note".to_string(),
                Value::String(
                    "A menu was detected but no items matching your preferences \
                     could be identified in it."
                        .to_string(),
                ),
            );
        }
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
