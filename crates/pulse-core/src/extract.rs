//! Best-effort recovery of a JSON object embedded in model output.
//!
//! Models wrap their JSON in prose or markdown fences more often than not.
//! This is a recovery heuristic, not a validating parser: a malformed span
//! still fails closed.

use serde_json::Value;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Extract the JSON object embedded in `text`.
///
/// Preference order: a fenced block tagged `json`, then the span from the
/// first `{` to the last `}`. Returns `None` when neither parses.
pub fn extract_json(text: &str) -> Option<Value> {
    match try_extract(text) {
        Ok(value) => Some(value),
        Err(reason) => {
            tracing::warn!(%reason, "failed to recover JSON from model output");
            None
        }
    }
}

fn try_extract(text: &str) -> Result<Value, String> {
    if let Some(block) = fenced_block(text) {
        return serde_json::from_str(block).map_err(|e| format!("fenced block: {e}"));
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start <= end => {
            serde_json::from_str(&text[start..=end]).map_err(|e| format!("brace span: {e}"))
        }
        _ => Err("no JSON found".into()),
    }
}

/// Contents of the first ```` ```json ```` fence, if it is closed and non-empty.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(JSON_FENCE)? + JSON_FENCE.len();
    let end = text[start..].find(FENCE)?;
    Some(&text[start..start + end]).filter(|block| !block.is_empty())
}
