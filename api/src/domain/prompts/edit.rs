use serde_json::json;

use crate::domain::quick_edit::EditAction;
use crate::models::GeneratedScript;

pub const EDIT_SYSTEM_PROMPT: &str = "You are an expert viral content creator and script editor. \
Respond with valid JSON ONLY: {\"hook\": {...}, \"body\": {...}, \"cta\": {...}, \"hashtags\": []}.";

/// User message for a quick edit: original input, current sections and the instruction
pub fn build_edit_prompt(script: &GeneratedScript, action: &EditAction) -> String {
    json!({
        "input": script.input,
        "currentScript": {
            "hook": script.hook,
            "body": script.body,
            "cta": script.cta,
            "hashtags": script.hashtags,
        },
        "instruction": action.instruction(),
    })
    .to_string()
}
