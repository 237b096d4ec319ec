//! Defensive JSON extraction from model replies.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Direct,
    FencedBlock,
    BraceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedJson {
    pub value: Value,
    pub strategy: ParseStrategy,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid response format from AI model")]
    InvalidFormat,
}

fn fenced_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("fence regex should compile"))
}

fn direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

fn fenced_block(text: &str) -> Option<Value> {
    let inner = fenced_re().captures(text)?.get(1)?.as_str();
    serde_json::from_str(inner.trim()).ok()
}

fn brace_span(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

const STRATEGIES: &[(ParseStrategy, fn(&str) -> Option<Value>)] = &[
    (ParseStrategy::Direct, direct),
    (ParseStrategy::FencedBlock, fenced_block),
    (ParseStrategy::BraceSpan, brace_span),
];

/// Try each strategy in order; the first one that yields JSON wins.
pub fn parse_model_json(text: &str) -> Result<ParsedJson, ParseError> {
    STRATEGIES
        .iter()
        .find_map(|(strategy, extract)| {
            extract(text).map(|value| ParsedJson {
                value,
                strategy: *strategy,
            })
        })
        .ok_or(ParseError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_uses_direct_strategy() {
        let parsed = parse_model_json(r#"{"hook":{"text":"hi"}}"#).expect("parse");
        assert_eq!(parsed.strategy, ParseStrategy::Direct);
        assert_eq!(parsed.value["hook"]["text"], "hi");
    }

    #[test]
    fn fenced_block_inside_prose() {
        let text = "Sure! Here is your script:\n```json\n{\"hook\": {\"text\": \"Wait\"}}\n```\nEnjoy {not json}";
        let parsed = parse_model_json(text).expect("parse");
        assert_eq!(parsed.strategy, ParseStrategy::FencedBlock);
        assert_eq!(parsed.value["hook"]["text"], "Wait");
    }

    #[test]
    fn brace_span_as_last_resort() {
        let text = "Here you go: {\"ctas\": [\"Subscribe\"]} hope it helps";
        let parsed = parse_model_json(text).expect("parse");
        assert_eq!(parsed.strategy, ParseStrategy::BraceSpan);
        assert_eq!(parsed.value["ctas"][0], "Subscribe");
    }

    #[test]
    fn text_without_json_is_invalid() {
        assert_eq!(
            parse_model_json("I cannot help with that."),
            Err(ParseError::InvalidFormat)
        );
        assert_eq!(parse_model_json("} backwards {"), Err(ParseError::InvalidFormat));
    }
}
