//! Input cleaning and moderation heuristics.
//!
//! These filters are best-effort: they catch the obvious cases before a
//! request reaches the model, not every possible attack or abuse.

use regex::Regex;
use std::sync::OnceLock;

fn script_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")
            .expect("script block regex should compile")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex should compile"))
}

fn js_protocol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)javascript\s*:").expect("protocol regex should compile"))
}

fn event_handler_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("event handler regex should compile")
    })
}

/// Strip markup and script vectors, then truncate to `max_len` characters.
pub fn sanitize(text: &str, max_len: usize) -> String {
    let cleaned = script_block_re().replace_all(text, "");
    let cleaned = tag_re().replace_all(&cleaned, "");
    let cleaned = js_protocol_re().replace_all(&cleaned, "");
    let cleaned = event_handler_re().replace_all(&cleaned, "");
    let cleaned: String = cleaned.chars().filter(|c| *c != '<' && *c != '>').collect();

    cleaned.trim().chars().take(max_len).collect()
}

/// Whitespace-separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn injection_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)\b(ignore|forget|disregard)\s+(all|any|the|previous|prior|above)\s+(\w+\s+)?(instructions|directions|rules)",
            r"(?i)\bdisregard\s+(the\s+)?(system|previous)\s+prompt",
            r"(?i)\b(reveal|show|print|repeat)\s+(me\s+)?(the\s+|your\s+)?(hidden|system|internal|initial)\s+(prompt|instructions)",
            r"(?i)\b(you are|you're)\s+(now\s+)?(an?\s+)?(ai|chatgpt|assistant|language model)\b",
            r"(?i)\bact\s+as\s+(an?\s+)?(ai|chatgpt|assistant|system|developer|dan)\b",
            r"(?i)\bswitch\s+(your\s+)?(role|persona)",
            r"(?i)\bjailbreak",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("injection regex should compile"))
        .collect()
    })
}

fn disallowed_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)\b(sexual|porn\w*|nsfw|erotic\w*)",
            r"(?i)\b(violence|gore|torture)\b",
            r"(?i)\b(hate\s*speech|racist|bigot\w*)",
            r"(?i)\b(extremist\w*|terroris\w*|terror)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("content regex should compile"))
        .collect()
    })
}

/// Phrases asking the model to drop its instructions, leak them, or change persona
pub fn contains_prompt_injection(text: &str) -> bool {
    injection_patterns().iter().any(|re| re.is_match(text))
}

/// Sexual, violent, hateful or extremist keyword families
pub fn contains_disallowed_content(text: &str) -> bool {
    disallowed_patterns().iter().any(|re| re.is_match(text))
}

/// Outcome of screening free text before or after generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screening {
    Clean,
    PromptInjection,
    Disallowed,
}

/// Screen user-supplied text. Injection is checked first.
pub fn screen_input<'a>(texts: impl IntoIterator<Item = &'a str>) -> Screening {
    let mut verdict = Screening::Clean;
    for text in texts {
        if contains_prompt_injection(text) {
            return Screening::PromptInjection;
        }
        if contains_disallowed_content(text) {
            verdict = Screening::Disallowed;
        }
    }
    verdict
}

/// Screen model output. Only the disallowed-content family applies here.
pub fn screen_output<'a>(texts: impl IntoIterator<Item = &'a str>) -> Screening {
    if texts.into_iter().any(contains_disallowed_content) {
        Screening::Disallowed
    } else {
        Screening::Clean
    }
}
