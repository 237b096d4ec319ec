//! Form validation: raw submissions in, typed inputs or every violation out.

use serde_json::Value;

use crate::constants::{
    CONTEXT_MAX_CHARS, CONTEXT_MAX_WORDS, LONG_CONTEXT_MAX_CHARS, LONG_CONTEXT_MAX_WORDS,
    NICHE_MAX_CHARS, NICHE_MAX_WORDS,
};
use crate::domain::sanitize::{sanitize, word_count};
use crate::models::{
    ContentGoal, FieldError, LongFormAudience, LongFormInput, LongFormInputForm, LongFormLength,
    LongFormTone, Platform, ScriptInput, ScriptInputForm, ScriptLength, TargetAudience, Tone,
};

pub type ValidationErrors = Vec<FieldError>;

/// Collects violations across fields so the caller sees all of them at once
#[derive(Default)]
struct Collector {
    errors: ValidationErrors,
}

impl Collector {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required_text(
        &mut self,
        field: &str,
        raw: Option<&str>,
        max_chars: usize,
        max_words: usize,
    ) -> Option<String> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            self.push(field, format!("{field} is required"));
            return None;
        };
        self.bounded_text(field, raw, max_chars, max_words)
    }

    fn optional_text(
        &mut self,
        field: &str,
        raw: Option<&str>,
        max_chars: usize,
        max_words: usize,
    ) -> Option<String> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        self.bounded_text(field, raw, max_chars, max_words)
    }

    fn bounded_text(
        &mut self,
        field: &str,
        raw: &str,
        max_chars: usize,
        max_words: usize,
    ) -> Option<String> {
        let before = self.errors.len();
        if raw.chars().count() > max_chars {
            self.push(field, format!("{field} must be at most {max_chars} characters"));
        }
        if word_count(raw) > max_words {
            self.push(field, format!("{field} must be at most {max_words} words"));
        }
        if self.errors.len() > before {
            return None;
        }

        let cleaned = sanitize(raw, max_chars);
        if cleaned.is_empty() {
            self.push(field, format!("{field} must contain text"));
            return None;
        }
        Some(cleaned)
    }

    fn choice<T: Copy>(
        &mut self,
        field: &str,
        raw: Option<&str>,
        parse: fn(&str) -> Option<T>,
        allowed: &[&str],
    ) -> Option<T> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            self.push(field, format!("{field} is required"));
            return None;
        };
        let parsed = parse(raw);
        if parsed.is_none() {
            self.push(field, format!("{field} must be one of: {}", allowed.join(", ")));
        }
        parsed
    }

    fn number<T>(&mut self, field: &str, raw: Option<&Value>, allowed: &[u32]) -> Option<T>
    where
        T: TryFrom<u32>,
    {
        let listed = allowed
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let value = match raw {
            None | Some(Value::Null) => {
                self.push(field, format!("{field} is required"));
                return None;
            }
            Some(value) => as_u32(value),
        };
        match value.and_then(|n| T::try_from(n).ok()) {
            Some(parsed) => Some(parsed),
            None => {
                self.push(field, format!("{field} must be one of: {listed}"));
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Numbers arrive as JSON numbers or numeric strings
fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn names<T: Copy>(all: &[T], as_str: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(as_str).collect()
}

pub fn validate_script_input(form: &ScriptInputForm) -> Result<ScriptInput, ValidationErrors> {
    let mut c = Collector::default();

    let niche = c.required_text("niche", form.niche.as_deref(), NICHE_MAX_CHARS, NICHE_MAX_WORDS);
    let target_audience = c.choice(
        "targetAudience",
        form.target_audience.as_deref(),
        TargetAudience::parse,
        &names(TargetAudience::ALL, TargetAudience::as_str),
    );
    let content_goal = c.choice(
        "contentGoal",
        form.content_goal.as_deref(),
        ContentGoal::parse,
        &names(ContentGoal::ALL, ContentGoal::as_str),
    );
    let tone = c.choice(
        "tone",
        form.tone.as_deref(),
        Tone::parse,
        &names(Tone::ALL, Tone::as_str),
    );
    let script_length: Option<ScriptLength> = c.number(
        "scriptLength",
        form.script_length.as_ref(),
        &ScriptLength::ALL.iter().map(|l| l.seconds()).collect::<Vec<_>>(),
    );
    let platform = c.choice(
        "platform",
        form.platform.as_deref(),
        Platform::parse,
        &names(Platform::ALL, Platform::as_str),
    );
    let additional_context = c.optional_text(
        "additionalContext",
        form.additional_context.as_deref(),
        CONTEXT_MAX_CHARS,
        CONTEXT_MAX_WORDS,
    );

    let input = (|| {
        Some(ScriptInput {
            niche: niche?,
            target_audience: target_audience?,
            content_goal: content_goal?,
            tone: tone?,
            script_length: script_length?,
            platform: platform?,
            additional_context,
        })
    })();
    c.finish(input)
}

pub fn validate_long_form_input(
    form: &LongFormInputForm,
) -> Result<LongFormInput, ValidationErrors> {
    let mut c = Collector::default();

    let niche = c.required_text("niche", form.niche.as_deref(), NICHE_MAX_CHARS, NICHE_MAX_WORDS);
    let target_audience = c.choice(
        "targetAudience",
        form.target_audience.as_deref(),
        LongFormAudience::parse,
        &names(LongFormAudience::ALL, LongFormAudience::as_str),
    );
    let content_goal = c.choice(
        "contentGoal",
        form.content_goal.as_deref(),
        ContentGoal::parse,
        &names(ContentGoal::ALL, ContentGoal::as_str),
    );
    let tone = c.choice(
        "tone",
        form.tone.as_deref(),
        LongFormTone::parse,
        &names(LongFormTone::ALL, LongFormTone::as_str),
    );
    let video_length_minutes: Option<LongFormLength> = c.number(
        "videoLengthMinutes",
        form.video_length_minutes.as_ref(),
        &LongFormLength::ALL.iter().map(|l| l.minutes()).collect::<Vec<_>>(),
    );
    let additional_context = c.optional_text(
        "additionalContext",
        form.additional_context.as_deref(),
        LONG_CONTEXT_MAX_CHARS,
        LONG_CONTEXT_MAX_WORDS,
    );

    let input = (|| {
        Some(LongFormInput {
            niche: niche?,
            target_audience: target_audience?,
            content_goal: content_goal?,
            tone: tone?,
            video_length_minutes: video_length_minutes?,
            chapter_segmentation: form.chapter_segmentation.unwrap_or(false),
            additional_context,
        })
    })();
    c.finish(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn travel_form() -> ScriptInputForm {
        serde_json::from_value(json!({
            "niche": "budget travel",
            "targetAudience": "gen-z",
            "contentGoal": "education",
            "tone": "funny",
            "scriptLength": 30,
            "platform": "tiktok"
        }))
        .expect("form")
    }

    #[test]
    fn accepts_a_complete_form() {
        let input = validate_script_input(&travel_form()).expect("valid");
        assert_eq!(input.niche, "budget travel");
        assert_eq!(input.script_length, ScriptLength::Medium);
        assert_eq!(input.platform, Platform::Tiktok);
        assert_eq!(input.additional_context, None);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let mut form = travel_form();
        form.script_length = Some(json!("60"));
        let input = validate_script_input(&form).expect("valid");
        assert_eq!(input.script_length, ScriptLength::Long);
    }

    #[test]
    fn collects_every_violation() {
        let form = ScriptInputForm {
            niche: Some("   ".into()),
            target_audience: Some("aliens".into()),
            content_goal: None,
            tone: Some("funny".into()),
            script_length: Some(json!(45)),
            platform: Some("myspace".into()),
            additional_context: Some("word ".repeat(120)),
        };
        let errors = validate_script_input(&form).expect_err("invalid");
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "niche",
                "targetAudience",
                "contentGoal",
                "scriptLength",
                "platform",
                "additionalContext"
            ]
        );
    }

    #[test]
    fn niche_bounds_are_enforced() {
        let mut form = travel_form();
        form.niche = Some("x".repeat(201));
        let errors = validate_script_input(&form).expect_err("too long");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "niche");

        form.niche = Some("<b></b>".into());
        let errors = validate_script_input(&form).expect_err("empty after cleaning");
        assert_eq!(errors[0].message, "niche must contain text");
    }

    #[test]
    fn niche_is_sanitized() {
        let mut form = travel_form();
        form.niche = Some("<i>budget</i> travel".into());
        let input = validate_script_input(&form).expect("valid");
        assert_eq!(input.niche, "budget travel");
    }

    #[test]
    fn long_form_uses_its_own_sets() {
        let form: LongFormInputForm = serde_json::from_value(json!({
            "niche": "home coffee roasting",
            "targetAudience": "general-audience",
            "contentGoal": "education",
            "tone": "casual",
            "videoLengthMinutes": 10,
            "chapterSegmentation": true
        }))
        .expect("form");
        let input = validate_long_form_input(&form).expect("valid");
        assert_eq!(input.video_length_minutes, LongFormLength::M10);
        assert!(input.chapter_segmentation);

        let mut bad = form.clone();
        bad.target_audience = Some("parents".into());
        bad.video_length_minutes = Some(json!(7));
        let errors = validate_long_form_input(&bad).expect_err("invalid");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn long_form_context_allows_more_characters() {
        let form = LongFormInputForm {
            niche: Some("chess openings".into()),
            target_audience: Some("professionals".into()),
            content_goal: Some("education".into()),
            tone: Some("professional".into()),
            video_length_minutes: Some(json!(5)),
            chapter_segmentation: None,
            additional_context: Some("a".repeat(900)),
        };
        let input = validate_long_form_input(&form).expect("valid");
        assert_eq!(input.additional_context.map(|c| c.len()), Some(900));
    }
}
