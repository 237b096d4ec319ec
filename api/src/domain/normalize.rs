//! Turn loosely-shaped model JSON into strict script types.
//!
//! Extraction is lenient: wrong types, blanks and missing keys fall back to
//! defaults instead of failing. The only hard failure is a long-form reply
//! with neither an outline nor a script.

use chrono::Utc;
use serde_json::Value;

use crate::constants::{HOOK_SECONDS, INTRO_SHARE, OUTRO_SHARE, TEXT_PLACEHOLDER};
use crate::domain::prompts::{caption_limit, hashtag_limit};
use crate::models::{
    Chapter, ContentGoal, GeneratedScript, LongFormGenerated, LongFormInput, LongFormOutline,
    LongFormScriptBody, OutlineBookend, OutlineSection, PlatformFormatting, ScriptBody, ScriptCta,
    ScriptHook, ScriptInput, ScriptPerformance, ScriptSection, Urgency,
};

// ============================================================================
// Lenient field access
// ============================================================================

/// Non-blank string at `key`, trimmed
pub(crate) fn text(value: &Value, key: &str) -> Option<String> {
    let s = value.get(key)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Positive whole number at `key`; numeric strings and floats are accepted
pub(crate) fn positive_u32(value: &Value, key: &str) -> Option<u32> {
    let n = match value.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 1.0).then(|| n.round().min(f64::from(u32::MAX)) as u32)
}

/// Non-blank strings of an array at `key`; anything else gives `[]`
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn text_or_placeholder(value: &Value, key: &str) -> String {
    text(value, key).unwrap_or_else(|| TEXT_PLACEHOLDER.to_string())
}

fn section_is_blank(raw: &Value, key: &str) -> bool {
    match raw.get(key) {
        Some(section) if section.is_object() => text(section, "text").is_none(),
        _ => true,
    }
}

// ============================================================================
// Short form
// ============================================================================

/// A hook, body or CTA object is missing or has blank text
pub fn needs_stricter_retry(raw: &Value) -> bool {
    ["hook", "body", "cta"]
        .iter()
        .any(|key| section_is_blank(raw, key))
}

pub(crate) fn default_body_seconds(input: &ScriptInput) -> u32 {
    input.script_length.seconds().saturating_sub(6).max(1)
}

/// Model-supplied durations never exceed the requested script length
pub(crate) fn hook_from(raw: &Value, input: &ScriptInput) -> ScriptHook {
    ScriptHook {
        text: text_or_placeholder(raw, "text"),
        duration: positive_u32(raw, "duration")
            .map(|d| d.min(input.script_length.seconds()))
            .unwrap_or(HOOK_SECONDS),
        visual_cues: string_list(raw, "visualCues"),
    }
}

pub(crate) fn body_from(raw: &Value, input: &ScriptInput) -> ScriptBody {
    ScriptBody {
        text: text_or_placeholder(raw, "text"),
        duration: positive_u32(raw, "duration")
            .map(|d| d.min(input.script_length.seconds()))
            .unwrap_or_else(|| default_body_seconds(input)),
        key_points: string_list(raw, "keyPoints"),
        visual_cues: string_list(raw, "visualCues"),
        transitions: string_list(raw, "transitions"),
    }
}

pub(crate) fn cta_from(raw: &Value) -> ScriptCta {
    ScriptCta {
        text: text_or_placeholder(raw, "text"),
        action: text(raw, "action").unwrap_or_else(|| "engage".to_string()),
        urgency: text(raw, "urgency")
            .and_then(|u| Urgency::parse(&u))
            .unwrap_or_default(),
        visual_cues: string_list(raw, "visualCues"),
    }
}

/// Hashtags without a leading `#`, de-duplicated, capped at the platform limit
pub(crate) fn hashtags_from(raw: &Value, limit: u32) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in string_list(raw, "hashtags") {
        let tag = tag.trim_start_matches('#').trim().to_string();
        if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }
    tags.truncate(limit as usize);
    tags
}

fn formatting_from(raw: &Value, input: &ScriptInput) -> PlatformFormatting {
    let defaults = Value::Null;
    let raw = raw.get("platformFormatting").unwrap_or(&defaults);
    PlatformFormatting {
        platform: input.platform,
        aspect_ratio: text(raw, "aspectRatio").unwrap_or_else(|| "9:16".to_string()),
        max_duration: input.script_length.seconds(),
        hashtag_limit: hashtag_limit(input.platform),
        caption_limit: positive_u32(raw, "captionLimit")
            .unwrap_or_else(|| caption_limit(input.platform)),
        features: string_list(raw, "features"),
    }
}

fn score(raw: &Value, key: &str) -> Option<u8> {
    let n = match raw.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.round().clamp(1.0, 10.0) as u8)
}

fn performance_from(raw: &Value) -> Option<ScriptPerformance> {
    let raw = raw.get("performance").filter(|p| p.is_object())?;
    let hook_strength = score(raw, "hookStrength").unwrap_or(5);
    let engagement_potential = score(raw, "engagementPotential").unwrap_or(5);
    let viral_potential = score(raw, "viralPotential").unwrap_or(5);
    let cta_effectiveness = score(raw, "ctaEffectiveness").unwrap_or(5);
    let average = (u32::from(hook_strength)
        + u32::from(engagement_potential)
        + u32::from(viral_potential)
        + u32::from(cta_effectiveness)
        + 2)
        / 4;
    Some(ScriptPerformance {
        hook_strength,
        engagement_potential,
        viral_potential,
        cta_effectiveness,
        overall_score: score(raw, "overallScore").unwrap_or(average as u8),
        improvements: string_list(raw, "improvements"),
    })
}

/// Build a complete script from whatever the model returned. Never fails.
pub fn normalize(raw: &Value, input: &ScriptInput) -> GeneratedScript {
    let missing = Value::Null;
    let hook = hook_from(raw.get("hook").unwrap_or(&missing), input);
    let body = body_from(raw.get("body").unwrap_or(&missing), input);
    let cta = cta_from(raw.get("cta").unwrap_or(&missing));

    let mut script = GeneratedScript {
        id: uuid::Uuid::new_v4().to_string(),
        hook,
        body,
        cta,
        hashtags: hashtags_from(raw, hashtag_limit(input.platform)),
        platform: input.platform,
        platform_formatting: formatting_from(raw, input),
        total_duration: 0,
        created_at: Utc::now(),
        input: input.clone(),
        performance: performance_from(raw),
    };
    script.total_duration = script.computed_duration();
    script
}

// ============================================================================
// Long form
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Incomplete long-form structure from AI model")]
    MissingStructure,
}

pub(crate) fn default_ctas(goal: ContentGoal) -> Vec<String> {
    let ctas: [&str; 2] = match goal {
        ContentGoal::Education => [
            "Subscribe for more in-depth guides",
            "Turn on notifications to keep learning",
        ],
        ContentGoal::Entertainment => ["Like and share if you enjoyed", "Comment your favorite moment"],
        ContentGoal::ProductPromotion => [
            "Check the link in the description",
            "Use the promo code mentioned in the video",
        ],
        ContentGoal::BrandAwareness => [
            "Follow for more stories",
            "Join the community linked in the description",
        ],
    };
    ctas.iter().map(|c| c.to_string()).collect()
}

fn bookend(raw: Option<&Value>, default_title: &str) -> OutlineBookend {
    let missing = Value::Null;
    let raw = raw.unwrap_or(&missing);
    OutlineBookend {
        title: text(raw, "title").unwrap_or_else(|| default_title.to_string()),
        objective: text_or_placeholder(raw, "objective"),
    }
}

fn array<'a>(value: Option<&'a Value>, key: &str) -> &'a [Value] {
    value
        .and_then(|v| v.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn outline_from(outline: Option<&Value>, script: Option<&Value>) -> LongFormOutline {
    let mut sections: Vec<OutlineSection> = array(outline, "sections")
        .iter()
        .enumerate()
        .map(|(i, s)| OutlineSection {
            title: text(s, "title").unwrap_or_else(|| format!("Section {}", i + 1)),
            key_points: string_list(s, "keyPoints"),
        })
        .collect();

    if sections.is_empty() {
        sections = array(script, "sections")
            .iter()
            .enumerate()
            .map(|(i, s)| OutlineSection {
                title: text(s, "title").unwrap_or_else(|| format!("Section {}", i + 1)),
                key_points: Vec::new(),
            })
            .collect();
    }

    LongFormOutline {
        intro: bookend(outline.and_then(|o| o.get("intro")), "Introduction"),
        sections,
        outro: bookend(outline.and_then(|o| o.get("outro")), "Conclusion"),
    }
}

fn script_from(script: Option<&Value>, outline: &LongFormOutline) -> LongFormScriptBody {
    let mut sections: Vec<ScriptSection> = array(script, "sections")
        .iter()
        .enumerate()
        .map(|(i, s)| ScriptSection {
            title: text(s, "title").unwrap_or_else(|| {
                outline
                    .sections
                    .get(i)
                    .map(|o| o.title.clone())
                    .unwrap_or_else(|| format!("Section {}", i + 1))
            }),
            content: text_or_placeholder(s, "content"),
        })
        .collect();

    if sections.is_empty() {
        sections = outline
            .sections
            .iter()
            .map(|o| ScriptSection {
                title: o.title.clone(),
                content: if o.key_points.is_empty() {
                    TEXT_PLACEHOLDER.to_string()
                } else {
                    o.key_points.join(" ")
                },
            })
            .collect();
    }

    let bookend_text = |key: &str, fallback: &OutlineBookend| {
        script
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.objective.clone())
    };

    LongFormScriptBody {
        intro: bookend_text("intro", &outline.intro),
        sections,
        outro: bookend_text("outro", &outline.outro),
    }
}

fn mm_ss(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

fn valid_start(start: &str) -> bool {
    let mut parts = start.split(':');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(m), Some(s), None)
            if !m.is_empty()
                && m.chars().all(|c| c.is_ascii_digit())
                && s.len() == 2
                && s.chars().all(|c| c.is_ascii_digit())
    )
}

/// Chapters from the outline: intro at 0, body sections evenly over the
/// middle share, outro at the final outro share.
pub fn derive_chapters(outline: &LongFormOutline, minutes: u32) -> Vec<Chapter> {
    let total = f64::from(minutes * 60);
    let body_start = total * INTRO_SHARE;
    let outro_start = total * (1.0 - OUTRO_SHARE);
    let count = outline.sections.len().max(1) as f64;
    let span = (outro_start - body_start) / count;

    let mut chapters = vec![Chapter {
        start: mm_ss(0),
        title: outline.intro.title.clone(),
    }];
    chapters.extend(outline.sections.iter().enumerate().map(|(i, s)| Chapter {
        start: mm_ss((body_start + span * i as f64).round() as u32),
        title: s.title.clone(),
    }));
    chapters.push(Chapter {
        start: mm_ss(outro_start.round() as u32),
        title: outline.outro.title.clone(),
    });
    chapters
}

fn chapters_from(raw: &Value) -> Vec<Chapter> {
    raw.get("chapters")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|c| {
                    let start = text(c, "start").filter(|s| valid_start(s))?;
                    let title = text(c, "title")?;
                    Some(Chapter { start, title })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Long-form reply to strict shape. Fails only when both outline and script are absent.
pub fn normalize_long_form(
    raw: &Value,
    input: &LongFormInput,
) -> Result<LongFormGenerated, NormalizeError> {
    let outline_raw = raw.get("outline").filter(|v| v.is_object());
    let script_raw = raw.get("script").filter(|v| v.is_object());
    if outline_raw.is_none() && script_raw.is_none() {
        return Err(NormalizeError::MissingStructure);
    }

    let outline = outline_from(outline_raw, script_raw);
    let script = script_from(script_raw, &outline);

    let mut ctas = string_list(raw, "ctas");
    if ctas.is_empty() {
        ctas = default_ctas(input.content_goal);
    }

    let minutes = input.video_length_minutes.minutes();
    let chapters = input.chapter_segmentation.then(|| {
        let provided = chapters_from(raw);
        if provided.is_empty() {
            derive_chapters(&outline, minutes)
        } else {
            provided
        }
    });

    Ok(LongFormGenerated {
        id: uuid::Uuid::new_v4().to_string(),
        outline,
        script,
        ctas,
        chapters,
        total_minutes: minutes,
        created_at: Utc::now(),
        input: input.clone(),
    })
}
