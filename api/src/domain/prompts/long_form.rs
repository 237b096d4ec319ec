use crate::constants::{INTRO_SHARE, OUTRO_SHARE, WORDS_PER_MINUTE};
use crate::models::{ContentGoal, LongFormAudience, LongFormInput, LongFormTone};

pub const LONG_FORM_SYSTEM_PROMPT: &str =
    "You are an expert long-form video scriptwriter. Respond with valid JSON ONLY.";

/// Body section count range for a video length in minutes
pub fn section_range(minutes: u32) -> (u32, u32) {
    match minutes {
        3 => (3, 4),
        5 => (4, 6),
        10 => (6, 9),
        15 => (8, 12),
        20 => (10, 14),
        _ => (6, 10),
    }
}

fn audience_label(audience: LongFormAudience) -> &'static str {
    match audience {
        LongFormAudience::GenZ => "Gen Z",
        LongFormAudience::Millennials => "Millennials",
        LongFormAudience::Professionals => "Professionals",
        LongFormAudience::GeneralAudience => "a General Audience",
    }
}

fn tone_description(tone: LongFormTone) -> &'static str {
    match tone {
        LongFormTone::Funny => "Funny, light, with tasteful humor",
        LongFormTone::Professional => "Professional, credible, structured",
        LongFormTone::Storytelling => "Storytelling, narrative-driven",
        LongFormTone::Motivational => "Motivational, inspirational, energetic",
        LongFormTone::Casual => "Casual, conversational, friendly",
    }
}

pub(crate) fn goal_cta_hint(goal: ContentGoal) -> &'static str {
    match goal {
        ContentGoal::Education => "subscribe to learn more",
        ContentGoal::Entertainment => "like and share for part 2",
        ContentGoal::ProductPromotion => "visit the link to buy or learn more",
        ContentGoal::BrandAwareness => "follow and engage with the brand",
    }
}

pub fn build_long_form_prompt(input: &LongFormInput) -> String {
    let minutes = input.video_length_minutes.minutes();
    let length = if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{minutes} minutes")
    };

    let target_words = minutes * WORDS_PER_MINUTE;
    let min_words = (f64::from(target_words) * 0.9).round() as u32;
    let max_words = (f64::from(target_words) * 1.15).round() as u32;
    let (min_sections, max_sections) = section_range(minutes);

    let body_share = 1.0 - INTRO_SHARE - OUTRO_SHARE;
    let avg_sections = f64::from(min_sections + max_sections) / 2.0;
    let avg_section_minutes = (f64::from(minutes) * body_share / avg_sections).max(0.4);
    let avg_section_words = (avg_section_minutes * f64::from(WORDS_PER_MINUTE)).round() as u32;

    let chapters_schema = if input.chapter_segmentation {
        r#"[ { "start": string("MM:SS"), "title": string } ]"#
    } else {
        "[]"
    };

    let intro_pct = (INTRO_SHARE * 100.0).round() as u32;
    let outro_pct = (OUTRO_SHARE * 100.0).round() as u32;
    let intro_minutes = (INTRO_SHARE * f64::from(minutes)).round() as u32;
    let outro_minutes = (OUTRO_SHARE * f64::from(minutes)).round() as u32;

    format!(
        "You are an expert YouTube scriptwriter.\n\
         Create a long-form video script about \"{niche}\" for {audience}.\n\
         Tone & style: {tone}.\n\
         Total length target: {length}.\n\
         Target total words: between {min_words} and {max_words} (ideal ~{target_words}).\n\
         Sections: {min_sections}-{max_sections} body sections (not counting intro/outro).\n\
         Average body section length: ~{avg_section_words} words.\n\
         Additional context: {context}\n\n\
         STRICT OUTPUT: Return JSON ONLY with this schema:\n\
         {{\n  \
         \"outline\": {{\n    \
         \"intro\": {{ \"title\": string, \"objective\": string }},\n    \
         \"sections\": [ {{ \"title\": string, \"keyPoints\": string[] }} ],\n    \
         \"outro\": {{ \"title\": string, \"objective\": string }}\n  \
         }},\n  \
         \"script\": {{\n    \
         \"intro\": string,\n    \
         \"sections\": [ {{ \"title\": string, \"content\": string }} ],\n    \
         \"outro\": string\n  \
         }},\n  \
         \"ctas\": string[],\n  \
         \"chapters\": {chapters_schema}\n\
         }}\n\n\
         Rules:\n\
         - The outline must have {min_sections}-{max_sections} sections.\n\
         - Each section must add new substance; no repetition or filler.\n\
         - Include clear transitions and engagement prompts.\n\
         - CTAs must reflect the goal: {goal} ({cta_hint}).\n\
         - If chapters are requested, distribute starts to reflect pacing (intro ~{intro_pct}%, outro ~{outro_pct}%).\n\
         - Keep the intro concise and hook-driven (~{intro_minutes} min) and the outro concise with a CTA (~{outro_minutes} min).\n\
         - Do not compress a {minutes} minute script into fewer words.\n\
         - Do not include backticks or extra prose; JSON only.",
        niche = input.niche,
        audience = audience_label(input.target_audience),
        tone = tone_description(input.tone),
        context = input.additional_context.as_deref().unwrap_or("None"),
        goal = input.content_goal,
        cta_hint = goal_cta_hint(input.content_goal),
    )
}
