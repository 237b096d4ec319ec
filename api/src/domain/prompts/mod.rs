//! Prompt construction for every generation surface.
//!
//! All builders are pure functions of their input so a given form always
//! produces the same prompt text.

mod edit;
mod knowledge;
mod legacy;
mod long_form;

pub use edit::{EDIT_SYSTEM_PROMPT, build_edit_prompt};
pub use knowledge::{caption_limit, hashtag_limit};
pub use legacy::build_legacy_prompt;
pub use long_form::{LONG_FORM_SYSTEM_PROMPT, build_long_form_prompt, section_range};

use crate::constants::{CTA_SECONDS, HOOK_SECONDS};
use crate::models::ScriptInput;
use knowledge::{AudienceLanguage, PlatformKnowledge};

pub const SHORT_FORM_SYSTEM_PROMPT: &str = "You are an expert viral content creator and script writer. \
Respond with valid JSON ONLY, no prose, no backticks.";

/// Extra block appended on the single content-quality retry
pub fn stricter_constraints() -> &'static str {
    "ADDITIONAL CONSTRAINTS:\n\
     Do NOT leave hook.text, body.text, or cta.text empty. Provide full sentences for each.\n\
     Return every object in the schema, even when a list inside it is empty."
}

/// Short-form prompt. Falls back to the goal template when a knowledge
/// table has nothing for the requested platform or audience.
pub fn build_prompt(input: &ScriptInput) -> String {
    select_prompt(
        input,
        knowledge::platform_knowledge(input.platform),
        knowledge::audience_language(input.target_audience),
    )
}

/// The knowledge tables are keyed apart from the enums, so a newly added
/// platform or audience has no entry until its table row is written.
fn select_prompt(
    input: &ScriptInput,
    platform: Option<&PlatformKnowledge>,
    audience: Option<&AudienceLanguage>,
) -> String {
    match (platform, audience) {
        (Some(platform), Some(audience)) => build_knowledge_prompt(input, platform, audience),
        _ => {
            tracing::warn!(
                platform = %input.platform,
                audience = %input.target_audience,
                "no knowledge entry, using goal template"
            );
            build_legacy_prompt(input)
        }
    }
}

fn bullets(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quoted(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- \"{item}\""))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tone_requirements(input: &ScriptInput) -> &'static str {
    use crate::models::Tone;
    match input.tone {
        Tone::Funny => "Use humor, wit, and comedic timing. Include unexpected twists or punchlines.",
        Tone::Professional => {
            "Maintain authority and credibility while being accessible and trustworthy."
        }
        Tone::Storytelling => "Create a narrative arc with emotional hooks and memorable moments.",
        Tone::Educational => {
            "Be clear, informative, and easy to understand with actionable insights."
        }
        Tone::Promotional => "Be persuasive but authentic, focusing on benefits and value.",
    }
}

fn build_knowledge_prompt(
    input: &ScriptInput,
    platform: &PlatformKnowledge,
    audience: &AudienceLanguage,
) -> String {
    let seconds = input.script_length.seconds();
    let body = seconds.saturating_sub(HOOK_SECONDS + CTA_SECONDS);
    let strategy = &platform.hashtags;
    let categories = strategy
        .categories
        .iter()
        .map(|(name, tags)| format!("{}: {}", name.to_uppercase(), tags.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    let niche_tags = knowledge::niche_hashtags(&input.niche, input.content_goal).join(", ");

    let mut sections = Vec::new();

    sections.push(format!(
        "Create a {seconds}-second {platform} script about \"{niche}\" for {audience} \
         with {tone} tone for {goal}.\n\n\
         CONTENT GOAL: {goal_strategy}\n\
         TONE REQUIREMENTS: {tone_req}\n\
         ADDITIONAL CONTEXT: {context}",
        platform = input.platform,
        niche = input.niche,
        audience = input.target_audience.readable(),
        tone = input.tone,
        goal = input.content_goal.readable(),
        goal_strategy = knowledge::goal_strategy(input.content_goal),
        tone_req = tone_requirements(input),
        context = input.additional_context.as_deref().unwrap_or("None provided"),
    ));

    sections.push(format!(
        "VIRAL TRENDS TO INCORPORATE:\nCurrent trending patterns:\n{}\n\n\
         Viral formats to consider:\n{}\n\n\
         Weave these patterns in naturally; use them as inspiration for the hook and structure.",
        bullets(&platform.trends[..platform.trends.len().min(3)]),
        bullets(&platform.viral_formats[..platform.viral_formats.len().min(2)]),
    ));

    sections.push(format!(
        "AUDIENCE LANGUAGE for {}:\n\nVocabulary to include:\n{}\n\nNatural phrases:\n{}\n\n\
         Relevant references:\n{}\n\nWords to AVOID:\n{}\n\n\
         Use this vocabulary naturally. The script should sound like it comes from someone \
         who understands this audience.",
        input.target_audience.readable().to_uppercase(),
        quoted(audience.vocabulary),
        quoted(audience.phrases),
        bullets(audience.references),
        quoted(audience.avoid),
    ));

    sections.push(format!(
        "{} OPTIMIZATION REQUIREMENTS:\n{}",
        input.platform.as_str().to_uppercase(),
        bullets(platform.optimizations),
    ));

    sections.push(format!(
        "PRECISE TIMING REQUIREMENTS:\n\
         - HOOK: exactly {HOOK_SECONDS} seconds (approximately 8-10 words)\n\
         - BODY: exactly {body} seconds (approximately {low}-{high} words)\n\
         - CTA: exactly {CTA_SECONDS} seconds (approximately 8-10 words)\n\
         - TOTAL: must equal exactly {seconds} seconds\n\n\
         PACING GUIDE:\n\
         - Average speaking pace: 2.5-3 words per second\n\
         - Include natural pauses and emphasis\n\
         - Ensure comfortable, not rushed delivery",
        low = body * 5 / 2,
        high = body * 3,
    ));

    sections.push(format!(
        "HASHTAG STRATEGY ({mix}):\nMax hashtags: {max}\n\nRequired categories:\n{categories}\n\n\
         Niche-specific hashtags for \"{niche}\":\n{niche_tags}\n\n\
         Platform hint: {hint}\n\
         Mix trending (30%), niche (40%), and broad (30%) hashtags. Avoid banned or shadowbanned tags.",
        mix = strategy.mix,
        max = strategy.max_hashtags,
        niche = input.niche,
        hint = strategy.platform_hint,
    ));

    sections.push(format!(
        "CRITICAL REQUIREMENTS:\n\
         1. Use the audience language patterns provided\n\
         2. Incorporate at least 2 trending formats from the viral patterns\n\
         3. Ensure script timing matches {seconds} seconds precisely\n\
         4. Create a hook that works within the first {HOOK_SECONDS} seconds\n\
         5. Make the content shareable and engagement-worthy"
    ));

    sections.push(format!(
        "STRICT OUTPUT FORMAT (JSON ONLY):\n\
         Return a single JSON object matching this schema with NON-EMPTY strings:\n\
         {{\n  \
         \"hook\": {{ \"text\": string(min 8 chars), \"duration\": number(={HOOK_SECONDS}), \"visualCues\": string[] }},\n  \
         \"body\": {{ \"text\": string(min 20 chars), \"duration\": number(={body}), \"keyPoints\": string[], \"visualCues\": string[], \"transitions\": string[] }},\n  \
         \"cta\": {{ \"text\": string(min 8 chars), \"action\": string, \"urgency\": \"low\"|\"medium\"|\"high\", \"visualCues\": string[] }},\n  \
         \"hashtags\": string[],\n  \
         \"platformFormatting\": {{ \"platform\": \"{platform}\", \"aspectRatio\": \"9:16\", \"maxDuration\": {seconds}, \"hashtagLimit\": {max}, \"captionLimit\": {caption}, \"features\": string[] }},\n  \
         \"performance\": {{ \"hookStrength\": number(1-10), \"engagementPotential\": number(1-10), \"viralPotential\": number(1-10), \"ctaEffectiveness\": number(1-10), \"overallScore\": number(1-10), \"improvements\": string[] }}\n\
         }}\n\n\
         Rules:\n\
         - Do not leave any text field empty.\n\
         - Do not include markdown fences or extra prose. JSON only.",
        platform = input.platform,
        max = strategy.max_hashtags,
        caption = strategy.caption_limit,
    ));

    sections.join("\n\n")
}
