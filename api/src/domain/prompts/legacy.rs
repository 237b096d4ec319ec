//! Goal-specific templates used when the knowledge tables cannot serve a request.

use crate::models::{ContentGoal, Platform, ScriptInput, TargetAudience};

struct GoalTemplate {
    label: &'static str,
    requirements_title: &'static str,
    requirements: &'static [&'static str],
    strategies_title: &'static str,
    strategies: &'static [&'static str],
    hook_styles: &'static str,
    tone_suffix: &'static str,
}

fn template(goal: ContentGoal) -> GoalTemplate {
    match goal {
        ContentGoal::Education => GoalTemplate {
            label: "educational",
            requirements_title: "EDUCATIONAL CONTENT REQUIREMENTS",
            requirements: &[
                "Start with a compelling hook that promises valuable learning",
                "Break down complex concepts into digestible steps",
                "Use the Problem -> Solution -> Proof -> Action structure",
                "Include specific, actionable takeaways",
            ],
            strategies_title: "ENGAGEMENT STRATEGIES",
            strategies: &[
                "Use pattern interrupts every 5-7 seconds",
                "Reference common misconceptions to correct",
                "Use analogies and metaphors for clarity",
            ],
            hook_styles: "Curiosity Question, Problem Identification, or Transformation Promise",
            tone_suffix: "but always educational and authoritative",
        },
        ContentGoal::Entertainment => GoalTemplate {
            label: "viral entertainment",
            requirements_title: "VIRAL ENTERTAINMENT REQUIREMENTS",
            requirements: &[
                "Hook must be instantly engaging and shareable",
                "Use humor, surprise, or emotional triggers",
                "Include relatable situations or characters",
                "Build to a satisfying payoff or punchline",
            ],
            strategies_title: "ENTERTAINMENT STRUCTURES",
            strategies: &[
                "Setup -> Escalation -> Punchline",
                "Relatable Problem -> Funny Solution -> Twist",
                "Before/After -> Dramatic Reveal -> Reaction",
            ],
            hook_styles: "Contrarian, Curiosity Question, or Transformation",
            tone_suffix: "with high entertainment value and shareability",
        },
        ContentGoal::ProductPromotion => GoalTemplate {
            label: "subtle product promotion",
            requirements_title: "SUBTLE SELLING REQUIREMENTS",
            requirements: &[
                "Lead with value, not product features",
                "Address pain points before introducing solutions",
                "Use social proof naturally",
                "Avoid pushy or salesy language",
            ],
            strategies_title: "SUBTLE SELLING STRUCTURE",
            strategies: &[
                "Relatable Problem -> Personal Story -> Solution Reveal -> Soft CTA",
                "Common Mistake -> Better Way -> Tool/Method -> Results",
            ],
            hook_styles: "Problem Identification, Transformation, or Curiosity Question",
            tone_suffix: "but authentic and helpful, not pushy",
        },
        ContentGoal::BrandAwareness => GoalTemplate {
            label: "brand awareness",
            requirements_title: "BRAND AWARENESS REQUIREMENTS",
            requirements: &[
                "Establish brand personality and values",
                "Create emotional connection with the audience",
                "Share the brand story or mission",
                "Build trust and credibility",
            ],
            strategies_title: "BRAND AWARENESS STRUCTURE",
            strategies: &[
                "Brand Origin Story -> Values -> Mission -> Community",
                "Problem We Solve -> Our Approach -> Our Impact -> Join Us",
            ],
            hook_styles: "Brand Story, Values Statement, or Behind-the-Scenes",
            tone_suffix: "but authentic and brand-aligned",
        },
    }
}

fn platform_specs(platform: Platform) -> &'static str {
    match platform {
        Platform::Tiktok => {
            "TIKTOK SPECIFICATIONS:\n- Vertical 9:16 format\n- Fast-paced editing with quick cuts\n- Text overlays for key points\n- Hook within the first 1-3 seconds\n- Keep captions under 300 characters"
        }
        Platform::Instagram => {
            "INSTAGRAM REELS SPECIFICATIONS:\n- Vertical 9:16 format\n- Polished, aesthetic visual style\n- Include save-worthy moments\n- Relevant hashtags (up to 30)"
        }
        Platform::Youtube => {
            "YOUTUBE SHORTS SPECIFICATIONS:\n- Vertical 9:16 format\n- Clear, concise messaging\n- Strong thumbnail moments\n- Optimize for search discovery"
        }
    }
}

fn audience_specs(audience: TargetAudience) -> &'static str {
    match audience {
        TargetAudience::GenZ => {
            "GEN Z AUDIENCE (18-26):\n- Current slang and internet culture\n- Quick, snappy communication style\n- Humor and self-deprecation"
        }
        TargetAudience::Millennials => {
            "MILLENNIAL AUDIENCE (27-42):\n- 90s/2000s nostalgia\n- Work-life balance and career growth\n- Humor about adulting struggles"
        }
        TargetAudience::BusinessOwners => {
            "BUSINESS OWNER AUDIENCE:\n- ROI, efficiency and growth\n- Actionable business strategies\n- Professional but approachable tone"
        }
        TargetAudience::Parents => {
            "PARENT AUDIENCE:\n- Parenting challenges and solutions\n- Family-friendly language\n- Time-saving tips"
        }
        _ => "GENERAL AUDIENCE:\n- Clear language\n- Relatable examples",
    }
}

fn bullets(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Goal-driven template with platform and audience notes
pub fn build_legacy_prompt(input: &ScriptInput) -> String {
    let t = template(input.content_goal);
    let seconds = input.script_length.seconds();

    format!(
        "Create a {seconds}-second {label} {platform} script about \"{niche}\" for {audience}.\n\n\
         {req_title}:\n{requirements}\n\n\
         {strat_title}:\n{strategies}\n\n\
         HOOK FORMULA (first 3 seconds):\nChoose from: {hooks}\n\n\
         {platform_specs}\n\n{audience_specs}\n\n\
         TONE: {tone} {tone_suffix}\n\
         ADDITIONAL CONTEXT: {context}\n\n\
         Format as JSON with hook, body, cta, hashtags, platformFormatting, and performance fields. \
         The body duration is {body} seconds. JSON only, no markdown fences.",
        label = t.label,
        platform = input.platform,
        niche = input.niche,
        audience = input.target_audience.readable(),
        req_title = t.requirements_title,
        requirements = bullets(t.requirements),
        strat_title = t.strategies_title,
        strategies = bullets(t.strategies),
        hooks = t.hook_styles,
        platform_specs = platform_specs(input.platform),
        audience_specs = audience_specs(input.target_audience),
        tone = input.tone,
        tone_suffix = t.tone_suffix,
        context = input.additional_context.as_deref().unwrap_or("None"),
        body = seconds.saturating_sub(6),
    )
}
