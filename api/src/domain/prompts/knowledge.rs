//! Platform and audience knowledge tables that feed the short-form prompt.

use crate::models::{ContentGoal, Platform, TargetAudience};

pub struct PlatformKnowledge {
    pub platform: Platform,
    pub trends: &'static [&'static str],
    pub viral_formats: &'static [&'static str],
    pub optimizations: &'static [&'static str],
    pub hashtags: HashtagStrategy,
}

pub struct HashtagStrategy {
    pub max_hashtags: u32,
    pub mix: &'static str,
    pub categories: &'static [(&'static str, &'static [&'static str])],
    pub platform_hint: &'static str,
    pub caption_limit: u32,
}

pub struct AudienceLanguage {
    pub audience: TargetAudience,
    pub vocabulary: &'static [&'static str],
    pub phrases: &'static [&'static str],
    pub references: &'static [&'static str],
    pub avoid: &'static [&'static str],
}

static PLATFORMS: &[PlatformKnowledge] = &[
    PlatformKnowledge {
        platform: Platform::Tiktok,
        trends: &[
            "POV: You're the friend who...",
            "Tell me you're [demographic] without telling me",
            "Things that just hit different when...",
            "This is your sign to...",
            "When you realize...",
        ],
        viral_formats: &[
            "Before/After transformation",
            "Day in my life as...",
            "Ranking [things] from worst to best",
            "Plot twist: [unexpected reveal]",
        ],
        optimizations: &[
            "Hook must grab attention in the first 1-2 seconds with movement or surprise",
            "Include text overlay suggestions for key points",
            "Create duet-able or stitch-able moments",
            "Use fast-paced delivery with a visual transition every 3-5 seconds",
            "Make it comment-worthy with a question or a bold take",
            "Create loop potential: the end connects to the beginning",
            "Use vertical 9:16 framing with close-up shots and captions",
        ],
        hashtags: HashtagStrategy {
            max_hashtags: 10,
            mix: "trending + niche + broad",
            categories: &[
                ("trending", &["fyp", "viral", "trending"]),
                ("broad", &["tiktok", "reels", "content"]),
                ("engagement", &["comment", "share", "save"]),
            ],
            platform_hint: "Use #fyp #viral #trending plus niche tags and trending challenges",
            caption_limit: 300,
        },
    },
    PlatformKnowledge {
        platform: Platform::Instagram,
        trends: &[
            "Swipe for the transformation",
            "Save this for later",
            "Share this with someone who needs it",
            "What I wish I knew about [topic]",
            "Behind the scenes of...",
        ],
        viral_formats: &[
            "Before/after reveal",
            "Step-by-step tutorial",
            "Quote with personal story",
            "Day in the life content",
        ],
        optimizations: &[
            "Create save-worthy moments with clear takeaways",
            "Include aesthetic visual cues with a consistent color palette",
            "State the value proposition within the first 3 seconds",
            "Use Instagram-native features such as polls, questions and stickers",
            "Create quotable moments that invite story reshares",
            "Encourage profile visits and follows",
            "Use vertical 9:16 framing with text overlays for key information",
        ],
        hashtags: HashtagStrategy {
            max_hashtags: 30,
            mix: "niche + community + location + broad",
            categories: &[
                ("trending", &["reels", "instagram", "explore"]),
                ("community", &["community", "support", "together"]),
                ("engagement", &["save", "share", "comment"]),
            ],
            platform_hint: "Mix popular and niche tags with location and branded hashtags",
            caption_limit: 2200,
        },
    },
    PlatformKnowledge {
        platform: Platform::Youtube,
        trends: &[
            "I tried [thing] for [timeframe]",
            "The truth about [topic]",
            "Why everyone's wrong about...",
            "This will change how you think about...",
        ],
        viral_formats: &[
            "Educational explainer",
            "Personal story/journey",
            "How-to/tutorial",
            "Myth-busting content",
        ],
        optimizations: &[
            "Create a strong thumbnail moment with a compelling visual",
            "Include searchable keywords naturally in the dialogue",
            "Build to a satisfying payoff that delivers on the hook",
            "Give subscription-worthy value with actionable insights",
            "Use advertiser-safe language",
            "Optimize for retention with a hook that carries through",
            "Use vertical 9:16 framing with clear audio and captions",
        ],
        hashtags: HashtagStrategy {
            max_hashtags: 15,
            mix: "searchable + niche + broad",
            categories: &[
                ("trending", &["shorts", "youtube", "viral"]),
                ("searchable", &["howto", "tutorial", "guide"]),
                ("broad", &["video", "content", "creator"]),
            ],
            platform_hint: "Focus on searchable keywords, trending topics and series tags",
            caption_limit: 5000,
        },
    },
];

static AUDIENCES: &[AudienceLanguage] = &[
    AudienceLanguage {
        audience: TargetAudience::GenZ,
        vocabulary: &["lowkey", "no cap", "hits different", "main character energy", "we love to see it"],
        phrases: &["I'm not gonna lie", "It's giving...", "Tell me why..."],
        references: &["TikTok", "mental health", "sustainability", "authenticity"],
        avoid: &["millennials do this", "back in my day", "kids these days"],
    },
    AudienceLanguage {
        audience: TargetAudience::Millennials,
        vocabulary: &["adulting", "mood", "iconic", "vibe check", "living for this"],
        phrases: &["When you're in your 30s", "Remember when", "Can we talk about"],
        references: &["90s/2000s nostalgia", "work-life balance", "student loans", "career pivots"],
        avoid: &["boomer", "outdated", "old school"],
    },
    AudienceLanguage {
        audience: TargetAudience::BusinessOwners,
        vocabulary: &["ROI", "scale", "optimize", "streamline", "KPIs"],
        phrases: &["In my business", "What I learned", "Bottom line"],
        references: &["productivity", "automation", "cash flow", "competition"],
        avoid: &["waste time", "impossible", "can't afford", "too risky"],
    },
    AudienceLanguage {
        audience: TargetAudience::Parents,
        vocabulary: &["parenting win", "family time", "kid-friendly", "safe", "developmental"],
        phrases: &["As a parent", "Teaching moments", "Real talk"],
        references: &["school", "safety", "family bonding", "work-life balance"],
        avoid: &["dangerous", "inappropriate", "too complicated"],
    },
    AudienceLanguage {
        audience: TargetAudience::FitnessEnthusiasts,
        vocabulary: &["gains", "fitness journey", "grind", "beast mode", "transformation"],
        phrases: &["What works for me", "Fitness tip", "Health hack"],
        references: &["gym", "nutrition", "strength training", "recovery"],
        avoid: &["lazy", "give up", "impossible"],
    },
    AudienceLanguage {
        audience: TargetAudience::TechProfessionals,
        vocabulary: &["optimize", "scalable", "automate", "debug", "cutting-edge"],
        phrases: &["As a developer", "Best practices", "Pro tip"],
        references: &["coding", "tech stack", "APIs", "productivity tools"],
        avoid: &["inefficient", "legacy", "broken"],
    },
    AudienceLanguage {
        audience: TargetAudience::Students,
        vocabulary: &["study tips", "grades", "campus life", "budget-friendly", "productive"],
        phrases: &["As a student", "Study hack", "Student life"],
        references: &["exams", "budget", "time management", "career prep"],
        avoid: &["expensive", "time-consuming", "adult problems"],
    },
    AudienceLanguage {
        audience: TargetAudience::Entrepreneurs,
        vocabulary: &["startup", "hustle", "bootstrap", "pivot", "growth"],
        phrases: &["In my startup journey", "Business insight", "Startup hack"],
        references: &["funding", "product-market fit", "scaling", "networking"],
        avoid: &["safe", "traditional", "risk-averse"],
    },
];

pub fn platform_knowledge(platform: Platform) -> Option<&'static PlatformKnowledge> {
    PLATFORMS.iter().find(|k| k.platform == platform)
}

pub fn audience_language(audience: TargetAudience) -> Option<&'static AudienceLanguage> {
    AUDIENCES.iter().find(|a| a.audience == audience)
}

/// Max hashtags for a platform; 10 when the table has no entry
pub fn hashtag_limit(platform: Platform) -> u32 {
    platform_knowledge(platform)
        .map(|k| k.hashtags.max_hashtags)
        .unwrap_or(10)
}

/// Caption length limit for a platform; 300 when the table has no entry
pub fn caption_limit(platform: Platform) -> u32 {
    platform_knowledge(platform)
        .map(|k| k.hashtags.caption_limit)
        .unwrap_or(300)
}

pub fn goal_strategy(goal: ContentGoal) -> &'static str {
    match goal {
        ContentGoal::Education => {
            "Teach valuable, actionable information that viewers can immediately apply"
        }
        ContentGoal::Entertainment => {
            "Create shareable, engaging content that entertains and delights"
        }
        ContentGoal::ProductPromotion => {
            "Subtly promote while providing genuine value and building trust"
        }
        ContentGoal::BrandAwareness => {
            "Build brand recognition and emotional connection with the audience"
        }
    }
}

fn goal_hashtags(goal: ContentGoal) -> [&'static str; 5] {
    match goal {
        ContentGoal::Education => ["learn", "education", "tips", "howto", "tutorial"],
        ContentGoal::Entertainment => ["funny", "entertainment", "viral", "comedy", "relatable"],
        ContentGoal::ProductPromotion => ["review", "recommendation", "musthave", "product", "shopping"],
        ContentGoal::BrandAwareness => ["brand", "story", "mission", "values", "community"],
    }
}

/// Up to eight hashtag suggestions derived from the niche words and the goal
pub fn niche_hashtags(niche: &str, goal: ContentGoal) -> Vec<String> {
    let lower = niche.to_lowercase();
    let joined: String = lower
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();

    let mut tags = Vec::new();
    if !joined.is_empty() {
        tags.push(joined);
    }
    for word in lower.split_whitespace() {
        let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
        if word.chars().count() > 3 {
            tags.push(format!("{word}tips"));
            tags.push(format!("{word}hacks"));
            tags.push(word);
        }
    }
    tags.extend(goal_hashtags(goal).iter().map(|t| t.to_string()));
    tags.dedup();
    tags.truncate(8);
    tags
}
