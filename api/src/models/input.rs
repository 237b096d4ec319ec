use serde::{Deserialize, Serialize};

closed_enum! {
    /// Short-form distribution platform
    pub enum Platform {
        Tiktok => "tiktok",
        Instagram => "instagram",
        Youtube => "youtube",
    }
}

closed_enum! {
    pub enum Tone {
        Funny => "funny",
        Professional => "professional",
        Storytelling => "storytelling",
        Educational => "educational",
        Promotional => "promotional",
    }
}

closed_enum! {
    pub enum ContentGoal {
        Education => "education",
        Entertainment => "entertainment",
        ProductPromotion => "product-promotion",
        BrandAwareness => "brand-awareness",
    }
}

closed_enum! {
    pub enum TargetAudience {
        GenZ => "gen-z",
        Millennials => "millennials",
        BusinessOwners => "business-owners",
        Parents => "parents",
        FitnessEnthusiasts => "fitness-enthusiasts",
        TechProfessionals => "tech-professionals",
        Students => "students",
        Entrepreneurs => "entrepreneurs",
    }
}

closed_enum! {
    /// Long-form keeps its own audience set, independent of short-form
    pub enum LongFormAudience {
        GenZ => "gen-z",
        Millennials => "millennials",
        Professionals => "professionals",
        GeneralAudience => "general-audience",
    }
}

closed_enum! {
    pub enum LongFormTone {
        Funny => "funny",
        Professional => "professional",
        Motivational => "motivational",
        Storytelling => "storytelling",
        Casual => "casual",
    }
}

/// Short-form length in seconds; serialized as the bare number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ScriptLength {
    Short,
    Medium,
    Long,
}

impl ScriptLength {
    pub const ALL: &'static [ScriptLength] =
        &[ScriptLength::Short, ScriptLength::Medium, ScriptLength::Long];

    pub fn seconds(&self) -> u32 {
        match self {
            ScriptLength::Short => 15,
            ScriptLength::Medium => 30,
            ScriptLength::Long => 60,
        }
    }
}

impl TryFrom<u32> for ScriptLength {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ScriptLength::ALL
            .iter()
            .copied()
            .find(|l| l.seconds() == value)
            .ok_or_else(|| format!("script length must be 15, 30, or 60 seconds, got {value}"))
    }
}

impl From<ScriptLength> for u32 {
    fn from(value: ScriptLength) -> Self {
        value.seconds()
    }
}

/// Long-form length in minutes; serialized as the bare number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LongFormLength {
    M3,
    M5,
    M10,
    M15,
    M20,
}

impl LongFormLength {
    pub const ALL: &'static [LongFormLength] = &[
        LongFormLength::M3,
        LongFormLength::M5,
        LongFormLength::M10,
        LongFormLength::M15,
        LongFormLength::M20,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            LongFormLength::M3 => 3,
            LongFormLength::M5 => 5,
            LongFormLength::M10 => 10,
            LongFormLength::M15 => 15,
            LongFormLength::M20 => 20,
        }
    }
}

impl TryFrom<u32> for LongFormLength {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        LongFormLength::ALL
            .iter()
            .copied()
            .find(|l| l.minutes() == value)
            .ok_or_else(|| format!("video length must be 3, 5, 10, 15, or 20 minutes, got {value}"))
    }
}

impl From<LongFormLength> for u32 {
    fn from(value: LongFormLength) -> Self {
        value.minutes()
    }
}

/// Validated short-form request. Only built by `domain::validation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInput {
    pub niche: String,
    pub target_audience: TargetAudience,
    pub content_goal: ContentGoal,
    pub tone: Tone,
    pub script_length: ScriptLength,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Validated long-form request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongFormInput {
    pub niche: String,
    pub target_audience: LongFormAudience,
    pub content_goal: ContentGoal,
    pub tone: LongFormTone,
    pub video_length_minutes: LongFormLength,
    #[serde(default)]
    pub chapter_segmentation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Raw short-form form submission, before validation.
///
/// Everything is optional and loosely typed so that validation can report
/// every problem at once instead of failing on the first bad field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInputForm {
    pub niche: Option<String>,
    pub target_audience: Option<String>,
    pub content_goal: Option<String>,
    pub tone: Option<String>,
    pub script_length: Option<serde_json::Value>,
    pub platform: Option<String>,
    pub additional_context: Option<String>,
}

/// Raw long-form form submission, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongFormInputForm {
    pub niche: Option<String>,
    pub target_audience: Option<String>,
    pub content_goal: Option<String>,
    pub tone: Option<String>,
    pub video_length_minutes: Option<serde_json::Value>,
    pub chapter_segmentation: Option<bool>,
    pub additional_context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub input: ScriptInputForm,
}

#[derive(Debug, Deserialize)]
pub struct GenerateLongRequest {
    pub input: LongFormInputForm,
}
