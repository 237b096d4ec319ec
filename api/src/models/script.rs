use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Platform, ScriptInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptHook {
    pub text: String,
    /// Seconds
    pub duration: u32,
    #[serde(default)]
    pub visual_cues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptBody {
    pub text: String,
    pub duration: u32,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub visual_cues: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<String>,
}

/// Call to action. Its duration is fixed at `CTA_SECONDS` and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCta {
    pub text: String,
    pub action: String,
    pub urgency: Urgency,
    #[serde(default)]
    pub visual_cues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFormatting {
    pub platform: Platform,
    pub aspect_ratio: String,
    pub max_duration: u32,
    pub hashtag_limit: u32,
    pub caption_limit: u32,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Model self-assessment, scores 1-10
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPerformance {
    pub hook_strength: u8,
    pub engagement_potential: u8,
    pub viral_potential: u8,
    pub cta_effectiveness: u8,
    pub overall_score: u8,
    #[serde(default)]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedScript {
    pub id: String,
    pub hook: ScriptHook,
    pub body: ScriptBody,
    pub cta: ScriptCta,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub platform: Platform,
    pub platform_formatting: PlatformFormatting,
    pub total_duration: u32,
    pub created_at: DateTime<Utc>,
    pub input: ScriptInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<ScriptPerformance>,
}

impl GeneratedScript {
    /// hook + body + the fixed CTA slot
    pub fn computed_duration(&self) -> u32 {
        self.hook
            .duration
            .saturating_add(self.body.duration)
            .saturating_add(crate::constants::CTA_SECONDS)
    }
}
