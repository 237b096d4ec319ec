use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LongFormInput;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineBookend {
    pub title: String,
    pub objective: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSection {
    pub title: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormOutline {
    pub intro: OutlineBookend,
    pub sections: Vec<OutlineSection>,
    pub outro: OutlineBookend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSection {
    pub title: String,
    /// Narration / dialogue text
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormScriptBody {
    pub intro: String,
    pub sections: Vec<ScriptSection>,
    pub outro: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// `MM:SS`
    pub start: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongFormGenerated {
    pub id: String,
    pub outline: LongFormOutline,
    pub script: LongFormScriptBody,
    pub ctas: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
    pub total_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub input: LongFormInput,
}
