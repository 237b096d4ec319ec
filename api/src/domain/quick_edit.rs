//! Quick edits: typed patches parsed from the model reply and merged onto
//! the original script.

use serde_json::Value;

use crate::domain::normalize::{hashtags_from, positive_u32, string_list, text};
use crate::domain::prompts::hashtag_limit;
use crate::models::{FieldError, GeneratedScript, Tone, Urgency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Shorter,
    Longer,
    RewriteHook,
    ChangeTone(Tone),
}

impl EditAction {
    pub const NAMES: &'static [&'static str] = &["shorter", "longer", "rewrite_hook", "change_tone"];

    pub fn parse(action: &str, tone: Option<&str>) -> Result<Self, Vec<FieldError>> {
        match action.trim() {
            "shorter" => Ok(EditAction::Shorter),
            "longer" => Ok(EditAction::Longer),
            "rewrite_hook" => Ok(EditAction::RewriteHook),
            "change_tone" => {
                let tone = tone.map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
                    vec![FieldError::new("tone", "tone is required for change_tone")]
                })?;
                Tone::parse(tone).map(EditAction::ChangeTone).ok_or_else(|| {
                    let allowed: Vec<&str> = Tone::ALL.iter().map(Tone::as_str).collect();
                    vec![FieldError::new(
                        "tone",
                        format!("tone must be one of: {}", allowed.join(", ")),
                    )]
                })
            }
            _ => Err(vec![FieldError::new(
                "action",
                format!("action must be one of: {}", Self::NAMES.join(", ")),
            )]),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditAction::Shorter => "shorter",
            EditAction::Longer => "longer",
            EditAction::RewriteHook => "rewrite_hook",
            EditAction::ChangeTone(_) => "change_tone",
        }
    }

    pub fn instruction(&self) -> String {
        match self {
            EditAction::Shorter => "Make the script more concise by ~20-30% total duration while preserving meaning and flow.".to_string(),
            EditAction::Longer => "Expand the script by ~20-30% with more detail and examples while keeping it engaging.".to_string(),
            EditAction::RewriteHook => "Rewrite ONLY the hook to be punchier and more scroll-stopping, keep body and CTA consistent.".to_string(),
            EditAction::ChangeTone(tone) => format!(
                "Change the overall tone to \"{tone}\" consistently across hook, body, and CTA without changing core meaning."
            ),
        }
    }

    fn touches_only_hook(&self) -> bool {
        matches!(self, EditAction::RewriteHook)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookPatch {
    pub text: Option<String>,
    pub duration: Option<u32>,
    pub visual_cues: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyPatch {
    pub text: Option<String>,
    pub duration: Option<u32>,
    pub key_points: Option<Vec<String>>,
    pub visual_cues: Option<Vec<String>>,
    pub transitions: Option<Vec<String>>,
}

/// CTA duration is fixed, so there is no duration to patch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CtaPatch {
    pub text: Option<String>,
    pub action: Option<String>,
    pub urgency: Option<Urgency>,
    pub visual_cues: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionPatch {
    Hook(HookPatch),
    Body(BodyPatch),
    Cta(CtaPatch),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptEdit {
    pub patches: Vec<SectionPatch>,
    pub hashtags: Option<Vec<String>>,
}

impl ScriptEdit {
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.hashtags.is_none()
    }
}

fn list(raw: &Value, key: &str) -> Option<Vec<String>> {
    raw.get(key)
        .filter(|v| v.is_array())
        .map(|_| string_list(raw, key))
}

/// Read whichever sections the model sent back; anything unusable is skipped
pub fn edit_from_value(raw: &Value) -> ScriptEdit {
    let mut patches = Vec::new();

    if let Some(hook) = raw.get("hook").filter(|v| v.is_object()) {
        patches.push(SectionPatch::Hook(HookPatch {
            text: text(hook, "text"),
            duration: positive_u32(hook, "duration"),
            visual_cues: list(hook, "visualCues"),
        }));
    }
    if let Some(body) = raw.get("body").filter(|v| v.is_object()) {
        patches.push(SectionPatch::Body(BodyPatch {
            text: text(body, "text"),
            duration: positive_u32(body, "duration"),
            key_points: list(body, "keyPoints"),
            visual_cues: list(body, "visualCues"),
            transitions: list(body, "transitions"),
        }));
    }
    if let Some(cta) = raw.get("cta").filter(|v| v.is_object()) {
        patches.push(SectionPatch::Cta(CtaPatch {
            text: text(cta, "text"),
            action: text(cta, "action"),
            urgency: text(cta, "urgency").and_then(|u| Urgency::parse(&u)),
            visual_cues: list(cta, "visualCues"),
        }));
    }

    let hashtags = raw
        .get("hashtags")
        .filter(|v| v.is_array())
        .map(|_| hashtags_from(raw, u32::MAX));

    ScriptEdit { patches, hashtags }
}

/// Merge an edit onto the original: edited field wins, else the original value.
/// Identity, input and platform always come from the original.
pub fn apply_patches(
    original: &GeneratedScript,
    edit: ScriptEdit,
    action: &EditAction,
) -> GeneratedScript {
    let mut script = original.clone();
    let max_seconds = original.input.script_length.seconds();

    for patch in edit.patches {
        match patch {
            SectionPatch::Hook(p) => {
                if let Some(text) = p.text {
                    script.hook.text = text;
                }
                if let Some(duration) = p.duration {
                    script.hook.duration = duration.min(max_seconds);
                }
                if let Some(cues) = p.visual_cues {
                    script.hook.visual_cues = cues;
                }
            }
            SectionPatch::Body(_) | SectionPatch::Cta(_) if action.touches_only_hook() => {}
            SectionPatch::Body(p) => {
                if let Some(text) = p.text {
                    script.body.text = text;
                }
                if let Some(duration) = p.duration {
                    script.body.duration = duration.min(max_seconds);
                }
                if let Some(points) = p.key_points {
                    script.body.key_points = points;
                }
                if let Some(cues) = p.visual_cues {
                    script.body.visual_cues = cues;
                }
                if let Some(transitions) = p.transitions {
                    script.body.transitions = transitions;
                }
            }
            SectionPatch::Cta(p) => {
                if let Some(text) = p.text {
                    script.cta.text = text;
                }
                if let Some(action) = p.action {
                    script.cta.action = action;
                }
                if let Some(urgency) = p.urgency {
                    script.cta.urgency = urgency;
                }
                if let Some(cues) = p.visual_cues {
                    script.cta.visual_cues = cues;
                }
            }
        }
    }

    if let Some(mut tags) = edit.hashtags.filter(|_| !action.touches_only_hook()) {
        tags.truncate(hashtag_limit(original.platform) as usize);
        script.hashtags = tags;
    }

    script.total_duration = script.computed_duration();
    script
}
