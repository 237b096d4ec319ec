//! Export rendering: SRT in-process, a structured document for the converter.

use serde::Serialize;

use crate::constants::CTA_SECONDS;
use crate::models::{ExportFormat, GeneratedScript};

// ============================================================================
// Subtitles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Split after `.`, `!` or `?` when followed by whitespace
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|next| next.is_whitespace());
        if at_boundary {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Cues for one section, timed in proportion to each chunk's length.
/// The last cue always ends exactly at `start_ms + duration_ms`.
fn section_cues(text: &str, start_ms: u64, duration_ms: u64) -> Vec<Cue> {
    let chunks = split_sentences(text);
    let weights: Vec<u64> = chunks
        .iter()
        .map(|c| c.chars().count().max(1) as u64)
        .collect();
    let total_weight: u64 = weights.iter().sum::<u64>().max(1);

    let mut cues = Vec::with_capacity(chunks.len());
    let mut consumed = 0u64;
    let mut cursor = start_ms;
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.into_iter().enumerate() {
        consumed += weights[i];
        let end = if i == last {
            start_ms + duration_ms
        } else {
            start_ms + duration_ms * consumed / total_weight
        };
        cues.push(Cue {
            start_ms: cursor,
            end_ms: end,
            text: chunk,
        });
        cursor = end;
    }
    cues
}

pub fn subtitle_cues(script: &GeneratedScript) -> Vec<Cue> {
    let sections = [
        (script.hook.text.as_str(), u64::from(script.hook.duration)),
        (script.body.text.as_str(), u64::from(script.body.duration)),
        (script.cta.text.as_str(), u64::from(CTA_SECONDS)),
    ];

    let mut cues = Vec::new();
    let mut offset_ms = 0;
    for (text, seconds) in sections {
        let duration_ms = seconds * 1000;
        cues.extend(section_cues(text, offset_ms, duration_ms));
        offset_ms += duration_ms;
    }
    cues
}

/// `HH:MM:SS,mmm`
pub fn srt_timestamp(ms: u64) -> String {
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1000,
        ms % 1000
    )
}

pub fn to_srt(script: &GeneratedScript) -> String {
    subtitle_cues(script)
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                srt_timestamp(cue.start_ms),
                srt_timestamp(cue.end_ms),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Documents
// ============================================================================

/// Layout-neutral document handed to the converter service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<DocumentSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSection {
    pub heading: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
}

fn hashtag_line(script: &GeneratedScript) -> String {
    script
        .hashtags
        .iter()
        .map(|h| format!("#{h}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn build_document(script: &GeneratedScript) -> ExportDocument {
    let mut sections = vec![
        DocumentSection {
            heading: "Hook".into(),
            text: script.hook.text.clone(),
            bullets: Vec::new(),
        },
        DocumentSection {
            heading: "Body".into(),
            text: script.body.text.clone(),
            bullets: script.body.key_points.clone(),
        },
        DocumentSection {
            heading: "CTA".into(),
            text: script.cta.text.clone(),
            bullets: Vec::new(),
        },
    ];
    if !script.hashtags.is_empty() {
        sections.push(DocumentSection {
            heading: "Hashtags".into(),
            text: hashtag_line(script),
            bullets: Vec::new(),
        });
    }

    ExportDocument {
        title: script.input.niche.clone(),
        subtitle: format!(
            "Platform: {} | Tone: {} | {}s",
            script.platform,
            script.input.tone,
            script.input.script_length.seconds()
        ),
        sections,
    }
}

/// Plain-text rendering of the same document
pub fn to_plain_text(script: &GeneratedScript) -> String {
    let doc = build_document(script);
    let mut lines = vec![format!("# {}", doc.title), String::new(), doc.subtitle];
    for section in doc.sections {
        lines.push(String::new());
        lines.push(format!("{}:", section.heading));
        lines.push(section.text);
    }
    lines.join("\n")
}

/// `<niche>_<id>.<ext>` with the niche reduced to `[A-Za-z0-9_]`
pub fn export_filename(script: &GeneratedScript, format: ExportFormat) -> String {
    let mut base = String::new();
    let mut in_gap = false;
    for c in script.input.niche.chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c);
            in_gap = false;
        } else if !in_gap {
            base.push('_');
            in_gap = true;
        }
    }
    let id: String = script
        .id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("{base}_{id}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::normalize;
    use crate::models::{ContentGoal, Platform, ScriptInput, ScriptLength, TargetAudience, Tone};
    use serde_json::json;

    fn script() -> GeneratedScript {
        let input = ScriptInput {
            niche: "budget travel: Europe!".into(),
            target_audience: TargetAudience::GenZ,
            content_goal: ContentGoal::Education,
            tone: Tone::Funny,
            script_length: ScriptLength::Medium,
            platform: Platform::Tiktok,
            additional_context: None,
        };
        let mut script = normalize(
            &json!({
                "hook": {"text": "Flights for $20? Yes really."},
                "body": {"text": "Set fare alerts. Fly midweek! Pack light, skip fees.", "duration": 24},
                "cta": {"text": "Follow for part two"},
                "hashtags": ["travel", "budget"]
            }),
            &input,
        );
        script.id = "abc-123".into();
        script
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        assert_eq!(
            split_sentences("One. Two! Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
        assert_eq!(split_sentences("v1.2 is out."), vec!["v1.2 is out."]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn cues_are_contiguous_and_end_at_total_duration() {
        let script = script();
        let cues = subtitle_cues(&script);
        assert_eq!(cues.len(), 6);
        assert_eq!(cues[0].start_ms, 0);
        for pair in cues.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
            assert!(pair[0].start_ms < pair[0].end_ms);
        }
        assert_eq!(cues[1].end_ms, 3_000);
        assert_eq!(cues[4].end_ms, 27_000);
        assert_eq!(
            cues.last().map(|c| c.end_ms),
            Some(u64::from(script.total_duration) * 1000)
        );
    }

    #[test]
    fn longer_chunks_get_more_time() {
        let cues = section_cues("Hi. This sentence is clearly much longer.", 0, 10_000);
        assert!(cues[1].end_ms - cues[1].start_ms > cues[0].end_ms - cues[0].start_ms);
    }

    #[test]
    fn srt_format() {
        assert_eq!(srt_timestamp(3_723_045), "01:02:03,045");
        let srt = to_srt(&script());
        assert!(srt.starts_with("1\n00:00:00,000 --> "));
        assert!(srt.contains("\n\n2\n"));
        assert!(srt.trim_end().ends_with("Follow for part two"));
    }

    #[test]
    fn filename_and_plain_text() {
        let script = script();
        assert_eq!(
            export_filename(&script, ExportFormat::Pdf),
            "budget_travel_Europe__abc-123.pdf"
        );
        let text = to_plain_text(&script);
        assert!(text.starts_with("# budget travel: Europe!"));
        assert!(text.contains("Hashtags:\n#travel #budget"));
    }
}
