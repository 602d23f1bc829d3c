use tracing::{info, instrument};

use crate::claude::{GenerationRequest, LanguageModel};
use crate::error::{BriefError, Result};
use crate::models::{Brief, NarrationSection, RunDate};
use crate::response::parse_json_reply;

const NARRATION_MAX_TOKENS: u32 = 6000;

/// Spoken segments, in the order they are read. Deep dive is never narrated.
pub const NARRATION_LABELS: [&str; 6] = [
    "Introduction",
    "World & Politics",
    "Tech & AI",
    "Business & Finance",
    "Science & Health",
    "Explore & Sign-off",
];

pub fn opening_line(date: &RunDate) -> String {
    format!(
        "The Daily Brief. {}, {}. Good morning.",
        date.day_name(),
        date.date_str()
    )
}

pub fn closing_line(date: &RunDate) -> String {
    format!(
        "That is your Daily Brief for {}. Have a great day.",
        date.day_name()
    )
}

pub fn narration_prompt(brief: &Brief, date: &RunDate) -> Result<String> {
    let brief_json =
        serde_json::to_string_pretty(brief).map_err(BriefError::serialize("brief"))?;

    let layout = NARRATION_LABELS
        .iter()
        .map(|label| format!("  {{\"label\": \"{label}\", \"text\": \"...\"}}"))
        .collect::<Vec<_>>()
        .join(",\n");

    Ok(format!(
        r#"Convert this daily brief into a spoken narration script for a British English newsreader.

Brief data:
{brief_json}

Rules:
- Write numbers as words ("sixty-eight billion" not "68B")
- No abbreviations ("United States" not "US", except well-known ones like "AI")
- No contractions ("do not" not "don't", "here is" not "here's")
- Natural speech phrasing with good rhythm
- Include brief transitions between sections
- Open with "{opening}"
- Close with "{closing}"
- Do NOT narrate the Deep Dive section — just the 4 news categories and Explore

Return a JSON array with exactly {count} objects:
[
{layout}
]

Return ONLY the JSON array."#,
        opening = opening_line(date),
        closing = closing_line(date),
        count = NARRATION_LABELS.len(),
    ))
}

/// Decode a narration reply and insist on the fixed six labels, in order.
pub fn parse_narration(text: &str) -> Result<Vec<NarrationSection>> {
    let sections: Vec<NarrationSection> = parse_json_reply("narration response", text)?;

    if sections.len() != NARRATION_LABELS.len() {
        return Err(BriefError::NarrationMismatch {
            expected: NARRATION_LABELS.len(),
            detail: format!("got {} sections", sections.len()),
        });
    }

    for (section, expected) in sections.iter().zip(NARRATION_LABELS) {
        if section.label != expected {
            return Err(BriefError::NarrationMismatch {
                expected: NARRATION_LABELS.len(),
                detail: format!("found {:?} where {:?} belongs", section.label, expected),
            });
        }
    }

    Ok(sections)
}

pub struct NarrationGenerator<'a, M> {
    model: &'a M,
}

impl<'a, M: LanguageModel> NarrationGenerator<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    #[instrument(level = "info", skip_all, fields(date = %date.date_file()))]
    pub async fn generate(&self, brief: &Brief, date: &RunDate) -> Result<Vec<NarrationSection>> {
        let prompt = narration_prompt(brief, date)?;
        let reply = self
            .model
            .generate(GenerationRequest::new(prompt, NARRATION_MAX_TOKENS))
            .await?;

        let sections = parse_narration(&reply)?;
        info!(
            sections = sections.len(),
            chars = sections.iter().map(|s| s.text.len()).sum::<usize>(),
            "narration generated"
        );
        Ok(sections)
    }
}

#[cfg(test)]
pub(crate) fn sample_narration() -> Vec<NarrationSection> {
    NARRATION_LABELS
        .iter()
        .map(|label| NarrationSection::new(*label, format!("Text for {label}.")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::test_support::ScriptedModel;
    use chrono::NaiveDate;

    fn date() -> RunDate {
        RunDate::new(NaiveDate::from_ymd_opt(2026, 2, 27).unwrap())
    }

    #[test]
    fn test_prompt_has_fixed_lines_and_brief() {
        let prompt = narration_prompt(&fixtures::brief(), &date()).unwrap();

        assert!(prompt.contains("Open with \"The Daily Brief. Friday, February 27, 2026. Good morning.\""));
        assert!(prompt.contains("Close with \"That is your Daily Brief for Friday. Have a great day.\""));
        assert!(prompt.contains("\"headline\": \"World & Politics headline\""));
        assert!(prompt.contains("{\"label\": \"Explore & Sign-off\", \"text\": \"...\"}"));
        assert!(prompt.contains("exactly 6 objects"));
    }

    #[test]
    fn test_parse_narration_in_order() {
        let reply = format!(
            "```json\n{}\n```",
            serde_json::to_string(&sample_narration()).unwrap()
        );
        let sections = parse_narration(&reply).unwrap();
        let labels: Vec<_> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, NARRATION_LABELS);
    }

    #[test]
    fn test_parse_narration_wrong_count() {
        let mut sections = sample_narration();
        sections.pop();
        let err = parse_narration(&serde_json::to_string(&sections).unwrap()).unwrap_err();
        match err {
            BriefError::NarrationMismatch { expected, detail } => {
                assert_eq!(expected, 6);
                assert_eq!(detail, "got 5 sections");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_narration_too_many() {
        let mut sections = sample_narration();
        sections.push(NarrationSection::new("Deep Dive", "Extra."));
        let err = parse_narration(&serde_json::to_string(&sections).unwrap()).unwrap_err();
        assert!(matches!(err, BriefError::NarrationMismatch { .. }));
    }

    #[test]
    fn test_parse_narration_wrong_order() {
        let mut sections = sample_narration();
        sections.swap(1, 2);
        let err = parse_narration(&serde_json::to_string(&sections).unwrap()).unwrap_err();
        assert!(err.to_string().contains("\"Tech & AI\" where \"World & Politics\" belongs"));
    }

    #[test]
    fn test_parse_narration_not_an_array() {
        let err = parse_narration("{\"label\": \"Introduction\"}").unwrap_err();
        assert!(matches!(err, BriefError::SchemaMismatch { .. }));
    }

    #[tokio::test]
    async fn test_generate_uses_narration_budget() {
        let model = ScriptedModel::new([serde_json::to_string(&sample_narration()).unwrap()]);
        let sections = NarrationGenerator::new(&model)
            .generate(&fixtures::brief(), &date())
            .await
            .unwrap();

        assert_eq!(sections.len(), 6);
        assert_eq!(model.requests()[0].max_tokens, 6000);
    }
}
