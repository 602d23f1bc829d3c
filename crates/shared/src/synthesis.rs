use tracing::{info, instrument, warn};

use crate::claude::{GenerationRequest, LanguageModel};
use crate::error::{BriefError, Result};
use crate::models::{Brief, RawSearchResults, RunDate};
use crate::response::parse_json_reply;
use crate::sources::{SearchCategory, SourcePreferences};

const SYNTHESIS_MAX_TOKENS: u32 = 8000;
const STAGE: &str = "brief response";

const BRIEF_SCHEMA: &str = r#"{
  "summary": "One-sentence overview of the day's top 3 stories",
  "sections": [
    {
      "id": "world",
      "name": "World & Politics",
      "badge_class": "world",
      "number": "01",
      "stories": [
        {
          "headline": "...",
          "sources": [
            {"name": "BBC", "url": "https://...", "subscriber": false},
            {"name": "The Economist", "url": "https://...", "subscriber": true}
          ],
          "summary": "2-3 sentences of real substance",
          "why_it_matters": "1 sentence or null"
        }
      ]
    },
    {
      "id": "tech",
      "name": "Tech & AI",
      "badge_class": "tech",
      "number": "02",
      "stories": [...]
    },
    {
      "id": "business",
      "name": "Business & Finance",
      "badge_class": "business",
      "number": "03",
      "stories": [...]
    },
    {
      "id": "science",
      "name": "Science & Health",
      "badge_class": "science",
      "number": "04",
      "stories": [...]
    }
  ],
  "explore": {
    "source_name": "WIRED or MIT Technology Review etc.",
    "source_description": "One sentence about this source",
    "stories": [
      {
        "headline": "...",
        "source_name": "...",
        "source_url": "...",
        "summary": "..."
      }
    ]
  },
  "deep_dive": [
    {
      "type": "podcast|audiobook|longread",
      "icon": "🎙️ or 📖 or 📰",
      "title": "...",
      "url": "...",
      "meta": "62 min · Released Feb 27",
      "description": "...",
      "subscriber": false,
      "tag_label": "New Episode"
    }
  ]
}"#;

pub fn synthesis_prompt(
    raw: &RawSearchResults,
    prefs: &SourcePreferences,
    date: &RunDate,
) -> String {
    let mut prompt = format!(
        "You are writing The Daily Brief for {}, {}.\n\nHere are raw news search results by category:\n",
        date.day_name(),
        date.date_str()
    );

    for category in SearchCategory::ALL {
        prompt.push_str(&format!(
            "\n{}:\n{}\n",
            category.heading(),
            raw.text_or_placeholder(category)
        ));
    }

    prompt.push_str(&format!(
        "\nWrite a synthesised daily brief. Cross-reference stories across sources for accuracy.\n\
         The reader subscribes to: {} — mark these with \"subscriber\": true.\n\
         \n\
         Return ONLY valid JSON with this exact structure:\n\
         {}\n\
         \n\
         Include 4-5 stories per news section, 2-3 explore stories, and 5-7 deep dive items.\n\
         Ensure all URLs are real and accurate. Do not invent URLs.",
        prefs.subscriptions.join(", "),
        BRIEF_SCHEMA
    ));

    prompt
}

/// Decode a synthesis reply into a checked [`Brief`] with subscriber flags
/// derived from `prefs`.
pub fn parse_brief(text: &str, prefs: &SourcePreferences) -> Result<Brief> {
    check_brief(STAGE, parse_json_reply(STAGE, text)?, prefs)
}

/// Section-layout check and subscriber marking shared by fresh and saved briefs.
pub fn check_brief(
    stage: &'static str,
    mut brief: Brief,
    prefs: &SourcePreferences,
) -> Result<Brief> {
    brief
        .check_sections()
        .map_err(|detail| BriefError::SchemaMismatch { stage, detail })?;

    for section in brief.sections.iter().filter(|s| s.stories.is_empty()) {
        warn!(section = %section.id, "section has no stories");
    }

    brief.mark_subscribers(prefs);
    Ok(brief)
}

pub struct BriefSynthesizer<'a, M> {
    model: &'a M,
    prefs: &'a SourcePreferences,
}

impl<'a, M: LanguageModel> BriefSynthesizer<'a, M> {
    pub fn new(model: &'a M, prefs: &'a SourcePreferences) -> Self {
        Self { model, prefs }
    }

    #[instrument(level = "info", skip_all, fields(date = %date.date_file()))]
    pub async fn synthesize(&self, raw: &RawSearchResults, date: &RunDate) -> Result<Brief> {
        for category in SearchCategory::ALL {
            if raw.get(category).map_or(true, |text| text.trim().is_empty()) {
                warn!(%category, "no search results; using placeholder");
            }
        }

        let prompt = synthesis_prompt(raw, self.prefs, date);
        let reply = self
            .model
            .generate(GenerationRequest::new(prompt, SYNTHESIS_MAX_TOKENS))
            .await?;

        let brief = parse_brief(&reply, self.prefs)?;
        info!(
            stories = brief.story_count(),
            explore = brief.explore.stories.len(),
            deep_dive = brief.deep_dive.len(),
            "brief synthesised"
        );
        Ok(brief)
    }
}
