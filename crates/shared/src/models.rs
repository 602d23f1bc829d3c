use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::sources::{SearchCategory, SourcePreferences, NEWS_CATEGORIES};

/// Placeholder handed to synthesis for a category that came back empty.
pub const NO_RESULTS: &str = "No results";

/// The calendar date a run is keyed by, with its display forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate(NaiveDate);

impl RunDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// "February 28, 2026"
    pub fn date_str(&self) -> String {
        self.0.format("%B %d, %Y").to_string()
    }

    /// "2026-02-28"
    pub fn date_file(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// "Saturday"
    pub fn day_name(&self) -> String {
        self.0.format("%A").to_string()
    }
}

/// Raw text per search category, untouched until synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSearchResults(BTreeMap<SearchCategory, String>);

impl RawSearchResults {
    pub fn insert(&mut self, category: SearchCategory, text: String) {
        self.0.insert(category, text);
    }

    pub fn get(&self, category: SearchCategory) -> Option<&str> {
        self.0.get(&category).map(String::as_str)
    }

    /// The category's text, or [`NO_RESULTS`] when it is missing or blank.
    pub fn text_or_placeholder(&self, category: SearchCategory) -> &str {
        match self.get(category) {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_RESULTS,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    pub summary: String,
    pub sections: Vec<Section>,
    pub explore: Explore,
    pub deep_dive: Vec<DeepDiveItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    pub badge_class: String,
    pub number: String,
    pub stories: Vec<Story>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub headline: String,
    pub sources: Vec<SourceRef>,
    pub summary: String,
    #[serde(default)]
    pub why_it_matters: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub subscriber: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explore {
    pub source_name: String,
    pub source_description: String,
    pub stories: Vec<ExploreStory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreStory {
    pub headline: String,
    pub source_name: String,
    pub source_url: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepDiveKind {
    Podcast,
    Audiobook,
    Longread,
}

impl DeepDiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeepDiveKind::Podcast => "podcast",
            DeepDiveKind::Audiobook => "audiobook",
            DeepDiveKind::Longread => "longread",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepDiveItem {
    #[serde(rename = "type")]
    pub kind: DeepDiveKind,
    pub icon: String,
    pub title: String,
    pub url: String,
    pub meta: String,
    pub description: String,
    #[serde(default)]
    pub subscriber: bool,
    pub tag_label: String,
}

impl Brief {
    /// Check the section layout: exactly the four news categories, in order.
    pub fn check_sections(&self) -> Result<(), String> {
        if self.sections.len() != NEWS_CATEGORIES.len() {
            return Err(format!(
                "expected {} sections, got {}",
                NEWS_CATEGORIES.len(),
                self.sections.len()
            ));
        }

        for (position, (section, expected)) in
            self.sections.iter().zip(NEWS_CATEGORIES.iter()).enumerate()
        {
            if section.id != expected.id {
                return Err(format!(
                    "section {} has id {:?}, expected {:?}",
                    position + 1,
                    section.id,
                    expected.id
                ));
            }
        }

        Ok(())
    }

    /// Re-derive every section source's subscriber flag from `prefs`.
    pub fn mark_subscribers(&mut self, prefs: &SourcePreferences) {
        for source in self
            .sections
            .iter_mut()
            .flat_map(|section| section.stories.iter_mut())
            .flat_map(|story| story.sources.iter_mut())
        {
            source.subscriber = prefs.is_subscribed(&source.name);
        }
    }

    pub fn story_count(&self) -> usize {
        self.sections.iter().map(|s| s.stories.len()).sum()
    }
}

/// One spoken segment of the audio brief.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationSection {
    pub label: String,
    pub text: String,
}

impl NarrationSection {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}
