use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BriefError, Result};

/// Outlets the reader trusts, pays for, or likes to browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePreferences {
    pub core: Vec<String>,
    pub subscriptions: Vec<String>,
    pub explore_pool: Vec<String>,
    pub podcasts: Vec<String>,
}

impl Default for SourcePreferences {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| s.to_string()).collect()
        }

        Self {
            core: owned(&[
                "The Economist",
                "NYT",
                "BBC",
                "TechCrunch",
                "Stratechery",
                "AI Daily Brief",
                "TLDR",
            ]),
            subscriptions: owned(&["The Economist", "NYT", "Lenny's Newsletter"]),
            explore_pool: owned(&[
                "WIRED",
                "MIT Technology Review",
                "Ars Technica",
                "The Verge",
                "Aeon",
                "Quanta Magazine",
            ]),
            podcasts: owned(&[
                "Lenny's Podcast",
                "AI Daily Brief",
                "Acquired",
                "The Journal (WSJ)",
            ]),
        }
    }
}

impl SourcePreferences {
    /// Load preferences from a JSON file with the same shape as the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BriefError::io("Failed to read sources file", path, e))?;
        serde_json::from_str(&content).map_err(|source| BriefError::MalformedJson {
            stage: "sources file",
            source,
        })
    }

    /// Exact, case-sensitive match against the subscription list.
    /// "NYT" and "The New York Times" are different outlets here.
    pub fn is_subscribed(&self, source_name: &str) -> bool {
        self.subscriptions.iter().any(|s| s == source_name)
    }
}

/// The four news sections every brief carries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub badge_class: &'static str,
    pub number: &'static str,
}

pub const NEWS_CATEGORIES: [NewsCategory; 4] = [
    NewsCategory {
        id: "world",
        name: "World & Politics",
        badge_class: "world",
        number: "01",
    },
    NewsCategory {
        id: "tech",
        name: "Tech & AI",
        badge_class: "tech",
        number: "02",
    },
    NewsCategory {
        id: "business",
        name: "Business & Finance",
        badge_class: "business",
        number: "03",
    },
    NewsCategory {
        id: "science",
        name: "Science & Health",
        badge_class: "science",
        number: "04",
    },
];

/// One search request per variant, issued in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchCategory {
    World,
    Tech,
    Business,
    Science,
    Explore,
    DeepDive,
}

impl SearchCategory {
    pub const ALL: [SearchCategory; 6] = [
        SearchCategory::World,
        SearchCategory::Tech,
        SearchCategory::Business,
        SearchCategory::Science,
        SearchCategory::Explore,
        SearchCategory::DeepDive,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SearchCategory::World => "world",
            SearchCategory::Tech => "tech",
            SearchCategory::Business => "business",
            SearchCategory::Science => "science",
            SearchCategory::Explore => "explore",
            SearchCategory::DeepDive => "deepdive",
        }
    }

    /// Heading used when the raw results are laid out for synthesis.
    pub fn heading(self) -> &'static str {
        match self {
            SearchCategory::World => "WORLD & POLITICS",
            SearchCategory::Tech => "TECH & AI",
            SearchCategory::Business => "BUSINESS & FINANCE",
            SearchCategory::Science => "SCIENCE & HEALTH",
            SearchCategory::Explore => "EXPLORE (discovery sources)",
            SearchCategory::DeepDive => "DEEP DIVE (podcasts/long reads)",
        }
    }

    pub fn query(self, date_str: &str, prefs: &SourcePreferences) -> String {
        match self {
            SearchCategory::World => format!("top world politics news today {date_str}"),
            SearchCategory::Tech => format!("top technology AI news today {date_str}"),
            SearchCategory::Business => format!("top business finance news today {date_str}"),
            SearchCategory::Science => format!("top science health news today {date_str}"),
            SearchCategory::Explore => {
                let pool = prefs
                    .explore_pool
                    .iter()
                    .take(2)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("interesting stories {pool} today {date_str}")
            }
            SearchCategory::DeepDive => format!(
                "new podcast episodes {} {date_str}",
                prefs.podcasts.join(" ")
            ),
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_exact_match() {
        let prefs = SourcePreferences::default();
        assert!(prefs.is_subscribed("The Economist"));
        assert!(prefs.is_subscribed("NYT"));
    }

    #[test]
    fn test_subscriber_is_case_sensitive_and_exact() {
        let prefs = SourcePreferences::default();
        assert!(!prefs.is_subscribed("the economist"));
        assert!(!prefs.is_subscribed("The New York Times"));
        assert!(!prefs.is_subscribed("BBC"));
        assert!(!prefs.is_subscribed(""));
    }

    #[test]
    fn test_news_category_order() {
        let ids: Vec<_> = NEWS_CATEGORIES.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["world", "tech", "business", "science"]);
    }

    #[test]
    fn test_search_category_keys() {
        let keys: Vec<_> = SearchCategory::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            vec!["world", "tech", "business", "science", "explore", "deepdive"]
        );
    }

    #[test]
    fn test_queries_embed_date() {
        let prefs = SourcePreferences::default();
        for category in SearchCategory::ALL {
            assert!(category
                .query("February 28, 2026", &prefs)
                .ends_with("February 28, 2026"));
        }
    }

    #[test]
    fn test_explore_query_uses_first_two_pool_sources() {
        let prefs = SourcePreferences::default();
        assert_eq!(
            SearchCategory::Explore.query("March 01, 2026", &prefs),
            "interesting stories WIRED MIT Technology Review today March 01, 2026"
        );
    }

    #[test]
    fn test_load_sources_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(
            &path,
            r#"{"core":["BBC"],"subscriptions":["FT"],"explore_pool":["Aeon"],"podcasts":[]}"#,
        )
        .unwrap();

        let prefs = SourcePreferences::load(&path).unwrap();
        assert!(prefs.is_subscribed("FT"));
        assert!(!prefs.is_subscribed("NYT"));
    }
}
