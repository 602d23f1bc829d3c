use tracing::{info, instrument, warn};

use crate::claude::{GenerationRequest, LanguageModel};
use crate::error::Result;
use crate::models::{RawSearchResults, RunDate};
use crate::pacing::IntervalGate;
use crate::sources::{SearchCategory, SourcePreferences};

const SEARCH_MAX_TOKENS: u32 = 2000;
const SEARCH_MAX_USES: u32 = 2;

pub fn search_prompt(query: &str) -> String {
    format!(
        r#"Search for: {query}

Return the top 5 most important stories. For each story provide:
- headline (concise, informative)
- source_name (which outlet reported it)
- source_url (direct link if available, otherwise outlet homepage)
- summary (2-3 sentences of substance, not just headline expansion)
- why_it_matters (1 sentence, only for the top 1-2 stories)

Format as JSON array. Only return the JSON, no other text."#
    )
}

/// Runs one search-augmented request per category, spaced by a gate.
pub struct NewsSearcher<'a, M> {
    model: &'a M,
    prefs: &'a SourcePreferences,
    gate: IntervalGate,
}

impl<'a, M: LanguageModel> NewsSearcher<'a, M> {
    pub fn new(model: &'a M, prefs: &'a SourcePreferences, gate: IntervalGate) -> Self {
        Self { model, prefs, gate }
    }

    /// Search every category in order. The first failing request aborts.
    #[instrument(level = "info", skip_all, fields(date = %date.date_file()))]
    pub async fn search_all(&mut self, date: &RunDate) -> Result<RawSearchResults> {
        let date_str = date.date_str();
        let mut results = RawSearchResults::default();

        for category in SearchCategory::ALL {
            self.gate.wait().await;

            println!("  🔍 Searching: {}...", category);
            let query = category.query(&date_str, self.prefs);
            let request = GenerationRequest::new(search_prompt(&query), SEARCH_MAX_TOKENS)
                .with_web_search(SEARCH_MAX_USES);

            let outcome = self.model.generate(request).await;
            self.gate.mark();
            let text = outcome?;

            if text.trim().is_empty() {
                warn!(%category, "search returned no text");
            }
            info!(%category, chars = text.len(), "search complete");
            println!("  ✅ {} done", category);

            results.insert(category, text);
        }

        Ok(results)
    }
}
