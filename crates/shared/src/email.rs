use tracing::{info, instrument, warn};

use crate::claude::{GenerationRequest, LanguageModel};
use crate::error::{BriefError, Result};
use crate::models::{Brief, RunDate};
use crate::response::strip_html_fence;

const EMAIL_MAX_TOKENS: u32 = 8000;

/// Section colours the email uses, keyed by section type.
pub const EMAIL_PALETTE: [(&str, &str); 7] = [
    ("accent", "#1B4D3E"),
    ("world", "#DC2626"),
    ("tech", "#2563EB"),
    ("business", "#059669"),
    ("science", "#7C3AED"),
    ("explore", "#D97706"),
    ("deepdive", "#0891B2"),
];

pub fn email_footer(reader: &str, date: &RunDate) -> String {
    format!(
        "Curated for {reader} · Generated at 6:00 AM · {}, {}",
        date.day_name(),
        date.date_str()
    )
}

pub fn email_prompt(brief: &Brief, reader: &str, date: &RunDate) -> Result<String> {
    let brief_json =
        serde_json::to_string_pretty(brief).map_err(BriefError::serialize("brief"))?;

    let palette = EMAIL_PALETTE
        .iter()
        .map(|(name, hex)| format!("{name}={hex}"))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        r#"Convert this daily brief data into a clean, email-safe HTML document.

Brief data:
{brief_json}

Requirements:
- ALL styles must be inline (no <style> tags — email clients strip them)
- Max width 600px, centered
- Use web-safe fonts: Georgia for body, Arial/Helvetica for UI elements
- Color scheme: {palette}
- Include the header: "THE DAILY BRIEF" brand, date, summary
- Include all sections with colored badges, story headlines (as links), sources, summaries, "why it matters" boxes
- Mark subscriber sources with a small green "Subscriber" badge
- Include Explore and Deep Dive sections
- Footer: "{footer}"
- Keep it clean and readable — this is a premium newsletter aesthetic

Return ONLY the complete HTML document, no markdown code fences."#,
        footer = email_footer(reader, date),
    ))
}

/// Asks the model for a self-contained, inline-styled email rendition of the
/// brief. Independent of the page template; the two may differ in layout.
pub struct EmailRenderer<'a, M> {
    model: &'a M,
    reader: &'a str,
}

impl<'a, M: LanguageModel> EmailRenderer<'a, M> {
    pub fn new(model: &'a M, reader: &'a str) -> Self {
        Self { model, reader }
    }

    #[instrument(level = "info", skip_all, fields(date = %date.date_file()))]
    pub async fn render(&self, brief: &Brief, date: &RunDate) -> Result<String> {
        let prompt = email_prompt(brief, self.reader, date)?;
        let reply = self
            .model
            .generate(GenerationRequest::new(prompt, EMAIL_MAX_TOKENS))
            .await?;

        let html = strip_html_fence(&reply);
        if html.contains("<style") {
            warn!("email HTML contains a <style> block");
        }
        info!(chars = html.len(), "email HTML generated");
        Ok(html)
    }
}
