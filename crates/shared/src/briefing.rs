use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::error::{BriefError, Result};
use crate::models::{Brief, NarrationSection, RunDate, Story};
use crate::sources::SourcePreferences;

const DEFAULT_TEMPLATE: &str = include_str!("../templates/brief_template.html");

/// Everything a page template can refer to.
pub struct PageContext<'a> {
    pub date: &'a RunDate,
    pub brief: &'a Brief,
    pub narration: &'a [NarrationSection],
    pub mp3_filename: &'a str,
    pub sources: &'a SourcePreferences,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(BriefError::serialize("template data"))
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([a-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Fills a page template with a rendered brief.
///
/// Placeholders look like `{{ name }}`. Output depends only on the context,
/// so rendering the same brief twice gives identical bytes.
pub struct BriefingGenerator {
    template: String,
}

impl Default for BriefingGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl BriefingGenerator {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Use the template at `path`, or the built-in one when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let template = fs::read_to_string(path)
                    .map_err(|e| BriefError::io("Failed to read template", path, e))?;
                Ok(Self::new(template))
            }
            None => Ok(Self::default()),
        }
    }

    #[instrument(level = "info", skip_all, fields(date = %ctx.date.date_file()))]
    pub fn render(&self, ctx: &PageContext<'_>) -> Result<String> {
        let fields = Self::fields(ctx)?;

        let html = placeholder().replace_all(&self.template, |caps: &Captures| {
            match fields.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    warn!(name = &caps[1], "unknown template placeholder");
                    caps[0].to_string()
                }
            }
        });

        Ok(html.into_owned())
    }

    fn fields(ctx: &PageContext<'_>) -> Result<BTreeMap<&'static str, String>> {
        let mut fields = BTreeMap::new();
        fields.insert("date_str", Self::escape_html(&ctx.date.date_str()));
        fields.insert("day_name", Self::escape_html(&ctx.date.day_name()));
        fields.insert("date_file", Self::escape_html(&ctx.date.date_file()));
        fields.insert("summary", Self::escape_html(&ctx.brief.summary));
        fields.insert("sections", Self::render_sections(ctx.brief));
        fields.insert("explore", Self::render_explore(ctx.brief));
        fields.insert("deep_dive", Self::render_deep_dive(ctx.brief));
        fields.insert("narration", Self::render_narration(ctx.narration));
        fields.insert("mp3_filename", Self::escape_html(ctx.mp3_filename));
        fields.insert("sources", Self::render_sources(ctx.sources));
        fields.insert("brief_json", Self::escape_script(&to_json(ctx.brief)?));
        fields.insert("narration_json", Self::escape_script(&to_json(ctx.narration)?));
        Ok(fields)
    }

    fn render_sections(brief: &Brief) -> String {
        let mut html = String::new();

        for section in &brief.sections {
            html.push_str(&format!(
                "<section class=\"news-section\" id=\"{}\">\n",
                Self::escape_html(&section.id)
            ));
            html.push_str(&format!(
                "  <h2><span class=\"badge {}\">{}</span> {}</h2>\n",
                Self::escape_html(&section.badge_class),
                Self::escape_html(&section.number),
                Self::escape_html(&section.name)
            ));

            for story in &section.stories {
                html.push_str(&Self::render_story(story));
            }

            html.push_str("</section>\n");
        }

        html
    }

    fn render_story(story: &Story) -> String {
        let mut html = String::new();
        html.push_str("  <article class=\"story\">\n");
        html.push_str(&format!(
            "    <h3>{}</h3>\n",
            Self::escape_html(&story.headline)
        ));

        html.push_str("    <div class=\"sources\">\n");
        for source in &story.sources {
            html.push_str(&format!(
                "      <a href=\"{}\" class=\"source\" target=\"_blank\">{}</a>",
                Self::escape_html(&source.url),
                Self::escape_html(&source.name)
            ));
            if source.subscriber {
                html.push_str(" <span class=\"subscriber\">Subscriber</span>");
            }
            html.push('\n');
        }
        html.push_str("    </div>\n");

        html.push_str(&format!(
            "    <p>{}</p>\n",
            Self::escape_html(&story.summary)
        ));
        if let Some(why) = story.why_it_matters.as_deref().filter(|w| !w.is_empty()) {
            html.push_str(&format!(
                "    <p class=\"why\"><strong>Why it matters:</strong> {}</p>\n",
                Self::escape_html(why)
            ));
        }
        html.push_str("  </article>\n");
        html
    }

    fn render_explore(brief: &Brief) -> String {
        let explore = &brief.explore;
        let mut html = String::new();

        html.push_str(&format!(
            "<p class=\"explore-source\"><strong>{}</strong> · {}</p>\n",
            Self::escape_html(&explore.source_name),
            Self::escape_html(&explore.source_description)
        ));
        for story in &explore.stories {
            html.push_str("<article class=\"story\">\n");
            html.push_str(&format!(
                "  <h3><a href=\"{}\" target=\"_blank\">{}</a></h3>\n",
                Self::escape_html(&story.source_url),
                Self::escape_html(&story.headline)
            ));
            html.push_str(&format!(
                "  <div class=\"metadata\">{}</div>\n",
                Self::escape_html(&story.source_name)
            ));
            html.push_str(&format!(
                "  <p>{}</p>\n",
                Self::escape_html(&story.summary)
            ));
            html.push_str("</article>\n");
        }

        html
    }

    fn render_deep_dive(brief: &Brief) -> String {
        let mut html = String::new();

        for item in &brief.deep_dive {
            html.push_str(&format!(
                "<div class=\"deep-dive-item {}\">\n",
                item.kind.as_str()
            ));
            html.push_str(&format!(
                "  <span class=\"icon\">{}</span>\n",
                Self::escape_html(&item.icon)
            ));
            html.push_str(&format!(
                "  <h3><a href=\"{}\" target=\"_blank\">{}</a></h3>\n",
                Self::escape_html(&item.url),
                Self::escape_html(&item.title)
            ));
            html.push_str(&format!(
                "  <div class=\"metadata\">{} · <span class=\"tag\">{}</span>",
                Self::escape_html(&item.meta),
                Self::escape_html(&item.tag_label)
            ));
            if item.subscriber {
                html.push_str(" <span class=\"subscriber\">Subscriber</span>");
            }
            html.push_str("</div>\n");
            html.push_str(&format!(
                "  <p>{}</p>\n",
                Self::escape_html(&item.description)
            ));
            html.push_str("</div>\n");
        }

        html
    }

    fn render_narration(narration: &[NarrationSection]) -> String {
        let mut html = String::new();

        for section in narration {
            html.push_str("<details class=\"narration\">\n");
            html.push_str(&format!(
                "  <summary>{}</summary>\n",
                Self::escape_html(&section.label)
            ));
            html.push_str(&format!(
                "  <p>{}</p>\n",
                Self::escape_html(&section.text)
            ));
            html.push_str("</details>\n");
        }

        html
    }

    fn render_sources(sources: &SourcePreferences) -> String {
        let list = |names: &[String]| {
            names
                .iter()
                .map(|n| Self::escape_html(n))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut html = String::new();
        html.push_str("<ul class=\"source-list\">\n");
        html.push_str(&format!("  <li><strong>Core:</strong> {}</li>\n", list(&sources.core)));
        html.push_str(&format!(
            "  <li><strong>Subscriptions:</strong> {}</li>\n",
            list(&sources.subscriptions)
        ));
        html.push_str(&format!(
            "  <li><strong>Explore:</strong> {}</li>\n",
            list(&sources.explore_pool)
        ));
        html.push_str(&format!(
            "  <li><strong>Podcasts:</strong> {}</li>\n",
            list(&sources.podcasts)
        ));
        html.push_str("</ul>\n");
        html
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    /// JSON embedded in a `<script>` block must not close the block early.
    fn escape_script(json: &str) -> String {
        json.replace("</", "<\\/")
    }

    pub fn save(content: &str, path: &Path) -> Result<()> {
        fs::write(path, content).map_err(|e| BriefError::io("Failed to write briefing file", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::narration::sample_narration;
    use chrono::NaiveDate;

    fn date() -> RunDate {
        RunDate::new(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
    }

    fn render_with(generator: &BriefingGenerator, brief: &Brief) -> String {
        let narration = sample_narration();
        let sources = SourcePreferences::default();
        let date = date();
        generator
            .render(&PageContext {
                date: &date,
                brief,
                narration: &narration,
                mp3_filename: "daily_brief_2026-02-28.mp3",
                sources: &sources,
            })
            .unwrap()
    }

    // ==================== HTML Escaping Tests ====================

    #[test]
    fn test_escape_html_ampersand() {
        assert_eq!(BriefingGenerator::escape_html("A & B"), "A &amp; B");
    }

    #[test]
    fn test_escape_html_combined() {
        assert_eq!(
            BriefingGenerator::escape_html("<a href=\"test\">Click & Go</a>"),
            "&lt;a href=&quot;test&quot;&gt;Click &amp; Go&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_single_quotes() {
        assert_eq!(BriefingGenerator::escape_html("Lenny's"), "Lenny&#39;s");
    }

    #[test]
    fn test_escape_script() {
        assert_eq!(
            BriefingGenerator::escape_script("{\"a\": \"</script>\"}"),
            "{\"a\": \"<\\/script>\"}"
        );
    }

    // ==================== Template Tests ====================

    #[test]
    fn test_every_field_is_substituted() {
        let template = "{{date_str}}|{{ day_name }}|{{date_file}}|{{mp3_filename}}|{{summary}}";
        let html = render_with(&BriefingGenerator::new(template), &fixtures::brief());
        assert_eq!(
            html,
            "February 28, 2026|Saturday|2026-02-28|daily_brief_2026-02-28.mp3|A busy day."
        );
    }

    #[test]
    fn test_audio_filename_placeholder_with_digit() {
        let html = render_with(
            &BriefingGenerator::new("<audio src=\"{{ mp3_filename }}\"></audio>"),
            &fixtures::brief(),
        );
        assert_eq!(html, "<audio src=\"daily_brief_2026-02-28.mp3\"></audio>");
    }

    #[test]
    fn test_every_field_name_matches_placeholder_pattern() {
        let narration = sample_narration();
        let sources = SourcePreferences::default();
        let date = date();
        let brief = fixtures::brief();
        let ctx = PageContext {
            date: &date,
            brief: &brief,
            narration: &narration,
            mp3_filename: "a.mp3",
            sources: &sources,
        };

        for name in BriefingGenerator::fields(&ctx).unwrap().keys() {
            let template = format!("{{{{ {name} }}}}");
            let html = BriefingGenerator::new(template.as_str()).render(&ctx).unwrap();
            assert_ne!(html, template, "{name} was not substituted");
        }
    }

    #[test]
    fn test_unknown_placeholder_is_left_in_place() {
        let html = render_with(
            &BriefingGenerator::new("<p>{{ weather }}</p>"),
            &fixtures::brief(),
        );
        assert_eq!(html, "<p>{{ weather }}</p>");
    }

    #[test]
    fn test_default_template_renders_brief() {
        let mut brief = fixtures::brief();
        brief.sections[0].stories[0].why_it_matters = Some("Stakes are high.".to_string());
        brief.sections[1].stories[0].sources[0].subscriber = true;

        let html = render_with(&BriefingGenerator::default(), &brief);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Saturday, February 28, 2026"));
        assert!(html.contains("World &amp; Politics headline"));
        assert!(html.contains("Why it matters:</strong> Stakes are high."));
        assert!(html.contains("<span class=\"subscriber\">Subscriber</span>"));
        assert!(html.contains("src=\"daily_brief_2026-02-28.mp3\""));
        assert!(html.contains("Acquired: Costco"));
        assert!(html.contains("deep-dive-item podcast"));
        assert!(html.contains("<summary>Explore &amp; Sign-off</summary>"));
        assert!(html.contains("Lenny&#39;s Newsletter"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_brief_json_is_embedded() {
        let html = render_with(&BriefingGenerator::new("{{ brief_json }}"), &fixtures::brief());
        let parsed: Brief = serde_json::from_str(&html).unwrap();
        assert_eq!(parsed, fixtures::brief());
    }

    #[test]
    fn test_render_is_deterministic() {
        let generator = BriefingGenerator::default();
        let brief = fixtures::brief();
        assert_eq!(render_with(&generator, &brief), render_with(&generator, &brief));
    }

    #[test]
    fn test_load_template_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<h1>{{ day_name }}</h1>").unwrap();

        let generator = BriefingGenerator::load(Some(&path)).unwrap();
        let html = render_with(&generator, &fixtures::brief());
        assert_eq!(html, "<h1>Saturday</h1>");
    }

    #[test]
    fn test_missing_template_is_io_error() {
        let err = BriefingGenerator::load(Some(Path::new("/nonexistent/page.html")))
            .err()
            .unwrap();
        assert!(matches!(err, BriefError::Io { .. }));
    }
}
