use tracing::{info, instrument};

use crate::audio::{AudioRenderer, SpeechSynthesizer};
use crate::briefing::{BriefingGenerator, PageContext};
use crate::claude::LanguageModel;
use crate::config::PipelineSettings;
use crate::email::EmailRenderer;
use crate::error::Result;
use crate::io::{ensure_output_dir, save_brief, write_text, OutputPaths};
use crate::models::{Brief, RunDate};
use crate::narration::NarrationGenerator;
use crate::pacing::IntervalGate;
use crate::search::NewsSearcher;
use crate::sources::SourcePreferences;
use crate::synthesis::BriefSynthesizer;

/// Which of the post-synthesis stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub audio: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { audio: true }
    }
}

/// The six stages, run strictly in order. Any error aborts the run and
/// leaves whatever was already written in place.
pub struct Pipeline<'a, M, S> {
    model: &'a M,
    tts: &'a S,
    prefs: &'a SourcePreferences,
    settings: &'a PipelineSettings,
    page: BriefingGenerator,
}

impl<'a, M: LanguageModel, S: SpeechSynthesizer> Pipeline<'a, M, S> {
    pub fn new(
        model: &'a M,
        tts: &'a S,
        prefs: &'a SourcePreferences,
        settings: &'a PipelineSettings,
    ) -> Result<Self> {
        let page = BriefingGenerator::load(settings.template_path.as_deref())?;
        Ok(Self {
            model,
            tts,
            prefs,
            settings,
            page,
        })
    }

    pub fn paths(&self, date: &RunDate) -> OutputPaths {
        OutputPaths::new(&self.settings.output_dir, date)
    }

    /// Full run, pacing searches by the configured delay.
    pub async fn run(&self, date: &RunDate) -> Result<OutputPaths> {
        self.run_with_gate(date, IntervalGate::new(self.settings.search_delay))
            .await
    }

    #[instrument(level = "info", skip_all, fields(date = %date.date_file()))]
    pub async fn run_with_gate(&self, date: &RunDate, gate: IntervalGate) -> Result<OutputPaths> {
        ensure_output_dir(&self.settings.output_dir)?;
        let paths = self.paths(date);

        println!("📡 Searching for today's news...");
        let raw = NewsSearcher::new(self.model, self.prefs, gate)
            .search_all(date)
            .await?;

        println!("✍️  Synthesising brief...");
        let brief = BriefSynthesizer::new(self.model, self.prefs)
            .synthesize(&raw, date)
            .await?;
        println!("  ✅ Brief synthesised");

        // Persist before anything else can fail
        save_brief(&brief, &paths.brief_json)?;
        println!("  💾 Data saved: {}", paths.brief_json.display());

        self.render_outputs(&brief, date, &paths, RenderOptions::default())
            .await?;

        info!("run complete");
        Ok(paths)
    }

    /// Stages three to six: narration, audio, page and email.
    #[instrument(level = "info", skip_all, fields(date = %date.date_file(), audio = options.audio))]
    pub async fn render_outputs(
        &self,
        brief: &Brief,
        date: &RunDate,
        paths: &OutputPaths,
        options: RenderOptions,
    ) -> Result<()> {
        ensure_output_dir(&self.settings.output_dir)?;

        println!("🎤 Generating narration text...");
        let narration = NarrationGenerator::new(self.model)
            .generate(brief, date)
            .await?;
        println!("  ✅ {} narration sections generated", narration.len());

        if options.audio {
            println!("🔊 Generating audio...");
            AudioRenderer::new(self.tts, self.settings.max_chunk_chars)
                .render(&narration, &paths.audio)
                .await?;
            println!("  ✅ Audio saved: {}", paths.audio.display());
        }

        println!("📄 Rendering HTML...");
        let mp3_filename = paths.audio_filename();
        let html = self.page.render(&PageContext {
            date,
            brief,
            narration: &narration,
            mp3_filename: &mp3_filename,
            sources: self.prefs,
        })?;
        BriefingGenerator::save(&html, &paths.html)?;
        println!("  ✅ HTML saved: {}", paths.html.display());

        println!("📧 Generating email HTML...");
        let email = EmailRenderer::new(self.model, &self.settings.reader)
            .render(brief, date)
            .await?;
        write_text(&paths.email_html, &email)?;
        println!("  📧 Email HTML saved: {}", paths.email_html.display());

        Ok(())
    }
}
