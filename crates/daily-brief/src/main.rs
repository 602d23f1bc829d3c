use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use shared::config::{
    DEFAULT_MAX_CHUNK_CHARS, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR, DEFAULT_READER,
    DEFAULT_SEARCH_DELAY, DEFAULT_VOICE,
};
use shared::{
    ClaudeClient, Config, DeepgramClient, OutputPaths, Pipeline, PipelineSettings, RunDate,
    SourcePreferences,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "daily-brief")]
#[command(about = "Search today's news, write the brief, narrate it and render the page and email")]
struct Args {
    /// Run date as YYYY-MM-DD (defaults to today, local time)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Directory the four output files are written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// HTML template with {{ placeholder }} slots (defaults to the built-in one)
    #[arg(long)]
    template: Option<PathBuf>,

    /// JSON file overriding the source preferences
    #[arg(long)]
    sources: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Deepgram voice model
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Maximum characters per speech request
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
    max_chars: usize,

    /// Seconds between consecutive web searches
    #[arg(long, default_value_t = DEFAULT_SEARCH_DELAY.as_secs())]
    search_delay_secs: u64,

    /// Name used in the email footer
    #[arg(long, default_value = DEFAULT_READER)]
    reader: String,
}

impl Args {
    fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            model: self.model.clone(),
            voice: self.voice.clone(),
            max_chunk_chars: self.max_chars,
            search_delay: Duration::from_secs(self.search_delay_secs),
            output_dir: self.output_dir.clone(),
            template_path: self.template.clone(),
            reader: self.reader.clone(),
            ..PipelineSettings::default()
        }
    }

    fn run_date(&self) -> RunDate {
        self.date.map(RunDate::new).unwrap_or_else(RunDate::today)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}

fn load_preferences(path: Option<&PathBuf>) -> Result<SourcePreferences> {
    match path {
        Some(path) => SourcePreferences::load(path)
            .with_context(|| format!("Failed to load sources from {}", path.display())),
        None => Ok(SourcePreferences::default()),
    }
}

fn print_report(paths: &OutputPaths) {
    println!("\n✅ Done! Today's brief is ready:");
    println!("  📋 Data:  {}", paths.brief_json.display());
    println!("  🔊 Audio: {}", paths.audio.display());
    println!("  📄 Page:  {}", paths.html.display());
    println!("  📧 Email: {}", paths.email_html.display());
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    // Credentials first, so a missing key fails before any request
    let config = Config::from_env()?;
    let settings = args.settings();
    let prefs = load_preferences(args.sources.as_ref())?;
    let date = args.run_date();

    println!("📰 The Daily Brief for {}, {}", date.day_name(), date.date_str());
    tracing::info!(?settings, "starting run");

    let claude = ClaudeClient::new(
        config.anthropic_api_key,
        settings.model.clone(),
        settings.messages_url.clone(),
    )?;
    let deepgram = DeepgramClient::new(config.deepgram_api_key, &settings.speak_url, &settings.voice)?;

    let pipeline = Pipeline::new(&claude, &deepgram, &prefs, &settings)?;
    let paths = pipeline
        .run(&date)
        .await
        .context("Daily brief run failed")?;

    print_report(&paths);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["daily-brief"]).unwrap();
        let settings = args.settings();

        assert_eq!(settings.output_dir, PathBuf::from("briefs"));
        assert_eq!(settings.max_chunk_chars, 1900);
        assert_eq!(settings.search_delay, DEFAULT_SEARCH_DELAY);
        assert_eq!(args.search_delay_secs, 15);
        assert_eq!(settings.voice, "aura-helios-en");
        assert_eq!(settings.reader, "you");
        assert!(settings.template_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "daily-brief",
            "--date",
            "2026-02-28",
            "--output-dir",
            "/tmp/out",
            "--search-delay-secs",
            "0",
            "--max-chars",
            "500",
            "--reader",
            "Sam",
        ])
        .unwrap();
        let settings = args.settings();

        assert_eq!(args.run_date().date_file(), "2026-02-28");
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(settings.search_delay, Duration::ZERO);
        assert_eq!(settings.max_chunk_chars, 500);
        assert_eq!(settings.reader, "Sam");
    }

    #[test]
    fn test_rejects_bad_date() {
        assert!(Args::try_parse_from(["daily-brief", "--date", "28/02/2026"]).is_err());
    }
}
