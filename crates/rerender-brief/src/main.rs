use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use shared::config::{
    DEFAULT_MAX_CHUNK_CHARS, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR, DEFAULT_READER, DEFAULT_VOICE,
};
use shared::{
    date_from_brief_path, load_brief, ClaudeClient, Config, DeepgramClient, OutputPaths, Pipeline,
    PipelineSettings, RenderOptions, RunDate, SourcePreferences,
};
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "rerender-brief")]
#[command(about = "Regenerate narration, audio, page and email from a saved brief")]
struct Args {
    /// Saved brief JSON (if not provided, will list the briefs in the output directory)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Run date as YYYY-MM-DD, when the file name doesn't carry one
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Directory the outputs are written to (defaults to the brief's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Keep the existing audio and only redo narration, page and email
    #[arg(long)]
    skip_audio: bool,

    #[arg(long)]
    template: Option<PathBuf>,

    /// JSON file overriding the source preferences
    #[arg(long)]
    sources: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
    max_chars: usize,

    #[arg(long, default_value = DEFAULT_READER)]
    reader: String,
}

impl Args {
    fn settings(&self, brief_file: &Path) -> PipelineSettings {
        let output_dir = self.output_dir.clone().unwrap_or_else(|| {
            brief_file
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        });

        PipelineSettings {
            model: self.model.clone(),
            voice: self.voice.clone(),
            max_chunk_chars: self.max_chars,
            output_dir,
            template_path: self.template.clone(),
            reader: self.reader.clone(),
            ..PipelineSettings::default()
        }
    }

    fn run_date(&self, brief_file: &Path) -> Result<RunDate> {
        if let Some(date) = self.date {
            return Ok(RunDate::new(date));
        }
        date_from_brief_path(brief_file).ok_or_else(|| {
            anyhow::anyhow!(
                "Can't tell the date of {}; pass --date YYYY-MM-DD",
                brief_file.display()
            )
        })
    }

    /// Where the picker looks when no `--file` is given.
    fn picker_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            audio: !self.skip_audio,
        }
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

fn list_brief_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| date_from_brief_path(path).is_some())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();

    // Newest run first
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(files)
}

fn select_brief_file(dir: &Path) -> Result<PathBuf> {
    let files = list_brief_files(dir)?;

    if files.is_empty() {
        anyhow::bail!("No saved briefs found in {}", dir.display());
    }

    println!("Saved briefs:\n");
    for (i, file) in files.iter().enumerate() {
        println!("  {}) {}", i + 1, file.display());
    }

    print!("\nSelect brief (1-{}): ", files.len());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let selection: usize = input
        .trim()
        .parse()
        .context("Invalid selection. Please enter a number.")?;

    if selection < 1 || selection > files.len() {
        anyhow::bail!("Selection out of range. Please choose 1-{}", files.len());
    }

    Ok(files[selection - 1].clone())
}

fn load_preferences(path: Option<&PathBuf>) -> Result<SourcePreferences> {
    match path {
        Some(path) => SourcePreferences::load(path)
            .with_context(|| format!("Failed to load sources from {}", path.display())),
        None => Ok(SourcePreferences::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::from_env()?;

    let brief_file = match &args.file {
        Some(path) => path.clone(),
        None => select_brief_file(&args.picker_dir())?,
    };
    let date = args.run_date(&brief_file)?;
    let settings = args.settings(&brief_file);
    let prefs = load_preferences(args.sources.as_ref())?;

    println!("📖 Reading brief: {}", brief_file.display());
    let brief = load_brief(&brief_file, &prefs)
        .with_context(|| format!("Failed to load brief: {}", brief_file.display()))?;
    println!(
        "✓ Loaded {} sections with {} stories",
        brief.sections.len(),
        brief.story_count()
    );
    tracing::info!(?settings, skip_audio = args.skip_audio, "re-rendering");

    let claude = ClaudeClient::new(
        config.anthropic_api_key,
        settings.model.clone(),
        settings.messages_url.clone(),
    )?;
    let deepgram = DeepgramClient::new(config.deepgram_api_key, &settings.speak_url, &settings.voice)?;

    let pipeline = Pipeline::new(&claude, &deepgram, &prefs, &settings)?;
    let paths = OutputPaths::new(&settings.output_dir, &date);
    pipeline
        .render_outputs(&brief, &date, &paths, args.render_options())
        .await
        .context("Re-render failed")?;

    println!("\n✅ Done!");
    if !args.skip_audio {
        println!("  🔊 Audio: {}", paths.audio.display());
    }
    println!("  📄 Page:  {}", paths.html.display());
    println!("  📧 Email: {}", paths.email_html.display());

    Ok(())
}
