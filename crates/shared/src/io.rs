use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{BriefError, Result};
use crate::models::{Brief, RunDate};
use crate::sources::SourcePreferences;
use crate::response::decode_json;
use crate::synthesis::check_brief;

const SAVED_BRIEF: &str = "saved brief";

/// The four files a run produces, all named after the run date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub brief_json: PathBuf,
    pub audio: PathBuf,
    pub html: PathBuf,
    pub email_html: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, date: &RunDate) -> Self {
        let stem = format!("daily_brief_{}", date.date_file());
        Self {
            brief_json: output_dir.join(format!("{stem}.json")),
            audio: output_dir.join(format!("{stem}.mp3")),
            html: output_dir.join(format!("{stem}.html")),
            email_html: output_dir.join(format!("{stem}_email.html")),
        }
    }

    /// File name of the audio, as the page links to it.
    pub fn audio_filename(&self) -> String {
        self.audio
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| BriefError::io("Failed to create output directory", dir, e))
}

/// Write the brief as pretty JSON, replacing any earlier file for the date.
pub fn save_brief(brief: &Brief, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(brief).map_err(BriefError::serialize("brief"))?;
    write_text(path, &json)?;
    info!(path = %path.display(), "brief saved");
    Ok(())
}

/// Read a persisted brief back, with the same checks synthesis applies.
pub fn load_brief(path: &Path, prefs: &SourcePreferences) -> Result<Brief> {
    if !path.exists() {
        return Err(BriefError::io(
            "Brief file not found",
            path,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }

    let content =
        fs::read_to_string(path).map_err(|e| BriefError::io("Failed to read brief file", path, e))?;
    // Saved files are plain JSON; fence stripping is only for model replies
    let brief = decode_json(SAVED_BRIEF, &content)?;
    check_brief(SAVED_BRIEF, brief, prefs)
}

pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| BriefError::io("Failed to write", path, e))
}

/// Recover the run date from a `daily_brief_<YYYY-MM-DD>.json` file name.
pub fn date_from_brief_path(path: &Path) -> Option<RunDate> {
    let stem = path.file_stem()?.to_str()?;
    let date = stem.strip_prefix("daily_brief_")?;
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(RunDate::new)
}
