use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BriefError, Result};

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const DEEPGRAM_API_KEY: &str = "DEEPGRAM_API_KEY";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_VOICE: &str = "aura-helios-en";
pub const DEFAULT_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_SPEAK_URL: &str = "https://api.deepgram.com/v1/speak";
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1900;
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_secs(15);
pub const DEFAULT_OUTPUT_DIR: &str = "briefs";
pub const DEFAULT_READER: &str = "you";

/// API credentials, loaded once before any network call.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub deepgram_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read credentials through `lookup`; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &'static str, hint: &str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| BriefError::MissingCredential {
                    var,
                    hint: format!(
                        "Set it as an environment variable or add it to \
                         ~/.config/daily-brief/.env. {hint}"
                    ),
                })
        };

        let anthropic_api_key = require(
            ANTHROPIC_API_KEY,
            "Get a key from https://console.anthropic.com/settings/keys",
        )?;
        let deepgram_api_key = require(
            DEEPGRAM_API_KEY,
            "Get a key from https://console.deepgram.com",
        )?;

        Ok(Self {
            anthropic_api_key,
            deepgram_api_key,
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/daily-brief/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("daily-brief").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Knobs for a single run. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub voice: String,
    pub messages_url: String,
    pub speak_url: String,
    pub max_chunk_chars: usize,
    pub search_delay: Duration,
    pub output_dir: PathBuf,
    pub template_path: Option<PathBuf>,
    pub reader: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            messages_url: DEFAULT_MESSAGES_URL.to_string(),
            speak_url: DEFAULT_SPEAK_URL.to_string(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            search_delay: DEFAULT_SEARCH_DELAY,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            template_path: None,
            reader: DEFAULT_READER.to_string(),
        }
    }
}
