use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::{BriefError, Result};
use crate::models::NarrationSection;

const SERVICE: &str = "Deepgram";

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Breaks after the last ". " inside the window, else at the last space,
/// else hard-cuts at `max_chars`. Text that already fits, including empty
/// text, comes back as a single unchanged chunk.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        if rest.chars().count() <= max_chars {
            chunks.push(rest.to_string());
            break;
        }

        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(idx, _)| idx);
        let window = &rest[..window_end];

        let split_at = match window.rfind(". ").or_else(|| window.rfind(' ')) {
            // Keep the period (or the space) on the left-hand chunk
            Some(idx) => idx + 1,
            None => window_end,
        };

        let chunk = rest[..split_at].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = rest[split_at..].trim();
    }

    chunks
}

/// Anything that can turn a chunk of text into audio bytes.
#[allow(async_fn_in_trait)]
pub trait SpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

pub struct DeepgramClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

impl DeepgramClient {
    pub fn new(api_key: String, speak_url: &str, voice: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|source| BriefError::Http {
                service: SERVICE,
                source,
            })?;

        let endpoint = Url::parse_with_params(speak_url, &[("model", voice)])
            .map_err(|e| BriefError::Config(format!("invalid speak URL {speak_url}: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl SpeechSynthesizer for DeepgramClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let http_error = |source| BriefError::Http {
            service: SERVICE,
            source,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&SpeakRequest { text })
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(BriefError::upstream(SERVICE, status.as_u16(), &error_text));
        }

        let bytes = response.bytes().await.map_err(http_error)?;
        Ok(bytes.to_vec())
    }
}

/// Renders narration to a single audio file, chunk by chunk.
pub struct AudioRenderer<'a, S> {
    tts: &'a S,
    max_chunk_chars: usize,
}

impl<'a, S: SpeechSynthesizer> AudioRenderer<'a, S> {
    pub fn new(tts: &'a S, max_chunk_chars: usize) -> Self {
        Self {
            tts,
            max_chunk_chars,
        }
    }

    /// Audio for one section: its chunks' bytes concatenated in order.
    pub async fn render_section(&self, section: &NarrationSection) -> Result<Vec<u8>> {
        let mut section_bytes = Vec::new();
        for (index, chunk) in split_text(&section.text, self.max_chunk_chars)
            .iter()
            .enumerate()
        {
            let audio = self.tts.synthesize(chunk).await?;
            debug!(label = %section.label, chunk = index, bytes = audio.len(), "chunk rendered");
            section_bytes.extend_from_slice(&audio);
        }
        Ok(section_bytes)
    }

    /// Render every section in order and write the concatenation to `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn render(&self, sections: &[NarrationSection], path: &Path) -> Result<PathBuf> {
        let mut audio = Vec::new();
        for (index, section) in sections.iter().enumerate() {
            println!(
                "  🎵 Section {}/{}: {}...",
                index + 1,
                sections.len(),
                section.label
            );
            let section_bytes = self.render_section(section).await?;
            println!("  ✅ {} done ({} bytes)", section.label, section_bytes.len());
            audio.extend_from_slice(&section_bytes);
        }

        tokio::fs::write(path, &audio)
            .await
            .map_err(|e| BriefError::io("Failed to write audio file", path, e))?;

        info!(bytes = audio.len(), "audio written");
        Ok(path.to_path_buf())
    }
}
