// Public modules
pub mod audio;
pub mod briefing;
pub mod claude;
pub mod config;
pub mod email;
pub mod error;
pub mod io;
pub mod models;
pub mod narration;
pub mod pacing;
pub mod pipeline;
pub mod response;
pub mod search;
pub mod sources;
pub mod synthesis;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use audio::{split_text, AudioRenderer, DeepgramClient, SpeechSynthesizer};
pub use briefing::{BriefingGenerator, PageContext};
pub use claude::{ClaudeClient, GenerationRequest, LanguageModel};
pub use config::{Config, PipelineSettings};
pub use email::EmailRenderer;
pub use error::{BriefError, Result};
pub use io::{date_from_brief_path, load_brief, save_brief, OutputPaths};
pub use models::{Brief, NarrationSection, RawSearchResults, RunDate};
pub use narration::NarrationGenerator;
pub use pacing::IntervalGate;
pub use pipeline::{Pipeline, RenderOptions};
pub use search::NewsSearcher;
pub use sources::{SearchCategory, SourcePreferences};
pub use synthesis::BriefSynthesizer;
