use std::collections::VecDeque;
use std::sync::Mutex;

use crate::audio::SpeechSynthesizer;
use crate::claude::{GenerationRequest, LanguageModel};
use crate::error::{BriefError, Result};

/// Replays canned replies in order and records every request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer `reply` `successes` times, then fail with an overloaded error.
    pub fn failing_after(successes: usize, reply: String) -> Self {
        let mut replies: VecDeque<Result<String>> =
            (0..successes).map(|_| Ok(reply.clone())).collect();
        replies.push_back(Err(BriefError::upstream("Claude", 529, "overloaded")));
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BriefError::upstream("Claude", 500, "script exhausted")))
    }
}

/// Echoes each chunk back as `[chunk]` bytes.
#[derive(Default)]
pub struct EchoSpeech {
    chunks: Mutex<Vec<String>>,
    fail_with: Option<u16>,
}

impl EchoSpeech {
    pub fn failing(status: u16) -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            fail_with: Some(status),
        }
    }

    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for EchoSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.chunks.lock().unwrap().push(text.to_string());
        match self.fail_with {
            Some(status) => Err(BriefError::upstream("Deepgram", status, "bad voice")),
            None => Ok(format!("[{text}]").into_bytes()),
        }
    }
}
