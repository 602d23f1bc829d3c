use thiserror::Error;

/// How much of an upstream error body is kept in the error message.
pub const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("{var} not found. {hint}")]
    MissingCredential { var: &'static str, hint: String },

    #[error("HTTP request to {service} failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} API error ({status}): {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{stage} is not valid JSON: {source}")]
    MalformedJson {
        stage: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} does not match the expected schema: {detail}")]
    SchemaMismatch { stage: &'static str, detail: String },

    /// Our own data failed to serialize; never a model reply.
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("narration must have {expected} sections in order; {detail}")]
    NarrationMismatch { expected: usize, detail: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BriefError {
    /// Build an `Upstream` error, keeping only the head of the response body.
    pub fn upstream(service: &'static str, status: u16, body: &str) -> Self {
        Self::Upstream {
            service,
            status,
            body: body.chars().take(BODY_EXCERPT_CHARS).collect(),
        }
    }

    pub fn serialize(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Serialize { what, source }
    }

    pub fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BriefError>;
