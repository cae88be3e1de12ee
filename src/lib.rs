//! Async client for OpenAI assistants: fetch an assistant, open a thread,
//! post messages, trigger runs and wait for them to finish.
use serde::Deserialize;

pub mod assistants;
pub mod client;
pub mod config;
pub mod session;
pub mod text;

pub use assistants::runs::PollOptions;
pub use client::OpenAiClient;
pub use session::{ChatSession, Reply};
pub use text::{add, remove_newlines, strip_citations};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenAiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

impl OpenAiError {
    pub fn new(message: String, error_type: String) -> OpenAiError {
        OpenAiError {
            message,
            error_type,
            param: None,
            code: None,
        }
    }

    /// Raised by the run poller when its deadline or attempt cap is hit.
    pub fn timeout(message: String) -> OpenAiError {
        OpenAiError::new(message, "timeout".to_string())
    }

    pub fn is_timeout(&self) -> bool {
        self.error_type == "timeout"
    }
}

impl std::fmt::Display for OpenAiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OpenAiError {}

impl From<reqwest::Error> for OpenAiError {
    fn from(value: reqwest::Error) -> Self {
        let error_type = if value.is_decode() {
            "decode"
        } else {
            "transport"
        };
        OpenAiError::new(value.to_string(), error_type.to_string())
    }
}

pub type ApiResponseOrError<T> = Result<T, OpenAiError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Creates credentials with the given API key and base URL.
    ///
    /// A trailing `/` is appended to the base URL if it is missing, since
    /// routes are joined onto it directly.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            api_key: api_key.into(),
            base_url,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
