use clap::Parser;
use std::time::Duration;

use crate::{assistants::runs::PollOptions, Credentials, DEFAULT_BASE_URL};

/// Chat with an existing OpenAI assistant from the terminal.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "openai-assistant", version)]
pub struct ChatConfig {
    /// ID of the assistant to talk to.
    #[arg(long, env = "OPENAI_ASSISTANT_ID")]
    pub assistant_id: String,

    #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Delay between run status checks.
    #[arg(long, env = "OPENAI_POLL_INTERVAL_MS", default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Give up on a run after this many seconds. Waits forever when unset.
    #[arg(long, env = "OPENAI_POLL_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Persona sent with every run, replacing the assistant's stored instructions.
    #[arg(long, env = "OPENAI_ASSISTANT_INSTRUCTIONS")]
    pub instructions: Option<String>,

    /// Line printed once before the first prompt.
    #[arg(long, env = "OPENAI_ASSISTANT_GREETING")]
    pub greeting: Option<String>,

    /// Print each reply on a single line.
    #[arg(long)]
    pub single_line: bool,
}

impl ChatConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.as_str(), self.base_url.as_str())
    }

    pub fn poll_options(&self) -> PollOptions {
        let options = PollOptions::default().interval(Duration::from_millis(self.poll_interval_ms));
        match self.timeout_secs {
            Some(secs) => options.timeout(Duration::from_secs(secs)),
            None => options,
        }
    }
}
