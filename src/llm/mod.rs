// DeepSeek advisor: prompt assembly, chat completion, recommendation parsing

pub mod deepseek;
pub mod prompt;
pub mod response;

pub use deepseek::DeepSeekClient;
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use response::{extract_json, parse_advisor_response, AdvisorResponse, Recommendation};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DeepSeek API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("no response from DeepSeek after {0} seconds")]
    Timeout(u64),

    #[error("no choices in API response")]
    EmptyChoices,

    #[error("failed to parse JSON response: {source}\nRaw content: {raw}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },
}
