// Error taxonomy shared by the analyzer, the executor and the terminal loop.
// Each step hands back a tagged `AssistantError` and the loop decides what
// to do with it: print and continue, or stop.

use std::io;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Inference service at {endpoint} is unreachable: {source}")]
    ServiceUnreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Inference service returned {status}: {body}")]
    ServiceStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unexpected response from inference service: {0}")]
    ServiceResponse(#[source] reqwest::Error),

    #[error("Request body is not valid JSON: {0}")]
    MalformedJsonBody(#[from] serde_json::Error),

    #[error("`{program}` timed out after {} seconds", .timeout.as_secs_f32())]
    Timeout { program: String, timeout: Duration },

    #[error("Failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Host `{0}` is not in the allowed host list")]
    HostNotAllowed(String),

    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Terminal input failed: {0}")]
    Prompt(#[source] io::Error),

    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AssistantError {
    /// Classify an error coming out of a `dialoguer` prompt. Ctrl-C at a
    /// prompt surfaces as `ErrorKind::Interrupted`.
    pub fn from_prompt(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            AssistantError::Interrupted
        } else {
            AssistantError::Prompt(err)
        }
    }

    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            AssistantError::ServiceUnreachable { .. }
                | AssistantError::ServiceStatus { .. }
                | AssistantError::ServiceResponse(_)
        )
    }
}
