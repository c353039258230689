// Plain data carried through one iteration of the loop: what the user asked
// for, what the model said about it, and what the HTTP client did.

/// Parameters of a single HTTP request, as entered at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: String,
    /// Always upper-case, e.g. `GET`.
    pub method: String,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl RequestSpec {
    pub fn new(url: impl Into<String>, method: impl AsRef<str>) -> Self {
        RequestSpec {
            url: url.into(),
            method: method.as_ref().trim().to_ascii_uppercase(),
            content_type: None,
            body: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Whether the prompt should ask for a content type and body.
    pub fn method_takes_body(method: &str) -> bool {
        matches!(method, "POST" | "PUT")
    }

    /// The body, if present and not empty.
    pub fn payload(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref() == Some(JSON_CONTENT_TYPE)
    }
}

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Free-text reply of the language model. Never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub analysis_text: String,
}

/// Outcome of one run of the external HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Rendered command line; `None` if the failure happened before it was
    /// assembled.
    pub command: Option<String>,
    /// Response body.
    pub stdout: String,
    /// Verbose diagnostics (request/response headers).
    pub stderr: String,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn failed(command: Option<String>, error: impl ToString) -> Self {
        ExecutionResult {
            success: false,
            command,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}
