// Analyzer: asks the local inference service to comment on a pending
// request. A small blocking client, one POST per analysis, no retries.

use crate::config::Config;
use crate::error::{AssistantError, Result};
use crate::request::{AnalysisResult, RequestSpec};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Body of `POST /api/generate`.
#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// The only field we read back from the service. Anything else in the
/// payload (timings, context tokens) is ignored.
#[derive(Deserialize, Debug)]
struct GenerateResponse {
    response: String,
}

/// Holds a reqwest blocking client, the generation endpoint and the model
/// name chosen at startup.
#[derive(Clone)]
pub struct Analyzer {
    client: Client,
    endpoint: String,
    model: String,
}

impl Analyzer {
    /// The client gets the configured analysis timeout; with none set, a
    /// slow model blocks until it answers.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.analysis_timeout)
            .build()
            .map_err(AssistantError::ClientBuild)?;
        Ok(Analyzer {
            client,
            endpoint: config.generate_url(),
            model: config.model.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn analyze(&self, spec: &RequestSpec) -> Result<AnalysisResult> {
        let prompt = build_prompt(spec);
        let analysis_text = self.generate(&prompt)?;
        Ok(AnalysisResult { analysis_text })
    }

    /// Send one prompt and return the model's reply verbatim.
    fn generate(&self, prompt: &str) -> Result<String> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        info!(endpoint = %self.endpoint, model = %self.model, "requesting analysis");

        let res = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .map_err(|source| AssistantError::ServiceUnreachable {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            return Err(AssistantError::ServiceStatus { status, body });
        }

        let reply: GenerateResponse = res.json().map_err(AssistantError::ServiceResponse)?;
        debug!(chars = reply.response.len(), "analysis received");
        Ok(reply.response)
    }
}

/// Render the fixed analysis prompt. Missing content type or body render as
/// empty strings.
pub fn build_prompt(spec: &RequestSpec) -> String {
    format!(
        "As an assistant specialised in building HTTP requests, I will help you analyse this request.\n\
         \n\
         The request parameters are:\n\
         - URL: {url}\n\
         - Method: {method}\n\
         - Content-Type: {content_type}\n\
         - Data: {data}\n\
         \n\
         Analyse these parameters and give relevant information about the request.\n",
        url = spec.url,
        method = spec.method,
        content_type = spec.content_type.as_deref().unwrap_or(""),
        data = spec.body.as_deref().unwrap_or(""),
    )
}
