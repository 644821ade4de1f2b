use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::core::scoring::{clamp_score, Scorer};
use crate::models::{MatchResult, Project, User};

/// Errors that can occur when calling the text-completion API
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreReply {
    score: f64,
    #[serde(default)]
    reason: String,
}

/// Scorer backed by an OpenAI-compatible chat-completions endpoint.
///
/// One call per project, temperature 0, bounded by the client timeout. Every
/// failure is absorbed into a zero-score result for that project.
pub struct SemanticScorer {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl std::fmt::Debug for SemanticScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticScorer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl SemanticScorer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SemanticError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SemanticError::MissingConfig("semantic.api_key"));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Prompt combining the student's skills with the project's text
    pub fn build_prompt(student: &User, project: &Project) -> String {
        format!(
            "Assess how well this student fits the research project and reply with JSON only: \
             {{\"score\": <float between 0 and 1>, \"reason\": <short justification>}}. \
             Student skills: {}; Project title: {}; Project description: {}; Project requirements: {}",
            student.skills.join(", "),
            project.title,
            project.description,
            project.requirements.join(", ")
        )
    }

    /// Turn the model's text into `(score, reason)`.
    ///
    /// Well-formed JSON is used as-is (score clipped to `[0, 1]`). Otherwise a
    /// single embedded JSON object is tried, e.g. one wrapped in a code fence.
    /// If nothing parses the score is 0 and the raw text becomes the reason.
    pub fn parse_reply(text: &str) -> (f64, String) {
        let trimmed = text.trim();
        let reply = serde_json::from_str::<ScoreReply>(trimmed).ok().or_else(|| {
            embedded_object(trimmed).and_then(|object| serde_json::from_str::<ScoreReply>(object).ok())
        });

        match reply {
            Some(reply) => (clamp_score(reply.score), reply.reason),
            None => (0.0, trimmed.to_string()),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, SemanticError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SemanticError::ApiError(format!(
                "completion request failed: {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(SemanticError::EmptyResponse)
    }

    async fn score_project(&self, student: &User, project: &Project) -> MatchResult {
        let prompt = Self::build_prompt(student, project);

        let (score, reason) = match self.complete(&prompt).await {
            Ok(text) => Self::parse_reply(&text),
            Err(e) => {
                tracing::warn!(
                    "Semantic scoring failed for student {} / project {}: {}",
                    student.id,
                    project.id,
                    e
                );
                (0.0, format!("semantic scorer unavailable: {}", e))
            }
        };

        MatchResult {
            project: project.clone(),
            score,
            reason: Some(reason),
            matched_skills: Vec::new(),
        }
    }
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[async_trait]
impl Scorer for SemanticScorer {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn score(&self, student: &User, projects: &[Project]) -> Vec<MatchResult> {
        tracing::debug!(
            "Semantic scoring {} projects for student {} with model {}",
            projects.len(),
            student.id,
            self.model
        );

        // One request per project, in flight together; output keeps input order
        join_all(projects.iter().map(|project| self.score_project(student, project))).await
    }
}
