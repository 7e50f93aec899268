//! Chat assistant backed by an OpenAI-compatible completion API.
//!
//! The assistant never sees raw records. Each question travels with a small
//! digest of the currently filtered data, a short window of conversation
//! history, and the question itself.

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::aggregate;
use crate::data::model::CatchDataset;
use crate::format::thousands;

/// How many previous turns ride along with a new question.
pub const HISTORY_WINDOW: usize = 5;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DIGEST_TOP_GROUPS: usize = 3;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Completion response carried no choices")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Conversation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Chat history for the side panel. Turns accumulate until cleared; only
/// the trailing [`HISTORY_WINDOW`] travel with each request.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn recent(&self, window: usize) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(window);
        &self.turns[start..]
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Digest of the filtered data
// ---------------------------------------------------------------------------

/// What the assistant is told about the current dashboard selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDigest {
    pub total_weight_kg: f64,
    pub total_value: f64,
    /// (first, last) landing year in the selection.
    pub period: Option<(i32, i32)>,
    pub top_species: Vec<String>,
    pub top_gears: Vec<String>,
}

impl DataDigest {
    pub fn from_filtered(ds: &CatchDataset, idx: &[usize]) -> Self {
        let stats = aggregate::headline_stats(ds, idx);
        let mut period: Option<(i32, i32)> = None;
        for year in idx.iter().filter_map(|&i| ds.records[i].year) {
            period = Some(match period {
                Some((min, max)) => (min.min(year), max.max(year)),
                None => (year, year),
            });
        }
        let names = |ranked: Vec<(String, f64)>| -> Vec<String> {
            ranked.into_iter().map(|(name, _)| name).collect()
        };
        DataDigest {
            total_weight_kg: stats.total_weight_kg,
            total_value: stats.total_value,
            period,
            top_species: names(aggregate::top_species(ds, idx, DIGEST_TOP_GROUPS)),
            top_gears: names(aggregate::top_gears(ds, idx, DIGEST_TOP_GROUPS)),
        }
    }

    fn system_prompt(&self) -> String {
        let period = match self.period {
            Some((first, last)) => format!("{first} to {last}"),
            None => "-".to_string(),
        };
        format!(
            "You are an expert fishing data analyst assistant. Analyze the fishing data \
             dashboard and provide insights based on the following context:\n\n\
             Current Dashboard Data:\n\
             - Total Tangkapan: {} Kg\n\
             - Nilai Produksi: {} IDR\n\
             - Time Period: {}\n\
             - Top 3 Jenis Ikan: {}\n\
             - Top 3 Alat Tangkap: {}\n\n\
             Provide concise, data-driven answers in Bahasa Indonesia. Focus on trends, \
             patterns, and insights from the data.",
            thousands(self.total_weight_kg, 2),
            thousands(self.total_value, 2),
            period,
            self.top_species.join(", "),
            self.top_gears.join(", "),
        )
    }
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AdvisorConfig {
    /// Reads `OPENAI_API_KEY` (required), `SISTOK_CHAT_BASE_URL`, and
    /// `SISTOK_CHAT_MODEL`.
    pub fn from_env() -> Result<Self, AdvisorError> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| AdvisorError::MissingApiKey)?;
        Ok(AdvisorConfig {
            api_key,
            base_url: env::var("SISTOK_CHAT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: env::var("SISTOK_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct AdvisorClient {
    http: reqwest::blocking::Client,
    config: AdvisorConfig,
}

impl AdvisorClient {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        // The call blocks its interaction until the service answers; no
        // retry and no deadline (reqwest would otherwise impose 30 s).
        let http = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()?;
        Ok(AdvisorClient { http, config })
    }

    pub fn from_env() -> Result<Self, AdvisorError> {
        AdvisorClient::new(AdvisorConfig::from_env()?)
    }

    /// Sends one question and returns the assistant's reply.
    ///
    /// The request carries the digest as system prompt, the trailing
    /// [`HISTORY_WINDOW`] turns of `session` as recorded before this
    /// question, and the question itself as the final user message.
    pub fn ask(
        &self,
        question: &str,
        digest: &DataDigest,
        session: &ChatSession,
    ) -> Result<String, AdvisorError> {
        let system = digest.system_prompt();
        let messages = build_messages(&system, session.recent(HISTORY_WINDOW), question);
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: 0.7,
            max_tokens: 500,
        };
        log::info!("Asking {} via {url}", self.config.model);
        let response: CompletionResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AdvisorError::EmptyResponse)
    }
}

fn build_messages<'a>(
    system: &'a str,
    history: &'a [ChatTurn],
    question: &'a str,
) -> Vec<WireMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage {
        role: "system",
        content: system,
    });
    for turn in history {
        messages.push(WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        });
    }
    messages.push(WireMessage {
        role: "user",
        content: question,
    });
    messages
}
