use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use questboard_core::QuestModel;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::AuthState;
use crate::config::{normalize_model, LlmSection};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "openai-compatible" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("unknown llm provider '{other}' (expected openai or anthropic)"),
        }
    }
}

/// Quest model backed by a hosted chat-completion API.
pub struct HttpQuestModel {
    provider: Provider,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    api_key: String,
    client: reqwest::Client,
}

impl HttpQuestModel {
    pub fn from_config(llm: &LlmSection, auth: &AuthState) -> Result<Self> {
        let provider = Provider::parse(&llm.provider)?;
        let api_key = match provider {
            Provider::OpenAI => auth.openai_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("missing openai_api_key; run: questboard auth paste-openai-api-key")
            })?,
            Provider::Anthropic => auth.anthropic_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "missing anthropic_api_key; run: questboard auth paste-anthropic-api-key"
                )
            })?,
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build http client")?;

        Ok(Self {
            provider,
            model: normalize_model(&llm.model),
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            api_key,
            client,
        })
    }

    pub fn describe(&self) -> String {
        format!("{:?} {}", self.provider, self.model)
    }

    async fn openai_complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = openai_request(&self.model, system, prompt, self.temperature, self.max_tokens);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: OaiResp = resp.json().await.context("parse openai response")?;
        Ok(openai_text(out))
    }

    async fn anthropic_complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = AnthropicReq {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages: vec![Msg {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: AnthropicResp = resp.json().await.context("parse anthropic response")?;
        Ok(anthropic_text(out))
    }
}

#[async_trait]
impl QuestModel for HttpQuestModel {
    async fn suggest(&self, instructions: &str, prompt: &str) -> Result<String> {
        tracing::debug!(provider = ?self.provider, model = %self.model, "requesting quest suggestion");
        match self.provider {
            Provider::OpenAI => self.openai_complete(instructions, prompt).await,
            Provider::Anthropic => self.anthropic_complete(instructions, prompt).await,
        }
    }
}

#[derive(Debug, Serialize)]
struct Msg {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    t: &'static str,
}

#[derive(Debug, Serialize)]
struct OaiReq {
    model: String,
    messages: Vec<Msg>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct OaiResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MsgOut,
}

#[derive(Deserialize)]
struct MsgOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicReq {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Msg>,
}

#[derive(Deserialize)]
struct AnthropicResp {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    t: String,
    text: Option<String>,
}

fn openai_request(model: &str, system: &str, prompt: &str, temperature: f32, max_tokens: u32) -> OaiReq {
    OaiReq {
        model: model.to_string(),
        messages: vec![
            Msg {
                role: "system".to_string(),
                content: system.to_string(),
            },
            Msg {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ],
        temperature,
        max_tokens,
        response_format: ResponseFormat { t: "json_object" },
    }
}

fn openai_text(out: OaiResp) -> String {
    out.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn anthropic_text(out: AnthropicResp) -> String {
    let mut s = String::new();
    for b in out.content {
        if b.t == "text" {
            if let Some(t) = b.text {
                s.push_str(&t);
            }
        }
    }
    s.trim().to_string()
}
