//! AI Assistant Capability
//!
//! The session only needs one thing from an AI provider: given a system
//! context and a user prompt, return the assistant's text. `Assistant` is that
//! capability; `AssistantClient` implements it with one variant per provider,
//! chosen once at construction from the configuration.
//!
//! # Providers
//! - `Ollama`: local `/api/generate` endpoint
//! - `Azure`: Azure AI inference chat-completions endpoint (GitHub Models)
//! - `OpenAi`: OpenAI-compatible chat-completions endpoint

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::{AiSettings, ModelOptions, ProviderKind};
use crate::error::{NlQueryError, Result};

/// Default Ollama endpoint when neither config nor `OLLAMA_API_BASE` set one
const DEFAULT_OLLAMA_BASE: &str = "http://127.0.0.1:11434";

/// Default OpenAI API base URL
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Default Azure AI inference endpoint
const DEFAULT_AZURE_ENDPOINT: &str = "https://models.inference.ai.azure.com";

/// Default environment variable holding the Azure key
const DEFAULT_AZURE_KEY_ENV: &str = "GITHUB_TOKEN";

/// Default environment variable holding the OpenAI key
const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// HTTP timeout for a single completion
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Completion capability consumed by the session
pub trait Assistant {
    /// Ask the assistant `prompt` with `system_context` as the system message
    fn complete(
        &self,
        system_context: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Provider-specific client, selected at construction
#[derive(Debug, Clone)]
pub enum AssistantClient {
    /// Local Ollama server
    Ollama {
        http: reqwest::Client,
        base_url: String,
        model: String,
        options: ModelOptions,
    },
    /// Azure AI inference (chat completions)
    Azure {
        http: reqwest::Client,
        endpoint: String,
        api_key: String,
        model: String,
        options: ModelOptions,
    },
    /// OpenAI-compatible chat completions
    OpenAi {
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
        options: ModelOptions,
    },
}

impl AssistantClient {
    /// Build the client for the configured provider
    ///
    /// Fails with `ConfigError` when the provider section or its API key is missing.
    pub fn from_settings(settings: &AiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NlQueryError::config_error(format!("Could not create HTTP client: {e}")))?;
        let options = settings.options.clone();

        match settings.provider {
            ProviderKind::Ollama => {
                let section = settings.ollama.clone().unwrap_or_default();
                let base_url = section
                    .base_url
                    .or_else(|| std::env::var("OLLAMA_API_BASE").ok())
                    .unwrap_or_else(|| DEFAULT_OLLAMA_BASE.to_string());
                let model = required_model(section.model, "ollama")?;
                Ok(Self::Ollama { http, base_url: trim_slash(base_url), model, options })
            }
            ProviderKind::Azure => {
                let section = settings.azure.clone().unwrap_or_default();
                let key_env = section.api_key_env.unwrap_or_else(|| DEFAULT_AZURE_KEY_ENV.to_string());
                let api_key = api_key_from_env(&key_env, "azure")?;
                let endpoint = section.endpoint.unwrap_or_else(|| DEFAULT_AZURE_ENDPOINT.to_string());
                let model = required_model(section.model, "azure")?;
                Ok(Self::Azure { http, endpoint: trim_slash(endpoint), api_key, model, options })
            }
            ProviderKind::OpenAi => {
                let section = settings.openai.clone().unwrap_or_default();
                let key_env = section.api_key_env.unwrap_or_else(|| DEFAULT_OPENAI_KEY_ENV.to_string());
                let api_key = api_key_from_env(&key_env, "openai")?;
                let base_url = section.base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string());
                let model = required_model(section.model, "openai")?;
                Ok(Self::OpenAi { http, base_url: trim_slash(base_url), api_key, model, options })
            }
        }
    }

    /// Provider name for banners and logs
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        match self {
            Self::Ollama { .. } => "ollama",
            Self::Azure { .. } => "azure",
            Self::OpenAi { .. } => "openai",
        }
    }

    /// Model or deployment in use
    #[must_use]
    pub fn model_name(&self) -> &str {
        match self {
            Self::Ollama { model, .. } | Self::Azure { model, .. } | Self::OpenAi { model, .. } => model,
        }
    }
}

impl Assistant for AssistantClient {
    async fn complete(&self, system_context: &str, prompt: &str) -> Result<String> {
        debug!(provider = self.provider_name(), model = self.model_name(), "sending completion request");

        let text = match self {
            Self::Ollama { http, base_url, model, options } => {
                ollama_generate(http, base_url, model, options, system_context, prompt).await?
            }
            Self::Azure { http, endpoint, api_key, model, options } => {
                let url = format!("{endpoint}/chat/completions");
                chat_completion(http, &url, api_key, model, options, system_context, prompt).await?
            }
            Self::OpenAi { http, base_url, api_key, model, options } => {
                let url = format!("{base_url}/chat/completions");
                chat_completion(http, &url, api_key, model, options, system_context, prompt).await?
            }
        };

        if text.trim().is_empty() {
            return Err(NlQueryError::assistant_failed(format!(
                "Empty response from {}",
                self.provider_name()
            )));
        }
        Ok(text)
    }
}

async fn ollama_generate(
    http: &reqwest::Client,
    base_url: &str,
    model: &str,
    options: &ModelOptions,
    system_context: &str,
    prompt: &str,
) -> Result<String> {
    #[derive(Deserialize)]
    struct GenerateResponse {
        response: String,
    }

    let mut ollama_options = serde_json::Map::new();
    if let Some(temperature) = options.temperature {
        ollama_options.insert("temperature".to_string(), temperature.into());
    }
    if let Some(top_p) = options.top_p {
        ollama_options.insert("top_p".to_string(), top_p.into());
    }
    if let Some(max_tokens) = options.max_tokens {
        ollama_options.insert("num_predict".to_string(), max_tokens.into());
    }

    let response = http
        .post(format!("{base_url}/api/generate"))
        .json(&serde_json::json!({
            "model": model,
            "system": system_context,
            "prompt": prompt,
            "options": ollama_options,
            "stream": false
        }))
        .send()
        .await
        .map_err(|e| NlQueryError::assistant_failed(format!("Ollama request failed: {e}")))?;

    let body: GenerateResponse = read_json(response, "Ollama").await?;
    Ok(body.response)
}

async fn chat_completion(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    options: &ModelOptions,
    system_context: &str,
    prompt: &str,
) -> Result<String> {
    #[derive(Deserialize)]
    struct Message {
        content: Option<String>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: Message,
    }
    #[derive(Deserialize)]
    struct ChatResponse {
        choices: Vec<Choice>,
    }

    let mut body = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system_context},
            {"role": "user", "content": prompt}
        ]
    });
    if let Some(temperature) = options.temperature {
        body["temperature"] = temperature.into();
    }
    if let Some(top_p) = options.top_p {
        body["top_p"] = top_p.into();
    }
    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = max_tokens.into();
    }

    let response = http
        .post(url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| NlQueryError::assistant_failed(format!("Chat completion request failed: {e}")))?;

    let parsed: ChatResponse = read_json(response, "Chat completion").await?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| NlQueryError::assistant_failed("Chat completion returned no choices"))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NlQueryError::assistant_failed(format!("{what} API error {status}: {body}")));
    }

    response
        .json()
        .await
        .map_err(|e| NlQueryError::assistant_failed(format!("{what} returned an unexpected body: {e}")))
}

fn required_model(model: Option<String>, provider: &str) -> Result<String> {
    model.filter(|m| !m.trim().is_empty()).ok_or_else(|| {
        NlQueryError::config_error(format!("ai.{provider}.model must be set for the {provider} provider"))
    })
}

fn api_key_from_env(var: &str, provider: &str) -> Result<String> {
    std::env::var(var).map_err(|_| {
        NlQueryError::config_error(format!(
            "Environment variable {var} not found for the {provider} API key"
        ))
    })
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
