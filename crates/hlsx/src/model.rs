use crate::prelude::*;
use hlsx_core::config::Provider;
use hlsx_core::model::{first_completion_text, ChatCompletionRequest, ChatCompletionResponse, ModelRequest};
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Anything that turns a prompt into the text of a single completion.
#[allow(async_fn_in_trait)]
pub trait ModelInvoker {
    async fn complete(&self, request: &ModelRequest) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hlsx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl ModelInvoker for OpenAiChat {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatCompletionRequest::from(request))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("{} returned {}: {}", url, status, body)).into());
        }

        let body = response
            .json::<ChatCompletionResponse>()
            .await
            .context("Failed to parse chat completion response")?;

        first_completion_text(body)
            .ok_or_else(|| Error::Model("response contained no completion".to_string()).into())
    }
}

/// Local models served by Ollama.
pub struct OllamaChat {
    client: ollama::Client,
}

impl OllamaChat {
    pub fn new(base_url: &str) -> Result<Self> {
        use rig::client::Nothing;

        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| eyre!("Failed to create Ollama client: {}", e))?;

        Ok(Self { client })
    }
}

impl ModelInvoker for OllamaChat {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        let agent = self
            .client
            .agent(&request.model)
            .temperature(request.temperature)
            .build();

        agent
            .prompt(&request.prompt)
            .await
            .map_err(|e| Error::Model(e.to_string()).into())
    }
}

/// The configured model provider.
pub enum Backend {
    OpenAi(OpenAiChat),
    Ollama(OllamaChat),
}

impl Backend {
    pub fn connect(provider: Provider, base_url: Option<&str>) -> Result<Self> {
        match provider {
            Provider::OpenAi => {
                let api_key = crate::config::openai_api_key()?;
                Ok(Backend::OpenAi(OpenAiChat::new(
                    base_url.unwrap_or(OPENAI_BASE_URL),
                    api_key,
                )?))
            }
            Provider::Ollama => Ok(Backend::Ollama(OllamaChat::new(
                base_url.unwrap_or(OLLAMA_BASE_URL),
            )?)),
        }
    }
}

impl ModelInvoker for Backend {
    async fn complete(&self, request: &ModelRequest) -> Result<String> {
        match self {
            Backend::OpenAi(chat) => chat.complete(request).await,
            Backend::Ollama(chat) => chat.complete(request).await,
        }
    }
}
