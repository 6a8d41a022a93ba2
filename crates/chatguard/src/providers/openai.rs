use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::base::{CompletionRequest, Credential, Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    get_usage, messages_to_openai_spec, openai_error_message, openai_response_to_message,
};
use crate::errors::{ChatError, ChatResult};
use crate::models::message::Message;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> ChatResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Unclassified(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn post(&self, credential: &Credential, payload: &Value) -> ChatResult<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .json(payload)
            .send()
            .await
            .map_err(|e| ChatError::Provider(format!("connection failed: {}", e)))?;

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if let Some(error) = body.as_ref().and_then(|b| b.get("error")) {
            return Err(ChatError::Provider(format!(
                "{}: {}",
                status,
                openai_error_message(error)
            )));
        }
        if !status.is_success() {
            return Err(ChatError::Provider(format!("request failed: {}", status)));
        }

        body.ok_or_else(|| ChatError::Unclassified("response body was not valid JSON".into()))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest<'_>,
    ) -> ChatResult<(Message, Usage)> {
        let payload = json!({
            "model": request.model.identifier,
            "messages": messages_to_openai_spec(request.messages),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens(),
        });

        tracing::debug!(
            model = %request.model.identifier,
            messages = request.messages.len(),
            "sending completion request"
        );
        let response = self.post(credential, &payload).await?;

        let message = openai_response_to_message(&response)?;
        let usage = get_usage(&response);

        Ok((message, usage))
    }
}
