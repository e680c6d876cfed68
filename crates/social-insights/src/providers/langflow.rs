//! Langflow run API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::{Error, Result};

use super::workflow::WorkflowClient;

/// Client for one Langflow flow endpoint
pub struct LangflowClient {
    client: Client,
    run_url: String,
    token: String,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    input_value: &'a str,
    output_type: &'a str,
    input_type: &'a str,
}

impl<'a> RunRequest<'a> {
    fn chat(message: &'a str) -> Self {
        Self {
            input_value: message,
            output_type: "chat",
            input_type: "chat",
        }
    }
}

impl LangflowClient {
    /// Create a client for the configured flow
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            run_url: config.run_url(),
            token: config.application_token.clone(),
        })
    }

    pub fn run_url(&self) -> &str {
        &self.run_url
    }
}

#[async_trait]
impl WorkflowClient for LangflowClient {
    async fn run(&self, message: &str) -> Result<Value> {
        tracing::debug!("Running flow at {}", self.run_url);

        let response = self
            .client
            .post(&self.run_url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .json(&RunRequest::chat(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::workflow(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        Ok(response.json().await?)
    }

    fn name(&self) -> &str {
        "langflow"
    }
}
