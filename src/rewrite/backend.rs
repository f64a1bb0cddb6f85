//! Remote text-generation backends.
//!
//! Two API shapes are supported behind one trait: the watsonx generation
//! endpoint and the Hugging Face inference endpoint. Both return plain
//! generated text; responses are untrusted and validated non-empty before
//! they reach the pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{HuggingFaceConfig, RewriteConfig, RewriteService, WatsonxConfig};
use crate::{Error, Result};

/// Sampling and length controls for one generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub max_length: u32,
    pub temperature: f64,
}

impl GenerationParams {
    /// Tone rewriting favors faithful, bounded output.
    pub fn rewrite() -> Self {
        Self {
            max_length: 500,
            temperature: 0.7,
        }
    }

    /// Narration scripts run longer and a little looser.
    pub fn narration() -> Self {
        Self {
            max_length: 600,
            temperature: 0.8,
        }
    }
}

/// One remote generation service.
///
/// Object-safe so the processor and narrator can share a single
/// `Arc<dyn RewriteBackend>` selected at engine construction.
#[async_trait]
pub trait RewriteBackend: Send + Sync {
    /// Service identifier for logs and status reports.
    fn id(&self) -> &'static str;

    /// Whether credentials allow remote calls at all.
    fn is_configured(&self) -> bool;

    /// One generation attempt. `Ok` values are non-empty and trimmed.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

/// Factory selecting the backend named by the configuration.
pub fn backend_from_config(config: &RewriteConfig) -> Result<Arc<dyn RewriteBackend>> {
    let timeout = config.retry.attempt_timeout;
    match config.service {
        RewriteService::Watsonx => Ok(Arc::new(WatsonxBackend::new(
            config.watsonx.clone(),
            timeout,
        )?)),
        RewriteService::HuggingFace => Ok(Arc::new(HuggingFaceBackend::new(
            config.hugging_face.clone(),
            timeout,
        )?)),
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::configuration(format!("failed to create HTTP client: {}", e)))
}

/// Cap error bodies carried into logs.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

/// watsonx text-generation backend.
pub struct WatsonxBackend {
    http: reqwest::Client,
    config: WatsonxConfig,
}

impl WatsonxBackend {
    pub fn new(config: WatsonxConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            config,
        })
    }
}

#[async_trait]
impl RewriteBackend for WatsonxBackend {
    fn id(&self) -> &'static str {
        "watsonx"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let body = serde_json::json!({
            "model_id": self.config.model_id,
            "input": prompt,
            "parameters": {
                "decoding_method": "greedy",
                "max_new_tokens": params.max_length,
                "min_new_tokens": 0,
                "repetition_penalty": 1.0,
            },
            "project_id": self.config.project_id,
        });

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::service_status(
                "watsonx",
                status.as_u16(),
                truncate_body(&text),
            ));
        }

        let json: Value = response.json().await?;
        let generated = json
            .pointer("/results/0/generated_text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        if generated.is_empty() {
            return Err(Error::service("watsonx", "empty generation result"));
        }
        Ok(generated)
    }
}

/// Hugging Face inference backend.
pub struct HuggingFaceBackend {
    http: reqwest::Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceBackend {
    pub fn new(config: HuggingFaceConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl RewriteBackend for HuggingFaceBackend {
    fn id(&self) -> &'static str {
        "huggingface"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "max_length": params.max_length,
                "temperature": params.temperature,
                "do_sample": true,
                "return_full_text": false,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::service_status(
                "huggingface",
                status.as_u16(),
                truncate_body(&text),
            ));
        }

        // The inference API answers with either `[{"generated_text": ...}]`
        // or a bare `{"generated_text": ...}` object.
        let json: Value = response.json().await?;
        let generated = match &json {
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("generated_text"))
                .and_then(|v| v.as_str()),
            Value::Object(_) => json.get("generated_text").and_then(|v| v.as_str()),
            _ => None,
        }
        .unwrap_or_default()
        .trim()
        .to_string();

        if generated.is_empty() {
            return Err(Error::service("huggingface", "empty generation result"));
        }
        Ok(generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watsonx_config(url: String) -> WatsonxConfig {
        WatsonxConfig {
            api_key: "test-key".to_string(),
            api_url: url,
            project_id: "test-project".to_string(),
            model_id: "ibm/granite-13b-instruct-v2".to_string(),
        }
    }

    fn hf_config(url: String) -> HuggingFaceConfig {
        HuggingFaceConfig {
            api_key: "test-key".to_string(),
            api_url: url,
            model: "microsoft/DialoGPT-medium".to_string(),
        }
    }

    #[tokio::test]
    async fn watsonx_extracts_first_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(r#"{"results":[{"generated_text":"  A calm rewrite.  "}]}"#)
            .create_async()
            .await;

        let backend =
            WatsonxBackend::new(watsonx_config(server.url()), Duration::from_secs(5)).unwrap();
        let text = backend
            .generate("prompt", &GenerationParams::rewrite())
            .await
            .unwrap();
        assert_eq!(text, "A calm rewrite.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn watsonx_http_error_is_service_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let backend =
            WatsonxBackend::new(watsonx_config(server.url()), Duration::from_secs(5)).unwrap();
        let err = backend
            .generate("prompt", &GenerationParams::rewrite())
            .await
            .unwrap_err();
        match err {
            Error::Service { service, status, .. } => {
                assert_eq!(service, "watsonx");
                assert_eq!(status, Some(500));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn watsonx_empty_result_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"results":[{"generated_text":"   "}]}"#)
            .create_async()
            .await;

        let backend =
            WatsonxBackend::new(watsonx_config(server.url()), Duration::from_secs(5)).unwrap();
        assert!(backend
            .generate("prompt", &GenerationParams::rewrite())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn huggingface_parses_list_shape() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/microsoft/DialoGPT-medium")
            .with_status(200)
            .with_body(r#"[{"generated_text":"list shaped"}]"#)
            .create_async()
            .await;

        let backend =
            HuggingFaceBackend::new(hf_config(server.url()), Duration::from_secs(5)).unwrap();
        let text = backend
            .generate("prompt", &GenerationParams::rewrite())
            .await
            .unwrap();
        assert_eq!(text, "list shaped");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn huggingface_parses_dict_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/microsoft/DialoGPT-medium")
            .with_status(200)
            .with_body(r#"{"generated_text":"dict shaped"}"#)
            .create_async()
            .await;

        let backend =
            HuggingFaceBackend::new(hf_config(server.url()), Duration::from_secs(5)).unwrap();
        let text = backend
            .generate("prompt", &GenerationParams::rewrite())
            .await
            .unwrap();
        assert_eq!(text, "dict shaped");
    }

    #[test]
    fn factory_honors_service_selection() {
        let mut config = RewriteConfig::default();
        config.service = RewriteService::Watsonx;
        let backend = backend_from_config(&config).unwrap();
        assert_eq!(backend.id(), "watsonx");

        config.service = RewriteService::HuggingFace;
        let backend = backend_from_config(&config).unwrap();
        assert_eq!(backend.id(), "huggingface");
    }
}
