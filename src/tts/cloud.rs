//! Cloud text-to-speech client.
//!
//! Watson-style synthesize endpoint: POST with the text body, voice id as a
//! query parameter, `audio/mp3` accept header, raw audio bytes back. The
//! response is untrusted; empty bodies count as failures so the retry layer
//! can fall through to the offline engine.

use std::time::Duration;

use crate::config::TtsConfig;
use crate::{Error, Result};

pub struct CloudTtsClient {
    http: reqwest::Client,
    config: TtsConfig,
}

impl CloudTtsClient {
    pub fn new(config: TtsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.retry.attempt_timeout.max(Duration::from_secs(1)))
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/synthesize", self.config.api_url.trim_end_matches('/'))
    }

    /// One synthesis attempt, returning raw MP3 bytes.
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("voice", voice_id)])
            .bearer_auth(&self.config.api_key)
            .header("Accept", "audio/mp3")
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            let detail: String = body.chars().take(300).collect();
            return Err(Error::service_status("cloud_tts", status.as_u16(), detail));
        }
        if bytes.is_empty() {
            return Err(Error::service("cloud_tts", "empty audio response"));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::RetryPolicy;

    fn config(url: String) -> TtsConfig {
        TtsConfig {
            api_key: "tts-key".to_string(),
            api_url: url,
            retry: RetryPolicy::tts_default(),
        }
    }

    #[tokio::test]
    async fn synthesize_returns_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/synthesize")
            .match_query(mockito::Matcher::UrlEncoded(
                "voice".into(),
                "en-US_LisaV3Voice".into(),
            ))
            .match_header("authorization", "Bearer tts-key")
            .match_header("accept", "audio/mp3")
            .with_status(200)
            .with_body(b"ID3fakebytes".to_vec())
            .create_async()
            .await;

        let client = CloudTtsClient::new(config(server.url())).unwrap();
        let bytes = client.synthesize("Hello", "en-US_LisaV3Voice").await.unwrap();
        assert_eq!(bytes, b"ID3fakebytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/synthesize")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = CloudTtsClient::new(config(server.url())).unwrap();
        let err = client.synthesize("Hello", "voice").await.unwrap_err();
        match err {
            Error::Service { service, status, .. } => {
                assert_eq!(service, "cloud_tts");
                assert_eq!(status, Some(403));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/synthesize")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = CloudTtsClient::new(config(server.url())).unwrap();
        assert!(client.synthesize("Hello", "voice").await.is_err());
    }

    #[test]
    fn unconfigured_without_credentials() {
        let client = CloudTtsClient::new(TtsConfig::default()).unwrap();
        assert!(!client.is_configured());
    }
}
