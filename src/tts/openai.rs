//! OpenAI text-to-speech API client.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Result, TtsError};
use crate::config::mask_api_key;

const API_BASE: &str = "https://api.openai.com/v1";
const TTS_MODEL: &str = "tts-1";

/// Client for the OpenAI `/v1/audio/speech` endpoint.
pub struct OpenAiSpeech {
    client: Client,
    api_key: String,
    voice: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiSpeech {
    pub fn new(api_key: String, voice: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            voice,
        }
    }

    /// Synthesize one chunk of text, returning MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: TTS_MODEL,
            voice: &self.voice,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", API_BASE))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => error_text,
            };
            return Err(TtsError::Api {
                message: self.mask_key_in(&message),
                status_code: Some(status.as_u16()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Upstream errors sometimes echo the key back; never surface it
    /// verbatim.
    fn mask_key_in(&self, message: &str) -> String {
        if !self.api_key.is_empty() && message.contains(&self.api_key) {
            message.replace(&self.api_key, &mask_api_key(&self.api_key))
        } else {
            message.to_string()
        }
    }
}
