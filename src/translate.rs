//! Translation gateway: validation and provider dispatch around two
//! external translation services.
//!
//! Stateless: provider credentials and endpoints are read from the process
//! environment at call time. One round trip per call, bounded by a fixed
//! per-provider timeout, no retry.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout for the Z.ai chat-completion endpoint.
const ZAI_TIMEOUT: Duration = Duration::from_secs(30);

/// Request timeout for the Google Translate endpoint.
const GOOGLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default Z.ai endpoint when `ZAI_API_URL` is unset.
const ZAI_DEFAULT_URL: &str = "https://api.z.ai/api/paas/v4/chat/completions";

/// Default Z.ai model when `ZAI_MODEL` is unset.
const ZAI_DEFAULT_MODEL: &str = "glm-4.5-flash";

/// Supported translation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Z.ai chat-completion translation.
    Zai,
    /// Unofficial Google Translate endpoint.
    Google,
}

impl Provider {
    /// Parse a provider name; anything unrecognized is rejected before any
    /// network activity.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "zai" => Ok(Provider::Zai),
            "google" => Ok(Provider::Google),
            other => Err(AppError::InvalidProvider(other.to_string())),
        }
    }
}

/// Translation request body.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslateRequest {
    /// Text to translate.
    pub text: String,

    /// Target language code.
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Source language code or "auto".
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Provider name: "zai" or "google".
    #[serde(default = "default_provider")]
    pub provider: String,
}

fn default_target_lang() -> String {
    "id".to_string()
}

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_provider() -> String {
    "zai".to_string()
}

/// Translation response body.
#[derive(Debug, Clone, Serialize)]
pub struct TranslateResponse {
    /// Always true on the success path.
    pub success: bool,
    /// Translated text.
    pub translated: String,
    /// Requested or detected source language.
    pub source_lang: String,
    /// Target language code.
    pub target_lang: String,
    /// Provider that served the request.
    pub provider: String,
}

/// Map a language code to a display name for prompting, passing unknown
/// codes through unchanged.
pub fn language_name(code: &str) -> &str {
    match code {
        "id" => "Indonesian",
        "en" => "English",
        "zh-CN" => "Chinese (Simplified)",
        "ja" => "Japanese",
        "ko" => "Korean",
        "ar" => "Arabic",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "ru" => "Russian",
        "pt" => "Portuguese",
        "it" => "Italian",
        "th" => "Thai",
        "vi" => "Vietnamese",
        other => other,
    }
}

/// Validate the provider and dispatch one translation round trip.
pub async fn translate(req: &TranslateRequest) -> Result<TranslateResponse> {
    match Provider::parse(&req.provider)? {
        Provider::Zai => translate_with_zai(req).await,
        Provider::Google => translate_with_google(req).await,
    }
}

/// Translate through the Z.ai chat-completion API.
async fn translate_with_zai(req: &TranslateRequest) -> Result<TranslateResponse> {
    let api_key = std::env::var("ZAI_API_KEY")
        .map_err(|_| AppError::ConfigMissing("ZAI_API_KEY is not set".into()))?;
    let api_url = std::env::var("ZAI_API_URL").unwrap_or_else(|_| ZAI_DEFAULT_URL.to_string());
    let model = std::env::var("ZAI_MODEL").unwrap_or_else(|_| ZAI_DEFAULT_MODEL.to_string());

    let prompt = format!(
        "Translate the following text to {}. Only provide the translation \
         without any explanations or additional text:\n\n{}",
        language_name(&req.target_lang),
        req.text
    );

    let payload = serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "stream": false,
    });

    let client = reqwest::Client::builder()
        .timeout(ZAI_TIMEOUT)
        .build()
        .map_err(|e| AppError::Translation(e.to_string()))?;

    let response = client
        .post(&api_url)
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await
        .map_err(|e| AppError::Translation(format!("Z.ai request failed: {}", e)))?;

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Translation(format!("Z.ai response unreadable: {}", e)))?;

    let translated = body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| AppError::Translation("Z.ai returned an invalid response format".into()))?;

    Ok(TranslateResponse {
        success: true,
        translated,
        source_lang: req.source_lang.clone(),
        target_lang: req.target_lang.clone(),
        provider: "zai".to_string(),
    })
}

/// Translate through the unofficial Google Translate endpoint.
///
/// Response shape: `[[[translated, original, ...], ...], null, source_lang, ...]`.
async fn translate_with_google(req: &TranslateRequest) -> Result<TranslateResponse> {
    let url = format!(
        "https://translate.googleapis.com/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
        req.source_lang,
        req.target_lang,
        urlencoding::encode(&req.text)
    );

    let client = reqwest::Client::builder()
        .timeout(GOOGLE_TIMEOUT)
        .build()
        .map_err(|e| AppError::Translation(e.to_string()))?;

    let body: serde_json::Value = client
        .get(&url)
        .send()
        .await
        .map_err(|e| AppError::Translation(format!("Google request failed: {}", e)))?
        .json()
        .await
        .map_err(|e| AppError::Translation(format!("Google response unreadable: {}", e)))?;

    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| AppError::Translation("Google returned an invalid response format".into()))?;

    let translated: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|v| v.as_str()))
        .collect();

    if translated.is_empty() {
        return Err(AppError::Translation(
            "Google returned an empty translation".into(),
        ));
    }

    let source_lang = body
        .get(2)
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(TranslateResponse {
        success: true,
        translated,
        source_lang,
        target_lang: req.target_lang.clone(),
        provider: "google".to_string(),
    })
}
