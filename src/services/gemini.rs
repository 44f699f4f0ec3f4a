use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::design::{DesignParams, DesignSuggestions};
use crate::services::prompt;

const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Wrapper around the Google Gemini generateContent endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
}

fn truncate_for_log(text: &str) -> String {
    text.chars().take(120).collect()
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    async fn generate(&self, parts: Value) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, GEMINI_MODEL, self.api_key
        );
        let body = json!({ "contents": [{ "parts": parts }] });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("Gemini response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = payload["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AppError::AiGatewayError(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::AiGatewayError("Gemini reply had no text".to_string()))
    }

    /// Vision analysis of an uploaded photo. Errors propagate; the route
    /// turns them into a 500.
    pub async fn analyze_image(&self, image: &[u8], mime: &str) -> Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        info!(action = "gemini_vision", model = GEMINI_MODEL, bytes = image.len());
        let parts = json!([
            {"text": "Analyze this photo for a remodeling consultation. Identify \
                the space, visible materials, and concrete improvement \
                opportunities for a custom carpentry studio."},
            {"inline_data": {"mime_type": mime, "data": general_purpose::STANDARD.encode(image)}}
        ]);
        self.generate(parts).await
    }

    /// Design suggestions for a parameter set. Degrades to canned
    /// suggestions instead of failing the flow.
    pub async fn design_suggestions(&self, params: &DesignParams) -> DesignSuggestions {
        let text = prompt::suggestions_prompt(params);
        info!(action = "gemini_suggestions", prompt = %truncate_for_log(&text));
        match self.generate(json!([{ "text": text }])).await {
            Ok(raw) => parse_suggestions(&raw, params),
            Err(e) => {
                warn!(action = "suggestions_fallback", error = %e);
                fallback_suggestions(params)
            }
        }
    }
}

fn fallback_suggestions(params: &DesignParams) -> DesignSuggestions {
    DesignSuggestions {
        description: format!(
            "Propuesta {} para tu {} en {}: líneas limpias y acabados duraderos.",
            params.estilo, params.tipo, params.material
        ),
        style: params.estilo.clone(),
        materials: vec![params.material.clone(), "Vidrio templado".to_string()],
        colors: vec![params.color.clone(), "tonos neutros".to_string()],
        recommendations: vec![
            "Solicita una visita de medición antes de cotizar.".to_string(),
            "Considera herrajes de acero inoxidable para exteriores.".to_string(),
        ],
    }
}

/// Strict JSON first; Gemini often wraps replies in markdown fences, so a
/// fenced block is retried before giving up and using the canned answer.
fn parse_suggestions(raw: &str, params: &DesignParams) -> DesignSuggestions {
    let candidate = strip_code_fence(raw);
    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        let as_list = |key: &str| -> Vec<String> {
            value[key]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default()
        };
        let description = value["description"].as_str();
        let style = value["style"].as_str();
        let materials = as_list("materials");
        let colors = as_list("colors");
        let recommendations = as_list("recommendations");

        if let (Some(description), Some(style)) = (description, style) {
            if !materials.is_empty() {
                return DesignSuggestions {
                    description: description.to_string(),
                    style: style.to_string(),
                    materials,
                    colors,
                    recommendations,
                };
            }
        }
    }
    fallback_suggestions(params)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DesignParams {
        DesignParams {
            tipo: "cocina".to_string(),
            material: "nogal".to_string(),
            color: "oscuro".to_string(),
            estilo: "industrial".to_string(),
            medidas: None,
            extra: None,
        }
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"description\": \"Cocina industrial\", \"style\": \"industrial\", \
                   \"materials\": [\"Nogal\"], \"colors\": [\"oscuro\"], \
                   \"recommendations\": [\"usa granito\"]}\n```";
        let suggestions = parse_suggestions(raw, &params());
        assert_eq!(suggestions.description, "Cocina industrial");
        assert_eq!(suggestions.materials, vec!["Nogal"]);
    }

    #[test]
    fn prose_reply_falls_back() {
        let suggestions = parse_suggestions("I'd suggest walnut with dark tones.", &params());
        assert_eq!(suggestions.style, "industrial");
        assert!(!suggestions.materials.is_empty());
        assert!(!suggestions.recommendations.is_empty());
    }
}
