use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::design::{ContainerParams, CostEstimate, CostLine, DesignParams, DesignResult, PoolParams};
use crate::services::prompt;

const CHAT_MODEL: &str = "gpt-4o";
const IMAGE_MODEL: &str = "dall-e-3";

/// Stock photo returned when image generation fails; the flow never
/// surfaces a generation error to the visitor.
const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1600585154340-be6161a56a0c?w=1024&q=80";

static DESCRIPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""description"\s*:\s*"([^"]+)""#).unwrap());
static ESTIMATED_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""estimatedTime"\s*:\s*"([^"]+)""#).unwrap());
static MATERIALS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""materials"\s*:\s*\[([^\]]*)\]"#).unwrap());
static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());

/// Wrapper around the OpenAI chat/image endpoints. One instance per
/// process, constructed from configuration at startup.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
}

fn truncate_for_log(text: &str) -> String {
    text.chars().take(120).collect()
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
        }
    }

    async fn chat(&self, system: &str, user: &str, json_mode: bool) -> Result<String> {
        info!(action = "openai_chat", model = CHAT_MODEL, prompt = %truncate_for_log(user));
        let mut body = json!({
            "model": CHAT_MODEL,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ]
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("OpenAI response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = payload["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AppError::AiGatewayError(format!(
                "OpenAI returned {}: {}",
                status, detail
            )));
        }

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::AiGatewayError("OpenAI reply had no content".to_string()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        info!(action = "openai_image", model = IMAGE_MODEL, prompt = %truncate_for_log(prompt));
        let body = json!({
            "model": IMAGE_MODEL,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024"
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("OpenAI image request failed: {}", e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("OpenAI image response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = payload["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AppError::AiGatewayError(format!(
                "OpenAI returned {}: {}",
                status, detail
            )));
        }

        payload["data"][0]["url"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::AiGatewayError("OpenAI image reply had no url".to_string()))
    }

    /// General-inquiry chat for the public design assistant. Provider
    /// failures propagate; the route turns them into a 500.
    pub async fn design_chat(&self, message: &str) -> Result<String> {
        self.chat(
            "You are the design assistant of Kasa Serena, a custom carpentry \
             and remodeling studio. Answer visitor questions about doors, \
             windows, kitchens, smart containers and modular pools. Be brief \
             and concrete; answer in the language of the question.",
            message,
            false,
        )
        .await
    }

    /// Full design generation: render image plus structured description.
    /// Degrades to canned values instead of failing the flow.
    pub async fn generate_design(&self, params: &DesignParams) -> DesignResult {
        self.generate_with(
            prompt::image_prompt(params),
            prompt::design_prompt(params),
            fallback_design(params),
        )
        .await
    }

    /// Smart Container line: same flow, its own prompt templates.
    pub async fn generate_container_design(&self, params: &ContainerParams) -> DesignResult {
        self.generate_with(
            prompt::container_image_prompt(params),
            prompt::container_prompt(params),
            fallback_container(params),
        )
        .await
    }

    /// Modular Pool line.
    pub async fn generate_pool_design(&self, params: &PoolParams) -> DesignResult {
        self.generate_with(
            prompt::pool_image_prompt(params),
            prompt::pool_prompt(params),
            fallback_pool(params),
        )
        .await
    }

    async fn generate_with(
        &self,
        image_prompt: String,
        detail_prompt: String,
        fallback: DesignDetails,
    ) -> DesignResult {
        let image_url = match self.generate_image(&image_prompt).await {
            Ok(url) => url,
            Err(e) => {
                warn!(action = "design_image_fallback", error = %e);
                FALLBACK_IMAGE_URL.to_string()
            }
        };

        let details = match self
            .chat(
                "You produce strict JSON design briefs for a carpentry studio.",
                &detail_prompt,
                true,
            )
            .await
        {
            Ok(raw) => parse_design_response(&raw, fallback),
            Err(e) => {
                warn!(action = "design_details_fallback", error = %e);
                fallback
            }
        };

        DesignResult {
            image_url,
            description: details.description,
            materials: details.materials,
            estimated_time: details.estimated_time,
        }
    }

    /// Image-only preview generation.
    pub async fn generate_preview(&self, params: &DesignParams) -> String {
        match self.generate_image(&prompt::image_prompt(params)).await {
            Ok(url) => url,
            Err(e) => {
                warn!(action = "preview_fallback", error = %e);
                FALLBACK_IMAGE_URL.to_string()
            }
        }
    }

    /// Cost estimation with canned fallback numbers on provider failure.
    pub async fn estimate_cost(&self, params: &DesignParams) -> CostEstimate {
        match self
            .chat(
                "You produce strict JSON cost estimates for a carpentry studio.",
                &prompt::cost_prompt(params),
                true,
            )
            .await
        {
            Ok(raw) => parse_cost_response(&raw),
            Err(e) => {
                warn!(action = "cost_fallback", error = %e);
                fallback_cost()
            }
        }
    }

    /// Vision analysis of an uploaded reference photo. Errors propagate.
    pub async fn analyze_image(&self, image: &[u8], mime: &str) -> Result<String> {
        use base64::{engine::general_purpose, Engine as _};
        let data_url = format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(image));
        info!(action = "openai_vision", model = CHAT_MODEL, bytes = image.len());

        let body = json!({
            "model": CHAT_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "Analyze this interior/exterior photo for a \
                        remodeling consultation. Identify the space, current materials, and \
                        concrete improvement opportunities the studio could quote."},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]
            }]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("OpenAI vision request failed: {}", e)))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::AiGatewayError(format!("OpenAI vision response unreadable: {}", e)))?;

        if !status.is_success() {
            let detail = payload["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AppError::AiGatewayError(format!(
                "OpenAI returned {}: {}",
                status, detail
            )));
        }

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::AiGatewayError("OpenAI vision reply had no content".to_string()))
    }
}

struct DesignDetails {
    description: String,
    materials: Vec<String>,
    estimated_time: String,
}

fn fallback_container(params: &ContainerParams) -> DesignDetails {
    DesignDetails {
        description: format!(
            "Contenedor inteligente adaptado para {} de {}. Nuestro equipo \
             preparará una propuesta detallada con tu solicitud.",
            params.uso, params.dimensiones
        ),
        materials: vec![
            "Contenedor marítimo reacondicionado".to_string(),
            "Aislamiento térmico".to_string(),
            "Cancelería de aluminio".to_string(),
        ],
        estimated_time: "8-12 semanas".to_string(),
    }
}

fn fallback_pool(params: &PoolParams) -> DesignDetails {
    DesignDetails {
        description: format!(
            "Piscina modular {} de {}. Nuestro equipo preparará una propuesta \
             detallada con tu solicitud.",
            params.forma, params.tamano
        ),
        materials: vec![
            "Estructura modular de acero".to_string(),
            "Liner reforzado".to_string(),
            "Equipo de filtración".to_string(),
        ],
        estimated_time: "6-10 semanas".to_string(),
    }
}

fn fallback_design(params: &DesignParams) -> DesignDetails {
    DesignDetails {
        description: format!(
            "Diseño personalizado de {} en {} con acabado {} de estilo {}. \
             Nuestro equipo preparará una propuesta detallada con tu solicitud.",
            params.tipo, params.material, params.color, params.estilo
        ),
        materials: vec![
            params.material.clone(),
            "Herrajes de acero inoxidable".to_string(),
            "Sellador y acabados".to_string(),
        ],
        estimated_time: "4-6 semanas".to_string(),
    }
}

fn fallback_cost() -> CostEstimate {
    CostEstimate {
        min: 15000.0,
        max: 45000.0,
        currency: "MXN".to_string(),
        breakdown: vec![
            CostLine {
                concepto: "Materiales".to_string(),
                costo: 18000.0,
            },
            CostLine {
                concepto: "Mano de obra".to_string(),
                costo: 9000.0,
            },
            CostLine {
                concepto: "Instalación".to_string(),
                costo: 3000.0,
            },
        ],
        notes: Some("Estimación de referencia; la cotización final depende de medidas y acabados.".to_string()),
    }
}

/// Convert a model reply into design details. Tries strict JSON first,
/// then regex scraping, then the canned fallback. Never fails.
fn parse_design_response(raw: &str, fallback: DesignDetails) -> DesignDetails {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        let description = value["description"].as_str().map(|s| s.to_string());
        let materials: Vec<String> = value["materials"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        let estimated_time = value["estimatedTime"].as_str().map(|s| s.to_string());

        if let (Some(description), Some(estimated_time)) = (description, estimated_time) {
            if !materials.is_empty() {
                return DesignDetails {
                    description,
                    materials,
                    estimated_time,
                };
            }
        }
    }

    // Model wrapped the JSON in prose or markdown; scrape the fields out.
    let description = DESCRIPTION_RE
        .captures(raw)
        .map(|c| c[1].to_string());
    let estimated_time = ESTIMATED_TIME_RE.captures(raw).map(|c| c[1].to_string());
    let materials: Vec<String> = MATERIALS_RE
        .captures(raw)
        .map(|c| {
            QUOTED_RE
                .captures_iter(&c[1])
                .map(|q| q[1].to_string())
                .collect()
        })
        .unwrap_or_default();

    DesignDetails {
        description: description.unwrap_or(fallback.description),
        materials: if materials.is_empty() {
            fallback.materials
        } else {
            materials
        },
        estimated_time: estimated_time.unwrap_or(fallback.estimated_time),
    }
}

fn parse_cost_response(raw: &str) -> CostEstimate {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        if let (Some(min), Some(max)) = (value["min"].as_f64(), value["max"].as_f64()) {
            let breakdown = value["breakdown"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| {
                            Some(CostLine {
                                concepto: item["concepto"].as_str()?.to_string(),
                                costo: item["costo"].as_f64()?,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            return CostEstimate {
                min,
                max,
                currency: value["currency"].as_str().unwrap_or("MXN").to_string(),
                breakdown,
                notes: value["notes"].as_str().map(|s| s.to_string()),
            };
        }
    }
    fallback_cost()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DesignParams {
        DesignParams {
            tipo: "puerta".to_string(),
            material: "roble".to_string(),
            color: "blanco".to_string(),
            estilo: "moderno".to_string(),
            medidas: Some("80x200".to_string()),
            extra: None,
        }
    }

    #[test]
    fn well_formed_json_is_parsed() {
        let raw = r#"{"description": "Puerta de roble.", "materials": ["Roble", "Herrajes"], "estimatedTime": "3-4 semanas"}"#;
        let details = parse_design_response(raw, fallback_design(&params()));
        assert_eq!(details.description, "Puerta de roble.");
        assert_eq!(details.materials, vec!["Roble", "Herrajes"]);
        assert_eq!(details.estimated_time, "3-4 semanas");
    }

    #[test]
    fn json_wrapped_in_markdown_is_scraped() {
        let raw = "Here you go:\n```json\n{\"description\": \"Puerta moderna\", \
                   \"materials\": [\"Roble\"], \"estimatedTime\": \"5 semanas\"}\n``` anything";
        let details = parse_design_response(raw, fallback_design(&params()));
        assert_eq!(details.description, "Puerta moderna");
        assert_eq!(details.materials, vec!["Roble"]);
        assert_eq!(details.estimated_time, "5 semanas");
    }

    #[test]
    fn garbage_input_falls_back_and_never_panics() {
        let details = parse_design_response("sorry, I can't do that", fallback_design(&params()));
        assert!(!details.materials.is_empty());
        assert!(!details.estimated_time.is_empty());
        assert!(details.description.contains("roble"));
    }

    #[test]
    fn container_and_pool_fallbacks_are_complete() {
        let container = fallback_container(&ContainerParams {
            uso: "oficina".to_string(),
            dimensiones: "20 pies".to_string(),
            acabados: None,
            energia: None,
            extras: None,
        });
        assert!(!container.materials.is_empty());
        assert!(container.description.contains("oficina"));

        let pool = fallback_pool(&PoolParams {
            forma: "rectangular".to_string(),
            tamano: "8x4".to_string(),
            profundidad: None,
            acabados: None,
            extras: None,
        });
        assert!(!pool.materials.is_empty());
        assert!(!pool.estimated_time.is_empty());
    }

    #[test]
    fn cost_garbage_falls_back_to_reference_range() {
        let estimate = parse_cost_response("no JSON here");
        assert!(estimate.min > 0.0);
        assert!(estimate.max > estimate.min);
        assert_eq!(estimate.currency, "MXN");
        assert!(!estimate.breakdown.is_empty());
    }

    #[test]
    fn cost_json_is_parsed() {
        let raw = r#"{"min": 12000, "max": 30000, "currency": "MXN",
                      "breakdown": [{"concepto": "Materiales", "costo": 14000}],
                      "notes": "ok"}"#;
        let estimate = parse_cost_response(raw);
        assert_eq!(estimate.min, 12000.0);
        assert_eq!(estimate.breakdown.len(), 1);
        assert_eq!(estimate.notes.as_deref(), Some("ok"));
    }
}
