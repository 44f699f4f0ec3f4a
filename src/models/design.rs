use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Design-request parameters for the door/window/kitchen/cabinet lines.
/// Field names mirror the public form payload, which is Spanish.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DesignParams {
    pub tipo: String,
    pub material: String,
    pub color: String,
    pub estilo: String,
    pub medidas: Option<String>,
    pub extra: Option<String>,
}

/// Smart Container product line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContainerParams {
    pub uso: String,
    pub dimensiones: String,
    pub acabados: Option<String>,
    pub energia: Option<String>,
    pub extras: Option<String>,
}

/// Modular Pool product line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PoolParams {
    pub forma: String,
    pub tamano: String,
    pub profundidad: Option<String>,
    pub acabados: Option<String>,
    pub extras: Option<String>,
}

/// Normalized output of the design-generation flow. The gateway guarantees
/// `materials` is non-empty and `estimated_time` is set even when the
/// provider response could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignResult {
    pub image_url: String,
    pub description: String,
    pub materials: Vec<String>,
    pub estimated_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub concepto: String,
    pub costo: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub min: f64,
    pub max: f64,
    pub currency: String,
    pub breakdown: Vec<CostLine>,
    pub notes: Option<String>,
}

/// Gemini suggestion payload for a design request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DesignSuggestions {
    pub description: String,
    pub style: String,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub recommendations: Vec<String>,
}
