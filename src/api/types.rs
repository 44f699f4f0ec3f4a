use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::design::{CostEstimate, CostLine};
use crate::models::user::UserResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_professional: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Returned by register/login. The session also travels as an HttpOnly
/// cookie; the token field exists for non-browser API clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub project_type: String,
    pub status: Option<String>,
    pub cost: Option<f64>,
    pub estimated_delivery_time: Option<String>,
    pub image_url: Option<String>,
    pub ai_analysis: Option<serde_json::Value>,
    pub materials_list: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub cost: Option<f64>,
    pub estimated_delivery_time: Option<String>,
    pub image_url: Option<String>,
    pub ai_analysis: Option<serde_json::Value>,
    pub materials_list: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub subscribed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub project_id: Option<i64>,
    pub details: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuoteStatusRequest {
    pub status: String,
    pub total_cost: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DesignChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DesignChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeImageResponse {
    pub analysis: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateCostResponse {
    pub estimated_cost: CostRange,
    pub breakdown: Vec<CostLine>,
    pub notes: Option<String>,
}

impl From<CostEstimate> for EstimateCostResponse {
    fn from(estimate: CostEstimate) -> Self {
        EstimateCostResponse {
            estimated_cost: CostRange {
                min: estimate.min,
                max: estimate.max,
                currency: estimate.currency,
            },
            breakdown: estimate.breakdown,
            notes: estimate.notes,
        }
    }
}
