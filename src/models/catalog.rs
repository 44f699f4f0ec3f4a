use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Seeded catalog row; the application never mutates materials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub material_type: String,
    pub color: String,
    pub finish: String,
    pub unit: String,
    pub price: f64,
    /// "available" or "limited"
    pub availability: String,
    pub distributor_id: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub name: String,
    pub category: String,
    pub material_type: String,
    pub color: String,
    pub finish: String,
    pub unit: String,
    pub price: f64,
    pub availability: String,
    pub distributor_id: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Distributor {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    /// Free-form contact JSON (phone, email, website).
    pub contact_info: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct NewDistributor {
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub contact_info: serde_json::Value,
}
