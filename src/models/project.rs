use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product lines the studio designs. Stored as their Spanish wire names.
pub const PROJECT_TYPES: &[&str] = &[
    "cocina",
    "puerta",
    "ventana",
    "gabinete",
    "contenedor",
    "piscina",
    "oficina",
];

pub const PROJECT_STATUSES: &[&str] = &["draft", "in_progress", "completed"];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub project_type: String,
    pub status: String,
    pub cost: Option<f64>,
    pub estimated_delivery_time: Option<String>,
    pub image_url: Option<String>,
    /// Opaque JSON blob from the AI gateway; stored and returned as-is.
    pub ai_analysis: Option<serde_json::Value>,
    pub materials_list: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub project_type: String,
    pub status: String,
    pub cost: Option<f64>,
    pub estimated_delivery_time: Option<String>,
    pub image_url: Option<String>,
    pub ai_analysis: Option<serde_json::Value>,
    pub materials_list: Option<serde_json::Value>,
}

/// Partial update applied load-merge-persist; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub cost: Option<f64>,
    pub estimated_delivery_time: Option<String>,
    pub image_url: Option<String>,
    pub ai_analysis: Option<serde_json::Value>,
    pub materials_list: Option<serde_json::Value>,
}

impl Project {
    pub fn apply(&mut self, update: ProjectUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(cost) = update.cost {
            self.cost = Some(cost);
        }
        if let Some(t) = update.estimated_delivery_time {
            self.estimated_delivery_time = Some(t);
        }
        if let Some(url) = update.image_url {
            self.image_url = Some(url);
        }
        if let Some(analysis) = update.ai_analysis {
            self.ai_analysis = Some(analysis);
        }
        if let Some(list) = update.materials_list {
            self.materials_list = Some(list);
        }
        self.updated_at = Utc::now();
    }
}
