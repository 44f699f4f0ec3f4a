use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::{AppError, Result};
use crate::models::catalog::{Distributor, Material, NewDistributor, NewMaterial};
use crate::models::message::{Message, NewMessage};
use crate::models::project::{NewProject, Project, ProjectUpdate};
use crate::models::quote::{NewQuote, Quote, QuoteStatus};
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserUpdate};
use crate::storage::{seed, Storage};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    projects: HashMap<i64, Project>,
    materials: HashMap<i64, Material>,
    distributors: HashMap<i64, Distributor>,
    messages: HashMap<i64, Message>,
    quotes: HashMap<i64, Quote>,
    sessions: HashMap<String, Session>,
    next_user_id: i64,
    next_project_id: i64,
    next_material_id: i64,
    next_distributor_id: i64,
    next_message_id: i64,
    next_quote_id: i64,
}

/// In-process storage backend for local development and tests. Counters
/// only move forward, so ids are never reused even after deletes. A single
/// mutex guards all maps; this backend is not meant for multi-process
/// deployments.
pub struct MemStorage {
    inner: Mutex<Inner>,
}

impl MemStorage {
    pub fn new() -> Self {
        let storage = Self {
            inner: Mutex::new(Inner {
                next_user_id: 1,
                next_project_id: 1,
                next_material_id: 1,
                next_distributor_id: 1,
                next_message_id: 1,
                next_quote_id: 1,
                ..Inner::default()
            }),
        };
        storage.seed_catalog();
        storage
    }

    fn seed_catalog(&self) {
        let mut inner = self.inner.lock().unwrap();
        let mut distributor_ids = Vec::new();
        for new in seed::seed_distributors() {
            let id = inner.next_distributor_id;
            inner.next_distributor_id += 1;
            inner.distributors.insert(
                id,
                Distributor {
                    id,
                    name: new.name,
                    location: new.location,
                    description: new.description,
                    status: new.status,
                    image_url: new.image_url,
                    contact_info: new.contact_info,
                },
            );
            distributor_ids.push(id);
        }
        for new in seed::seed_materials(&distributor_ids) {
            let id = inner.next_material_id;
            inner.next_material_id += 1;
            inner.materials.insert(
                id,
                Material {
                    id,
                    name: new.name,
                    category: new.category,
                    material_type: new.material_type,
                    color: new.color,
                    finish: new.finish,
                    unit: new.unit,
                    price: new.price,
                    availability: new.availability,
                    distributor_id: new.distributor_id,
                    image_url: new.image_url,
                },
            );
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.username == new.username) {
            return Err(AppError::ValidationError("Username already exists".to_string()));
        }
        if inner.users.values().any(|u| u.email == new.email) {
            return Err(AppError::ValidationError("Email already exists".to_string()));
        }
        let id = inner.next_user_id;
        inner.next_user_id += 1;
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            role: new.role,
            is_professional: new.is_professional,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.get_mut(&id) {
            Some(user) => {
                user.apply(update);
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn create_project(&self, new: NewProject) -> Result<Project> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_project_id;
        inner.next_project_id += 1;
        let now = Utc::now();
        let project = Project {
            id,
            user_id: new.user_id,
            name: new.name,
            description: new.description,
            project_type: new.project_type,
            status: new.status,
            cost: new.cost,
            estimated_delivery_time: new.estimated_delivery_time,
            image_url: new.image_url,
            ai_analysis: new.ai_analysis,
            materials_list: new.materials_list,
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        Ok(self.inner.lock().unwrap().projects.get(&id).cloned())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let inner = self.inner.lock().unwrap();
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    async fn list_projects_by_user(&self, user_id: i64) -> Result<Vec<Project>> {
        let inner = self.inner.lock().unwrap();
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Option<Project>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.projects.get_mut(&id) {
            Some(project) => {
                project.apply(update);
                Ok(Some(project.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_project(&self, id: i64) -> Result<bool> {
        Ok(self.inner.lock().unwrap().projects.remove(&id).is_some())
    }

    async fn create_material(&self, new: NewMaterial) -> Result<Material> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_material_id;
        inner.next_material_id += 1;
        let material = Material {
            id,
            name: new.name,
            category: new.category,
            material_type: new.material_type,
            color: new.color,
            finish: new.finish,
            unit: new.unit,
            price: new.price,
            availability: new.availability,
            distributor_id: new.distributor_id,
            image_url: new.image_url,
        };
        inner.materials.insert(id, material.clone());
        Ok(material)
    }

    async fn get_material(&self, id: i64) -> Result<Option<Material>> {
        Ok(self.inner.lock().unwrap().materials.get(&id).cloned())
    }

    async fn list_materials(&self) -> Result<Vec<Material>> {
        let inner = self.inner.lock().unwrap();
        let mut materials: Vec<Material> = inner.materials.values().cloned().collect();
        materials.sort_by_key(|m| m.id);
        Ok(materials)
    }

    async fn list_materials_by_type(&self, material_type: &str) -> Result<Vec<Material>> {
        let inner = self.inner.lock().unwrap();
        let mut materials: Vec<Material> = inner
            .materials
            .values()
            .filter(|m| m.material_type == material_type)
            .cloned()
            .collect();
        materials.sort_by_key(|m| m.id);
        Ok(materials)
    }

    async fn create_distributor(&self, new: NewDistributor) -> Result<Distributor> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_distributor_id;
        inner.next_distributor_id += 1;
        let distributor = Distributor {
            id,
            name: new.name,
            location: new.location,
            description: new.description,
            status: new.status,
            image_url: new.image_url,
            contact_info: new.contact_info,
        };
        inner.distributors.insert(id, distributor.clone());
        Ok(distributor)
    }

    async fn get_distributor(&self, id: i64) -> Result<Option<Distributor>> {
        Ok(self.inner.lock().unwrap().distributors.get(&id).cloned())
    }

    async fn list_distributors(&self) -> Result<Vec<Distributor>> {
        let inner = self.inner.lock().unwrap();
        let mut distributors: Vec<Distributor> = inner.distributors.values().cloned().collect();
        distributors.sort_by_key(|d| d.id);
        Ok(distributors)
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_message_id;
        inner.next_message_id += 1;
        let message = Message {
            id,
            name: new.name,
            email: new.email,
            subject: new.subject,
            message: new.message,
            subscribed: new.subscribed,
            is_read: false,
            created_at: Utc::now(),
        };
        inner.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<Message> = inner.messages.values().cloned().collect();
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    async fn mark_message_read(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.messages.get_mut(&id) {
            Some(message) => {
                message.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_quote(&self, new: NewQuote) -> Result<Quote> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_quote_id;
        inner.next_quote_id += 1;
        let quote = Quote {
            id,
            user_id: new.user_id,
            project_id: new.project_id,
            details: new.details,
            status: QuoteStatus::Pending,
            total_cost: None,
            created_at: Utc::now(),
        };
        inner.quotes.insert(id, quote.clone());
        Ok(quote)
    }

    async fn get_quote(&self, id: i64) -> Result<Option<Quote>> {
        Ok(self.inner.lock().unwrap().quotes.get(&id).cloned())
    }

    async fn list_quotes_by_user(&self, user_id: i64) -> Result<Vec<Quote>> {
        let inner = self.inner.lock().unwrap();
        let mut quotes: Vec<Quote> = inner
            .quotes
            .values()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        quotes.sort_by_key(|q| q.id);
        Ok(quotes)
    }

    async fn update_quote_status(
        &self,
        id: i64,
        status: QuoteStatus,
        total_cost: Option<f64>,
    ) -> Result<Option<Quote>> {
        let mut inner = self.inner.lock().unwrap();
        match inner.quotes.get_mut(&id) {
            Some(quote) => {
                quote.status = status;
                if total_cost.is_some() {
                    quote.total_cost = total_cost;
                }
                Ok(Some(quote.clone()))
            }
            None => Ok(None),
        }
    }

    async fn create_session(&self, session: Session) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(session.token_hash.clone(), session);
        Ok(())
    }

    async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
        Ok(self.inner.lock().unwrap().sessions.get(token_hash).cloned())
    }

    async fn revoke_session(&self, token_hash: &str) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.sessions.get_mut(token_hash) {
            Some(session) => {
                session.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_user_sessions(&self, user_id: i64) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let mut revoked = 0;
        for session in inner.sessions.values_mut() {
            if session.user_id == user_id && session.is_active {
                session.is_active = false;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge_expired_sessions(&self) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            full_name: None,
            role: "user".to_string(),
            is_professional: false,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_without_a_second_row() {
        let storage = MemStorage::new();
        storage.create_user(sample_user("marta")).await.unwrap();

        let mut dup = sample_user("marta");
        dup.email = "other@example.com".to_string();
        let err = storage.create_user(dup).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let found = storage.get_user_by_username("marta").await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.email, "marta@example.com");
    }

    #[tokio::test]
    async fn project_ids_are_never_reused_after_delete() {
        let storage = MemStorage::new();
        let user = storage.create_user(sample_user("ids")).await.unwrap();

        let first = storage
            .create_project(NewProject {
                user_id: user.id,
                name: "Puerta principal".to_string(),
                description: None,
                project_type: "puerta".to_string(),
                status: "draft".to_string(),
                cost: None,
                estimated_delivery_time: None,
                image_url: None,
                ai_analysis: None,
                materials_list: None,
            })
            .await
            .unwrap();
        assert!(storage.delete_project(first.id).await.unwrap());

        let second = storage
            .create_project(NewProject {
                user_id: user.id,
                name: "Puerta trasera".to_string(),
                description: None,
                project_type: "puerta".to_string(),
                status: "draft".to_string(),
                cost: None,
                estimated_delivery_time: None,
                image_url: None,
                ai_analysis: None,
                materials_list: None,
            })
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn lookup_miss_returns_none_not_error() {
        let storage = MemStorage::new();
        assert!(storage.get_project(999).await.unwrap().is_none());
        assert!(storage.get_user(999).await.unwrap().is_none());
        assert!(!storage.delete_project(999).await.unwrap());
    }

    #[tokio::test]
    async fn catalog_is_seeded_on_construction() {
        let storage = MemStorage::new();
        let materials = storage.list_materials().await.unwrap();
        let distributors = storage.list_distributors().await.unwrap();
        assert!(!materials.is_empty());
        assert!(!distributors.is_empty());
        // every material points at a seeded distributor
        for material in &materials {
            assert!(storage
                .get_distributor(material.distributor_id)
                .await
                .unwrap()
                .is_some());
        }

        let doors = storage.list_materials_by_type("puerta").await.unwrap();
        assert!(doors.iter().all(|m| m.material_type == "puerta"));
        assert!(!doors.is_empty());
    }

    #[tokio::test]
    async fn quote_status_update_keeps_existing_cost_when_none() {
        let storage = MemStorage::new();
        let user = storage.create_user(sample_user("quoter")).await.unwrap();
        let quote = storage
            .create_quote(NewQuote {
                user_id: user.id,
                project_id: None,
                details: json!({"tipo": "cocina"}),
            })
            .await
            .unwrap();
        assert_eq!(quote.status, QuoteStatus::Pending);

        let approved = storage
            .update_quote_status(quote.id, QuoteStatus::Approved, Some(1200.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, QuoteStatus::Approved);
        assert_eq!(approved.total_cost, Some(1200.0));

        let rejected = storage
            .update_quote_status(quote.id, QuoteStatus::Rejected, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.total_cost, Some(1200.0));
    }
}
