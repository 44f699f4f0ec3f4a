use async_trait::async_trait;

use crate::errors::Result;
use crate::models::catalog::{Distributor, Material, NewDistributor, NewMaterial};
use crate::models::message::{Message, NewMessage};
use crate::models::project::{NewProject, Project, ProjectUpdate};
use crate::models::quote::{NewQuote, Quote, QuoteStatus};
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserUpdate};

pub mod memory;
pub mod seed;
pub mod sqlite;

pub use memory::MemStorage;
pub use sqlite::SqliteStorage;

/// CRUD surface shared by the in-memory and SQLite backends.
///
/// Lookups that miss return `Ok(None)` (or `Ok(false)` for deletes); the
/// route layer translates those to 404. Ids are assigned by the backend,
/// increase monotonically, and are never reused within a process lifetime.
#[async_trait]
pub trait Storage: Send + Sync {
    // users
    async fn create_user(&self, new: NewUser) -> Result<User>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>>;

    // projects
    async fn create_project(&self, new: NewProject) -> Result<Project>;
    async fn get_project(&self, id: i64) -> Result<Option<Project>>;
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn list_projects_by_user(&self, user_id: i64) -> Result<Vec<Project>>;
    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Option<Project>>;
    async fn delete_project(&self, id: i64) -> Result<bool>;

    // catalog (seed data, read-only from the app's perspective)
    async fn create_material(&self, new: NewMaterial) -> Result<Material>;
    async fn get_material(&self, id: i64) -> Result<Option<Material>>;
    async fn list_materials(&self) -> Result<Vec<Material>>;
    async fn list_materials_by_type(&self, material_type: &str) -> Result<Vec<Material>>;
    async fn create_distributor(&self, new: NewDistributor) -> Result<Distributor>;
    async fn get_distributor(&self, id: i64) -> Result<Option<Distributor>>;
    async fn list_distributors(&self) -> Result<Vec<Distributor>>;

    // contact messages
    async fn create_message(&self, new: NewMessage) -> Result<Message>;
    async fn list_messages(&self) -> Result<Vec<Message>>;
    async fn mark_message_read(&self, id: i64) -> Result<bool>;

    // quotes
    async fn create_quote(&self, new: NewQuote) -> Result<Quote>;
    async fn get_quote(&self, id: i64) -> Result<Option<Quote>>;
    async fn list_quotes_by_user(&self, user_id: i64) -> Result<Vec<Quote>>;
    async fn update_quote_status(
        &self,
        id: i64,
        status: QuoteStatus,
        total_cost: Option<f64>,
    ) -> Result<Option<Quote>>;

    // sessions
    async fn create_session(&self, session: Session) -> Result<()>;
    async fn get_session(&self, token_hash: &str) -> Result<Option<Session>>;
    async fn revoke_session(&self, token_hash: &str) -> Result<bool>;
    async fn revoke_user_sessions(&self, user_id: i64) -> Result<u64>;
    async fn purge_expired_sessions(&self) -> Result<u64>;
}
