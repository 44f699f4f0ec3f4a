use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::errors::{AppError, Result};
use crate::models::catalog::{Distributor, Material, NewDistributor, NewMaterial};
use crate::models::message::{Message, NewMessage};
use crate::models::project::{NewProject, Project, ProjectUpdate};
use crate::models::quote::{NewQuote, Quote, QuoteStatus};
use crate::models::session::Session;
use crate::models::user::{NewUser, User, UserUpdate};
use crate::storage::{seed, Storage};

/// SQLite-backed storage. Raw queries with manual row mapping; dates are
/// stored as RFC 3339 text and JSON columns as text.
#[derive(Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database directory: {}", e))
            })?;
        }
        if !Path::new(database_path).exists() {
            std::fs::File::create(database_path).map_err(|e| {
                AppError::DatabaseError(format!("Failed to create database file: {}", e))
            })?;
        }
        let database_url = format!("sqlite:{}", database_path);

        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to database: {}", e)))?;

        let storage = Self { pool };
        storage.create_tables().await?;
        storage.seed_catalog_if_empty().await?;
        info!(action = "sqlite_connected", path = %database_path);
        Ok(storage)
    }

    /// In-memory SQLite, used by the contract-parity tests. Pinned to one
    /// connection: every pooled connection would otherwise see its own
    /// empty database.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open in-memory db: {}", e)))?;
        let storage = Self { pool };
        storage.create_tables().await?;
        storage.seed_catalog_if_empty().await?;
        Ok(storage)
    }

    async fn create_tables(&self) -> Result<()> {
        let query = r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                is_professional BOOLEAN NOT NULL DEFAULT FALSE,
                stripe_customer_id TEXT,
                stripe_subscription_id TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                project_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                cost REAL,
                estimated_delivery_time TEXT,
                image_url TEXT,
                ai_analysis TEXT,
                materials_list TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS distributors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                location TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                image_url TEXT,
                contact_info TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS materials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                material_type TEXT NOT NULL,
                color TEXT NOT NULL,
                finish TEXT NOT NULL,
                unit TEXT NOT NULL,
                price REAL NOT NULL,
                availability TEXT NOT NULL DEFAULT 'available',
                distributor_id INTEGER NOT NULL,
                image_url TEXT,
                FOREIGN KEY (distributor_id) REFERENCES distributors (id)
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                subject TEXT NOT NULL,
                message TEXT NOT NULL,
                subscribed BOOLEAN NOT NULL DEFAULT FALSE,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quotes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                project_id INTEGER,
                details TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                total_cost REAL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
            CREATE INDEX IF NOT EXISTS idx_projects_user_id ON projects(user_id);
            CREATE INDEX IF NOT EXISTS idx_materials_type ON materials(material_type);
            CREATE INDEX IF NOT EXISTS idx_quotes_user_id ON quotes(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_active ON sessions(is_active);
        "#;

        sqlx::raw_sql(query)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    async fn seed_catalog_if_empty(&self) -> Result<()> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM materials")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count materials: {}", e)))?;
        let count: i64 = row.get("count");
        if count > 0 {
            return Ok(());
        }

        let mut distributor_ids = Vec::new();
        for new in seed::seed_distributors() {
            let distributor = self.create_distributor(new).await?;
            distributor_ids.push(distributor.id);
        }
        for new in seed::seed_materials(&distributor_ids) {
            self.create_material(new).await?;
        }
        info!(action = "catalog_seeded");
        Ok(())
    }
}

fn parse_date(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::DatabaseError(format!("Invalid {} date: {}", column, e)))
}

fn parse_json_opt(raw: Option<String>, column: &str) -> Result<Option<serde_json::Value>> {
    match raw {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AppError::DatabaseError(format!("Invalid {} JSON: {}", column, e))),
        None => Ok(None),
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        full_name: row.get("full_name"),
        role: row.get("role"),
        is_professional: row.get("is_professional"),
        stripe_customer_id: row.get("stripe_customer_id"),
        stripe_subscription_id: row.get("stripe_subscription_id"),
        created_at: parse_date(&row.get::<String, _>("created_at"), "created_at")?,
    })
}

fn row_to_project(row: &SqliteRow) -> Result<Project> {
    Ok(Project {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        description: row.get("description"),
        project_type: row.get("project_type"),
        status: row.get("status"),
        cost: row.get("cost"),
        estimated_delivery_time: row.get("estimated_delivery_time"),
        image_url: row.get("image_url"),
        ai_analysis: parse_json_opt(row.get("ai_analysis"), "ai_analysis")?,
        materials_list: parse_json_opt(row.get("materials_list"), "materials_list")?,
        created_at: parse_date(&row.get::<String, _>("created_at"), "created_at")?,
        updated_at: parse_date(&row.get::<String, _>("updated_at"), "updated_at")?,
    })
}

fn row_to_material(row: &SqliteRow) -> Material {
    Material {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        material_type: row.get("material_type"),
        color: row.get("color"),
        finish: row.get("finish"),
        unit: row.get("unit"),
        price: row.get("price"),
        availability: row.get("availability"),
        distributor_id: row.get("distributor_id"),
        image_url: row.get("image_url"),
    }
}

fn row_to_distributor(row: &SqliteRow) -> Result<Distributor> {
    Ok(Distributor {
        id: row.get("id"),
        name: row.get("name"),
        location: row.get("location"),
        description: row.get("description"),
        status: row.get("status"),
        image_url: row.get("image_url"),
        contact_info: serde_json::from_str(&row.get::<String, _>("contact_info"))
            .map_err(|e| AppError::DatabaseError(format!("Invalid contact_info JSON: {}", e)))?,
    })
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    Ok(Message {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        subject: row.get("subject"),
        message: row.get("message"),
        subscribed: row.get("subscribed"),
        is_read: row.get("is_read"),
        created_at: parse_date(&row.get::<String, _>("created_at"), "created_at")?,
    })
}

fn row_to_quote(row: &SqliteRow) -> Result<Quote> {
    let status_raw: String = row.get("status");
    Ok(Quote {
        id: row.get("id"),
        user_id: row.get("user_id"),
        project_id: row.get("project_id"),
        details: serde_json::from_str(&row.get::<String, _>("details"))
            .map_err(|e| AppError::DatabaseError(format!("Invalid quote details JSON: {}", e)))?,
        status: QuoteStatus::parse(&status_raw)
            .ok_or_else(|| AppError::DatabaseError(format!("Unknown quote status: {}", status_raw)))?,
        total_cost: row.get("total_cost"),
        created_at: parse_date(&row.get::<String, _>("created_at"), "created_at")?,
    })
}

fn row_to_session(row: &SqliteRow) -> Result<Session> {
    Ok(Session {
        token_hash: row.get("token_hash"),
        user_id: row.get("user_id"),
        created_at: parse_date(&row.get::<String, _>("created_at"), "created_at")?,
        expires_at: parse_date(&row.get::<String, _>("expires_at"), "expires_at")?,
        is_active: row.get("is_active"),
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, role, is_professional, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(&new.role)
        .bind(new.is_professional)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let text = e.to_string();
            if text.contains("UNIQUE constraint failed") {
                if text.contains("email") {
                    AppError::ValidationError("Email already exists".to_string())
                } else {
                    AppError::ValidationError("Username already exists".to_string())
                }
            } else {
                AppError::DatabaseError(format!("Failed to create user: {}", e))
            }
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            role: new.role,
            is_professional: new.is_professional,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: now,
        })
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {}", e)))?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user by username: {}", e)))?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user by email: {}", e)))?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        // load-merge-persist, same as the in-memory backend
        let Some(mut user) = self.get_user(id).await? else {
            return Ok(None);
        };
        user.apply(update);
        sqlx::query(
            r#"
            UPDATE users
            SET email = ?1, full_name = ?2, is_professional = ?3,
                stripe_customer_id = ?4, stripe_subscription_id = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.is_professional)
        .bind(&user.stripe_customer_id)
        .bind(&user.stripe_subscription_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update user: {}", e)))?;
        Ok(Some(user))
    }

    async fn create_project(&self, new: NewProject) -> Result<Project> {
        let now = Utc::now();
        let ai_analysis = new.ai_analysis.as_ref().map(|v| v.to_string());
        let materials_list = new.materials_list.as_ref().map(|v| v.to_string());
        let result = sqlx::query(
            r#"
            INSERT INTO projects (user_id, name, description, project_type, status, cost,
                                  estimated_delivery_time, image_url, ai_analysis, materials_list,
                                  created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.project_type)
        .bind(&new.status)
        .bind(new.cost)
        .bind(&new.estimated_delivery_time)
        .bind(&new.image_url)
        .bind(&ai_analysis)
        .bind(&materials_list)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create project: {}", e)))?;

        Ok(Project {
            id: result.last_insert_rowid(),
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
        })
    }

    async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch project: {}", e)))?;
        row.as_ref().map(row_to_project).transpose()
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list projects: {}", e)))?;
        rows.iter().map(row_to_project).collect()
    }

    async fn list_projects_by_user(&self, user_id: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects WHERE user_id = ?1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list user projects: {}", e)))?;
        rows.iter().map(row_to_project).collect()
    }

    async fn update_project(&self, id: i64, update: ProjectUpdate) -> Result<Option<Project>> {
        let Some(mut project) = self.get_project(id).await? else {
            return Ok(None);
        };
        project.apply(update);
        let ai_analysis = project.ai_analysis.as_ref().map(|v| v.to_string());
        let materials_list = project.materials_list.as_ref().map(|v| v.to_string());
        sqlx::query(
            r#"
            UPDATE projects
            SET name = ?1, description = ?2, status = ?3, cost = ?4,
                estimated_delivery_time = ?5, image_url = ?6, ai_analysis = ?7,
                materials_list = ?8, updated_at = ?9
            WHERE id = ?10
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.status)
        .bind(project.cost)
        .bind(&project.estimated_delivery_time)
        .bind(&project.image_url)
        .bind(&ai_analysis)
        .bind(&materials_list)
        .bind(project.updated_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update project: {}", e)))?;
        Ok(Some(project))
    }

    async fn delete_project(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete project: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_material(&self, new: NewMaterial) -> Result<Material> {
        let result = sqlx::query(
            r#"
            INSERT INTO materials (name, category, material_type, color, finish, unit, price,
                                   availability, distributor_id, image_url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&new.name)
        .bind(&new.category)
        .bind(&new.material_type)
        .bind(&new.color)
        .bind(&new.finish)
        .bind(&new.unit)
        .bind(new.price)
        .bind(&new.availability)
        .bind(new.distributor_id)
        .bind(&new.image_url)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create material: {}", e)))?;

        Ok(Material {
            id: result.last_insert_rowid(),
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
        })
    }

    async fn get_material(&self, id: i64) -> Result<Option<Material>> {
        let row = sqlx::query("SELECT * FROM materials WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch material: {}", e)))?;
        Ok(row.as_ref().map(row_to_material))
    }

    async fn list_materials(&self) -> Result<Vec<Material>> {
        let rows = sqlx::query("SELECT * FROM materials ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list materials: {}", e)))?;
        Ok(rows.iter().map(row_to_material).collect())
    }

    async fn list_materials_by_type(&self, material_type: &str) -> Result<Vec<Material>> {
        let rows = sqlx::query("SELECT * FROM materials WHERE material_type = ?1 ORDER BY id")
            .bind(material_type)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list materials by type: {}", e)))?;
        Ok(rows.iter().map(row_to_material).collect())
    }

    async fn create_distributor(&self, new: NewDistributor) -> Result<Distributor> {
        let contact_info = new.contact_info.to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO distributors (name, location, description, status, image_url, contact_info)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&new.name)
        .bind(&new.location)
        .bind(&new.description)
        .bind(&new.status)
        .bind(&new.image_url)
        .bind(&contact_info)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create distributor: {}", e)))?;

        Ok(Distributor {
            id: result.last_insert_rowid(),
            name: new.name,
            location: new.location,
            description: new.description,
            status: new.status,
            image_url: new.image_url,
            contact_info: new.contact_info,
        })
    }

    async fn get_distributor(&self, id: i64) -> Result<Option<Distributor>> {
        let row = sqlx::query("SELECT * FROM distributors WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch distributor: {}", e)))?;
        row.as_ref().map(row_to_distributor).transpose()
    }

    async fn list_distributors(&self) -> Result<Vec<Distributor>> {
        let rows = sqlx::query("SELECT * FROM distributors ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list distributors: {}", e)))?;
        rows.iter().map(row_to_distributor).collect()
    }

    async fn create_message(&self, new: NewMessage) -> Result<Message> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO messages (name, email, subject, message, subscribed, is_read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, FALSE, ?6)
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.subject)
        .bind(&new.message)
        .bind(new.subscribed)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to store message: {}", e)))?;

        Ok(Message {
            id: result.last_insert_rowid(),
            name: new.name,
            email: new.email,
            subject: new.subject,
            message: new.message,
            subscribed: new.subscribed,
            is_read: false,
            created_at: now,
        })
    }

    async fn list_messages(&self) -> Result<Vec<Message>> {
        let rows = sqlx::query("SELECT * FROM messages ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list messages: {}", e)))?;
        rows.iter().map(row_to_message).collect()
    }

    async fn mark_message_read(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to mark message read: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_quote(&self, new: NewQuote) -> Result<Quote> {
        let now = Utc::now();
        let details = new.details.to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO quotes (user_id, project_id, details, status, created_at)
            VALUES (?1, ?2, ?3, 'pending', ?4)
            "#,
        )
        .bind(new.user_id)
        .bind(new.project_id)
        .bind(&details)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create quote: {}", e)))?;

        Ok(Quote {
            id: result.last_insert_rowid(),
            user_id: new.user_id,
            project_id: new.project_id,
            details: new.details,
            status: QuoteStatus::Pending,
            total_cost: None,
            created_at: now,
        })
    }

    async fn get_quote(&self, id: i64) -> Result<Option<Quote>> {
        let row = sqlx::query("SELECT * FROM quotes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch quote: {}", e)))?;
        row.as_ref().map(row_to_quote).transpose()
    }

    async fn list_quotes_by_user(&self, user_id: i64) -> Result<Vec<Quote>> {
        let rows = sqlx::query("SELECT * FROM quotes WHERE user_id = ?1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list quotes: {}", e)))?;
        rows.iter().map(row_to_quote).collect()
    }

    async fn update_quote_status(
        &self,
        id: i64,
        status: QuoteStatus,
        total_cost: Option<f64>,
    ) -> Result<Option<Quote>> {
        let Some(quote) = self.get_quote(id).await? else {
            return Ok(None);
        };
        let new_cost = total_cost.or(quote.total_cost);
        sqlx::query("UPDATE quotes SET status = ?1, total_cost = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(new_cost)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update quote: {}", e)))?;
        Ok(Some(Quote {
            status,
            total_cost: new_cost,
            ..quote
        }))
    }

    async fn create_session(&self, session: Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .bind(session.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to store session: {}", e)))?;
        Ok(())
    }

    async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token_hash = ?1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch session: {}", e)))?;
        row.as_ref().map(row_to_session).transpose()
    }

    async fn revoke_session(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET is_active = FALSE WHERE token_hash = ?1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to revoke session: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_user_sessions(&self, user_id: i64) -> Result<u64> {
        let result =
            sqlx::query("UPDATE sessions SET is_active = FALSE WHERE user_id = ?1 AND is_active = TRUE")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to revoke sessions: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn purge_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to purge sessions: {}", e)))?;
        Ok(result.rows_affected())
    }
}
