//! Contract parity: the in-memory and SQLite backends must return the same
//! shapes for the same CRUD call sequence.

use serde_json::json;

use kasa_serena_backend::models::project::{NewProject, Project, ProjectUpdate};
use kasa_serena_backend::models::quote::{NewQuote, Quote, QuoteStatus};
use kasa_serena_backend::models::user::{NewUser, User};
use kasa_serena_backend::storage::{MemStorage, SqliteStorage, Storage};

struct SequenceResult {
    user: User,
    project: Project,
    updated: Project,
    quote: Quote,
    reviewed: Quote,
    material_count: usize,
    doors_count: usize,
    miss_was_none: bool,
    deleted: bool,
}

async fn run_sequence(storage: &dyn Storage) -> SequenceResult {
    let user = storage
        .create_user(NewUser {
            username: "parity".to_string(),
            email: "parity@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: Some("Parity Tester".to_string()),
            role: "user".to_string(),
            is_professional: true,
        })
        .await
        .unwrap();

    let project = storage
        .create_project(NewProject {
            user_id: user.id,
            name: "Cocina integral".to_string(),
            description: Some("Remodelación".to_string()),
            project_type: "cocina".to_string(),
            status: "draft".to_string(),
            cost: None,
            estimated_delivery_time: None,
            image_url: None,
            ai_analysis: None,
            materials_list: Some(json!(["cuarzo", "nogal"])),
        })
        .await
        .unwrap();

    let updated = storage
        .update_project(
            project.id,
            ProjectUpdate {
                status: Some("in_progress".to_string()),
                cost: Some(48000.0),
                ..ProjectUpdate::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    let quote = storage
        .create_quote(NewQuote {
            user_id: user.id,
            project_id: Some(project.id),
            details: json!({"tipo": "cocina", "medidas": "400x300"}),
        })
        .await
        .unwrap();

    let reviewed = storage
        .update_quote_status(quote.id, QuoteStatus::Approved, Some(52000.0))
        .await
        .unwrap()
        .unwrap();

    let material_count = storage.list_materials().await.unwrap().len();
    let doors_count = storage.list_materials_by_type("puerta").await.unwrap().len();
    let miss_was_none = storage.get_project(9999).await.unwrap().is_none();

    let scratch = storage
        .create_project(NewProject {
            user_id: user.id,
            name: "Scratch".to_string(),
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
    let deleted = storage.delete_project(scratch.id).await.unwrap();

    SequenceResult {
        user,
        project,
        updated,
        quote,
        reviewed,
        material_count,
        doors_count,
        miss_was_none,
        deleted,
    }
}

fn assert_same_shapes(a: &SequenceResult, b: &SequenceResult) {
    assert_eq!(a.user.id, b.user.id);
    assert_eq!(a.user.username, b.user.username);
    assert_eq!(a.user.role, b.user.role);
    assert_eq!(a.user.is_professional, b.user.is_professional);

    assert_eq!(a.project.id, b.project.id);
    assert_eq!(a.project.user_id, b.project.user_id);
    assert_eq!(a.project.project_type, b.project.project_type);
    assert_eq!(a.project.materials_list, b.project.materials_list);

    assert_eq!(a.updated.status, b.updated.status);
    assert_eq!(a.updated.cost, b.updated.cost);
    // untouched fields survive the merge identically
    assert_eq!(a.updated.name, b.updated.name);
    assert_eq!(a.updated.description, b.updated.description);

    assert_eq!(a.quote.id, b.quote.id);
    assert_eq!(a.quote.status, b.quote.status);
    assert_eq!(a.quote.project_id, b.quote.project_id);
    assert_eq!(a.quote.details, b.quote.details);

    assert_eq!(a.reviewed.status, b.reviewed.status);
    assert_eq!(a.reviewed.total_cost, b.reviewed.total_cost);

    assert_eq!(a.material_count, b.material_count);
    assert_eq!(a.doors_count, b.doors_count);
    assert_eq!(a.miss_was_none, b.miss_was_none);
    assert_eq!(a.deleted, b.deleted);
}

#[tokio::test]
async fn mem_and_sqlite_backends_agree() {
    let mem = MemStorage::new();
    let sqlite = SqliteStorage::new_in_memory().await.unwrap();

    let from_mem = run_sequence(&mem).await;
    let from_sqlite = run_sequence(&sqlite).await;

    assert_same_shapes(&from_mem, &from_sqlite);
}

#[tokio::test]
async fn sqlite_duplicate_username_maps_to_validation_error() {
    let sqlite = SqliteStorage::new_in_memory().await.unwrap();
    let new = |email: &str| NewUser {
        username: "dup".to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        full_name: None,
        role: "user".to_string(),
        is_professional: false,
    };
    sqlite.create_user(new("one@example.com")).await.unwrap();
    let err = sqlite.create_user(new("two@example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        kasa_serena_backend::errors::AppError::ValidationError(_)
    ));
}

#[tokio::test]
async fn sqlite_sessions_roundtrip() {
    use chrono::{Duration, Utc};
    use kasa_serena_backend::models::session::Session;

    let sqlite = SqliteStorage::new_in_memory().await.unwrap();
    let user = sqlite
        .create_user(NewUser {
            username: "sess".to_string(),
            email: "sess@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: None,
            role: "user".to_string(),
            is_professional: false,
        })
        .await
        .unwrap();

    let now = Utc::now();
    sqlite
        .create_session(Session {
            token_hash: "abc123".to_string(),
            user_id: user.id,
            created_at: now,
            expires_at: now + Duration::hours(24),
            is_active: true,
        })
        .await
        .unwrap();

    let loaded = sqlite.get_session("abc123").await.unwrap().unwrap();
    assert!(loaded.is_valid_at(Utc::now()));

    assert!(sqlite.revoke_session("abc123").await.unwrap());
    let revoked = sqlite.get_session("abc123").await.unwrap().unwrap();
    assert!(!revoked.is_valid_at(Utc::now()));
}
