//! PostgreSQL store against a live database. Run with `DATABASE_URL=... cargo test -- --ignored`.

mod support;

use architect_crud::{connect, AppError, ControllerConfig, GenericCrudController, PgStore, Repository};
use axum::http::StatusCode;
use serde_json::json;
use support::{person, send, Person};

async fn fresh_store(table: &str) -> Result<PgStore<Person>, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL")?;
    let pool = connect(&url, 2).await?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table)).execute(&pool).await?;
    let store = PgStore::new(pool, table)?;
    store.ensure_table().await?;
    Ok(store)
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn session_commit_and_rollback() -> Result<(), Box<dyn std::error::Error>> {
    let store = fresh_store("crud_test_sessions").await?;

    let writer = store.session();
    let ada = writer.add(person("Ada", "Lovelace", 36), false).await?;
    assert_eq!(ada.id, Some(1));
    assert_eq!(writer.list().await?.len(), 1);
    assert!(store.session().list().await?.is_empty());
    writer.commit().await?;
    assert_eq!(store.session().list().await?.len(), 1);

    let discarded = store.session();
    discarded.delete(1, false).await?;
    discarded.rollback().await?;
    assert_eq!(store.session().get(1).await?.first_name, "Ada");

    let explicit = store.session();
    explicit.add(Person { id: Some(10), ..person("Alan", "Turing", 41) }, true).await?;
    let next = explicit.add(person("Grace", "Hopper", 85), true).await?;
    assert_eq!(next.id, Some(11));

    let missing = store.session().get(99).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn crud_over_postgres() -> Result<(), Box<dyn std::error::Error>> {
    let store = fresh_store("crud_test_people").await?;
    let app = GenericCrudController::<Person, _>::new(ControllerConfig::new("/people").model_type::<Person>(), store)?
        .router()?;

    let (status, created) = send(
        &app,
        "POST",
        "/people",
        Some(json!({"first_name": "Ada", "last_name": "Lovelace", "age": 36})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);

    let (status, updated) = send(&app, "PUT", "/people/1", Some(json!({"age": 37}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["age"], 37);
    assert_eq!(updated["first_name"], "Ada");

    let (status, _) = send(&app, "DELETE", "/people/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/people/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn failed_write_discards_staged_writes() -> Result<(), Box<dyn std::error::Error>> {
    let store = fresh_store("crud_test_failed_writes").await?;
    let session = store.session();
    session.add(person("Ada", "Lovelace", 36), false).await?;

    let mut patch = serde_json::Map::new();
    patch.insert("id".into(), json!(99));
    patch.insert("age".into(), json!(1));
    let err = session.update(patch, false).await;
    assert!(matches!(err, Err(AppError::NotFound(_))));

    assert!(session.list().await?.is_empty());
    session.commit().await?;
    assert!(store.session().list().await?.is_empty());
    Ok(())
}
