//! PostgreSQL bootstrap: database creation, pool setup and per-model JSONB tables.

use crate::error::{AppError, ConfigError};
use regex::Regex;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgConnection, PgPool};
use std::str::FromStr;

/// Plain or schema-qualified identifier: `people`, `app.people`.
const TABLE_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$";

pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    let re = Regex::new(TABLE_PATTERN).map_err(|e| ConfigError::Load(e.to_string()))?;
    if !re.is_match(table) {
        return Err(ConfigError::InvalidTable(table.to_string()));
    }
    Ok(())
}

/// Create the table backing one model: an id sequence plus the record body as JSONB.
pub async fn ensure_model_table(pool: &PgPool, table: &str) -> Result<(), AppError> {
    validate_table_name(table)?;
    if let Some((schema, _)) = table.split_once('.') {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .execute(pool)
            .await?;
    }
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id BIGSERIAL PRIMARY KEY,
            data JSONB NOT NULL
        )
        "#,
        table
    );
    sqlx::query(&ddl).execute(pool).await?;
    tracing::info!(table = %table, "model table ready");
    Ok(())
}

/// Connect, creating the database first when it does not exist.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    ensure_database_exists(database_url).await?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create the database named in `database_url` if missing, connecting to the `postgres`
/// database on the same server to do so.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin, db_name) = admin_options(database_url)?;
    let db_name = match db_name {
        Some(name) if !name.is_empty() && name != "postgres" => name,
        _ => return Ok(()),
    };
    let mut conn: PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Options for the maintenance `postgres` database, plus the database the URL names.
fn admin_options(database_url: &str) -> Result<(PgConnectOptions, Option<String>), ConfigError> {
    let opts = PgConnectOptions::from_str(database_url)
        .map_err(|e| ConfigError::Load(format!("invalid DATABASE_URL: {}", e)))?;
    let db_name = opts.get_database().map(str::to_string);
    Ok((opts.database("postgres"), db_name))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
