//! PostgreSQL store: one `(id BIGSERIAL, data JSONB)` table per model.
//! A session keeps one open transaction while it has uncommitted writes.

use crate::error::{AppError, ConfigError};
use crate::service::repository::{
    from_record, merge_patch, patch_id, record_id, to_record, Id, Model, Patch, Repository, RepositoryProvider,
    ID_FIELD,
};
use crate::store::{ensure_model_table, validate_table_name};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::marker::PhantomData;
use tokio::sync::Mutex;

type Tx = Transaction<'static, Postgres>;

/// Provider of [`PgRepository`] sessions over one table.
pub struct PgStore<T> {
    pool: PgPool,
    table: String,
    _model: PhantomData<fn() -> T>,
}

impl<T> Clone for PgStore<T> {
    fn clone(&self) -> Self {
        PgStore {
            pool: self.pool.clone(),
            table: self.table.clone(),
            _model: PhantomData,
        }
    }
}

impl<T: Model> PgStore<T> {
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, ConfigError> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(PgStore {
            pool,
            table,
            _model: PhantomData,
        })
    }

    pub async fn ensure_table(&self) -> Result<(), AppError> {
        ensure_model_table(&self.pool, &self.table).await
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn session(&self) -> PgRepository<T> {
        PgRepository {
            pool: self.pool.clone(),
            table: self.table.clone(),
            tx: Mutex::new(None),
            _model: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Model> RepositoryProvider<T> for PgStore<T> {
    type Repository = PgRepository<T>;

    async fn provide(&self) -> Result<Self::Repository, AppError> {
        Ok(self.session())
    }
}

pub struct PgRepository<T> {
    pool: PgPool,
    table: String,
    /// Open while there are uncommitted writes; dropping it rolls them back.
    tx: Mutex<Option<Tx>>,
    _model: PhantomData<fn() -> T>,
}

async fn open<'a>(pool: &PgPool, slot: &'a mut Option<Tx>) -> Result<&'a mut Tx, AppError> {
    let tx = match slot.take() {
        Some(tx) => tx,
        None => pool.begin().await?,
    };
    Ok(slot.insert(tx))
}

/// Commit when asked; a failed write rolls the whole unit of work back.
async fn settle<V: Send>(slot: &mut Option<Tx>, result: Result<V, AppError>, commit: bool) -> Result<V, AppError> {
    match result {
        Ok(v) => {
            if commit {
                if let Some(tx) = slot.take() {
                    tx.commit().await?;
                }
            }
            Ok(v)
        }
        Err(e) => {
            if let Some(tx) = slot.take() {
                if let Err(rb) = tx.rollback().await {
                    tracing::warn!(error = %rb, "rollback after failed write");
                }
            }
            Err(e)
        }
    }
}

/// Serialized record without its id, plus the id when one was given.
fn split_record<T: Model>(data: &T) -> Result<(Option<Id>, Value), AppError> {
    let mut record = to_record(data)?;
    let id = record_id(&record)?;
    record.remove(ID_FIELD);
    Ok((id, Value::Object(record)))
}

fn into_model<T: Model>(id: Id, data: Value) -> Result<T, AppError> {
    let mut record = match data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    record.insert(ID_FIELD.to_string(), Value::from(id));
    from_record(record)
}

impl<T: Model> PgRepository<T> {
    async fn insert(&self, conn: &mut PgConnection, id: Option<Id>, data: Value) -> Result<(Id, Value), AppError> {
        let row = match id {
            Some(id) => {
                let sql = format!("INSERT INTO {} (id, data) VALUES ($1, $2) RETURNING id, data", self.table);
                tracing::debug!(sql = %sql, id, "query");
                let row = sqlx::query_as::<_, (Id, Value)>(&sql)
                    .bind(id)
                    .bind(data)
                    .fetch_one(&mut *conn)
                    .await?;
                // keep the sequence ahead of explicit ids
                let bump = format!(
                    "SELECT setval(pg_get_serial_sequence('{t}', 'id'), GREATEST((SELECT MAX(id) FROM {t}), 1))",
                    t = self.table
                );
                sqlx::query(&bump).execute(&mut *conn).await?;
                row
            }
            None => {
                let sql = format!("INSERT INTO {} (data) VALUES ($1) RETURNING id, data", self.table);
                tracing::debug!(sql = %sql, "query");
                sqlx::query_as::<_, (Id, Value)>(&sql)
                    .bind(data)
                    .fetch_one(&mut *conn)
                    .await?
            }
        };
        Ok(row)
    }

    async fn merge(&self, conn: &mut PgConnection, id: Id, patch: Patch) -> Result<(Id, Value), AppError> {
        let select = format!("SELECT data FROM {} WHERE id = $1 FOR UPDATE", self.table);
        tracing::debug!(sql = %select, id, "query");
        let (current,): (Value,) = sqlx::query_as(&select)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        let mut record = match current {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merge_patch(&mut record, patch);
        record.insert(ID_FIELD.to_string(), Value::from(id));
        let model: T = from_record(record)?;
        let mut data = to_record(&model)?;
        data.remove(ID_FIELD);

        let update = format!("UPDATE {} SET data = $2 WHERE id = $1 RETURNING id, data", self.table);
        tracing::debug!(sql = %update, id, "query");
        let row = sqlx::query_as::<_, (Id, Value)>(&update)
            .bind(id)
            .bind(Value::Object(data))
            .fetch_one(&mut *conn)
            .await?;
        Ok(row)
    }

    async fn remove(&self, conn: &mut PgConnection, id: Id) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING id", self.table);
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query_as::<_, (Id,)>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<T: Model> Repository<T> for PgRepository<T> {
    async fn list(&self) -> Result<Vec<T>, AppError> {
        let sql = format!("SELECT id, data FROM {} ORDER BY id", self.table);
        tracing::debug!(sql = %sql, "query");
        let mut slot = self.tx.lock().await;
        let rows = match slot.as_mut() {
            Some(tx) => sqlx::query_as::<_, (Id, Value)>(&sql).fetch_all(&mut **tx).await?,
            None => sqlx::query_as::<_, (Id, Value)>(&sql).fetch_all(&self.pool).await?,
        };
        rows.into_iter().map(|(id, data)| into_model(id, data)).collect()
    }

    async fn get(&self, id: Id) -> Result<T, AppError> {
        let sql = format!("SELECT id, data FROM {} WHERE id = $1", self.table);
        tracing::debug!(sql = %sql, id, "query");
        let mut slot = self.tx.lock().await;
        let row = match slot.as_mut() {
            Some(tx) => sqlx::query_as::<_, (Id, Value)>(&sql).bind(id).fetch_optional(&mut **tx).await?,
            None => sqlx::query_as::<_, (Id, Value)>(&sql).bind(id).fetch_optional(&self.pool).await?,
        };
        let (id, data) = row.ok_or_else(|| AppError::NotFound(id.to_string()))?;
        into_model(id, data)
    }

    async fn add(&self, data: T, commit: bool) -> Result<T, AppError> {
        let mut slot = self.tx.lock().await;
        let result = async {
            let (id, record) = split_record(&data)?;
            let tx = open(&self.pool, &mut slot).await?;
            self.insert(&mut **tx, id, record).await
        }
        .await;
        let (id, data) = settle(&mut slot, result, commit).await?;
        into_model(id, data)
    }

    async fn update(&self, patch: Patch, commit: bool) -> Result<T, AppError> {
        let mut slot = self.tx.lock().await;
        let result = async {
            let id = patch_id(&patch)?;
            let tx = open(&self.pool, &mut slot).await?;
            self.merge(&mut **tx, id, patch).await
        }
        .await;
        let (id, data) = settle(&mut slot, result, commit).await?;
        into_model(id, data)
    }

    async fn delete(&self, id: Id, commit: bool) -> Result<(), AppError> {
        let mut slot = self.tx.lock().await;
        let result = async {
            let tx = open(&self.pool, &mut slot).await?;
            self.remove(&mut **tx, id).await
        }
        .await;
        settle(&mut slot, result, commit).await
    }

    async fn commit(&self) -> Result<(), AppError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), AppError> {
        if let Some(tx) = self.tx.lock().await.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}
