//! In-process store. Records live as JSON objects keyed by id, so list order is id order.

use crate::error::AppError;
use crate::service::repository::{
    from_record, merge_patch, patch_id, record_id, to_record, Id, Model, Patch, Repository, RepositoryProvider,
    ID_FIELD,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Record = Map<String, Value>;

struct Table {
    rows: BTreeMap<Id, Record>,
    /// Ids staged for insert by open sessions. No other session may claim them.
    reserved: BTreeSet<Id>,
    /// Next id to hand out. Like a database sequence it is not rolled back.
    next_id: Id,
}

impl Default for Table {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            reserved: BTreeSet::new(),
            next_id: 1,
        }
    }
}

/// Shared store; cheap to clone. Acts as the provider for [`InMemoryRepository`] sessions.
pub struct InMemoryStore<T> {
    table: Arc<RwLock<Table>>,
    _model: PhantomData<fn() -> T>,
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        InMemoryStore {
            table: Arc::clone(&self.table),
            _model: PhantomData,
        }
    }
}

impl<T: Model> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Model> InMemoryStore<T> {
    pub fn new() -> Self {
        InMemoryStore {
            table: Arc::new(RwLock::new(Table::default())),
            _model: PhantomData,
        }
    }

    /// Store pre-filled with `records` (committed).
    pub async fn with_records<I>(records: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T> + Send,
        I::IntoIter: Send,
    {
        let store = Self::new();
        let session = store.session();
        for record in records {
            session.add(record, false).await?;
        }
        session.commit().await?;
        Ok(store)
    }

    pub fn session(&self) -> InMemoryRepository<T> {
        InMemoryRepository {
            table: Arc::clone(&self.table),
            pending: Mutex::new(Vec::new()),
            _model: PhantomData,
        }
    }

    /// Number of committed records.
    pub fn len(&self) -> Result<usize, AppError> {
        Ok(read(&self.table)?.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl<T: Model> RepositoryProvider<T> for InMemoryStore<T> {
    type Repository = InMemoryRepository<T>;

    async fn provide(&self) -> Result<Self::Repository, AppError> {
        Ok(self.session())
    }
}

enum Change {
    /// New record under an id reserved in the table.
    Insert(Id, Record),
    Put(Id, Record),
    Remove(Id),
}

/// One unit of work over an [`InMemoryStore`]. Its own pending writes are visible to it;
/// other sessions see them only after commit. Dropping the session discards them.
pub struct InMemoryRepository<T> {
    table: Arc<RwLock<Table>>,
    pending: Mutex<Vec<Change>>,
    _model: PhantomData<fn() -> T>,
}

fn read(table: &RwLock<Table>) -> Result<RwLockReadGuard<'_, Table>, AppError> {
    table.read().map_err(|_| AppError::Internal("store lock poisoned".into()))
}

fn write(table: &RwLock<Table>) -> Result<RwLockWriteGuard<'_, Table>, AppError> {
    table.write().map_err(|_| AppError::Internal("store lock poisoned".into()))
}

/// Give back the ids reserved by staged inserts in `changes`.
fn release(table: &mut Table, changes: &[Change]) {
    for change in changes {
        if let Change::Insert(id, _) = change {
            table.reserved.remove(id);
        }
    }
}

impl<T> Drop for InMemoryRepository<T> {
    fn drop(&mut self) {
        let changes = match self.pending.get_mut() {
            Ok(pending) => std::mem::take(pending),
            Err(_) => return,
        };
        if changes.iter().any(|c| matches!(c, Change::Insert(..))) {
            if let Ok(mut table) = self.table.write() {
                release(&mut table, &changes);
            }
        }
    }
}

impl<T: Model> InMemoryRepository<T> {
    fn pending(&self) -> Result<MutexGuard<'_, Vec<Change>>, AppError> {
        self.pending
            .lock()
            .map_err(|_| AppError::Internal("session lock poisoned".into()))
    }

    /// Committed rows with this session's pending changes applied.
    fn view(&self) -> Result<BTreeMap<Id, Record>, AppError> {
        let mut rows = read(&self.table)?.rows.clone();
        for change in self.pending()?.iter() {
            match change {
                Change::Insert(id, record) | Change::Put(id, record) => {
                    rows.insert(*id, record.clone());
                }
                Change::Remove(id) => {
                    rows.remove(id);
                }
            }
        }
        Ok(rows)
    }

    /// Whether `id` exists as this session sees it, given the locked table.
    fn visible(&self, table: &Table, id: Id) -> Result<bool, AppError> {
        let mut present = table.rows.contains_key(&id);
        for change in self.pending()?.iter() {
            match change {
                Change::Insert(c, _) | Change::Put(c, _) if *c == id => present = true,
                Change::Remove(c) if *c == id => present = false,
                _ => {}
            }
        }
        Ok(present)
    }

    fn find(&self, id: Id) -> Result<Record, AppError> {
        self.view()?
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    fn stage(&self, change: Change) -> Result<(), AppError> {
        self.pending()?.push(change);
        Ok(())
    }

    /// Claim an id under the table lock and stage the insert.
    fn stage_insert(&self, data: &T) -> Result<T, AppError> {
        let mut record = to_record(data)?;
        let requested = record_id(&record)?;
        let mut table = write(&self.table)?;
        let id = match requested {
            Some(id) => {
                if table.reserved.contains(&id) || self.visible(&table, id)? {
                    return Err(AppError::Conflict(format!("{} {} already exists", ID_FIELD, id)));
                }
                if let Some(after) = id.checked_add(1) {
                    table.next_id = table.next_id.max(after);
                } else {
                    table.next_id = Id::MAX;
                }
                id
            }
            None => {
                let id = table.next_id;
                // only reachable once the sequence is pinned at Id::MAX
                if table.reserved.contains(&id) || self.visible(&table, id)? {
                    return Err(AppError::Internal("id sequence exhausted".into()));
                }
                table.next_id = id.checked_add(1).unwrap_or(id);
                id
            }
        };
        record.insert(ID_FIELD.to_string(), Value::from(id));
        let created: T = from_record(record.clone())?;
        table.reserved.insert(id);
        self.stage(Change::Insert(id, record))?;
        Ok(created)
    }

    fn stage_update(&self, patch: Patch) -> Result<T, AppError> {
        let id = patch_id(&patch)?;
        let mut record = self.find(id)?;
        merge_patch(&mut record, patch);
        record.insert(ID_FIELD.to_string(), Value::from(id));
        let updated: T = from_record(record)?;
        self.stage(Change::Put(id, to_record(&updated)?))?;
        Ok(updated)
    }

    fn stage_delete(&self, id: Id) -> Result<(), AppError> {
        self.find(id)?;
        self.stage(Change::Remove(id))
    }

    fn apply_pending(&self) -> Result<usize, AppError> {
        let changes: Vec<Change> = std::mem::take(&mut *self.pending()?);
        let count = changes.len();
        let mut table = write(&self.table)?;
        for change in changes {
            match change {
                Change::Insert(id, record) => {
                    table.reserved.remove(&id);
                    table.rows.insert(id, record);
                }
                Change::Put(id, record) => {
                    table.rows.insert(id, record);
                }
                Change::Remove(id) => {
                    table.rows.remove(&id);
                }
            }
        }
        Ok(count)
    }

    fn discard(&self) -> Result<usize, AppError> {
        let changes: Vec<Change> = std::mem::take(&mut *self.pending()?);
        release(&mut *write(&self.table)?, &changes);
        Ok(changes.len())
    }

    /// Commit when asked; a failed write throws away the whole pending unit of work.
    async fn settle<V: Send>(&self, result: Result<V, AppError>, commit: bool) -> Result<V, AppError> {
        match result {
            Ok(v) => {
                if commit {
                    self.commit().await?;
                }
                Ok(v)
            }
            Err(e) => {
                match self.discard() {
                    Ok(dropped) if dropped > 0 => {
                        tracing::debug!(changes = dropped, error = %e, "pending writes discarded after failed write")
                    }
                    Ok(_) => {}
                    Err(d) => tracing::warn!(error = %d, "discard after failed write"),
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<T: Model> Repository<T> for InMemoryRepository<T> {
    async fn list(&self) -> Result<Vec<T>, AppError> {
        self.view()?.into_values().map(from_record).collect()
    }

    async fn get(&self, id: Id) -> Result<T, AppError> {
        from_record(self.find(id)?)
    }

    async fn add(&self, data: T, commit: bool) -> Result<T, AppError> {
        let result = self.stage_insert(&data);
        self.settle(result, commit).await
    }

    async fn update(&self, patch: Patch, commit: bool) -> Result<T, AppError> {
        let result = self.stage_update(patch);
        self.settle(result, commit).await
    }

    async fn delete(&self, id: Id, commit: bool) -> Result<(), AppError> {
        let result = self.stage_delete(id);
        self.settle(result, commit).await
    }

    async fn commit(&self) -> Result<(), AppError> {
        let applied = self.apply_pending()?;
        tracing::debug!(changes = applied, "in-memory commit");
        Ok(())
    }

    async fn rollback(&self) -> Result<(), AppError> {
        let dropped = self.discard()?;
        tracing::debug!(changes = dropped, "in-memory rollback");
        Ok(())
    }
}
