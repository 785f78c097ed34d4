//! Repository abstraction and the two stores shipped with the crate.

mod memory;
mod postgres;
mod repository;
pub use memory::{InMemoryRepository, InMemoryStore};
pub use postgres::{PgRepository, PgStore};
pub use repository::{record_id, Id, Model, Patch, Repository, RepositoryProvider, ID_FIELD};
