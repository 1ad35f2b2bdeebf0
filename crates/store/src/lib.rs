pub mod error;
pub mod memory;
pub mod postgres;
pub mod unit_of_work;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};
pub use postgres::{PgUnitOfWork, PostgresStore};
pub use unit_of_work::{Store, UnitOfWork, UnitOfWorkExt};
