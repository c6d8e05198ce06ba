//! SQLite-backed collaborators for the consultation workflow: the program
//! catalog, the monthly quota gate and the completion usage meter.

pub mod catalog;
pub mod error;
pub mod handle;
pub mod quota;
pub mod storage;
pub mod usage;

pub use catalog::SqliteCatalog;
pub use error::{CatalogError, Result};
pub use handle::StorageHandle;
pub use quota::SqliteQuotaGate;
pub use storage::{ApiKeyRecord, CatalogStorage, ConsultationEvent, NewProgram};
pub use usage::SqliteUsageMeter;
