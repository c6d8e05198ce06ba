use offeri_workflow::WorkflowError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Catalog task failed: {0}")]
    Task(String),
}

impl CatalogError {
    /// Storage failures surface to the workflow as an unavailable upstream.
    pub fn into_workflow(self, service: &str) -> WorkflowError {
        WorkflowError::upstream(service, self)
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
