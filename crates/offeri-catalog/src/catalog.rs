use async_trait::async_trait;
use offeri_core::{CountryCount, Program, ProgramId, ProgramSummary};
use offeri_workflow::{ProgramCatalog, Result};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::handle::StorageHandle;

const SERVICE: &str = "program catalog";

/// [`ProgramCatalog`] over the SQLite `programs` table.
#[derive(Clone)]
pub struct SqliteCatalog {
    storage: StorageHandle,
}

impl SqliteCatalog {
    pub fn new(storage: StorageHandle) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }
}

fn upstream(e: CatalogError) -> offeri_workflow::WorkflowError {
    warn!("Program catalog query failed: {}", e);
    e.into_workflow(SERVICE)
}

#[async_trait]
impl ProgramCatalog for SqliteCatalog {
    async fn available_countries(&self) -> Result<Vec<CountryCount>> {
        self.storage
            .run(|s| s.available_countries())
            .await
            .map_err(upstream)
    }

    async fn lookup_universities(&self, country: &str) -> Result<Vec<String>> {
        let country = country.to_string();
        let universities = self
            .storage
            .run(move |s| s.universities_in(&country))
            .await
            .map_err(upstream)?;
        debug!("Catalog returned {} universities", universities.len());
        Ok(universities)
    }

    async fn lookup_programs(
        &self,
        university: &str,
        classifications: &[String],
    ) -> Result<Vec<ProgramSummary>> {
        let university = university.to_string();
        let classifications = classifications.to_vec();
        self.storage
            .run(move |s| s.programs_for(&university, &classifications))
            .await
            .map_err(upstream)
    }

    async fn lookup_program_details(&self, ids: &[ProgramId]) -> Result<Vec<Program>> {
        let ids = ids.to_vec();
        self.storage
            .run(move |s| s.program_details(&ids))
            .await
            .map_err(upstream)
    }
}
