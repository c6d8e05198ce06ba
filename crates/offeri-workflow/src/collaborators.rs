//! Interfaces to the services the workflow depends on but does not own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use offeri_core::{CountryCount, Program, ProgramId, ProgramSummary};
use serde::Serialize;

use crate::error::Result;

/// Read-only program catalog. Failures surface as `UpstreamUnavailable`
/// and abort the step (fail-closed).
#[async_trait]
pub trait ProgramCatalog: Send + Sync {
    async fn available_countries(&self) -> Result<Vec<CountryCount>>;

    /// Universities in `country`, most programs first. Empty when the country is unknown.
    async fn lookup_universities(&self, country: &str) -> Result<Vec<String>>;

    /// Programs at `university` tagged with any of `classifications`
    /// (all programs when the filter is empty).
    async fn lookup_programs(
        &self,
        university: &str,
        classifications: &[String],
    ) -> Result<Vec<ProgramSummary>>;

    /// Details for the requested ids; unknown ids are simply absent from the result.
    async fn lookup_program_details(&self, ids: &[ProgramId]) -> Result<Vec<Program>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allow,
    Deny { reason: String },
}

/// Per-key monthly consultation counter checked before a consultation starts.
#[async_trait]
pub trait QuotaGate: Send + Sync {
    async fn check_and_increment(&self, api_key: Option<&str>) -> Result<QuotaDecision>;
}

/// Quota gate used when enforcement is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnmeteredQuota;

#[async_trait]
impl QuotaGate for UnmeteredQuota {
    async fn check_and_increment(&self, _api_key: Option<&str>) -> Result<QuotaDecision> {
        Ok(QuotaDecision::Allow)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionSummary {
    pub api_key: Option<String>,
    pub country: String,
    pub university_count: usize,
    pub detailed_programs: usize,
    pub concise_programs: usize,
    pub completed_at: DateTime<Utc>,
}

/// Fire-and-forget hook invoked when a consultation's report validates.
#[async_trait]
pub trait UsageMeter: Send + Sync {
    async fn record_completion(&self, summary: CompletionSummary) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageMeter;

#[async_trait]
impl UsageMeter for NoopUsageMeter {
    async fn record_completion(&self, _summary: CompletionSummary) -> Result<()> {
        Ok(())
    }
}
