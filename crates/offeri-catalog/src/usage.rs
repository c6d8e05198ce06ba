use async_trait::async_trait;
use offeri_workflow::{CompletionSummary, Result, UsageMeter};
use tracing::info;

use crate::handle::StorageHandle;
use crate::storage::ConsultationEvent;

/// Appends one `consultation_events` row per validated report, attributed to
/// the key's owner.
pub struct SqliteUsageMeter {
    storage: StorageHandle,
}

impl SqliteUsageMeter {
    pub fn new(storage: StorageHandle) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UsageMeter for SqliteUsageMeter {
    async fn record_completion(&self, summary: CompletionSummary) -> Result<()> {
        let api_key = summary.api_key;
        let mut event = ConsultationEvent {
            user_id: None,
            country: summary.country,
            university_count: summary.university_count as i64,
            detailed_programs: summary.detailed_programs as i64,
            concise_programs: summary.concise_programs as i64,
            completed_at: summary.completed_at.timestamp(),
        };
        let country = event.country.clone();

        self.storage
            .run(move |s| {
                // Unknown keys are recorded anonymously.
                if let Some(key) = api_key.as_deref() {
                    event.user_id = s.find_api_key(key)?.map(|record| record.user_id);
                }
                s.insert_consultation_event(&event)
            })
            .await
            .map_err(|e| e.into_workflow("usage meter"))?;
        info!("Recorded completed consultation for {}", country);
        Ok(())
    }
}
