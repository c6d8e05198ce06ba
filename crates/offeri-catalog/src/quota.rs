// ABOUTME: Monthly consultation quota keyed by API key, backed by api_keys and mcp_usage
// ABOUTME: Super keys are unlimited; unknown, inactive or malformed keys are denied

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use offeri_workflow::{QuotaDecision, QuotaGate, Result};
use tracing::{debug, warn};

use crate::handle::StorageHandle;
use crate::storage::CatalogStorage;

pub const API_KEY_PREFIX: &str = "sk_";

pub struct SqliteQuotaGate {
    storage: StorageHandle,
    monthly_limit: u32,
}

impl SqliteQuotaGate {
    pub fn new(storage: StorageHandle, monthly_limit: u32) -> Self {
        Self {
            storage,
            monthly_limit,
        }
    }
}

fn deny(reason: impl Into<String>) -> QuotaDecision {
    QuotaDecision::Deny {
        reason: reason.into(),
    }
}

/// Check and increment under one lock so concurrent callers cannot both take the last slot.
fn decide(
    storage: &CatalogStorage,
    api_key: Option<&str>,
    limit: u32,
    year: i32,
    month: u32,
) -> rusqlite::Result<QuotaDecision> {
    let Some(key) = api_key else {
        return Ok(deny("an API key is required to start a consultation"));
    };
    if !key.starts_with(API_KEY_PREFIX) {
        return Ok(deny(format!("API keys start with \"{}\"", API_KEY_PREFIX)));
    }

    let Some(record) = storage.find_api_key(key)? else {
        return Ok(deny("unknown API key"));
    };
    if !record.is_active {
        return Ok(deny("API key is inactive"));
    }
    if record.is_super_key {
        return Ok(QuotaDecision::Allow);
    }

    let used = storage.monthly_usage(&record.user_id, year, month)?;
    if used >= limit {
        return Ok(deny(format!(
            "monthly consultation limit reached ({}/{}); resets at the start of next month",
            used, limit
        )));
    }

    let count = storage.increment_usage(&record.user_id, year, month)?;
    debug!("Consultation {}/{} this month for user {}", count, limit, record.user_id);
    Ok(QuotaDecision::Allow)
}

#[async_trait]
impl QuotaGate for SqliteQuotaGate {
    async fn check_and_increment(&self, api_key: Option<&str>) -> Result<QuotaDecision> {
        let api_key = api_key.map(str::to_string);
        let limit = self.monthly_limit;
        let now = Utc::now();
        let (year, month) = (now.year(), now.month());

        self.storage
            .run(move |s| decide(s, api_key.as_deref(), limit, year, month))
            .await
            .map_err(|e| {
                warn!("Quota check failed: {}", e);
                e.into_workflow("quota store")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ApiKeyRecord;

    fn storage() -> CatalogStorage {
        let storage = CatalogStorage::open_in_memory().unwrap();
        storage.init().unwrap();
        storage
            .insert_api_key(&ApiKeyRecord {
                id: "sk_regular".into(),
                user_id: "user-1".into(),
                is_super_key: false,
                is_active: true,
            })
            .unwrap();
        storage
            .insert_api_key(&ApiKeyRecord {
                id: "sk_super".into(),
                user_id: "admin".into(),
                is_super_key: true,
                is_active: true,
            })
            .unwrap();
        storage
            .insert_api_key(&ApiKeyRecord {
                id: "sk_revoked".into(),
                user_id: "user-2".into(),
                is_super_key: false,
                is_active: false,
            })
            .unwrap();
        storage
    }

    #[test]
    fn regular_key_denied_once_limit_reached() {
        let storage = storage();
        for _ in 0..2 {
            assert_eq!(
                decide(&storage, Some("sk_regular"), 2, 2026, 3).unwrap(),
                QuotaDecision::Allow
            );
        }
        assert!(matches!(
            decide(&storage, Some("sk_regular"), 2, 2026, 3).unwrap(),
            QuotaDecision::Deny { .. }
        ));
        assert_eq!(storage.monthly_usage("user-1", 2026, 3).unwrap(), 2);

        // new month, fresh counter
        assert_eq!(
            decide(&storage, Some("sk_regular"), 2, 2026, 4).unwrap(),
            QuotaDecision::Allow
        );
    }

    #[test]
    fn super_key_is_unlimited_and_uncounted() {
        let storage = storage();
        for _ in 0..5 {
            assert_eq!(
                decide(&storage, Some("sk_super"), 1, 2026, 3).unwrap(),
                QuotaDecision::Allow
            );
        }
        assert_eq!(storage.monthly_usage("admin", 2026, 3).unwrap(), 0);
    }

    #[test]
    fn malformed_unknown_and_inactive_keys_denied() {
        let storage = storage();
        for key in [None, Some("pk_regular"), Some("sk_missing"), Some("sk_revoked")] {
            assert!(
                matches!(
                    decide(&storage, key, 10, 2026, 3).unwrap(),
                    QuotaDecision::Deny { .. }
                ),
                "{key:?} should be denied"
            );
        }
    }
}
