use offeri_catalog::{SqliteCatalog, SqliteQuotaGate, SqliteUsageMeter, StorageHandle};
use offeri_core::OfferiConfig;
use offeri_workflow::{InMemoryTokenStore, QuotaGate, TokenStore, UnmeteredQuota, WorkflowEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::McpServerError;
use crate::official_server::OfferiMcpServer;

/// Wires the SQLite catalog, quota and usage meter into a server.
///
/// The token store is returned alongside so the caller can run the janitor on it.
pub fn build_server(
    config: &OfferiConfig,
) -> Result<(OfferiMcpServer, Arc<dyn TokenStore>), McpServerError> {
    let storage = StorageHandle::open(&config.catalog.database_path)?;

    let quota: Arc<dyn QuotaGate> = if config.quota.enabled {
        Arc::new(SqliteQuotaGate::new(
            storage.clone(),
            config.quota.monthly_limit,
        ))
    } else {
        Arc::new(UnmeteredQuota)
    };

    let ttl = config.tokens.ttl_seconds.map(Duration::from_secs);
    let tokens: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::with_ttl(ttl));

    let engine = WorkflowEngine::builder()
        .token_store(Arc::clone(&tokens))
        .catalog(Arc::new(SqliteCatalog::new(storage.clone())))
        .quota(quota)
        .usage_meter(Arc::new(SqliteUsageMeter::new(storage)))
        .config(config.workflow.clone())
        .build()?;

    info!(
        "Server wired: quota {}, token TTL {:?}",
        if config.quota.enabled { "enforced" } else { "off" },
        ttl
    );

    let server = OfferiMcpServer::new(Arc::new(engine), config.quota.api_key.clone());
    Ok((server, tokens))
}
