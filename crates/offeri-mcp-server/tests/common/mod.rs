#![allow(dead_code)]

use offeri_catalog::{ApiKeyRecord, NewProgram, SqliteCatalog, SqliteQuotaGate, StorageHandle};
use offeri_mcp_server::OfferiMcpServer;
use offeri_workflow::WorkflowEngine;
use rmcp::model::CallToolResult;
use serde_json::Value;
use std::sync::Arc;

pub const SWISS: [&str; 3] = ["EPFL", "ETH Zurich", "University of Zurich"];

/// Three Swiss universities with two CS programs and one law program each.
pub fn seeded_storage() -> StorageHandle {
    let handle = StorageHandle::open_in_memory().expect("in-memory catalog");
    handle
        .with(|s| {
            for (u, university) in SWISS.iter().enumerate() {
                for (j, (name, tag)) in [
                    ("MSc Computer Science", "Computer Science & IT"),
                    ("MSc Data Science", "Data Science & Analytics"),
                    ("LLM International Law", "Law"),
                ]
                .iter()
                .enumerate()
                {
                    s.insert_program(&NewProgram {
                        program_id: (u * 10 + j + 1) as i64,
                        program_name: name.to_string(),
                        university_name: university.to_string(),
                        country: "Switzerland".to_string(),
                        degree_type: Some("Master".to_string()),
                        classifications: vec![tag.to_string()],
                        ..Default::default()
                    })?;
                }
            }
            s.insert_api_key(&ApiKeyRecord {
                id: "sk_test".into(),
                user_id: "tester".into(),
                is_super_key: false,
                is_active: true,
            })
        })
        .expect("seed catalog");
    handle
}

pub fn server_with(storage: StorageHandle, monthly_limit: Option<u32>, default_key: Option<&str>) -> OfferiMcpServer {
    let mut builder = WorkflowEngine::builder().catalog(Arc::new(SqliteCatalog::new(storage.clone())));
    if let Some(limit) = monthly_limit {
        builder = builder.quota(Arc::new(SqliteQuotaGate::new(storage, limit)));
    }
    let engine = builder.build().expect("engine");
    OfferiMcpServer::new(Arc::new(engine), default_key.map(str::to_string))
}

pub fn server() -> OfferiMcpServer {
    server_with(seeded_storage(), None, None)
}

pub fn json_body(result: &CallToolResult) -> Value {
    let text = &result.content[0].as_text().expect("text content").text;
    serde_json::from_str(text).expect("tool output is JSON")
}

pub fn background() -> String {
    "BSc Computer Science, GPA 3.7, two years as a backend engineer, aiming for ML research".to_string()
}
