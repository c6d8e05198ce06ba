use rusqlite::{OptionalExtension, Result, Row};

use super::{now_ts, CatalogStorage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub id: String,
    pub user_id: String,
    pub is_super_key: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationEvent {
    /// Owner of the key that ran the consultation; never the key itself.
    pub user_id: Option<String>,
    pub country: String,
    pub university_count: i64,
    pub detailed_programs: i64,
    pub concise_programs: i64,
    pub completed_at: i64,
}

impl CatalogStorage {
    pub fn insert_api_key(&self, key: &ApiKeyRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO api_keys (id, user_id, is_super_key, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (&key.id, &key.user_id, key.is_super_key, key.is_active, now_ts()),
        )?;
        Ok(())
    }

    pub fn find_api_key(&self, id: &str) -> Result<Option<ApiKeyRecord>> {
        self.conn
            .query_row(
                "SELECT id, user_id, is_super_key, is_active FROM api_keys WHERE id = ?1",
                [id],
                map_api_key_row,
            )
            .optional()
    }

    pub fn monthly_usage(&self, user_id: &str, year: i32, month: u32) -> Result<u32> {
        self.conn
            .query_row(
                "SELECT usage_count FROM mcp_usage WHERE user_id = ?1 AND year = ?2 AND month = ?3",
                (user_id, year, month),
                |row| row.get(0),
            )
            .optional()
            .map(|count| count.unwrap_or(0))
    }

    /// Adds one consultation to the user's monthly counter and returns the new count.
    pub fn increment_usage(&self, user_id: &str, year: i32, month: u32) -> Result<u32> {
        self.conn.query_row(
            "INSERT INTO mcp_usage (user_id, year, month, usage_count, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4)
             ON CONFLICT (user_id, year, month)
             DO UPDATE SET usage_count = mcp_usage.usage_count + 1, updated_at = excluded.updated_at
             RETURNING usage_count",
            (user_id, year, month, now_ts()),
            |row| row.get(0),
        )
    }

    pub fn insert_consultation_event(&self, event: &ConsultationEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO consultation_events (user_id, country, university_count, detailed_programs, concise_programs, completed_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &event.user_id,
                &event.country,
                event.university_count,
                event.detailed_programs,
                event.concise_programs,
                event.completed_at,
            ),
        )?;
        Ok(())
    }

    pub fn consultation_events(&self, user_id: Option<&str>) -> Result<Vec<ConsultationEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, country, university_count, detailed_programs, concise_programs, completed_at
             FROM consultation_events
             WHERE ?1 IS NULL OR user_id = ?1
             ORDER BY completed_at, id",
        )?;
        let rows = stmt.query_map([user_id], map_event_row)?;
        rows.collect()
    }
}

fn map_api_key_row(row: &Row<'_>) -> Result<ApiKeyRecord> {
    Ok(ApiKeyRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        is_super_key: row.get(2)?,
        is_active: row.get(3)?,
    })
}

fn map_event_row(row: &Row<'_>) -> Result<ConsultationEvent> {
    Ok(ConsultationEvent {
        user_id: row.get(0)?,
        country: row.get(1)?,
        university_count: row.get(2)?,
        detailed_programs: row.get(3)?,
        concise_programs: row.get(4)?,
        completed_at: row.get(5)?,
    })
}
