// ABOUTME: Continuation token store mapping opaque tokens to immutable step payloads
// ABOUTME: In-memory DashMap implementation with an optional time-to-live

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::payload::{StepData, StepKind, StepPayload};

/// Insert-only store of step payloads keyed by unguessable tokens.
pub trait TokenStore: Send + Sync {
    /// Store `payload` under a freshly minted token.
    fn put(&self, payload: StepPayload) -> String;

    /// Read a payload, checking it was produced by the `expected` step.
    fn get(&self, token: &str, expected: StepKind) -> Result<StepPayload>;

    /// Drop expired entries, returning how many were removed.
    fn purge_expired(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed read: fetches the token and unwraps the payload variant for `T`.
pub fn fetch<T: StepData>(store: &dyn TokenStore, token: &str) -> Result<T> {
    let payload = store.get(token, T::KIND)?;
    let actual = payload.kind();
    T::from_payload(payload).ok_or_else(|| WorkflowError::WrongStepType {
        token: token.to_string(),
        expected: T::KIND,
        actual,
    })
}

/// Typed write.
pub fn mint<T: StepData>(store: &dyn TokenStore, data: T) -> String {
    store.put(data.into_payload())
}

struct TokenEntry {
    kind: StepKind,
    payload: StepPayload,
    created_at: Instant,
}

impl TokenEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.map(|ttl| self.created_at.elapsed() > ttl)
            .unwrap_or(false)
    }
}

/// Process-wide token store. Tokens live forever unless a TTL is configured.
pub struct InMemoryTokenStore {
    entries: DashMap<String, TokenEntry>,
    ttl: Option<Duration>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn mint_token(kind: StepKind) -> String {
        format!("{}_{}", kind.token_prefix(), Uuid::new_v4().simple())
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn put(&self, payload: StepPayload) -> String {
        let kind = payload.kind();
        let token = Self::mint_token(kind);
        self.entries.insert(
            token.clone(),
            TokenEntry {
                kind,
                payload,
                created_at: Instant::now(),
            },
        );
        debug!("Minted {} token {}", kind, token);
        token
    }

    fn get(&self, token: &str, expected: StepKind) -> Result<StepPayload> {
        let expired = match self.entries.get(token) {
            None => {
                return Err(WorkflowError::InvalidToken {
                    token: token.to_string(),
                })
            }
            Some(entry) if entry.is_expired(self.ttl) => true,
            Some(entry) => {
                if entry.kind != expected {
                    return Err(WorkflowError::WrongStepType {
                        token: token.to_string(),
                        expected,
                        actual: entry.kind,
                    });
                }
                return Ok(entry.payload.clone());
            }
        };

        // The read guard is released above; removing while holding it would deadlock.
        if expired {
            self.entries.remove(token);
            debug!("Token {} expired", token);
        }
        Err(WorkflowError::InvalidToken {
            token: token.to_string(),
        })
    }

    fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(Some(ttl)));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ClassificationPayload, ConsultationContext, SelectionPayload};
    use crate::policy::Strategy;

    fn selection() -> SelectionPayload {
        SelectionPayload {
            context: ConsultationContext {
                background: "Economics graduate moving into data science".to_string(),
                country: "USA".to_string(),
                strategy: Strategy::Aggressive,
                universities: vec!["A".to_string()],
            },
            research: vec![],
        }
    }

    #[test]
    fn tokens_are_unique_and_prefixed() {
        let store = InMemoryTokenStore::new();
        let a = mint(&store, selection());
        let b = mint(&store, selection());
        assert_ne!(a, b);
        assert!(a.starts_with("sel_"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reads_are_idempotent() {
        let store = InMemoryTokenStore::new();
        let token = mint(&store, selection());
        let first: SelectionPayload = fetch(&store, &token).unwrap();
        let second: SelectionPayload = fetch(&store, &token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_token_is_invalid() {
        let store = InMemoryTokenStore::new();
        let err = fetch::<SelectionPayload>(&store, "sel_doesnotexist").unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidToken { .. }));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let store = InMemoryTokenStore::new();
        let token = mint(&store, selection());
        let err = fetch::<ClassificationPayload>(&store, &token).unwrap_err();
        match err {
            WorkflowError::WrongStepType {
                expected, actual, ..
            } => {
                assert_eq!(expected, StepKind::Classification);
                assert_eq!(actual, StepKind::Selection);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn expired_tokens_become_invalid() {
        let store = InMemoryTokenStore::with_ttl(Some(Duration::from_millis(10)));
        let token = mint(&store, selection());
        std::thread::sleep(Duration::from_millis(30));
        let err = fetch::<SelectionPayload>(&store, &token).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidToken { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn purge_only_runs_with_ttl() {
        let unbounded = InMemoryTokenStore::new();
        mint(&unbounded, selection());
        assert_eq!(unbounded.purge_expired(), 0);
        assert_eq!(unbounded.len(), 1);

        let bounded = InMemoryTokenStore::with_ttl(Some(Duration::from_millis(5)));
        mint(&bounded, selection());
        mint(&bounded, selection());
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(bounded.purge_expired(), 2);
        assert!(bounded.is_empty());
    }
}
