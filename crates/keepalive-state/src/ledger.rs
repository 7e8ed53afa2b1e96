//! StatusLedger — shared `url → HealthRecord` map.
//!
//! Written only by the pipeline handling a target's tick, read at any
//! time by status queries. Every write swaps in a complete record under
//! the write lock, so a reader sees either the old record or the new
//! one, never a mix.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::*;

/// Thread-safe in-memory status ledger.
#[derive(Clone, Default)]
pub struct StatusLedger {
    records: Arc<RwLock<HashMap<TargetUrl, HealthRecord>>>,
}

impl StatusLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an `Unknown` record for every target that has none yet.
    pub async fn register<'a>(&self, targets: impl IntoIterator<Item = &'a Target>) {
        let mut records = self.records.write().await;
        for target in targets {
            records
                .entry(target.url.clone())
                .or_insert_with(HealthRecord::unknown);
        }
        debug!(count = records.len(), "ledger seeded");
    }

    /// Latest record for `url`, if one exists.
    pub async fn get(&self, url: &str) -> Option<HealthRecord> {
        self.records.read().await.get(url).cloned()
    }

    /// Replace the record for `url` with `f(current)`.
    ///
    /// The read and the replacement happen under one write lock. A
    /// missing record is treated as `HealthRecord::unknown()`.
    pub async fn update<F>(&self, url: &str, f: F) -> HealthRecord
    where
        F: FnOnce(&HealthRecord) -> HealthRecord,
    {
        let mut records = self.records.write().await;
        let next = match records.get(url) {
            Some(current) => f(current),
            None => f(&HealthRecord::unknown()),
        };
        records.insert(url.to_string(), next.clone());
        next
    }

    /// Point-in-time copy of every record, ordered by url.
    pub async fn snapshot(&self) -> BTreeMap<TargetUrl, HealthRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .map(|(url, record)| (url.clone(), record.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;

    fn roster() -> Vec<Target> {
        vec![
            Target::new("https://b.example/healthz", Duration::from_secs(600)),
            Target::new("https://a.example/healthz", Duration::from_secs(300))
                .with_restart("owner/a"),
        ]
    }

    #[tokio::test]
    async fn register_seeds_unknown_records() {
        let ledger = StatusLedger::new();
        assert!(ledger.is_empty().await);

        ledger.register(&roster()).await;
        assert_eq!(ledger.len().await, 2);
        assert_eq!(
            ledger.get("https://a.example/healthz").await,
            Some(HealthRecord::unknown())
        );
    }

    #[tokio::test]
    async fn register_does_not_clobber_existing_records() {
        let ledger = StatusLedger::new();
        ledger
            .update("https://a.example/healthz", |r| {
                r.observe(Outcome::Failed, 3, Utc::now())
            })
            .await;

        ledger.register(&roster()).await;
        let record = ledger.get("https://a.example/healthz").await.unwrap();
        assert_eq!(record.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn update_starts_from_unknown_when_missing() {
        let ledger = StatusLedger::new();
        let record = ledger
            .update("https://new.example/healthz", |r| {
                r.observe(Outcome::Ok, 1, Utc::now())
            })
            .await;
        assert_eq!(record.outcome, Outcome::Ok);
        assert_eq!(ledger.get("https://new.example/healthz").await, Some(record));
    }

    #[tokio::test]
    async fn snapshot_is_ordered_by_url() {
        let ledger = StatusLedger::new();
        ledger.register(&roster()).await;

        let urls: Vec<_> = ledger.snapshot().await.into_keys().collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/healthz".to_string(),
                "https://b.example/healthz".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn concurrent_updates_to_distinct_keys() {
        let ledger = StatusLedger::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let url = format!("https://t{i}.example/healthz");
                for _ in 0..10 {
                    ledger
                        .update(&url, |r| r.observe(Outcome::Failed, 3, Utc::now()))
                        .await;
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let snapshot = ledger.snapshot().await;
        assert_eq!(snapshot.len(), 16);
        assert!(snapshot.values().all(|r| r.consecutive_failures == 10));
    }
}
