//! Batched ID allocation over the `sequences` table.
//!
//! The stored `leased_until` is the highest ID any process may have handed
//! out. An allocator reserves `bandwidth` IDs per commit and serves them from
//! memory; after a crash the next process starts above the stored ceiling,
//! leaving a gap but never reusing an ID.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{DomainError, DomainResult, IdAllocator, InfraError};
use crate::infrastructure::database::entities::sequence;
use crate::shared::utills::{retry_with_backoff, RetryConfig};

pub const DEFAULT_BANDWIDTH: u64 = 100_000;

/// In-memory window of leased IDs. Empty once `next > ceiling`.
#[derive(Debug, Clone, Copy)]
struct Lease {
    next: u64,
    ceiling: u64,
}

impl Lease {
    fn is_exhausted(&self) -> bool {
        self.next > self.ceiling
    }
}

pub struct SeaOrmSequenceAllocator {
    db: DatabaseConnection,
    name: String,
    bandwidth: u64,
    lease: Mutex<Lease>,
}

async fn leased_until<C: ConnectionTrait>(conn: &C, name: &str) -> Result<u64, DbErr> {
    let row = sequence::Entity::find_by_id(name.to_owned()).one(conn).await?;
    Ok(row.map(|r| r.leased_until.max(0) as u64).unwrap_or(0))
}

async fn store_leased_until<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    ceiling: i64,
) -> Result<(), DbErr> {
    let model = sequence::ActiveModel {
        name: Set(name.to_owned()),
        leased_until: Set(ceiling),
    };
    sequence::Entity::insert(model)
        .on_conflict(
            OnConflict::column(sequence::Column::Name)
                .update_column(sequence::Column::LeasedUntil)
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

impl SeaOrmSequenceAllocator {
    /// Open the named sequence, resuming strictly above its stored ceiling.
    ///
    /// No IDs are leased until the first `next_id` call.
    pub async fn open(
        db: DatabaseConnection,
        name: impl Into<String>,
        bandwidth: u64,
    ) -> DomainResult<Self> {
        let name = name.into();
        let stored = leased_until(&db, &name).await?;
        info!(sequence = %name, resume_after = stored, bandwidth, "Sequence opened");

        Ok(Self {
            db,
            name,
            bandwidth: bandwidth.max(1),
            lease: Mutex::new(Lease {
                next: stored.saturating_add(1),
                ceiling: stored,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reserve the next window starting at or after `from`.
    async fn renew(&self, from: u64) -> DomainResult<Lease> {
        let config = RetryConfig::default();
        let lease = retry_with_backoff(
            &config,
            |_| self.lease_window(from),
            DomainError::is_commit_conflict,
            |_| {},
            "sequence_renew",
        )
        .await?;

        metrics::counter!("sequence_leases_total", "sequence" => self.name.clone()).increment(1);
        debug!(sequence = %self.name, next = lease.next, ceiling = lease.ceiling, "Leased ID window");
        Ok(lease)
    }

    async fn lease_window(&self, from: u64) -> DomainResult<Lease> {
        let txn = self.db.begin().await?;
        let stored = leased_until(&txn, &self.name).await?;

        let start = from.max(stored.saturating_add(1));
        let ceiling = start
            .checked_add(self.bandwidth - 1)
            .and_then(|c| i64::try_from(c).ok())
            .ok_or_else(|| InfraError::SequenceExhausted(self.name.clone()))?;

        store_leased_until(&txn, &self.name, ceiling).await?;
        txn.commit().await?;

        Ok(Lease {
            next: start,
            ceiling: ceiling as u64,
        })
    }
}

#[async_trait]
impl IdAllocator for SeaOrmSequenceAllocator {
    async fn next_id(&self) -> DomainResult<u64> {
        let mut lease = self.lease.lock().await;
        if lease.is_exhausted() {
            *lease = self.renew(lease.next).await?;
        }
        let id = lease.next;
        lease.next += 1;
        Ok(id)
    }

    async fn release(&self) -> DomainResult<()> {
        let mut lease = self.lease.lock().await;
        if lease.is_exhausted() {
            return Ok(());
        }

        let used = lease.next - 1;
        let txn = self.db.begin().await?;
        // Someone else leased past us; keep their ceiling.
        if leased_until(&txn, &self.name).await? == lease.ceiling {
            store_leased_until(&txn, &self.name, used as i64).await?;
        }
        txn.commit().await?;

        info!(sequence = %self.name, released_from = lease.next, "Released unused IDs");
        lease.ceiling = used;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::migrated_db;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fresh_sequence_starts_at_one() {
        let db = migrated_db().await;
        let ids = SeaOrmSequenceAllocator::open(db, "booking_id_sequence", 10)
            .await
            .unwrap();
        assert_eq!(ids.next_id().await.unwrap(), 1);
        assert_eq!(ids.next_id().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_renews_across_windows() {
        let db = migrated_db().await;
        let ids = SeaOrmSequenceAllocator::open(db.clone(), "s", 3).await.unwrap();
        let got: Vec<u64> = {
            let mut v = Vec::new();
            for _ in 0..7 {
                v.push(ids.next_id().await.unwrap());
            }
            v
        };
        assert_eq!(got, (1..=7).collect::<Vec<_>>());
        assert_eq!(leased_until(&db, "s").await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_restart_without_release_resumes_above_ceiling() {
        let db = migrated_db().await;
        let first = SeaOrmSequenceAllocator::open(db.clone(), "lease_id_sequence", 100)
            .await
            .unwrap();
        assert_eq!(first.next_id().await.unwrap(), 1);
        drop(first);

        let second = SeaOrmSequenceAllocator::open(db, "lease_id_sequence", 100)
            .await
            .unwrap();
        assert_eq!(second.next_id().await.unwrap(), 101);
    }

    #[tokio::test]
    async fn test_release_avoids_gap() {
        let db = migrated_db().await;
        let first = SeaOrmSequenceAllocator::open(db.clone(), "s", 100).await.unwrap();
        first.next_id().await.unwrap();
        first.next_id().await.unwrap();
        first.release().await.unwrap();
        assert_eq!(leased_until(&db, "s").await.unwrap(), 2);

        let second = SeaOrmSequenceAllocator::open(db, "s", 100).await.unwrap();
        assert_eq!(second.next_id().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sequences_are_independent() {
        let db = migrated_db().await;
        let a = SeaOrmSequenceAllocator::open(db.clone(), "a", 10).await.unwrap();
        let b = SeaOrmSequenceAllocator::open(db, "b", 10).await.unwrap();
        assert_eq!(a.next_id().await.unwrap(), 1);
        assert_eq!(b.next_id().await.unwrap(), 1);
        assert_eq!(a.name(), "a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ids_are_distinct() {
        let db = migrated_db().await;
        let ids = Arc::new(SeaOrmSequenceAllocator::open(db, "s", 5).await.unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                tokio::spawn(async move {
                    let mut out = Vec::new();
                    for _ in 0..10 {
                        out.push(ids.next_id().await.unwrap());
                    }
                    out
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(all.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(all.len(), 80);
        assert_eq!(all.iter().max(), Some(&80));
    }
}
