//! Ordered key-value operations over `kv_entries`.
//!
//! Every function takes any `ConnectionTrait`, so callers decide whether a
//! read runs on the pool or inside an open transaction snapshot.

use std::ops::ControlFlow;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use super::entities::kv_entry;
use super::keys::prefix_upper_bound;

/// Rows fetched per round trip while scanning a prefix.
const SCAN_PAGE_SIZE: u64 = 256;

/// Visit every entry whose key starts with `prefix`, in key order.
///
/// The visitor returns `ControlFlow::Break` to stop early; the scan then
/// fetches no further pages.
pub async fn scan_prefix<C, F>(conn: &C, prefix: &str, mut visit: F) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    F: FnMut(&kv_entry::Model) -> ControlFlow<()>,
{
    let mut query = kv_entry::Entity::find().filter(kv_entry::Column::Key.gte(prefix));
    if let Some(upper) = prefix_upper_bound(prefix) {
        query = query.filter(kv_entry::Column::Key.lt(upper));
    }

    let mut pages = query
        .order_by_asc(kv_entry::Column::Key)
        .paginate(conn, SCAN_PAGE_SIZE);

    while let Some(page) = pages.fetch_and_next().await? {
        for entry in page.iter().filter(|e| e.key.starts_with(prefix)) {
            if visit(entry).is_break() {
                return Ok(());
            }
        }
    }
    Ok(())
}

pub async fn get<C: ConnectionTrait>(conn: &C, key: &str) -> Result<Option<String>, DbErr> {
    let entry = kv_entry::Entity::find_by_id(key.to_owned()).one(conn).await?;
    Ok(entry.map(|e| e.value))
}

/// Insert a new entry. An existing key fails with a unique violation.
pub async fn insert<C: ConnectionTrait>(conn: &C, key: &str, value: String) -> Result<(), DbErr> {
    let model = kv_entry::ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value),
    };
    kv_entry::Entity::insert(model)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::testing::migrated_db;
    use sea_orm::{SqlErr, TransactionTrait};

    async fn collect_keys<C: ConnectionTrait>(conn: &C, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        scan_prefix(conn, prefix, |e| {
            keys.push(e.key.clone());
            ControlFlow::Continue(())
        })
        .await
        .unwrap();
        keys
    }

    #[tokio::test]
    async fn test_scan_prefix_selects_only_prefix() {
        let db = migrated_db().await;
        for key in ["1_1_2", "1_5_9", "10_1_2", "2_1_1", "1"] {
            insert(&db, key, "{}".into()).await.unwrap();
        }

        assert_eq!(collect_keys(&db, "1_").await, vec!["1_1_2", "1_5_9"]);
        assert_eq!(collect_keys(&db, "10_").await, vec!["10_1_2"]);
        assert!(collect_keys(&db, "3_").await.is_empty());
    }

    #[tokio::test]
    async fn test_scan_prefix_spans_pages_and_breaks_early() {
        let db = migrated_db().await;
        let total = SCAN_PAGE_SIZE + 10;
        for day in 0..total {
            insert(&db, &format!("4_{day}_{day}"), "{}".into())
                .await
                .unwrap();
        }
        assert_eq!(collect_keys(&db, "4_").await.len() as u64, total);

        let mut seen = 0;
        scan_prefix(&db, "4_", |_| {
            seen += 1;
            if seen == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await
        .unwrap();
        assert_eq!(seen, 3);
    }

    #[tokio::test]
    async fn test_insert_rejects_existing_key() {
        let db = migrated_db().await;
        insert(&db, "alice", "1".into()).await.unwrap();

        let err = insert(&db, "alice", "2".into()).await.unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
        assert_eq!(get(&db, "alice").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_uncommitted_write_is_rolled_back_on_drop() {
        let db = migrated_db().await;
        {
            let txn = db.begin().await.unwrap();
            insert(&txn, "7_1_3", "{}".into()).await.unwrap();
            assert!(get(&txn, "7_1_3").await.unwrap().is_some());
        }
        assert!(get(&db, "7_1_3").await.unwrap().is_none());
    }
}
