use async_trait::async_trait;
use sea_orm::{DatabaseConnection, SqlErr, TransactionTrait};
use tracing::{debug, warn};

use crate::domain::{DomainResult, User, UserRepositoryInterface};
use crate::infrastructure::database::kv;
use crate::infrastructure::database::records::UserRecord;

/// Users stored in `kv_entries` under their username.
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let Some(value) = kv::get(&self.db, username).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<UserRecord>(&value) {
            Ok(record) => Ok(Some(record.into())),
            Err(e) => {
                warn!(username, error = %e, "Stored user record is unreadable");
                Err(e.into())
            }
        }
    }

    async fn insert_if_absent(&self, user: &User) -> DomainResult<bool> {
        let value = serde_json::to_string(&UserRecord::from(user))?;

        let txn = self.db.begin().await?;
        if kv::get(&txn, &user.username).await?.is_some() {
            return Ok(false);
        }
        match kv::insert(&txn, &user.username, value).await {
            Ok(()) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        }
        txn.commit().await?;

        debug!(username = %user.username, user_id = user.user_id, "User stored");
        Ok(true)
    }
}
