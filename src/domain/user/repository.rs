use async_trait::async_trait;

use super::User;
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// Store `user` unless its username is taken. Returns `false` when taken.
    async fn insert_if_absent(&self, user: &User) -> DomainResult<bool>;
}
