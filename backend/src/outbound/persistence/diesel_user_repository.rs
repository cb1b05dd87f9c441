//! PostgreSQL-backed [`UserRepository`] implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoreError, UserInsertError, UserRepository};
use crate::domain::user::{User, UserId};

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::lower;
use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the users port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserInsertError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(NewUserRow::from_domain(user))
            .execute(&mut conn)
            .await
            .map_err(|err| {
                // The unique index on lower(email) is the uniqueness
                // authority; racing registrations lose here, not in a check.
                if is_unique_violation(&err) {
                    UserInsertError::EmailTaken
                } else {
                    UserInsertError::Store(map_diesel_error(err))
                }
            })?;
        Ok(())
    }

    async fn find_by_email(&self, normalized_email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(lower(users::email).eq(normalized_email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain).transpose()
    }
}
