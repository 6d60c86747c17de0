//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{Email, Experience, User, UserId, Username};

use super::models::{lower, NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> UserRepositoryError {
    if let DieselError::DatabaseError(kind, info) = &error {
        debug!(?kind, message = info.message(), "diesel operation failed");
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserRepositoryError::DuplicateIdentity
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => UserRepositoryError::query("record not found"),
        _ => UserRepositoryError::query("database error"),
    }
}

/// Convert a database row to a domain user.
///
/// Rows predate the current validation rules, so a row that no longer
/// parses is reported as a query failure rather than silently dropped.
fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    let email = Email::parse(&row.email)
        .map_err(|_| UserRepositoryError::query("stored email fails validation"))?;
    let username = Username::parse(&row.username)
        .map_err(|_| UserRepositoryError::query("stored username fails validation"))?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        email,
        username,
        password_hash: row.password_hash,
        created_at: row.created_at,
        last_seen: row.last_seen,
        avatar_url: row.avatar_url,
        experience: Experience::new(u64::try_from(row.experience).unwrap_or(0)),
    })
}

fn experience_for_db(points: u64) -> i64 {
    i64::try_from(points).unwrap_or(i64::MAX)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewUserRow {
            id: *user.id.as_uuid(),
            email: user.email.as_str(),
            username: user.username.as_str(),
            password_hash: &user.password_hash,
            avatar_url: &user.avatar_url,
            experience: experience_for_db(user.experience.points()),
            created_at: user.created_at,
            last_seen: user.last_seen,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(lower(users::email).eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(lower(users::username).eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn touch_last_seen(
        &self,
        id: &UserId,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.find(id.as_uuid()))
            .set(users::last_seen.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set_avatar(&self, id: &UserId, avatar_url: &str) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.find(id.as_uuid()))
            .set(users::avatar_url.eq(avatar_url))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn grant_experience(
        &self,
        id: &UserId,
        amount: u64,
    ) -> Result<u64, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // The increment happens database-side so concurrent grants never
        // lose points to a read-modify-write race.
        let total: i64 = diesel::update(users::table.find(id.as_uuid()))
            .set(users::experience.eq(users::experience + experience_for_db(amount)))
            .returning(users::experience)
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // LIKE metacharacters in the fragment are literals to the caller.
        let escaped = fragment
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");

        let rows: Vec<UserRow> = users::table
            .filter(users::username.ilike(&pattern))
            .order(lower(users::username).asc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }
}
