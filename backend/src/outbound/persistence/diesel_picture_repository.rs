//! PostgreSQL-backed `PictureRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{PictureRepository, PictureRepositoryError};
use crate::domain::{EntryId, Picture, PictureId, UserId};

use super::models::{NewPictureRow, PictureRow};
use super::pool::{DbPool, PoolError};
use super::schema::pictures;

/// Diesel-backed implementation of the `PictureRepository` port.
#[derive(Clone)]
pub struct DieselPictureRepository {
    pool: DbPool,
}

impl DieselPictureRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PictureRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PictureRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> PictureRepositoryError {
    if let DieselError::DatabaseError(kind, info) = &error {
        debug!(?kind, message = info.message(), "diesel operation failed");
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            PictureRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => PictureRepositoryError::query("record not found"),
        _ => PictureRepositoryError::query("database error"),
    }
}

fn row_to_picture(row: PictureRow) -> Picture {
    Picture {
        id: PictureId::from_uuid(row.id),
        owner_id: UserId::from_uuid(row.owner_id),
        entry_id: EntryId::from_uuid(row.entry_id),
        file_host_id: row.file_host_id,
        url: row.url,
        created_at: row.created_at,
        sort_order: row.sort_order,
    }
}

#[async_trait]
impl PictureRepository for DieselPictureRepository {
    async fn insert(&self, picture: &Picture) -> Result<(), PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewPictureRow {
            id: *picture.id.as_uuid(),
            owner_id: *picture.owner_id.as_uuid(),
            entry_id: *picture.entry_id.as_uuid(),
            file_host_id: &picture.file_host_id,
            url: &picture.url,
            sort_order: picture.sort_order,
            created_at: picture.created_at,
        };

        diesel::insert_into(pictures::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &PictureId,
    ) -> Result<Option<Picture>, PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<PictureRow> = pictures::table
            .find(id.as_uuid())
            .select(PictureRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_picture))
    }

    async fn list_by_entry(
        &self,
        entry: &EntryId,
    ) -> Result<Vec<Picture>, PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PictureRow> = pictures::table
            .filter(pictures::entry_id.eq(entry.as_uuid()))
            .order((pictures::sort_order.asc(), pictures::created_at.asc()))
            .select(PictureRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_picture).collect())
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Picture>, PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<PictureRow> = pictures::table
            .filter(pictures::owner_id.eq(owner.as_uuid()))
            .order((pictures::sort_order.asc(), pictures::created_at.asc()))
            .select(PictureRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_picture).collect())
    }

    async fn delete(&self, id: &PictureId) -> Result<bool, PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(pictures::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn delete_by_entry(
        &self,
        entry: &EntryId,
    ) -> Result<Vec<String>, PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // The file host ids come back so the caller can release the remote
        // files after the rows are gone.
        diesel::delete(pictures::table.filter(pictures::entry_id.eq(entry.as_uuid())))
            .returning(pictures::file_host_id)
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn set_sort_order(
        &self,
        id: &PictureId,
        sort_order: i32,
    ) -> Result<bool, PictureRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(pictures::table.find(id.as_uuid()))
            .set(pictures::sort_order.eq(sort_order))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    fn row_converts_to_domain_picture() {
        let row = PictureRow {
            id: uuid::Uuid::new_v4(),
            owner_id: uuid::Uuid::new_v4(),
            entry_id: uuid::Uuid::new_v4(),
            file_host_id: "host-1".to_owned(),
            url: "https://files.example.com/1".to_owned(),
            sort_order: 3,
            created_at: Utc::now(),
        };
        let picture = row_to_picture(row);
        assert_eq!(picture.file_host_id, "host-1");
        assert_eq!(picture.sort_order, 3);
    }

    #[rstest]
    fn pool_error_maps_to_connection() {
        let mapped = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(mapped, PictureRepositoryError::Connection { .. }));
    }
}
