//! `SQLite` implementation of [`BandRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use bandstand_app::ports::BandRepository;
use bandstand_domain::band::{Band, BandMember, BandRole};
use bandstand_domain::error::{BandstandError, ValidationError};
use bandstand_domain::id::{BandId, UserId};

use crate::codec::{parsed, timestamp};
use crate::error::{StorageError, is_unique_violation};

/// Wrapper for converting database rows into domain [`Band`].
struct Wrapper(Band);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Band> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Band {
            id: parsed(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_by: parsed(row, "created_by")?,
            created_at: parsed(row, "created_at")?,
            updated_at: parsed(row, "updated_at")?,
        }))
    }
}

/// Wrapper for converting `band_members` rows into [`BandMember`].
struct MemberWrapper(BandMember);

impl<'r> FromRow<'r, SqliteRow> for MemberWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(BandMember {
            band_id: parsed(row, "band_id")?,
            user_id: parsed(row, "user_id")?,
            role: parsed(row, "role")?,
            joined_at: parsed(row, "joined_at")?,
        }))
    }
}

const INSERT: &str = "INSERT INTO bands (id, name, description, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)";
const INSERT_MEMBER: &str =
    "INSERT INTO band_members (band_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)";
const SELECT_BY_ID: &str = "SELECT * FROM bands WHERE id = ?";
const SELECT_FOR_USER: &str = "SELECT b.* FROM bands b JOIN band_members bm ON bm.band_id = b.id WHERE bm.user_id = ? ORDER BY b.name, b.created_at";
const SELECT_MEMBERSHIP: &str = "SELECT * FROM band_members WHERE band_id = ? AND user_id = ?";
const SELECT_MEMBERS: &str =
    "SELECT * FROM band_members WHERE band_id = ? ORDER BY joined_at, rowid";
const DELETE_MEMBER: &str = "DELETE FROM band_members WHERE band_id = ? AND user_id = ?";
const SELECT_BAND_IDS: &str =
    "SELECT band_id FROM band_members WHERE user_id = ? ORDER BY joined_at, rowid";

/// `SQLite`-backed band repository.
pub struct SqliteBandRepository {
    pool: SqlitePool,
}

impl SqliteBandRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BandRepository for SqliteBandRepository {
    fn create_with_owner(
        &self,
        band: Band,
    ) -> impl Future<Output = Result<Band, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(band.id.to_string())
                .bind(&band.name)
                .bind(&band.description)
                .bind(band.created_by.to_string())
                .bind(timestamp(band.created_at))
                .bind(timestamp(band.updated_at))
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            sqlx::query(INSERT_MEMBER)
                .bind(band.id.to_string())
                .bind(band.created_by.to_string())
                .bind(BandRole::Admin.as_str())
                .bind(timestamp(band.created_at))
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(band)
        }
    }

    fn get_by_id(
        &self,
        id: BandId,
    ) -> impl Future<Output = Result<Option<Band>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn list_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Band>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_FOR_USER)
                .bind(user_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn get_membership(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<BandMember>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<MemberWrapper> = sqlx::query_as(SELECT_MEMBERSHIP)
                .bind(band_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn list_members(
        &self,
        band_id: BandId,
    ) -> impl Future<Output = Result<Vec<BandMember>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<MemberWrapper> = sqlx::query_as(SELECT_MEMBERS)
                .bind(band_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn add_member(
        &self,
        member: BandMember,
    ) -> impl Future<Output = Result<BandMember, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT_MEMBER)
                .bind(member.band_id.to_string())
                .bind(member.user_id.to_string())
                .bind(member.role.as_str())
                .bind(timestamp(member.joined_at))
                .execute(&pool)
                .await
                .map_err(|err| -> BandstandError {
                    if is_unique_violation(&err) {
                        ValidationError::AlreadyMember.into()
                    } else {
                        StorageError::from(err).into()
                    }
                })?;

            Ok(member)
        }
    }

    fn remove_member(
        &self,
        band_id: BandId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_MEMBER)
                .bind(band_id.to_string())
                .bind(user_id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }

    fn band_ids_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<BandId>, BandstandError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows = sqlx::query(SELECT_BAND_IDS)
                .bind(user_id.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            let ids = rows
                .iter()
                .map(|row| parsed(row, "band_id"))
                .collect::<Result<Vec<BandId>, _>>()
                .map_err(StorageError::from)?;
            Ok(ids)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::testing::{memory_db, seed_band, seed_user};

    #[tokio::test]
    async fn should_make_creator_admin_in_same_write() {
        let db = memory_db().await;
        let owner = seed_user(&db, "owner").await;
        let band_id = seed_band(&db, owner.id, &[]).await;

        let membership = db
            .bands()
            .get_membership(band_id, owner.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.role, BandRole::Admin);
    }

    #[tokio::test]
    async fn should_list_bands_of_member_ordered_by_name() {
        let db = memory_db().await;
        let owner = seed_user(&db, "owner").await;
        for name in ["Zebra Crossing", "Apple Cores"] {
            let band = Band::builder().name(name).created_by(owner.id).build().unwrap();
            db.bands().create_with_owner(band).await.unwrap();
        }

        let names: Vec<String> = db
            .bands()
            .list_for_user(owner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Apple Cores", "Zebra Crossing"]);
    }

    #[tokio::test]
    async fn should_list_members_in_join_order() {
        let db = memory_db().await;
        let owner = seed_user(&db, "owner").await;
        let second = seed_user(&db, "second").await;
        let third = seed_user(&db, "third").await;
        let band_id = seed_band(&db, owner.id, &[second.id, third.id]).await;

        let members: Vec<UserId> = db
            .bands()
            .list_members(band_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.user_id)
            .collect();
        assert_eq!(members, vec![owner.id, second.id, third.id]);
        assert_eq!(db.bands().band_ids_for_user(third.id).await.unwrap(), vec![band_id]);
    }

    #[tokio::test]
    async fn should_reject_duplicate_membership() {
        let db = memory_db().await;
        let owner = seed_user(&db, "owner").await;
        let band_id = seed_band(&db, owner.id, &[]).await;

        let result = db
            .bands()
            .add_member(BandMember::new(band_id, owner.id, BandRole::Leader))
            .await;
        assert!(matches!(
            result,
            Err(BandstandError::Validation(ValidationError::AlreadyMember))
        ));
    }

    #[tokio::test]
    async fn should_report_whether_member_was_removed() {
        let db = memory_db().await;
        let owner = seed_user(&db, "owner").await;
        let plain = seed_user(&db, "plain").await;
        let band_id = seed_band(&db, owner.id, &[plain.id]).await;

        assert!(db.bands().remove_member(band_id, plain.id).await.unwrap());
        assert!(!db.bands().remove_member(band_id, plain.id).await.unwrap());
        assert!(db.bands().band_ids_for_user(plain.id).await.unwrap().is_empty());
    }
}
