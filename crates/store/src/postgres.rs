use std::collections::HashMap;

use async_trait::async_trait;
use common::{BucketId, ItemId, Version};
use domain::repository::require_id;
use domain::{Bucket, BucketQuery, BucketRepository, Item, RepositoryError, RepositoryResult};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::sql::{self, SqlParam, Statement};

/// PostgreSQL-backed bucket repository.
///
/// Buckets and items live in two tables; items cascade with their bucket and
/// keep their insertion order through a `position` column. Item rows are
/// keyed by `(bucket_id, id)`, so one item may be held by several buckets.
#[derive(Clone)]
pub struct PostgresBucketRepository {
    pool: PgPool,
}

impl PostgresBucketRepository {
    /// Creates a new PostgreSQL bucket repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch(&self, statement: Statement) -> Result<Vec<Bucket>> {
        let Statement { sql, params } = statement;

        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                SqlParam::Int(v) => query.bind(v),
                SqlParam::Text(v) => query.bind(v),
                SqlParam::Uuid(v) => query.bind(v),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    /// Loads the items of the given bucket rows and assembles the aggregates,
    /// keeping row order.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Bucket>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, bucket_id, name, description
            FROM items
            WHERE bucket_id = ANY($1)
            ORDER BY bucket_id, position ASC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<Item>> = HashMap::new();
        for row in item_rows {
            let bucket_id: Uuid = row.try_get("bucket_id")?;
            let item = Item::restore(
                ItemId::from_uuid(row.try_get("id")?),
                row.try_get("name")?,
                row.try_get("description")?,
            );
            items.entry(bucket_id).or_default().push(item);
        }

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                Self::row_to_bucket(row, items.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    fn row_to_bucket(row: PgRow, items: Vec<Item>) -> Result<Bucket> {
        let id = BucketId::from_uuid(row.try_get("id")?);
        let size: i64 = row.try_get("size")?;
        let size = u32::try_from(size).map_err(|_| StoreError::InvalidRow {
            id,
            reason: format!("size {size} out of range"),
        })?;

        Bucket::restore(
            id,
            Version::new(row.try_get("version")?),
            row.try_get("name")?,
            row.try_get("description")?,
            size,
            items,
        )
        .map_err(|e| StoreError::InvalidRow {
            id,
            reason: e.to_string(),
        })
    }

    async fn insert_items(
        conn: &mut PgConnection,
        bucket_id: BucketId,
        items: &[Item],
    ) -> Result<()> {
        for (position, item) in items.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| StoreError::InvalidRow {
                id: bucket_id,
                reason: format!("item position {position} out of range"),
            })?;

            sqlx::query(
                r#"
                INSERT INTO items (id, bucket_id, position, name, description)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id().as_uuid())
            .bind(bucket_id.as_uuid())
            .bind(position)
            .bind(item.name())
            .bind(item.description())
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}

fn db(err: sqlx::Error) -> RepositoryError {
    StoreError::from(err).into()
}

#[async_trait]
impl BucketRepository for PostgresBucketRepository {
    async fn get(&self, id: BucketId) -> RepositoryResult<Option<Bucket>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, size, version
            FROM buckets
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn find(&self, query: &BucketQuery) -> RepositoryResult<Vec<Bucket>> {
        let statement = sql::select_buckets(query)?;
        tracing::debug!(sql = %statement.sql, "finding buckets");
        Ok(self.fetch(statement).await?)
    }

    async fn add(&self, mut bucket: Bucket) -> RepositoryResult<Bucket> {
        let id = bucket.id().unwrap_or_default();
        bucket.assign_id(id);
        bucket.set_version(Version::first());

        let mut tx = self.pool.begin().await.map_err(db)?;

        sqlx::query(
            r#"
            INSERT INTO buckets (id, name, description, size, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(bucket.name())
        .bind(bucket.description())
        .bind(i64::from(bucket.size()))
        .bind(bucket.version().as_i64())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let constraint = e.as_database_error().and_then(|db_err| db_err.constraint());
            if constraint == Some("buckets_pkey") {
                RepositoryError::AlreadyExists(id)
            } else {
                db(e)
            }
        })?;

        Self::insert_items(&mut *tx, id, bucket.items()).await?;

        tx.commit().await.map_err(db)?;
        Ok(bucket)
    }

    async fn update(&self, mut bucket: Bucket) -> RepositoryResult<Bucket> {
        let id = require_id(&bucket)?;
        let expected = bucket.version();
        let next = expected.next();

        let mut tx = self.pool.begin().await.map_err(db)?;

        let updated = sqlx::query(
            r#"
            UPDATE buckets
            SET name = $2, description = $3, size = $4, version = $5
            WHERE id = $1 AND version = $6
            "#,
        )
        .bind(id.as_uuid())
        .bind(bucket.name())
        .bind(bucket.description())
        .bind(i64::from(bucket.size()))
        .bind(next.as_i64())
        .bind(expected.as_i64())
        .execute(&mut *tx)
        .await
        .map_err(db)?;

        if updated.rows_affected() == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM buckets WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db)?;

            return Err(match actual {
                None => RepositoryError::NotFound(id),
                Some(actual) => RepositoryError::ConcurrencyConflict {
                    id,
                    expected,
                    actual: Version::new(actual),
                },
            });
        }

        sqlx::query("DELETE FROM items WHERE bucket_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db)?;
        Self::insert_items(&mut *tx, id, bucket.items()).await?;

        tx.commit().await.map_err(db)?;

        bucket.set_version(next);
        Ok(bucket)
    }

    async fn remove(&self, bucket: &Bucket) -> RepositoryResult<()> {
        let id = require_id(bucket)?;

        let deleted = sqlx::query("DELETE FROM buckets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db)?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }
}
