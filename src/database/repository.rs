use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::form::{FormInput, FormRow};
use crate::form::FormFilter;

const FORM_COLUMNS: &str = "form_id, title, description, owner, fields";

/// Transactional access to the `form` table.
///
/// Writes report a violated (title, owner, fields) constraint as
/// [`DatabaseError::Conflict`] and leave no partial change behind.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Forms matching `filter`, ordered by `form_id`
    async fn list(&self, filter: &FormFilter) -> Result<Vec<FormRow>, DatabaseError>;

    async fn get(&self, form_id: i32) -> Result<Option<FormRow>, DatabaseError>;

    /// Id of a form sharing `input`'s (title, owner, fields), ignoring `exclude`
    async fn find_duplicate(&self, input: &FormInput, exclude: Option<i32>) -> Result<Option<i32>, DatabaseError>;

    async fn insert(&self, input: &FormInput) -> Result<FormRow, DatabaseError>;

    /// Replace every mutable column. `None` when the row no longer exists.
    async fn update(&self, form_id: i32, input: &FormInput) -> Result<Option<FormRow>, DatabaseError>;

    /// `false` when there was nothing to delete
    async fn delete(&self, form_id: i32) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// PostgreSQL implementation of [`FormStore`]
#[derive(Clone)]
pub struct PgFormStore {
    database: DatabaseManager,
}

impl PgFormStore {
    pub fn new(database: DatabaseManager) -> Self {
        Self { database }
    }

    fn pool(&self) -> &PgPool {
        self.database.pool()
    }
}

#[async_trait]
impl FormStore for PgFormStore {
    async fn list(&self, filter: &FormFilter) -> Result<Vec<FormRow>, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM form", FORM_COLUMNS));
        let mut prefix = " WHERE ";
        if !filter.form_ids.is_empty() {
            query.push(prefix).push("form_id = ANY(").push_bind(filter.form_ids.clone()).push(")");
            prefix = " AND ";
        }
        if !filter.owners.is_empty() {
            query.push(prefix).push("owner = ANY(").push_bind(filter.owners.clone()).push(")");
        }
        query.push(" ORDER BY form_id");

        let rows = query.build_query_as::<FormRow>().fetch_all(self.pool()).await?;
        debug!("Listed {} forms for {:?}", rows.len(), filter);
        Ok(rows)
    }

    async fn get(&self, form_id: i32) -> Result<Option<FormRow>, DatabaseError> {
        let row = sqlx::query_as::<_, FormRow>(&format!("SELECT {} FROM form WHERE form_id = $1", FORM_COLUMNS))
            .bind(form_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    async fn find_duplicate(&self, input: &FormInput, exclude: Option<i32>) -> Result<Option<i32>, DatabaseError> {
        let id = sqlx::query_scalar::<_, i32>(
            "SELECT form_id FROM form
             WHERE title = $1 AND owner = $2 AND fields = $3
               AND ($4::int4 IS NULL OR form_id <> $4)
             LIMIT 1",
        )
        .bind(&input.title)
        .bind(input.owner)
        .bind(&input.fields)
        .bind(exclude)
        .fetch_optional(self.pool())
        .await?;
        Ok(id)
    }

    async fn insert(&self, input: &FormInput) -> Result<FormRow, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query_as::<_, FormRow>(&format!(
            "INSERT INTO form (title, description, owner, fields) VALUES ($1, $2, $3, $4) RETURNING {}",
            FORM_COLUMNS
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.owner)
        .bind(&input.fields)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) => {
                tx.rollback().await?;
                return Err(DatabaseError::from_write(e));
            }
        };

        tx.commit().await.map_err(DatabaseError::from_write)?;
        info!("Created form {}", row.form_id);
        Ok(row)
    }

    async fn update(&self, form_id: i32, input: &FormInput) -> Result<Option<FormRow>, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query_as::<_, FormRow>(&format!(
            "UPDATE form SET title = $2, description = $3, owner = $4, fields = $5
             WHERE form_id = $1 RETURNING {}",
            FORM_COLUMNS
        ))
        .bind(form_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.owner)
        .bind(&input.fields)
        .fetch_optional(&mut *tx)
        .await;

        let row = match updated {
            Ok(Some(row)) => row,
            Ok(None) => {
                tx.rollback().await?;
                return Ok(None);
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(DatabaseError::from_write(e));
            }
        };

        tx.commit().await.map_err(DatabaseError::from_write)?;
        info!("Updated form {}", form_id);
        Ok(Some(row))
    }

    async fn delete(&self, form_id: i32) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let deleted = sqlx::query("DELETE FROM form WHERE form_id = $1")
            .bind(form_id)
            .execute(&mut *tx)
            .await;

        let affected = match deleted {
            Ok(result) => result.rows_affected(),
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        };

        tx.commit().await?;
        if affected > 0 {
            info!("Deleted form {}", form_id);
        }
        Ok(affected > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.database.health_check().await
    }
}
