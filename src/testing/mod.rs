use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::app::AppState;
use crate::config::AppConfig;
use crate::database::manager::DatabaseError;
use crate::database::models::form::{FormInput, FormRow};
use crate::database::repository::FormStore;
use crate::form::FormFilter;

#[derive(Default)]
struct Table {
    rows: Vec<FormRow>,
    next_id: i32,
}

/// In-memory [`FormStore`] that enforces the same unique key as the table.
///
/// Each operation holds the lock for its whole duration, so writes are
/// all-or-nothing just like the transactional store.
#[derive(Default)]
pub struct MemoryFormStore {
    table: Mutex<Table>,
    skip_precheck: bool,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `find_duplicate` always misses, so only the write-time constraint can
    /// catch a conflict. Simulates two requests racing past the pre-check.
    pub fn without_precheck() -> Self {
        Self {
            skip_precheck: true,
            ..Self::default()
        }
    }

    /// Insert a row with a raw stored `fields` value, bypassing validation
    pub async fn seed(&self, title: &str, description: &str, owner: i32, fields: &str) -> i32 {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let form_id = table.next_id;
        table.rows.push(FormRow {
            form_id,
            title: title.to_string(),
            description: description.to_string(),
            owner,
            fields: fields.to_string(),
        });
        form_id
    }

    pub async fn rows(&self) -> Vec<FormRow> {
        self.table.lock().await.rows.clone()
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }
}

#[async_trait]
impl FormStore for MemoryFormStore {
    async fn list(&self, filter: &FormFilter) -> Result<Vec<FormRow>, DatabaseError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .filter(|row| filter.matches(row.form_id, row.owner))
            .cloned()
            .collect())
    }

    async fn get(&self, form_id: i32) -> Result<Option<FormRow>, DatabaseError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|row| row.form_id == form_id).cloned())
    }

    async fn find_duplicate(&self, input: &FormInput, exclude: Option<i32>) -> Result<Option<i32>, DatabaseError> {
        if self.skip_precheck {
            return Ok(None);
        }
        let table = self.table.lock().await;
        Ok(table
            .rows
            .iter()
            .find(|row| Some(row.form_id) != exclude && input.same_key_as(row))
            .map(|row| row.form_id))
    }

    async fn insert(&self, input: &FormInput) -> Result<FormRow, DatabaseError> {
        let mut table = self.table.lock().await;
        if table.rows.iter().any(|row| input.same_key_as(row)) {
            return Err(DatabaseError::Conflict("form_title_owner_fields_key".to_string()));
        }
        table.next_id += 1;
        let row = input.clone().into_row(table.next_id);
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, form_id: i32, input: &FormInput) -> Result<Option<FormRow>, DatabaseError> {
        let mut table = self.table.lock().await;
        if table.rows.iter().any(|row| row.form_id != form_id && input.same_key_as(row)) {
            return Err(DatabaseError::Conflict("form_title_owner_fields_key".to_string()));
        }
        let Some(row) = table.rows.iter_mut().find(|row| row.form_id == form_id) else {
            return Ok(None);
        };
        *row = input.clone().into_row(form_id);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, form_id: i32) -> Result<bool, DatabaseError> {
        let mut table = self.table.lock().await;
        let before = table.rows.len();
        table.rows.retain(|row| row.form_id != form_id);
        Ok(table.rows.len() < before)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// App state over an in-memory store with testing defaults
pub fn memory_state(store: Arc<MemoryFormStore>) -> AppState {
    AppState::new(AppConfig::testing(), store)
}

/// Drive one request through the router
pub async fn request(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    app.clone().oneshot(request).await.expect("infallible router")
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, owner: i32, fields: &str) -> FormInput {
        FormInput {
            title: title.to_string(),
            description: "d".to_string(),
            owner,
            fields: fields.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_enforces_unique_key() {
        let store = MemoryFormStore::new();
        let first = store.insert(&input("a", 1, "1,2")).await.unwrap();
        assert_eq!(first.form_id, 1);

        assert!(matches!(
            store.insert(&input("a", 1, "1,2")).await,
            Err(DatabaseError::Conflict(_))
        ));
        // Any differing key component is fine
        assert!(store.insert(&input("a", 2, "1,2")).await.is_ok());
        assert!(store.insert(&input("a", 1, "2,1")).await.is_ok());
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn find_duplicate_respects_exclusion() {
        let store = MemoryFormStore::new();
        let id = store.insert(&input("a", 1, "1")).await.unwrap().form_id;

        assert_eq!(store.find_duplicate(&input("a", 1, "1"), None).await.unwrap(), Some(id));
        assert_eq!(store.find_duplicate(&input("a", 1, "1"), Some(id)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = MemoryFormStore::new();
        assert!(store.update(9, &input("a", 1, "1")).await.unwrap().is_none());
        assert!(!store.delete(9).await.unwrap());
    }
}
