use axum::{
    extract::{rejection::JsonRejection, Path, RawQuery, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::database::models::form::{FormInput, FormRow};
use crate::database::{DatabaseError, FormStore};
use crate::error::ApiError;
use crate::form::{parse_form_id, validate_payload, Form, FormFilter, ValidationErrors};

/// Outcome of resolving a `form_id` path segment against storage
#[derive(Debug)]
pub enum Lookup {
    Found(FormRow),
    NotFound,
    Malformed,
}

impl Lookup {
    pub async fn resolve(store: &dyn FormStore, raw_id: &str) -> Result<Self, DatabaseError> {
        let Ok(form_id) = parse_form_id(raw_id) else {
            debug!("Malformed form_id {:?}", raw_id);
            return Ok(Lookup::Malformed);
        };

        Ok(match store.get(form_id).await? {
            Some(row) => Lookup::Found(row),
            None => Lookup::NotFound,
        })
    }

    pub fn found(self) -> Result<FormRow, ApiError> {
        match self {
            Lookup::Found(row) => Ok(row),
            Lookup::NotFound => Err(ApiError::DoesNotExist),
            Lookup::Malformed => Err(ApiError::InvalidUrl),
        }
    }
}

/// Validate a JSON body into storage-shaped input. A body that is not JSON at
/// all is reported the same way as one that is not an object, except one cut
/// off by the body size limit.
fn payload_input(body: Result<Json<Value>, JsonRejection>) -> Result<FormInput, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!("Rejected request body: {}", rejection);
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::from(ValidationErrors::invalid_input())
    })?;
    Ok(validate_payload(&body)?.into_input())
}

/// GET /form?form_id=..&owner=.. - list forms, optionally filtered
pub async fn list(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<Vec<Form>>, ApiError> {
    let filter = FormFilter::from_query(query.as_deref())?;

    let rows = state.store.list(&filter).await?;
    if rows.is_empty() {
        return Err(ApiError::NoMatches);
    }

    let forms = rows.into_iter().map(Form::try_from).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(forms))
}

/// GET /form/:form_id - a single form
pub async fn get(State(state): State<AppState>, Path(form_id): Path<String>) -> Result<Json<Form>, ApiError> {
    let row = Lookup::resolve(state.store.as_ref(), &form_id).await?.found()?;
    Ok(Json(Form::try_from(row)?))
}

/// POST /form - create a form
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Form>), ApiError> {
    let input = payload_input(body)?;

    if let Some(existing) = state.store.find_duplicate(&input, None).await? {
        warn!("Create rejected, form {} has the same title, owner and fields", existing);
        return Err(ApiError::AlreadyExists);
    }

    let row = state.store.insert(&input).await?;
    Ok((StatusCode::CREATED, Json(Form::try_from(row)?)))
}

/// PUT /form/:form_id - replace title, description, owner and fields
pub async fn update(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Form>, ApiError> {
    let current = Lookup::resolve(state.store.as_ref(), &form_id).await?.found()?;
    let input = payload_input(body)?;

    if let Some(existing) = state.store.find_duplicate(&input, Some(current.form_id)).await? {
        warn!(
            "Update of form {} rejected, form {} has the same title, owner and fields",
            current.form_id, existing
        );
        return Err(ApiError::AlreadyExists);
    }

    // The row can disappear between lookup and update
    let row = state
        .store
        .update(current.form_id, &input)
        .await?
        .ok_or(ApiError::DoesNotExist)?;
    Ok(Json(Form::try_from(row)?))
}

/// DELETE /form/:form_id - remove a form, empty body on success
pub async fn delete(State(state): State<AppState>, Path(form_id): Path<String>) -> Result<StatusCode, ApiError> {
    let current = Lookup::resolve(state.store.as_ref(), &form_id).await?.found()?;

    if !state.store.delete(current.form_id).await? {
        return Err(ApiError::DoesNotExist);
    }
    Ok(StatusCode::OK)
}
