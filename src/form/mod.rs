//! The Form entity: wire shape, validation, and the storage conversion boundary.

pub mod codec;
pub mod filter;
pub mod validation;

use serde::Serialize;

use crate::database::models::form::{FormInput, FormRow};

pub use codec::{decode_fields, encode_fields, FieldsDecodeError};
pub use filter::{parse_form_id, FormFilter, MalformedIdentifier};
pub use validation::{validate_payload, ValidationErrors};

/// A Form as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Form {
    pub form_id: i32,
    pub title: String,
    pub description: String,
    pub owner: i32,
    pub fields: Vec<u32>,
}

/// A validated create/update body. `form_id` is never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPayload {
    pub title: String,
    pub description: String,
    pub owner: i32,
    pub fields: Vec<u32>,
}

impl FormPayload {
    /// Storage-shaped values for insert or full replacement
    pub fn into_input(self) -> FormInput {
        FormInput {
            fields: encode_fields(&self.fields),
            title: self.title,
            description: self.description,
            owner: self.owner,
        }
    }
}

impl TryFrom<FormRow> for Form {
    type Error = FieldsDecodeError;

    fn try_from(row: FormRow) -> Result<Self, Self::Error> {
        Ok(Form {
            fields: decode_fields(&row.fields)?,
            form_id: row.form_id,
            title: row.title,
            description: row.description,
            owner: row.owner,
        })
    }
}
