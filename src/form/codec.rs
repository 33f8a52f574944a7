// Storage encoding of the `fields` list.
//
// The `form` table keeps field identifiers as comma-joined text so that the
// (title, owner, fields) unique constraint can be a plain column constraint.
// Nothing outside this module should split or join that string.

use thiserror::Error;

const SEPARATOR: char = ',';

/// A stored `fields` value that does not decode back to integers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stored fields value {raw:?} has non-numeric token {token:?}")]
pub struct FieldsDecodeError {
    pub raw: String,
    pub token: String,
}

/// Join field identifiers into their stored form: `[1, 4, 8]` -> `"1,4,8"`
pub fn encode_fields(fields: &[u32]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string())
}

/// Split a stored `fields` value back into identifiers, preserving order.
///
/// Tokens are trimmed, so rows written as `"1, 4, 8"` decode the same as
/// `"1,4,8"`. An empty string is an empty list.
pub fn decode_fields(raw: &str) -> Result<Vec<u32>, FieldsDecodeError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(SEPARATOR)
        .map(|token| {
            let token = token.trim();
            token.parse::<u32>().map_err(|_| FieldsDecodeError {
                raw: raw.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}
