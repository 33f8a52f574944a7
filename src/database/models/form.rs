use sqlx::FromRow;

/// A row of the `form` table. `fields` is the comma-joined storage encoding.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FormRow {
    pub form_id: i32,
    pub title: String,
    pub description: String,
    pub owner: i32,
    pub fields: String,
}

/// The mutable columns of a form, used for both insert and full update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub title: String,
    pub description: String,
    pub owner: i32,
    pub fields: String,
}

impl FormInput {
    pub fn into_row(self, form_id: i32) -> FormRow {
        FormRow {
            form_id,
            title: self.title,
            description: self.description,
            owner: self.owner,
            fields: self.fields,
        }
    }

    /// Whether `row` collides with this input on (title, owner, fields)
    pub fn same_key_as(&self, row: &FormRow) -> bool {
        self.title == row.title && self.owner == row.owner && self.fields == row.fields
    }
}
