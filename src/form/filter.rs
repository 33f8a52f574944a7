use thiserror::Error;

/// An identifier in the URL that is not a positive 32-bit integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed identifier {name}={value:?}")]
pub struct MalformedIdentifier {
    pub name: &'static str,
    pub value: String,
}

/// Filters accepted by `GET /form`. Empty vectors mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFilter {
    pub form_ids: Vec<i32>,
    pub owners: Vec<i32>,
}

impl FormFilter {
    /// Parse the raw query string.
    ///
    /// `form_id` and `owner` may each be repeated (`owner=1&owner=2`) or hold
    /// a comma-separated list (`owner=1,2`). Other parameters are ignored.
    pub fn from_query(query: Option<&str>) -> Result<Self, MalformedIdentifier> {
        let mut filter = Self::default();
        let Some(query) = query else {
            return Ok(filter);
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let (name, target) = match &*key {
                "form_id" => ("form_id", &mut filter.form_ids),
                "owner" => ("owner", &mut filter.owners),
                _ => continue,
            };
            for token in value.split(',') {
                target.push(parse_identifier(name, token)?);
            }
        }

        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.form_ids.is_empty() && self.owners.is_empty()
    }

    pub fn matches(&self, form_id: i32, owner: i32) -> bool {
        (self.form_ids.is_empty() || self.form_ids.contains(&form_id))
            && (self.owners.is_empty() || self.owners.contains(&owner))
    }
}

/// Parse a `form_id` path segment
pub fn parse_form_id(raw: &str) -> Result<i32, MalformedIdentifier> {
    parse_identifier("form_id", raw)
}

fn parse_identifier(name: &'static str, raw: &str) -> Result<i32, MalformedIdentifier> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(MalformedIdentifier {
            name,
            value: raw.to_string(),
        }),
    }
}
