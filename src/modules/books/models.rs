use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

pub const TITLE_MAX_CHARS: usize = 100;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// A catalogued book as stored in the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Book {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Optional free-text description
    pub description: Option<String>,
}

/// Validated book fields, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
}

/// Request body for `POST /api/books`. Any `id` sent by the client is ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateBook {
    /// Title of the book (required, at most 100 characters)
    #[serde(default)]
    pub title: Option<String>,
    /// Author of the book (required, at most 100 characters)
    #[serde(default)]
    pub author: Option<String>,
    /// Description (optional, at most 500 characters)
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `PUT /api/books/{id}`; `id` must match the path.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    /// Identifier of the book being replaced
    #[serde(default)]
    pub id: Option<i64>,
    /// Title of the book (required, at most 100 characters)
    #[serde(default)]
    pub title: Option<String>,
    /// Author of the book (required, at most 100 characters)
    #[serde(default)]
    pub author: Option<String>,
    /// Description (optional, at most 500 characters)
    #[serde(default)]
    pub description: Option<String>,
}

/// One failed check on one request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl FieldError {
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "field": self.field, "error": self.error })
    }
}

impl CreateBook {
    pub fn validate(self) -> Result<BookFields, Vec<FieldError>> {
        validate_fields(self.title, self.author, self.description)
    }
}

impl UpdateBook {
    /// Validate the fields; the id check is left to the caller.
    pub fn validate(self) -> Result<(Option<i64>, BookFields), Vec<FieldError>> {
        let id = self.id;
        validate_fields(self.title, self.author, self.description).map(|fields| (id, fields))
    }
}

fn validate_fields(
    title: Option<String>,
    author: Option<String>,
    description: Option<String>,
) -> Result<BookFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    required(&mut errors, "title", title.as_deref(), TITLE_MAX_CHARS);
    required(&mut errors, "author", author.as_deref(), AUTHOR_MAX_CHARS);
    if let Some(description) = description.as_deref() {
        max_length(&mut errors, "description", description, DESCRIPTION_MAX_CHARS);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(BookFields {
        title: title.unwrap_or_default(),
        author: author.unwrap_or_default(),
        description,
    })
}

fn required(errors: &mut Vec<FieldError>, field: &'static str, value: Option<&str>, max: usize) {
    match value {
        Some(value) if !value.trim().is_empty() => max_length(errors, field, value, max),
        _ => errors.push(FieldError {
            field,
            error: format!("The {} field is required.", field),
        }),
    }
}

// Lengths are counted in characters, not bytes.
fn max_length(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(FieldError {
            field,
            error: format!(
                "The field {} must be a string with a maximum length of {}.",
                field, max
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: Option<&str>, author: Option<&str>, description: Option<&str>) -> CreateBook {
        CreateBook {
            title: title.map(str::to_string),
            author: author.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn valid_create_keeps_fields() {
        let fields = create(Some("Dune"), Some("Herbert"), Some(""))
            .validate()
            .unwrap();
        assert_eq!(fields.title, "Dune");
        assert_eq!(fields.author, "Herbert");
        assert_eq!(fields.description.as_deref(), Some(""));
    }

    #[test]
    fn description_may_be_absent() {
        let fields = create(Some("Dune"), Some("Herbert"), None).validate().unwrap();
        assert_eq!(fields.description, None);
    }

    #[test]
    fn missing_and_blank_required_fields_are_reported() {
        let errors = create(None, Some("   "), None).validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "author"]);
        assert_eq!(errors[0].error, "The title field is required.");
    }

    #[test]
    fn length_bounds_count_characters() {
        let at_limit = "é".repeat(TITLE_MAX_CHARS);
        assert!(create(Some(&at_limit), Some("a"), None).validate().is_ok());

        let too_long = "x".repeat(TITLE_MAX_CHARS + 1);
        let long_description = "d".repeat(DESCRIPTION_MAX_CHARS + 1);
        let errors = create(Some(&too_long), Some("a"), Some(&long_description))
            .validate()
            .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "description"]);
        assert!(errors[1].error.contains("maximum length of 500"));
    }

    #[test]
    fn create_ignores_client_supplied_id() {
        let body: CreateBook =
            serde_json::from_str(r#"{"id": 42, "title": "Dune", "author": "Herbert"}"#).unwrap();
        assert!(body.validate().is_ok());
    }

    #[test]
    fn update_returns_body_id_alongside_fields() {
        let body: UpdateBook =
            serde_json::from_str(r#"{"id": 7, "title": "Dune", "author": "Herbert"}"#).unwrap();
        let (id, fields) = body.validate().unwrap();
        assert_eq!(id, Some(7));
        assert_eq!(fields.title, "Dune");
    }
}
