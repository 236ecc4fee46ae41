//! Add/edit form shared by both flows.
//!
//! The form only holds field state. Submitting hands the values back to the
//! caller; it never talks to the API itself.

use std::fmt;

use thiserror::Error;

use crate::api::BookInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Description,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Title, Field::Author, Field::Description];

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Description => "Description",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Field::Description)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("the form is not open")]
    Closed,

    #[error("{0} is required")]
    Required(Field),
}

#[derive(Debug, Clone, Default)]
pub struct BookForm {
    open: bool,
    defaults: BookInput,
    values: BookInput,
}

impl BookForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open bound to `defaults`; field state starts from them.
    pub fn open(&mut self, defaults: BookInput) {
        self.values = defaults.clone();
        self.defaults = defaults;
        self.open = true;
    }

    /// Rebind to new defaults. Field state is refreshed only when they differ.
    pub fn set_defaults(&mut self, defaults: BookInput) {
        if self.defaults != defaults {
            self.values = defaults.clone();
            self.defaults = defaults;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn heading(&self) -> &'static str {
        if self.defaults.title.is_empty() {
            "Add Book"
        } else {
            "Edit Book"
        }
    }

    pub fn values(&self) -> &BookInput {
        &self.values
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.values.title,
            Field::Author => &self.values.author,
            Field::Description => &self.values.description,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Title => self.values.title = value,
            Field::Author => self.values.author = value,
            Field::Description => self.values.description = value,
        }
    }

    /// Check required fields, close, and hand back the current values.
    pub fn submit(&mut self) -> Result<BookInput, FormError> {
        if !self.open {
            return Err(FormError::Closed);
        }

        if let Some(missing) = Field::ALL
            .into_iter()
            .find(|field| field.is_required() && self.value(*field).trim().is_empty())
        {
            return Err(FormError::Required(missing));
        }

        self.open = false;
        Ok(self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> BookInput {
        BookInput {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            description: "spice".to_string(),
        }
    }

    #[test]
    fn add_form_starts_empty() {
        let mut form = BookForm::new();
        form.open(BookInput::default());

        assert!(form.is_open());
        assert_eq!(form.heading(), "Add Book");
        assert_eq!(form.values(), &BookInput::default());
    }

    #[test]
    fn edit_form_is_prefilled() {
        let mut form = BookForm::new();
        form.open(dune());

        assert_eq!(form.heading(), "Edit Book");
        assert_eq!(form.value(Field::Title), "Dune");
        assert_eq!(form.value(Field::Description), "spice");
    }

    #[test]
    fn new_defaults_refresh_edited_fields() {
        let mut form = BookForm::new();
        form.open(dune());
        form.set(Field::Title, "typed");

        let emma = BookInput {
            title: "Emma".to_string(),
            author: "Austen".to_string(),
            description: String::new(),
        };
        form.set_defaults(emma.clone());
        assert_eq!(form.values(), &emma);
    }

    #[test]
    fn same_defaults_keep_edits() {
        let mut form = BookForm::new();
        form.open(dune());
        form.set(Field::Author, "Frank Herbert");

        form.set_defaults(dune());
        assert_eq!(form.value(Field::Author), "Frank Herbert");
    }

    #[test]
    fn reopening_discards_abandoned_edits() {
        let mut form = BookForm::new();
        form.open(BookInput::default());
        form.set(Field::Title, "half typed");
        form.close();

        form.open(BookInput::default());
        assert_eq!(form.value(Field::Title), "");
    }

    #[test]
    fn submit_emits_values_and_closes() {
        let mut form = BookForm::new();
        form.open(BookInput::default());
        form.set(Field::Title, "Dune");
        form.set(Field::Author, "Herbert");

        let submitted = form.submit().unwrap();
        assert_eq!(submitted.title, "Dune");
        assert_eq!(submitted.description, "");
        assert!(!form.is_open());
    }

    #[test]
    fn submit_requires_title_and_author() {
        let mut form = BookForm::new();
        form.open(BookInput::default());
        form.set(Field::Author, "Herbert");

        assert_eq!(form.submit(), Err(FormError::Required(Field::Title)));
        assert!(form.is_open());

        form.set(Field::Title, "Dune");
        form.set(Field::Author, "  ");
        assert_eq!(form.submit(), Err(FormError::Required(Field::Author)));
    }

    #[test]
    fn closed_form_cannot_submit() {
        let mut form = BookForm::new();
        assert_eq!(form.submit(), Err(FormError::Closed));
    }
}
