//! Terminal frontend for the library catalog API.
//!
//! [`api`] wraps the HTTP calls, [`view::BookListView`] holds the list and
//! drives the add/edit/delete flows, [`form::BookForm`] is the shared
//! add/edit form, and [`shell::Shell`] is the interactive loop.

pub mod api;
pub mod form;
pub mod notify;
pub mod shell;
pub mod view;

pub use api::{ApiResponse, Book, BookInput, BooksApi, ClientError, HttpBooksApi};
pub use view::BookListView;
