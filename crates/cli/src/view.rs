//! Book list view: holds the fetched catalog and drives add/edit/delete.
//!
//! Every successful mutation re-fetches the whole list instead of patching
//! local state.

use std::fmt::Write as _;

use crate::api::{ApiResponse, Book, BookInput, BooksApi};
use crate::form::{BookForm, FormError};
use crate::notify::{Level, Notifications};

pub struct BookListView<A> {
    api: A,
    books: Vec<Book>,
    editing: Option<Book>,
    form: BookForm,
    notifications: Notifications,
}

impl<A: BooksApi> BookListView<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            books: Vec::new(),
            editing: None,
            form: BookForm::new(),
            notifications: Notifications::default(),
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book(&self, id: i64) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn editing(&self) -> Option<&Book> {
        self.editing.as_ref()
    }

    pub fn form(&self) -> &BookForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut BookForm {
        &mut self.form
    }

    pub fn notifications(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Fetch the list. Failures are logged and surfaced as a notification.
    pub async fn load(&mut self) -> bool {
        match self.api.get_books().await {
            Ok(ApiResponse { data, .. }) => {
                self.books = data;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to fetch books");
                self.notifications.error("Failed to load books.");
                false
            }
        }
    }

    pub fn open_add(&mut self) {
        self.editing = None;
        self.bind_form(BookInput::default());
    }

    /// Open the form prefilled from the listed book. `false` if it is not listed.
    pub fn open_edit(&mut self, id: i64) -> bool {
        let Some(book) = self.book(id).cloned() else {
            return false;
        };
        self.bind_form(BookInput::from(&book));
        self.editing = Some(book);
        true
    }

    /// An open form is rebound so edits survive unless the target changed.
    fn bind_form(&mut self, defaults: BookInput) {
        if self.form.is_open() {
            self.form.set_defaults(defaults);
        } else {
            self.form.open(defaults);
        }
    }

    pub fn cancel(&mut self) {
        self.form.close();
        self.editing = None;
    }

    /// Submit the open form and save what it emits.
    pub async fn submit_form(&mut self) -> Result<bool, FormError> {
        let values = self.form.submit()?;
        Ok(self.save(values).await)
    }

    /// Create, or update the book being edited, then re-fetch.
    pub async fn save(&mut self, values: BookInput) -> bool {
        let result = match &self.editing {
            Some(book) => self
                .api
                .update_book(book.id, &values)
                .await
                .map(|_| "Book updated."),
            None => self
                .api
                .create_book(&values)
                .await
                .map(|_| "Book added."),
        };

        match result {
            Ok(message) => {
                self.editing = None;
                self.form.close();
                self.notifications.success(message);
                self.load().await;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "Error saving book");
                self.notifications.error("Failed to save book.");
                false
            }
        }
    }

    /// Delete by id, then re-fetch. Confirmation is the caller's job.
    pub async fn delete(&mut self, id: i64) -> bool {
        match self.api.delete_book(id).await {
            Ok(_) => {
                if self.editing.as_ref().is_some_and(|book| book.id == id) {
                    self.cancel();
                }
                self.notifications.success("Book deleted.");
                self.load().await;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, book_id = id, "Error deleting the book");
                self.notifications.error("Failed to delete book.");
                false
            }
        }
    }

    /// Table of books followed by any live notifications.
    pub fn render(&mut self) -> String {
        let mut out = render_table(&self.books);

        for notification in self.notifications.active() {
            let tag = match notification.level {
                Level::Success => "ok",
                Level::Error => "error",
            };
            let _ = writeln!(out, "[{}] {}", tag, notification.message);
        }

        out
    }
}

const HEADERS: [&str; 4] = ["ID", "Title", "Author", "Description"];

fn render_table(books: &[Book]) -> String {
    let rows: Vec<[String; 4]> = books
        .iter()
        .map(|book| {
            [
                book.id.to_string(),
                book.title.clone(),
                book.author.clone(),
                book.description.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    if rows.is_empty() {
        let _ = writeln!(out, "(no books)");
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let fill = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(fill))
        })
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientError;
    use async_trait::async_trait;
    use reqwest::{Method, StatusCode};
    use std::sync::Mutex;

    /// In-memory stand-in for the HTTP API that records every call.
    #[derive(Default)]
    struct FakeApi {
        books: Mutex<Vec<Book>>,
        calls: Mutex<Vec<String>>,
        fail_mutations: bool,
        next_id: Mutex<i64>,
    }

    impl FakeApi {
        fn with_books(titles: &[&str]) -> Self {
            let api = FakeApi::default();
            for title in titles {
                let id = api.bump();
                api.books.lock().unwrap().push(Book {
                    id,
                    title: title.to_string(),
                    author: "Someone".to_string(),
                    description: None,
                });
            }
            api
        }

        fn bump(&self) -> i64 {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn failure(&self, method: Method) -> ClientError {
            ClientError::Status {
                method,
                url: "fake".to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "boom".to_string(),
            }
        }
    }

    #[async_trait]
    impl BooksApi for &FakeApi {
        async fn get_books(&self) -> Result<ApiResponse<Vec<Book>>, ClientError> {
            self.record("list".to_string());
            Ok(ApiResponse {
                status: StatusCode::OK,
                data: self.books.lock().unwrap().clone(),
            })
        }

        async fn create_book(&self, book: &BookInput) -> Result<ApiResponse<Book>, ClientError> {
            self.record(format!("create {}", book.title));
            if self.fail_mutations {
                return Err(self.failure(Method::POST));
            }
            let created = Book {
                id: self.bump(),
                title: book.title.clone(),
                author: book.author.clone(),
                description: Some(book.description.clone()),
            };
            self.books.lock().unwrap().push(created.clone());
            Ok(ApiResponse {
                status: StatusCode::CREATED,
                data: created,
            })
        }

        async fn update_book(
            &self,
            id: i64,
            book: &BookInput,
        ) -> Result<ApiResponse<()>, ClientError> {
            self.record(format!("update {} {}", id, book.title));
            if self.fail_mutations {
                return Err(self.failure(Method::PUT));
            }
            let mut books = self.books.lock().unwrap();
            let stored = books.iter_mut().find(|b| b.id == id).unwrap();
            stored.title = book.title.clone();
            stored.author = book.author.clone();
            stored.description = Some(book.description.clone());
            Ok(ApiResponse {
                status: StatusCode::NO_CONTENT,
                data: (),
            })
        }

        async fn delete_book(&self, id: i64) -> Result<ApiResponse<()>, ClientError> {
            self.record(format!("delete {}", id));
            if self.fail_mutations {
                return Err(self.failure(Method::DELETE));
            }
            self.books.lock().unwrap().retain(|b| b.id != id);
            Ok(ApiResponse {
                status: StatusCode::NO_CONTENT,
                data: (),
            })
        }
    }

    #[tokio::test]
    async fn load_fetches_once() {
        let api = FakeApi::with_books(&["Dune", "Emma"]);
        let mut view = BookListView::new(&api);

        assert!(view.load().await);
        assert_eq!(view.books().len(), 2);
        assert_eq!(api.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn add_flow_creates_then_refetches() {
        let api = FakeApi::with_books(&[]);
        let mut view = BookListView::new(&api);
        view.load().await;

        view.open_add();
        assert_eq!(view.form().heading(), "Add Book");
        view.form_mut().set(crate::form::Field::Title, "Dune");
        view.form_mut().set(crate::form::Field::Author, "Herbert");

        assert_eq!(view.submit_form().await, Ok(true));
        assert!(!view.form().is_open());
        assert_eq!(view.books().len(), 1);
        assert_eq!(api.calls(), vec!["list", "create Dune", "list"]);
        assert_eq!(view.notifications().active()[0].message, "Book added.");
    }

    #[tokio::test]
    async fn edit_flow_updates_selected_book() {
        let api = FakeApi::with_books(&["Dune", "Emma"]);
        let mut view = BookListView::new(&api);
        view.load().await;

        assert!(view.open_edit(2));
        assert_eq!(view.form().heading(), "Edit Book");
        assert_eq!(view.form().values().title, "Emma");

        view.form_mut().set(crate::form::Field::Title, "Persuasion");
        assert_eq!(view.submit_form().await, Ok(true));

        assert!(view.editing().is_none());
        assert_eq!(view.book(2).unwrap().title, "Persuasion");
        assert_eq!(api.calls(), vec!["list", "update 2 Persuasion", "list"]);
    }

    #[tokio::test]
    async fn switching_edit_targets_refreshes_the_form() {
        let api = FakeApi::with_books(&["Dune", "Emma"]);
        let mut view = BookListView::new(&api);
        view.load().await;

        view.open_edit(1);
        view.form_mut().set(crate::form::Field::Title, "scratch");
        view.open_edit(2);
        assert_eq!(view.form().values().title, "Emma");

        view.open_add();
        assert_eq!(view.form().values(), &BookInput::default());
        assert!(view.editing().is_none());
    }

    #[tokio::test]
    async fn reselecting_the_same_book_keeps_edits() {
        let api = FakeApi::with_books(&["Dune"]);
        let mut view = BookListView::new(&api);
        view.load().await;

        view.open_edit(1);
        view.form_mut().set(crate::form::Field::Author, "Frank Herbert");
        view.open_edit(1);
        assert_eq!(view.form().values().author, "Frank Herbert");

        view.cancel();
        view.open_edit(1);
        assert_eq!(view.form().values().author, "Someone");
    }

    #[tokio::test]
    async fn edit_of_unlisted_book_is_refused() {
        let api = FakeApi::with_books(&["Dune"]);
        let mut view = BookListView::new(&api);
        view.load().await;

        assert!(!view.open_edit(42));
        assert!(!view.form().is_open());
    }

    #[tokio::test]
    async fn delete_refetches_list() {
        let api = FakeApi::with_books(&["Dune", "Emma"]);
        let mut view = BookListView::new(&api);
        view.load().await;

        assert!(view.delete(1).await);
        assert_eq!(view.books().len(), 1);
        assert_eq!(api.calls(), vec!["list", "delete 1", "list"]);
    }

    #[tokio::test]
    async fn failed_mutation_notifies_without_refetch() {
        let mut api = FakeApi::with_books(&["Dune"]);
        api.fail_mutations = true;
        let mut view = BookListView::new(&api);
        view.load().await;

        assert!(!view.delete(1).await);
        assert!(!view.save(BookInput::default()).await);

        assert_eq!(api.calls(), vec!["list", "delete 1", "create "]);
        let messages: Vec<_> = view
            .notifications()
            .active()
            .iter()
            .map(|n| (n.level, n.message.clone()))
            .collect();
        assert_eq!(
            messages,
            vec![
                (Level::Error, "Failed to delete book.".to_string()),
                (Level::Error, "Failed to save book.".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn incomplete_form_is_not_sent() {
        let api = FakeApi::with_books(&[]);
        let mut view = BookListView::new(&api);

        view.open_add();
        view.form_mut().set(crate::form::Field::Title, "Dune");
        assert_eq!(
            view.submit_form().await,
            Err(FormError::Required(crate::form::Field::Author))
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn table_pads_columns() {
        let books = vec![Book {
            id: 7,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            description: Some("spice".to_string()),
        }];

        let table = render_table(&books);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "ID | Title | Author  | Description");
        assert_eq!(lines[2], "7  | Dune  | Herbert | spice");
    }

    #[test]
    fn empty_table_says_so() {
        assert!(render_table(&[]).contains("(no books)"));
    }
}
