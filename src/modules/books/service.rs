use anyhow::Context;
use async_trait::async_trait;
use library_db::Database;

use super::models::{Book, BookFields};

/// Operations the HTTP layer needs from the book catalog.
///
/// Absence is reported through `Option`/`bool`; `Err` is reserved for store
/// failures.
#[async_trait]
pub trait BookService: Send + Sync {
    /// All books in store order.
    async fn list_books(&self) -> anyhow::Result<Vec<Book>>;

    async fn get_book(&self, id: i64) -> anyhow::Result<Option<Book>>;

    /// Persist a new book and return it with its assigned id.
    async fn create_book(&self, fields: BookFields) -> anyhow::Result<Book>;

    /// Replace title, author and description. `false` when `id` is unknown.
    async fn update_book(&self, id: i64, fields: BookFields) -> anyhow::Result<bool>;

    /// `false` when `id` is unknown.
    async fn delete_book(&self, id: i64) -> anyhow::Result<bool>;
}

/// [`BookService`] backed by the `books` table.
#[derive(Debug, Clone)]
pub struct SqlBookService {
    db: Database,
}

impl SqlBookService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookService for SqlBookService {
    async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        sqlx::query_as::<_, Book>("SELECT id, title, author, description FROM books ORDER BY id")
            .fetch_all(self.db.pool())
            .await
            .context("failed to list books")
    }

    async fn get_book(&self, id: i64) -> anyhow::Result<Option<Book>> {
        sqlx::query_as::<_, Book>("SELECT id, title, author, description FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .with_context(|| format!("failed to load book {}", id))
    }

    async fn create_book(&self, fields: BookFields) -> anyhow::Result<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, description)
            VALUES (?, ?, ?)
            RETURNING id, title, author, description
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.author)
        .bind(&fields.description)
        .fetch_one(self.db.pool())
        .await
        .context("failed to insert book")?;

        Ok(book)
    }

    async fn update_book(&self, id: i64, fields: BookFields) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE books SET title = ?, author = ?, description = ? WHERE id = ?")
                .bind(&fields.title)
                .bind(&fields.author)
                .bind(&fields.description)
                .bind(id)
                .execute(self.db.pool())
                .await
                .with_context(|| format!("failed to update book {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_book(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .with_context(|| format!("failed to delete book {}", id))?;

        Ok(result.rows_affected() > 0)
    }
}
