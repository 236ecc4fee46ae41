//! Thin HTTP client for the books API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Where the client looks for the API unless told otherwise.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// A book as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Editable fields of a book, as the form holds them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub description: String,
}

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone().unwrap_or_default(),
        }
    }
}

/// Body sent on update; the server rejects it unless `id` matches the path.
#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    id: i64,
    #[serde(flatten)]
    fields: &'a BookInput,
}

/// Status and decoded body of a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub data: T,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}: {message}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        message: String,
    },

    #[error("{method} {url} returned an unreadable body: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The four calls the list view makes.
#[async_trait]
pub trait BooksApi: Send + Sync {
    async fn get_books(&self) -> Result<ApiResponse<Vec<Book>>, ClientError>;

    async fn create_book(&self, book: &BookInput) -> Result<ApiResponse<Book>, ClientError>;

    async fn update_book(&self, id: i64, book: &BookInput)
        -> Result<ApiResponse<()>, ClientError>;

    async fn delete_book(&self, id: i64) -> Result<ApiResponse<()>, ClientError>;
}

/// [`BooksApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBooksApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBooksApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn books_url(&self, id: Option<i64>) -> String {
        match id {
            Some(id) => format!("{}/books/{}", self.base_url, id),
            None => format!("{}/books", self.base_url),
        }
    }

    /// Send the request and turn non-2xx statuses into [`ClientError::Status`].
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> Result<(reqwest::Response, Method, String), ClientError> {
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, %url, "calling books API");

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                method,
                url,
                status,
                message: error_message(&text),
            });
        }

        Ok((response, method, url))
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, ClientError> {
        let (response, method, url) = self.send(method, url, body).await?;
        let status = response.status();
        let data = response
            .json::<T>()
            .await
            .map_err(|source| ClientError::Decode {
                method,
                url,
                source,
            })?;
        Ok(ApiResponse { status, data })
    }

    async fn send_empty<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> Result<ApiResponse<()>, ClientError> {
        let (response, _, _) = self.send(method, url, body).await?;
        Ok(ApiResponse {
            status: response.status(),
            data: (),
        })
    }
}

#[async_trait]
impl BooksApi for HttpBooksApi {
    async fn get_books(&self) -> Result<ApiResponse<Vec<Book>>, ClientError> {
        self.send_json(Method::GET, self.books_url(None), None::<&()>)
            .await
    }

    async fn create_book(&self, book: &BookInput) -> Result<ApiResponse<Book>, ClientError> {
        self.send_json(Method::POST, self.books_url(None), Some(book))
            .await
    }

    async fn update_book(
        &self,
        id: i64,
        book: &BookInput,
    ) -> Result<ApiResponse<()>, ClientError> {
        let body = UpdateBody { id, fields: book };
        self.send_empty(Method::PUT, self.books_url(Some(id)), Some(&body))
            .await
    }

    async fn delete_book(&self, id: i64) -> Result<ApiResponse<()>, ClientError> {
        self.send_empty(Method::DELETE, self.books_url(Some(id)), None::<&()>)
            .await
    }
}

/// Pull `message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorMessage {
        message: String,
    }

    match serde_json::from_str::<ErrorMessage>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dune() -> BookInput {
        BookInput {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn get_books_decodes_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "title": "Dune", "author": "Herbert", "description": null},
                {"id": 2, "title": "Emma", "author": "Austen", "description": "novel"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpBooksApi::new(format!("{}/api/", server.uri()));
        let ApiResponse { status, data } = api.get_books().await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].description, None);
        assert_eq!(data[1].description.as_deref(), Some("novel"));
    }

    #[tokio::test]
    async fn create_posts_fields_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/books"))
            .and(body_json(json!({"title": "Dune", "author": "Herbert", "description": ""})))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!({"id": 3, "title": "Dune", "author": "Herbert", "description": ""}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpBooksApi::new(format!("{}/api", server.uri()));
        let response = api.create_book(&dune()).await.unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.data.id, 3);
    }

    #[tokio::test]
    async fn update_puts_id_in_path_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/books/3"))
            .and(body_json(
                json!({"id": 3, "title": "Dune", "author": "Herbert", "description": ""}),
            ))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpBooksApi::new(format!("{}/api", server.uri()));
        let response = api.update_book(3, &dune()).await.unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn delete_not_found_carries_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/books/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Book not found.",
                "code": "not_found",
                "details": [],
                "trace_id": "t",
                "timestamp": "now"
            })))
            .mount(&server)
            .await;

        let api = HttpBooksApi::new(format!("{}/api", server.uri()));
        let err = api.delete_book(999).await.unwrap_err();

        match err {
            ClientError::Status {
                status, message, ..
            } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Book not found.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is not served by anything in the test environment.
        let api = HttpBooksApi::new("http://127.0.0.1:9/api");
        let err = api.get_books().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[test]
    fn trailing_slashes_are_dropped_from_base_url() {
        let api = HttpBooksApi::new("http://localhost:8080/api//");
        assert_eq!(api.books_url(Some(2)), "http://localhost:8080/api/books/2");
    }

    #[test]
    fn plain_text_errors_are_kept_verbatim() {
        assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
    }
}
