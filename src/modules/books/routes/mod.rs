//! REST handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use library_http::AppError;

use super::models::{Book, CreateBook, FieldError, UpdateBook};
use super::service::BookService;

pub type SharedBookService = Arc<dyn BookService>;

const NOT_FOUND: &str = "Book not found.";
const ID_MISMATCH: &str = "ID mismatch.";
const VALIDATION_FAILED: &str = "One or more validation errors occurred.";

/// Build the books router; paths are relative to the module mount point.
pub fn router(service: SharedBookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn list_books(
    State(service): State<SharedBookService>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = service.list_books().await?;
    Ok(Json(books))
}

async fn get_book(
    State(service): State<SharedBookService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id.map_err(rejected_path)?;
    match service.get_book(id).await? {
        Some(book) => Ok(Json(book)),
        None => Err(AppError::not_found(NOT_FOUND)),
    }
}

async fn create_book(
    State(service): State<SharedBookService>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(rejected_body)?;
    let fields = payload.validate().map_err(validation_failed)?;

    let book = service.create_book(fields).await?;
    tracing::info!(book_id = book.id, "book created");

    let location = format!("/api/books/{}", book.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(book),
    ))
}

async fn update_book(
    State(service): State<SharedBookService>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(rejected_path)?;
    let Json(payload) = payload.map_err(rejected_body)?;
    let (body_id, fields) = payload.validate().map_err(validation_failed)?;

    if body_id != Some(id) {
        return Err(AppError::bad_request(ID_MISMATCH));
    }

    if !service.update_book(id, fields).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(book_id = id, "book updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_book(
    State(service): State<SharedBookService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(rejected_path)?;
    if !service.delete_book(id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }

    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn rejected_path(rejection: PathRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

fn rejected_body(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}

fn validation_failed(errors: Vec<FieldError>) -> AppError {
    AppError::validation(
        errors.iter().map(FieldError::to_json).collect(),
        VALIDATION_FAILED,
    )
}
