use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{catalog::store::Document, error::AppError, state::AppState};

/// `POST|GET /{path}` and `GET|PUT|DELETE /{path}/:id` for one document kind.
pub fn routes<T: Document>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(list::<T>).post(create::<T>))
        .route(
            &format!("{path}/:id"),
            get(fetch::<T>).put(replace::<T>).delete(remove::<T>),
        )
}

fn not_found<T: Document>() -> AppError {
    AppError::NotFound(format!("{} not found.", T::KIND))
}

#[instrument(skip_all, fields(kind = T::KIND))]
async fn create<T: Document>(
    State(state): State<AppState>,
    input: Result<Json<T::Input>, JsonRejection>,
) -> Result<(StatusCode, Json<T>), AppError> {
    let Json(input) = input?;
    let doc = T::store(&state).insert(input).await?;
    info!("document created");
    Ok((StatusCode::CREATED, Json(doc)))
}

#[instrument(skip_all, fields(kind = T::KIND))]
async fn list<T: Document>(State(state): State<AppState>) -> Result<Json<Vec<T>>, AppError> {
    Ok(Json(T::store(&state).list().await?))
}

#[instrument(skip(state), fields(kind = T::KIND))]
async fn fetch<T: Document>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<T>, AppError> {
    T::store(&state)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found::<T>)
}

#[instrument(skip(state, input), fields(kind = T::KIND))]
async fn replace<T: Document>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    input: Result<Json<T::Input>, JsonRejection>,
) -> Result<Json<T>, AppError> {
    let Json(input) = input?;
    let doc = T::store(&state)
        .replace(id, input)
        .await?
        .ok_or_else(not_found::<T>)?;
    info!("document replaced");
    Ok(Json(doc))
}

#[instrument(skip(state), fields(kind = T::KIND))]
async fn remove<T: Document>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<T>), AppError> {
    let doc = T::store(&state)
        .delete(id)
        .await?
        .ok_or_else(not_found::<T>)?;
    info!("document deleted");
    Ok((StatusCode::ACCEPTED, Json(doc)))
}
