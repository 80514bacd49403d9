mod handlers;
pub mod products;
pub mod releases;
pub mod store;

use crate::state::AppState;
use axum::Router;

use products::Product;
use releases::Release;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes::<Product>("/products"))
        .merge(handlers::routes::<Release>("/releases"))
}
