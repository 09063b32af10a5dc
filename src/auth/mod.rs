use crate::state::AppState;
use axum::Router;

pub mod codes;
mod dto;
mod emails;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod validate;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
