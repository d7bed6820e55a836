use axum::Router;

use crate::state::AppState;

pub mod cipher;
pub mod claims;
pub mod cookies;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod tokens;
pub mod totp;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
