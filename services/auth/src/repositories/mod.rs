//! Repositories for database operations

pub mod refresh_token;
pub mod user;

pub use refresh_token::{PgRefreshTokenRepository, RefreshTokenRepository};
pub use user::UserRepository;
