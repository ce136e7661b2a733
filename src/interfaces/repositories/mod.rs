pub mod event;
pub mod sqlx_repo;
pub mod token;
