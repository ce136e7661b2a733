pub mod ai;
pub mod auth;
pub mod cache;
pub mod db;
pub mod feed;
pub mod imaging;
pub mod limiter;
pub mod storage;
pub mod utils;
