pub mod ai;
pub mod content;
pub mod events;
pub mod extractors;
pub mod images;
pub mod optimistic;
pub mod session;
