pub mod content;
pub mod event;
pub mod image;
pub mod session;
