pub mod ai;
pub mod changes;
pub mod content;
pub mod events;
pub mod home;
pub mod media;
pub mod session;
pub mod system;
