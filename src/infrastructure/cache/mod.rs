mod view_cache;

pub use view_cache::{CacheTicket, ViewCache};
