mod change_feed;

pub use change_feed::{ChangeEvent, ChangeFeed, Subscription};
