use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StorageError;

const MAX_KEY_LENGTH: usize = 512;

/// Where a content image sits inside its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Single,
    Gallery(usize),
    WithText,
}

/// `events/{millis}_{slug}.jpg`
pub fn cover_image_key(title: &str, at: DateTime<Utc>) -> String {
    let mut slug = slug::slugify(title);
    if slug.is_empty() {
        slug = "event".to_string();
    }
    slug.truncate(80);
    format!("events/{}_{}.jpg", at.timestamp_millis(), slug.trim_end_matches('-'))
}

/// `events/{eventId}/content/{millis}_{tag}[suffix].jpg`
///
/// `tag` is random so uploads landing in the same millisecond never share a key.
pub fn content_image_key(event_id: &Uuid, at: DateTime<Utc>, slot: ImageSlot) -> String {
    let millis = at.timestamp_millis();
    let id = Uuid::new_v4().simple().to_string();
    let tag = &id[..8];
    match slot {
        ImageSlot::Single => format!("events/{}/content/{}_{}.jpg", event_id, millis, tag),
        ImageSlot::Gallery(index) => format!("events/{}/content/{}_{}_{}.jpg", event_id, millis, tag, index),
        ImageSlot::WithText => format!("events/{}/content/{}_{}_text.jpg", event_id, millis, tag),
    }
}

/// Keys are relative, `/`-separated and may not escape the storage root.
/// Hidden segments are reserved for the backend's own bookkeeping.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.len() > MAX_KEY_LENGTH
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|segment| segment.is_empty() || segment.starts_with('.'));

    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
