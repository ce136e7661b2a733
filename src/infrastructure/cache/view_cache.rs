use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::entities::event::{Event, EventPage};

#[derive(Debug, Clone)]
struct Cached<T> {
    value: Arc<T>,
    stored_at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Invalidation generation observed before a repository read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTicket(u64);

/// Rendered views of the listing and of each event page.
///
/// Entries expire after `ttl`; mutations invalidate the affected views
/// so the next read goes back to the repository. A view read under a
/// [`CacheTicket`] taken before an invalidation is never stored.
pub struct ViewCache {
    ttl: Duration,
    generation: RwLock<u64>,
    listing: RwLock<Option<Cached<Vec<Event>>>>,
    pages: DashMap<Uuid, Cached<EventPage>>,
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: RwLock::new(0),
            listing: RwLock::new(None),
            pages: DashMap::new(),
        }
    }

    /// Take before reading the repository; pass to `store_*`.
    pub fn ticket(&self) -> CacheTicket {
        CacheTicket(*self.generation.read())
    }

    pub fn listing(&self) -> Option<Arc<Vec<Event>>> {
        self.listing
            .read()
            .as_ref()
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn store_listing(&self, ticket: CacheTicket, events: Vec<Event>) -> Arc<Vec<Event>> {
        let entry = Cached::new(events);
        let value = entry.value.clone();
        let generation = self.generation.read();
        if *generation == ticket.0 {
            *self.listing.write() = Some(entry);
        } else {
            tracing::debug!("Listing changed during read, not caching");
        }
        value
    }

    pub fn page(&self, event_id: &Uuid) -> Option<Arc<EventPage>> {
        self.pages
            .get(event_id)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn store_page(&self, ticket: CacheTicket, page: EventPage) -> Arc<EventPage> {
        let id = page.event.id;
        let entry = Cached::new(page);
        let value = entry.value.clone();
        let generation = self.generation.read();
        if *generation == ticket.0 {
            self.pages.insert(id, entry);
        } else {
            tracing::debug!(event_id = %id, "Page changed during read, not caching");
        }
        value
    }

    /// Drops the listing and the page of `event_id`.
    pub fn invalidate_event(&self, event_id: &Uuid) {
        let mut generation = self.generation.write();
        *generation += 1;
        *self.listing.write() = None;
        self.pages.remove(event_id);
        tracing::debug!(%event_id, "View cache invalidated");
    }

    pub fn invalidate_listing(&self) {
        let mut generation = self.generation.write();
        *generation += 1;
        *self.listing.write() = None;
    }

    /// Removes expired entries; returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let mut evicted = 0;

        {
            let mut listing = self.listing.write();
            if listing.as_ref().is_some_and(|entry| !entry.is_fresh(self.ttl)) {
                *listing = None;
                evicted += 1;
            }
        }

        let before = self.pages.len();
        self.pages.retain(|_, entry| entry.is_fresh(self.ttl));
        evicted + before.saturating_sub(self.pages.len())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
