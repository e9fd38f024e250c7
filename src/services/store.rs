use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{Banner, Bike, Booking, Coupon, EntityId, Notification, Place, User};

/// Records that can be reconciled by id after a mutation.
pub trait Keyed {
    fn key(&self) -> &EntityId;
}

macro_rules! keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &EntityId {
                &self.id
            }
        })*
    };
}

keyed!(Banner, Bike, Booking, Coupon, Notification, Place, User);

/// Issued when a fetch starts; the fetch may only apply its result with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug)]
struct Snapshot<T> {
    applied: u64,
    items: Option<Arc<Vec<T>>>,
}

/// Last loaded copy of one remote list.
///
/// Fetches are numbered as they start. A result only replaces the snapshot
/// when it belongs to a newer fetch than the one already applied, so a slow
/// response never overwrites a fresher one.
#[derive(Debug)]
pub struct Collection<T> {
    next: AtomicU64,
    snapshot: RwLock<Snapshot<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(0),
            snapshot: RwLock::new(Snapshot {
                applied: 0,
                items: None,
            }),
        }
    }
}

impl<T: Clone + Keyed> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns whether the result was applied.
    pub fn apply(&self, ticket: FetchTicket, items: Vec<T>) -> bool {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 <= snapshot.applied {
            tracing::debug!(ticket = ticket.0, applied = snapshot.applied, "discarding stale fetch result");
            return false;
        }
        snapshot.applied = ticket.0;
        snapshot.items = Some(Arc::new(items));
        true
    }

    /// `None` until the first fetch lands.
    pub fn items(&self) -> Option<Arc<Vec<T>>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .clone()
    }

    pub fn find(&self, id: &EntityId) -> Option<T> {
        self.items()?.iter().find(|item| item.key() == id).cloned()
    }

    /// Replaces the record with the same id, or appends it.
    pub fn upsert(&self, item: T) {
        self.modify(|items| match items.iter_mut().find(|i| i.key() == item.key()) {
            Some(existing) => *existing = item,
            None => items.push(item),
        });
    }

    pub fn remove(&self, id: &EntityId) -> bool {
        let mut removed = false;
        self.modify(|items| {
            let before = items.len();
            items.retain(|i| i.key() != id);
            removed = items.len() != before;
        });
        removed
    }

    /// Drops the snapshot. Fetches already in flight may still apply, but
    /// only if they started after the last applied one.
    pub fn clear(&self) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.applied = self.next.load(Ordering::SeqCst);
        snapshot.items = None;
    }

    fn modify(&self, f: impl FnOnce(&mut Vec<T>)) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(items) = snapshot.items.as_mut() {
            f(Arc::make_mut(items));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawPlace;
    use serde_json::json;

    fn place(id: i64, name: &str) -> Place {
        serde_json::from_value::<RawPlace>(json!({"id": id, "name": name}))
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn test_empty_until_first_fetch() {
        let places: Collection<Place> = Collection::new();
        assert!(places.items().is_none());
        let ticket = places.begin_fetch();
        assert!(places.apply(ticket, vec![]));
        assert_eq!(places.items().unwrap().len(), 0);
    }

    #[test]
    fn test_stale_result_never_overwrites_newer() {
        let places: Collection<Place> = Collection::new();
        let slow = places.begin_fetch();
        let fast = places.begin_fetch();

        assert!(places.apply(fast, vec![place(1, "Fresh")]));
        assert!(!places.apply(slow, vec![place(1, "Stale")]));

        let items = places.items().unwrap();
        assert_eq!(items[0].name.as_deref(), Some("Fresh"));
    }

    #[test]
    fn test_in_order_results_apply() {
        let places: Collection<Place> = Collection::new();
        let first = places.begin_fetch();
        assert!(places.apply(first, vec![place(1, "A")]));
        let second = places.begin_fetch();
        assert!(places.apply(second, vec![place(1, "A"), place(2, "B")]));
        assert_eq!(places.items().unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_and_remove() {
        let places: Collection<Place> = Collection::new();
        let ticket = places.begin_fetch();
        places.apply(ticket, vec![place(1, "A"), place(2, "B")]);

        places.upsert(place(2, "B2"));
        places.upsert(place(3, "C"));
        let names: Vec<_> = places
            .items()
            .unwrap()
            .iter()
            .map(|p| p.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["A", "B2", "C"]);

        assert!(places.remove(&EntityId::from("1")));
        assert!(!places.remove(&EntityId::from("1")));
        assert!(places.find(&EntityId::from("1")).is_none());
        assert_eq!(places.find(&EntityId::from(3)).unwrap().name.as_deref(), Some("C"));
    }

    #[test]
    fn test_upsert_before_load_is_ignored() {
        let places: Collection<Place> = Collection::new();
        places.upsert(place(1, "A"));
        assert!(places.items().is_none());
    }

    #[test]
    fn test_clear_discards_fetches_started_before() {
        let places: Collection<Place> = Collection::new();
        let before = places.begin_fetch();
        places.clear();
        assert!(!places.apply(before, vec![place(1, "A")]));
        let after = places.begin_fetch();
        assert!(places.apply(after, vec![place(1, "A")]));
    }
}
