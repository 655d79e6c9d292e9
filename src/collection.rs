//! A sorted, de-duplicated list that the refresh loop writes to while a
//! consumer on another task or thread reads it.
//!
//! Readers go through a read lock and therefore only ever see the list before
//! or after a mutation. Consumers that need more than that (e.g. a renderer
//! that must not redraw halfway through its own frame) can register a
//! [`SyncHook`]: every insert and clear is then run through it.

use std::cmp::Ordering;
use std::sync::{Arc, PoisonError, RwLock};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Consumer-supplied hook that every mutation is marshalled through.
///
/// Implementations must call `access` exactly once before returning. `access`
/// may be handed to another thread (e.g. a UI thread) as long as the hook
/// blocks until it has run.
pub(crate) trait SyncHook: Send + Sync {
    fn marshal(&self, access: &mut (dyn FnMut() + Send), write_access: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Change<T> {
    Inserted { index: usize, item: T },
    Cleared,
}

pub(crate) struct SortedMergeCollection<T> {
    items: RwLock<Vec<T>>,
    hook: RwLock<Option<Arc<dyn SyncHook>>>,
    changes: tokio::sync::broadcast::Sender<Change<T>>,
}

impl<T: Clone + Send + Sync + 'static> SortedMergeCollection<T> {
    pub(crate) fn new() -> Self {
        let (changes, _) = tokio::sync::broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            items: RwLock::new(Vec::new()),
            hook: RwLock::new(None),
            changes,
        }
    }

    pub(crate) fn set_sync_hook(&self, hook: Arc<dyn SyncHook>) {
        *self.hook.write().unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// Receives every change in the order it was applied.
    pub(crate) fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Change<T>> {
        self.changes.subscribe()
    }

    /// Inserts `item` after every element that does not sort strictly after it,
    /// so equal elements keep their arrival order. Returns the index.
    #[allow(unused)]
    pub(crate) fn insert(
        &self,
        item: T,
        compare: impl Fn(&T, &T) -> Ordering + Sync,
    ) -> Option<usize> {
        self.mutate(|items, changes| Some(insert_sorted(items, changes, item, &compare)))
            .flatten()
    }

    /// Like [`insert`](Self::insert) but discards `item` if an element with the
    /// same key is already present. The check and the insert happen under the
    /// same write access.
    pub(crate) fn insert_unique<K: PartialEq>(
        &self,
        item: T,
        key: impl Fn(&T) -> K + Sync,
        compare: impl Fn(&T, &T) -> Ordering + Sync,
    ) -> Option<usize> {
        self.mutate(|items, changes| {
            let new_key = key(&item);
            if items.iter().any(|existing| key(existing) == new_key) {
                return None;
            }
            Some(insert_sorted(items, changes, item, &compare))
        })
        .flatten()
    }

    pub(crate) fn clear(&self) {
        self.mutate(|items, changes| {
            items.clear();
            let _ = changes.send(Change::Cleared);
        });
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.with_items(|items| items.to_vec())
    }

    pub(crate) fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        f(items.as_slice())
    }

    #[allow(unused)]
    pub(crate) fn contains(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.with_items(|items| items.iter().any(predicate))
    }

    pub(crate) fn len(&self) -> usize {
        self.with_items(|items| items.len())
    }

    #[allow(unused)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `mutation` under the write lock, through the hook if one is set.
    /// Returns `None` if the hook never ran the mutation.
    fn mutate<R: Send>(
        &self,
        mutation: impl FnOnce(&mut Vec<T>, &tokio::sync::broadcast::Sender<Change<T>>) -> R + Send,
    ) -> Option<R> {
        let mut mutation = Some(mutation);
        let mut result = None;

        let mut access = || {
            if let Some(mutation) = mutation.take() {
                let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
                result = Some(mutation(&mut *items, &self.changes));
            }
        };

        let hook = self
            .hook
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match hook {
            Some(hook) => hook.marshal(&mut access, true),
            None => access(),
        }

        if result.is_none() {
            tracing::error!("Sync hook returned without applying the mutation");
        }
        result
    }
}

fn insert_sorted<T: Clone>(
    items: &mut Vec<T>,
    changes: &tokio::sync::broadcast::Sender<Change<T>>,
    item: T,
    compare: &impl Fn(&T, &T) -> Ordering,
) -> usize {
    let index = items.partition_point(|existing| compare(existing, &item) != Ordering::Greater);
    items.insert(index, item.clone());
    let _ = changes.send(Change::Inserted { index, item });
    index
}
