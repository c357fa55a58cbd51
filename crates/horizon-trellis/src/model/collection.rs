//! An observable, ordered collection of items.
//!
//! `Collection<T>` is the data source a [`ListNode`](crate::view::ListNode)
//! mirrors. Every item gets a stable [`ItemId`] when it enters the
//! collection; mutations emit their signal after the change is applied and
//! the internal lock is released, so slots may read the collection freely.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use horizon_trellis_core::Signal;
use horizon_trellis_core::logging::targets;
use parking_lot::RwLock;

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an item within a collection.
///
/// Displayed as `c1`, `c2`, ... and used as the child key of the item's view.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate a fresh, process-wide unique identifier.
    pub fn next() -> Self {
        Self(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId(c{})", self.0)
    }
}

/// An item together with its identity.
pub struct Record<T> {
    /// The item's identity.
    pub id: ItemId,
    /// The item.
    pub item: Arc<T>,
}

impl<T> Record<T> {
    fn new(item: T) -> Self {
        Self {
            id: ItemId::next(),
            item: Arc::new(item),
        }
    }
}

impl<T> Clone for Record<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            item: self.item.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("item", &self.item)
            .finish()
    }
}

/// Signals emitted by a [`Collection`].
pub struct CollectionSignals<T> {
    /// An item entered the collection.
    pub item_added: Signal<Record<T>>,
    /// An item left the collection.
    pub item_removed: Signal<Record<T>>,
    /// The contents were replaced wholesale.
    pub reset: Signal<()>,
    /// A fetch began.
    pub fetch_started: Signal<()>,
    /// A fetch finished, successfully or not.
    pub fetch_completed: Signal<()>,
}

impl<T: Send + Sync + 'static> CollectionSignals<T> {
    fn new() -> Self {
        Self {
            item_added: Signal::new(),
            item_removed: Signal::new(),
            reset: Signal::new(),
            fetch_started: Signal::new(),
            fetch_completed: Signal::new(),
        }
    }
}

/// How [`Collection::fetch_with`] applies loaded items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Replace the contents and emit `reset`.
    #[default]
    Reset,
    /// Push each item, emitting `item_added` per item.
    Append,
}

/// An observable, ordered collection.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use horizon_trellis::model::Collection;
///
/// let tasks = Collection::new(vec!["write docs"]);
/// let added = Arc::new(Mutex::new(Vec::new()));
///
/// let recv = added.clone();
/// tasks.signals().item_added.connect(move |record| {
///     recv.lock().push(*record.item);
/// });
///
/// tasks.push("ship it");
/// assert_eq!(tasks.len(), 2);
/// assert_eq!(*added.lock(), vec!["ship it"]);
/// ```
pub struct Collection<T> {
    records: RwLock<Vec<Record<T>>>,
    fetching: AtomicBool,
    signals: CollectionSignals<T>,
}

impl<T: Send + Sync + 'static> Collection<T> {
    /// Create a collection holding `items`. No signals are emitted.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            records: RwLock::new(items.into_iter().map(Record::new).collect()),
            fetching: AtomicBool::new(false),
            signals: CollectionSignals::new(),
        }
    }

    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Create a shared collection, ready to hand to list views.
    pub fn shared(items: Vec<T>) -> Arc<Self> {
        Arc::new(Self::new(items))
    }

    /// The collection's signals.
    pub fn signals(&self) -> &CollectionSignals<T> {
        &self.signals
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of every record, in order.
    pub fn records(&self) -> Vec<Record<T>> {
        self.records.read().clone()
    }

    /// Identifiers of every item, in order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.records.read().iter().map(|record| record.id).collect()
    }

    /// The item with the given identifier.
    pub fn get(&self, id: ItemId) -> Option<Arc<T>> {
        self.records
            .read()
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.item.clone())
    }

    /// The record at `index`.
    pub fn at(&self, index: usize) -> Option<Record<T>> {
        self.records.read().get(index).cloned()
    }

    /// Position of the item with the given identifier.
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.records.read().iter().position(|record| record.id == id)
    }

    /// Whether the collection holds an item with the given identifier.
    pub fn contains(&self, id: ItemId) -> bool {
        self.position(id).is_some()
    }

    /// Append an item and emit `item_added`.
    pub fn push(&self, item: T) -> ItemId {
        let record = Record::new(item);
        self.records.write().push(record.clone());
        self.added(record)
    }

    /// Insert an item at `index` and emit `item_added`.
    ///
    /// An index past the end appends.
    pub fn insert(&self, index: usize, item: T) -> ItemId {
        let record = Record::new(item);
        {
            let mut records = self.records.write();
            let index = index.min(records.len());
            records.insert(index, record.clone());
        }
        self.added(record)
    }

    fn added(&self, record: Record<T>) -> ItemId {
        let id = record.id;
        tracing::trace!(target: targets::MODEL, item = %id, "item added");
        self.signals.item_added.emit(record);
        id
    }

    /// Remove the item with the given identifier and emit `item_removed`.
    ///
    /// Returns `None`, without emitting, if the item is not present.
    pub fn remove(&self, id: ItemId) -> Option<Arc<T>> {
        let record = {
            let mut records = self.records.write();
            let index = records.iter().position(|record| record.id == id)?;
            records.remove(index)
        };
        let item = record.item.clone();
        self.removed(record);
        Some(item)
    }

    /// Remove the item at `index` and emit `item_removed`.
    pub fn remove_at(&self, index: usize) -> Option<Record<T>> {
        let record = {
            let mut records = self.records.write();
            if index >= records.len() {
                return None;
            }
            records.remove(index)
        };
        self.removed(record.clone());
        Some(record)
    }

    fn removed(&self, record: Record<T>) {
        tracing::trace!(target: targets::MODEL, item = %record.id, "item removed");
        self.signals.item_removed.emit(record);
    }

    /// Replace every item and emit `reset`.
    pub fn reset(&self, items: Vec<T>) {
        let records: Vec<_> = items.into_iter().map(Record::new).collect();
        let count = records.len();
        *self.records.write() = records;
        tracing::debug!(target: targets::MODEL, count, "collection reset");
        self.signals.reset.emit(());
    }

    /// Remove every item and emit `reset`.
    pub fn clear(&self) {
        self.reset(Vec::new());
    }

    // =========================================================================
    // Fetch lifecycle
    // =========================================================================

    /// Whether a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    /// Mark a fetch as started and emit `fetch_started`.
    pub fn begin_fetch(&self) {
        self.fetching.store(true, Ordering::Release);
        tracing::debug!(target: targets::MODEL, "fetch started");
        self.signals.fetch_started.emit(());
    }

    /// Mark a fetch as finished and emit `fetch_completed`.
    pub fn finish_fetch(&self) {
        self.fetching.store(false, Ordering::Release);
        tracing::debug!(target: targets::MODEL, "fetch completed");
        self.signals.fetch_completed.emit(());
    }

    /// Run `loader` as a fetch.
    ///
    /// Emits `fetch_started`, applies the loaded items according to `mode`,
    /// then emits `fetch_completed`. `fetch_completed` is emitted even when
    /// the loader fails; the collection is left untouched in that case and
    /// the loader's error is returned. On success, returns the number of
    /// items loaded.
    pub fn fetch_with<E, F>(&self, mode: FetchMode, loader: F) -> Result<usize, E>
    where
        F: FnOnce() -> Result<Vec<T>, E>,
    {
        self.begin_fetch();
        let outcome = match loader() {
            Ok(items) => {
                let count = items.len();
                match mode {
                    FetchMode::Reset => self.reset(items),
                    FetchMode::Append => {
                        for item in items {
                            self.push(item);
                        }
                    }
                }
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(target: targets::MODEL, ?mode, "fetch loader failed");
                Err(err)
            }
        };
        self.finish_fetch();
        outcome
    }
}

impl<T: Send + Sync + 'static> Default for Collection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("len", &self.records.read().len())
            .field("fetching", &self.fetching.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Collection<String>: Send, Sync);
