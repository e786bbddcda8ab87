//! Per-pass segment storage with O(1) removal.
//!
//! Segments live in an arena of slots threaded into a doubly linked
//! list by index. A [`SegmentId`] names a slot, so removing a segment
//! only relinks its neighbours; nothing is scanned. Slots are never
//! reused, which means a stale handle resolves to `None` instead of
//! aliasing a different segment.
//!
//! Insertion rejects degenerate segments and segments that duplicate a
//! stored one in either orientation. That check is a linear scan, so
//! filling a store is O(n²) in the worst case; a single page rarely
//! holds more than a few thousand segments.

use crate::types::Segment;

/// Handle to a segment inside one [`SegmentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(usize);

#[derive(Debug, Clone)]
struct Slot {
    segment: Segment,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Unordered collection of the segments of one pass.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    slots: Vec<Option<Slot>>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl SegmentStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of stored segments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no segments are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if a stored segment covers the same line as
    /// `candidate`, in either orientation.
    #[must_use]
    pub fn contains(&self, candidate: &Segment) -> bool {
        self.segments().any(|s| s.is_duplicate_of(candidate))
    }

    /// Append a segment unless it is degenerate or already stored.
    ///
    /// Returns the new handle, or `None` if the segment was dropped.
    pub fn insert(&mut self, segment: Segment) -> Option<SegmentId> {
        if segment.is_degenerate() || self.contains(&segment) {
            return None;
        }
        Some(self.push_back(segment))
    }

    /// Append without the duplicate scan.
    ///
    /// Callers must only pass segments that already satisfy the store
    /// invariants, e.g. segments taken out of another store.
    pub(crate) fn push_back(&mut self, segment: Segment) -> SegmentId {
        let index = self.slots.len();
        self.slots.push(Some(Slot {
            segment,
            prev: self.tail,
            next: None,
        }));
        match self.tail.and_then(|t| self.slot_mut(t)) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        SegmentId(index)
    }

    /// Look up a stored segment.
    #[must_use]
    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.slot(id.0).map(|slot| &slot.segment)
    }

    /// Remove a segment by handle in constant time.
    ///
    /// Returns `None` if the handle was already removed.
    pub fn remove(&mut self, id: SegmentId) -> Option<Segment> {
        let slot = self.slots.get_mut(id.0)?.take()?;

        match slot.prev.and_then(|p| self.slot_mut(p)) {
            Some(prev) => prev.next = slot.next,
            None => self.head = slot.next,
        }
        match slot.next.and_then(|n| self.slot_mut(n)) {
            Some(next) => next.prev = slot.prev,
            None => self.tail = slot.prev,
        }

        self.len -= 1;
        Some(slot.segment)
    }

    /// Iterate over `(handle, segment)` pairs in insertion order.
    #[must_use]
    pub const fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
        }
    }

    /// Iterate over the stored segments in insertion order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.iter().map(|(_, segment)| segment)
    }

    fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }
}

impl FromIterator<Segment> for SegmentStore {
    /// Collect segments with the same filtering as [`SegmentStore::insert`].
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut store = Self::new();
        for segment in iter {
            store.insert(segment);
        }
        store
    }
}

/// Insertion-order iterator over a [`SegmentStore`].
pub struct Iter<'a> {
    store: &'a SegmentStore,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (SegmentId, &'a Segment);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = self.store.slot(index)?;
        self.cursor = slot.next;
        Some((SegmentId(index), &slot.segment))
    }
}

impl<'a> IntoIterator for &'a SegmentStore {
    type Item = (SegmentId, &'a Segment);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
