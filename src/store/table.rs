//! Store - the record container mutated by command workers.
//!
//! The [`Store`] provides:
//! - Insert / update / delete / find by name
//! - Ordered, copied snapshots
//!
//! It has no locking of its own; concurrent callers go through the
//! [`AccessGuard`](crate::concurrency::AccessGuard).

use crate::common::config::{DuplicatePolicy, BUCKET_COUNT, MAX_NAME_LEN};
use crate::common::{Error, Result};
use crate::store::{one_at_a_time, Record};

/// Result of [`Store::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was created.
    Inserted(Record),
    /// The name existed and its value was overwritten ([`DuplicatePolicy::Merge`]).
    Updated { previous: Record, current: Record },
    /// The name existed and was left untouched ([`DuplicatePolicy::Reject`]).
    Duplicate(Record),
}

/// Arena-backed record store with a fixed hash index.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                           Store                             │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │   buckets    │  │     slots: Vec<Option<Record>>    │   │
/// │  │ hash % 1024  │─▶│  [Rec0] [None] [Rec2] [Rec3] ...  │   │
/// │  │ → [slot ids] │  └───────────────────────────────────┘   │
/// │  └──────────────┘  ┌──────────────┐                        │
/// │                    │  free_list   │                        │
/// │                    │  Vec<usize>  │                        │
/// │                    └──────────────┘                        │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// Records are keyed by the `(hash, name)` pair: two names with the same
/// hash share a bucket but remain separate records.
#[derive(Debug)]
pub struct Store {
    /// Record arena. `None` marks a vacant slot.
    slots: Vec<Option<Record>>,

    /// Vacant slot indices, reused LIFO.
    free_list: Vec<usize>,

    /// `hash % BUCKET_COUNT` → slot indices in that bucket.
    buckets: Vec<Vec<usize>>,

    /// Behaviour of `insert` on an existing name.
    policy: DuplicatePolicy,

    /// Number of live records.
    len: usize,
}

impl Store {
    /// Create an empty store that merges duplicate inserts.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Merge)
    }

    /// Create an empty store with an explicit duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            buckets: vec![Vec::new(); BUCKET_COUNT],
            policy,
            len: 0,
        }
    }

    /// The duplicate policy in effect.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    // ========================================================================
    // Mutations (caller holds the write guard)
    // ========================================================================

    /// Insert `name = value`.
    ///
    /// # Errors
    /// - `Error::NameTooLong` if `name` exceeds `MAX_NAME_LEN` bytes
    /// - `Error::OutOfMemory` if room for a new record cannot be reserved
    ///
    /// Both are raised before the store is touched.
    pub fn insert(&mut self, name: &str, value: u32) -> Result<InsertOutcome> {
        if name.len() > MAX_NAME_LEN {
            return Err(Error::NameTooLong {
                name: name.to_string(),
                max: MAX_NAME_LEN,
            });
        }

        let hash = one_at_a_time(name);

        if let Some(slot) = self.locate(hash, name) {
            let policy = self.policy;
            let record = self.record_mut(slot);
            return Ok(match policy {
                DuplicatePolicy::Merge => {
                    let previous = record.clone();
                    record.value = value;
                    InsertOutcome::Updated {
                        previous,
                        current: record.clone(),
                    }
                }
                DuplicatePolicy::Reject => InsertOutcome::Duplicate(record.clone()),
            });
        }

        let bucket = bucket_index(hash);

        // Reserve everything up front so a failed allocation leaves no trace.
        self.buckets[bucket]
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory)?;
        if self.free_list.is_empty() {
            self.slots.try_reserve(1).map_err(|_| Error::OutOfMemory)?;
        }

        let record = Record {
            hash,
            name: name.to_string(),
            value,
        };

        let slot = match self.free_list.pop() {
            Some(slot) => {
                self.slots[slot] = Some(record.clone());
                slot
            }
            None => {
                self.slots.push(Some(record.clone()));
                self.slots.len() - 1
            }
        };
        self.buckets[bucket].push(slot);
        self.len += 1;

        Ok(InsertOutcome::Inserted(record))
    }

    /// Overwrite the value of an existing record.
    ///
    /// Returns `(before, after)` copies, or `None` if the name is absent.
    pub fn update(&mut self, name: &str, value: u32) -> Option<(Record, Record)> {
        let slot = self.locate(one_at_a_time(name), name)?;
        let record = self.record_mut(slot);

        let before = record.clone();
        record.value = value;

        Some((before, record.clone()))
    }

    /// Remove a record, returning it.
    ///
    /// A miss leaves the store untouched.
    pub fn delete(&mut self, name: &str) -> Option<Record> {
        let hash = one_at_a_time(name);
        let bucket = bucket_index(hash);

        let pos = self.buckets[bucket]
            .iter()
            .position(|&slot| self.matches(slot, hash, name))?;
        let slot = self.buckets[bucket].swap_remove(pos);

        let removed = self.slots[slot].take();
        self.free_list.push(slot);
        self.len -= 1;

        removed
    }

    // ========================================================================
    // Queries (caller holds at least the read guard)
    // ========================================================================

    /// Look up a record by name.
    pub fn find(&self, name: &str) -> Option<Record> {
        let slot = self.locate(one_at_a_time(name), name)?;
        self.slots[slot].clone()
    }

    /// Copy every live record, ordered by hash then name.
    ///
    /// The returned vector is independent of the store; an empty store
    /// yields an empty vector.
    pub fn snapshot(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self.slots.iter().flatten().cloned().collect();
        records.sort_unstable();
        records
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn locate(&self, hash: u32, name: &str) -> Option<usize> {
        self.buckets[bucket_index(hash)]
            .iter()
            .copied()
            .find(|&slot| self.matches(slot, hash, name))
    }

    fn matches(&self, slot: usize, hash: u32, name: &str) -> bool {
        matches!(&self.slots[slot], Some(r) if r.hash == hash && r.name == name)
    }

    fn record_mut(&mut self, slot: usize) -> &mut Record {
        self.slots[slot]
            .as_mut()
            .unwrap_or_else(|| panic!("bucket references vacant slot {}", slot))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bucket_index(hash: u32) -> usize {
    hash as usize % BUCKET_COUNT
}
