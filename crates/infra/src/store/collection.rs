//! Versioned keyed collections and their per-transaction read/write sets.
//!
//! Every committed entry carries the commit sequence number that last wrote
//! it. A transaction records the version it observed for each key it read
//! (0 for a miss); at commit the read set must still match, otherwise the
//! transaction lost a race and is retried (first committer wins).

use std::collections::{BTreeMap, HashMap};

use stockhold_core::Entity;

use super::r#trait::StoreError;

#[derive(Debug, Clone)]
struct Versioned<E> {
    value: E,
    version: u64,
}

/// Committed state of one keyed collection.
#[derive(Debug)]
pub(crate) struct VersionedCollection<E: Entity> {
    entries: BTreeMap<E::Id, Versioned<E>>,
}

impl<E: Entity> Default for VersionedCollection<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E> VersionedCollection<E>
where
    E: Entity + Clone,
{
    pub(crate) fn get(&self, id: &E::Id) -> Option<&E> {
        self.entries.get(id).map(|v| &v.value)
    }

    /// Value and version; absent keys report version 0.
    pub(crate) fn lookup(&self, id: &E::Id) -> (Option<&E>, u64) {
        match self.entries.get(id) {
            Some(v) => (Some(&v.value), v.version),
            None => (None, 0),
        }
    }

    pub(crate) fn version(&self, id: &E::Id) -> u64 {
        self.entries.get(id).map_or(0, |v| v.version)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &E> {
        self.entries.values().map(|v| &v.value)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn apply(&mut self, value: E, version: u64) {
        self.entries
            .insert(value.id().clone(), Versioned { value, version });
    }
}

#[derive(Debug, Clone)]
enum StagedWrite<E> {
    /// Insert or replace.
    Put(E),
    /// Key must be absent at commit.
    Create(E),
    /// Key must be present at commit.
    Update(E),
}

impl<E> StagedWrite<E> {
    fn value(&self) -> &E {
        match self {
            StagedWrite::Put(v) | StagedWrite::Create(v) | StagedWrite::Update(v) => v,
        }
    }

    fn into_value(self) -> E {
        match self {
            StagedWrite::Put(v) | StagedWrite::Create(v) | StagedWrite::Update(v) => v,
        }
    }
}

/// Read set and buffered writes of one collection within one attempt.
#[derive(Debug)]
pub(crate) struct CollectionTxn<E: Entity> {
    name: &'static str,
    reads: HashMap<E::Id, u64>,
    writes: BTreeMap<E::Id, StagedWrite<E>>,
}

impl<E> CollectionTxn<E>
where
    E: Entity + Clone,
{
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Read-your-writes: the buffered value, if this attempt wrote the key.
    pub(crate) fn staged(&self, id: &E::Id) -> Option<&E> {
        self.writes.get(id).map(StagedWrite::value)
    }

    /// Remember the first version observed for `id`.
    pub(crate) fn record_read(&mut self, id: &E::Id, version: u64) {
        self.reads.entry(id.clone()).or_insert(version);
    }

    pub(crate) fn put(&mut self, value: E) {
        let id = value.id().clone();
        let staged = match self.writes.remove(&id) {
            Some(StagedWrite::Create(_)) => StagedWrite::Create(value),
            _ => StagedWrite::Put(value),
        };
        self.writes.insert(id, staged);
    }

    pub(crate) fn create(&mut self, value: E) -> Result<(), StoreError> {
        let id = value.id().clone();
        if self.writes.contains_key(&id) {
            return Err(StoreError::AlreadyExists(format!("{}/{id:?}", self.name)));
        }
        self.writes.insert(id, StagedWrite::Create(value));
        Ok(())
    }

    pub(crate) fn update(&mut self, value: E) {
        let id = value.id().clone();
        let staged = match self.writes.remove(&id) {
            Some(StagedWrite::Create(_)) => StagedWrite::Create(value),
            Some(StagedWrite::Put(_)) => StagedWrite::Put(value),
            _ => StagedWrite::Update(value),
        };
        self.writes.insert(id, staged);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Fail with `Conflict` if any key read by this attempt has since changed.
    pub(crate) fn check_reads(&self, committed: &VersionedCollection<E>) -> Result<(), StoreError> {
        for (id, seen) in &self.reads {
            let current = committed.version(id);
            if current != *seen {
                return Err(StoreError::Conflict(format!(
                    "{}/{id:?} (read v{seen}, now v{current})",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Full commit-time validation: read set plus create/update preconditions.
    pub(crate) fn validate(&self, committed: &VersionedCollection<E>) -> Result<(), StoreError> {
        self.check_reads(committed)?;
        for (id, write) in &self.writes {
            match write {
                StagedWrite::Create(_) if committed.get(id).is_some() => {
                    return Err(StoreError::AlreadyExists(format!("{}/{id:?}", self.name)));
                }
                StagedWrite::Update(_) if committed.get(id).is_none() => {
                    return Err(StoreError::Missing(format!("{}/{id:?}", self.name)));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn apply(self, committed: &mut VersionedCollection<E>, version: u64) {
        for (_, write) in self.writes {
            committed.apply(write.into_value(), version);
        }
    }
}
