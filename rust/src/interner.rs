//! Reference interning for activity lookups.
//!
//! Maps activity reference strings to arena ids. The sentinel references are
//! interned first so they always resolve to `ActivityId::START` and
//! `ActivityId::FINISH`.

use rustc_hash::FxHashMap;

use crate::activity::{ActivityId, FINISH_REFERENCE, START_REFERENCE};

/// Reference -> id index. References are never removed, so ids are dense.
#[derive(Debug, Clone)]
pub struct ReferenceInterner {
    to_id: FxHashMap<String, ActivityId>,
}

impl ReferenceInterner {
    /// Create an interner holding only the two sentinel references.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut interner = Self {
            to_id: FxHashMap::with_capacity_and_hasher(capacity + 2, Default::default()),
        };
        interner.intern(START_REFERENCE);
        interner.intern(FINISH_REFERENCE);
        interner
    }

    /// Intern a reference, returning its id. Existing references keep their id.
    pub fn intern(&mut self, reference: &str) -> ActivityId {
        if let Some(&id) = self.to_id.get(reference) {
            return id;
        }
        let id = ActivityId(self.to_id.len() as u32);
        self.to_id.insert(reference.to_string(), id);
        id
    }

    #[inline]
    pub fn get(&self, reference: &str) -> Option<ActivityId> {
        self.to_id.get(reference).copied()
    }
}

impl Default for ReferenceInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
