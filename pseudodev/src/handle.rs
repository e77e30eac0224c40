use std::sync::atomic::{AtomicI64, Ordering};

use crate::access::AccessMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(i64);

impl HandleId {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.0
    }
}

/// Thread-safe ID generator
#[derive(Debug)]
pub struct IdGen {
    next_id: AtomicI64,
}

impl IdGen {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }

    /// Get the next unique ID
    pub fn get_next(&self) -> HandleId {
        HandleId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// One open session on an endpoint
///
/// Refers to its endpoint by minor index, tagged with the instance id of
/// the `Devices` that issued it; any other instance rejects the handle.
/// Only `Devices::open` creates handles and `Devices::close` consumes them,
/// so `0 <= position <= capacity` holds for as long as the handle lives.
#[derive(Debug)]
pub struct Handle {
    id: HandleId,
    owner: u64,
    minor: usize,
    pub(crate) position: i64,
    mode: AccessMode,
}

impl Handle {
    pub(crate) fn new(id: HandleId, owner: u64, minor: usize, mode: AccessMode) -> Self {
        Self {
            id,
            owner,
            minor,
            position: 0,
            mode,
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    /// Minor index of the bound endpoint
    #[must_use]
    pub fn minor(&self) -> usize {
        self.minor
    }

    #[must_use]
    pub fn position(&self) -> i64 {
        self.position
    }

    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}
