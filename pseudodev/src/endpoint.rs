//! Fixed-capacity endpoint with internal locking
//!
//! An endpoint owns a zero-initialised byte buffer of exactly `capacity`
//! bytes, the high-water mark of what has been written into it, and the
//! access policy declared at construction.
//!
//! # Thread Safety
//!
//! The buffer and the high-water mark sit behind one `parking_lot::Mutex`.
//! The transfer engine holds the lock for the whole of a read or a write,
//! so two writers never interleave within a call. Capacity and policy are
//! immutable and readable without locking.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Access restriction declared by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Mutable part of an endpoint
pub(crate) struct EndpointState {
    pub(crate) buffer: Box<[u8]>,
    /// One past the last byte of the most recent write, `<= buffer.len()`
    pub(crate) high_water_mark: usize,
}

/// Read-only guard to the endpoint buffer
///
/// Holds the endpoint lock until dropped. Dereferences to the whole
/// buffer, including never-written space past the high-water mark.
pub struct EndpointReadGuard<'a>(MutexGuard<'a, EndpointState>);

impl EndpointReadGuard<'_> {
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.0.high_water_mark
    }
}

impl Deref for EndpointReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0.buffer
    }
}

impl AsRef<[u8]> for EndpointReadGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0.buffer
    }
}

/// One addressable storage unit
pub struct Endpoint {
    minor: usize,
    capacity: usize,
    policy: Policy,
    state: Mutex<EndpointState>,
}

impl Endpoint {
    /// Create an endpoint with a zeroed buffer of `capacity` bytes.
    ///
    /// A capacity of zero is accepted; every read on such an endpoint
    /// returns 0 and every write fails with `OutOfSpace`.
    #[must_use]
    pub fn new(minor: usize, capacity: usize, policy: Policy) -> Self {
        Self {
            minor,
            capacity,
            policy,
            state: Mutex::new(EndpointState {
                buffer: vec![0u8; capacity].into_boxed_slice(),
                high_water_mark: 0,
            }),
        }
    }

    #[must_use]
    pub fn minor(&self) -> usize {
        self.minor
    }

    /// Name under which the endpoint shows up in logs
    #[must_use]
    pub fn name(&self) -> String {
        format!("pcd{}", self.minor)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.state.lock().high_water_mark
    }

    /// Lock the buffer for inspection
    #[must_use]
    pub fn lock(&self) -> EndpointReadGuard<'_> {
        EndpointReadGuard(self.state.lock())
    }

    pub(crate) fn lock_mut(&self) -> MutexGuard<'_, EndpointState> {
        self.state.lock()
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("minor", &self.minor)
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            // try_lock: Debug may run while a transfer holds the lock
            .field(
                "high_water_mark",
                &self.state.try_lock().map(|s| s.high_water_mark),
            )
            .finish()
    }
}
