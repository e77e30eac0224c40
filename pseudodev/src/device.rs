//! Dispatch surface over the endpoint registry
//!
//! `Devices` is what callers talk to: it resolves minor indexes, runs the
//! access check on open, and routes seek/read/write to the transfer engine
//! for the endpoint a handle is bound to.
//!
//! # Example
//!
//! ```
//! use pseudodev::{AccessMode, DeviceConfig, Devices, Whence};
//!
//! let devices = Devices::new(&DeviceConfig::default());
//! let mut handle = devices.open(2, AccessMode::ReadWrite).unwrap();
//! assert_eq!(devices.write(&mut handle, "hello").unwrap(), 5);
//!
//! devices.seek(&mut handle, 0, Whence::Start).unwrap();
//! let mut buf = [0u8; 128];
//! let n = devices.read(&mut handle, &mut buf[..], 128).unwrap();
//! assert_eq!(&buf[..n], b"hello");
//! devices.close(handle);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, warn};

use crate::access::{check_open, AccessMode};
use crate::config::DeviceConfig;
use crate::endpoint::{Endpoint, Policy};
use crate::error::{DeviceError, Result};
use crate::handle::{Handle, IdGen};
use crate::registry::Registry;
use crate::transfer::{self, Whence};
use crate::uaccess::{CopyFromUser, CopyToUser};

/// Point-in-time view of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointStat {
    pub minor: usize,
    pub capacity: usize,
    pub policy: Policy,
    pub high_water_mark: usize,
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

pub struct Devices {
    registry: Registry,
    id_gen: IdGen,
    /// Tag stamped on every handle this instance issues
    instance: u64,
}

impl Devices {
    #[must_use]
    pub fn new(config: &DeviceConfig) -> Self {
        Self::from_registry(Registry::new(config))
    }

    #[must_use]
    pub fn from_registry(registry: Registry) -> Self {
        Self {
            registry,
            id_gen: IdGen::new(),
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.registry.len()
    }

    /// # Errors
    /// `NoSuchEndpoint` for an unknown minor index.
    pub fn stat(&self, minor: usize) -> Result<EndpointStat> {
        let endpoint = self.registry.resolve(minor)?;
        Ok(EndpointStat {
            minor,
            capacity: endpoint.capacity(),
            policy: endpoint.policy(),
            high_water_mark: endpoint.high_water_mark(),
        })
    }

    /// Open a session on endpoint `minor`, positioned at 0.
    ///
    /// # Errors
    /// `NoSuchEndpoint` for an unknown minor index, `PermissionDenied` when
    /// the endpoint policy does not grant `requested`.
    pub fn open(&self, minor: usize, requested: AccessMode) -> Result<Handle> {
        let endpoint = self.registry.resolve(minor).inspect_err(|_| {
            warn!(minor, "open of unknown endpoint");
        })?;
        let granted = check_open(endpoint, requested).inspect_err(|_| {
            warn!(minor, policy = ?endpoint.policy(), ?requested, "permission denied");
        })?;

        let handle = Handle::new(self.id_gen.get_next(), self.instance, minor, granted);
        info!(
            minor,
            name = %endpoint.name(),
            handle = handle.id().id(),
            mode = ?granted,
            "device opened"
        );
        Ok(handle)
    }

    /// Release a session. The endpoint contents are left as they are.
    pub fn close(&self, handle: Handle) {
        info!(
            minor = handle.minor(),
            handle = handle.id().id(),
            "device closed"
        );
    }

    /// # Errors
    /// `InvalidArgument` if the target lies outside `[0, capacity]`,
    /// `ForeignHandle` for a handle issued by another `Devices`.
    pub fn seek(&self, handle: &mut Handle, offset: i64, whence: Whence) -> Result<i64> {
        let endpoint = self.endpoint_of(handle)?;
        transfer::seek(endpoint, handle, offset, whence)
    }

    /// Read up to `max_bytes` into `dest`, returning how many were read.
    ///
    /// # Errors
    /// `WrongMode` on a write-only handle, `TransferFault` when `dest`
    /// cannot take the bytes.
    pub fn read<D: CopyToUser + ?Sized>(
        &self,
        handle: &mut Handle,
        dest: &mut D,
        max_bytes: usize,
    ) -> Result<usize> {
        if !handle.mode().can_read() {
            return Err(DeviceError::WrongMode {
                granted: handle.mode(),
            });
        }
        let endpoint = self.endpoint_of(handle)?;
        transfer::read(endpoint, handle, dest, max_bytes)
    }

    /// Write the bytes of `src`, returning how many were accepted.
    ///
    /// # Errors
    /// `WrongMode` on a read-only handle, `OutOfSpace` when the cursor is at
    /// capacity, `TransferFault` when `src` cannot be read.
    pub fn write<S: CopyFromUser + ?Sized>(&self, handle: &mut Handle, src: &S) -> Result<usize> {
        if !handle.mode().can_write() {
            return Err(DeviceError::WrongMode {
                granted: handle.mode(),
            });
        }
        let endpoint = self.endpoint_of(handle)?;
        transfer::write(endpoint, handle, src)
    }

    fn endpoint_of(&self, handle: &Handle) -> Result<&Endpoint> {
        if handle.owner() != self.instance {
            warn!(
                minor = handle.minor(),
                handle = handle.id().id(),
                "handle from another device set"
            );
            return Err(DeviceError::ForeignHandle {
                minor: handle.minor(),
            });
        }
        self.registry.resolve(handle.minor())
    }
}

impl Default for Devices {
    fn default() -> Self {
        Self::new(&DeviceConfig::default())
    }
}
