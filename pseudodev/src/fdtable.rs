//! Descriptor-based access to the devices
//!
//! Maps integer file descriptors to open handles, the way a process sees
//! the device nodes: `open` with open(2) flags, `lseek` with a raw
//! `whence`, and reads and writes on plain byte slices.
//!
//! # Thread Safety
//!
//! The table lock only guards the fd map and the fd counter. Each handle
//! sits in its own slot behind a separate lock, so descriptors on
//! different endpoints transfer in parallel and only calls on the same fd
//! serialise. Lock order is table, then slot, then endpoint; the table
//! lock is released before a slot is locked.

use std::collections::HashMap;
use std::os::raw::c_int;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::access::AccessMode;
use crate::device::Devices;
use crate::error::{DeviceError, Result};
use crate::handle::Handle;
use crate::transfer::Whence;

/// Open handle of one fd; `None` once `close` has taken it
type Slot = Arc<Mutex<Option<Handle>>>;

struct Table {
    /// fd → open handle
    handles: HashMap<c_int, Slot>,
    /// Next fd to allocate; descriptors are never reused
    next_fd: c_int,
}

pub struct FdTable {
    devices: Devices,
    table: Mutex<Table>,
}

impl FdTable {
    #[must_use]
    pub fn new(devices: Devices) -> Self {
        Self {
            devices,
            table: Mutex::new(Table {
                handles: HashMap::new(),
                next_fd: 0,
            }),
        }
    }

    #[must_use]
    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    /// Open endpoint `minor` with open(2) access flags.
    ///
    /// # Errors
    /// `InvalidArgument` for bad access bits, otherwise as [`Devices::open`].
    pub fn open(&self, minor: usize, flags: c_int) -> Result<c_int> {
        let mode = AccessMode::from_flags(flags)?;
        self.open_mode(minor, mode)
    }

    /// # Errors
    /// `DescriptorsExhausted` once the fd counter has run out, otherwise as
    /// [`Devices::open`].
    pub fn open_mode(&self, minor: usize, mode: AccessMode) -> Result<c_int> {
        let mut table = self.table.lock();
        let fd = table.next_fd;
        let next_fd = fd.checked_add(1).ok_or_else(|| {
            warn!(minor, "descriptor table exhausted");
            DeviceError::DescriptorsExhausted
        })?;
        let handle = self.devices.open(minor, mode)?;
        table.next_fd = next_fd;
        debug!(fd, minor, handle = handle.id().id(), "descriptor allocated");
        table.handles.insert(fd, Arc::new(Mutex::new(Some(handle))));
        Ok(fd)
    }

    /// # Errors
    /// `BadDescriptor` for an unknown fd, otherwise as [`Devices::read`].
    pub fn read(&self, fd: c_int, buf: &mut [u8]) -> Result<usize> {
        let max_bytes = buf.len();
        self.with_handle(fd, |devices, handle| devices.read(handle, buf, max_bytes))
    }

    /// # Errors
    /// `BadDescriptor` for an unknown fd, otherwise as [`Devices::write`].
    pub fn write(&self, fd: c_int, buf: &[u8]) -> Result<usize> {
        self.with_handle(fd, |devices, handle| devices.write(handle, buf))
    }

    /// Reposition `fd`; `whence` is one of `SEEK_SET`, `SEEK_CUR`, `SEEK_END`.
    ///
    /// # Errors
    /// `BadDescriptor` for an unknown fd, `InvalidArgument` for a bad
    /// `whence` or an out-of-range target.
    pub fn lseek(&self, fd: c_int, offset: i64, whence: c_int) -> Result<i64> {
        self.with_handle(fd, |devices, handle| {
            let whence = Whence::try_from(whence)?;
            devices.seek(handle, offset, whence)
        })
    }

    /// Current cursor of `fd`
    ///
    /// # Errors
    /// `BadDescriptor` for an unknown fd.
    pub fn tell(&self, fd: c_int) -> Result<i64> {
        self.with_handle(fd, |_, handle| Ok(handle.position()))
    }

    /// # Errors
    /// `BadDescriptor` for an unknown or already closed fd.
    pub fn close(&self, fd: c_int) -> Result<()> {
        let slot = self
            .table
            .lock()
            .handles
            .remove(&fd)
            .ok_or(DeviceError::BadDescriptor(fd))?;
        // Waits for a call in flight on the same fd
        let handle = slot.lock().take().ok_or(DeviceError::BadDescriptor(fd))?;
        self.devices.close(handle);
        Ok(())
    }

    /// Number of open descriptors
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.table.lock().handles.len()
    }

    fn slot(&self, fd: c_int) -> Result<Slot> {
        self.table
            .lock()
            .handles
            .get(&fd)
            .cloned()
            .ok_or(DeviceError::BadDescriptor(fd))
    }

    fn with_handle<T>(
        &self,
        fd: c_int,
        op: impl FnOnce(&Devices, &mut Handle) -> Result<T>,
    ) -> Result<T> {
        let slot = self.slot(fd)?;
        let mut guard = slot.lock();
        // A close that won the race leaves the slot empty
        let handle = guard.as_mut().ok_or(DeviceError::BadDescriptor(fd))?;
        op(&self.devices, handle)
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new(Devices::default())
    }
}
