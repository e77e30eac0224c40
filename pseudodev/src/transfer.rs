//! Transfer engine: seek, read and write against one endpoint
//!
//! This is the only code that touches endpoint buffers. Positions are kept
//! within `[0, capacity]` and every buffer access stays within
//! `[0, capacity)`. Reads never return bytes past the high-water mark.
//!
//! Read and write hold the endpoint lock for the whole call, so concurrent
//! handles on one endpoint are serialised call by call. Seek only looks at
//! the capacity, which never changes, and takes no lock.

use std::os::raw::c_int;

use tracing::{debug, trace, warn};

use crate::endpoint::Endpoint;
use crate::error::{DeviceError, Result};
use crate::handle::Handle;
use crate::uaccess::{CopyFromUser, CopyToUser};

pub const SEEK_SET: c_int = 0;
pub const SEEK_CUR: c_int = 1;
pub const SEEK_END: c_int = 2;

/// Origin of a seek offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

impl TryFrom<c_int> for Whence {
    type Error = DeviceError;

    fn try_from(whence: c_int) -> Result<Self> {
        match whence {
            SEEK_SET => Ok(Self::Start),
            SEEK_CUR => Ok(Self::Current),
            SEEK_END => Ok(Self::End),
            other => {
                warn!(whence = other, "invalid whence");
                Err(DeviceError::InvalidArgument(format!("whence {other}")))
            }
        }
    }
}

fn capacity_of(endpoint: &Endpoint) -> i64 {
    i64::try_from(endpoint.capacity()).unwrap_or(i64::MAX)
}

/// Handle position as a buffer index
fn position_of(handle: &Handle) -> Result<usize> {
    usize::try_from(handle.position)
        .map_err(|_| DeviceError::InvalidArgument(format!("position {}", handle.position)))
}

/// Move the handle cursor.
///
/// The target may lie anywhere in `[0, capacity]`, including space that
/// was never written.
pub(crate) fn seek(
    endpoint: &Endpoint,
    handle: &mut Handle,
    offset: i64,
    whence: Whence,
) -> Result<i64> {
    let capacity = capacity_of(endpoint);
    let base = match whence {
        Whence::Start => 0,
        Whence::Current => handle.position,
        Whence::End => capacity,
    };

    let candidate = base
        .checked_add(offset)
        .filter(|pos| (0..=capacity).contains(pos));
    let Some(new_pos) = candidate else {
        warn!(
            minor = endpoint.minor(),
            ?whence,
            offset,
            capacity,
            "invalid file position"
        );
        return Err(DeviceError::InvalidArgument(format!(
            "seek {offset} from {whence:?} outside 0..={capacity}"
        )));
    };

    handle.position = new_pos;
    trace!(minor = endpoint.minor(), pos = new_pos, "new file position");
    Ok(new_pos)
}

/// Copy up to `max_bytes` from the cursor into `dest`.
///
/// Returns 0 when nothing was ever written, when the cursor is at the end
/// of the endpoint, or when the cursor sits at or beyond the high-water
/// mark. On a fault nothing is transferred and the cursor stays put.
pub(crate) fn read<D: CopyToUser + ?Sized>(
    endpoint: &Endpoint,
    handle: &mut Handle,
    dest: &mut D,
    max_bytes: usize,
) -> Result<usize> {
    debug!(
        minor = endpoint.minor(),
        count = max_bytes,
        pos = handle.position,
        "read requested"
    );

    let state = endpoint.lock_mut();
    if state.high_water_mark == 0 {
        return Ok(0);
    }
    let pos = position_of(handle)?;
    if pos >= endpoint.capacity() {
        return Ok(0);
    }

    // The cursor may sit past the mark after a seek
    let available = state.high_water_mark.saturating_sub(pos);
    let count = max_bytes.min(available);
    if count == 0 {
        return Ok(0);
    }

    // pos < capacity and count <= high_water_mark - pos <= capacity - pos
    #[allow(clippy::indexing_slicing)]
    let src = &state.buffer[pos..pos + count];
    if let Err(fault) = dest.copy_to_user(src) {
        warn!(minor = endpoint.minor(), count, "failed to copy data to caller");
        return Err(fault.into());
    }
    drop(state);

    #[allow(clippy::cast_possible_wrap)]
    {
        handle.position += count as i64;
    }
    debug!(
        minor = endpoint.minor(),
        count,
        pos = handle.position,
        "bytes read"
    );
    Ok(count)
}

/// Copy the bytes offered by `src` to the cursor.
///
/// Accepts at most `capacity - position` bytes; a shorter count is a
/// partial write, not an error. On success the high-water mark becomes the
/// new cursor position, even when that lowers it.
pub(crate) fn write<S: CopyFromUser + ?Sized>(
    endpoint: &Endpoint,
    handle: &mut Handle,
    src: &S,
) -> Result<usize> {
    let requested = src.len();
    debug!(
        minor = endpoint.minor(),
        count = requested,
        pos = handle.position,
        "write requested"
    );

    let mut state = endpoint.lock_mut();
    let pos = position_of(handle)?;
    let capacity = endpoint.capacity();
    if pos >= capacity {
        warn!(
            minor = endpoint.minor(),
            pos, capacity, "no space left on device"
        );
        return Err(DeviceError::OutOfSpace {
            minor: endpoint.minor(),
            position: handle.position,
            capacity,
        });
    }

    let count = requested.min(capacity - pos);
    if count < requested {
        warn!(
            minor = endpoint.minor(),
            requested,
            available = count,
            "partial write"
        );
    }

    // Stage first so a faulting source commits nothing
    let mut staging = vec![0u8; count];
    if let Err(fault) = src.copy_from_user(&mut staging) {
        warn!(minor = endpoint.minor(), count, "failed to copy data from caller");
        return Err(fault.into());
    }

    let end = pos + count;
    #[allow(clippy::indexing_slicing)]
    state.buffer[pos..end].copy_from_slice(&staging);
    state.high_water_mark = end;
    drop(state);

    #[allow(clippy::cast_possible_wrap)]
    {
        handle.position = end as i64;
    }
    debug!(
        minor = endpoint.minor(),
        count,
        pos = handle.position,
        "bytes written"
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessMode;
    use crate::endpoint::Policy;
    use crate::handle::HandleId;

    fn setup(capacity: usize) -> (Endpoint, Handle) {
        let endpoint = Endpoint::new(0, capacity, Policy::ReadWrite);
        let handle = Handle::new(HandleId::new(1), 0, 0, AccessMode::ReadWrite);
        (endpoint, handle)
    }

    #[test]
    fn test_whence_from_raw() {
        assert_eq!(Whence::try_from(SEEK_SET).unwrap(), Whence::Start);
        assert_eq!(Whence::try_from(SEEK_CUR).unwrap(), Whence::Current);
        assert_eq!(Whence::try_from(SEEK_END).unwrap(), Whence::End);
        assert!(matches!(
            Whence::try_from(3),
            Err(DeviceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_seek_each_origin() {
        let (endpoint, mut handle) = setup(100);
        assert_eq!(seek(&endpoint, &mut handle, 40, Whence::Start).unwrap(), 40);
        assert_eq!(seek(&endpoint, &mut handle, -10, Whence::Current).unwrap(), 30);
        assert_eq!(seek(&endpoint, &mut handle, -1, Whence::End).unwrap(), 99);
        assert_eq!(seek(&endpoint, &mut handle, 0, Whence::End).unwrap(), 100);
    }

    #[test]
    fn test_seek_rejects_out_of_range_and_keeps_position() {
        let (endpoint, mut handle) = setup(100);
        seek(&endpoint, &mut handle, 10, Whence::Start).unwrap();

        assert!(seek(&endpoint, &mut handle, -11, Whence::Current).is_err());
        assert!(seek(&endpoint, &mut handle, 1, Whence::End).is_err());
        assert!(seek(&endpoint, &mut handle, i64::MAX, Whence::Current).is_err());
        assert_eq!(handle.position(), 10);
    }

    #[test]
    fn test_empty_write_moves_mark_to_cursor() {
        let (endpoint, mut handle) = setup(16);
        write(&endpoint, &mut handle, b"abcdef".as_slice()).unwrap();
        seek(&endpoint, &mut handle, 2, Whence::Start).unwrap();

        assert_eq!(write(&endpoint, &mut handle, b"".as_slice()).unwrap(), 0);
        assert_eq!(endpoint.high_water_mark(), 2);
        assert_eq!(handle.position(), 2);
    }

    #[test]
    fn test_zero_capacity_endpoint() {
        let (endpoint, mut handle) = setup(0);
        let mut buf = [0u8; 4];
        assert_eq!(read(&endpoint, &mut handle, &mut buf[..], 4).unwrap(), 0);
        assert!(matches!(
            write(&endpoint, &mut handle, b"x".as_slice()),
            Err(DeviceError::OutOfSpace { .. })
        ));
        assert_eq!(seek(&endpoint, &mut handle, 0, Whence::End).unwrap(), 0);
        assert!(seek(&endpoint, &mut handle, 1, Whence::Start).is_err());
    }

    #[test]
    fn test_read_honours_max_bytes() {
        let (endpoint, mut handle) = setup(32);
        write(&endpoint, &mut handle, "hello world").unwrap();
        seek(&endpoint, &mut handle, 0, Whence::Start).unwrap();

        let mut out = Vec::new();
        assert_eq!(read(&endpoint, &mut handle, &mut out, 5).unwrap(), 5);
        assert_eq!(read(&endpoint, &mut handle, &mut out, 100).unwrap(), 6);
        assert_eq!(read(&endpoint, &mut handle, &mut out, 100).unwrap(), 0);
        assert_eq!(out, b"hello world");
    }
}
