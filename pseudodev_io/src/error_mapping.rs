//! Error mapping utilities for converting between error types.
//!
//! This module provides functions to convert errno values reported by the
//! devices to `embedded_io::ErrorKind` and to convert error kinds to
//! human-readable static strings.

use core::ffi::c_int;

/// Convert errno to `embedded_io::ErrorKind`
#[must_use]
#[allow(clippy::match_same_arms)] // We explicitly list common errno values for documentation
pub fn errno_to_error_kind(errno: c_int) -> embedded_io::ErrorKind {
    match errno {
        1 | 13 => embedded_io::ErrorKind::PermissionDenied, // EPERM, EACCES
        2 | 19 => embedded_io::ErrorKind::NotFound,         // ENOENT, ENODEV
        9 | 22 => embedded_io::ErrorKind::InvalidInput,     // EBADF, EINVAL
        12 | 28 => embedded_io::ErrorKind::OutOfMemory,     // ENOMEM, ENOSPC (no space left)
        23 | 24 => embedded_io::ErrorKind::OutOfMemory,     // ENFILE, EMFILE
        // EIO, EFAULT (bad caller buffer)
        5 | 14 => embedded_io::ErrorKind::Other,
        _ => embedded_io::ErrorKind::Other,
    }
}

/// Convert error kind to a static string description
#[must_use]
pub fn error_kind_to_str(kind: embedded_io::ErrorKind) -> &'static str {
    match kind {
        embedded_io::ErrorKind::NotFound => "no such device",
        embedded_io::ErrorKind::PermissionDenied => "permission denied",
        embedded_io::ErrorKind::InvalidInput => "invalid input",
        embedded_io::ErrorKind::OutOfMemory => "no space left on device",
        embedded_io::ErrorKind::Unsupported => "unsupported",
        embedded_io::ErrorKind::Other => "other error",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_errnos() {
        assert_eq!(
            errno_to_error_kind(pseudodev::error::ENODEV),
            embedded_io::ErrorKind::NotFound
        );
        assert_eq!(
            errno_to_error_kind(pseudodev::error::EACCES),
            embedded_io::ErrorKind::PermissionDenied
        );
        assert_eq!(
            errno_to_error_kind(pseudodev::error::ENOSPC),
            embedded_io::ErrorKind::OutOfMemory
        );
        assert_eq!(
            errno_to_error_kind(pseudodev::error::EFAULT),
            embedded_io::ErrorKind::Other
        );
        assert_eq!(
            errno_to_error_kind(pseudodev::error::EMFILE),
            embedded_io::ErrorKind::OutOfMemory
        );
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(
            error_kind_to_str(embedded_io::ErrorKind::OutOfMemory),
            "no space left on device"
        );
        assert_eq!(
            error_kind_to_str(embedded_io::ErrorKind::TimedOut),
            "unknown error"
        );
    }
}
