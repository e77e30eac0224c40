//! Access controller: decides which mode an open is granted

use std::os::raw::c_int;

use crate::endpoint::{Endpoint, Policy};
use crate::error::{DeviceError, Result};

pub const O_RDONLY: c_int = 0;
pub const O_WRONLY: c_int = 1;
pub const O_RDWR: c_int = 2;
pub const O_ACCMODE: c_int = 3;

/// Mode requested by a caller and granted to a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    /// Decode the access bits of open(2) flags.
    ///
    /// # Errors
    /// `InvalidArgument` when the access bits are `O_ACCMODE`.
    pub fn from_flags(flags: c_int) -> Result<Self> {
        match flags & O_ACCMODE {
            O_RDONLY => Ok(Self::Read),
            O_WRONLY => Ok(Self::Write),
            O_RDWR => Ok(Self::ReadWrite),
            other => Err(DeviceError::InvalidArgument(format!(
                "access mode bits {other:#x}"
            ))),
        }
    }

    #[must_use]
    pub fn can_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    #[must_use]
    pub fn can_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Compare the requested mode against the policy of `endpoint`.
///
/// Read-only and write-only endpoints grant only the exact matching
/// request; asking a write-only endpoint for `ReadWrite` is denied even
/// though it includes write access. A read-write endpoint grants whatever
/// was requested.
///
/// # Errors
/// `PermissionDenied` when the request does not match the policy.
pub fn check_open(endpoint: &Endpoint, requested: AccessMode) -> Result<AccessMode> {
    let policy = endpoint.policy();
    match (policy, requested) {
        (Policy::ReadOnly, AccessMode::Read)
        | (Policy::WriteOnly, AccessMode::Write)
        | (Policy::ReadWrite, _) => Ok(requested),
        _ => Err(DeviceError::PermissionDenied {
            minor: endpoint.minor(),
            policy,
            requested,
        }),
    }
}
