//! Error type shared by every device operation
//!
//! Every failure is terminal for the call that produced it and leaves the
//! endpoint and the handle untouched.

use std::os::raw::c_int;

use crate::access::AccessMode;
use crate::endpoint::Policy;

pub const EBADF: c_int = 9;
pub const EACCES: c_int = 13;
pub const EFAULT: c_int = 14;
pub const ENODEV: c_int = 19;
pub const EINVAL: c_int = 22;
pub const EMFILE: c_int = 24;
pub const ENOSPC: c_int = 28;

/// The caller-side copy could not be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bad address in caller buffer")]
pub struct TransferFault;

/// Errors returned by open/read/write/seek/close
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("no such endpoint: minor {0}")]
    NoSuchEndpoint(usize),

    #[error("permission denied: {requested:?} requested on {policy:?} endpoint pcd{minor}")]
    PermissionDenied {
        minor: usize,
        policy: Policy,
        requested: AccessMode,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no space left on pcd{minor}: position {position}, capacity {capacity}")]
    OutOfSpace {
        minor: usize,
        position: i64,
        capacity: usize,
    },

    #[error("bad address in caller buffer")]
    TransferFault,

    #[error("bad file descriptor: {0}")]
    BadDescriptor(c_int),

    #[error("handle opened for {granted:?} does not allow this operation")]
    WrongMode { granted: AccessMode },

    #[error("handle on pcd{minor} was issued by another device set")]
    ForeignHandle { minor: usize },

    #[error("descriptor table exhausted")]
    DescriptorsExhausted,
}

impl DeviceError {
    /// POSIX errno matching the failure
    #[must_use]
    pub fn errno(&self) -> c_int {
        match self {
            Self::NoSuchEndpoint(_) => ENODEV,
            Self::PermissionDenied { .. } => EACCES,
            Self::InvalidArgument(_) => EINVAL,
            Self::OutOfSpace { .. } => ENOSPC,
            Self::TransferFault => EFAULT,
            Self::BadDescriptor(_) | Self::WrongMode { .. } | Self::ForeignHandle { .. } => {
                EBADF
            }
            Self::DescriptorsExhausted => EMFILE,
        }
    }
}

impl From<TransferFault> for DeviceError {
    fn from(_: TransferFault) -> Self {
        Self::TransferFault
    }
}

impl embedded_io::Error for DeviceError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NoSuchEndpoint(_) => embedded_io::ErrorKind::NotFound,
            Self::PermissionDenied { .. } => embedded_io::ErrorKind::PermissionDenied,
            Self::InvalidArgument(_)
            | Self::BadDescriptor(_)
            | Self::WrongMode { .. }
            | Self::ForeignHandle { .. } => embedded_io::ErrorKind::InvalidInput,
            Self::OutOfSpace { .. } | Self::DescriptorsExhausted => {
                embedded_io::ErrorKind::OutOfMemory
            }
            Self::TransferFault => embedded_io::ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
