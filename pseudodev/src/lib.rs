pub mod access;
pub mod config;
pub mod device;
pub mod endpoint;
pub mod error;
pub mod fdtable;
pub mod handle;
pub mod registry;
pub mod transfer;
pub mod uaccess;

// Re-export the dispatch surface for convenience
pub use device::{Devices, EndpointStat};
pub use fdtable::FdTable;

// Re-export endpoint and registry types for convenience
pub use endpoint::{Endpoint, EndpointReadGuard, Policy};
pub use registry::Registry;

// Re-export configuration types
pub use config::{ConfigError, DeviceConfig, EndpointConfig};

// Re-export session types
pub use access::{check_open, AccessMode};
pub use handle::{Handle, HandleId, IdGen};
pub use transfer::Whence;

// Re-export errors and transfer primitives
pub use error::{DeviceError, TransferFault};
pub use uaccess::{CopyFromUser, CopyToUser};
