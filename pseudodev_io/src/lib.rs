pub mod device_file;
mod error_mapping;

pub use device_file::DeviceFile;
pub use error_mapping::{errno_to_error_kind, error_kind_to_str};
