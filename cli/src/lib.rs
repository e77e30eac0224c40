//! Write a message to a pseudo device and read it back

use std::sync::Arc;

use embedded_io::{Read, Write};
use pseudodev::access::{O_RDONLY, O_WRONLY};
use pseudodev::{ConfigError, DeviceConfig, FdTable};
use pseudodev_io::DeviceFile;
use tracing::info;

/// Largest read-back, matching the exerciser's stack buffer
pub const READ_BACK_SIZE: usize = 128;

/// Step of the exercise that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    OpenWrite,
    Write,
    OpenRead,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExerciseError {
    pub step: Step,
    pub kind: embedded_io::ErrorKind,
}

impl std::fmt::Display for ExerciseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self.step {
            Step::OpenWrite => "open for writing",
            Step::Write => "write",
            Step::OpenRead => "open for reading",
            Step::Read => "read",
        };
        write!(
            f,
            "{step}: {}",
            pseudodev_io::error_kind_to_str(self.kind)
        )
    }
}

impl std::error::Error for ExerciseError {}

/// Load the endpoint layout, falling back to the built-in one.
///
/// # Errors
/// Returns an error if the JSON is invalid or declares no endpoints.
pub fn load_config(json: Option<&str>) -> Result<DeviceConfig, ConfigError> {
    match json {
        Some(json) => DeviceConfig::from_json(json),
        None => Ok(DeviceConfig::default()),
    }
}

/// Write `message` to endpoint `minor`, then read back what it holds.
///
/// # Errors
/// Returns the step that failed and why.
pub fn exercise(
    table: &Arc<FdTable>,
    minor: usize,
    message: &[u8],
) -> Result<Vec<u8>, ExerciseError> {
    let fail = |step| move |kind| ExerciseError { step, kind };

    let mut writer =
        DeviceFile::open(Arc::clone(table), minor, O_WRONLY).map_err(fail(Step::OpenWrite))?;
    writer.write_all(message).map_err(fail(Step::Write))?;
    writer.close().map_err(fail(Step::Write))?;
    info!(minor, bytes = message.len(), "wrote message");

    let mut reader =
        DeviceFile::open(Arc::clone(table), minor, O_RDONLY).map_err(fail(Step::OpenRead))?;
    let mut buf = [0u8; READ_BACK_SIZE];
    let n = reader.read(&mut buf).map_err(fail(Step::Read))?;
    reader.close().map_err(fail(Step::Read))?;
    info!(minor, bytes = n, "read message back");

    Ok(buf[..n].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pseudodev::Devices;

    fn table(config: &DeviceConfig) -> Arc<FdTable> {
        Arc::new(FdTable::new(Devices::new(config)))
    }

    #[test]
    fn test_round_trip_on_read_write_endpoint() {
        let table = table(&DeviceConfig::default());
        let data = exercise(&table, 2, b"hello world").unwrap();
        assert_eq!(data, b"hello world");
        assert_eq!(table.open_count(), 0);
    }

    #[test]
    fn test_single_device_variant() {
        let table = table(&DeviceConfig::single(512));
        assert_eq!(exercise(&table, 0, b"hello world").unwrap(), b"hello world");
    }

    #[test]
    fn test_write_only_endpoint_cannot_be_read_back() {
        let table = table(&DeviceConfig::default());
        let err = exercise(&table, 1, b"hello").unwrap_err();
        assert_eq!(err.step, Step::OpenRead);
        assert_eq!(err.kind, embedded_io::ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "open for reading: permission denied");
    }

    #[test]
    fn test_read_only_endpoint_refuses_writer() {
        let table = table(&DeviceConfig::default());
        let err = exercise(&table, 0, b"hello").unwrap_err();
        assert_eq!(err.step, Step::OpenWrite);
    }

    #[test]
    fn test_long_message_is_cut_to_capacity() {
        let table = table(&DeviceConfig::default());
        let err = exercise(&table, 3, &[b'x'; 200]).unwrap_err();
        assert_eq!(err.step, Step::Write);
        assert_eq!(err.kind, embedded_io::ErrorKind::OutOfMemory);
    }

    #[test]
    fn test_load_config() {
        assert_eq!(load_config(None).unwrap(), DeviceConfig::default());
        let config =
            load_config(Some(r#"{"endpoints":[{"capacity":8,"policy":"read_only"}]}"#)).unwrap();
        assert_eq!(config.endpoints.len(), 1);
        assert!(load_config(Some("{}")).is_err());
    }
}
