//! An `embedded-io` file over a pseudo device.
//!
//! `DeviceFile` provides implementations of the [`embedded_io::Read`],
//! [`embedded_io::Write`] and [`embedded_io::Seek`] traits. It owns one
//! descriptor in an [`FdTable`] and releases it on drop. Once closed,
//! reads report end of file while writes and seeks fail with
//! `InvalidInput`.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use embedded_io::{Read, Seek, SeekFrom, Write};
//! use pseudodev::access::O_RDWR;
//! use pseudodev::FdTable;
//! use pseudodev_io::DeviceFile;
//!
//! let table = Arc::new(FdTable::default());
//! let mut file = DeviceFile::open(Arc::clone(&table), 2, O_RDWR).unwrap();
//! file.write_all(b"Hello, world!").unwrap();
//! file.seek(SeekFrom::Start(0)).unwrap();
//!
//! let mut buf = [0u8; 32];
//! let n = file.read(&mut buf).unwrap();
//! assert_eq!(&buf[..n], b"Hello, world!");
//! ```

use core::ffi::c_int;
use std::sync::Arc;

use embedded_io::SeekFrom;
use pseudodev::{DeviceError, FdTable};

use crate::error_mapping::errno_to_error_kind;

fn to_kind(err: &DeviceError) -> embedded_io::ErrorKind {
    errno_to_error_kind(err.errno())
}

pub struct DeviceFile {
    table: Arc<FdTable>,
    fd: Option<c_int>,
}

impl DeviceFile {
    /// Open endpoint `minor` with open(2) access flags.
    ///
    /// # Errors
    /// Returns an error if the endpoint does not exist or its policy does
    /// not grant the requested access.
    pub fn open(
        table: Arc<FdTable>,
        minor: usize,
        flags: c_int,
    ) -> Result<Self, embedded_io::ErrorKind> {
        let fd = table.open(minor, flags).map_err(|e| to_kind(&e))?;
        Ok(Self {
            table,
            fd: Some(fd),
        })
    }

    /// Descriptor of the open file, `None` once closed
    #[must_use]
    pub fn fd(&self) -> Option<c_int> {
        self.fd
    }

    /// Close the file.
    /// Can be called multiple times.
    /// "drop" will call "close" automatically.
    ///
    /// # Errors
    /// Returns an error if closing fails.
    pub fn close(&mut self) -> Result<(), embedded_io::ErrorKind> {
        if let Some(fd) = self.fd {
            self.table.close(fd).map_err(|e| to_kind(&e))?;
            self.fd = None;
        }
        Ok(())
    }
}

impl Drop for DeviceFile {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl embedded_io::ErrorType for DeviceFile {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for DeviceFile {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        let Some(fd) = self.fd else {
            return Ok(0);
        };
        self.table.read(fd, buf).map_err(|e| to_kind(&e))
    }
}

impl embedded_io::Write for DeviceFile {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        // Ok(0) for a non-empty buffer would make `write_all` panic
        let Some(fd) = self.fd else {
            return Err(embedded_io::ErrorKind::InvalidInput);
        };
        self.table.write(fd, buf).map_err(|e| to_kind(&e))
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Seek for DeviceFile {
    fn seek(&mut self, pos: SeekFrom) -> core::result::Result<u64, Self::Error> {
        let Some(fd) = self.fd else {
            return Err(embedded_io::ErrorKind::InvalidInput);
        };
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (
                i64::try_from(offset).map_err(|_| embedded_io::ErrorKind::InvalidInput)?,
                pseudodev::transfer::SEEK_SET,
            ),
            SeekFrom::Current(offset) => (offset, pseudodev::transfer::SEEK_CUR),
            SeekFrom::End(offset) => (offset, pseudodev::transfer::SEEK_END),
        };
        let new_pos = self
            .table
            .lseek(fd, offset, whence)
            .map_err(|e| to_kind(&e))?;
        #[allow(clippy::cast_sign_loss)]
        Ok(new_pos as u64)
    }
}

impl core::fmt::Debug for DeviceFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceFile").field("fd", &self.fd).finish()
    }
}
