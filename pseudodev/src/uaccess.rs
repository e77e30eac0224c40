//! Caller-side transfer primitives
//!
//! The transfer engine never touches caller memory directly. Reads hand the
//! bytes to a [`CopyToUser`] destination and writes pull them from a
//! [`CopyFromUser`] source; either side may refuse with [`TransferFault`].
//! Both copies are all-or-nothing: a failed copy leaves the destination
//! exactly as it was.

use crate::error::TransferFault;

/// Destination of a read
pub trait CopyToUser {
    /// Copy all of `src` to the caller.
    ///
    /// # Errors
    /// `TransferFault` if the destination cannot take `src.len()` bytes.
    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), TransferFault>;
}

/// Source of a write
pub trait CopyFromUser {
    /// Number of bytes the caller offers
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the first `dst.len()` offered bytes into `dst`.
    ///
    /// # Errors
    /// `TransferFault` if the source cannot be read.
    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), TransferFault>;
}

impl CopyToUser for [u8] {
    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), TransferFault> {
        let dst = self.get_mut(..src.len()).ok_or(TransferFault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl CopyToUser for Vec<u8> {
    /// Appends, so a `Vec` never faults
    fn copy_to_user(&mut self, src: &[u8]) -> Result<(), TransferFault> {
        self.extend_from_slice(src);
        Ok(())
    }
}

impl CopyFromUser for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), TransferFault> {
        let src = self.get(..dst.len()).ok_or(TransferFault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl CopyFromUser for Vec<u8> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), TransferFault> {
        self.as_slice().copy_from_user(dst)
    }
}

impl CopyFromUser for str {
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<(), TransferFault> {
        self.as_bytes().copy_from_user(dst)
    }
}
