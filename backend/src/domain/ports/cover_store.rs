//! Port for storing uploaded album covers.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while storing a cover image.
    pub enum CoverStoreError {
        /// The upload carried no usable file name.
        InvalidName { name: String } => "invalid cover file name: {name:?}",
        /// Writing the file failed.
        Io { message: String } => "cover storage failed: {message}",
    }
}

/// Persists uploaded cover files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoverStore: Send + Sync {
    /// Store `bytes` under a name derived from `file_name` and return the
    /// public reference saved on the album. Existing files are never
    /// overwritten; collisions receive a numeric suffix.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, CoverStoreError>;
}
