//! File system abstraction port.

use std::future::Future;
use std::path::{Path, PathBuf};

/// Error type for file system operations.
#[derive(Debug, thiserror::Error)]
pub enum FileSystemError {
    /// File not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FileSystemError> for std::io::Error {
    fn from(error: FileSystemError) -> Self {
        match error {
            FileSystemError::Io(io_err) => io_err,
            FileSystemError::NotFound(path) => {
                Self::new(std::io::ErrorKind::NotFound, path.display().to_string())
            }
            FileSystemError::PermissionDenied(path) => Self::new(
                std::io::ErrorKind::PermissionDenied,
                path.display().to_string(),
            ),
        }
    }
}

/// Abstraction over file system operations.
///
/// This trait allows mocking file system access in tests.
pub trait FileSystem: Send + Sync {
    /// Reads a file's contents as bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_file(&self, path: &Path)
    -> impl Future<Output = Result<Vec<u8>, FileSystemError>> + Send;

    /// Writes bytes to a file, creating it and its parents if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write_file(
        &self,
        path: &Path,
        contents: &[u8],
    ) -> impl Future<Output = Result<(), FileSystemError>> + Send;

    /// Creates a directory and all parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path)
    -> impl Future<Output = Result<(), FileSystemError>> + Send;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;

    /// Checks if a path is a directory.
    fn is_dir(&self, path: &Path) -> impl Future<Output = bool> + Send;

    /// Lists entries in a directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn read_dir(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Vec<PathBuf>, FileSystemError>> + Send;

    /// Removes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> impl Future<Output = Result<(), FileSystemError>> + Send;

    /// Removes a directory and everything below it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    fn remove_dir_all(&self, path: &Path)
    -> impl Future<Output = Result<(), FileSystemError>> + Send;

    /// Renames/moves a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be renamed.
    fn rename(
        &self,
        from: &Path,
        to: &Path,
    ) -> impl Future<Output = Result<(), FileSystemError>> + Send;
}
