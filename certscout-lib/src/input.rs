//! Guarded reads of certificate files and configuration directories.

use std::fs;
use std::io;
use std::path::Path;

/// Maximum input size to prevent memory exhaustion (10 MiB).
pub const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

pub const CERTIFICATE_FILE: &str = "Certificate file";
pub const CA_CERTIFICATE_FILE: &str = "CA certificate file";
pub const CONFIGURATION_FILE: &str = "Configuration file";
pub const CONFIGURATION_DIRECTORY: &str = "Configuration directory";

/// Why an input path could not be used. The payload names the kind of input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("{0} is not specified")]
    NotSpecified(&'static str),

    #[error("{0} does not exist")]
    NotFound(&'static str),

    #[error("{0} is not readable")]
    NotReadable(&'static str),

    #[error("{0} is not valid")]
    Empty(&'static str),

    #[error("{what} is too large ({size} bytes, max {max} bytes)")]
    TooLarge {
        what: &'static str,
        size: u64,
        max: u64,
    },
}

impl PathError {
    pub(crate) fn from_io(err: &io::Error, what: &'static str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PathError::NotFound(what),
            _ => PathError::NotReadable(what),
        }
    }
}

/// Read a whole input file, rejecting missing, unreadable, oversized and
/// whitespace-only files.
pub fn read_file(path: &Path, what: &'static str) -> Result<Vec<u8>, PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::NotSpecified(what));
    }
    let meta = fs::metadata(path).map_err(|e| PathError::from_io(&e, what))?;
    if !meta.is_file() {
        return Err(PathError::NotFound(what));
    }
    if meta.len() > MAX_INPUT_BYTES {
        return Err(PathError::TooLarge {
            what,
            size: meta.len(),
            max: MAX_INPUT_BYTES,
        });
    }
    let data = fs::read(path).map_err(|e| PathError::from_io(&e, what))?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(PathError::Empty(what));
    }
    Ok(data)
}

/// Confirm `path` names an existing directory whose entries can be listed.
pub fn check_directory(path: &Path, what: &'static str) -> Result<(), PathError> {
    if path.as_os_str().is_empty() {
        return Err(PathError::NotSpecified(what));
    }
    if !path.is_dir() {
        return Err(PathError::NotFound(what));
    }
    fs::read_dir(path).map_err(|e| PathError::from_io(&e, what))?;
    Ok(())
}
