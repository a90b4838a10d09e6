use thiserror::Error;

use crate::image::ImageVersion;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read image at address {address:#x}: {source}")]
    ReadFailed {
        address: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write image at address {address:#x} after {written} successful write(s): {source}")]
    WriteFailed {
        address: u64,
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to flush image after {written} write(s): {source}")]
    FlushFailed {
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image version: {0}")]
    UnsupportedVersion(ImageVersion),

    #[error("Unrecognized image (could not detect version)")]
    UnrecognizedImage,

    #[error("Invalid image: too many matches for '{group}' (limit {limit})")]
    TooManyMatches { group: String, limit: usize },

    #[error("Invalid image: no signatures found")]
    NoMatches,

    #[error("Invalid image: no matches for '{group}'")]
    MissingMatches { group: String },

    #[error("Patch state of '{group}' is ambiguous (partially installed or image is invalid)")]
    AmbiguousPatchState { group: String },

    #[error("Unrecognized bytes at patch site {address:#x}: {found:02X?}")]
    UnrecognizedPatchSite { address: u64, found: [u8; 4] },

    #[error("Unknown patch group: {0}")]
    UnknownGroup(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a read that ran past the end of the image
    pub fn is_short_read(&self) -> bool {
        matches!(
            self,
            Error::ReadFailed { source, .. } if source.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }

    /// Address of the failing read or write, if the error carries one
    pub fn failing_address(&self) -> Option<u64> {
        match self {
            Error::ReadFailed { address, .. }
            | Error::WriteFailed { address, .. }
            | Error::UnrecognizedPatchSite { address, .. } => Some(*address),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_short_read() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err = Error::ReadFailed {
            address: 0x7,
            source: eof,
        };
        assert!(err.is_short_read());

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err2 = Error::ReadFailed {
            address: 0x7,
            source: denied,
        };
        assert!(!err2.is_short_read());
    }

    #[test]
    fn test_error_failing_address() {
        let err = Error::WriteFailed {
            address: 0x102044,
            written: 1,
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(err.failing_address(), Some(0x102044));
        assert_eq!(Error::NoMatches.failing_address(), None);
    }

    #[test]
    fn test_write_failed_message_contains_hex_address() {
        let err = Error::WriteFailed {
            address: 0x304050,
            written: 0,
            source: std::io::Error::other("disk full"),
        };
        let message = err.to_string();
        assert!(message.contains("0x304050"));
        assert!(message.contains("disk full"));
    }
}
