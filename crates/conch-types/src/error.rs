//! Error types for conch console operations.

use std::io;
use std::path::PathBuf;

/// Errors produced by console operations.
///
/// Validation failures carry the offending path so callers can render a
/// precise one-line message. OS-level failures pass through unchanged in
/// the `Io` variant; archive decoding failures in `Zip`.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("destination exists and is not a directory: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let e = ConsoleError::NotFound(PathBuf::from("/tmp/ghost"));
        assert_eq!(format!("{e}"), "no such file or directory: /tmp/ghost");
    }

    #[test]
    fn not_a_directory_display() {
        let e = ConsoleError::NotADirectory(PathBuf::from("/etc/hosts"));
        assert_eq!(format!("{e}"), "not a directory: /etc/hosts");
    }

    #[test]
    fn is_a_directory_display() {
        let e = ConsoleError::IsADirectory(PathBuf::from("/var"));
        assert_eq!(format!("{e}"), "is a directory: /var");
    }

    #[test]
    fn already_exists_display() {
        let e = ConsoleError::AlreadyExists(PathBuf::from("/tmp/out"));
        assert_eq!(
            format!("{e}"),
            "destination exists and is not a directory: /tmp/out"
        );
    }

    #[test]
    fn permission_denied_display() {
        let e = ConsoleError::PermissionDenied("refusing to remove '..'".into());
        assert_eq!(format!("{e}"), "permission denied: refusing to remove '..'");
    }

    #[test]
    fn invalid_pattern_from_conversion() {
        let regex_err = regex::Regex::new("[unclosed").unwrap_err();
        let e: ConsoleError = regex_err.into();
        assert!(format!("{e}").starts_with("invalid pattern:"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::other("disk on fire");
        let e: ConsoleError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("disk on fire"));
    }

    #[test]
    fn error_is_debug() {
        let e = ConsoleError::NotFound(PathBuf::from("x"));
        assert!(format!("{e:?}").contains("NotFound"));
    }

    #[test]
    fn result_alias_ok() {
        let r: Result<i32> = Ok(42);
        assert_eq!(r.unwrap(), 42);
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(ConsoleError::PermissionDenied("nope".into()));
        assert!(r.is_err());
    }
}
