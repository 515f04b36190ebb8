//! Session-relative path resolution.
//!
//! Inputs pass through three steps: `~` expansion, joining against the
//! session working directory when relative, and (for operations that need
//! an existing target) symlink-resolving canonicalization.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use conch_types::{ConsoleError, Result};

/// Expand a leading `~` to the user's home directory.
///
/// `~` alone and `~/sub/path` are expanded; anything else is returned
/// unchanged. If the home directory cannot be determined the input is
/// returned unchanged.
pub(crate) fn expand_tilde(input: &str) -> PathBuf {
    if let Some(suffix) = input.strip_prefix('~')
        && (suffix.is_empty() || suffix.starts_with('/'))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(suffix.trim_start_matches('/'));
    }
    PathBuf::from(input)
}

/// Resolve `input` against `cwd`: tilde expansion, then join when relative.
pub(crate) fn resolve(cwd: &Path, input: &str) -> PathBuf {
    let expanded = expand_tilde(input);
    if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    }
}

/// Canonicalize an existing path, mapping the not-found and access-denied
/// cases into the console error taxonomy.
pub(crate) fn canonicalize(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConsoleError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => {
            ConsoleError::PermissionDenied(format!("{}: {e}", path.display()))
        },
        _ => ConsoleError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_with_path() {
        let result = expand_tilde("~/Documents/test.txt");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("Documents/test.txt"));
        }
    }

    #[test]
    fn expand_tilde_alone() {
        let result = expand_tilde("~");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home);
        }
    }

    #[test]
    fn expand_tilde_absolute_path_unchanged() {
        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_tilde_relative_path_unchanged() {
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn expand_tilde_mid_name_unchanged() {
        // A tilde that is part of a filename, not a home prefix.
        assert_eq!(expand_tilde("~backup"), PathBuf::from("~backup"));
    }

    #[test]
    fn resolve_relative_joins_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(resolve(cwd, "src/main.rs"), PathBuf::from("/work/src/main.rs"));
    }

    #[test]
    fn resolve_absolute_ignores_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(resolve(cwd, "/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn canonicalize_missing_is_not_found() {
        let err = canonicalize(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ConsoleError::NotFound(_)));
    }

    #[test]
    fn canonicalize_collapses_dot_components() {
        let dir = tempfile::tempdir().unwrap();
        let canon = fs::canonicalize(dir.path()).unwrap();
        let dotted = dir.path().join(".");
        assert_eq!(canonicalize(&dotted).unwrap(), canon);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn resolve_is_absolute_for_absolute_cwd(input in "[a-z0-9_./]{0,40}") {
                let resolved = resolve(Path::new("/base"), &input);
                prop_assert!(resolved.is_absolute());
            }

            #[test]
            fn resolve_of_absolute_input_is_identity(input in "/[a-z0-9_/]{0,40}") {
                let resolved = resolve(Path::new("/base"), &input);
                prop_assert_eq!(resolved, PathBuf::from(&input));
            }
        }
    }
}
