//! Console-service command engine for conch.
//!
//! The [`ConsoleService`] trait is the capability set of the shell:
//! filesystem navigation and inspection, transfer, archiving, and text
//! search. [`HostConsole`] is the single production implementation, backed
//! by the host filesystem.
//!
//! Every operation resolves relative inputs against a session working
//! directory owned by the service itself, never against ambient OS process
//! state, so independent sessions cannot interfere with each other.

mod archive;
mod host;
mod path;
mod search;

use std::fmt;
use std::path::{Path, PathBuf};

use conch_types::{DisplayMode, ReadMode, Result};

pub use host::HostConsole;

/// File content returned by [`ConsoleService::cat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 decoded text.
    Text(String),
    /// Raw bytes, unmodified.
    Bytes(Vec<u8>),
}

/// A single grep hit: file, 1-based line number, trimmed line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
}

impl fmt::Display for SearchMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.text)
    }
}

/// The console capability set.
///
/// One production implementation exists ([`HostConsole`]); the trait keeps
/// the command layer substitutable for testing. Only `cd` mutates session
/// state. Relative paths in every operation resolve against [`cwd`].
///
/// [`cwd`]: ConsoleService::cwd
pub trait ConsoleService {
    /// List the direct children of a directory, directories before files,
    /// case-insensitive name order within each group. Each returned line
    /// ends with a newline.
    fn ls(&self, path: &str, mode: DisplayMode) -> Result<Vec<String>>;

    /// Read a file as UTF-8 text or raw bytes.
    fn cat(&self, path: &str, mode: ReadMode) -> Result<FileContent>;

    /// Change the session working directory. Accepts absolute and relative
    /// paths, `.`, `..`, and `~` shorthand. Returns the canonical target.
    fn cd(&mut self, path: &str) -> Result<PathBuf>;

    /// Copy a file, or a directory tree when `recursive` is set.
    fn cp(&self, src: &str, dst: &str, recursive: bool) -> Result<()>;

    /// Move or rename a file or directory.
    fn mv(&self, src: &str, dst: &str) -> Result<()>;

    /// Remove a file, or a directory subtree when `recursive` is set.
    fn rm(&self, path: &str, recursive: bool) -> Result<()>;

    /// Pack a directory tree into a deflate-compressed zip archive.
    fn zip(&self, source_dir: &str, archive: &str) -> Result<()>;

    /// Extract a zip archive into `dest` (the working directory if `None`).
    fn unzip(&self, archive: &str, dest: Option<&str>) -> Result<()>;

    /// Pack a directory tree into a gzip-compressed tar archive, nested
    /// under the source directory's base name.
    fn tar(&self, source_dir: &str, archive: &str) -> Result<()>;

    /// Extract a gzip-compressed tar archive into `dest` (the working
    /// directory if `None`).
    fn untar(&self, archive: &str, dest: Option<&str>) -> Result<()>;

    /// Search file contents line by line with a regular expression.
    fn grep(
        &self,
        pattern: &str,
        path: &str,
        recursive: bool,
        ignore_case: bool,
    ) -> Result<Vec<SearchMatch>>;

    /// The session working directory.
    fn cwd(&self) -> &Path;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_match_display() {
        let m = SearchMatch {
            path: PathBuf::from("/tmp/a/x.txt"),
            line: 1,
            text: "hello".to_string(),
        };
        assert_eq!(format!("{m}"), "/tmp/a/x.txt:1:hello");
    }
}
