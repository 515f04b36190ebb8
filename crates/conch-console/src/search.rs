//! Regex line search over files and directory trees.

use std::fs;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use walkdir::WalkDir;

use conch_types::Result;

use crate::SearchMatch;

/// Compile a search pattern. Invalid patterns surface before any file is
/// touched.
pub(crate) fn compile(pattern: &str, ignore_case: bool) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()?)
}

/// Collect matches for a validated, existing target.
///
/// A file target is scanned directly; a directory target scans its direct
/// child files, or the whole subtree when `recursive` is set. Directories
/// are never scanned as files. Unreadable files are logged and skipped so
/// one bad file cannot abort the whole search.
pub(crate) fn search_path(re: &Regex, target: &Path, recursive: bool) -> Result<Vec<SearchMatch>> {
    let mut matches = Vec::new();

    if target.is_file() {
        scan_file(re, target, &mut matches);
        return Ok(matches);
    }

    if recursive {
        for entry in WalkDir::new(target) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    scan_file(re, entry.path(), &mut matches);
                },
                Ok(_) => {},
                Err(e) => log::warn!("grep: skipping unreadable entry: {e}"),
            }
        }
    } else {
        for entry in fs::read_dir(target)? {
            let entry = entry?;
            match entry.file_type() {
                Ok(ty) if ty.is_file() => scan_file(re, &entry.path(), &mut matches),
                Ok(_) => {},
                Err(e) => log::warn!("grep: skipping {}: {e}", entry.path().display()),
            }
        }
    }
    Ok(matches)
}

/// Scan one file line by line. Undecodable bytes are replaced rather than
/// aborting; read failures skip the file with a warning.
fn scan_file(re: &Regex, path: &Path, out: &mut Vec<SearchMatch>) {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("grep: skipping {}: {e}", path.display());
            return;
        },
    };
    let text = String::from_utf8_lossy(&data);
    for (i, line) in text.lines().enumerate() {
        if re.is_match(line) {
            out.push(SearchMatch {
                path: path.to_path_buf(),
                line: i + 1,
                text: line.trim().to_string(),
            });
        }
    }
}
