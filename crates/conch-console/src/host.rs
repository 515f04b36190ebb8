//! Production console backed by the host filesystem.
//!
//! Every operation validates existence and type before touching the
//! filesystem, logs at entry, at each validation failure, and at
//! completion, and surfaces precise error kinds. The only mutable session
//! state is the working directory, written exclusively by `cd`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use conch_types::{ConsoleError, DisplayMode, ReadMode, Result};

use crate::{ConsoleService, FileContent, SearchMatch, archive, path, search};

/// The single production implementation of [`ConsoleService`].
///
/// Owns the session working directory; all relative inputs resolve against
/// it rather than against ambient OS process state, so independent
/// sessions never interfere.
pub struct HostConsole {
    cwd: PathBuf,
}

impl HostConsole {
    /// Create a console session rooted at the process working directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            cwd: std::env::current_dir()?,
        })
    }

    /// Create a console session rooted at an explicit directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    fn resolve(&self, input: &str) -> PathBuf {
        path::resolve(&self.cwd, input)
    }
}

impl ConsoleService for HostConsole {
    // -----------------------------------------------------------------
    // ls
    // -----------------------------------------------------------------

    fn ls(&self, path: &str, mode: DisplayMode) -> Result<Vec<String>> {
        let path = self.resolve(path);
        if !path.exists() {
            log::error!("ls: directory not found: {}", path.display());
            return Err(ConsoleError::NotFound(path));
        }
        if !path.is_dir() {
            log::error!("ls: not a directory: {}", path.display());
            return Err(ConsoleError::NotADirectory(path));
        }
        log::info!("ls: listing {} ({mode:?})", path.display());

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| io_context("ls", &path, e))? {
            entries.push(entry.map_err(|e| io_context("ls", &path, e))?);
        }
        // Directories before files, case-insensitive name order within
        // each group.
        entries.sort_by_key(|e| {
            (
                e.path().is_file(),
                e.file_name().to_string_lossy().to_lowercase(),
            )
        });

        Ok(entries
            .iter()
            .map(|e| match mode {
                DisplayMode::Simple => format!("{}\n", e.file_name().to_string_lossy()),
                DisplayMode::Detailed => format_detailed(e),
            })
            .collect())
    }

    // -----------------------------------------------------------------
    // cat
    // -----------------------------------------------------------------

    fn cat(&self, path: &str, mode: ReadMode) -> Result<FileContent> {
        let path = self.resolve(path);
        log::info!("cat: reading {} ({mode:?})", path.display());
        if !path.exists() {
            log::error!("cat: file not found: {}", path.display());
            return Err(ConsoleError::NotFound(path));
        }
        if path.is_dir() {
            log::error!("cat: is a directory: {}", path.display());
            return Err(ConsoleError::IsADirectory(path));
        }
        let content = match mode {
            ReadMode::Text => fs::read_to_string(&path).map(FileContent::Text),
            ReadMode::Binary => fs::read(&path).map(FileContent::Bytes),
        }
        .map_err(|e| io_context("cat", &path, e))?;
        log::debug!("cat: read {}", path.display());
        Ok(content)
    }

    // -----------------------------------------------------------------
    // cd
    // -----------------------------------------------------------------

    fn cd(&mut self, path: &str) -> Result<PathBuf> {
        log::info!("cd: changing directory to '{path}'");
        let target = self.resolve(path);
        let target = path::canonicalize(&target).inspect_err(|e| log::error!("cd: {e}"))?;
        if !target.is_dir() {
            log::error!("cd: not a directory: {}", target.display());
            return Err(ConsoleError::NotADirectory(target));
        }
        self.cwd = target.clone();
        log::info!("cd: now in {}", self.cwd.display());
        Ok(target)
    }

    // -----------------------------------------------------------------
    // cp
    // -----------------------------------------------------------------

    fn cp(&self, src: &str, dst: &str, recursive: bool) -> Result<()> {
        let src = self.resolve(src);
        let dst = self.resolve(dst);
        log::info!(
            "cp: src='{}' dst='{}' recursive={recursive}",
            src.display(),
            dst.display()
        );
        if !src.exists() {
            log::error!("cp: source not found: {}", src.display());
            return Err(ConsoleError::NotFound(src));
        }

        if src.is_dir() {
            if !recursive {
                log::error!("cp: {} is a directory (use -r)", src.display());
                return Err(ConsoleError::IsADirectory(src));
            }
            let final_dst = if dst.is_dir() {
                dst.join(src.file_name().unwrap_or_default())
            } else {
                dst
            };
            if final_dst.exists() {
                if final_dst.is_dir() {
                    log::debug!(
                        "cp: merging {} into {}",
                        src.display(),
                        final_dst.display()
                    );
                    merge_tree(&src, &final_dst)?;
                } else {
                    log::error!(
                        "cp: destination exists and is not a directory: {}",
                        final_dst.display()
                    );
                    return Err(ConsoleError::AlreadyExists(final_dst));
                }
            } else {
                log::debug!(
                    "cp: copying tree {} -> {}",
                    src.display(),
                    final_dst.display()
                );
                copy_tree(&src, &final_dst)?;
            }
        } else {
            let final_dst = if dst.is_dir() {
                dst.join(src.file_name().unwrap_or_default())
            } else {
                dst
            };
            copy_file(&src, &final_dst)?;
        }
        log::info!("cp: completed");
        Ok(())
    }

    // -----------------------------------------------------------------
    // mv
    // -----------------------------------------------------------------

    fn mv(&self, src: &str, dst: &str) -> Result<()> {
        let src = self.resolve(src);
        let dst = self.resolve(dst);
        log::info!("mv: src='{}' dst='{}'", src.display(), dst.display());
        if !src.exists() {
            log::error!("mv: source not found: {}", src.display());
            return Err(ConsoleError::NotFound(src));
        }

        let final_dst = if dst.is_dir() {
            dst.join(src.file_name().unwrap_or_default())
        } else {
            dst
        };
        if let Some(parent) = final_dst.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| io_context("mv", parent, e))?;
        }

        match fs::rename(&src, &final_dst) {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                log::debug!("mv: cross-device rename, falling back to copy+delete");
                if src.is_dir() {
                    copy_tree(&src, &final_dst)?;
                    fs::remove_dir_all(&src).map_err(|e| io_context("mv", &src, e))?;
                } else {
                    copy_file(&src, &final_dst)?;
                    fs::remove_file(&src).map_err(|e| io_context("mv", &src, e))?;
                }
            },
            Err(e) => return Err(io_context("mv", &final_dst, e)),
        }
        log::info!("mv: completed move to {}", final_dst.display());
        Ok(())
    }

    // -----------------------------------------------------------------
    // rm
    // -----------------------------------------------------------------

    fn rm(&self, target: &str, recursive: bool) -> Result<()> {
        log::info!("rm: target='{target}' recursive={recursive}");

        // Safety rule: the raw argument is checked before any resolution.
        let raw = target.trim();
        let raw_path = Path::new(raw);
        if raw == ".." || (raw_path.has_root() && raw_path.parent().is_none()) {
            log::error!("rm: refusing to remove '{raw}'");
            return Err(ConsoleError::PermissionDenied(format!(
                "refusing to remove '{raw}'"
            )));
        }

        let resolved =
            path::canonicalize(&self.resolve(raw)).inspect_err(|e| log::error!("rm: {e}"))?;
        if resolved.parent().is_none() {
            log::error!(
                "rm: refusing to remove filesystem root {}",
                resolved.display()
            );
            return Err(ConsoleError::PermissionDenied(format!(
                "refusing to remove filesystem root {}",
                resolved.display()
            )));
        }

        if resolved.is_dir() {
            if !recursive {
                log::error!("rm: {} is a directory (use -r)", resolved.display());
                return Err(ConsoleError::IsADirectory(resolved));
            }
            log::debug!("rm: removing tree {}", resolved.display());
            fs::remove_dir_all(&resolved).map_err(|e| io_context("rm", &resolved, e))?;
        } else {
            log::debug!("rm: unlinking {}", resolved.display());
            fs::remove_file(&resolved).map_err(|e| io_context("rm", &resolved, e))?;
        }
        log::info!("rm: removed {}", resolved.display());
        Ok(())
    }

    // -----------------------------------------------------------------
    // zip / unzip
    // -----------------------------------------------------------------

    fn zip(&self, source_dir: &str, archive: &str) -> Result<()> {
        let source = self.resolve(source_dir);
        let archive_path = self.resolve(archive);
        log::info!("zip: {} -> {}", source.display(), archive_path.display());
        ensure_source_dir("zip", &source)?;
        ensure_parent("zip", &archive_path)?;
        archive::create_zip(&source, &archive_path)
            .inspect_err(|e| log::error!("zip: {e}"))?;
        log::info!("zip: created {}", archive_path.display());
        Ok(())
    }

    fn unzip(&self, archive: &str, dest: Option<&str>) -> Result<()> {
        let archive_path = self.resolve(archive);
        let dest = dest.map_or_else(|| self.cwd.clone(), |d| self.resolve(d));
        log::info!("unzip: {} -> {}", archive_path.display(), dest.display());
        if !archive_path.exists() {
            log::error!("unzip: archive not found: {}", archive_path.display());
            return Err(ConsoleError::NotFound(archive_path));
        }
        archive::extract_zip(&archive_path, &dest)
            .inspect_err(|e| log::error!("unzip: {e}"))?;
        log::info!("unzip: extracted into {}", dest.display());
        Ok(())
    }

    // -----------------------------------------------------------------
    // tar / untar
    // -----------------------------------------------------------------

    fn tar(&self, source_dir: &str, archive: &str) -> Result<()> {
        let source = self.resolve(source_dir);
        let archive_path = self.resolve(archive);
        log::info!("tar: {} -> {}", source.display(), archive_path.display());
        ensure_source_dir("tar", &source)?;
        ensure_parent("tar", &archive_path)?;
        archive::create_tar(&source, &archive_path)
            .inspect_err(|e| log::error!("tar: {e}"))?;
        log::info!("tar: created {}", archive_path.display());
        Ok(())
    }

    fn untar(&self, archive: &str, dest: Option<&str>) -> Result<()> {
        let archive_path = self.resolve(archive);
        let dest = dest.map_or_else(|| self.cwd.clone(), |d| self.resolve(d));
        log::info!("untar: {} -> {}", archive_path.display(), dest.display());
        if !archive_path.exists() {
            log::error!("untar: archive not found: {}", archive_path.display());
            return Err(ConsoleError::NotFound(archive_path));
        }
        archive::extract_tar(&archive_path, &dest)
            .inspect_err(|e| log::error!("untar: {e}"))?;
        log::info!("untar: extracted into {}", dest.display());
        Ok(())
    }

    // -----------------------------------------------------------------
    // grep
    // -----------------------------------------------------------------

    fn grep(
        &self,
        pattern: &str,
        path: &str,
        recursive: bool,
        ignore_case: bool,
    ) -> Result<Vec<SearchMatch>> {
        // The pattern is compiled before any file access.
        let re = search::compile(pattern, ignore_case)
            .inspect_err(|e| log::error!("grep: {e}"))?;
        let target = self.resolve(path);
        log::info!(
            "grep: '{pattern}' in {} recursive={recursive} ignore_case={ignore_case}",
            target.display()
        );
        if !target.exists() {
            log::error!("grep: target not found: {}", target.display());
            return Err(ConsoleError::NotFound(target));
        }
        let matches = search::search_path(&re, &target, recursive)?;
        log::info!("grep: {} match(es)", matches.len());
        Ok(matches)
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Log an OS-level failure and map it into the error taxonomy, keeping the
/// original error for anything that is not an access violation.
fn io_context(op: &str, path: &Path, e: io::Error) -> ConsoleError {
    log::error!("{op}: {}: {e}", path.display());
    if e.kind() == io::ErrorKind::PermissionDenied {
        ConsoleError::PermissionDenied(format!("{}: {e}", path.display()))
    } else {
        ConsoleError::Io(e)
    }
}

fn ensure_source_dir(op: &str, source: &Path) -> Result<()> {
    if !source.exists() {
        log::error!("{op}: source not found: {}", source.display());
        return Err(ConsoleError::NotFound(source.to_path_buf()));
    }
    if !source.is_dir() {
        log::error!("{op}: not a directory: {}", source.display());
        return Err(ConsoleError::NotADirectory(source.to_path_buf()));
    }
    Ok(())
}

fn ensure_parent(op: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| io_context(op, parent, e))?;
    }
    Ok(())
}

/// Format one detailed listing line: type char, permission digits, size
/// right-justified to 10, modification time, name.
///
/// Metadata failures (e.g. a race with deletion) degrade to a placeholder
/// line rather than aborting the whole listing.
fn format_detailed(entry: &fs::DirEntry) -> String {
    let name = entry.file_name().to_string_lossy().into_owned();
    match entry.metadata() {
        Ok(meta) => {
            let kind = if meta.is_dir() { 'd' } else { '-' };
            let mtime = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
            format!(
                "{kind}{} {:>10} {} {name}\n",
                permission_digits(&meta),
                meta.len(),
                format_time(mtime),
            )
        },
        Err(e) => {
            log::warn!("ls: could not stat {name}: {e}");
            format!(
                "-000 {:>10} {} {name}\n",
                0,
                format_time(std::time::UNIX_EPOCH)
            )
        },
    }
}

#[cfg(unix)]
fn permission_digits(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permission_digits(meta: &fs::Metadata) -> String {
    // No POSIX mode bits; derive an effective value from the read-only bit.
    if meta.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}

fn format_time(t: std::time::SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Local> = t.into();
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Copy one file, creating missing parent directories and preserving
/// timestamps where the filesystem supports it.
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| io_context("cp", parent, e))?;
    }
    log::debug!("cp: {} -> {}", src.display(), dst.display());
    fs::copy(src, dst).map_err(|e| io_context("cp", dst, e))?;
    match fs::metadata(src) {
        Ok(meta) => {
            let atime = FileTime::from_last_access_time(&meta);
            let mtime = FileTime::from_last_modification_time(&meta);
            if let Err(e) = filetime::set_file_times(dst, atime, mtime) {
                log::warn!("cp: could not preserve times on {}: {e}", dst.display());
            }
        },
        Err(e) => log::warn!("cp: could not stat {} for times: {e}", src.display()),
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| io_context("cp", dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| io_context("cp", src, e))? {
        let entry = entry.map_err(|e| io_context("cp", src, e))?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            copy_file(&entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Merge a source tree into an existing destination directory: same-named
/// subdirectories recurse, everything else is copied wholesale.
fn merge_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in fs::read_dir(src).map_err(|e| io_context("cp", src, e))? {
        let entry = entry.map_err(|e| io_context("cp", src, e))?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            if target.is_dir() {
                merge_tree(&entry.path(), &target)?;
            } else if target.exists() {
                return Err(ConsoleError::AlreadyExists(target));
            } else {
                copy_tree(&entry.path(), &target)?;
            }
        } else {
            copy_file(&entry.path(), &target)?;
        }
    }
    Ok(())
}
