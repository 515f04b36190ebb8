//! Archive creation and extraction: zip and gzip-compressed tar.
//!
//! Callers validate preconditions (source exists and is a directory,
//! archive exists) before these run; this module owns the stream wiring
//! and the containment check on zip extraction.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use conch_types::{ConsoleError, Result};

/// Write every regular file under `source` into a zip archive, keyed by
/// its path relative to the source root. Directory entries are not stored.
pub(crate) fn create_zip(source: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        // Zip internal names always use forward slashes.
        let name = rel.to_string_lossy().replace('\\', "/");
        log::debug!("zip: adding {name}");
        writer.start_file(name, options)?;
        let mut f = File::open(entry.path())?;
        io::copy(&mut f, &mut writer)?;
    }
    writer.finish()?;
    Ok(())
}

/// Extract a zip archive into `dest`, creating the directory tree as
/// needed. Entries whose names escape the destination are rejected.
pub(crate) fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            return Err(ConsoleError::PermissionDenied(format!(
                "archive entry escapes destination: {}",
                entry.name()
            )));
        };
        let out = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        log::debug!("unzip: extracting {}", out.display());
        let mut f = File::create(&out)?;
        io::copy(&mut entry, &mut f)?;
    }
    Ok(())
}

/// Pack `source` into a gzip-compressed tar stream, nesting the whole tree
/// under the source directory's base name.
pub(crate) fn create_tar(source: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let base = source.file_name().unwrap_or(source.as_os_str());
    builder.append_dir_all(Path::new(base), source)?;

    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}

/// Unpack a gzip-compressed tar archive into `dest`, creating it if
/// absent. The tar reader refuses entries that escape the destination.
pub(crate) fn extract_tar(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let decoder = GzDecoder::new(file);
    let mut ar = tar::Archive::new(decoder);
    fs::create_dir_all(dest)?;
    ar.unpack(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_stores_relative_names() {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("tree");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "alpha").unwrap();
        fs::write(src.join("nested/b.txt"), "beta").unwrap();
        let archive = td.path().join("t.zip");
        create_zip(&src, &archive).unwrap();

        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "nested/b.txt"]);
    }

    #[test]
    fn zip_extraction_rejects_escaping_entries() {
        let td = tempfile::tempdir().unwrap();
        let archive = td.path().join("evil.zip");
        let mut writer = ZipWriter::new(File::create(&archive).unwrap());
        writer
            .start_file("../evil.txt", SimpleFileOptions::default())
            .unwrap();
        use io::Write;
        writer.write_all(b"pwned").unwrap();
        writer.finish().unwrap();

        let dest = td.path().join("out");
        let err = extract_zip(&archive, &dest).unwrap_err();
        assert!(matches!(err, ConsoleError::PermissionDenied(_)));
        assert!(!td.path().join("evil.txt").exists());
    }

    #[test]
    fn tar_roundtrip_is_byte_identical() {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("tree");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("raw.bin"), [1u8, 2, 3, 0, 255]).unwrap();
        fs::write(src.join("nested/deep.txt"), "deep").unwrap();
        let archive = td.path().join("t.tar.gz");
        create_tar(&src, &archive).unwrap();

        let dest = td.path().join("out");
        extract_tar(&archive, &dest).unwrap();
        assert_eq!(
            fs::read(dest.join("tree/raw.bin")).unwrap(),
            vec![1u8, 2, 3, 0, 255]
        );
        assert_eq!(
            fs::read_to_string(dest.join("tree/nested/deep.txt")).unwrap(),
            "deep"
        );
    }

    #[test]
    fn tar_archive_is_gzip_compressed() {
        let td = tempfile::tempdir().unwrap();
        let src = td.path().join("tree");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("f"), "data").unwrap();
        let archive = td.path().join("t.tar.gz");
        create_tar(&src, &archive).unwrap();
        // Gzip magic bytes.
        let bytes = fs::read(&archive).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }
}
