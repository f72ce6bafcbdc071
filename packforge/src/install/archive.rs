//! Archive operations for the install executor and toggler.
//!
//! Extraction sanitizes entry paths (no absolute paths, no `..`
//! traversal). The launch-archive merge stream-copies entries into a
//! fresh archive and swaps it in atomically rather than mutating in
//! place, so a failed merge leaves the original untouched.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Directory prefix stripped when merging into the launch archive.
/// Leftover signature metadata makes the runtime reject the jar.
const META_PREFIX: &str = "META-INF/";

/// Archive-level failure.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive entry has unsafe path: {0}")]
    UnsafePath(String),
}

/// Extract an archive into `dest`, creating it if needed.
///
/// Returns the number of file entries written.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafePath(entry.name().to_string()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut entry, &mut out)?;
            extracted += 1;
        }
    }
    Ok(extracted)
}

/// Repack a directory's contents into a single archive.
///
/// Entry names are relative to `dir` with forward slashes. Returns the
/// number of file entries written.
pub fn pack_directory(dir: &Path, archive_path: &Path) -> Result<usize, ArchiveError> {
    if let Some(parent) = archive_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = ZipWriter::new(File::create(archive_path)?);
    let options = SimpleFileOptions::default();
    let mut packed = 0;
    pack_dir_entries(dir, dir, &mut writer, options, &mut packed)?;
    writer.finish()?;
    Ok(packed)
}

fn pack_dir_entries(
    base: &Path,
    dir: &Path,
    writer: &mut ZipWriter<File>,
    options: SimpleFileOptions,
    packed: &mut usize,
) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = relative_entry_name(base, &path);

        if path.is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
            pack_dir_entries(base, &path, writer, options, packed)?;
        } else {
            writer.start_file(name, options)?;
            let mut file = File::open(&path)?;
            io::copy(&mut file, writer)?;
            *packed += 1;
        }
    }
    Ok(())
}

fn relative_entry_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Merge `addition` into the launch archive, stripping signature
/// metadata.
///
/// Every entry of the existing archive except those under `META-INF/`
/// is copied into a rebuilt archive, then every entry of `addition` is
/// layered on top (later entries win on name collision). The rebuilt
/// archive atomically replaces the original.
pub fn merge_jar_stripping_meta(
    launch_archive: &Path,
    addition: &Path,
) -> Result<(), ArchiveError> {
    let staged: PathBuf = launch_archive.with_extension("jar.rebuild");
    if let Some(parent) = staged.parent() {
        fs::create_dir_all(parent)?;
    }
    {
        let mut writer = ZipWriter::new(File::create(&staged)?);

        // Names in the addition shadow the originals.
        let addition_names: Vec<String> = {
            let mut added = ZipArchive::new(File::open(addition)?)?;
            (0..added.len())
                .map(|i| added.by_index(i).map(|e| e.name().to_string()))
                .collect::<Result<_, _>>()?
        };

        if launch_archive.exists() {
            let mut base = ZipArchive::new(File::open(launch_archive)?)?;
            for i in 0..base.len() {
                let entry = base.by_index(i)?;
                let name = entry.name().to_string();
                if name.starts_with(META_PREFIX) || addition_names.contains(&name) {
                    continue;
                }
                writer.raw_copy_file(entry)?;
            }
        }

        let mut added = ZipArchive::new(File::open(addition)?)?;
        for i in 0..added.len() {
            let entry = added.by_index(i)?;
            writer.raw_copy_file(entry)?;
        }

        writer.finish()?;
    }

    fs::rename(&staged, launch_archive)?;
    Ok(())
}
