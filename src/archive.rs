// SPDX-License-Identifier: GPL-3.0-only

//! Packaging a finished export tree into a timestamped zip archive.
//!
//! The archive name carries the local wall-clock time of its creation
//! (`slackdump-YYYYMMDDHHMMSS.zip`) and its entries are rooted at the
//! export tree itself: the working directory's own name never appears in
//! an entry path, so extracting yields the room directories and listings
//! directly.

use chrono::Local;
use snafu::prelude::*;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Error type for archive assembly failures.
#[derive(Debug, Snafu)]
pub enum ArchiveError {
    /// The archive file could not be created.
    #[snafu(display("failed to create archive {}: {source}", path.display()))]
    Create {
        /// The archive path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Walking the export tree failed.
    #[snafu(display("failed to walk export tree: {source}"))]
    Walk {
        /// The underlying traversal error.
        source: walkdir::Error,
    },

    /// An export file could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadEntry {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An entry could not be written into the archive.
    #[snafu(display("failed to archive {name}: {source}"))]
    WriteEntry {
        /// The entry name inside the archive.
        name: String,
        /// The underlying zip error.
        source: zip::result::ZipError,
    },

    /// The archive's central directory could not be finalized.
    #[snafu(display("failed to finish archive: {source}"))]
    Finish {
        /// The underlying zip error.
        source: zip::result::ZipError,
    },
}

/// Packs every file under `work_dir` into a timestamped zip in
/// `output_dir` and returns the archive's path.
///
/// Entry names use `/` separators on every platform. Directories are not
/// stored as entries of their own; they fall out of the file paths.
///
/// # Errors
///
/// Fails when the tree cannot be walked, a file cannot be read, or the
/// archive cannot be written.
pub fn create_archive(work_dir: &Path, output_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    let archive_path = output_dir.join(format!("slackdump-{stamp}.zip"));

    let file = File::create(&archive_path).context(CreateSnafu {
        path: &archive_path,
    })?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in WalkDir::new(work_dir) {
        let entry = entry.context(WalkSnafu)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(work_dir, entry.path());
        writer
            .start_file(name.as_str(), options)
            .context(WriteEntrySnafu { name: &name })?;
        let mut source = File::open(entry.path()).context(ReadEntrySnafu {
            path: entry.path(),
        })?;
        io::copy(&mut source, &mut writer).context(ReadEntrySnafu { path: entry.path() })?;
    }

    writer.finish().context(FinishSnafu)?;
    Ok(archive_path)
}

/// The archive entry name for a file: its path relative to the export
/// tree, joined with forward slashes.
fn entry_name(work_dir: &Path, path: &Path) -> String {
    path.strip_prefix(work_dir)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
