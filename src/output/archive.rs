//! ZIP archive of the output folder

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{OutputError, OutputResult};

/// Compress every file in `folder` into `archive`, then delete `folder`
///
/// Entries are stored flat, named by file name, in sorted order. Fails with
/// [`OutputError::MissingFolder`] if `folder` is not a directory, so a second
/// call after a successful one is an error.
pub fn archive_and_cleanup(folder: &Path, archive: &Path) -> OutputResult<PathBuf> {
    if !folder.is_dir() {
        return Err(OutputError::MissingFolder(folder.to_path_buf()));
    }

    let files = list_files(folder)?;
    info!(
        "Archiving {} file(s) from {} into {}",
        files.len(),
        folder.display(),
        archive.display()
    );

    let out = File::create(archive).map_err(|e| {
        OutputError::IoError(format!("Failed to create {}: {e}", archive.display()))
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let entry_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                OutputError::ArchiveError(format!("No file name: {}", path.display()))
            })?;

        zip.start_file(entry_name.as_str(), options)
            .map_err(|e| OutputError::ArchiveError(format!("{entry_name}: {e}")))?;

        let mut source = File::open(path)
            .map_err(|e| OutputError::IoError(format!("Failed to open {}: {e}", path.display())))?;
        std::io::copy(&mut source, &mut zip)
            .map_err(|e| OutputError::ArchiveError(format!("{entry_name}: {e}")))?;

        debug!("Added {} to archive", entry_name);
    }

    zip.finish()
        .map_err(|e| OutputError::ArchiveError(format!("Failed to finalize archive: {e}")))?;

    std::fs::remove_dir_all(folder).map_err(|e| {
        OutputError::IoError(format!("Failed to remove {}: {e}", folder.display()))
    })?;
    info!("Removed output folder {}", folder.display());

    Ok(archive.to_path_buf())
}

fn list_files(folder: &Path) -> OutputResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .map_err(|e| OutputError::IoError(format!("Failed to read {}: {e}", folder.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| OutputError::IoError(format!("Failed to read entry: {e}")))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
