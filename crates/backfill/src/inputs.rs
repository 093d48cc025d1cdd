use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use backfill_core::SourceFormat;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{} is a directory; use --directory to process a folder", .0.display())]
    IsDirectory(PathBuf),
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },
    #[error("no .csv, .xlsx or .xls files found in {}", .0.display())]
    NoSupportedFiles(PathBuf),
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> InputError + '_ {
    move |source| InputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Validates one input path and returns it in absolute form.
pub fn check_input(path: &Path) -> Result<PathBuf, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Err(InputError::IsDirectory(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::NotAFile(path.to_path_buf()));
    }
    SourceFormat::from_path(path).map_err(|err| InputError::Unsupported {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    path.canonicalize().map_err(io_error(path))
}

/// Supported files directly inside `dir` (no recursion), sorted by path.
pub fn files_in_directory(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    if !dir.is_dir() {
        return Err(InputError::NotADirectory(dir.to_path_buf()));
    }
    let dir = dir.canonicalize().map_err(io_error(dir))?;
    let pattern = format!(
        "{}/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut files: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                warn!("could not read directory entry: {err}");
                None
            }
        })
        .filter(|path| path.is_file() && SourceFormat::from_path(path).is_ok())
        .collect();
    files.sort();
    Ok(files)
}

/// The explicit output directory, or the folder holding the first input, created if absent
/// and returned in absolute form.
pub fn resolve_output_dir(
    explicit: Option<&Path>,
    files: &[PathBuf],
) -> Result<PathBuf, InputError> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => files
            .first()
            .and_then(|file| file.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if !dir.is_dir() {
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
    }
    dir.canonicalize().map_err(io_error(&dir))
}
