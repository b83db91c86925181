//! Input file enumeration and media type classification

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// One matched input path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the base directory, `/`-separated
    pub relative: String,
    /// On-disk size in bytes
    pub size: u64,
    /// Regular file (false for directories and special files)
    pub is_file: bool,
    /// MIME type guessed from the extension
    pub media_type: String,
}

impl InputFile {
    /// Describe a path found on disk
    pub fn from_path(path: &Path, base_dir: &Path, default_media_type: &str) -> Result<Self> {
        let absolute = path.canonicalize()?;
        let metadata = std::fs::metadata(&absolute)?;
        Ok(Self {
            relative: relative_path(&absolute, base_dir),
            size: metadata.len(),
            is_file: metadata.is_file(),
            media_type: media_type_for(&absolute, default_media_type),
            path: absolute,
        })
    }

    /// Final path component
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.relative.clone())
    }
}

/// Guess the MIME type from the file extension
pub fn media_type_for(path: &Path, default_media_type: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(default_media_type)
        .to_string()
}

/// `path` relative to `base_dir`, or the absolute path when it lies outside
pub fn relative_path(path: &Path, base_dir: &Path) -> String {
    let canonical = base_dir.canonicalize().ok();
    let relative = path
        .strip_prefix(base_dir)
        .or_else(|e| canonical.as_deref().map_or(Err(e), |base| path.strip_prefix(base)))
        .unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Expand a glob pattern (relative patterns resolve against `base_dir`).
///
/// A pattern that names a directory expands to every file below it.
/// Other directory matches are returned with `is_file == false` so callers
/// can report them. Results are sorted by path.
pub fn expand_pattern(pattern: &str, base_dir: &Path, default_media_type: &str) -> Result<Vec<InputFile>> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Ok(Vec::new());
    }

    let full_pattern = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        base_dir.join(pattern)
    };

    if full_pattern.is_dir() {
        return walk_directory(&full_pattern, base_dir, default_media_type);
    }

    let mut files = Vec::new();
    for entry in glob::glob(&full_pattern.to_string_lossy())? {
        match entry {
            Ok(path) => match InputFile::from_path(&path, base_dir, default_media_type) {
                Ok(file) => files.push(file),
                Err(e) => tracing::warn!("Cannot stat {}: {}", path.display(), e),
            },
            Err(e) => tracing::warn!("Unreadable glob entry: {}", e),
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files.dedup_by(|a, b| a.path == b.path);
    Ok(files)
}

fn walk_directory(dir: &Path, base_dir: &Path, default_media_type: &str) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            files.push(InputFile::from_path(entry.path(), base_dir, default_media_type)?);
        }
    }
    Ok(files)
}

/// Require at least one match
pub fn require_files(pattern: Option<&str>, files: &[InputFile]) -> Result<()> {
    match pattern {
        None => Err(Error::NoFiles("no file pattern given".into())),
        Some(p) if p.trim().is_empty() => Err(Error::NoFiles("no file pattern given".into())),
        Some(p) if files.is_empty() => Err(Error::NoFiles(format!("'{}' matched nothing", p))),
        Some(_) => Ok(()),
    }
}
