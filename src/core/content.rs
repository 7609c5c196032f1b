//! # Content Source
//!
//! Produces the already-shaped string rows the post table shows, and performs
//! the create/delete operations the screen triggers. The UI never looks
//! inside the files; it only sees headings, rows and paths.
//!
//! [`DirectorySource`] is the bundled implementation: every file with the
//! configured extension in one directory is a post, titled by its file stem
//! and dated by its modification time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("title {0:?} has no usable characters")]
    InvalidTitle(String),
    #[error("{0} already exists")]
    Exists(PathBuf),
    #[error("no entry at index {0}")]
    NotFound(usize),
}

/// Rows for the UI plus the operations behind its commands.
pub trait ContentSource {
    fn headings(&self) -> Vec<String>;

    /// One row per entry, in display order.
    fn rows(&self) -> Vec<Vec<String>>;

    fn path_of(&self, index: usize) -> Option<PathBuf>;

    /// Create a new entry titled `title` and return its path.
    fn create(&mut self, title: &str) -> Result<PathBuf, ContentError>;

    /// Remove the entry at `index` and return the path it had.
    fn delete(&mut self, index: usize) -> Result<PathBuf, ContentError>;

    /// Re-read the backing store.
    fn refresh(&mut self) -> Result<(), ContentError>;
}

/// One listed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub title: String,
    pub modified: Option<DateTime<Local>>,
}

/// Turn a title into a file-name stem: lowercase alphanumerics joined by `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// List every file in `dir` whose extension is `extension`, sorted by name.
///
/// Free of `&self` so it can run on a background thread.
pub fn scan(dir: &Path, extension: &str) -> Result<Vec<Entry>, ContentError> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let path = item?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != extension) {
            continue;
        }
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Local>::from);
        entries.push(Entry {
            path,
            title,
            modified,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Scanned {} entries in {}", entries.len(), dir.display());
    Ok(entries)
}

/// Posts stored as individual files in one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extension: String,
    entries: Vec<Entry>,
}

impl DirectorySource {
    /// A source with no entries loaded yet. Call [`ContentSource::refresh`]
    /// or [`DirectorySource::set_entries`] to populate it.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            entries: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Swap in a complete listing, e.g. one produced by [`scan`] elsewhere.
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.entries = entries;
    }
}

impl ContentSource for DirectorySource {
    fn headings(&self) -> Vec<String> {
        ["#", "Date", "Title"].map(String::from).to_vec()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let date = entry
                    .modified
                    .map(|d| d.format("%Y/%m/%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                vec![(i + 1).to_string(), date, entry.title.clone()]
            })
            .collect()
    }

    fn path_of(&self, index: usize) -> Option<PathBuf> {
        self.entries.get(index).map(|e| e.path.clone())
    }

    fn create(&mut self, title: &str) -> Result<PathBuf, ContentError> {
        let slug = slugify(title);
        if slug.is_empty() {
            return Err(ContentError::InvalidTitle(title.to_string()));
        }
        let path = self.dir.join(format!("{}.{}", slug, self.extension));
        if path.exists() {
            return Err(ContentError::Exists(path));
        }
        fs::write(&path, format!("# {}\n", title.trim()))?;
        info!("Created {}", path.display());
        self.refresh()?;
        Ok(path)
    }

    fn delete(&mut self, index: usize) -> Result<PathBuf, ContentError> {
        let path = self.path_of(index).ok_or(ContentError::NotFound(index))?;
        fs::remove_file(&path)?;
        self.entries.remove(index);
        info!("Deleted {}", path.display());
        Ok(path)
    }

    fn refresh(&mut self) -> Result<(), ContentError> {
        self.entries = scan(&self.dir, &self.extension)?;
        Ok(())
    }
}
