use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::types::Book;
use crate::BookError;

const MAX_BOOK_ID_LEN: usize = 60;

/// Reduce a book id to a file-name-safe key: ASCII alphanumerics and `_`,
/// lowercased, at most 60 characters.
pub fn sanitize_book_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_BOOK_ID_LEN)
        .collect()
}

/// Durable storage for parsed books, keyed by book id.
pub trait BookStore {
    fn has(&self, book_id: &str) -> bool;

    fn save(&self, book: &Book) -> Result<(), BookError>;

    /// Load a cached book. A book that was never saved is `Ok(None)`.
    fn load(&self, book_id: &str) -> Result<Option<Book>, BookError>;

    /// Remove a cached book. Returns whether anything was removed.
    fn invalidate(&self, book_id: &str) -> Result<bool, BookError>;
}

/// Summary of one cached book.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub book_id: String,
    pub size_kb: u64,
    pub modified: DateTime<Utc>,
}

/// One pretty-printed `<book_id>.json` file per book in a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BookError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, book_id: &str) -> Result<PathBuf, BookError> {
        let key = sanitize_book_id(book_id);
        if key.is_empty() {
            return Err(BookError::InvalidBookId(book_id.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Remove every cached book. Returns the number of files removed.
    pub fn invalidate_all(&self) -> Result<usize, BookError> {
        let mut removed = 0;
        for path in self.json_files()? {
            fs::remove_file(&path)?;
            removed += 1;
        }
        log::info!("Cleared {} cached books from {}", removed, self.dir.display());
        Ok(removed)
    }

    /// Cached books sorted by id.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, BookError> {
        let mut entries = Vec::new();
        for path in self.json_files()? {
            let Some(book_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let meta = fs::metadata(&path)?;
            entries.push(CacheEntry {
                book_id: book_id.to_string(),
                size_kb: meta.len().div_ceil(1024),
                modified: DateTime::<Utc>::from(meta.modified()?),
            });
        }
        entries.sort_by(|a, b| a.book_id.cmp(&b.book_id));
        Ok(entries)
    }

    fn json_files(&self) -> Result<Vec<PathBuf>, BookError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl BookStore for JsonStore {
    fn has(&self, book_id: &str) -> bool {
        self.path_for(book_id).is_ok_and(|path| path.is_file())
    }

    fn save(&self, book: &Book) -> Result<(), BookError> {
        let path = self.path_for(&book.book_id)?;
        fs::write(&path, book.to_json()?)?;
        log::info!(
            "Cached {} ({} chapters) at {}",
            book.book_id,
            book.chapters.len(),
            path.display()
        );
        Ok(())
    }

    fn load(&self, book_id: &str) -> Result<Option<Book>, BookError> {
        let path = self.path_for(book_id)?;
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        Ok(Some(Book::from_json(&data)?))
    }

    fn invalidate(&self, book_id: &str) -> Result<bool, BookError> {
        let path = self.path_for(book_id)?;
        if !path.is_file() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        log::info!("Invalidated cache for {}", book_id);
        Ok(true)
    }
}
