#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("Book not cached: {0}. Run `shelf parse` first.")]
    BookNotFound(String),

    #[error("Chapter {chapter} not found in {book_id}")]
    ChapterNotFound { book_id: String, chapter: u32 },

    #[error("Unable to determine cache directory")]
    NoCacheDir,
}
