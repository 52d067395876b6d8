use std::collections::BTreeMap;

use thiserror::Error;

pub mod parser;
pub mod profile;
pub mod store;
pub mod text;
pub mod tree;
pub mod types;

pub use parser::classify::BlockClassifier;
pub use parser::code::CodeConsolidator;
pub use parser::fonts::{FallbackReason, ProfileBuilder, ProfileOutcome};
pub use parser::source::{RunDump, RunSource};
pub use profile::{Profile, ProfileConfig};
pub use store::{sanitize_book_id, BookStore, CacheEntry, JsonStore};
pub use tree::StructureBuilder;
pub use types::*;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("Extraction error: {0}")]
    Source(String),
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Invalid book id: {0:?}")]
    InvalidBookId(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<InvalidHeadingLevel> for BookError {
    fn from(e: InvalidHeadingLevel) -> Self {
        BookError::InvalidProfile(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Identity of a book being parsed.
#[derive(Debug, Clone, Default)]
pub struct BookMeta {
    pub book_id: String,
    pub title: String,
    pub pdf_path: String,
}

/// Normalize one page's raw runs for classification.
///
/// Text is cleaned, blank runs and runs in the top/bottom margins are dropped,
/// sizes are rounded to 0.1pt, and the monospace flag is taken from the
/// profile's font list.
pub fn prepare_page_runs(runs: Vec<TextRun>, profile: &Profile, page_height: f32) -> Vec<TextRun> {
    runs.into_iter()
        .filter_map(|mut run| {
            run.text = text::clean_text(&run.text);
            if run.text.trim().is_empty() || !profile.in_content_area(&run, page_height) {
                return None;
            }
            run.font_size = (run.font_size * 10.0).round() / 10.0;
            run.is_monospace = profile.is_monospace(&run.font_name);
            Some(run)
        })
        .collect()
}

/// Run the full pipeline over a document: classify every content page, merge
/// code, and split the result into chapters.
///
/// Pages inside the profile's skip ranges are ignored. A page that cannot be
/// read is logged and treated as empty; only a document where no page in range
/// can be read is an error.
pub fn parse_book<S: RunSource>(
    source: &S,
    profile: &Profile,
    meta: BookMeta,
) -> Result<Book, BookError> {
    let total_pages = source.page_count();
    let start = profile.skip_pages_start().min(total_pages);
    let end = total_pages
        .saturating_sub(profile.skip_pages_end())
        .max(start);

    log::info!(
        "Parsing {} with profile {}: pages {}..{} of {}",
        meta.book_id,
        profile.name(),
        start,
        end,
        total_pages
    );

    let mut pages: Vec<Vec<TextRun>> = Vec::with_capacity(end - start);
    let mut page_images: BTreeMap<usize, Vec<PageImage>> = BTreeMap::new();
    let mut first_error: Option<BookError> = None;
    let mut readable = 0;

    for page in start..end {
        match read_page(source, profile, page) {
            Ok((runs, images)) => {
                readable += 1;
                pages.push(runs);
                if !images.is_empty() {
                    page_images.insert(page, images);
                }
            }
            Err(e) => {
                log::warn!("Skipping unreadable page {}: {}", page, e);
                first_error.get_or_insert(e);
                pages.push(Vec::new());
            }
        }
    }

    if readable == 0 {
        if let Some(e) = first_error {
            return Err(e);
        }
    }

    let classifier = BlockClassifier::new(profile);
    let blocks = classifier.classify_all_pages(&pages, start, Some(&page_images));
    let blocks = CodeConsolidator::new().process(blocks);
    let block_count = blocks.len();
    let chapters = StructureBuilder::new(profile).detect_chapters(blocks);

    log::info!(
        "Parsed {}: {} blocks in {} chapters",
        meta.book_id,
        block_count,
        chapters.len()
    );

    Ok(Book {
        book_id: meta.book_id,
        title: meta.title,
        pdf_path: meta.pdf_path,
        profile_name: profile.name().to_string(),
        language: profile.language().to_string(),
        total_pages,
        chapters,
    })
}

fn read_page<S: RunSource>(
    source: &S,
    profile: &Profile,
    page: usize,
) -> Result<(Vec<TextRun>, Vec<PageImage>), BookError> {
    let (_, height) = source.page_size(page)?;
    let runs = prepare_page_runs(source.page_runs(page)?, profile, height);
    let images = source.page_images(page)?;
    log::debug!("Page {}: {} runs, {} images", page, runs.len(), images.len());
    Ok((runs, images))
}
