use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{PageImage, TextRun};
use crate::BookError;

// ---------------------------------------------------------------------------
// RunSource trait
// ---------------------------------------------------------------------------

/// Abstraction over the extraction layer that turns a page-imaged document
/// into positioned text runs.
///
/// Pages are addressed by 0-based index. Runs are returned in reading order
/// and are never re-sorted downstream.
pub trait RunSource {
    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Page `(width, height)` in points.
    fn page_size(&self, page: usize) -> Result<(f32, f32), BookError>;

    /// Raw text runs for a page, in reading order.
    fn page_runs(&self, page: usize) -> Result<Vec<TextRun>, BookError>;

    /// Plain text of a page, used for keyword scans.
    fn page_text(&self, page: usize) -> Result<String, BookError> {
        Ok(self
            .page_runs(page)?
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Images placed on a page.
    fn page_images(&self, _page: usize) -> Result<Vec<PageImage>, BookError> {
        Ok(Vec::new())
    }
}

impl<T: RunSource + ?Sized> RunSource for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_size(&self, page: usize) -> Result<(f32, f32), BookError> {
        (**self).page_size(page)
    }

    fn page_runs(&self, page: usize) -> Result<Vec<TextRun>, BookError> {
        (**self).page_runs(page)
    }

    fn page_text(&self, page: usize) -> Result<String, BookError> {
        (**self).page_text(page)
    }

    fn page_images(&self, page: usize) -> Result<Vec<PageImage>, BookError> {
        (**self).page_images(page)
    }
}

// ---------------------------------------------------------------------------
// RunDump
// ---------------------------------------------------------------------------

fn default_width() -> f32 {
    612.0
}

fn default_height() -> f32 {
    792.0
}

/// An image as recorded by the extractor, with its top edge in points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpImage {
    pub filename: String,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpPage {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub images: Vec<DumpImage>,
}

/// In-memory [`RunSource`] loaded from the JSON dump written by an external
/// extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDump {
    pub pages: Vec<DumpPage>,
}

impl RunDump {
    pub fn from_json(data: &str) -> Result<Self, BookError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, BookError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    fn page(&self, page: usize) -> Result<&DumpPage, BookError> {
        self.pages.get(page).ok_or(BookError::PageOutOfRange {
            page,
            count: self.pages.len(),
        })
    }
}

impl RunSource for RunDump {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Result<(f32, f32), BookError> {
        let p = self.page(page)?;
        Ok((p.width, p.height))
    }

    fn page_runs(&self, page: usize) -> Result<Vec<TextRun>, BookError> {
        let runs = self
            .page(page)?
            .runs
            .iter()
            .cloned()
            .map(|mut run| {
                run.page_num = page;
                run
            })
            .collect();
        Ok(runs)
    }

    fn page_images(&self, page: usize) -> Result<Vec<PageImage>, BookError> {
        let p = self.page(page)?;
        if p.height <= 0.0 {
            return Ok(Vec::new());
        }
        Ok(p.images
            .iter()
            .map(|img| PageImage {
                filename: img.filename.clone(),
                y: (img.y / p.height).clamp(0.0, 1.0),
            })
            .collect())
    }
}
