use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LANGUAGE: &str = "python";

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

// ---------------------------------------------------------------------------
// Extraction input
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box in page coordinates (origin top-left, y grows down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        BBox { x0, y0, x1, y1 }
    }
}

/// One positioned span of rendered text, as produced by the extraction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub font_name: String,
    #[serde(default)]
    pub font_size: f32,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub is_monospace: bool,
    #[serde(default)]
    pub page_num: usize,
    #[serde(default)]
    pub bbox: BBox,
}

/// An image placed on a page. `y` is the fractional vertical position of the
/// image's top edge: 0.0 is the top of the page and 1.0 the bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    pub filename: String,
    pub y: f32,
}

// ---------------------------------------------------------------------------
// Block types
// ---------------------------------------------------------------------------

/// Semantic type of a [`Block`]. Serialized as a lowercase string tag; unknown
/// tags deserialize to [`BlockType::Body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Heading1,
    Heading2,
    Heading3,
    Body,
    Code,
    CodeRepl,
    Note,
    Warning,
    Tip,
    ListItem,
    Exercise,
    ExerciseAnswer,
    Table,
    Figure,
    FigureCaption,
    PageHeader,
    PageFooter,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Heading1 => "heading1",
            BlockType::Heading2 => "heading2",
            BlockType::Heading3 => "heading3",
            BlockType::Body => "body",
            BlockType::Code => "code",
            BlockType::CodeRepl => "code_repl",
            BlockType::Note => "note",
            BlockType::Warning => "warning",
            BlockType::Tip => "tip",
            BlockType::ListItem => "list_item",
            BlockType::Exercise => "exercise",
            BlockType::ExerciseAnswer => "exercise_answer",
            BlockType::Table => "table",
            BlockType::Figure => "figure",
            BlockType::FigureCaption => "figure_caption",
            BlockType::PageHeader => "page_header",
            BlockType::PageFooter => "page_footer",
        }
    }

    /// Parse a string tag, returning `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let bt = match tag {
            "heading1" => BlockType::Heading1,
            "heading2" => BlockType::Heading2,
            "heading3" => BlockType::Heading3,
            "body" => BlockType::Body,
            "code" => BlockType::Code,
            "code_repl" => BlockType::CodeRepl,
            "note" => BlockType::Note,
            "warning" => BlockType::Warning,
            "tip" => BlockType::Tip,
            "list_item" => BlockType::ListItem,
            "exercise" => BlockType::Exercise,
            "exercise_answer" => BlockType::ExerciseAnswer,
            "table" => BlockType::Table,
            "figure" => BlockType::Figure,
            "figure_caption" => BlockType::FigureCaption,
            "page_header" => BlockType::PageHeader,
            "page_footer" => BlockType::PageFooter,
            _ => return None,
        };
        Some(bt)
    }

    pub fn is_code(&self) -> bool {
        matches!(self, BlockType::Code | BlockType::CodeRepl)
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Heading level for heading types, `None` for everything else.
    pub fn heading_level(&self) -> Option<HeadingLevel> {
        match self {
            BlockType::Heading1 => Some(HeadingLevel::H1),
            BlockType::Heading2 => Some(HeadingLevel::H2),
            BlockType::Heading3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }
}

impl From<String> for BlockType {
    fn from(tag: String) -> Self {
        BlockType::from_tag(&tag).unwrap_or_else(|| {
            log::warn!("Unknown block_type {:?}, defaulting to body", tag);
            BlockType::Body
        })
    }
}

impl From<BlockType> for String {
    fn from(bt: BlockType) -> Self {
        bt.as_str().to_string()
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: Self = HeadingLevel(1);
    pub const H2: Self = HeadingLevel(2);
    pub const H3: Self = HeadingLevel(3);

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = InvalidHeadingLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&value) {
            Ok(HeadingLevel(value))
        } else {
            Err(InvalidHeadingLevel)
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// One classified unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_type: BlockType,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub page_num: usize,
    #[serde(default)]
    pub font_size: f32,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_monospace: bool,
    /// `code_N` / `heading_N` for code and heading blocks, empty otherwise.
    #[serde(default)]
    pub block_id: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Block {
    pub fn new(block_type: BlockType, text: impl Into<String>, page_num: usize) -> Self {
        Block {
            block_type,
            text: text.into(),
            page_num,
            font_size: 0.0,
            is_bold: false,
            is_monospace: false,
            block_id: String::new(),
            language: default_language(),
        }
    }
}

/// One node of a chapter's heading hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub level: HeadingLevel,
    pub page_num: usize,
    /// Index of the anchoring heading within the owning chapter's blocks.
    pub block_index: usize,
    #[serde(default)]
    pub children: Vec<Section>,
}

impl Section {
    /// Depth-first, pre-order traversal of this section and its descendants.
    pub fn walk(&self) -> Vec<&Section> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_num: u32,
    pub title: String,
    pub start_page: usize,
    pub end_page: usize,
    #[serde(default)]
    pub content_blocks: Vec<Block>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn code_blocks(&self) -> impl Iterator<Item = &Block> {
        self.content_blocks
            .iter()
            .filter(|b| b.block_type.is_code())
    }
}

/// A parsed book: the unit that is persisted and handed to presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub pdf_path: String,
    #[serde(default)]
    pub profile_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn chapter(&self, num: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.chapter_num == num)
    }

    pub fn block_count(&self) -> usize {
        self.chapters.iter().map(|c| c.content_blocks.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a book. Caches written before `language` was recorded get it
    /// from the named profile, falling back to the default language.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let mut book: Book = serde_json::from_str(data)?;
        if book.language.is_empty() {
            book.language = crate::profile::Profile::named(&book.profile_name)
                .map(|p| p.language().to_string())
                .unwrap_or_else(default_language);
        }
        Ok(book)
    }
}

#[derive(Debug, Error)]
#[error("Heading level must be between 1 and 3")]
pub struct InvalidHeadingLevel;
