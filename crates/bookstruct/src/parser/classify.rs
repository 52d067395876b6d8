//! Classification of text runs into typed [`Block`]s.
//!
//! ```text
//! TextRun[] -> classify_span -> accumulate same-type runs -> flush
//!           -> promote (list item / note / warning / tip / REPL)
//!           -> interleave figures
//! ```

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::profile::Profile;
use crate::text::{detect_repl_code, is_page_header_or_footer, rejoin_hyphenation};
use crate::types::{Block, BlockType, PageImage, TextRun};

/// Two runs whose tops differ by less than this sit on the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Horizontal gap (points) above which same-line code runs are space-separated.
const MIN_WORD_GAP: f32 = 1.0;

/// Classifies the runs of a book against one [`Profile`].
pub struct BlockClassifier<'a> {
    profile: &'a Profile,
}

/// A block being accumulated from consecutive runs of the same type.
struct Pending {
    block_type: BlockType,
    text: String,
    font_size: f32,
    is_bold: bool,
    is_monospace: bool,
    last_top: f32,
    last_right: f32,
}

impl Pending {
    fn start(block_type: BlockType, run: &TextRun) -> Self {
        Pending {
            block_type,
            text: run.text.clone(),
            font_size: run.font_size,
            is_bold: run.is_bold,
            is_monospace: run.is_monospace,
            last_top: run.bbox.y0,
            last_right: run.bbox.x1,
        }
    }

    /// Code keeps its line structure: a run on a new visual line starts a new
    /// line of text. Prose is joined with single spaces.
    fn push(&mut self, run: &TextRun) {
        if self.block_type == BlockType::Code {
            if (run.bbox.y0 - self.last_top).abs() > Y_TOLERANCE {
                self.text.push('\n');
            } else if run.bbox.x0 - self.last_right > MIN_WORD_GAP {
                self.text.push(' ');
            }
        } else {
            self.text.push(' ');
        }
        self.text.push_str(&run.text);
        self.last_top = run.bbox.y0;
        self.last_right = run.bbox.x1;
    }
}

impl<'a> BlockClassifier<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        BlockClassifier { profile }
    }

    /// Block type for a single run. Monospace forces code; the H1 threshold
    /// alone makes a heading, H2 and H3 additionally require bold.
    pub fn classify_span(&self, run: &TextRun) -> BlockType {
        let p = self.profile;
        if run.is_monospace {
            BlockType::Code
        } else if run.font_size >= p.h1_min() {
            BlockType::Heading1
        } else if run.font_size >= p.h2_min() && run.is_bold {
            BlockType::Heading2
        } else if run.font_size >= p.h3_min() && run.is_bold {
            BlockType::Heading3
        } else {
            BlockType::Body
        }
    }

    /// Convert one page's runs into blocks, merging adjacent same-type runs.
    pub fn classify_page_spans(&self, runs: &[TextRun], page_num: usize) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut pending: Option<Pending> = None;

        for run in runs {
            let run_type = self.classify_span(run);
            match pending.as_mut() {
                Some(p) if p.block_type == run_type => p.push(run),
                _ => {
                    if let Some(done) = pending.take() {
                        self.flush(done, page_num, &mut blocks);
                    }
                    pending = Some(Pending::start(run_type, run));
                }
            }
        }
        if let Some(done) = pending {
            self.flush(done, page_num, &mut blocks);
        }

        for block in &mut blocks {
            promote(block);
        }

        log::debug!("Page {}: {} runs -> {} blocks", page_num, runs.len(), blocks.len());
        blocks
    }

    /// Classify many pages into one flat, page-ordered sequence. Page `i` is
    /// numbered `start_page_offset + i`. When image metadata is supplied,
    /// figure blocks are interleaved with each page's text blocks.
    pub fn classify_all_pages(
        &self,
        pages: &[Vec<TextRun>],
        start_page_offset: usize,
        page_images: Option<&BTreeMap<usize, Vec<PageImage>>>,
    ) -> Vec<Block> {
        let mut all_blocks = Vec::new();
        for (i, runs) in pages.iter().enumerate() {
            let page_num = start_page_offset + i;
            let blocks = self.classify_page_spans(runs, page_num);
            match page_images.and_then(|m| m.get(&page_num)) {
                Some(images) if !images.is_empty() => {
                    all_blocks.extend(self.interleave_figures(blocks, images, page_num))
                }
                _ => all_blocks.extend(blocks),
            }
        }
        all_blocks
    }

    /// Merged blocks carry no coordinates, so block `i` of `n` is placed at
    /// `(i + 0.5) / n` down the page. Images above that estimate go before it;
    /// the rest follow the page's last block.
    fn interleave_figures(
        &self,
        blocks: Vec<Block>,
        images: &[PageImage],
        page_num: usize,
    ) -> Vec<Block> {
        let mut images: Vec<&PageImage> = images.iter().collect();
        images.sort_by(|a, b| a.y.total_cmp(&b.y));
        let mut images = images.into_iter().peekable();

        let n = blocks.len();
        let mut out = Vec::with_capacity(n + images.len());
        for (i, block) in blocks.into_iter().enumerate() {
            let estimate = (i as f32 + 0.5) / n as f32;
            while let Some(img) = images.next_if(|img| img.y < estimate) {
                out.push(self.figure_block(img, page_num));
            }
            out.push(block);
        }
        out.extend(images.map(|img| self.figure_block(img, page_num)));
        out
    }

    fn figure_block(&self, image: &PageImage, page_num: usize) -> Block {
        let mut block = Block::new(BlockType::Figure, image.filename.clone(), page_num);
        block.language = self.profile.language().to_string();
        block
    }

    fn flush(&self, pending: Pending, page_num: usize, blocks: &mut Vec<Block>) {
        let text = if pending.block_type == BlockType::Code {
            pending.text
        } else {
            rejoin_hyphenation(&pending.text)
        };
        if is_page_header_or_footer(&text) {
            return;
        }
        blocks.push(Block {
            block_type: pending.block_type,
            text,
            page_num,
            font_size: pending.font_size,
            is_bold: pending.is_bold,
            is_monospace: pending.is_monospace,
            block_id: String::new(),
            language: self.profile.language().to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Promotion to specialized block types
// ---------------------------------------------------------------------------

fn promote(block: &mut Block) {
    match block.block_type {
        BlockType::Body => {
            if let Some((block_type, rest)) = callout(&block.text) {
                block.block_type = block_type;
                block.text = rest;
            } else if is_list_item(&block.text) {
                block.block_type = BlockType::ListItem;
            }
        }
        BlockType::Code if detect_repl_code(&block.text) => {
            block.block_type = BlockType::CodeRepl;
        }
        _ => {}
    }
}

/// Recognize `Note:`, `Warning.`, `Caution -`, `Tip` labels. Returns the
/// callout type and the text with the label stripped.
fn callout(text: &str) -> Option<(BlockType, String)> {
    static RE_CALLOUT: OnceLock<Regex> = OnceLock::new();
    let re = RE_CALLOUT.get_or_init(|| {
        Regex::new(r"(?is)^\s*(note|warning|caution|tip)\b\s*[:.\-]*\s*(.*)$").unwrap()
    });

    let caps = re.captures(text)?;
    let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
    if rest.is_empty() {
        return None;
    }
    let block_type = match caps[1].to_lowercase().as_str() {
        "note" => BlockType::Note,
        "tip" => BlockType::Tip,
        _ => BlockType::Warning,
    };
    Some((block_type, rest.to_string()))
}

/// Detect whether text starts with a bullet, dash, or enumeration marker.
fn is_list_item(text: &str) -> bool {
    let trimmed = text.trim_start();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };

    if matches!(
        first,
        '\u{2022}' | '\u{2023}' | '\u{25E6}' | '\u{2043}' | '\u{2219}' | '\u{25AA}' | '\u{25CF}'
    ) {
        return true;
    }

    if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("\u{2013} ") {
        return true;
    }

    // "(a)" / "(1)"
    if let Some(inner) = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(inner, _)| inner)
    {
        if !inner.is_empty()
            && inner.len() <= 3
            && inner.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return true;
        }
    }

    // "1." / "2)" / "a." followed by a space.
    if let Some(pos) = trimmed.find(['.', ')']) {
        if pos > 0 && pos <= 3 {
            let prefix = &trimmed[..pos];
            let numbered = prefix.chars().all(|c| c.is_ascii_digit());
            let lettered = prefix.len() == 1 && prefix.chars().all(|c| c.is_ascii_lowercase());
            if (numbered || lettered) && trimmed[pos + 1..].starts_with(' ') {
                return true;
            }
        }
    }

    false
}
