use std::collections::BTreeMap;

use crate::profile::Profile;
use crate::types::{Block, BlockType, Chapter, Section};

/// A largest heading size seen at most this often marks part titles, not
/// chapters.
const RARE_TITLE_COUNT: usize = 10;

/// Pattern and size-tier chapter counts may differ by this much before the
/// size-tier result is preferred.
const MAX_DETECTOR_DISAGREEMENT: usize = 3;

/// Title of the synthetic chapter used when no chapter starts are found.
const FALLBACK_CHAPTER_TITLE: &str = "Content";

#[derive(Debug, Clone, PartialEq)]
struct ChapterStart {
    index: usize,
    chapter_num: u32,
    title: String,
}

/// Partitions a consolidated block sequence into chapters and builds each
/// chapter's section forest.
pub struct StructureBuilder<'a> {
    profile: &'a Profile,
}

impl<'a> StructureBuilder<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        StructureBuilder { profile }
    }

    /// Split `blocks` into chapters.
    ///
    /// Two detectors run independently: the profile's chapter-title pattern and
    /// the heading size tier. When both find chapters and roughly agree, the
    /// pattern wins for its cleaner numbering; a wide disagreement favors the
    /// size tier. With no chapter starts at all, everything becomes a single
    /// chapter. Blocks ahead of the first start belong to the first chapter.
    pub fn detect_chapters(&self, blocks: Vec<Block>) -> Vec<Chapter> {
        if blocks.is_empty() {
            return Vec::new();
        }

        let by_pattern = self.detect_by_pattern(&blocks);
        let by_size = detect_by_size(&blocks);

        let starts = match (by_pattern.is_empty(), by_size.is_empty()) {
            (false, false) => {
                if by_pattern.len().abs_diff(by_size.len()) <= MAX_DETECTOR_DISAGREEMENT {
                    log::info!(
                        "Chapters by title pattern: {} (size tier found {})",
                        by_pattern.len(),
                        by_size.len()
                    );
                    by_pattern
                } else {
                    log::info!(
                        "Chapters by heading size: {} (title pattern found {})",
                        by_size.len(),
                        by_pattern.len()
                    );
                    by_size
                }
            }
            (false, true) => by_pattern,
            (true, false) => by_size,
            (true, true) => {
                log::warn!("No chapters detected, treating all content as one chapter");
                vec![ChapterStart {
                    index: 0,
                    chapter_num: 1,
                    title: FALLBACK_CHAPTER_TITLE.to_string(),
                }]
            }
        };

        partition(blocks, starts)
    }

    fn detect_by_pattern(&self, blocks: &[Block]) -> Vec<ChapterStart> {
        let pattern = self.profile.chapter_regex();
        blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| is_chapter_candidate(b))
            .filter_map(|(index, block)| {
                let title = block.text.trim();
                let caps = pattern.captures(title)?;
                let chapter_num = caps.get(1)?.as_str().parse::<u32>().ok()?;
                Some(ChapterStart {
                    index,
                    chapter_num,
                    title: title.to_string(),
                })
            })
            .collect()
    }
}

fn is_chapter_candidate(block: &Block) -> bool {
    matches!(block.block_type, BlockType::Heading1 | BlockType::Heading2)
}

fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

/// Chapter starts from heading font sizes alone, numbered in document order.
fn detect_by_size(blocks: &[Block]) -> Vec<ChapterStart> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for block in blocks {
        if is_chapter_candidate(block) && block.font_size > 0.0 {
            *counts.entry(size_key(block.font_size)).or_insert(0) += 1;
        }
    }

    let mut sizes = counts.iter().rev();
    let Some((&largest, &largest_count)) = sizes.next() else {
        return Vec::new();
    };
    let chapter_size = match sizes.next() {
        Some((&second, _)) if largest_count <= RARE_TITLE_COUNT => second,
        _ => largest,
    };

    blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| {
            is_chapter_candidate(b) && b.font_size > 0.0 && size_key(b.font_size) == chapter_size
        })
        .zip(1u32..)
        .map(|((index, block), chapter_num)| ChapterStart {
            index,
            chapter_num,
            title: block.text.trim().to_string(),
        })
        .collect()
}

/// Cut `blocks` at each start index. The first chapter also takes any
/// leading blocks so every block lands in exactly one chapter.
fn partition(mut blocks: Vec<Block>, starts: Vec<ChapterStart>) -> Vec<Chapter> {
    let mut chapters = Vec::with_capacity(starts.len());
    for (i, start) in starts.into_iter().enumerate().rev() {
        let from = if i == 0 { 0 } else { start.index };
        let content = blocks.split_off(from);
        chapters.push(build_chapter(start.chapter_num, start.title, content));
    }
    chapters.reverse();
    chapters
}

fn build_chapter(chapter_num: u32, title: String, content_blocks: Vec<Block>) -> Chapter {
    let start_page = content_blocks.first().map_or(0, |b| b.page_num);
    let end_page = content_blocks.last().map_or(0, |b| b.page_num);
    let sections = detect_sections(&content_blocks);
    Chapter {
        chapter_num,
        title,
        start_page,
        end_page,
        content_blocks,
        sections,
    }
}

/// Build the section forest for one chapter's blocks.
///
/// Each heading closes every open section at its own level or deeper; a
/// closed section is attached to the section beneath it on the stack, or
/// becomes a top-level entry. `block_index` is relative to `blocks`.
pub fn detect_sections(blocks: &[Block]) -> Vec<Section> {
    let mut stack: Vec<Section> = Vec::new();
    let mut roots: Vec<Section> = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        let Some(level) = block.block_type.heading_level() else {
            continue;
        };

        while stack.last().is_some_and(|top| top.level >= level) {
            close_top(&mut stack, &mut roots);
        }

        stack.push(Section {
            title: block.text.trim().to_string(),
            level,
            page_num: block.page_num,
            block_index: index,
            children: Vec::new(),
        });
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

fn close_top(stack: &mut Vec<Section>, roots: &mut Vec<Section>) {
    if let Some(finished) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(finished),
            None => roots.push(finished),
        }
    }
}

/// Flatten a section forest into `(depth, section)` pairs, depth-first.
pub fn flatten_sections(sections: &[Section]) -> Vec<(usize, &Section)> {
    fn visit<'s>(section: &'s Section, depth: usize, out: &mut Vec<(usize, &'s Section)>) {
        out.push((depth, section));
        for child in &section.children {
            visit(child, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    for section in sections {
        visit(section, 0, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileConfig;
    use crate::types::HeadingLevel;

    fn make_block(block_type: BlockType, text: &str, size: f32, page: usize) -> Block {
        let mut block = Block::new(block_type, text, page);
        block.font_size = size;
        block
    }

    fn body(text: &str, page: usize) -> Block {
        make_block(BlockType::Body, text, 10.0, page)
    }

    fn profile_with_pattern(pattern: &str) -> Profile {
        Profile::from_config(ProfileConfig {
            chapter_pattern: pattern.to_string(),
            ..ProfileConfig::default()
        })
    }

    #[test]
    fn test_detects_chapters_by_pattern() {
        let profile = profile_with_pattern(r"^Chapter\s+(\d+)");
        let blocks = vec![
            make_block(BlockType::Heading1, "Chapter 1: Intro", 22.0, 0),
            body("a", 1),
            make_block(BlockType::Heading1, "Chapter 2: Types", 22.0, 2),
            body("b", 3),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].chapter_num, 1);
        assert_eq!(chapters[0].title, "Chapter 1: Intro");
        assert_eq!(chapters[1].chapter_num, 2);

        let texts = |c: &Chapter| c.content_blocks.iter().map(|b| b.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts(&chapters[0]), vec!["Chapter 1: Intro", "a"]);
        assert_eq!(texts(&chapters[1]), vec!["Chapter 2: Types", "b"]);
        assert_eq!((chapters[0].start_page, chapters[0].end_page), (0, 1));
        assert_eq!((chapters[1].start_page, chapters[1].end_page), (2, 3));
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        let profile = profile_with_pattern(r"^Chapter\s+(\d+)");
        let blocks = vec![
            make_block(BlockType::Heading2, "CHAPTER 7. Files", 16.0, 0),
            body("a", 0),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters[0].chapter_num, 7);
    }

    #[test]
    fn test_detects_chapters_by_size() {
        let profile = profile_with_pattern(r"^ZZZZZ(\d+)");
        let blocks = vec![
            make_block(BlockType::Heading1, "First Part", 22.0, 1),
            body("Content", 2),
            make_block(BlockType::Heading1, "Second Part", 22.0, 20),
            body("More content", 21),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].chapter_num, 1);
        assert_eq!(chapters[1].chapter_num, 2);
        assert_eq!(chapters[1].title, "Second Part");
    }

    #[test]
    fn test_rare_largest_size_uses_second_tier() {
        let profile = profile_with_pattern(r"^ZZZZZ(\d+)");
        let blocks = vec![
            make_block(BlockType::Heading1, "Part I", 30.0, 0),
            make_block(BlockType::Heading1, "Getting Started", 22.0, 1),
            body("a", 1),
            make_block(BlockType::Heading1, "Types", 22.0, 5),
            body("b", 5),
            make_block(BlockType::Heading2, "Lists", 15.0, 6),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Getting Started");
        // The part title folds into the first chapter.
        assert_eq!(chapters[0].content_blocks[0].text, "Part I");
        assert_eq!(chapters[0].content_blocks.len(), 3);
        assert_eq!(chapters[1].content_blocks.len(), 3);
    }

    #[test]
    fn test_frequent_largest_size_marks_chapters() {
        let profile = profile_with_pattern(r"^ZZZZZ(\d+)");
        let mut blocks = Vec::new();
        for i in 0..11 {
            blocks.push(make_block(BlockType::Heading1, &format!("Title {i}"), 24.0, i));
            blocks.push(make_block(BlockType::Heading2, "Sub", 16.0, i));
        }
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 11);
        assert_eq!(chapters[10].chapter_num, 11);
    }

    #[test]
    fn test_reconcile_prefers_size_on_wide_disagreement() {
        let profile = profile_with_pattern(r"^Chapter\s+(\d+)");
        let mut blocks = vec![make_block(BlockType::Heading1, "Chapter 1: Only", 22.0, 0)];
        for i in 0..6 {
            blocks.push(make_block(BlockType::Heading1, &format!("Untitled {i}"), 22.0, i + 1));
            blocks.push(body("x", i + 1));
        }
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 7);
        assert_eq!(chapters[6].chapter_num, 7);
    }

    #[test]
    fn test_reconcile_prefers_pattern_on_close_counts() {
        let profile = profile_with_pattern(r"^Chapter\s+(\d+)");
        let blocks = vec![
            make_block(BlockType::Heading1, "Preface", 22.0, 0),
            make_block(BlockType::Heading1, "Chapter 3: Three", 22.0, 1),
            body("x", 1),
            make_block(BlockType::Heading1, "Chapter 4: Four", 22.0, 2),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        let nums: Vec<u32> = chapters.iter().map(|c| c.chapter_num).collect();
        assert_eq!(nums, vec![3, 4]);
        assert_eq!(chapters[0].content_blocks[0].text, "Preface");
    }

    #[test]
    fn test_empty_blocks() {
        let profile = Profile::default();
        assert!(StructureBuilder::new(&profile).detect_chapters(Vec::new()).is_empty());
    }

    #[test]
    fn test_no_headings_single_chapter() {
        let profile = Profile::default();
        let blocks = vec![
            body("Just body text", 4),
            make_block(BlockType::Code, "print('hi')", 9.0, 5),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].chapter_num, 1);
        assert_eq!(chapters[0].title, "Content");
        assert_eq!(chapters[0].content_blocks.len(), 2);
        assert_eq!((chapters[0].start_page, chapters[0].end_page), (4, 5));
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        let profile = profile_with_pattern(r"^Chapter(\d+");
        let blocks = vec![
            make_block(BlockType::Heading1, "Chapter 1: A", 22.0, 0),
            make_block(BlockType::Heading1, "Chapter 2: B", 22.0, 1),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[1].chapter_num, 2);
    }

    #[test]
    fn test_sections_nest() {
        let blocks = vec![
            make_block(BlockType::Heading1, "Title", 22.0, 0),
            body("a", 0),
            make_block(BlockType::Heading2, "Section A", 15.0, 0),
            body("b", 0),
            make_block(BlockType::Heading3, "Subsection A.1", 12.5, 1),
            body("c", 1),
        ];
        let sections = detect_sections(&blocks);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Title");
        assert_eq!(sections[0].children.len(), 1);
        let h2 = &sections[0].children[0];
        assert_eq!(h2.title, "Section A");
        assert_eq!(h2.block_index, 2);
        assert_eq!(h2.children.len(), 1);
        assert_eq!(h2.children[0].title, "Subsection A.1");
        assert_eq!(h2.children[0].level, HeadingLevel::H3);
        assert_eq!(h2.children[0].page_num, 1);
    }

    #[test]
    fn test_sections_siblings_and_reset() {
        let blocks = vec![
            make_block(BlockType::Heading2, "Orphan", 15.0, 0),
            make_block(BlockType::Heading3, "Orphan child", 12.5, 0),
            make_block(BlockType::Heading1, "Top", 22.0, 0),
            make_block(BlockType::Heading3, "Deep", 12.5, 0),
            make_block(BlockType::Heading2, "Mid", 15.0, 0),
            make_block(BlockType::Heading2, "Mid 2", 15.0, 0),
        ];
        let sections = detect_sections(&blocks);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Orphan", "Top"]);
        assert_eq!(sections[0].children[0].title, "Orphan child");
        let children: Vec<&str> = sections[1].children.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(children, vec!["Deep", "Mid", "Mid 2"]);
        assert_eq!(sections[1].level, HeadingLevel::H1);
    }

    #[test]
    fn test_section_block_index_is_chapter_local() {
        let profile = profile_with_pattern(r"^Chapter\s+(\d+)");
        let blocks = vec![
            make_block(BlockType::Heading1, "Chapter 1: A", 22.0, 0),
            body("a", 0),
            make_block(BlockType::Heading1, "Chapter 2: B", 22.0, 1),
            body("b", 1),
            make_block(BlockType::Heading2, "Inner", 15.0, 1),
        ];
        let chapters = StructureBuilder::new(&profile).detect_chapters(blocks);
        let second = &chapters[1];
        assert_eq!(second.sections[0].block_index, 0);
        assert_eq!(second.sections[0].children[0].block_index, 2);
    }

    #[test]
    fn test_flatten_sections() {
        let blocks = vec![
            make_block(BlockType::Heading1, "A", 22.0, 0),
            make_block(BlockType::Heading2, "B", 15.0, 0),
            make_block(BlockType::Heading1, "C", 22.0, 0),
        ];
        let sections = detect_sections(&blocks);
        let flat: Vec<(usize, &str)> = flatten_sections(&sections)
            .into_iter()
            .map(|(d, s)| (d, s.title.as_str()))
            .collect();
        assert_eq!(flat, vec![(0, "A"), (1, "B"), (0, "C")]);
    }
}
