use bookstruct::text::strip_repl_prompts;
use bookstruct::tree::flatten_sections;
use bookstruct::{Block, BlockType, Book, BookStore, Chapter, CodeConsolidator};

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct TocOptions {
    /// Book identifier
    pub book_id: String,

    /// Print the outline as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct CodeOptions {
    /// Book identifier
    pub book_id: String,

    /// Only this chapter
    #[arg(long)]
    pub chapter: Option<u32>,

    /// Only complete snippets, with interpreter prompts and output removed
    #[arg(long)]
    pub runnable: bool,
}

fn load_book(book_id: &str, global: &crate::Global) -> Result<Book> {
    let store = crate::cache::open_store(global)?;
    store
        .load(book_id)
        .map_err(|e| eyre!(e))?
        .ok_or_else(|| eyre!(Error::BookNotFound(book_id.to_string())))
}

/// Chapter outline without block content.
fn outline(book: &Book) -> Vec<serde_json::Value> {
    book.chapters
        .iter()
        .map(|c| {
            serde_json::json!({
                "chapter_num": c.chapter_num,
                "title": c.title,
                "start_page": c.start_page,
                "end_page": c.end_page,
                "sections": c.sections,
            })
        })
        .collect()
}

pub fn toc(options: TocOptions, global: crate::Global) -> Result<()> {
    let book = load_book(&options.book_id, &global)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outline(&book))?);
        return Ok(());
    }

    println!("{}", book.title.bold());
    let mut table = titled_table(&["Ch", "Title", "Pages", "Blocks", "Code"]);
    for chapter in &book.chapters {
        table.add_row(prettytable::row![
            chapter.chapter_num.to_string().green(),
            chapter.title.bright_white(),
            f!("{}-{}", chapter.start_page, chapter.end_page),
            chapter.content_blocks.len(),
            chapter.code_blocks().count()
        ]);
        for (depth, section) in flatten_sections(&chapter.sections) {
            table.add_row(prettytable::row![
                "",
                f!("{}{}", "  ".repeat(depth + 1), section.title).bright_black(),
                section.page_num,
                "",
                ""
            ]);
        }
    }
    table.printstd();
    Ok(())
}

pub fn code(options: CodeOptions, global: crate::Global) -> Result<()> {
    let book = load_book(&options.book_id, &global)?;

    let chapters: Vec<&Chapter> = match options.chapter {
        Some(num) => vec![book.chapter(num).ok_or_else(|| {
            eyre!(Error::ChapterNotFound {
                book_id: book.book_id.clone(),
                chapter: num,
            })
        })?],
        None => book.chapters.iter().collect(),
    };

    let consolidator = CodeConsolidator::new();
    let mut printed = 0;
    for chapter in chapters {
        let blocks: Vec<&Block> = if options.runnable {
            consolidator.extract_runnable_code(&chapter.content_blocks)
        } else {
            chapter.code_blocks().collect()
        };

        for block in blocks {
            let text = if options.runnable && block.block_type == BlockType::CodeRepl {
                strip_repl_prompts(&block.text)
            } else {
                block.text.clone()
            };
            println!(
                "{}",
                f!(
                    "# {} (chapter {}, page {}, {})",
                    block.block_id,
                    chapter.chapter_num,
                    block.page_num,
                    block.language
                )
                .cyan()
            );
            println!("{text}");
            println!();
            printed += 1;
        }
    }

    if global.verbose {
        eprintln!("{printed} code blocks");
    }
    Ok(())
}
