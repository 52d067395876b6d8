use std::path::PathBuf;

use bookstruct::{
    parse_book, sanitize_book_id, BookError, BookMeta, BookStore, Profile, DEFAULT_LANGUAGE,
};

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Args)]
pub struct ParseOptions {
    /// Run dump (JSON) written by the extractor
    pub dump: PathBuf,

    /// Identifier the book is cached under
    #[arg(long)]
    pub book_id: String,

    /// Book title (defaults to the book id)
    #[arg(long)]
    pub title: Option<String>,

    /// Built-in profile name (see `shelf profiles`)
    #[arg(long, conflicts_with = "profile_file")]
    pub profile: Option<String>,

    /// Profile TOML file
    #[arg(long)]
    pub profile_file: Option<PathBuf>,

    /// Language tag for an auto-detected profile
    #[arg(long, env = "SHELF_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Re-parse even if the book is already cached
    #[arg(long)]
    pub force: bool,
}

fn resolve_profile(options: &ParseOptions, dump: &bookstruct::RunDump) -> Result<Profile> {
    if let Some(name) = &options.profile {
        return Profile::named(name).ok_or_else(|| eyre!(BookError::UnknownProfile(name.clone())));
    }
    if let Some(path) = &options.profile_file {
        let data = std::fs::read_to_string(path)
            .wrap_err_with(|| f!("Failed to read profile {}", path.display()))?;
        return Profile::from_toml_str(&data).map_err(|e| eyre!(e));
    }
    Ok(crate::profile::detect(dump, &options.language))
}

/// Book identity with the id reduced to its cache key.
fn book_meta(options: &ParseOptions) -> Result<BookMeta> {
    let book_id = sanitize_book_id(&options.book_id);
    if book_id.is_empty() {
        return Err(eyre!(BookError::InvalidBookId(options.book_id.clone())));
    }
    Ok(BookMeta {
        book_id,
        title: options.title.clone().unwrap_or_else(|| options.book_id.clone()),
        pdf_path: options.dump.display().to_string(),
    })
}

pub fn run(options: ParseOptions, global: crate::Global) -> Result<()> {
    let meta = book_meta(&options)?;
    let store = crate::cache::open_store(&global)?;
    if store.has(&meta.book_id) && !options.force {
        println!("{} is already cached. Use --force to re-parse.", meta.book_id);
        return Ok(());
    }

    let dump = crate::profile::load_dump(&options.dump)?;
    let profile = resolve_profile(&options, &dump)?;
    if global.verbose {
        eprintln!(
            "Profile {}: h1>={} h2>={} h3>={} body={} code={}",
            profile.name(),
            profile.h1_min(),
            profile.h2_min(),
            profile.h3_min(),
            profile.body_size(),
            profile.code_size()
        );
    }

    let book = parse_book(&dump, &profile, meta).map_err(|e| eyre!(e))?;
    store.save(&book).map_err(|e| eyre!(e))?;

    let code_blocks: usize = book.chapters.iter().map(|c| c.code_blocks().count()).sum();
    println!(
        "{}",
        f!(
            "Parsed {}: {} chapters, {} blocks, {} code blocks",
            book.book_id,
            book.chapters.len(),
            book.block_count(),
            code_blocks
        )
        .green()
    );
    Ok(())
}
