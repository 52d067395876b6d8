use std::path::{Path, PathBuf};

use bookstruct::{BookStore, JsonStore};

use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "cache")]
#[command(about = "Inspect or clear the book cache")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List cached books
    List,
    /// Remove one cached book
    Invalidate {
        /// Book identifier
        book_id: String,
    },
    /// Remove every cached book
    Clear,
}

/// Cache directory: `--cache-dir` / `SHELF_CACHE_DIR`, or `<user cache>/shelf/books`.
fn cache_dir(global: &crate::Global) -> Result<PathBuf> {
    resolve_cache_dir(global.cache_dir.as_deref(), dirs_next::cache_dir())
}

fn resolve_cache_dir(explicit: Option<&Path>, user_cache: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    Ok(user_cache.ok_or(Error::NoCacheDir)?.join("shelf").join("books"))
}

pub fn open_store(global: &crate::Global) -> Result<JsonStore> {
    let dir = cache_dir(global)?;
    let store = JsonStore::open(&dir)
        .map_err(|e| eyre!(e))
        .wrap_err_with(|| f!("Failed to open cache at {}", dir.display()))?;
    if global.verbose {
        eprintln!("Cache: {}", store.dir().display());
    }
    Ok(store)
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let store = open_store(&global)?;

    match app.command {
        Commands::List => {
            let entries = store.entries().map_err(|e| eyre!(e))?;
            if entries.is_empty() {
                println!("No cached books.");
                return Ok(());
            }
            let mut table = titled_table(&["Book", "Size (KB)", "Modified"]);
            for entry in &entries {
                table.add_row(prettytable::row![
                    entry.book_id.green(),
                    entry.size_kb,
                    entry.modified.format("%Y-%m-%d %H:%M").to_string().bright_black()
                ]);
            }
            table.printstd();
        }
        Commands::Invalidate { book_id } => {
            if store.invalidate(&book_id).map_err(|e| eyre!(e))? {
                println!("{}", f!("Removed {book_id}").green());
            } else {
                println!("{book_id} was not cached.");
            }
        }
        Commands::Clear => {
            let removed = store.invalidate_all().map_err(|e| eyre!(e))?;
            println!("{}", f!("Removed {removed} cached books").green());
        }
    }

    Ok(())
}
