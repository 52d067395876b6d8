#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod book;
mod cache;
mod error;
mod parse;
mod prelude;
mod profile;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Turn extracted book text into chapters, sections, and code samples"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Directory holding parsed books
    #[clap(long, env = "SHELF_CACHE_DIR", global = true)]
    cache_dir: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "SHELF_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Detect a typographic profile from a run dump
    Profile(crate::profile::ProfileOptions),

    /// List the built-in book profiles
    Profiles,

    /// Parse a run dump into a cached book
    Parse(crate::parse::ParseOptions),

    /// Print the chapter and section outline of a cached book
    Toc(crate::book::TocOptions),

    /// Print the code samples of a cached book
    Code(crate::book::CodeOptions),

    /// Inspect or clear the book cache
    Cache(crate::cache::App),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Profile(options) => crate::profile::run(options, app.global),
        SubCommands::Profiles => crate::profile::list(app.global),
        SubCommands::Parse(options) => crate::parse::run(options, app.global),
        SubCommands::Toc(options) => crate::book::toc(options, app.global),
        SubCommands::Code(options) => crate::book::code(options, app.global),
        SubCommands::Cache(sub_app) => crate::cache::run(sub_app, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
