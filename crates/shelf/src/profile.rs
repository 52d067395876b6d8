use std::path::PathBuf;

use bookstruct::{Profile, ProfileBuilder, ProfileOutcome, RunDump, DEFAULT_LANGUAGE};

use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Format {
    Toml,
    Json,
}

#[derive(Debug, clap::Args)]
pub struct ProfileOptions {
    /// Run dump (JSON) written by the extractor
    pub dump: PathBuf,

    /// Language tag for code samples
    #[arg(long, env = "SHELF_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Output format
    #[arg(long, value_enum, default_value = "toml")]
    pub format: Format,
}

pub fn load_dump(path: &std::path::Path) -> Result<RunDump> {
    RunDump::from_path(path)
        .map_err(|e| eyre!(e))
        .wrap_err_with(|| f!("Failed to load run dump {}", path.display()))
}

/// Detect a profile, reporting a fallback on stderr.
pub fn detect(dump: &RunDump, language: &str) -> Profile {
    let outcome = ProfileBuilder::new(dump).build(language);
    if let ProfileOutcome::Fallback { reason, .. } = &outcome {
        eprintln!(
            "{}",
            f!("Using default profile ({reason})").yellow()
        );
    }
    outcome.into_profile()
}

pub fn run(options: ProfileOptions, global: crate::Global) -> Result<()> {
    let dump = load_dump(&options.dump)?;
    if global.verbose {
        eprintln!("Pages: {}", dump.pages.len());
    }

    let profile = detect(&dump, &options.language);
    let output = match options.format {
        Format::Toml => profile.to_toml_string().map_err(|e| eyre!(e))?,
        Format::Json => serde_json::to_string_pretty(&profile)?,
    };
    println!("{output}");
    Ok(())
}

pub fn list(_global: crate::Global) -> Result<()> {
    let mut table = titled_table(&["Name", "Language", "H1", "H2", "H3", "Body", "Code"]);
    for name in Profile::preset_names() {
        let p = Profile::named(name).ok_or_eyre("preset missing")?;
        table.add_row(prettytable::row![
            name.green(),
            p.language(),
            p.h1_min(),
            p.h2_min(),
            p.h3_min(),
            p.body_size(),
            p.code_size()
        ]);
    }
    table.printstd();
    Ok(())
}
