//! Command execution implementations

use super::Commands;
use super::ytx;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Info { path } => ytx::info(path),
            Commands::List {
                path,
                section,
                limit,
                json,
            } => ytx::list(path, *section, *limit, *json),
            Commands::Get { path, section, id } => ytx::get(path, *section, *id),
            Commands::Set {
                path,
                section,
                id,
                text,
                save,
            } => ytx::set(path, *section, *id, text, save),
            Commands::Add {
                path,
                section,
                id,
                text,
                save,
            } => ytx::add(path, *section, *id, text, save),
            Commands::Remove {
                path,
                section,
                id,
                save,
            } => ytx::remove(path, *section, *id, save),
            Commands::Search {
                path,
                query,
                case_sensitive,
                limit,
                quiet,
            } => ytx::search(path, query, *case_sensitive, *limit, *quiet),
            Commands::Stats { paths, json } => ytx::stats(paths, *json),
            Commands::Verify { path } => ytx::verify(path),
            Commands::Relocs { path } => ytx::relocs(path),
        }
    }
}
