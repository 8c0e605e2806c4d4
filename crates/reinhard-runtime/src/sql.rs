//! SQL script cache and schema bootstrap.
//!
//! Scripts live as `*.sql` files under a directory tree and are addressed by
//! file stem: `sql/starboard/find_starboard_channel.sql` becomes
//! `find_starboard_channel`. The `schema` script is executed once at startup.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use reinhard_framework::BoxError;

/// Name of the script run by [`initialise_schema`].
pub const SCHEMA_SCRIPT: &str = "schema";

/// Errors from loading or running SQL scripts.
#[derive(Debug, Error)]
pub enum SqlError {
    /// An explicitly loaded file without the `.sql` extension.
    #[error("File must be of type 'sql': {0}")]
    NotSql(PathBuf),

    /// Two files share a stem.
    #[error("Script '{0}' already loaded")]
    Duplicate(String),

    /// Lookup of a script that was never loaded.
    #[error("Unable to get not loaded script '{0}'")]
    NotLoaded(String),

    /// Reading a file or directory failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The schema script failed to run.
    #[error("Failed to initialise database: {0}")]
    Schema(#[source] BoxError),
}

/// Result type for SQL script operations.
pub type SqlResult<T> = Result<T, SqlError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SqlError + '_ {
    move |source| SqlError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Named SQL scripts loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct CachedScripts {
    scripts: HashMap<String, String>,
}

impl CachedScripts {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.sql` file under `root`, recursively.
    pub fn from_dir(root: impl AsRef<Path>) -> SqlResult<Self> {
        let mut scripts = Self::new();
        scripts.load_all_sql_files(root)?;
        Ok(scripts)
    }

    /// Loads one script, keyed by its file stem.
    pub fn load_sql_file(&mut self, path: impl AsRef<Path>) -> SqlResult<()> {
        let path = path.as_ref();
        if !is_sql_file(path) {
            return Err(SqlError::NotSql(path.to_path_buf()));
        }

        let Some(name) = path.file_stem().and_then(OsStr::to_str) else {
            return Err(SqlError::NotSql(path.to_path_buf()));
        };
        if self.scripts.contains_key(name) {
            return Err(SqlError::Duplicate(name.to_owned()));
        }

        let script = fs::read_to_string(path).map_err(io_error(path))?;
        debug!(script = name, path = %path.display(), "Loaded SQL script");
        self.scripts.insert(name.to_owned(), script);
        Ok(())
    }

    /// Loads every `*.sql` file under `root`; other files are skipped.
    pub fn load_all_sql_files(&mut self, root: impl AsRef<Path>) -> SqlResult<()> {
        let root = root.as_ref();
        let mut entries = fs::read_dir(root)
            .map_err(io_error(root))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()
            .map_err(io_error(root))?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.load_all_sql_files(&path)?;
            } else if is_sql_file(&path) {
                self.load_sql_file(&path)?;
            }
        }
        Ok(())
    }

    /// Returns a loaded script.
    pub fn get(&self, name: &str) -> SqlResult<&str> {
        self.scripts
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SqlError::NotLoaded(name.to_owned()))
    }

    /// Returns the schema script.
    pub fn schema(&self) -> SqlResult<&str> {
        self.get(SCHEMA_SCRIPT)
    }

    /// Returns every loaded script name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

/// Runs SQL against the bot's database.
///
/// The runtime never talks to a database itself; the host application
/// provides the connection through this trait.
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    /// Executes a script, possibly containing several statements.
    async fn execute(&self, script: &str) -> Result<(), BoxError>;
}

/// Creates the database schema if it is not already present.
pub async fn initialise_schema(
    scripts: &CachedScripts,
    executor: &dyn SchemaExecutor,
) -> SqlResult<()> {
    let schema = scripts.schema()?;
    if let Err(e) = executor.execute(schema).await {
        error!(error = %e, "Schema initialisation failed");
        return Err(SqlError::Schema(e));
    }
    info!("Database schema initialised");
    Ok(())
}
