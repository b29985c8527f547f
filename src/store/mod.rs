//! On-disk cache of daily and hourly record sets
//!
//! Every entry is a CSV file in one directory, named by its [`CacheKey`].
//! Writes go to a temporary file in the same directory and are renamed into
//! place, so readers only ever see a complete previous or complete new file.

pub mod key;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use tempfile::NamedTempFile;
use tracing::{debug, instrument, warn};

use crate::models::Record;
use crate::{Result, WeatherError};

pub use crate::models::Granularity;
pub use key::{CacheKey, KeyParseError};

/// One file found in the cache directory
#[derive(Debug)]
pub struct StoredEntry {
    pub path: PathBuf,
    /// Parsed key, or why the file name could not be parsed
    pub key: std::result::Result<CacheKey, KeyParseError>,
}

/// Directory-backed store of CSV record sets
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Io`] if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// True iff a readable entry exists for exactly this key
    #[must_use]
    pub fn exists(&self, key: &CacheKey) -> bool {
        let path = self.path_for(key);
        path.is_file() && File::open(&path).is_ok()
    }

    /// Load the records stored under `key`.
    ///
    /// # Errors
    ///
    /// [`WeatherError::CacheMiss`] if there is no entry,
    /// [`WeatherError::CacheCorrupt`] if the entry cannot be parsed as `R`.
    #[instrument(name = "load_cache", level = "debug", skip(self), fields(key = %key))]
    pub fn load<R: Record>(&self, key: &CacheKey) -> Result<Vec<R>> {
        if key.granularity != R::GRANULARITY {
            return Err(WeatherError::cache_corrupt(
                key.file_name(),
                format!("{} key read as {} records", key.granularity, R::GRANULARITY),
            ));
        }

        let file = match File::open(self.path_for(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache entry not found");
                return Err(WeatherError::CacheMiss {
                    key: key.file_name(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let header = reader
            .headers()
            .map_err(|e| WeatherError::cache_corrupt(key.file_name(), e.to_string()))?;
        if !header.iter().eq(R::COLUMNS.iter().copied()) {
            warn!("Cache entry has unexpected columns: {:?}", header);
            return Err(WeatherError::cache_corrupt(
                key.file_name(),
                format!("unexpected columns {header:?}"),
            ));
        }

        let records = reader
            .deserialize::<R>()
            .collect::<std::result::Result<Vec<R>, csv::Error>>()
            .map_err(|e| {
                warn!("Cache entry unreadable: {}", e);
                WeatherError::cache_corrupt(key.file_name(), e.to_string())
            })?;

        debug!("Loaded {} records", records.len());
        Ok(records)
    }

    /// Store `records` under `key`, replacing any previous entry atomically.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Io`] if the entry cannot be written, and
    /// [`WeatherError::CacheCorrupt`] if `key` has the wrong granularity for `R`.
    #[instrument(name = "save_cache", level = "debug", skip(self, records), fields(key = %key, rows = records.len()))]
    pub fn save<R: Record>(&self, key: &CacheKey, records: &[R]) -> Result<()> {
        if key.granularity != R::GRANULARITY {
            return Err(WeatherError::cache_corrupt(
                key.file_name(),
                format!("{} records written to a {} key", R::GRANULARITY, key.granularity),
            ));
        }

        let mut temp = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(BufWriter::new(temp.as_file_mut()));
            writer.write_record(R::COLUMNS).map_err(csv_to_io)?;
            for record in records {
                writer.serialize(record).map_err(csv_to_io)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(self.path_for(key)).map_err(|e| e.error)?;

        debug!("Saved {} records", records.len());
        Ok(())
    }

    /// Every file in the store that looks like a cache entry.
    ///
    /// Files that cannot be listed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Config`] if the store path cannot form a valid
    /// glob pattern.
    pub fn entries(&self) -> Result<Vec<StoredEntry>> {
        let pattern = format!(
            "{}/*_data_*.csv",
            Pattern::escape(&self.root.to_string_lossy())
        );

        let paths = glob(&pattern)
            .map_err(|e| WeatherError::config(format!("Invalid cache directory pattern: {e}")))?;

        let mut entries = Vec::new();
        for path in paths {
            match path {
                Ok(path) => {
                    let key = path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .map_or_else(
                            || Err(KeyParseError::Layout(path.display().to_string())),
                            CacheKey::parse_file_name,
                        );
                    entries.push(StoredEntry { path, key });
                }
                Err(e) => warn!("Skipping unreadable cache path {}: {}", e.path().display(), e),
            }
        }
        Ok(entries)
    }
}

fn csv_to_io(err: csv::Error) -> io::Error {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => e,
        other => io::Error::other(format!("{other:?}")),
    }
}
