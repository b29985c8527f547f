//! Date-based eviction of stale cache entries

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::store::{CacheKey, CacheStore};

/// An entry the sweep could not handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<CacheKey>,
    pub kept: Vec<CacheKey>,
    pub failures: Vec<SweepFailure>,
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {}, kept {}, failed {}",
            self.removed.len(),
            self.kept.len(),
            self.failures.len()
        )
    }
}

/// Removes every entry fetched before the current day
pub struct CacheJanitor {
    store: CacheStore,
}

impl CacheJanitor {
    #[must_use]
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Delete entries whose fetch date is before `today`.
    ///
    /// Entries dated today or later are kept. A file whose name cannot be
    /// parsed, or that cannot be removed, is recorded in the report and
    /// skipped.
    ///
    /// # Errors
    ///
    /// Only if the cache directory itself cannot be enumerated.
    #[instrument(name = "sweep_cache", skip(self), fields(dir = %self.store.root().display()))]
    pub fn sweep(&self, today: NaiveDate) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for entry in self.store.entries()? {
            let key = match entry.key {
                Ok(key) => key,
                Err(e) => {
                    warn!("Skipping unrecognised cache file: {}", e);
                    report.failures.push(SweepFailure {
                        path: entry.path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if key.fetch_date >= today {
                debug!("Keeping {}", key);
                report.kept.push(key);
                continue;
            }

            match fs::remove_file(&entry.path) {
                Ok(()) => {
                    info!("Removed stale cache entry {}", key);
                    report.removed.push(key);
                }
                Err(e) => {
                    warn!("Failed to remove {}: {}", entry.path.display(), e);
                    report.failures.push(SweepFailure {
                        path: entry.path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!("Cache sweep finished: {}", report);
        Ok(report)
    }
}
