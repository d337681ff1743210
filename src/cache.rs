use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{RastermarkError, RastermarkResult};

/// Freshness window for cached source files.
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Chunk size for streaming a source file into the cache.
pub const COPY_CHUNK_SIZE: usize = 8 * 1024;

/// Resolves a source path to a local, readable path, keeping a time-bounded
/// copy of (possibly remote/slow) sources under a cache directory.
///
/// The cache is best effort: entries are keyed by the source's basename and
/// re-derived from filesystem state on every load. The directory is shared
/// without locking; concurrent refreshers of the same entry interleave and
/// the last writer wins.
#[derive(Clone, Debug)]
pub struct CacheLoader {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl CacheLoader {
    /// Validate and adopt a cache directory. The directory must exist and be
    /// both readable and writable.
    pub fn new(cache_dir: impl AsRef<Path>) -> RastermarkResult<Self> {
        let cache_dir = cache_dir.as_ref();

        let meta = fs::metadata(cache_dir).map_err(|_| {
            RastermarkError::invalid_config(format!(
                "cache directory at \"{}\" could not be found",
                cache_dir.display()
            ))
        })?;
        if !meta.is_dir() {
            return Err(RastermarkError::invalid_config(format!(
                "cache directory at \"{}\" could not be found",
                cache_dir.display()
            )));
        }
        if fs::read_dir(cache_dir).is_err() {
            return Err(RastermarkError::invalid_config(format!(
                "cache directory at \"{}\" is not readable",
                cache_dir.display()
            )));
        }
        if meta.permissions().readonly() {
            return Err(RastermarkError::invalid_config(format!(
                "cache directory at \"{}\" is not writable",
                cache_dir.display()
            )));
        }

        let cache_dir = fs::canonicalize(cache_dir).unwrap_or_else(|_| cache_dir.to_path_buf());
        Ok(Self {
            cache_dir,
            ttl: CACHE_TTL,
        })
    }

    /// Override the freshness window. Production callers keep [`CACHE_TTL`].
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache location for a source: `<cache_dir>/<basename(source)>`.
    pub fn cache_path(&self, source: &Path) -> RastermarkResult<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            RastermarkError::invalid_config(format!(
                "source path \"{}\" has no file name to cache under",
                source.display()
            ))
        })?;
        Ok(self.cache_dir.join(name))
    }

    /// Resolve `source` to the path that should actually be read.
    ///
    /// A stale or missing cache entry is refreshed by stream-copying the
    /// source; the cache path is returned when the entry is fresh afterwards,
    /// otherwise the original source path. This is a single deterministic
    /// refresh-then-recheck sequence, not a retry loop.
    #[tracing::instrument(skip(self), fields(cache_dir = %self.cache_dir.display()))]
    pub fn resolve(&self, source: &Path) -> RastermarkResult<PathBuf> {
        let cache_path = self.cache_path(source)?;
        let now = SystemTime::now();

        if !self.is_fresh(&cache_path, now) {
            tracing::debug!(source = %source.display(), "cache stale, refreshing");
            self.write_cache(source, &cache_path)?;
        } else {
            tracing::debug!(cache = %cache_path.display(), "cache hit");
        }

        if self.is_fresh(&cache_path, now) {
            Ok(cache_path)
        } else {
            Ok(source.to_path_buf())
        }
    }

    /// A cache file is fresh iff it exists and its mtime is younger than the
    /// freshness window. A clock-skewed future mtime counts as age zero.
    fn is_fresh(&self, cache_path: &Path, now: SystemTime) -> bool {
        let Ok(meta) = fs::metadata(cache_path) else {
            return false;
        };
        let Ok(mtime) = meta.modified() else {
            return false;
        };
        let age = now.duration_since(mtime).unwrap_or(Duration::ZERO);
        age < self.ttl
    }

    /// Stream-copy the full source contents over the cache file in fixed
    /// chunks, replacing any prior content.
    fn write_cache(&self, source: &Path, cache_path: &Path) -> RastermarkResult<()> {
        let mut reader = File::open(source).map_err(|_| {
            RastermarkError::resource(format!("couldn't open file at {}", source.display()))
        })?;
        let mut writer = File::create(cache_path).map_err(|_| {
            RastermarkError::resource(format!(
                "couldn't open cache file at {}",
                cache_path.display()
            ))
        })?;

        let mut chunk = [0u8; COPY_CHUNK_SIZE];
        loop {
            let n = reader.read(&mut chunk).map_err(|_| {
                RastermarkError::resource(format!("couldn't open file at {}", source.display()))
            })?;
            if n == 0 {
                break;
            }
            writer.write_all(&chunk[..n]).map_err(|_| {
                RastermarkError::resource(format!(
                    "couldn't open cache file at {}",
                    cache_path.display()
                ))
            })?;
        }

        Ok(())
    }
}
