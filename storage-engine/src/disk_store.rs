use shared::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use vision::{CacheEntry, Fingerprint};

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// Durable tier: one `<fingerprint>.json` record per entry.
#[derive(Debug)]
pub struct DiskTier {
    /// `None` when the directory could not be created; the tier is then inert.
    dir: Option<PathBuf>,
}

impl DiskTier {
    /// Open the cache directory, creating it if needed.
    /// Failure to create it is logged and leaves the tier disabled.
    pub async fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        match fs::create_dir_all(dir).await {
            Ok(()) => Self {
                dir: Some(dir.to_path_buf()),
            },
            Err(e) => {
                warn!(
                    "Failed to create cache directory {}: {}; running memory-only",
                    dir.display(),
                    e
                );
                Self { dir: None }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    fn record_path(dir: &Path, fingerprint: &Fingerprint) -> PathBuf {
        dir.join(format!("{}.{}", fingerprint, RECORD_EXTENSION))
    }

    /// Read the record for `fingerprint`. Missing files are `Ok(None)`;
    /// undecodable or mismatched records are errors.
    pub async fn read(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };

        let bytes = match fs::read(Self::record_path(dir, fingerprint)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        if &entry.fingerprint != fingerprint {
            return Err(Error::Persistence(format!(
                "record for {} holds fingerprint {}",
                fingerprint, entry.fingerprint
            )));
        }

        Ok(Some(entry))
    }

    /// Write via a temporary sibling and rename, so readers never observe a partial record.
    pub async fn write(&self, entry: &CacheEntry) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let bytes = serde_json::to_vec(entry)?;
        let path = Self::record_path(dir, &entry.fingerprint);
        let temp = path.with_extension(TEMP_EXTENSION);

        fs::write(&temp, &bytes).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!("Persisted recognition {}", entry.fingerprint);
        Ok(())
    }

    /// Delete every file in the directory, returning how many were removed.
    /// Individual failures are skipped.
    pub async fn remove_all(&self) -> Result<usize> {
        let Some(dir) = &self.dir else {
            return Ok(0);
        };

        let mut removed = 0;
        let mut entries = fs::read_dir(dir).await?;
        while let Some(item) = entries.next_entry().await? {
            let path = item.path();
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => debug!("Skipping {} during clear: {}", path.display(), e),
            }
        }

        Ok(removed)
    }

    /// Decode every `*.json` record. Malformed ones are logged and skipped.
    pub async fn scan(&self) -> Result<Vec<CacheEntry>> {
        let Some(dir) = &self.dir else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(item) = entries.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }

            match Self::decode_file(&path).await {
                Ok(entry) => records.push(entry),
                Err(e) => warn!("Skipping malformed cache record {}: {}", path.display(), e),
            }
        }

        Ok(records)
    }

    async fn decode_file(path: &Path) -> Result<CacheEntry> {
        let bytes = fs::read(path).await?;
        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if entry.fingerprint.as_str() != stem {
            return Err(Error::Persistence(format!(
                "file name does not match fingerprint {}",
                entry.fingerprint
            )));
        }

        Ok(entry)
    }
}
