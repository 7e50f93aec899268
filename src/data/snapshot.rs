use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Published survey snapshot, fetched once and cached beside the binary.
const DEFAULT_SNAPSHOT_URL: &str =
    "https://drive.google.com/uc?export=download&id=1eACQIHOn3oS96V8rHzN6VlMuKtNX5raz";
const DEFAULT_CACHE_PATH: &str = "data_bersih.csv";

/// Where the curated snapshot comes from and where it lands on disk.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub url: String,
    pub cache_path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            url: DEFAULT_SNAPSHOT_URL.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }
}

impl SnapshotConfig {
    /// Environment overrides: `SISTOK_DATA_URL`, `SISTOK_DATA_CACHE`.
    pub fn from_env() -> Self {
        let defaults = SnapshotConfig::default();
        SnapshotConfig {
            url: env::var("SISTOK_DATA_URL").unwrap_or(defaults.url),
            cache_path: env::var("SISTOK_DATA_CACHE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
        }
    }
}

/// Returns the local path of the snapshot, downloading it on first use.
///
/// An existing cache file is reused as-is; delete it to force a refresh.
pub fn ensure_local(config: &SnapshotConfig) -> Result<PathBuf> {
    if config.cache_path.exists() {
        log::info!("Using cached snapshot at {:?}", config.cache_path);
        return Ok(config.cache_path.clone());
    }
    download(&config.url, &config.cache_path)?;
    Ok(config.cache_path.clone())
}

fn download(url: &str, dest: &Path) -> Result<()> {
    log::info!("Downloading snapshot from {url}");
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to reach snapshot host: {url}"))?
        .error_for_status()
        .context("Snapshot host rejected the request")?;
    let body = response
        .bytes()
        .context("Failed to read snapshot response body")?;
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {parent:?}"))?;
        }
    }
    fs::write(dest, &body).with_context(|| format!("Failed to write snapshot to {dest:?}"))?;
    log::info!("Snapshot cached at {dest:?} ({} bytes)", body.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_published_snapshot() {
        let config = SnapshotConfig::default();
        assert!(config.url.starts_with("https://"));
        assert_eq!(config.cache_path, PathBuf::from("data_bersih.csv"));
    }

    #[test]
    fn existing_cache_short_circuits_the_download() {
        // Per-process path so parallel test runs never race on the file.
        let dir = std::env::temp_dir().join(format!("sistok-snapshot-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let cache = dir.join("cached.csv");
        fs::write(&cache, b"berat\n1.0\n").unwrap();

        let config = SnapshotConfig {
            // Unroutable on purpose; the cache hit must keep us offline.
            url: "http://invalid.localdomain/none".to_string(),
            cache_path: cache.clone(),
        };
        let path = ensure_local(&config).unwrap();
        assert_eq!(path, cache);
        fs::remove_file(&cache).unwrap();
    }
}
