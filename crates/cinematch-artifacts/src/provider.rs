//! Artifact provider: turns an [`ArtifactSpec`] into a readable local path.
//!
//! An artifact that already exists at its target path is returned as-is,
//! with no network access. A missing one is fetched (when the strategy and
//! the spec allow it) into a unique `*.part` sibling and renamed into place
//! only after the whole transfer succeeded, so a half-written file is never
//! visible at the target path. Resolution of the same target path is
//! serialized: concurrent callers wait for the in-flight download and then
//! observe the finished file.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpFetcher};

/// How a missing artifact is sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingStrategy {
    /// Only ever read local files.
    LocalOnly,
    /// Download a missing artifact to its configured local path.
    DownloadToPath,
    /// Download a missing artifact into the cache directory.
    #[default]
    DownloadToCacheDir,
}

impl SourcingStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalOnly => "local_only",
            Self::DownloadToPath => "download_to_path",
            Self::DownloadToCacheDir => "download_to_cache_dir",
        }
    }

    /// Whether this strategy may touch the network.
    #[must_use]
    pub const fn downloads(self) -> bool {
        !matches!(self, Self::LocalOnly)
    }
}

impl fmt::Display for SourcingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourcingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "local_only" => Ok(Self::LocalOnly),
            "download_to_path" => Ok(Self::DownloadToPath),
            "download_to_cache_dir" => Ok(Self::DownloadToCacheDir),
            other => Err(format!(
                "unknown sourcing strategy {other:?} (expected local_only, download_to_path or download_to_cache_dir)"
            )),
        }
    }
}

/// Everything needed to locate one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Logical name, used in logs and errors.
    pub name: String,
    /// Default local path. In cache-directory mode only its file name is used.
    pub local_path: PathBuf,
    /// Remote identifier, if the artifact can be downloaded.
    pub remote_id: Option<String>,
    /// Overrides the provider's cache directory for this artifact.
    pub cache_dir: Option<PathBuf>,
}

impl ArtifactSpec {
    pub fn new(name: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            local_path: local_path.into(),
            remote_id: None,
            cache_dir: None,
        }
    }

    #[must_use]
    pub fn with_remote_id(mut self, remote_id: Option<String>) -> Self {
        self.remote_id = remote_id.filter(|id| !id.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }
}

/// Resolves artifacts to local paths under one [`SourcingStrategy`].
#[derive(Debug)]
pub struct ArtifactProvider {
    strategy: SourcingStrategy,
    cache_dir: PathBuf,
    timeout: Duration,
    fetcher: Arc<dyn Fetcher>,
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl ArtifactProvider {
    /// Create a provider.
    ///
    /// `timeout` bounds each download, retries included.
    pub fn new(
        strategy: SourcingStrategy,
        cache_dir: impl Into<PathBuf>,
        timeout: Duration,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            strategy,
            cache_dir: cache_dir.into(),
            timeout,
            fetcher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a provider backed by [`HttpFetcher`] from the configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> std::result::Result<Self, reqwest::Error> {
        let fetcher = HttpFetcher::from_config(config)?;
        Ok(Self::new(
            config.strategy,
            config.effective_cache_dir(),
            config.request_timeout(),
            Arc::new(fetcher),
        ))
    }

    #[must_use]
    pub const fn strategy(&self) -> SourcingStrategy {
        self.strategy
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Where `spec` lives on disk under this provider's strategy.
    pub fn target_path(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        match self.strategy {
            SourcingStrategy::LocalOnly | SourcingStrategy::DownloadToPath => {
                Ok(spec.local_path.clone())
            }
            SourcingStrategy::DownloadToCacheDir => {
                let file_name = spec.local_path.file_name().ok_or_else(|| {
                    unavailable(spec, &spec.local_path, "local path has no file name")
                })?;
                let dir = spec.cache_dir.as_deref().unwrap_or(&self.cache_dir);
                Ok(dir.join(file_name))
            }
        }
    }

    /// Resolve `spec` to a readable local path, downloading it if needed.
    ///
    /// # Errors
    ///
    /// [`Error::ArtifactUnavailable`] when the file is absent and cannot be
    /// fetched, [`Error::DownloadFailed`] when a fetch fails or times out,
    /// [`Error::Io`] when the cache directory or final rename fails.
    pub async fn resolve(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        let target = self.target_path(spec)?;

        if is_present(&target).await {
            log::debug!("Artifact {} found at {}", spec.name, target.display());
            return Ok(target);
        }

        if !self.strategy.downloads() {
            return Err(unavailable(
                spec,
                &target,
                "file not found and the local_only strategy never downloads",
            ));
        }

        let Some(remote_id) = spec.remote_id.as_deref() else {
            return Err(unavailable(
                spec,
                &target,
                "file not found and no remote identifier is configured",
            ));
        };

        let lock = self.lock_for(&target);
        let _guard = lock.lock().await;

        // Another caller may have finished the download while we waited.
        if is_present(&target).await {
            log::debug!("Artifact {} fetched concurrently", spec.name);
            return Ok(target);
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }

        let partial = PartFile::new(&target);
        log::info!(
            "Downloading {} ({}) to {}",
            spec.name,
            remote_id,
            target.display()
        );

        let outcome = tokio::time::timeout(self.timeout, self.fetcher.fetch(remote_id, partial.path())).await;
        let failure = match outcome {
            Ok(Ok(())) => {
                if is_present(partial.path()).await {
                    None
                } else {
                    Some("fetcher reported success but wrote no file".to_string())
                }
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("timed out after {:?}", self.timeout)),
        };

        if let Some(message) = failure {
            log::warn!("Download of {} failed: {}", spec.name, message);
            return Err(Error::DownloadFailed {
                name: spec.name.clone(),
                message,
            });
        }

        tokio::fs::rename(partial.path(), &target)
            .await
            .map_err(|e| Error::io(&target, e))?;
        partial.persisted();

        log::info!("Artifact {} ready at {}", spec.name, target.display());
        Ok(target)
    }

    /// Delete the downloaded copy of `spec`, so the next [`resolve`] fetches
    /// it again.
    ///
    /// Leftover `*.part` files of the artifact are removed as well. Returns
    /// `false` when no finished copy was removed. Under
    /// [`SourcingStrategy::LocalOnly`] the file is never touched.
    ///
    /// [`resolve`]: ArtifactProvider::resolve
    pub async fn evict(&self, spec: &ArtifactSpec) -> Result<bool> {
        if !self.strategy.downloads() {
            log::warn!(
                "Not evicting {}: local_only artifacts are not managed by cinematch",
                spec.name
            );
            return Ok(false);
        }

        let target = self.target_path(spec)?;
        let lock = self.lock_for(&target);
        let _guard = lock.lock().await;

        let swept = sweep_part_files(&target);
        if swept > 0 {
            log::info!("Removed {} stale partial downloads of {}", swept, spec.name);
        }

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                log::info!("Evicted {} from {}", spec.name, target.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(&target, e)),
        }
    }

    fn lock_for(&self, target: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(target.to_path_buf()).or_default())
    }
}

fn unavailable(spec: &ArtifactSpec, path: &Path, reason: &str) -> Error {
    Error::ArtifactUnavailable {
        name: spec.name.clone(),
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// A uniquely named `*.part` sibling of a download target.
///
/// Deleted on drop unless [`PartFile::persisted`] was called, so a failed,
/// timed-out or cancelled download never leaves its bytes behind.
#[derive(Debug)]
struct PartFile {
    path: PathBuf,
    keep: bool,
}

impl PartFile {
    fn new(target: &Path) -> Self {
        let path = target.with_file_name(format!(
            "{}.{}.part",
            file_name(target),
            Uuid::new_v4().simple()
        ));
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed into place; nothing is left to clean up.
    fn persisted(mut self) {
        self.keep = true;
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        remove_quietly(&self.path);
    }
}

fn file_name(target: &Path) -> String {
    target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Remove `*.part` leftovers of `target`, e.g. from a killed process.
fn sweep_part_files(target: &Path) -> usize {
    let Some(dir) = target.parent() else {
        return 0;
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let prefix = format!("{}.", file_name(target));

    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for path in entries.filter_map(|entry| entry.ok().map(|e| e.path())) {
        let name = file_name(&path);
        if name.starts_with(&prefix) && name.ends_with(".part") {
            remove_quietly(&path);
            removed += 1;
        }
    }
    removed
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            log::warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, FetchResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    enum Behaviour {
        Write(&'static str),
        WriteThenFail(&'static str),
        WriteThenHang(&'static str),
        Hang,
    }

    #[derive(Debug)]
    struct StubFetcher {
        calls: AtomicUsize,
        delay: Duration,
        behaviour: Behaviour,
    }

    impl StubFetcher {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(0),
                behaviour,
            })
        }

        fn slow(behaviour: Behaviour, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                behaviour,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, _remote_id: &str, dest: &Path) -> FetchResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.behaviour {
                Behaviour::Write(body) => {
                    tokio::fs::write(dest, body).await?;
                    Ok(())
                }
                Behaviour::WriteThenFail(body) => {
                    tokio::fs::write(dest, body).await?;
                    Err(FetchError::Truncated {
                        expected: 100,
                        received: body.len() as u64,
                    })
                }
                Behaviour::WriteThenHang(body) => {
                    std::fs::write(dest, body)?;
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn provider(
        strategy: SourcingStrategy,
        cache_dir: &Path,
        fetcher: Arc<StubFetcher>,
    ) -> ArtifactProvider {
        ArtifactProvider::new(strategy, cache_dir, Duration::from_secs(5), fetcher)
    }

    fn leftover_parts(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| p.extension().is_some_and(|ext| ext == "part"))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "local-only".parse::<SourcingStrategy>(),
            Ok(SourcingStrategy::LocalOnly)
        );
        assert_eq!(
            "DOWNLOAD_TO_PATH".parse::<SourcingStrategy>(),
            Ok(SourcingStrategy::DownloadToPath)
        );
        assert!("sideload".parse::<SourcingStrategy>().is_err());
        assert_eq!(
            SourcingStrategy::DownloadToCacheDir.to_string(),
            "download_to_cache_dir"
        );
    }

    #[test]
    fn test_target_path_per_strategy() {
        let fetcher = StubFetcher::new(Behaviour::Write("x"));
        let spec = ArtifactSpec::new("catalog", "data/movie_list.json");

        let local = provider(SourcingStrategy::DownloadToPath, Path::new("/cache"), Arc::clone(&fetcher));
        assert_eq!(
            local.target_path(&spec).unwrap(),
            PathBuf::from("data/movie_list.json")
        );

        let cached = provider(SourcingStrategy::DownloadToCacheDir, Path::new("/cache"), fetcher);
        assert_eq!(
            cached.target_path(&spec).unwrap(),
            PathBuf::from("/cache/movie_list.json")
        );
        let overridden = spec.with_cache_dir("/elsewhere");
        assert_eq!(
            cached.target_path(&overridden).unwrap(),
            PathBuf::from("/elsewhere/movie_list.json")
        );
    }

    #[test]
    fn test_blank_remote_id_is_dropped() {
        let spec = ArtifactSpec::new("catalog", "a.json").with_remote_id(Some("  ".to_string()));
        assert!(spec.remote_id.is_none());
    }

    #[tokio::test]
    async fn test_existing_file_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie_list.json"), "[]").unwrap();
        let fetcher = StubFetcher::new(Behaviour::Write("fresh"));
        let provider = provider(SourcingStrategy::DownloadToCacheDir, dir.path(), Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("catalog", "movie_list.json").with_remote_id(Some("id".into()));

        let path = provider.resolve(&spec).await.unwrap();
        let again = provider.resolve(&spec).await.unwrap();

        assert_eq!(path, dir.path().join("movie_list.json"));
        assert_eq!(path, again);
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_local_only_missing_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::new(Behaviour::Write("x"));
        let provider = provider(SourcingStrategy::LocalOnly, dir.path(), Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("catalog", dir.path().join("movie_list.json"))
            .with_remote_id(Some("id".into()));

        let err = provider.resolve(&spec).await.unwrap_err();
        assert!(matches!(err, Error::ArtifactUnavailable { .. }));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_without_remote_id_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::new(Behaviour::Write("x"));
        let provider = provider(SourcingStrategy::DownloadToCacheDir, dir.path(), Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("similarity", "similarity.json");

        let err = provider.resolve(&spec).await.unwrap_err();
        assert!(matches!(err, Error::ArtifactUnavailable { ref name, .. } if name == "similarity"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_download_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("nested").join("cache");
        let fetcher = StubFetcher::new(Behaviour::Write("[[1.0]]"));
        let provider = provider(SourcingStrategy::DownloadToCacheDir, &cache, Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("similarity", "similarity.json").with_remote_id(Some("id".into()));

        let path = provider.resolve(&spec).await.unwrap();
        assert_eq!(path, cache.join("similarity.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[[1.0]]");
        assert_eq!(fetcher.calls(), 1);
        assert!(leftover_parts(&cache).is_empty());

        provider.resolve(&spec).await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::new(Behaviour::WriteThenFail("[[1.0, 0."));
        let provider = provider(SourcingStrategy::DownloadToPath, dir.path(), Arc::clone(&fetcher));
        let target = dir.path().join("similarity.json");
        let spec = ArtifactSpec::new("similarity", &target).with_remote_id(Some("id".into()));

        let err = provider.resolve(&spec).await.unwrap_err();
        assert!(matches!(err, Error::DownloadFailed { .. }));
        assert!(err.is_retryable());
        assert!(!target.exists());
        assert!(leftover_parts(dir.path()).is_empty());

        // Still absent, so the next call tries again.
        let _second = provider.resolve(&spec).await.unwrap_err();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_download_timeout_is_download_failed() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::new(Behaviour::Hang);
        let provider = ArtifactProvider::new(
            SourcingStrategy::DownloadToCacheDir,
            dir.path(),
            Duration::from_millis(50),
            fetcher,
        );
        let spec = ArtifactSpec::new("catalog", "movie_list.json").with_remote_id(Some("id".into()));

        let err = provider.resolve(&spec).await.unwrap_err();
        match err {
            Error::DownloadFailed { message, .. } => assert!(message.contains("timed out")),
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
        assert!(!dir.path().join("movie_list.json").exists());
    }

    #[tokio::test]
    async fn test_cancelled_download_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::new(Behaviour::WriteThenHang("[[1.0, 0."));
        let provider = provider(SourcingStrategy::DownloadToCacheDir, dir.path(), Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("similarity", "similarity.json").with_remote_id(Some("id".into()));

        let cancelled = tokio::time::timeout(Duration::from_millis(50), provider.resolve(&spec)).await;

        assert!(cancelled.is_err());
        assert_eq!(fetcher.calls(), 1);
        assert!(leftover_parts(dir.path()).is_empty());
        assert!(!dir.path().join("similarity.json").exists());
    }

    #[tokio::test]
    async fn test_evict_sweeps_stale_part_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("movie_list.json.0123abcd.part"), "[{").unwrap();
        std::fs::write(dir.path().join("similarity.json.4567ef.part"), "[[").unwrap();
        let provider = provider(
            SourcingStrategy::DownloadToCacheDir,
            dir.path(),
            StubFetcher::new(Behaviour::Write("x")),
        );
        let spec = ArtifactSpec::new("catalog", "movie_list.json");

        assert!(!provider.evict(&spec).await.unwrap());
        assert!(!dir.path().join("movie_list.json.0123abcd.part").exists());
        assert!(dir.path().join("similarity.json.4567ef.part").exists());
    }

    #[tokio::test]
    async fn test_concurrent_resolves_download_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::slow(Behaviour::Write("[]"), Duration::from_millis(100));
        let provider = provider(SourcingStrategy::DownloadToCacheDir, dir.path(), Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("catalog", "movie_list.json").with_remote_id(Some("id".into()));

        let (a, b) = tokio::join!(provider.resolve(&spec), provider.resolve(&spec));

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a, b);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(std::fs::read_to_string(a).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_evict_forces_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StubFetcher::new(Behaviour::Write("[]"));
        let provider = provider(SourcingStrategy::DownloadToCacheDir, dir.path(), Arc::clone(&fetcher));
        let spec = ArtifactSpec::new("catalog", "movie_list.json").with_remote_id(Some("id".into()));

        provider.resolve(&spec).await.unwrap();
        assert!(provider.evict(&spec).await.unwrap());
        assert!(!provider.evict(&spec).await.unwrap());
        provider.resolve(&spec).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_evict_never_touches_local_only_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("movie_list.json");
        std::fs::write(&target, "[]").unwrap();
        let provider = provider(
            SourcingStrategy::LocalOnly,
            dir.path(),
            StubFetcher::new(Behaviour::Write("x")),
        );
        let spec = ArtifactSpec::new("catalog", &target);

        assert!(!provider.evict(&spec).await.unwrap());
        assert!(target.exists());
    }
}
