//! Artifact download and local cache.
//!
//! The cache is a flat directory of `<artifact>-<version>.<packaging>` files.
//! A file's presence is the cache hit; nothing is ever re-validated.
//!
//! ## Write modes
//!
//! - [`CacheMode::Atomic`] streams into a temp file next to the target and
//!   renames it into place once the body is complete.
//! - [`CacheMode::Placeholder`] creates the target first and streams into it.
//!   A failed download leaves an empty or partial file that is served as a
//!   cache hit until someone deletes it (`kload cache clean`).

use crate::config::Settings;
use crate::dependency::Dependency;
use crate::error::FetchError;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

const USER_AGENT: &str = concat!("kload/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Atomic,
    Placeholder,
}

/// An open response body.
pub struct Download {
    pub reader: Box<dyn Read>,
    /// Content length when the server sent one
    pub length: Option<u64>,
}

/// Opens a streaming GET. The only network access the fetcher performs.
pub trait Transport {
    fn open(&self, url: &str) -> Result<Download, FetchError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn open(&self, url: &str) -> Result<Download, FetchError> {
        (**self).open(url)
    }
}

/// Blocking HTTP(S) over `ureq`. No retries, no timeout.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn open(&self, url: &str) -> Result<Download, FetchError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let length = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let reader = response.into_body().into_reader();
        Ok(Download {
            reader: Box::new(reader),
            length,
        })
    }
}

/// A remote Maven repository plus the local cache policy.
pub struct Repository<'t> {
    base_url: String,
    packaging: String,
    mode: CacheMode,
    transport: &'t dyn Transport,
    progress: bool,
}

impl<'t> Repository<'t> {
    pub fn new(settings: &Settings, transport: &'t dyn Transport) -> Self {
        Self {
            base_url: settings.repository.clone(),
            packaging: settings.packaging.clone(),
            mode: settings.cache_mode,
            transport,
            progress: false,
        }
    }

    /// Draw a progress bar while downloading.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn artifact_path(&self, folder: &Path, dependency: &Dependency) -> PathBuf {
        folder.join(dependency.file_name(&self.packaging))
    }

    /// Return the cached file for `dependency`, downloading it first if it
    /// is not on disk.
    ///
    /// In placeholder mode download failures are logged and the path is
    /// returned anyway.
    pub fn fetch_or_get(&self, folder: &Path, dependency: &Dependency) -> Result<PathBuf, FetchError> {
        let path = self.artifact_path(folder, dependency);
        if path.exists() {
            debug!("Using cached {}", path.display());
            return Ok(path);
        }

        info!("Downloading {}..", dependency);
        let url = dependency.download_url(&self.base_url, &self.packaging);

        match self.mode {
            CacheMode::Atomic => match self.download_atomic(folder, &url, &path) {
                Ok(bytes) => {
                    debug!("Wrote {} bytes to {}", bytes, path.display());
                    Ok(path)
                }
                Err(e) => {
                    error!("Failed to download {}: {}", dependency, e);
                    Err(e)
                }
            },
            CacheMode::Placeholder => {
                if let Err(e) = self.download_in_place(&url, &path) {
                    error!("Failed to download {}: {}", dependency, e);
                }
                Ok(path)
            }
        }
    }

    fn download_atomic(&self, folder: &Path, url: &str, path: &Path) -> Result<u64, FetchError> {
        let mut temp = NamedTempFile::new_in(folder).map_err(|e| {
            FetchError::filesystem(format!("creating temp file in {}", folder.display()), e)
        })?;

        let written = self.copy_into(url, temp.as_file_mut())?;
        temp.as_file()
            .sync_all()
            .map_err(|e| FetchError::filesystem("flushing download", e))?;

        // Dropping `temp` on any earlier return deletes it.
        temp.persist(path).map_err(|e| {
            FetchError::filesystem(format!("moving download to {}", path.display()), e.error)
        })?;
        Ok(written)
    }

    fn download_in_place(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let mut file = File::create(path).map_err(|e| {
            FetchError::filesystem(format!("creating {}", path.display()), e)
        })?;
        self.copy_into(url, &mut file)
    }

    fn copy_into(&self, url: &str, out: &mut File) -> Result<u64, FetchError> {
        let download = self.transport.open(url)?;
        let bar = self.progress_bar(download.length, url);

        let mut reader = bar.wrap_read(download.reader);
        let copied = io::copy(&mut reader, out).map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        });
        bar.finish_and_clear();
        copied
    }

    fn progress_bar(&self, length: Option<u64>, url: &str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let name = url.rsplit('/').next().unwrap_or(url).to_string();
        let bar = match length {
            Some(len) => ProgressBar::new(len).with_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.blue} {msg} [{bar:30.green/black}] {bytes}/{total_bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("━━╸"),
            ),
            None => ProgressBar::new_spinner().with_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            ),
        };
        bar.set_message(name);
        bar
    }
}

/// Create the cache directory if needed.
pub fn ensure_folder(folder: &Path) -> Result<(), FetchError> {
    fs::create_dir_all(folder)
        .map_err(|e| FetchError::filesystem(format!("creating {}", folder.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    enum Body {
        Bytes(Vec<u8>),
        Refused,
        BrokenMidway(Vec<u8>),
    }

    struct FakeTransport {
        body: Body,
        calls: RefCell<Vec<String>>,
    }

    impl FakeTransport {
        fn new(body: Body) -> Self {
            Self {
                body,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    struct Truncated {
        head: io::Cursor<Vec<u8>>,
    }

    impl Read for Truncated {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.head.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
                n => Ok(n),
            }
        }
    }

    impl Transport for FakeTransport {
        fn open(&self, url: &str) -> Result<Download, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            match &self.body {
                Body::Bytes(bytes) => Ok(Download {
                    reader: Box::new(io::Cursor::new(bytes.clone())),
                    length: Some(bytes.len() as u64),
                }),
                Body::Refused => Err(FetchError::Network {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                }),
                Body::BrokenMidway(head) => Ok(Download {
                    reader: Box::new(Truncated {
                        head: io::Cursor::new(head.clone()),
                    }),
                    length: None,
                }),
            }
        }
    }

    fn settings(mode: CacheMode) -> Settings {
        Settings {
            repository: "https://repo.maven.apache.org/maven2/".to_string(),
            packaging: "jar".to_string(),
            cache_mode: mode,
        }
    }

    fn stdlib() -> Dependency {
        Dependency {
            group_id: "org.jetbrains.kotlin".to_string(),
            artifact_id: "kotlin-stdlib-jdk8".to_string(),
            version: "1.8.0".to_string(),
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn cache_hit_skips_network() {
        let temp = TempDir::new().unwrap();
        let cached = temp.path().join("kotlin-stdlib-jdk8-1.8.0.jar");
        fs::write(&cached, b"cached bytes").unwrap();

        let transport = FakeTransport::new(Body::Bytes(b"fresh".to_vec()));
        let repo = Repository::new(&settings(CacheMode::Atomic), &transport);

        let path = repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert_eq!(path, cached);
        assert_eq!(fs::read(&path).unwrap(), b"cached bytes");
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn atomic_download_writes_file() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::new(Body::Bytes(b"PK jar body".to_vec()));
        let repo = Repository::new(&settings(CacheMode::Atomic), &transport);

        let path = repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"PK jar body");
        assert_eq!(
            *transport.calls.borrow(),
            vec!["https://repo.maven.apache.org/maven2/org/jetbrains/kotlin/kotlin-stdlib-jdk8/1.8.0/kotlin-stdlib-jdk8-1.8.0.jar".to_string()]
        );
        assert_eq!(dir_entries(temp.path()), vec!["kotlin-stdlib-jdk8-1.8.0.jar"]);

        // second call is a cache hit
        repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn atomic_failure_leaves_nothing_and_retries() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::new(Body::Refused);
        let repo = Repository::new(&settings(CacheMode::Atomic), &transport);

        let err = repo.fetch_or_get(temp.path(), &stdlib()).unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
        assert!(dir_entries(temp.path()).is_empty());

        assert!(repo.fetch_or_get(temp.path(), &stdlib()).is_err());
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn atomic_truncated_body_is_discarded() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::new(Body::BrokenMidway(b"half a jar".to_vec()));
        let repo = Repository::new(&settings(CacheMode::Atomic), &transport);

        assert!(repo.fetch_or_get(temp.path(), &stdlib()).is_err());
        assert!(dir_entries(temp.path()).is_empty());
    }

    #[test]
    fn placeholder_failure_poisons_cache() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::new(Body::Refused);
        let repo = Repository::new(&settings(CacheMode::Placeholder), &transport);

        let path = repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);

        let again = repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert_eq!(again, path);
        assert_eq!(transport.call_count(), 1);
    }

    #[test]
    fn placeholder_keeps_partial_body() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::new(Body::BrokenMidway(b"half".to_vec()));
        let repo = Repository::new(&settings(CacheMode::Placeholder), &transport);

        let path = repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"half");
    }

    #[test]
    fn placeholder_success_writes_file() {
        let temp = TempDir::new().unwrap();
        let transport = FakeTransport::new(Body::Bytes(b"body".to_vec()));
        let repo = Repository::new(&settings(CacheMode::Placeholder), &transport);

        let path = repo.fetch_or_get(temp.path(), &stdlib()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"body");
    }

    #[test]
    fn artifact_path_uses_packaging() {
        let transport = FakeTransport::new(Body::Refused);
        let mut s = settings(CacheMode::Atomic);
        s.packaging = "so".to_string();
        let repo = Repository::new(&s, &transport);
        assert_eq!(
            repo.artifact_path(Path::new("/cache"), &stdlib()),
            PathBuf::from("/cache/kotlin-stdlib-jdk8-1.8.0.so")
        );
    }

    #[test]
    fn ensure_folder_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("libraries");
        ensure_folder(&folder).unwrap();
        ensure_folder(&folder).unwrap();
        assert!(folder.is_dir());
    }
}
