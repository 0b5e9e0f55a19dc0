//! Directory resolution.
//!
//! Turns a [`DirectoryMode`] and optional core name into a Tantivy directory,
//! and reports whether that location already holds index data. The probe runs
//! exactly once per resolution; the result travels with the directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tantivy::directory::{Directory, MmapDirectory, RamDirectory};
use tracing::{debug, info};

use search_types::DirectoryMode;

use crate::error::CoreError;
use crate::sink::ErrorSink;

/// A directory ready to host an index, plus what was found there.
#[derive(Debug)]
pub struct ResolvedDirectory {
    directory: Box<dyn Directory>,
    location: Option<PathBuf>,
    already_has_data: bool,
}

impl ResolvedDirectory {
    /// Wrap a caller-supplied directory.
    ///
    /// Existing data is detected by the presence of index metadata.
    pub fn from_directory<D: Into<Box<dyn Directory>>>(directory: D) -> Result<Self, CoreError> {
        let directory = directory.into();
        let already_has_data = directory
            .exists(Path::new("meta.json"))
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))?;
        Ok(Self {
            directory,
            location: None,
            already_has_data,
        })
    }

    /// True when the location held data before this resolution.
    pub fn already_has_data(&self) -> bool {
        self.already_has_data
    }

    /// Filesystem location, `None` for in-memory directories.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Box<dyn Directory>, Option<PathBuf>) {
        (self.directory, self.location)
    }
}

/// Check that `name` is present and usable as a single path segment.
///
/// Runs before any filesystem access.
pub fn validate_core_name(name: Option<&str>) -> Result<&str, CoreError> {
    let name = name.ok_or_else(|| {
        CoreError::Config("persistent indexes require a core name".to_string())
    })?;
    if name.trim().is_empty() {
        return Err(CoreError::Config("core name must not be empty".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(CoreError::Config(format!(
            "core name '{}' is not a valid path segment",
            name
        )));
    }
    Ok(name)
}

/// Produces directories for index cores.
pub struct DirectoryResolver {
    indexes_path: PathBuf,
    sink: Arc<dyn ErrorSink>,
}

impl DirectoryResolver {
    pub fn new(indexes_path: impl Into<PathBuf>, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            indexes_path: indexes_path.into(),
            sink,
        }
    }

    /// Base directory persistent cores live under.
    pub fn indexes_path(&self) -> &Path {
        &self.indexes_path
    }

    /// Deterministic location of a persistent core.
    pub fn core_path(&self, name: &str) -> PathBuf {
        self.indexes_path.join(name)
    }

    /// Resolve a directory for `mode`.
    ///
    /// Persistent mode requires `name`. I/O failures are reported to the sink
    /// and returned.
    pub fn resolve(
        &self,
        mode: DirectoryMode,
        name: Option<&str>,
    ) -> Result<ResolvedDirectory, CoreError> {
        match mode {
            DirectoryMode::Ephemeral => {
                debug!("Allocating in-memory directory");
                Ok(ResolvedDirectory {
                    directory: Box::new(RamDirectory::create()),
                    location: None,
                    already_has_data: false,
                })
            }
            DirectoryMode::Persistent => {
                let name = validate_core_name(name)?;
                let path = self.core_path(name);
                self.open_persistent(&path).map_err(|e| {
                    self.sink.notify("open persistent directory", &e);
                    e
                })
            }
        }
    }

    fn open_persistent(&self, path: &Path) -> Result<ResolvedDirectory, CoreError> {
        let already_has_data = path.is_dir() && std::fs::read_dir(path)?.next().is_some();

        if already_has_data {
            info!(path = ?path, "Found existing index data");
        } else {
            info!(path = ?path, "Creating index directory");
            std::fs::create_dir_all(path)?;
        }

        let directory = MmapDirectory::open(path)?;
        Ok(ResolvedDirectory {
            directory: Box::new(directory),
            location: Some(path.to_path_buf()),
            already_has_data,
        })
    }
}

/// Directory wrapper with switchable failures, for error-path tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tantivy::directory::error::{DeleteError, OpenReadError, OpenWriteError};
    use tantivy::directory::{
        Directory, FileHandle, RamDirectory, WatchCallback, WatchHandle, WritePtr,
    };

    const META: &str = "meta.json";

    #[derive(Debug, Clone, Default)]
    pub(crate) struct FaultyDirectory {
        inner: RamDirectory,
        fail_probe: Arc<AtomicBool>,
        fail_meta_write: Arc<AtomicBool>,
    }

    impl FaultyDirectory {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Make `exists("meta.json")` fail.
        pub(crate) fn fail_probe(&self) {
            self.fail_probe.store(true, Ordering::SeqCst);
        }

        /// Make writing `meta.json` fail, so commits fail.
        pub(crate) fn fail_meta_write(&self) {
            self.fail_meta_write.store(true, Ordering::SeqCst);
        }
    }

    impl Directory for FaultyDirectory {
        fn get_file_handle(&self, path: &Path) -> Result<Arc<dyn FileHandle>, OpenReadError> {
            self.inner.get_file_handle(path)
        }

        fn delete(&self, path: &Path) -> Result<(), DeleteError> {
            self.inner.delete(path)
        }

        fn exists(&self, path: &Path) -> Result<bool, OpenReadError> {
            if path == Path::new(META) && self.fail_probe.load(Ordering::SeqCst) {
                return Err(OpenReadError::FileDoesNotExist(PathBuf::from(META)));
            }
            self.inner.exists(path)
        }

        fn open_write(&self, path: &Path) -> Result<WritePtr, OpenWriteError> {
            self.inner.open_write(path)
        }

        fn atomic_read(&self, path: &Path) -> Result<Vec<u8>, OpenReadError> {
            self.inner.atomic_read(path)
        }

        fn atomic_write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
            if path == Path::new(META) && self.fail_meta_write.load(Ordering::SeqCst) {
                return Err(io::Error::other("meta.json write refused"));
            }
            self.inner.atomic_write(path, data)
        }

        fn sync_directory(&self) -> io::Result<()> {
            self.inner.sync_directory()
        }

        fn watch(&self, watch_callback: WatchCallback) -> tantivy::Result<WatchHandle> {
            self.inner.watch(watch_callback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CollectingErrorSink;
    use tempfile::TempDir;

    fn resolver(base: &Path) -> (Arc<CollectingErrorSink>, DirectoryResolver) {
        let sink = Arc::new(CollectingErrorSink::new());
        let resolver = DirectoryResolver::new(base, sink.clone());
        (sink, resolver)
    }

    #[test]
    fn test_ephemeral_never_has_data() {
        let temp_dir = TempDir::new().unwrap();
        let (_sink, resolver) = resolver(temp_dir.path());

        let resolved = resolver.resolve(DirectoryMode::Ephemeral, None).unwrap();
        assert!(!resolved.already_has_data());
        assert!(resolved.location().is_none());
    }

    #[test]
    fn test_persistent_requires_name() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("indexes");
        let (sink, resolver) = resolver(&base);

        let err = resolver
            .resolve(DirectoryMode::Persistent, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(!base.exists());
        // Configuration errors are returned, not reported as I/O failures
        assert!(sink.is_empty());
    }

    #[test]
    fn test_persistent_creates_new_directory() {
        let temp_dir = TempDir::new().unwrap();
        let (_sink, resolver) = resolver(temp_dir.path());

        let resolved = resolver
            .resolve(DirectoryMode::Persistent, Some("books"))
            .unwrap();
        assert!(!resolved.already_has_data());
        assert_eq!(resolved.location(), Some(temp_dir.path().join("books").as_path()));
        assert!(temp_dir.path().join("books").is_dir());
    }

    #[test]
    fn test_persistent_detects_existing_data() {
        let temp_dir = TempDir::new().unwrap();
        let core_dir = temp_dir.path().join("books");
        std::fs::create_dir_all(&core_dir).unwrap();
        std::fs::write(core_dir.join("meta.json"), b"{}").unwrap();
        let (_sink, resolver) = resolver(temp_dir.path());

        let resolved = resolver
            .resolve(DirectoryMode::Persistent, Some("books"))
            .unwrap();
        assert!(resolved.already_has_data());
    }

    #[test]
    fn test_persistent_empty_existing_directory_is_new() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("books")).unwrap();
        let (_sink, resolver) = resolver(temp_dir.path());

        let resolved = resolver
            .resolve(DirectoryMode::Persistent, Some("books"))
            .unwrap();
        assert!(!resolved.already_has_data());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the core directory should be
        std::fs::write(temp_dir.path().join("books"), b"not a directory").unwrap();
        let (sink, resolver) = resolver(temp_dir.path());

        let result = resolver.resolve(DirectoryMode::Persistent, Some("books"));
        assert!(result.is_err());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.failures()[0].context, "open persistent directory");
    }

    #[test]
    fn test_validate_core_name() {
        assert_eq!(validate_core_name(Some("books")).unwrap(), "books");
        assert!(validate_core_name(None).is_err());
        assert!(validate_core_name(Some("")).is_err());
        assert!(validate_core_name(Some("  ")).is_err());
        assert!(validate_core_name(Some("..")).is_err());
        assert!(validate_core_name(Some("a/b")).is_err());
        assert!(validate_core_name(Some("a\\b")).is_err());
    }

    #[test]
    fn test_from_directory_probes_metadata() {
        let resolved = ResolvedDirectory::from_directory(RamDirectory::create()).unwrap();
        assert!(!resolved.already_has_data());
    }

    #[test]
    fn test_from_directory_probe_failure() {
        let directory = testing::FaultyDirectory::new();
        directory.fail_probe();
        assert!(matches!(
            ResolvedDirectory::from_directory(directory),
            Err(CoreError::Io(_))
        ));
    }

    #[test]
    fn test_core_path_is_deterministic() {
        let (_sink, resolver) = resolver(Path::new("/data/indexes"));
        assert_eq!(resolver.core_path("books"), PathBuf::from("/data/indexes/books"));
        assert_eq!(resolver.core_path("books"), resolver.core_path("books"));
    }
}
