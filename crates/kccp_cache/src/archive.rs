//! Zip bundle access.
//!
//! [`BundleReader`] indexes a bundle on a blocking task and publishes two
//! level-triggered signals: "manifest located" and "scan complete". Both
//! can be awaited any number of times, before or after they fire.
//! [`BundleWriter`] builds a new bundle from files on disk.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::manifest::MANIFEST_FILE;
use crate::{CacheError, CacheManifest};

/// The manifest entry found inside a bundle.
#[derive(Debug, Clone)]
pub struct LocatedManifest {
    /// Full name of the entry inside the bundle.
    pub name: String,
    /// Raw manifest bytes.
    pub data: Vec<u8>,
}

impl LocatedManifest {
    /// Prefix shared by every content entry of the bundle.
    pub fn base_prefix(&self) -> &str {
        self.name.strip_suffix(MANIFEST_FILE).unwrap_or(&self.name)
    }

    /// Decodes the manifest.
    pub fn parse(&self) -> Result<CacheManifest, CacheError> {
        CacheManifest::from_slice(&self.data)
            .map_err(|e| CacheError::corrupted(format!("{}: {}", self.name, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Scanning,
    Ready,
    Failed(String),
}

impl ScanState {
    fn is_finished(&self) -> bool {
        !matches!(self, Self::Scanning)
    }
}

type SharedArchive = Arc<Mutex<Option<ZipArchive<File>>>>;

/// Read-only view of a bundle whose entries are discovered in the background.
pub struct BundleReader {
    path: PathBuf,
    manifest_rx: watch::Receiver<Option<Arc<LocatedManifest>>>,
    scan_rx: watch::Receiver<ScanState>,
    entries: Arc<RwLock<HashSet<String>>>,
    archive: SharedArchive,
    cancelled: Arc<AtomicBool>,
    scanner: Option<JoinHandle<()>>,
}

impl BundleReader {
    /// Opens a bundle and starts indexing its entries.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();

        let archive = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || -> Result<ZipArchive<File>, CacheError> {
                let file = File::open(&path)?;
                Ok(ZipArchive::new(file)?)
            })
            .await??
        };
        debug!("Opened bundle {} ({} entries)", path.display(), archive.len());

        let (manifest_tx, manifest_rx) = watch::channel(None);
        let (scan_tx, scan_rx) = watch::channel(ScanState::Scanning);
        let entries = Arc::new(RwLock::new(HashSet::new()));
        let shared: SharedArchive = Arc::new(Mutex::new(None));
        let cancelled = Arc::new(AtomicBool::new(false));

        let scanner = {
            let entries = Arc::clone(&entries);
            let shared = Arc::clone(&shared);
            let cancelled = Arc::clone(&cancelled);
            tokio::task::spawn_blocking(move || {
                let mut archive = archive;
                let result = scan_entries(&mut archive, &entries, &manifest_tx, &cancelled);
                *shared.lock() = Some(archive);
                match result {
                    Ok(()) => scan_tx.send_replace(ScanState::Ready),
                    Err(e) => scan_tx.send_replace(ScanState::Failed(e.to_string())),
                };
            })
        };

        Ok(Self {
            path,
            manifest_rx,
            scan_rx,
            entries,
            archive: shared,
            cancelled,
            scanner: Some(scanner),
        })
    }

    /// Returns the bundle location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits until the manifest entry is found.
    ///
    /// Fails with [`CacheError::ManifestNotFound`] once the scan completes
    /// without one.
    pub async fn manifest(&self) -> Result<Arc<LocatedManifest>, CacheError> {
        let mut manifest_rx = self.manifest_rx.clone();
        let mut scan_rx = self.scan_rx.clone();

        let located = tokio::select! {
            biased;
            found = async {
                manifest_rx
                    .wait_for(Option::is_some)
                    .await
                    .ok()
                    .and_then(|m| (*m).clone())
            } => found,
            _ = async { scan_rx.wait_for(ScanState::is_finished).await.map(|_| ()) } => None,
        };

        if let Some(located) = located {
            return Ok(located);
        }
        // The manifest is published before the scan completes.
        if let Some(located) = self.manifest_rx.borrow().as_ref() {
            return Ok(Arc::clone(located));
        }

        self.ready().await?;
        Err(CacheError::ManifestNotFound(self.path.clone()))
    }

    /// Waits until every entry of the bundle has been indexed.
    pub async fn ready(&self) -> Result<(), CacheError> {
        let mut scan_rx = self.scan_rx.clone();
        let state = scan_rx
            .wait_for(ScanState::is_finished)
            .await
            .map(|s| (*s).clone());

        match state {
            Ok(ScanState::Ready) => Ok(()),
            Ok(ScanState::Failed(message)) => Err(CacheError::bundle_read(format!(
                "{}: {}",
                self.path.display(),
                message
            ))),
            Ok(ScanState::Scanning) | Err(_) => Err(CacheError::bundle_read(format!(
                "{}: scan stopped before completing",
                self.path.display()
            ))),
        }
    }

    /// Returns true if the bundle contains `name`.
    ///
    /// Only complete after [`BundleReader::ready`] has returned.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains(name)
    }

    /// Extracts entry `name` to `target`, overwriting it.
    pub async fn extract(&self, name: &str, target: &Path) -> Result<(), CacheError> {
        self.ready().await?;

        let archive = Arc::clone(&self.archive);
        let name = name.to_string();
        let target = target.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            let mut guard = archive.lock();
            let archive = guard
                .as_mut()
                .ok_or_else(|| CacheError::bundle_read("bundle is closed"))?;
            let mut entry = archive.by_name(&name)?;

            let mut file = File::create(&target)?;
            if let Err(e) = io::copy(&mut entry, &mut file) {
                drop(file);
                let _ = fs::remove_file(&target);
                return Err(e.into());
            }
            Ok(())
        })
        .await?
    }

    /// Reads entry `name` into memory.
    pub async fn read_entry(&self, name: &str) -> Result<Vec<u8>, CacheError> {
        self.ready().await?;

        let archive = Arc::clone(&self.archive);
        let name = name.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, CacheError> {
            let mut guard = archive.lock();
            let archive = guard
                .as_mut()
                .ok_or_else(|| CacheError::bundle_read("bundle is closed"))?;
            let mut entry = archive.by_name(&name)?;

            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            Ok(data)
        })
        .await?
    }

    /// Stops scanning and releases the archive.
    pub async fn close(mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        if let Some(scanner) = self.scanner.take()
            && let Err(e) = scanner.await
        {
            warn!("Bundle scanner for {} failed: {}", self.path.display(), e);
        }
        self.archive.lock().take();
        debug!("Closed bundle {}", self.path.display());
    }
}

impl Drop for BundleReader {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

fn scan_entries(
    archive: &mut ZipArchive<File>,
    entries: &RwLock<HashSet<String>>,
    manifest_tx: &watch::Sender<Option<Arc<LocatedManifest>>>,
    cancelled: &AtomicBool,
) -> Result<(), CacheError> {
    let mut found = false;

    for index in 0..archive.len() {
        if cancelled.load(Ordering::Relaxed) {
            debug!("Bundle scan cancelled after {} entries", index);
            break;
        }

        let name = {
            let entry = archive.by_index_raw(index)?;
            if entry.is_dir() {
                continue;
            }
            entry.name().to_string()
        };

        if !found && name.ends_with(MANIFEST_FILE) {
            let mut data = Vec::new();
            archive.by_index(index)?.read_to_end(&mut data)?;
            debug!("Found {}", name);
            found = true;
            manifest_tx.send_replace(Some(Arc::new(LocatedManifest {
                name: name.clone(),
                data,
            })));
        }

        entries.write().insert(name);
    }

    Ok(())
}

/// Builds a bundle from files on disk.
///
/// Content is streamed from its source file when [`BundleWriter::write`]
/// runs, so the bundle holds what is on disk at that moment.
#[derive(Debug, Default)]
pub struct BundleWriter {
    files: Vec<(String, PathBuf)>,
    manifest: Vec<u8>,
}

impl BundleWriter {
    /// Creates an empty writer with an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a content entry named `name`, read from `source`.
    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<PathBuf>) {
        self.files.push((name.into(), source.into()));
    }

    /// Sets the manifest stored as the bundle's manifest entry.
    pub fn set_manifest(&mut self, manifest: &CacheManifest) -> Result<(), CacheError> {
        self.manifest = manifest.to_vec()?;
        Ok(())
    }

    /// Returns the number of content entries.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if there are no content entries.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes the bundle to `target`, creating parent directories.
    ///
    /// This does blocking I/O.
    pub fn write(self, target: &Path) -> Result<(), CacheError> {
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = target.as_os_str().to_owned();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        let result = self.write_to(&tmp);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
            return result;
        }

        fs::rename(&tmp, target)?;
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), CacheError> {
        let mut zip = ZipWriter::new(File::create(path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, source) in &self.files {
            let mut file = File::open(source).map_err(|e| with_path(e, source))?;
            let length = file.metadata().map_err(|e| with_path(e, source))?.len();

            zip.start_file(
                name.as_str(),
                options.large_file(length >= u64::from(u32::MAX)),
            )?;
            io::copy(&mut file, &mut zip).map_err(|e| with_path(e, source))?;
        }

        zip.start_file(MANIFEST_FILE, options)?;
        zip.write_all(&self.manifest)?;
        zip.finish()?;

        Ok(())
    }
}

fn with_path(err: io::Error, path: &Path) -> io::Error {
    io::Error::new(err.kind(), format!("{}: {}", path.display(), err))
}
