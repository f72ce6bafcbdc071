//! Verified artifact downloads with retry, failover, and manual mode.
//!
//! The manager sits between the manifest and the install executor: give
//! it a component, a destination, and the install side, and it produces
//! a verified file or a typed failure. Verification retries up to
//! [`MAX_ATTEMPTS`] total fetches; distribution-network references fail
//! over across the shared [`MirrorPool`]; browser-mode artifacts are
//! opened for the user and polled into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::context::{InstallContext, Side};
use crate::error::{InstallError, InstallResult};
use crate::manifest::{parse_manifest, Component, DownloadMode, Manifest};
use crate::progress::CancelToken;

use super::checksum::{file_matches, file_sha256};
use super::http::{ChunkProgress, Transport, TransportError};
use super::mirror::MirrorPool;

/// Total fetch attempts per artifact when a hash is expected.
const MAX_ATTEMPTS: usize = 4;

/// How often the destination is polled in browser-assisted mode.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Failed polls between re-opening the browser.
const REOPEN_EVERY_POLLS: u32 = 15;

/// Opens a URL in the user's default browser.
///
/// Injected by the caller; the core never talks to a desktop directly.
pub trait BrowserOpener: Send + Sync {
    /// Open the URL, returning an error if no browser could be launched.
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Downloads component artifacts according to their download mode.
pub struct DownloadManager<T: Transport> {
    transport: T,
    mirrors: Arc<MirrorPool>,
    opener: Option<Box<dyn BrowserOpener>>,
    poll_interval: Duration,
}

impl<T: Transport> DownloadManager<T> {
    /// Create a manager over a transport and a shared mirror pool.
    pub fn new(transport: T, mirrors: Arc<MirrorPool>) -> Self {
        Self {
            transport,
            mirrors,
            opener: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Supply a browser opener for manual-download components.
    pub fn with_opener(mut self, opener: Box<dyn BrowserOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Override the browser-mode poll interval (mainly for tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The shared mirror pool.
    pub fn mirrors(&self) -> &MirrorPool {
        &self.mirrors
    }

    /// Fetch a component's artifact into `dest_dir`, verified when a
    /// hash is known. Returns the path of the produced file.
    pub fn fetch_component(
        &self,
        component: &Component,
        dest_dir: &Path,
        side: Side,
        cancel: &CancelToken,
        on_chunk: Option<ChunkProgress<'_>>,
    ) -> InstallResult<PathBuf> {
        let url = component.url_for(side);
        let dest = dest_dir.join(component.file_for(side));
        let mut expected = component.hash_for(side).map(str::to_string);

        if component.download == DownloadMode::Browser {
            self.fetch_via_browser(url, &dest, expected.as_deref(), cancel)?;
            return Ok(dest);
        }

        // Hash discovery: a metadata probe may advertise one the
        // manifest does not carry. Probe failures mean best-effort.
        if expected.is_none() {
            if let Some(resolved) = self.resolve(url, component.download) {
                match self.transport.probe_hash(&resolved) {
                    Ok(found) => expected = found,
                    Err(e) => debug!(url = %resolved, error = %e, "hash probe failed"),
                }
            }
        }

        match expected {
            None => {
                // Best effort: fetch once, accept whatever arrives.
                self.fetch_once(url, component.download, &dest, cancel, on_chunk)?;
                Ok(dest)
            }
            Some(expected) => {
                self.fetch_verified(url, component.download, &dest, &expected, cancel, on_chunk)?;
                Ok(dest)
            }
        }
    }

    /// Fetch with verification and retry.
    ///
    /// An existing destination that already matches skips the network
    /// entirely. On mismatch the file is deleted and re-fetched, up to
    /// [`MAX_ATTEMPTS`] fetches total.
    fn fetch_verified(
        &self,
        url: &str,
        mode: DownloadMode,
        dest: &Path,
        expected: &str,
        cancel: &CancelToken,
        on_chunk: Option<ChunkProgress<'_>>,
    ) -> InstallResult<()> {
        if dest.exists() && file_matches(dest, expected) {
            debug!(path = %dest.display(), "destination already verified, skipping fetch");
            return Ok(());
        }

        let mut last_actual = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            if cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }
            self.fetch_once(url, mode, dest, cancel, on_chunk)?;

            let actual = file_sha256(dest).map_err(|e| InstallError::io(dest, e))?;
            if actual.eq_ignore_ascii_case(expected) {
                return Ok(());
            }

            warn!(
                url,
                attempt,
                expected,
                actual = %actual,
                "hash mismatch, discarding download"
            );
            last_actual = actual;
            fs::remove_file(dest).ok();
        }

        Err(InstallError::ArtifactVerificationFailed {
            file: dest
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            expected: expected.to_string(),
            actual: last_actual,
        })
    }

    /// One fetch, with mirror failover for distribution references.
    fn fetch_once(
        &self,
        url: &str,
        mode: DownloadMode,
        dest: &Path,
        cancel: &CancelToken,
        on_chunk: Option<ChunkProgress<'_>>,
    ) -> InstallResult<u64> {
        match mode {
            DownloadMode::Mirror => loop {
                let base = self.mirrors.current().ok_or_else(|| {
                    InstallError::ArtifactUnavailable {
                        url: url.to_string(),
                        reason: "session is offline, no mirrors remaining".to_string(),
                    }
                })?;
                let resolved = match self.mirrors.resolve(url) {
                    Some(resolved) => resolved,
                    // Pool went offline between current() and resolve().
                    None => continue,
                };

                match self.transport.fetch(&resolved, dest, cancel, on_chunk) {
                    Ok(bytes) => return Ok(bytes),
                    Err(TransportError::Connect(reason)) => {
                        debug!(mirror = %base, %reason, "connection failure, failing over");
                        self.mirrors.mark_failed(&base);
                    }
                    Err(e) => return Err(map_transport_error(e, &resolved, dest)),
                }
            },
            DownloadMode::Direct | DownloadMode::Browser => self
                .transport
                .fetch(url, dest, cancel, on_chunk)
                .map_err(|e| map_transport_error(e, url, dest)),
        }
    }

    /// Resolve a reference to a concrete URL without fetching.
    fn resolve(&self, url: &str, mode: DownloadMode) -> Option<String> {
        match mode {
            DownloadMode::Mirror => self.mirrors.resolve(url),
            _ => Some(url.to_string()),
        }
    }

    /// Browser-assisted fetch: open the URL for the user and poll the
    /// expected destination until it appears (and verifies, when a hash
    /// is known) or the operation is cancelled.
    fn fetch_via_browser(
        &self,
        url: &str,
        dest: &Path,
        expected: Option<&str>,
        cancel: &CancelToken,
    ) -> InstallResult<()> {
        let opener = self
            .opener
            .as_ref()
            .ok_or_else(|| InstallError::ArtifactUnavailable {
                url: url.to_string(),
                reason: "manual download required but no browser opener configured".to_string(),
            })?;

        info!(url, dest = %dest.display(), "opening browser for manual download");
        opener
            .open(url)
            .map_err(|e| InstallError::ArtifactUnavailable {
                url: url.to_string(),
                reason: format!("failed to open browser: {}", e),
            })?;

        let mut polls: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }
            let present = match expected {
                Some(hash) => file_matches(dest, hash),
                None => dest.exists(),
            };
            if present {
                return Ok(());
            }

            polls += 1;
            if polls % REOPEN_EVERY_POLLS == 0 {
                // Re-prompt: the user may have dismissed the page.
                let _ = opener.open(url);
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Fetch and parse the pack manifest for the given context.
    ///
    /// Manifests always come from the distribution network and are
    /// re-fetched on every request. Fails with `ManifestUnavailable`
    /// once mirror failover is exhausted or the document is unreadable.
    pub fn fetch_manifest(
        &self,
        ctx: &InstallContext,
        cancel: &CancelToken,
    ) -> InstallResult<Manifest> {
        let relative = ctx.manifest_path();
        let staging = tempfile::NamedTempFile::new()
            .map_err(|e| InstallError::io(std::env::temp_dir(), e))?;

        self.fetch_once(&relative, DownloadMode::Mirror, staging.path(), cancel, None)
            .map_err(|e| match e {
                InstallError::Cancelled => InstallError::Cancelled,
                other => InstallError::ManifestUnavailable {
                    pack: ctx.pack.clone(),
                    version: ctx.version.clone(),
                    reason: other.to_string(),
                },
            })?;

        let content = fs::read_to_string(staging.path())
            .map_err(|e| InstallError::io(staging.path(), e))?;
        parse_manifest(&content).map_err(|e| InstallError::ManifestUnavailable {
            pack: ctx.pack.clone(),
            version: ctx.version.clone(),
            reason: e.to_string(),
        })
    }
}

fn map_transport_error(e: TransportError, url: &str, dest: &Path) -> InstallError {
    match e {
        TransportError::Cancelled => InstallError::Cancelled,
        TransportError::Io(io_err) => InstallError::io(dest, io_err),
        other => InstallError::ArtifactUnavailable {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use sha2::{Digest, Sha256};
    use tempfile::TempDir;

    use super::*;
    use crate::manifest::InstallType;
    use crate::testutil::FakeTransport;

    fn sha256_hex(data: &[u8]) -> String {
        format!("{:x}", Sha256::digest(data))
    }

    fn mod_component(name: &str, hash: Option<String>) -> Component {
        let mut c = crate::testutil::component(name, InstallType::Mod);
        c.hash = hash;
        c
    }

    fn manager(transport: FakeTransport, mirrors: Vec<&str>) -> DownloadManager<FakeTransport> {
        let pool = Arc::new(MirrorPool::new(
            mirrors.into_iter().map(str::to_string).collect(),
        ));
        DownloadManager::new(transport, pool).with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_verified_fetch_skips_when_destination_matches() {
        let body = b"cached bytes";
        let hash = sha256_hex(body);
        let transport =
            FakeTransport::default().with_body("http://m1/mods/cached.zip", body);
        let manager = manager(transport, vec!["http://m1"]);

        let temp = TempDir::new().unwrap();
        let mut component = mod_component("cached", Some(hash));
        component.url = "mods/cached.zip".to_string();
        component.file = "cached.zip".to_string();

        let cancel = CancelToken::new();
        manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap();
        assert_eq!(manager.transport.fetch_count.load(Ordering::SeqCst), 1);

        // Second call: destination verifies, zero additional fetches.
        manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap();
        assert_eq!(manager.transport.fetch_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_verification_retries_four_times_then_fails() {
        let transport = FakeTransport::default()
            .with_body("http://m1/mods/bad.zip", b"corrupted every time");
        let manager = manager(transport, vec!["http://m1"]);

        let temp = TempDir::new().unwrap();
        let mut component = mod_component("bad", Some("00ff".repeat(16)));
        component.url = "mods/bad.zip".to_string();
        component.file = "bad.zip".to_string();

        let cancel = CancelToken::new();
        let err = manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::ArtifactVerificationFailed { .. }
        ));
        assert_eq!(manager.transport.fetch_count.load(Ordering::SeqCst), 4);
        // The poisoned file is not left behind.
        assert!(!temp.path().join("bad.zip").exists());
    }

    #[test]
    fn test_probed_hash_verifies_single_fetch() {
        let body = b"probed artifact";
        let transport = FakeTransport::default()
            .with_body("http://m1/mods/p.zip", body)
            .with_probed_hash("http://m1/mods/p.zip", &sha256_hex(body));
        let manager = manager(transport, vec!["http://m1"]);

        let temp = TempDir::new().unwrap();
        // No manifest hash; the advertised one takes over.
        let mut component = mod_component("p", None);
        component.url = "mods/p.zip".to_string();
        component.file = "p.zip".to_string();

        let cancel = CancelToken::new();
        manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap();
        assert_eq!(manager.transport.fetch_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_probed_hash_mismatch_retries_then_fails() {
        let transport = FakeTransport::default()
            .with_body("http://m1/mods/p.zip", b"corrupted every time")
            .with_probed_hash("http://m1/mods/p.zip", &"00ff".repeat(16));
        let manager = manager(transport, vec!["http://m1"]);

        let temp = TempDir::new().unwrap();
        let mut component = mod_component("p", None);
        component.url = "mods/p.zip".to_string();
        component.file = "p.zip".to_string();

        let cancel = CancelToken::new();
        let err = manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap_err();

        assert!(matches!(
            err,
            InstallError::ArtifactVerificationFailed { .. }
        ));
        assert_eq!(manager.transport.fetch_count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_mirror_failover_succeeds_via_second_mirror() {
        let body = b"artifact";
        let transport = FakeTransport::default()
            .refusing_prefix("http://m1")
            .with_body("http://m2/mods/a.zip", body);
        let manager = manager(transport, vec!["http://m1", "http://m2"]);

        let temp = TempDir::new().unwrap();
        let mut component = mod_component("a", Some(sha256_hex(body)));
        component.url = "mods/a.zip".to_string();
        component.file = "a.zip".to_string();

        let cancel = CancelToken::new();
        manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap();

        // m1 is dead for the session; later fetches go straight to m2.
        assert_eq!(
            manager.mirrors().current().unwrap(),
            "http://m2".to_string()
        );
    }

    #[test]
    fn test_all_mirrors_down_degrades_to_offline() {
        let transport = FakeTransport::default()
            .refusing_prefix("http://m1")
            .refusing_prefix("http://m2");
        let manager = manager(transport, vec!["http://m1", "http://m2"]);

        let temp = TempDir::new().unwrap();
        let mut component = mod_component("a", None);
        component.url = "mods/a.zip".to_string();
        component.file = "a.zip".to_string();

        let cancel = CancelToken::new();
        let err = manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap_err();
        assert!(matches!(err, InstallError::ArtifactUnavailable { .. }));
        assert!(manager.mirrors().is_offline());
    }

    #[test]
    fn test_cancelled_fetch_reports_cancelled() {
        let transport =
            FakeTransport::default().with_body("http://m1/mods/a.zip", b"bytes");
        let manager = manager(transport, vec!["http://m1"]);

        let temp = TempDir::new().unwrap();
        let mut component = mod_component("a", None);
        component.url = "mods/a.zip".to_string();
        component.file = "a.zip".to_string();

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap_err();
        assert!(matches!(err, InstallError::Cancelled));
    }

    /// Opener that drops the expected file in place, standing in for the
    /// user completing a manual download.
    struct DepositingOpener {
        dest: PathBuf,
        body: Vec<u8>,
    }

    impl BrowserOpener for DepositingOpener {
        fn open(&self, _url: &str) -> io::Result<()> {
            fs::write(&self.dest, &self.body)
        }
    }

    #[test]
    fn test_browser_mode_polls_until_file_appears() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("manual.zip");

        let transport = FakeTransport::default();
        let pool = Arc::new(MirrorPool::new(vec!["http://m1".to_string()]));
        let manager = DownloadManager::new(transport, pool)
            .with_poll_interval(Duration::from_millis(5))
            .with_opener(Box::new(DepositingOpener {
                dest: dest.clone(),
                body: b"manual".to_vec(),
            }));

        let mut component = mod_component("manual", Some(sha256_hex(b"manual")));
        component.download = DownloadMode::Browser;
        component.url = "https://adhost.example/manual".to_string();
        component.file = "manual.zip".to_string();

        let cancel = CancelToken::new();
        let path = manager
            .fetch_component(&component, temp.path(), Side::Client, &cancel, None)
            .unwrap();
        assert_eq!(path, dest);
        // Browser mode never touches the transport.
        assert_eq!(manager.transport.fetch_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetch_manifest_reports_unavailable_after_failover() {
        let transport = FakeTransport::default().refusing_prefix("http://m1");
        let manager = manager(transport, vec!["http://m1"]);

        let ctx = InstallContext::client("pack", "1.0.0", "/tmp/pack");
        let cancel = CancelToken::new();
        let err = manager.fetch_manifest(&ctx, &cancel).unwrap_err();
        assert!(matches!(err, InstallError::ManifestUnavailable { .. }));
    }

    #[test]
    fn test_fetch_manifest_parses_document() {
        let doc = br#"{
            "format": "1.0.0",
            "components": [
                { "name": "a", "type": "mod", "url": "mods/a.zip", "file": "a.zip" }
            ]
        }"#;
        let transport = FakeTransport::default()
            .with_body("http://m1/packs/pack/versions/1.0.0/pack.json", doc);
        let manager = manager(transport, vec!["http://m1"]);

        let ctx = InstallContext::client("pack", "1.0.0", "/tmp/pack");
        let cancel = CancelToken::new();
        let manifest = manager.fetch_manifest(&ctx, &cancel).unwrap();
        assert_eq!(manifest.components.len(), 1);
    }
}
