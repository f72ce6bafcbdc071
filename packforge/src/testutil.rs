//! Shared test fixtures.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::download::{ChunkProgress, Transport, TransportError};
use crate::manifest::{Component, DownloadMode, InstallType};
use crate::progress::CancelToken;

/// Bare optional test component; callers adjust fields as needed.
pub(crate) fn component(name: &str, install_type: InstallType) -> Component {
    Component {
        name: name.to_string(),
        version: "1.0".to_string(),
        url: format!("mods/{}.zip", name),
        file: format!("{}.zip", name),
        hash: None,
        server_url: None,
        server_file: None,
        server_hash: None,
        install_type,
        extract_target: None,
        nested_path: None,
        nested_placement: None,
        client: true,
        server: true,
        optional_client: true,
        optional_server: true,
        recommended: false,
        download: DownloadMode::Mirror,
        hidden: false,
        library: false,
        group: String::new(),
        parent: String::new(),
        dependencies: Vec::new(),
        description: String::new(),
        color: None,
    }
}

/// In-memory transport: URL to body, or a simulated connect failure.
#[derive(Default)]
pub(crate) struct FakeTransport {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    refuse: Mutex<Vec<String>>,
    probed: Mutex<HashMap<String, String>>,
    pub fetch_count: AtomicUsize,
}

impl FakeTransport {
    pub fn with_body(self, url: &str, body: &[u8]) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_vec());
        self
    }

    pub fn refusing_prefix(self, prefix: &str) -> Self {
        self.refuse.lock().unwrap().push(prefix.to_string());
        self
    }

    /// Advertise a hash for a URL in response to metadata probes.
    pub fn with_probed_hash(self, url: &str, hash: &str) -> Self {
        self.probed
            .lock()
            .unwrap()
            .insert(url.to_string(), hash.to_string());
        self
    }
}

impl Transport for FakeTransport {
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelToken,
        _on_chunk: Option<ChunkProgress<'_>>,
    ) -> Result<u64, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        if self
            .refuse
            .lock()
            .unwrap()
            .iter()
            .any(|p| url.starts_with(p.as_str()))
        {
            return Err(TransportError::Connect("connection refused".to_string()));
        }
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        match self.bodies.lock().unwrap().get(url) {
            Some(body) => {
                fs::write(dest, body)?;
                Ok(body.len() as u64)
            }
            None => Err(TransportError::Status(404)),
        }
    }

    fn probe_hash(&self, url: &str) -> Result<Option<String>, TransportError> {
        Ok(self.probed.lock().unwrap().get(url).cloned())
    }
}
