//! Verified, multi-mirror artifact downloads.
//!
//! This module provides functionality for fetching component artifacts:
//! - SHA-256 verification with delete-and-retry (`checksum`, `manager`)
//! - streaming HTTP with per-chunk cancellation checks (`http`)
//! - session-wide mirror failover and offline degradation (`mirror`)
//! - browser-assisted manual downloads (`manager`)
//!
//! # Architecture
//!
//! ```text
//! DownloadManager
//!         │
//!         ├── Transport (trait)
//!         │       └── ReqwestTransport
//!         │
//!         ├── MirrorPool (shared, session-scoped)
//!         │
//!         └── BrowserOpener (trait, injected by the caller)
//! ```

mod checksum;
mod http;
mod manager;
mod mirror;

pub use checksum::{file_matches, file_sha256};
pub use http::{ChunkProgress, ReqwestTransport, Transport, TransportError};
pub use manager::{BrowserOpener, DownloadManager};
pub use mirror::MirrorPool;
