//! Distribution-network mirror selection and failover.
//!
//! One pool is shared by every fetch in an install session. A mirror
//! that fails to connect is dead for the remainder of the session; when
//! none remain the pool goes offline and all subsequent distribution
//! fetches are reported unavailable. State is updated under a mutex so
//! failover decisions are visible to fetches started afterwards.

use parking_lot::Mutex;
use tracing::warn;

#[derive(Debug)]
struct PoolState {
    mirrors: Vec<String>,
    dead: Vec<bool>,
    current: usize,
    offline: bool,
}

/// Ordered pool of interchangeable distribution mirrors.
#[derive(Debug)]
pub struct MirrorPool {
    state: Mutex<PoolState>,
}

impl MirrorPool {
    /// Create a pool from an ordered mirror list. An empty list starts
    /// offline.
    pub fn new(mirrors: Vec<String>) -> Self {
        let offline = mirrors.is_empty();
        let dead = vec![false; mirrors.len()];
        Self {
            state: Mutex::new(PoolState {
                mirrors,
                dead,
                current: 0,
                offline,
            }),
        }
    }

    /// The currently-selected mirror base, or `None` when offline.
    pub fn current(&self) -> Option<String> {
        let state = self.state.lock();
        if state.offline {
            None
        } else {
            Some(state.mirrors[state.current].clone())
        }
    }

    /// Resolve a distribution-relative path against the current mirror.
    pub fn resolve(&self, relative: &str) -> Option<String> {
        self.current().map(|base| {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                relative.trim_start_matches('/')
            )
        })
    }

    /// Mark the given mirror base unusable for the rest of the session
    /// and advance to the next live one. Transitions the pool offline
    /// when no mirror remains.
    pub fn mark_failed(&self, base: &str) {
        let mut state = self.state.lock();
        if state.offline {
            return;
        }
        if let Some(index) = state.mirrors.iter().position(|m| m == base) {
            state.dead[index] = true;
            warn!(mirror = %base, "mirror marked unusable for this session");
        }
        match state.dead.iter().position(|&d| !d) {
            Some(next) => state.current = next,
            None => {
                warn!("no mirrors remaining; session degraded to offline mode");
                state.offline = true;
            }
        }
    }

    /// Whether the session has degraded to offline mode.
    pub fn is_offline(&self) -> bool {
        self.state.lock().offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_starts_offline() {
        let pool = MirrorPool::new(Vec::new());
        assert!(pool.is_offline());
        assert_eq!(pool.current(), None);
    }

    #[test]
    fn test_resolve_joins_slashes() {
        let pool = MirrorPool::new(vec!["http://m1.example/".to_string()]);
        assert_eq!(
            pool.resolve("/mods/a.zip"),
            Some("http://m1.example/mods/a.zip".to_string())
        );
    }

    #[test]
    fn test_failover_advances_and_sticks() {
        let pool = MirrorPool::new(vec![
            "http://m1.example".to_string(),
            "http://m2.example".to_string(),
        ]);
        assert_eq!(pool.current().unwrap(), "http://m1.example");

        pool.mark_failed("http://m1.example");
        assert_eq!(pool.current().unwrap(), "http://m2.example");
        // m1 stays dead; later requests go straight to m2.
        assert_eq!(pool.current().unwrap(), "http://m2.example");
    }

    #[test]
    fn test_exhausted_pool_goes_offline() {
        let pool = MirrorPool::new(vec!["http://m1.example".to_string()]);
        pool.mark_failed("http://m1.example");
        assert!(pool.is_offline());
        assert_eq!(pool.resolve("x"), None);
    }

    #[test]
    fn test_mark_failed_unknown_mirror_is_harmless() {
        let pool = MirrorPool::new(vec!["http://m1.example".to_string()]);
        pool.mark_failed("http://stranger.example");
        assert!(!pool.is_offline());
    }
}
