//! In-memory master-key cache with a sliding TTL.
//!
//! The cached key is dropped after `ttl` of inactivity; every hit
//! restarts the countdown. Expiry runs as a one-shot background task
//! stamped with a generation counter: `update`, `get` and `clear` bump
//! the generation under the lock, so a timer armed for an older
//! generation can never clear a newer key.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;
use veilstore_crypto::MasterKey;

/// Default time a cached master key survives without access.
pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);

struct CacheState {
    master_key: Option<MasterKey>,
    ttl: Duration,
    generation: u64,
}

/// Timed in-memory cache for an unlocked [`MasterKey`].
#[derive(Clone)]
pub struct KeyCache {
    state: Arc<Mutex<CacheState>>,
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl KeyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                master_key: None,
                ttl,
                generation: 0,
            })),
        }
    }

    /// Cache `master_key`, optionally changing the stored TTL, and arm a
    /// fresh expiry.
    pub async fn update(&self, master_key: MasterKey, ttl: Option<Duration>) {
        let mut state = self.state.lock().await;
        if let Some(ttl) = ttl {
            state.ttl = ttl;
        }
        state.master_key = Some(master_key);
        state.generation += 1;
        self.arm_expiry(state.generation, state.ttl);
    }

    /// Return a clone of the cached key, restarting the TTL on a hit.
    pub async fn get(&self) -> Option<MasterKey> {
        let mut state = self.state.lock().await;
        let master_key = state.master_key.clone()?;
        state.generation += 1;
        self.arm_expiry(state.generation, state.ttl);
        Some(master_key)
    }

    /// Restart the TTL without reading the key.
    pub async fn reset_timeout(&self) {
        let mut state = self.state.lock().await;
        if state.master_key.is_some() {
            state.generation += 1;
            self.arm_expiry(state.generation, state.ttl);
        }
    }

    /// Drop the cached key immediately.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.master_key = None;
        state.generation += 1;
    }

    /// Whether a key is currently cached. Does not touch the TTL.
    pub async fn is_cached(&self) -> bool {
        self.state.lock().await.master_key.is_some()
    }

    fn arm_expiry(&self, generation: u64, ttl: Duration) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = state.lock().await;
            if state.generation == generation && state.master_key.is_some() {
                state.master_key = None;
                debug!("cached master key expired");
            }
        });
    }
}
