//! Session registry
//!
//! Tracks issued sessions so a token can be revoked before it expires.
//! Records live in a fixed set of shards, each behind its own `RwLock`;
//! a token id always maps to the same shard, so unrelated sessions rarely
//! contend. Every mutation is one critical section with no `.await` inside.
//!
//! `revoke` holds the shard write lock while flipping the flag, so an
//! `is_revoked` that begins after `revoke` returns always sees `true`
//! (until the record is swept, by which point the token has expired).
//!
//! Expiry is compared in whole seconds, the resolution of the token's `exp`
//! claim: a record stays through the last second its token still verifies.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default shard count
pub const DEFAULT_SHARDS: usize = 16;

/// One issued session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token_id: String,
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl SessionRecord {
    /// `exp < now` at second resolution
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.timestamp() < now.timestamp()
    }
}

type Shard = RwLock<HashMap<String, SessionRecord>>;

pub struct SessionRegistry {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Shard count is rounded up to a power of two
    pub fn with_shards(shards: usize) -> Self {
        let count = shards.max(1).next_power_of_two();
        Self {
            shards: (0..count).map(|_| RwLock::new(HashMap::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, token_id: &str) -> &Shard {
        let hash = self.hasher.hash_one(token_id) as usize;
        &self.shards[hash & (self.shards.len() - 1)]
    }

    /// Record a newly issued session
    pub fn register(&self, token_id: &str, subject_id: &str, expires_at: DateTime<Utc>) {
        let record = SessionRecord {
            token_id: token_id.to_string(),
            subject_id: subject_id.to_string(),
            issued_at: Utc::now(),
            expires_at,
            revoked: false,
        };
        // An existing record (possibly already revoked) is never overwritten
        self.shard(token_id)
            .write()
            .entry(token_id.to_string())
            .or_insert(record);
        debug!(token_id, subject_id, "Session registered");
    }

    /// Mark a session revoked. Idempotent; unknown ids are ignored.
    ///
    /// Returns true if this call changed a live record.
    pub fn revoke(&self, token_id: &str) -> bool {
        let mut shard = self.shard(token_id).write();
        match shard.get_mut(token_id) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                true
            }
            _ => false,
        }
    }

    /// Revoke a session, inserting a revoked tombstone when the id is not
    /// known here (e.g. issued before a restart). The tombstone is swept at
    /// `expires_at` like any other record.
    pub fn revoke_with_expiry(&self, token_id: &str, subject_id: &str, expires_at: DateTime<Utc>) -> bool {
        let mut shard = self.shard(token_id).write();
        let record = shard
            .entry(token_id.to_string())
            .or_insert_with(|| SessionRecord {
                token_id: token_id.to_string(),
                subject_id: subject_id.to_string(),
                issued_at: Utc::now(),
                expires_at,
                revoked: false,
            });
        let changed = !record.revoked;
        record.revoked = true;
        changed
    }

    pub fn is_revoked(&self, token_id: &str) -> bool {
        self.shard(token_id)
            .read()
            .get(token_id)
            .is_some_and(|record| record.revoked)
    }

    pub fn get(&self, token_id: &str) -> Option<SessionRecord> {
        self.shard(token_id).read().get(token_id).cloned()
    }

    /// Drop every record whose token has expired at `now`; returns how many
    /// were removed
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut purged = 0;
        for shard in self.shards.iter() {
            let mut map = shard.write();
            let before = map.len();
            map.retain(|_, record| !record.is_expired(now));
            purged += before - map.len();
        }
        purged
    }

    /// Total records, revoked ones included
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sessions neither revoked nor expired at `now`
    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .values()
                    .filter(|record| !record.revoked && !record.is_expired(now))
                    .count()
            })
            .sum()
    }
}

/// Periodically sweep expired records until the task is aborted
pub fn spawn_sweeper(registry: Arc<SessionRegistry>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = registry.sweep(Utc::now());
            if purged > 0 {
                info!(purged, remaining = registry.len(), "Swept expired sessions");
            }
        }
    })
}
