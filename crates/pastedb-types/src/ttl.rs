use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock milliseconds since the UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Creation timestamp plus an optional time-to-live.
///
/// Stored both in the root index and inside the document record itself.
/// Expiry is only ever checked lazily, when the document is accessed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ttl {
    /// Milliseconds since the UNIX epoch at which the document was written.
    pub created_at: u64,
    /// Lifetime in milliseconds. `None` means the document never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl Ttl {
    /// A TTL created at `created_at`. A zero lifetime means "never expires".
    pub fn new(created_at: u64, ttl: Option<Duration>) -> Self {
        let ttl = ttl
            .map(|d| d.as_millis() as u64)
            .filter(|ms| *ms > 0);
        Self { created_at, ttl }
    }

    /// A TTL starting now.
    pub fn starting_now(ttl: Option<Duration>) -> Self {
        Self::new(now_ms(), ttl)
    }

    /// A TTL that never expires.
    pub fn forever(created_at: u64) -> Self {
        Self {
            created_at,
            ttl: None,
        }
    }

    /// The configured lifetime, if any.
    pub fn duration(&self) -> Option<Duration> {
        self.ttl.map(Duration::from_millis)
    }

    /// Absolute expiry time in epoch milliseconds.
    pub fn expires_at(&self) -> Option<u64> {
        self.ttl.map(|ttl| self.created_at.saturating_add(ttl))
    }

    /// `true` once `now >= createdAt + ttl`.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at().is_some_and(|deadline| now_ms >= deadline)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_ms())
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ttl {
            Some(ttl) => write!(f, "created {}ms, ttl {}ms", self.created_at, ttl),
            None => write!(f, "created {}ms, no expiry", self.created_at),
        }
    }
}
