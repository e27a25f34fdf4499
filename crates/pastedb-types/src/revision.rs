use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque optimistic-concurrency token.
///
/// Every successful write to a key produces a new revision. Callers echo a
/// revision back to make a write (or read) conditional on nobody else having
/// written in between.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Generate a fresh, time-ordered revision (UUID v7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn new(rev: impl Into<String>) -> Self {
        Self(rev.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision({})", self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(rev: &str) -> Self {
        Self::new(rev)
    }
}

impl From<String> for Revision {
    fn from(rev: String) -> Self {
        Self(rev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_revisions_are_unique() {
        let revs: HashSet<Revision> = (0..1000).map(|_| Revision::generate()).collect();
        assert_eq!(revs.len(), 1000);
    }

    #[test]
    fn generated_revision_is_a_uuid() {
        let rev = Revision::generate();
        assert!(Uuid::parse_str(rev.as_str()).is_ok());
    }

    #[test]
    fn caller_supplied_revision_is_kept_verbatim() {
        let rev = Revision::from("my-rev-1");
        assert_eq!(rev.as_str(), "my-rev-1");
        assert_eq!(serde_json::to_string(&rev).unwrap(), "\"my-rev-1\"");
    }
}
