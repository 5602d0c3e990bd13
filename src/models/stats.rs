//! Aggregate statistics for an agent/namespace partition.

use serde::Serialize;
use std::collections::HashMap;

/// Statistics for one `(agent, namespace)` partition.
///
/// The `providers` and `sources` maps only contain keys with at least one
/// record; `sources` excludes records that carry no source tag.
///
/// Statistics are advisory. The pgvector driver returns a zeroed value with
/// `error` set instead of failing, so dashboards degrade gracefully. Callers
/// must check `error` rather than assume success implies trustworthy data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryStats {
    /// Total records in the partition.
    pub total_memories: u64,
    /// Sum of token counts across the partition.
    pub total_tokens: u64,
    /// Record count per embedding provider.
    pub providers: HashMap<String, u64>,
    /// Record count per source tag.
    pub sources: HashMap<String, u64>,
    /// Populated when statistics collection failed and zeroed values were
    /// returned in its place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemoryStats {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates zeroed statistics carrying a collection failure.
    #[must_use]
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Returns true if the partition holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_memories == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = MemoryStats::new();
        assert!(stats.is_empty());
        assert_eq!(stats.total_tokens, 0);
        assert!(stats.providers.is_empty());
        assert!(stats.sources.is_empty());
        assert!(stats.error.is_none());
    }

    #[test]
    fn test_degraded_stats_carry_error() {
        let stats = MemoryStats::degraded("connection refused");
        assert!(stats.is_empty());
        assert_eq!(stats.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_serialize_omits_absent_error() {
        let json = serde_json::to_string(&MemoryStats::new()).unwrap();
        assert!(!json.contains("error"));

        let json = serde_json::to_string(&MemoryStats::degraded("down")).unwrap();
        assert!(json.contains("\"error\":\"down\""));
    }
}
