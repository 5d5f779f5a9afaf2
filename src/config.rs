use std::num::NonZeroUsize;

/// Configuration for an [`OperationHistory`](crate::operation_history::OperationHistory).
///
/// With the `serde` feature enabled the configuration can be stored in a host
/// application's settings; missing fields fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistoryConfig {
    /// Maximum number of stored entries. `None` keeps every entry.
    pub limit: Option<NonZeroUsize>,
    /// Whether recorded operations may be fused into the current entry at all.
    pub merge: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: None,
            merge: true,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn with_limit(mut self, limit: NonZeroUsize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self
    }

    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = HistoryConfig::default();
        assert_eq!(config.limit, None);
        assert!(config.merge);
    }

    #[test]
    fn test_builders() {
        let limit = NonZeroUsize::new(3).unwrap();
        let config = HistoryConfig::default().with_limit(limit).with_merge(false);
        assert_eq!(config.limit, Some(limit));
        assert!(!config.merge);

        assert_eq!(config.unlimited().limit, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: HistoryConfig = serde_json::from_str(r#"{ "limit": 25 }"#).unwrap();
        assert_eq!(config.limit, NonZeroUsize::new(25));
        assert!(config.merge);

        let config: HistoryConfig = serde_json::from_str(r#"{ "merge": false }"#).unwrap();
        assert_eq!(config, HistoryConfig::default().with_merge(false));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_zero_limit() {
        assert!(serde_json::from_str::<HistoryConfig>(r#"{ "limit": 0 }"#).is_err());
    }
}
