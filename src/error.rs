use std::num::NonZeroUsize;

use thiserror::Error;

/// Misuse of the history detected at construction time.
///
/// Failures of the operations themselves are never wrapped in this type; they
/// reach the caller as the operation's own error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The starting position does not index one of the supplied entries.
    #[error("position {position} is out of bounds for a history of {len} entries")]
    CursorOutOfBounds { position: usize, len: usize },
    /// More entries were supplied than the configured limit allows.
    #[error("{len} entries exceed the history limit of {limit}")]
    LimitExceeded { len: usize, limit: NonZeroUsize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            HistoryError::CursorOutOfBounds {
                position: 4,
                len: 2
            }
            .to_string(),
            "position 4 is out of bounds for a history of 2 entries"
        );
        assert_eq!(
            HistoryError::LimitExceeded {
                len: 6,
                limit: NonZeroUsize::new(5).unwrap()
            }
            .to_string(),
            "6 entries exceed the history limit of 5"
        );
    }
}
