//! Terminal outcomes of a retry sequence
use std::fmt;

/// Failure surfaced by a retry policy.
///
/// `Inner` carries the last failure produced by the guarded operation with its
/// value unchanged: callers receive the same error they would have seen from a
/// single call, not an aggregate wrapper. `Cancelled` is only produced when a
/// cancellation token fires during the wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The last failure observed from the operation
    Inner(E),
    /// A cancellation signal fired while waiting to retry
    Cancelled,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner(e) => write!(f, "{}", e),
            Self::Cancelled => write!(f, "retry cancelled while waiting"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}

impl<E> RetryError<E> {
    /// Check if this outcome is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this outcome carries an operation failure.
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner(_))
    }

    /// Get the last operation failure if this is an Inner variant
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Cancelled => None,
        }
    }

    /// Borrow the last operation failure if present.
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Self::Inner(e) => Some(e),
            Self::Cancelled => None,
        }
    }
}
