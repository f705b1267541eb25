#![forbid(unsafe_code)]

//! Results that may or may not be ready yet.
//!
//! User callbacks (field validators, the whole-form validator, submit and
//! reset handlers) may answer immediately or hand back a future. The
//! orchestrator treats the two cases differently (a synchronous field
//! validator never raises the busy flag, a synchronous submit handler leaves
//! `isSubmitting` to the caller), so the distinction is explicit in the type
//! instead of being sniffed at runtime.

use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::Fault;

/// The answer of a user callback: ready now, or pending on a future.
pub enum Outcome<T> {
    /// The callback produced its result synchronously.
    Ready(Result<T, Fault>),
    /// The callback returned a future that resolves later.
    Pending(BoxFuture<'static, Result<T, Fault>>),
}

impl<T> Outcome<T> {
    /// A synchronous success.
    #[must_use]
    pub fn ready(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    /// A synchronous fault.
    #[must_use]
    pub fn fail(fault: impl Into<Fault>) -> Self {
        Self::Ready(Err(fault.into()))
    }

    /// Wrap a future.
    #[must_use]
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Fault>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }

    /// Returns `true` if the result is behind a future.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Wait for the result, whichever form it takes.
    pub async fn resolve(self) -> Result<T, Fault> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.await,
        }
    }
}

impl<T> From<Result<T, Fault>> for Outcome<T> {
    fn from(result: Result<T, Fault>) -> Self {
        Self::Ready(result)
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn ready_resolves_immediately() {
        let outcome = Outcome::ready(3);
        assert!(!outcome.is_pending());
        assert_eq!(block_on(outcome.resolve()), Ok(3));
    }

    #[test]
    fn pending_resolves_through_future() {
        let outcome = Outcome::pending(async { Ok::<_, Fault>("done") });
        assert!(outcome.is_pending());
        assert_eq!(block_on(outcome.resolve()), Ok("done"));
    }

    #[test]
    fn fail_carries_fault() {
        let outcome: Outcome<()> = Outcome::fail("boom");
        assert_eq!(block_on(outcome.resolve()), Err(Fault::new("boom")));
    }

    #[test]
    fn debug_hides_future() {
        let outcome: Outcome<u8> = Outcome::pending(async { Ok(1) });
        assert_eq!(format!("{outcome:?}"), "Pending(..)");
        assert_eq!(format!("{:?}", Outcome::ready(1u8)), "Ready(Ok(1))");
    }
}
