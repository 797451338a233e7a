//! Unit-of-work contract driven by a [`Worker`](crate::scheduler::Worker).

use std::future::Future;

/// One repeatable, bounded unit of work.
///
/// Each iteration opens a fresh `Scope`, passes it to `run`, and drops it
/// before the next iteration begins. Anything the scope holds (a connection,
/// a lease, a transaction) is released by its `Drop` on every exit path.
pub trait Job: Send + Sync + 'static {
    /// Per-iteration execution context.
    type Scope: Send;

    /// Failure of the unit of work or of scope acquisition.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire the context for one iteration.
    fn open_scope(&self) -> Result<Self::Scope, Self::Error>;

    /// Do the work, returning how many items were processed.
    ///
    /// Must be safe to call repeatedly; zero means there was nothing to do.
    fn run(&self, scope: &mut Self::Scope) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}
