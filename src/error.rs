/*
 * Error Taxonomy
 *
 * Three failure classes cross the library boundary:
 *
 * - BadArg: a caller-supplied TID or argument violates an operation's
 *   precondition. Library state is unchanged.
 * - Exhausted: spawn found no free TCB slot or no stack region.
 * - System: a platform collaborator (timer arming, context primitive)
 *   failed. The library cannot provide correct semantics afterwards, so
 *   this class is fatal.
 *
 * Every error is reported as a single line on stderr before the operation
 * returns. Nothing is retried internally.
 */

use core::fmt;

/// Error returned by the public thread-library operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UthreadError {
    /// Caller violated an operation precondition (bad TID, zero quantum, ...).
    BadArg(&'static str),
    /// No free TCB slot (or stack region) left for a new thread.
    Exhausted(&'static str),
    /// A platform collaborator failed; reported via `fatal` and never
    /// observed by callers in practice.
    System(&'static str),
}

impl fmt::Display for UthreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UthreadError::BadArg(msg) => write!(f, "{}", msg),
            UthreadError::Exhausted(msg) => write!(f, "{}", msg),
            UthreadError::System(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for UthreadError {}

/// Report a misuse diagnostic and build the matching `BadArg` error.
///
/// The line goes to stderr directly: the diagnostic contract must hold even
/// when the host never installed a `log` sink.
pub(crate) fn bad_arg(msg: &'static str) -> UthreadError {
    eprintln!("thread library error: {}", msg);
    UthreadError::BadArg(msg)
}

/// Report an exhaustion diagnostic and build the matching error.
pub(crate) fn exhausted(msg: &'static str) -> UthreadError {
    eprintln!("thread library error: {}", msg);
    UthreadError::Exhausted(msg)
}

/// Report a platform failure and exit.
///
/// Timer arming, masking, and the context primitive are the only operations
/// that can land here; once one of them fails the scheduler's invariants are
/// unrecoverable.
pub(crate) fn fatal(msg: &'static str) -> ! {
    eprintln!("system error: {}", msg);
    std::process::exit(1);
}
