//! Exit code logic for the megalink process.
//!
//! Single responsibility: map per-link failures to the process exit outcome.

use crate::ProcessExit;

/// Any failed link fails the whole run.
pub(crate) fn determine_exit_outcome(failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
