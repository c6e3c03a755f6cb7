//! Host exit codes for every way a dispatch can end.
//!
//! A plugin's own exit code passes through untouched, so scripts see the
//! same status whether they call `pipectl foo` or `pipectl-foo` directly.

use crate::plugin::error::DispatchError;
use crate::plugin::invoker::InvocationResult;

/// Exit code for failures before any plugin process existed.
pub const DISPATCH_FAILURE_EXIT_CODE: i32 = 127;

/// Added to the signal number when a plugin is killed by a signal.
pub const SIGNAL_EXIT_BASE: i32 = 128;

pub fn translate(result: &InvocationResult) -> i32 {
    match result {
        InvocationResult::Exited(code) => *code,
        InvocationResult::Signaled(signal) => SIGNAL_EXIT_BASE + signal,
        InvocationResult::SpawnFailed(_) | InvocationResult::Lost(_) => DISPATCH_FAILURE_EXIT_CODE,
    }
}

impl DispatchError {
    pub fn exit_code(&self) -> i32 {
        DISPATCH_FAILURE_EXIT_CODE
    }
}
