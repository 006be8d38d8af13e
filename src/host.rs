//! Host collaborator interface
//!
//! The engine is generic over a `Host`, which supplies everything the
//! device firmware or the simulator must provide: the endpoint registry
//! write path, the wall clock, and a diagnostic sink. All calls are
//! synchronous and expected to be fast; the engine holds no locks and
//! yields no control while running.

use thiserror::Error;

use crate::error::ErrorCode;
use crate::value::Value;

/// Status returned by the endpoint layer when it rejects a write.
/// Any rejection halts the run with `WriteFailed`; the device status
/// byte is only surfaced through the diagnostic sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("endpoint rejected write with status {0}")]
pub struct EndpointError(pub u8);

/// Host environment of a state machine instance
pub trait Host {
    /// Apply a value to a numbered device property.
    ///
    /// Endpoint ids are device-global; unknown ids, read-only endpoints,
    /// and type-incompatible values are all rejections.
    fn write_endpoint(&mut self, eid: u32, value: &Value<'_>) -> Result<(), EndpointError>;

    /// Wall clock in seconds since the epoch, for `LoadSystemTime` and
    /// as the usual input to `DecomposeDatetime`
    fn system_time(&mut self) -> u64;

    /// Diagnostic sink for halt codes. Never affects control flow.
    fn log_diagnostic(&mut self, code: ErrorCode, location: &str) {
        tracing::debug!(code = code.code(), reason = %code, location, "state machine halted");
    }
}
