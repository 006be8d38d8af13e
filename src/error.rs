//! State machine halt codes
//!
//! Every failed run halts with exactly one `ErrorCode`. The numeric values
//! are part of the device protocol (they are reported over the network when
//! a state machine faults) and must never be renumbered.

use thiserror::Error;

/// Result type for all fallible state machine operations
pub type Result<T> = std::result::Result<T, ErrorCode>;

/// Reason a state machine run halted without completing.
///
/// Success is represented as `Ok(())`, reported as protocol code `0`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorCode {
    /// A memory or program read would exceed its bounds
    #[error("out-of-bounds read")]
    OobRead = 1,

    /// A memory write would exceed its bounds
    #[error("out-of-bounds write")]
    OobWrite = 2,

    /// Unknown opcode, or an instruction could not be fully decoded
    /// within the program bounds
    #[error("invalid opcode")]
    InvalidOpcode = 3,

    /// An operand had the wrong type tag for the opcode
    #[error("invalid operand types")]
    InvalidTypes = 4,

    /// Integer division or modulo by zero, or float modulo by zero/infinity
    #[error("division by zero")]
    DivByZero = 5,

    /// The program header is malformed or has the wrong version
    #[error("invalid program header")]
    InvalidHeader = 6,

    /// A legal instruction produced an illegal outcome (missing source
    /// context, datetime out of range, program counter wraparound)
    #[error("invalid operation")]
    InvalidOperation = 7,

    /// Operand stack underflow or overflow
    #[error("stack error")]
    StackError = 8,

    /// The endpoint layer rejected a write
    #[error("endpoint write failed")]
    WriteFailed = 9,
}

impl ErrorCode {
    /// Numeric protocol code for this halt reason
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> u8 {
        code.code()
    }
}

/// Fold a run result into the numeric 0-9 protocol code surfaced to the
/// network layer.
pub fn run_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(code) => code.code(),
    }
}
