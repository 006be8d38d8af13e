//! Program container
//!
//! A compiled rule program is an opaque byte range: a 1-byte version tag
//! (must be `0`), three big-endian u16 entry offsets (Init, OnValue,
//! Periodic; `0xFFFF` means "no handler"), then the instruction stream.
//! Entry offsets address the instruction stream, not the raw range.
//! Programs are immutable for the duration of a run; they may be replaced
//! between runs after an upload, never during one.

use crate::error::{ErrorCode, Result};

/// Required value of the version tag byte
pub const PROGRAM_VERSION: u8 = 0;

/// Header length: version byte plus three u16 entry offsets
pub const HEADER_LEN: usize = 7;

/// Entry offset sentinel for "no handler for this trigger"
pub const NO_HANDLER: u16 = 0xFFFF;

/// Which handler a run enters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// First invocation after the program was (re)loaded
    Init,
    /// A value was received from the network
    OnValue,
    /// Periodic check from the scheduler
    Periodic,
}

/// A validated program, borrowing the caller's byte range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'p> {
    text: &'p [u8],
    init: Option<u16>,
    on_value: Option<u16>,
    periodic: Option<u16>,
}

impl<'p> Program<'p> {
    /// Validate the header and wrap the byte range.
    ///
    /// Fails with `InvalidHeader` if the range is shorter than the header
    /// or the version tag does not match.
    pub fn parse(bytes: &'p [u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ErrorCode::InvalidHeader);
        }
        if bytes[0] != PROGRAM_VERSION {
            return Err(ErrorCode::InvalidHeader);
        }

        let offset = |at: usize| {
            let raw = u16::from_be_bytes([bytes[at], bytes[at + 1]]);
            (raw != NO_HANDLER).then_some(raw)
        };

        Ok(Program {
            text: &bytes[HEADER_LEN..],
            init: offset(1),
            on_value: offset(3),
            periodic: offset(5),
        })
    }

    /// Entry offset for a trigger kind, `None` if the program declares no
    /// handler for it
    pub fn entry(&self, entry: EntryPoint) -> Option<u16> {
        match entry {
            EntryPoint::Init => self.init,
            EntryPoint::OnValue => self.on_value,
            EntryPoint::Periodic => self.periodic,
        }
    }

    /// The instruction stream, addressed by entry offsets
    pub fn text(&self) -> &'p [u8] {
        self.text
    }

    /// Bounds-checked random access into the instruction stream
    pub fn bytes(&self, offset: u16, len: usize) -> Result<&'p [u8]> {
        let start = offset as usize;
        start
            .checked_add(len)
            .and_then(|end| self.text.get(start..end))
            .ok_or(ErrorCode::OobRead)
    }
}
