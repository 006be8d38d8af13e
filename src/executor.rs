//! Execution engine
//!
//! `Machine` is one loaded state machine instance: the 4 KiB scratch
//! memory and the first-run flag are the only state that survives across
//! invocations. A run is strictly synchronous and run-to-completion; it
//! is driven by the embedding scheduler (a periodic tick or a received
//! network value) and ends on `Return`, on the first error, or
//! immediately when the selected entry has no handler.

use crate::error::{ErrorCode, Result};
use crate::host::Host;
use crate::instruction::{Instruction, JumpCond};
use crate::memory::ScratchMemory;
use crate::program::{EntryPoint, Program};
use crate::stack::Stack;
use crate::value::{self, Value, BINARY_LEN};

/// The IPv6 loopback address `::1`, the match target of `CmpIpLocalhost`
const LOCALHOST: [u8; BINARY_LEN] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

/// Source context of a value-received trigger
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    /// Source address of the triggering packet
    pub ip: &'a [u8; BINARY_LEN],
    /// Endpoint the value was reported for
    pub eid: u32,
    /// The received value
    pub value: Value<'a>,
}

/// Why a run was invoked
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    /// Periodic check from the scheduler
    Periodic,
    /// A value was received from the network
    Value(SourceContext<'a>),
}

impl<'a> Trigger<'a> {
    fn source(&self) -> Option<&SourceContext<'a>> {
        match self {
            Trigger::Periodic => None,
            Trigger::Value(ctx) => Some(ctx),
        }
    }
}

/// One loaded state machine instance
///
/// Multiple independent machines may coexist (host simulator, multi-tenant
/// test harness); nothing is process-global. A machine must not be invoked
/// concurrently with itself; it is a single-owner resource.
#[derive(Debug)]
pub struct Machine {
    memory: ScratchMemory,
    first_run: bool,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            memory: ScratchMemory::new(),
            first_run: true,
        }
    }

    /// Mark the program as freshly (re)loaded: the next run enters the
    /// `Init` handler and starts from zeroed memory.
    pub fn reload(&mut self) {
        self.first_run = true;
    }

    /// Scratch memory view for host tooling (simulator memory dumps)
    pub fn memory(&self) -> &ScratchMemory {
        &self.memory
    }

    /// Run the machine once for a trigger, to completion.
    ///
    /// Selects the entry point from the program header (`Init` on the
    /// first invocation after a (re)load, otherwise `OnValue` for
    /// value-received triggers and `Periodic` for timer ticks), then
    /// decodes and executes instructions until `Return` or an error.
    /// Every halt code is reported to the host's diagnostic sink. Partial
    /// memory mutations before a failure point remain in effect.
    pub fn run<'a, H: Host>(
        &mut self,
        program_bytes: &'a [u8],
        trigger: Trigger<'a>,
        host: &mut H,
    ) -> Result<()> {
        let program = match Program::parse(program_bytes) {
            Ok(program) => program,
            Err(code) => {
                host.log_diagnostic(code, "header");
                return Err(code);
            }
        };

        let entry_point = if self.first_run {
            self.memory.zero();
            EntryPoint::Init
        } else if trigger.source().is_some() {
            EntryPoint::OnValue
        } else {
            EntryPoint::Periodic
        };

        let result = match program.entry(entry_point) {
            // no handler for this trigger: complete immediately
            None => Ok(()),
            Some(offset) => self.execute(&program, offset, &trigger, host),
        };

        // a failing first run still consumes the first-run status
        self.first_run = false;

        if let Err(code) = result {
            host.log_diagnostic(code, "execute");
        }
        result
    }

    fn execute<'a, H: Host>(
        &mut self,
        program: &Program<'a>,
        entry: u16,
        trigger: &Trigger<'a>,
        host: &mut H,
    ) -> Result<()> {
        let text = program.text();
        let mut stack: Stack<'a> = Stack::new();
        let mut pc: u16 = entry;

        loop {
            let (instruction, length) = Instruction::decode(text, pc)?;
            let mut jump: u16 = 0;

            match instruction {
                Instruction::LoadSourceIp => {
                    let ctx = trigger.source().ok_or(ErrorCode::InvalidOperation)?;
                    stack.push(Value::Binary(ctx.ip))?;
                }
                Instruction::LoadSourceEid => {
                    let ctx = trigger.source().ok_or(ErrorCode::InvalidOperation)?;
                    stack.push(Value::U32(ctx.eid))?;
                }
                Instruction::LoadSourceValue => {
                    let ctx = trigger.source().ok_or(ErrorCode::InvalidOperation)?;
                    stack.push(ctx.value)?;
                }
                Instruction::LoadSystemTime => {
                    stack.push(Value::U64(host.system_time()))?;
                }

                Instruction::Push(value) => stack.push(value)?,

                Instruction::LoadMem(r) => stack.push(self.memory.load(r)?)?,
                Instruction::StoreMem(r) => {
                    let value = stack.pop()?;
                    self.memory.store(r, value)?;
                }

                Instruction::Arithmetic(op) => {
                    let b = stack.pop()?;
                    let a = stack.pop()?;
                    stack.push(value::arithmetic(op, a, b)?)?;
                }
                Instruction::Bitwise(op) => {
                    let b = stack.pop()?;
                    let a = stack.pop()?;
                    stack.push(value::bitwise(op, a, b)?)?;
                }
                Instruction::Not => {
                    let a = stack.pop()?;
                    stack.push(a.not()?)?;
                }
                Instruction::Compare(op) => {
                    let b = stack.pop()?;
                    let a = stack.pop()?;
                    stack.push(value::compare(op, a, b)?)?;
                }

                Instruction::CmpBlock { first, last, literal } => {
                    let Value::Binary(block) = stack.pop()? else {
                        return Err(ErrorCode::InvalidTypes);
                    };
                    let range = &block[first as usize..=last as usize];
                    stack.push(Value::Bool(range == literal))?;
                }
                Instruction::CmpIpLocalhost => {
                    let Value::Binary(block) = stack.pop()? else {
                        return Err(ErrorCode::InvalidTypes);
                    };
                    stack.push(Value::Bool(*block == LOCALHOST))?;
                }

                Instruction::Dup { depth } => stack.dup_at(depth)?,
                Instruction::Rot { depth } => stack.rot_at(depth)?,
                Instruction::Exchange { depth } => stack.exchange(depth)?,

                Instruction::Jump { cond, distance } => {
                    let taken = match cond {
                        JumpCond::Always => true,
                        JumpCond::IfZero => !stack.pop()?.is_truthy()?,
                        JumpCond::IfNonzero => stack.pop()?.is_truthy()?,
                    };
                    if taken {
                        jump = distance;
                    }
                }

                Instruction::Switch(table) => {
                    let operand = stack.pop()?.as_u64()?;
                    if let Some(distance) = table.lookup(operand) {
                        jump = distance;
                    }
                }

                Instruction::DecomposeDatetime { mask } => {
                    let seconds = stack.pop()?.as_u64()?;
                    let dt = crate::datetime::decompose(seconds)?;
                    // fixed push order, independent of mask bit numbering
                    if mask & crate::datetime::MASK_WEEKDAY != 0 {
                        stack.push(Value::U32(u32::from(dt.weekday)))?;
                    }
                    if mask & crate::datetime::MASK_YEAR != 0 {
                        stack.push(Value::U32(dt.year as u32))?;
                    }
                    if mask & crate::datetime::MASK_MONTH != 0 {
                        stack.push(Value::U32(u32::from(dt.month)))?;
                    }
                    if mask & crate::datetime::MASK_DAY != 0 {
                        stack.push(Value::U32(u32::from(dt.day)))?;
                    }
                    if mask & crate::datetime::MASK_HOUR != 0 {
                        stack.push(Value::U32(u32::from(dt.hour)))?;
                    }
                    if mask & crate::datetime::MASK_MINUTE != 0 {
                        stack.push(Value::U32(u32::from(dt.minute)))?;
                    }
                    if mask & crate::datetime::MASK_SECOND != 0 {
                        stack.push(Value::U32(u32::from(dt.second)))?;
                    }
                }

                Instruction::Write => {
                    let value = stack.pop()?;
                    let eid = stack.pop()?.as_u64()? as u32;
                    host.write_endpoint(eid, &value)
                        .map_err(|_| ErrorCode::WriteFailed)?;
                }

                Instruction::Convert(ty) => {
                    let a = stack.pop()?;
                    stack.push(a.convert(ty)?)?;
                }

                Instruction::Pop => {
                    stack.pop()?;
                }

                Instruction::Return => return Ok(()),
            }

            // jumps are strictly forward; a wrapped program counter is fatal
            let next = u32::from(pc) + u32::from(length) + u32::from(jump);
            if next > u32::from(u16::MAX) {
                return Err(ErrorCode::InvalidOperation);
            }
            pc = next as u16;
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
