//! Hexabus State Machine VM
//!
//! A small deterministic bytecode virtual machine for Hexabus rule
//! programs ("when EID X changes, write EID Y"). The same engine runs on
//! the device and in the host-side simulator, so every operation is
//! bounds-checked and bit-exact across platforms.
//!
//! # Architecture
//!
//! - **Values**: tagged scalars plus borrowed 16-byte binary blocks, with
//!   a fixed type-promotion lattice for arithmetic and comparisons
//! - **Programs**: an opaque byte range with a version tag and three
//!   entry offsets (Init, OnValue, Periodic), then the instruction stream
//! - **Stack-based execution**: a 32-entry operand stack, 4 KiB typed
//!   scratch memory, forward-only control flow
//! - **Host trait**: the endpoint write path, wall clock, and diagnostic
//!   sink are supplied by the embedding firmware or simulator
//!
//! # Example Usage
//!
//! ```ignore
//! use hexabus_sm::{Machine, Trigger, SourceContext, Value};
//!
//! let program = std::fs::read("rule.hsm")?;
//! let mut machine = Machine::new();
//!
//! // first invocation enters the Init handler on zeroed memory
//! machine.run(&program, Trigger::Periodic, &mut host)?;
//!
//! // a received value dispatches the OnValue handler
//! let trigger = Trigger::Value(SourceContext {
//!     ip: &source_address,
//!     eid: 23,
//!     value: Value::Bool(true),
//! });
//! machine.run(&program, trigger, &mut host)?;
//! ```

// Core modules
pub mod datetime;
pub mod error;
pub mod executor;
pub mod host;
pub mod instruction;
pub mod memory;
pub mod opcodes;
pub mod program;
pub mod stack;
pub mod value;

// Re-export main types for convenience
pub use error::{run_code, ErrorCode, Result};
pub use executor::{Machine, SourceContext, Trigger};
pub use host::{EndpointError, Host};
pub use instruction::Instruction;
pub use memory::{CellType, MemRef, ScratchMemory, MEMORY_SIZE};
pub use opcodes::Opcode;
pub use program::{EntryPoint, Program, HEADER_LEN, NO_HANDLER, PROGRAM_VERSION};
pub use stack::STACK_DEPTH;
pub use value::{Type, Value, BINARY_LEN};
