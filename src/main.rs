//! Simulator walkthrough
//!
//! Hand-assembles a small rule program, disassembles it, and drives one
//! machine through the three trigger kinds against an in-memory host.
//! The rule: when endpoint 23 (a motion sensor) reports a nonzero value,
//! switch endpoint 1 (a relay) on; on boot, raise the "ready" endpoint;
//! every periodic tick, record the current hour in scratch memory.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use hexabus_sm::{
    run_code, EndpointError, ErrorCode, Host, Instruction, Machine, Opcode, Program,
    SourceContext, Trigger, Value, PROGRAM_VERSION,
};

/// In-memory endpoint registry standing in for real device properties
struct SimHost {
    endpoints: HashMap<u32, String>,
}

impl SimHost {
    fn new() -> Self {
        SimHost {
            endpoints: HashMap::new(),
        }
    }
}

impl Host for SimHost {
    fn write_endpoint(&mut self, eid: u32, value: &Value<'_>) -> Result<(), EndpointError> {
        println!("    -> endpoint {} := {}", eid, value);
        self.endpoints.insert(eid, value.to_string());
        Ok(())
    }

    fn system_time(&mut self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn log_diagnostic(&mut self, code: ErrorCode, location: &str) {
        println!("    !! halted in {}: {} (code {})", location, code, code.code());
    }
}

fn assemble() -> Vec<u8> {
    // OnValue handler, text offset 0:
    //   if src.eid == 23 and src.value is nonzero, write relay eid 1
    let on_value = [
        Opcode::LoadSourceEid as u8,
        Opcode::LoadU32 as u8, 0, 0, 0, 23,
        Opcode::Eq as u8,
        Opcode::JumpIfZero as u8, 0x00, 0x08,
        Opcode::LoadSourceValue as u8,
        Opcode::JumpIfZero as u8, 0x00, 0x04,
        Opcode::LoadU8 as u8, 1,
        Opcode::LoadTrue as u8,
        Opcode::Write as u8,
        Opcode::Return as u8,
    ];
    // Init handler, text offset 19: raise the "ready" endpoint
    let init = [
        Opcode::LoadU8 as u8, 25,
        Opcode::LoadTrue as u8,
        Opcode::Write as u8,
        Opcode::Return as u8,
    ];
    // Periodic handler, text offset 24: store the current hour at u8 @ 0
    let periodic = [
        Opcode::LoadSystemTime as u8,
        Opcode::DecomposeDatetime as u8, 0x01,
        Opcode::StoreMem as u8, 0x10, 0x00,
        Opcode::Return as u8,
    ];

    let mut bytes = vec![PROGRAM_VERSION];
    bytes.extend_from_slice(&(on_value.len() as u16).to_be_bytes()); // Init
    bytes.extend_from_slice(&0u16.to_be_bytes()); // OnValue
    bytes.extend_from_slice(&((on_value.len() + init.len()) as u16).to_be_bytes()); // Periodic
    bytes.extend_from_slice(&on_value);
    bytes.extend_from_slice(&init);
    bytes.extend_from_slice(&periodic);
    bytes
}

fn disassemble(program: &Program<'_>) {
    let text = program.text();
    let mut offset: u16 = 0;
    while (offset as usize) < text.len() {
        match Instruction::decode(text, offset) {
            Ok((instruction, length)) => {
                println!("  {:>5}: {}", offset, instruction);
                offset += length;
            }
            Err(_) => {
                println!("  {:>5}: <undecodable>", offset);
                break;
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hexabus_sm=debug".into()),
        )
        .init();

    let bytes = assemble();
    let program = match Program::parse(&bytes) {
        Ok(program) => program,
        Err(code) => {
            eprintln!("program rejected: {}", code);
            std::process::exit(i32::from(code.code()));
        }
    };

    println!("program ({} bytes):", bytes.len());
    disassemble(&program);

    let mut machine = Machine::new();
    let mut host = SimHost::new();

    println!("\nfirst invocation (runs Init):");
    report(machine.run(&bytes, Trigger::Periodic, &mut host));

    println!("\nmotion reported on endpoint 23:");
    let source = [0xFE, 0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0A];
    let trigger = Trigger::Value(SourceContext {
        ip: &source,
        eid: 23,
        value: Value::Bool(true),
    });
    report(machine.run(&bytes, trigger, &mut host));

    println!("\nvalue from an unrelated endpoint 99 (no write expected):");
    let trigger = Trigger::Value(SourceContext {
        ip: &source,
        eid: 99,
        value: Value::U32(7),
    });
    report(machine.run(&bytes, trigger, &mut host));

    println!("\nperiodic tick:");
    report(machine.run(&bytes, Trigger::Periodic, &mut host));
    println!("    scratch memory byte 0 (hour): {}", machine.memory().as_bytes()[0]);

    println!("\nfinal endpoint table: {:?}", host.endpoints);
}

fn report(result: hexabus_sm::Result<()>) {
    println!("    exit code {}", run_code(&result));
}
